//! CRM integration port interfaces

use async_trait::async_trait;
use chatsync_domain::constants::UNKNOWN_CONTACT_NAME;
use chatsync_domain::{AuthenticatedUser, Result};

/// Provider-assigned contact identifier
pub type ContactId = String;

/// Provider-assigned company identifier
pub type CompanyId = String;

/// Contact profile fields used to build a human-readable name
#[derive(Debug, Clone, Default)]
pub struct ContactDetails {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ContactDetails {
    /// Human-readable name: "first last", else first, else email, else
    /// "Unknown".
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self
                .email
                .clone()
                .unwrap_or_else(|| UNKNOWN_CONTACT_NAME.to_string()),
        }
    }
}

/// Timeline event targeting a contact, addressed by id when resolved and by
/// email otherwise.
#[derive(Debug, Clone)]
pub struct ContactEvent {
    pub contact_id: Option<ContactId>,
    pub email: Option<String>,
    pub text: String,
    pub sender: String,
    pub is_inbound: bool,
}

/// Timeline event targeting a company, enriched with the resolved contact's
/// display name.
#[derive(Debug, Clone)]
pub struct CompanyEvent {
    pub company_id: CompanyId,
    pub contact_name: String,
    pub text: String,
    pub sender: String,
    pub is_inbound: bool,
}

/// Trait for authenticated CRM provider operations.
///
/// Every call requires a present access token; its absence surfaces as
/// `ChatSyncError::Auth`, which callers handle by short-circuiting. Provider
/// rejections and missing objects are soft failures: lookups return
/// `Ok(None)` and posts return a falsy value, never an error.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Display identity of the authenticated user. Never fails; falls back
    /// to a placeholder identity and caches the result until invalidated.
    async fn authenticated_user(&self) -> AuthenticatedUser;

    /// Drop the cached identity. Called whenever the token record changes.
    async fn invalidate_identity_cache(&self);

    /// Exact-match contact search by phone number.
    async fn lookup_contact_by_phone(&self, phone: &str) -> Result<Option<ContactId>>;

    /// Exact-match contact search by email address.
    async fn lookup_contact_by_email(&self, email: &str) -> Result<Option<ContactId>>;

    /// Read first/last name and email for a contact.
    async fn contact_details(&self, contact_id: &str) -> Result<Option<ContactDetails>>;

    /// Resolve the contact's associated company, if any.
    async fn associated_company_id(&self, contact_id: &str) -> Result<Option<CompanyId>>;

    /// Post a contact timeline event; returns the resolved contact object id
    /// on success.
    async fn post_contact_event(&self, event: &ContactEvent) -> Result<Option<ContactId>>;

    /// Post a company timeline event; returns whether the provider accepted
    /// it.
    async fn post_company_event(&self, event: &CompanyEvent) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    //! Unit tests for crm_ports.
    use super::*;

    /// Validates `ContactDetails::display_name` behavior for the name
    /// fallback chain scenario.
    ///
    /// Assertions:
    /// - Confirms full name formatting when both parts are present.
    /// - Confirms fallback to first name, then email, then "Unknown".
    #[test]
    fn test_display_name_fallback_chain() {
        let full = ContactDetails {
            first_name: Some("A".to_string()),
            last_name: Some("B".to_string()),
            email: Some("a@b.com".to_string()),
        };
        assert_eq!(full.display_name(), "A B");

        let first_only = ContactDetails {
            first_name: Some("A".to_string()),
            ..Default::default()
        };
        assert_eq!(first_only.display_name(), "A");

        let email_only = ContactDetails {
            email: Some("a@b.com".to_string()),
            ..Default::default()
        };
        assert_eq!(email_only.display_name(), "a@b.com");

        assert_eq!(ContactDetails::default().display_name(), "Unknown");
    }
}
