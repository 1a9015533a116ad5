//! Combined contact + company timeline-event pipeline

use std::sync::Arc;

use chatsync_domain::constants::UNKNOWN_CONTACT_NAME;
use chatsync_domain::{Result, SyncMessage};
use tracing::{debug, info, warn};

use super::ports::TokenGate;
use crate::crm_ports::{CompanyEvent, ContactEvent, CrmApi};

/// Terminal state of one pipeline run. Early exits are normal outcomes, not
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Address did not resolve to a contact id (and was not an email)
    NoContactMatch,
    /// Contact event post did not yield a resolved object id
    ContactEventFailed,
    /// Contact has no associated company; contact event was posted
    NoCompanyAssociation,
    /// Both contact and company events were posted
    Completed,
}

/// How an address should be resolved against the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressKind {
    Phone,
    Email,
    Unknown,
}

/// Classify an address: leading `+` with digits and phone punctuation means
/// phone, an `@` anywhere means email, anything else is unresolvable.
fn classify_address(address: &str) -> AddressKind {
    if let Some(rest) = address.strip_prefix('+') {
        let phone_like = !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'));
        if phone_like {
            return AddressKind::Phone;
        }
    }
    if address.contains('@') {
        return AddressKind::Email;
    }
    AddressKind::Unknown
}

/// Best-effort CRM sync for normalized messages.
///
/// A failed sync must never impact message delivery in the host
/// application, so `handle_new_message` absorbs every failure.
pub struct SyncService {
    crm: Arc<dyn CrmApi>,
    token_gate: Arc<dyn TokenGate>,
}

impl SyncService {
    #[must_use]
    pub fn new(crm: Arc<dyn CrmApi>, token_gate: Arc<dyn TokenGate>) -> Self {
        Self { crm, token_gate }
    }

    /// Sync one message to the CRM. Never fails and never panics; all
    /// failure is logged and absorbed.
    pub async fn handle_new_message(&self, message: &SyncMessage) {
        if !self.token_gate.ensure_fresh_token().await {
            warn!("no usable access token (missing, expired, or refresh failed); skipping CRM sync for message");
            return;
        }

        // Own outgoing messages carry the authenticated user's identity;
        // incoming ones use the supplied participant.
        let sender = if message.is_inbound {
            message.sender.clone()
        } else {
            self.crm.authenticated_user().await.display_name
        };

        match self
            .post_combined_event(&message.address, &message.text, &sender, message.is_inbound)
            .await
        {
            Ok(outcome) => debug!(?outcome, "CRM sync finished"),
            Err(err) => {
                warn!(error = %err, "CRM sync failed; message delivery unaffected");
            }
        }
    }

    /// Ordered, short-circuiting contact + company post.
    ///
    /// Each step's failure is logged at its own layer; the pipeline
    /// terminates early rather than posting partial or inconsistent events.
    /// No step is retried.
    pub async fn post_combined_event(
        &self,
        address: &str,
        text: &str,
        sender: &str,
        is_inbound: bool,
    ) -> Result<SyncOutcome> {
        let (contact_id, email) = match classify_address(address) {
            AddressKind::Phone => (self.crm.lookup_contact_by_phone(address).await?, None),
            AddressKind::Email => (
                self.crm.lookup_contact_by_email(address).await?,
                Some(address.to_string()),
            ),
            AddressKind::Unknown => (None, None),
        };

        // A missed phone lookup is terminal; a missed email lookup can still
        // post by email address.
        if contact_id.is_none() && email.is_none() {
            info!(address, "no CRM contact match for address; nothing to post");
            return Ok(SyncOutcome::NoContactMatch);
        }

        let contact_event = ContactEvent {
            contact_id,
            email,
            text: text.to_string(),
            sender: sender.to_string(),
            is_inbound,
        };

        let Some(resolved_contact_id) = self.crm.post_contact_event(&contact_event).await? else {
            warn!(address, "contact event did not resolve an object id; skipping company event");
            return Ok(SyncOutcome::ContactEventFailed);
        };

        let Some(company_id) = self.crm.associated_company_id(&resolved_contact_id).await? else {
            info!(contact_id = %resolved_contact_id, "contact has no associated company");
            return Ok(SyncOutcome::NoCompanyAssociation);
        };

        let contact_name = match self.crm.contact_details(&resolved_contact_id).await? {
            Some(details) => details.display_name(),
            None => UNKNOWN_CONTACT_NAME.to_string(),
        };

        let company_event = CompanyEvent {
            company_id,
            contact_name,
            text: text.to_string(),
            sender: sender.to_string(),
            is_inbound,
        };
        self.crm.post_company_event(&company_event).await?;

        Ok(SyncOutcome::Completed)
    }
}
