//! Host commands - messaging client to bridge

mod auth;
mod sync;

pub use auth::*;
pub use sync::*;
