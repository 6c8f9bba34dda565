//! Outbound notification contract and mail-based implementation.
//!
//! # Responsibility
//! - Define what the workflow needs from a notification channel.
//! - Provide a mail notifier over a pluggable transport.
//!
//! # Invariants
//! - Notifiers never retry; one call is one delivery attempt.
//! - A cancelled context is observed before any delivery attempt.

mod mail;

pub use mail::{Mail, MailNotifier, MailTransport, SpoolTransport};

use crate::context::{Cancelled, RequestContext};
use thiserror::Error;

/// Delivery failure reported by a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid destination `{0}`")]
    InvalidDestination(String),
    #[error("unexpected error sending mail to {destination} due to: {source}")]
    Delivery {
        destination: String,
        #[source]
        source: std::io::Error,
    },
    #[error("notification aborted: {0}")]
    Cancelled(#[from] Cancelled),
}

/// Delivers a rendered message to a user-facing destination.
pub trait Notifier {
    fn notify(
        &self,
        ctx: &RequestContext,
        message: &str,
        destination: &str,
    ) -> Result<(), NotifyError>;
}
