//! Transaction ledger ingest, summarization and resume notification.
//!
//! A request carries one user's CSV ledger. Rows are validated into a
//! batch, persisted together with the user lookup in one unit of work,
//! summarized into a resume and mailed to the user. Either everything
//! commits or the store is rolled back.

pub mod config;
pub mod context;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod summary;

pub use config::{AppConfig, ConfigError, MailConfig};
pub use context::{CancelHandle, Cancelled, RequestContext};
pub use ingest::{parse_rows, read_rows, ParseError, PayloadError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::transaction::{TransactionBatch, TransactionRecord, UserId};
pub use model::user::User;
pub use notify::{Mail, MailNotifier, MailTransport, Notifier, NotifyError, SpoolTransport};
pub use repo::ledger_repo::{
    finish, LedgerStore, SqliteLedgerStore, SqliteUnitOfWork, StoreError, StoreResult, UnitOfWork,
};
pub use service::resume_service::{ResumeService, Stage, WorkflowError};
pub use service::submission::{submit, ErrorKind, ErrorResponse, SubmissionError};
pub use summary::{
    render, MonthBucket, RenderError, Resume, ResumeTemplate, Summary, SummaryError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
