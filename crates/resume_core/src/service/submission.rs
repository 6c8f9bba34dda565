//! Submission boundary: raw request parts in, classified outcome out.
//!
//! # Responsibility
//! - Validate the user id parameter and decode the CSV payload.
//! - Reject empty submissions as a caller fault before the workflow runs.
//! - Shape failures as `{kind, message}` for the transport layer.

use crate::context::RequestContext;
use crate::ingest::{parse_rows, read_rows, ParseError, PayloadError};
use crate::model::transaction::UserId;
use crate::notify::Notifier;
use crate::repo::ledger_repo::LedgerStore;
use crate::service::resume_service::{ResumeService, WorkflowError};
use log::warn;
use serde::Serialize;
use std::io::Read;
use thiserror::Error;

/// Who is responsible for a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; resubmitting the same request fails the same way.
    CallerFault,
    /// Internal failure.
    SystemFault,
}

impl ErrorKind {
    /// Wire value of `ErrorResponse::kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CallerFault => "bad request",
            Self::SystemFault => "internal error",
        }
    }
}

/// Failure body returned to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("missing user id param")]
    MissingUserId,
    #[error("user id '{0}' is not an integer")]
    InvalidUserId(String),
    #[error(transparent)]
    UnreadablePayload(#[from] PayloadError),
    #[error(transparent)]
    Validation(#[from] ParseError),
    #[error("csv body is empty")]
    EmptySubmission,
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl SubmissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Workflow(_) => ErrorKind::SystemFault,
            Self::MissingUserId
            | Self::InvalidUserId(_)
            | Self::UnreadablePayload(_)
            | Self::Validation(_)
            | Self::EmptySubmission => ErrorKind::CallerFault,
        }
    }

    /// Stable code for logs; carries no submitted values.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingUserId => "missing_user_id",
            Self::InvalidUserId(_) => "invalid_user_id",
            Self::UnreadablePayload(_) => "unreadable_payload",
            Self::Validation(_) => "invalid_row",
            Self::EmptySubmission => "empty_submission",
            Self::Workflow(_) => "workflow_failed",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind().as_str().to_string(),
            message: self.to_string(),
        }
    }
}

/// Runs one resume submission for the user named by `user_id_param`.
pub fn submit<S, N, R>(
    service: &ResumeService<S, N>,
    ctx: &RequestContext,
    user_id_param: &str,
    payload: R,
) -> Result<(), SubmissionError>
where
    S: LedgerStore,
    N: Notifier,
    R: Read,
{
    let result = parse_user_id(user_id_param).and_then(|user_id| {
        let rows = read_rows(payload)?;
        let batch = parse_rows(&rows, user_id)?;
        if batch.is_empty() {
            return Err(SubmissionError::EmptySubmission);
        }
        service.process(ctx, &batch)?;
        Ok(())
    });

    if let Err(err) = &result {
        if err.kind() == ErrorKind::CallerFault {
            warn!(
                "event=submission module=service status=rejected error_code={}",
                err.code()
            );
        }
    }
    result
}

fn parse_user_id(raw: &str) -> Result<UserId, SubmissionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SubmissionError::MissingUserId);
    }
    trimmed
        .parse::<UserId>()
        .map_err(|_| SubmissionError::InvalidUserId(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_user_id, ErrorKind, SubmissionError};

    #[test]
    fn user_id_must_be_present_and_integral() {
        assert!(matches!(
            parse_user_id("  "),
            Err(SubmissionError::MissingUserId)
        ));
        assert_eq!(
            parse_user_id("abc").unwrap_err().to_string(),
            "user id 'abc' is not an integer"
        );
        assert_eq!(parse_user_id(" 42 ").unwrap(), 42);
    }

    #[test]
    fn response_carries_kind_and_message() {
        let response = SubmissionError::EmptySubmission.to_response();
        assert_eq!(response.kind, ErrorKind::CallerFault.as_str());
        assert_eq!(response.message, "csv body is empty");
    }
}
