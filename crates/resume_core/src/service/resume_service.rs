//! Resume workflow.
//!
//! # Responsibility
//! - Persist a batch, summarize it and notify its owner as one
//!   all-or-nothing unit of work.
//!
//! # Invariants
//! - An empty batch opens no unit of work and sends nothing.
//! - Every opened unit of work reaches `finish` exactly once; the error
//!   `finish` returns is the call's result.
//! - A notification failure rolls back the inserted rows.

use crate::context::{Cancelled, RequestContext};
use crate::model::transaction::{TransactionBatch, UserId};
use crate::notify::{Notifier, NotifyError};
use crate::repo::ledger_repo::{finish, LedgerStore, StoreError, UnitOfWork};
use crate::summary::{render, RenderError, Resume, ResumeTemplate, SummaryError};
use log::{debug, error, info};
use std::fmt::{Display, Formatter};
use std::time::Instant;
use thiserror::Error;

/// Workflow step, used to locate failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Begin,
    FetchUser,
    Persist,
    Render,
    Notify,
    Commit,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::FetchUser => "fetch_user",
            Self::Persist => "persist",
            Self::Render => "render",
            Self::Notify => "notify",
            Self::Commit => "commit",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-wrapped workflow failure.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("error creating repository transaction due to: {0}")]
    Begin(#[source] StoreError),
    #[error("error getting user due to: {0}")]
    UserLookup(#[source] StoreError),
    #[error("error saving transactions due to: {0}")]
    Persist(#[source] StoreError),
    #[error("error generating message for user id {user_id} due to: {source}")]
    Summarize {
        user_id: UserId,
        #[source]
        source: SummaryError,
    },
    #[error("error generating message for user id {user_id} due to: {source}")]
    Render {
        user_id: UserId,
        #[source]
        source: RenderError,
    },
    #[error("error notifying transactions to user id {user_id} due to: {source}")]
    Notify {
        user_id: UserId,
        #[source]
        source: NotifyError,
    },
    #[error("error committing transactions due to: {0}")]
    Commit(#[source] StoreError),
    #[error("resume aborted before {stage} due to: {source}")]
    Cancelled {
        stage: Stage,
        #[source]
        source: Cancelled,
    },
}

impl WorkflowError {
    /// Step at which the workflow stopped.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Begin(_) => Stage::Begin,
            Self::UserLookup(_) => Stage::FetchUser,
            Self::Persist(_) => Stage::Persist,
            Self::Summarize { .. } | Self::Render { .. } => Stage::Render,
            Self::Notify { .. } => Stage::Notify,
            Self::Commit(_) => Stage::Commit,
            Self::Cancelled { stage, .. } => *stage,
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::TransactionStart(_) => Self::Begin(value),
            StoreError::UserLookup { .. } => Self::UserLookup(value),
            StoreError::Insert(_) | StoreError::RowCountMismatch { .. } => Self::Persist(value),
            StoreError::Commit(_) | StoreError::Rollback(_) => Self::Commit(value),
            StoreError::Cancelled(source) => Self::Cancelled {
                stage: Stage::Commit,
                source,
            },
        }
    }
}

/// Resume use-case over a ledger store and a notifier.
pub struct ResumeService<S: LedgerStore, N: Notifier> {
    store: S,
    notifier: N,
    template: ResumeTemplate,
}

impl<S: LedgerStore, N: Notifier> ResumeService<S, N> {
    pub fn new(store: S, notifier: N, template: ResumeTemplate) -> Self {
        Self {
            store,
            notifier,
            template,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Persists `batch`, mails its resume to the owner and commits.
    ///
    /// # Errors
    /// - `Begin`/`Cancelled` before begin: nothing was opened.
    /// - `UserLookup`, `Persist`, `Summarize`, `Render`, `Notify`, `Cancelled`: the unit of
    ///   work was rolled back.
    /// - `Commit`: every step succeeded but the commit did not.
    pub fn process(
        &self,
        ctx: &RequestContext,
        batch: &TransactionBatch,
    ) -> Result<(), WorkflowError> {
        if batch.is_empty() {
            debug!(
                "event=resume_notify module=service status=skipped reason=empty_batch user_id={}",
                batch.user_id()
            );
            return Ok(());
        }

        let started_at = Instant::now();
        info!(
            "event=resume_notify module=service status=start user_id={} rows={}",
            batch.user_id(),
            batch.len()
        );

        checkpoint(ctx, Stage::Begin)?;
        let mut unit = self
            .store
            .begin(ctx)
            .map_err(store_step(Stage::Begin, WorkflowError::Begin))?;
        let outcome = self.run_steps(ctx, &mut unit, batch);
        let result = finish(unit, outcome);

        match &result {
            Ok(()) => info!(
                "event=resume_notify module=service status=ok user_id={} rows={} duration_ms={}",
                batch.user_id(),
                batch.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=resume_notify module=service status=error user_id={} stage={} duration_ms={}",
                batch.user_id(),
                err.stage(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn run_steps(
        &self,
        ctx: &RequestContext,
        unit: &mut S::Unit,
        batch: &TransactionBatch,
    ) -> Result<(), WorkflowError> {
        let user_id = batch.user_id();

        checkpoint(ctx, Stage::FetchUser)?;
        let user = unit
            .fetch_user(ctx, user_id)
            .map_err(store_step(Stage::FetchUser, WorkflowError::UserLookup))?;

        checkpoint(ctx, Stage::Persist)?;
        unit.insert_batch(ctx, batch)
            .map_err(store_step(Stage::Persist, WorkflowError::Persist))?;

        let resume = Resume::of(user, batch)
            .map_err(|source| WorkflowError::Summarize { user_id, source })?;
        let message = render(&resume, &self.template)
            .map_err(|source| WorkflowError::Render { user_id, source })?;

        checkpoint(ctx, Stage::Notify)?;
        self.notifier
            .notify(ctx, &message, &resume.user.email)
            .map_err(|source| WorkflowError::Notify { user_id, source })?;

        Ok(())
    }
}

fn checkpoint(ctx: &RequestContext, stage: Stage) -> Result<(), WorkflowError> {
    ctx.check()
        .map_err(|source| WorkflowError::Cancelled { stage, source })
}

/// Wraps a store failure for `stage`; cancellation seen by the store keeps
/// its own variant.
fn store_step(
    stage: Stage,
    wrap: fn(StoreError) -> WorkflowError,
) -> impl FnOnce(StoreError) -> WorkflowError {
    move |err| match err {
        StoreError::Cancelled(source) => WorkflowError::Cancelled { stage, source },
        other => wrap(other),
    }
}

#[cfg(test)]
mod tests {
    use super::{store_step, Stage, WorkflowError};
    use crate::context::Cancelled;
    use crate::db::DbError;
    use crate::repo::ledger_repo::StoreError;

    #[test]
    fn store_errors_map_to_their_stage() {
        let begin = WorkflowError::from(StoreError::TransactionStart(DbError::Backend(
            "locked".to_string(),
        )));
        assert_eq!(begin.stage(), Stage::Begin);

        let mismatch = WorkflowError::from(StoreError::RowCountMismatch {
            expected: 2,
            actual: 1,
        });
        assert_eq!(mismatch.stage(), Stage::Persist);
        assert_eq!(
            mismatch.to_string(),
            "error saving transactions due to: total affected rows (1) mismatch with total transactions (2)"
        );

        let commit = WorkflowError::from(StoreError::Commit(DbError::Backend("io".to_string())));
        assert_eq!(commit.stage(), Stage::Commit);
    }

    #[test]
    fn store_side_cancellation_keeps_the_step_stage() {
        let wrap = store_step(Stage::Persist, WorkflowError::Persist);
        let err = wrap(StoreError::Cancelled(Cancelled::DeadlineExceeded));
        assert!(matches!(
            err,
            WorkflowError::Cancelled {
                stage: Stage::Persist,
                source: Cancelled::DeadlineExceeded
            }
        ));
        assert_eq!(
            err.to_string(),
            "resume aborted before persist due to: request deadline exceeded"
        );
    }
}
