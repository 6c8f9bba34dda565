#![allow(dead_code)]

use resume_core::db::DbError;
use resume_core::{
    LedgerStore, Notifier, NotifyError, RequestContext, StoreError, StoreResult,
    TransactionBatch, UnitOfWork, User, UserId,
};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

pub const OCTOBER_ROWS: [[&str; 2]; 2] = [
    ["-10", "2021-10-01T00:00:00Z"],
    ["15", "2021-10-01T01:00:00Z"],
];

pub fn rows(raw: &[[&str; 2]]) -> Vec<Vec<String>> {
    raw.iter()
        .map(|row| row.iter().map(|field| field.to_string()).collect())
        .collect()
}

pub fn batch(user_id: UserId, raw: &[[&str; 2]]) -> TransactionBatch {
    resume_core::parse_rows(&rows(raw), user_id).unwrap()
}

/// Which fake store operations fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Script {
    pub fail_begin: bool,
    pub fail_fetch: bool,
    pub fail_insert: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    /// Operation that cancels the request context once it has succeeded.
    pub cancel_after: Option<&'static str>,
}

/// Store double recording every call in order.
#[derive(Default)]
pub struct FakeStore {
    pub script: Script,
    pub calls: Rc<RefCell<Vec<&'static str>>>,
}

impl FakeStore {
    pub fn scripted(script: Script) -> Self {
        Self {
            script,
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

pub struct FakeUnit {
    script: Script,
    calls: Rc<RefCell<Vec<&'static str>>>,
}

fn backend(message: &str) -> DbError {
    DbError::Backend(message.to_string())
}

impl LedgerStore for FakeStore {
    type Unit = FakeUnit;

    fn begin(&self, ctx: &RequestContext) -> StoreResult<FakeUnit> {
        ctx.check()?;
        self.calls.borrow_mut().push("begin");
        if self.script.fail_begin {
            return Err(StoreError::TransactionStart(backend("too many connections")));
        }
        Ok(FakeUnit {
            script: self.script,
            calls: Rc::clone(&self.calls),
        })
    }
}

impl FakeUnit {
    fn enter(&self, ctx: &RequestContext, call: &'static str) -> StoreResult<()> {
        ctx.check()?;
        self.calls.borrow_mut().push(call);
        Ok(())
    }

    fn leave(&self, ctx: &RequestContext, call: &'static str) {
        if self.script.cancel_after == Some(call) {
            ctx.cancel_handle().cancel();
        }
    }
}

impl UnitOfWork for FakeUnit {
    fn fetch_user(&mut self, ctx: &RequestContext, user_id: UserId) -> StoreResult<User> {
        self.enter(ctx, "fetch_user")?;
        if self.script.fail_fetch {
            return Err(StoreError::UserLookup {
                user_id,
                source: backend("no rows"),
            });
        }
        self.leave(ctx, "fetch_user");
        Ok(User::new(user_id, "Ana", "ana@mail.test"))
    }

    fn insert_batch(&mut self, ctx: &RequestContext, _batch: &TransactionBatch) -> StoreResult<()> {
        self.enter(ctx, "insert_batch")?;
        if self.script.fail_insert {
            return Err(StoreError::RowCountMismatch {
                expected: 2,
                actual: 1,
            });
        }
        self.leave(ctx, "insert_batch");
        Ok(())
    }

    fn commit(self) -> StoreResult<()> {
        self.calls.borrow_mut().push("commit");
        if self.script.fail_commit {
            return Err(StoreError::Commit(backend("disk I/O error")));
        }
        Ok(())
    }

    fn rollback(self) -> StoreResult<()> {
        self.calls.borrow_mut().push("rollback");
        if self.script.fail_rollback {
            return Err(StoreError::Rollback(backend("connection lost")));
        }
        Ok(())
    }
}

/// Notifier double keeping `(destination, message)` pairs.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: RefCell::default(),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        ctx: &RequestContext,
        message: &str,
        destination: &str,
    ) -> Result<(), NotifyError> {
        ctx.check()?;
        if self.fail {
            return Err(NotifyError::Delivery {
                destination: destination.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "smtp down"),
            });
        }
        self.sent
            .borrow_mut()
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}
