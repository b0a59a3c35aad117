//! Boundary enforcement around sandboxed operations.
//!
//! Every guarded operation runs as:
//!
//! 1. pre-check: if the location is outside the root, reset and stop
//! 2. run the operation, capturing its error or panic
//! 3. post-check: same containment check, a violation replaces the result
//! 4. an operation failure becomes a reported [`GuardError::Operation`]
//!
//! Containment is best-effort. Side effects an operation produced before a
//! post-check violation are not rolled back.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use tracing::debug;

use crate::boundaries::BoundaryViolation;
use crate::context::WorkspaceContext;

/// Reported failure of a guarded operation. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The location left the workspace and was reset to the root.
    #[error("{0}")]
    Boundary(BoundaryViolation),

    /// The operation itself failed or panicked.
    #[error("Error: {message}")]
    Operation {
        /// The operation's error, rendered.
        message: String,
    },
}

impl GuardError {
    /// Check if this error is a boundary violation.
    #[must_use]
    pub fn is_boundary_violation(&self) -> bool {
        matches!(self, Self::Boundary(_))
    }
}

impl WorkspaceContext {
    /// Run a synchronous operation inside the workspace guard.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Boundary`] if the location is outside the
    /// workspace before or after the operation, and [`GuardError::Operation`]
    /// if the operation fails or panics.
    pub fn enforce<T, E, F>(&self, op: F) -> Result<T, GuardError>
    where
        F: FnOnce(&WorkspaceContext) -> Result<T, E>,
        E: fmt::Display,
    {
        if let Some(violation) = self.reset_if_outside() {
            return Err(GuardError::Boundary(violation));
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| op(self)));
        self.settle(outcome)
    }

    /// Run an asynchronous operation inside the workspace guard.
    ///
    /// The operation receives a clone of this context sharing its location.
    ///
    /// # Errors
    ///
    /// Same as [`WorkspaceContext::enforce`].
    pub async fn enforce_async<T, E, F, Fut>(&self, op: F) -> Result<T, GuardError>
    where
        F: FnOnce(WorkspaceContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        if let Some(violation) = self.reset_if_outside() {
            return Err(GuardError::Boundary(violation));
        }
        let outcome = AssertUnwindSafe(op(self.clone())).catch_unwind().await;
        self.settle(outcome)
    }

    fn settle<T, E: fmt::Display>(
        &self,
        outcome: Result<Result<T, E>, Box<dyn Any + Send>>,
    ) -> Result<T, GuardError> {
        match outcome {
            Ok(Ok(value)) => match self.reset_if_outside() {
                Some(violation) => Err(GuardError::Boundary(violation)),
                None => Ok(value),
            },
            Ok(Err(e)) => Err(self.contain(e.to_string())),
            Err(payload) => Err(self.contain(panic_message(payload.as_ref()))),
        }
    }

    fn contain(&self, message: String) -> GuardError {
        debug!(error = %message, "Guarded operation failed");
        match self.reset_if_outside() {
            Some(violation) => GuardError::Boundary(violation),
            None => GuardError::Operation { message },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::WorkspaceRoot;
    use std::cell::Cell;
    use std::path::PathBuf;

    fn ctx() -> WorkspaceContext {
        WorkspaceContext::new(WorkspaceRoot::from_normalized(PathBuf::from("/ws")))
    }

    #[test]
    fn test_passes_result_through_when_inside() {
        let ctx = ctx();
        let result: Result<u32, GuardError> = ctx.enforce(|_| Ok::<_, String>(7));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_pre_check_blocks_operation() {
        let ctx = ctx();
        ctx.set_current(PathBuf::from("/other"));
        let ran = Cell::new(false);

        let result = ctx.enforce(|_| {
            ran.set(true);
            Ok::<_, String>(())
        });

        assert!(!ran.get());
        let err = result.unwrap_err();
        assert!(err.is_boundary_violation());
        assert!(err.to_string().contains("outside the agent workspace"));
        assert_eq!(ctx.current(), PathBuf::from("/ws"));
    }

    #[test]
    fn test_post_check_catches_escape() {
        let ctx = ctx();
        let result = ctx.enforce(|ctx| {
            ctx.set_current(PathBuf::from("/etc"));
            Ok::<_, String>("moved")
        });

        assert!(result.unwrap_err().is_boundary_violation());
        assert_eq!(ctx.current(), PathBuf::from("/ws"));
    }

    #[test]
    fn test_operation_error_is_reported() {
        let ctx = ctx();
        let result: Result<(), _> = ctx.enforce(|_| Err("disk on fire"));
        assert_eq!(result.unwrap_err().to_string(), "Error: disk on fire");
    }

    #[test]
    fn test_error_after_escape_reports_violation() {
        let ctx = ctx();
        let result: Result<(), _> = ctx.enforce(|ctx| {
            ctx.set_current(PathBuf::from("/tmp"));
            Err("failed midway")
        });

        assert!(result.unwrap_err().is_boundary_violation());
        assert_eq!(ctx.current(), PathBuf::from("/ws"));
    }

    #[test]
    fn test_panic_is_captured() {
        let ctx = ctx();
        let result: Result<(), GuardError> = ctx.enforce(|_| -> Result<(), String> {
            panic!("boom");
        });
        assert_eq!(result.unwrap_err().to_string(), "Error: boom");
    }

    #[tokio::test]
    async fn test_async_guard() {
        let ctx = ctx();
        let ok = ctx
            .enforce_async(|ctx| async move {
                ctx.set_current(PathBuf::from("/ws/repositories"));
                Ok::<_, String>(ctx.current())
            })
            .await
            .unwrap();
        assert_eq!(ok, PathBuf::from("/ws/repositories"));

        let escaped = ctx
            .enforce_async(|ctx| async move {
                ctx.set_current(PathBuf::from("/"));
                Ok::<_, String>(())
            })
            .await;
        assert!(escaped.unwrap_err().is_boundary_violation());
        assert_eq!(ctx.current(), PathBuf::from("/ws"));
    }
}
