//! archrecon telemetry: logging setup and call correlation.
//!
//! # Example
//!
//! ```rust,no_run
//! use archrecon_telemetry::{CallContext, LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), archrecon_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("archrecon_tools=trace");
//! setup_logging(&config)?;
//!
//! let ctx = CallContext::new("cli").with_operation("git_clone");
//! let span = ctx.span();
//! let _guard = span.enter();
//! tracing::info!("cloning");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::CallContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    DEFAULT_FILE_PREFIX, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
