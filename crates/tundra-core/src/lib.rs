//! Tundra core
//!
//! Staged mutation and deep write protection over tundra value graphs:
//! - [`sandbox`] captures writes in a change-log without touching the original
//! - [`frost`] refuses direct writes everywhere beneath a value
//! - [`cement`] commits a sandbox in place or onto a clone
//! - [`reject`] drops a sandbox's changes
//! - [`status`] and friends report how completely a graph is wrapped
//!
//! # Example
//!
//! ```rust,ignore
//! use tundra_core::{cement, frost, sandbox, SandboxParams};
//! use tundra_value::Value;
//! use serde_json::json;
//!
//! let settings = frost(Value::from(json!({"retries": 3})))?;
//! assert!(settings.set("retries", 5).is_err());
//!
//! let staged = sandbox(settings.clone(), SandboxParams::default());
//! staged.set("retries", 5)?;
//! let committed = cement(staged)?;
//!
//! assert!(committed.is_same(&settings));
//! assert_eq!(settings.get("retries"), Some(Value::from(5)));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod cement;
mod config;
mod error;
mod frost;
mod identity;
mod reject;
mod sandbox;
mod status;
mod strategy;
mod verification;

// Re-exports
pub use cement::{cement, cement_with};
pub use config::{CementOptions, CommitMode, ConfigError, SandboxParams, TundraConfig};
pub use error::TundraError;
pub use frost::{defrost, frost, FrostView};
pub use reject::reject;
pub use sandbox::{sandbox, SandboxView, SessionId, SessionMeta, Staged};
pub use status::{
    contains_frost, contains_sandbox, is_frost, is_sandbox, status, Coverage, PropertyStatus,
    WrapStatus,
};
pub use strategy::{CloneScope, CommitStrategy, CopyStrategy, InPlaceStrategy};
pub use verification::{BasisToken, VerificationMessage, VerificationProtocol, WriteOp};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with tundra
    pub use crate::{
        cement, defrost, frost, reject, sandbox, CommitMode, Coverage, SandboxParams, TundraError,
    };
    pub use tundra_value::{Key, Value};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
