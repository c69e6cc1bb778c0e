//! Tundra value graphs
//!
//! Tree-shaped data with reference identity, the substrate that wrapper
//! layers stage and protect.
//!
//! # Core Concepts
//!
//! - [`Value`]: cheap-to-clone handle over leaves, shared nodes and views
//! - [`Node`]: shared record/array storage carrying an [`ObjectId`]
//! - [`Key`]: canonical property key (index or name)
//! - [`View`]: accessor seam implemented by wrapper layers
//! - [`classify`]: wrap eligibility (plain records and arrays only)
//! - [`Fingerprint`]: Blake3 digest of a value's canonical export
//!
//! # Example
//!
//! ```rust,ignore
//! use tundra_value::Value;
//! use serde_json::json;
//!
//! let config = Value::from(json!({"db": {"host": "localhost"}}));
//! let alias = config.clone();
//! alias.get("db").unwrap().set("host", "db.internal")?;
//!
//! // Clones share storage
//! assert_eq!(config.get("db").unwrap().get("host"), Some(Value::from("db.internal")));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod eligibility;
mod error;
mod fingerprint;
mod json;
mod key;
mod node;
mod opaque;
mod value;
mod view;

// Re-exports
pub use eligibility::{classify, is_wrappable, Eligibility};
pub use error::AccessError;
pub use fingerprint::{Fingerprint, FingerprintError};
pub use key::Key;
pub use node::{Node, ObjectId, Shape};
pub use opaque::{Binary, BinaryElement, Callable, ErrorValue, Pending};
pub use value::{CloneMemo, Value};
pub use view::{View, ViewKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
