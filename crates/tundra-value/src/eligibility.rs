//! Wrap eligibility
//!
//! Decides which values wrapper layers may wrap. Only plain records and
//! arrays (and views over them) are wrappable; every other value is an
//! opaque leaf that wrappers pass through untouched.

use crate::node::Shape;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Classification of a value for wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eligibility {
    PlainRecord,
    ArrayOfAny,
    /// Scalars, temporal and pattern values, collections, binary buffers,
    /// pending computations, callables and errors
    Opaque,
}

impl Eligibility {
    #[inline]
    #[must_use]
    pub fn is_wrappable(self) -> bool {
        !matches!(self, Self::Opaque)
    }
}

/// Classify a value
#[must_use]
pub fn classify(value: &Value) -> Eligibility {
    match value.shape() {
        Some(Shape::Record) => Eligibility::PlainRecord,
        Some(Shape::Array) => Eligibility::ArrayOfAny,
        None => Eligibility::Opaque,
    }
}

/// Whether wrapper layers may wrap `value`
#[inline]
#[must_use]
pub fn is_wrappable(value: &Value) -> bool {
    classify(value).is_wrappable()
}
