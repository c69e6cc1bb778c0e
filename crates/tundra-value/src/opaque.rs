//! Opaque leaf types
//!
//! Built-ins that are never wrapped: binary buffers and their typed views,
//! pending computations, callables and error values.

use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Element type of a typed binary view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BinaryElement {
    /// Raw bytes
    #[default]
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl BinaryElement {
    /// Width of one element in bytes
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

/// Binary buffer, optionally viewed as typed elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    data: Arc<[u8]>,
    element: BinaryElement,
}

impl Binary {
    /// Plain byte buffer
    #[must_use]
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self::typed(data, BinaryElement::U8)
    }

    /// Typed view over a byte buffer
    #[must_use]
    pub fn typed(data: impl Into<Arc<[u8]>>, element: BinaryElement) -> Self {
        Self {
            data: data.into(),
            element,
        }
    }

    /// Underlying bytes
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Element type
    #[inline]
    #[must_use]
    pub fn element(&self) -> BinaryElement {
        self.element
    }

    /// Number of whole elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.element.width()
    }

    /// Whether the buffer holds no whole element
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Value of a computation that may not have finished yet
///
/// Resolves at most once. Clones share the same slot.
#[derive(Clone, Default)]
pub struct Pending(Arc<OnceCell<Value>>);

impl Pending {
    /// Unresolved pending value
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Already resolved pending value
    #[must_use]
    pub fn resolved(value: Value) -> Self {
        Self(Arc::new(OnceCell::with_value(value)))
    }

    /// Resolve the slot
    ///
    /// # Errors
    /// Hands `value` back if the slot was already resolved
    pub fn resolve(&self, value: Value) -> Result<(), Value> {
        self.0.set(value)
    }

    /// Resolved value, if any
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        self.0.get().cloned()
    }

    /// Whether both handles share one slot
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Pending {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(value) => write!(f, "Pending(resolved {value:?})"),
            None => f.write_str("Pending(unresolved)"),
        }
    }
}

type CallableFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// Ordinary callable
#[derive(Clone)]
pub struct Callable(Arc<CallableFn>);

impl Callable {
    /// Wrap a closure
    pub fn new(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke with arguments
    #[must_use]
    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    /// Whether both handles share one closure
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.0).cast::<()>() == Arc::as_ptr(&other.0).cast::<()>()
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// Error carried as data
#[derive(Clone)]
pub struct ErrorValue(Arc<dyn std::error::Error + Send + Sync>);

impl ErrorValue {
    /// Wrap an error
    pub fn new(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(error))
    }

    /// Rendered message
    #[must_use]
    pub fn message(&self) -> String {
        self.0.to_string()
    }

    /// Whether both handles share one error
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.0).cast::<()>() == Arc::as_ptr(&other.0).cast::<()>()
    }
}

impl Debug for ErrorValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Error({:?})", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_binary_counts_elements() {
        let bin = Binary::typed(vec![0_u8; 16], BinaryElement::F32);
        assert_eq!(bin.len(), 4);
        assert_eq!(Binary::new(vec![1_u8, 2, 3]).len(), 3);
    }

    #[test]
    fn pending_resolves_once() {
        let pending = Pending::new();
        assert!(pending.value().is_none());
        pending.resolve(Value::from(1)).unwrap();
        assert_eq!(pending.value(), Some(Value::from(1)));
        assert!(pending.resolve(Value::from(2)).is_err());
        assert!(pending.clone().ptr_eq(&pending));
    }

    #[test]
    fn callable_invokes_closure() {
        let double = Callable::new(|args| {
            let n = args.first().and_then(Value::as_i64).unwrap_or(0);
            Value::from(n * 2)
        });
        assert_eq!(double.call(&[Value::from(21)]), Value::from(42));
    }
}
