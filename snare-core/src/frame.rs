//! Call context handed to hook callbacks.

use crate::member::ResolvedMember;
use std::{any::Any, fmt, sync::Arc};

/// An opaque object reference from the target process.
///
/// Two references are equal when they point to the same object.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Any + Send + Sync>);

impl ObjectRef {
    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the object as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Arc::as_ptr(&self.0))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A value crossing the interception boundary: an argument, receiver or result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// `null` / no value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// Any integral value.
    Int(i64),
    /// Any floating point value.
    Float(f64),
    /// A string.
    Str(Arc<str>),
    /// Any other object.
    Object(ObjectRef),
}

impl Value {
    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// The mutable state of one intercepted invocation.
///
/// Before callbacks may rewrite arguments or force a result; forcing a
/// result skips the original body and any lower-priority Before callback.
/// After callbacks see the final result and may overwrite it.
#[derive(Debug, Clone)]
pub struct CallFrame {
    member: ResolvedMember,
    instance: Option<Value>,
    args: Vec<Value>,
    result: Value,
    returned_early: bool,
}

/// A copy of the mutable part of a frame, used to undo a failed callback.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    args: Vec<Value>,
    result: Value,
    returned_early: bool,
}

impl CallFrame {
    /// Create a frame for a call of `member`.
    pub fn new(member: ResolvedMember, instance: Option<Value>, args: Vec<Value>) -> Self {
        Self {
            member,
            instance,
            args,
            result: Value::Null,
            returned_early: false,
        }
    }

    /// The intercepted member.
    pub fn member(&self) -> &ResolvedMember {
        &self.member
    }

    /// The receiver, `None` for static members and constructors.
    pub fn instance(&self) -> Option<&Value> {
        self.instance.as_ref()
    }

    /// Call arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Replace the argument at `index`. Out of range indices are ignored.
    pub fn set_arg(&mut self, index: usize, value: impl Into<Value>) {
        if let Some(slot) = self.args.get_mut(index) {
            *slot = value.into();
        }
    }

    /// Current result.
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Set the result.
    ///
    /// During the Before phase this forces an early return.
    pub fn set_result(&mut self, value: impl Into<Value>) {
        self.result = value.into();
        self.returned_early = true;
    }

    /// Store the value produced by the original body.
    ///
    /// Used by engines; does not count as an early return.
    pub fn complete(&mut self, value: Value) {
        self.result = value;
    }

    /// Whether a result was forced before the original body ran.
    pub fn is_returned_early(&self) -> bool {
        self.returned_early
    }

    /// Capture the mutable state of the frame.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            args: self.args.clone(),
            result: self.result.clone(),
            returned_early: self.returned_early,
        }
    }

    /// Restore state captured by [`snapshot`](Self::snapshot).
    pub fn restore(&mut self, snapshot: FrameSnapshot) {
        self.args = snapshot.args;
        self.result = snapshot.result;
        self.returned_early = snapshot.returned_early;
    }
}
