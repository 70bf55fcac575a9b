//! Handles the engine passes through by reference.
//!
//! Channels are coordination points and must keep their identity in a copy;
//! functions are immutable; opaque handles cannot be looked inside. A copy
//! holds the very same handle as its source.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use super::Value;

/// A complex number with `f64` parts.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }
}

struct ChannelEnds {
    tx: Sender<Value>,
    rx: Receiver<Value>,
}

/// A channel of values. Both ends live in one handle.
#[derive(Clone)]
pub struct Channel(Arc<ChannelEnds>);

impl Channel {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        Channel(Arc::new(ChannelEnds { tx, rx }))
    }

    pub fn unbounded() -> Self {
        let (tx, rx) = channel::unbounded();
        Channel(Arc::new(ChannelEnds { tx, rx }))
    }

    /// Send without blocking. Returns the value back if the channel is full.
    pub fn try_send(&self, value: Value) -> Result<(), Value> {
        self.0.tx.try_send(value).map_err(|err| match err {
            TrySendError::Full(value) | TrySendError::Disconnected(value) => value,
        })
    }

    /// Receive without blocking.
    pub fn try_recv(&self) -> Option<Value> {
        self.0.rx.try_recv().ok()
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.0.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.rx.is_empty()
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({:#x}, {} buffered)", self.addr(), self.len())
    }
}

type FunctionBody = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A callable value.
#[derive(Clone)]
pub struct Function(Arc<FunctionBody>);

impl Function {
    pub fn new(body: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Function(Arc::new(body))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:#x})", self.addr())
    }
}

/// A resource the engine never looks inside.
#[derive(Clone)]
pub struct OpaqueHandle(Arc<dyn Any + Send + Sync>);

impl OpaqueHandle {
    pub fn new<T: Any + Send + Sync>(resource: T) -> Self {
        OpaqueHandle(Arc::new(resource))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueHandle({:#x})", self.addr())
    }
}
