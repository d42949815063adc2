//! Invocation context handed to every hook.
//!
//! Carries a cancellation token and a small set of typed values. The framework
//! only passes it along; reacting to cancellation is up to the hooks.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cancellation signal plus immutable request-scoped values.
///
/// Cloning is cheap; `with_value` returns a new context and leaves the
/// original untouched.
#[derive(Clone, Default)]
pub struct Context {
    token: CancellationToken,
    values: Arc<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl Context {
    /// A fresh context that is never cancelled unless `cancel` is called.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context driven by an externally owned token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            values: Arc::default(),
        }
    }

    /// Derive a context whose token is cancelled together with this one,
    /// but can also be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            values: Arc::clone(&self.values),
        }
    }

    pub fn with_value<T>(&self, key: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        let mut values = (*self.values).clone();
        values.insert(key.into(), Arc::new(value));
        Self {
            token: self.token.clone(),
            values: Arc::new(values),
        }
    }

    /// Typed lookup; `None` when the key is absent or holds another type.
    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("keys", &keys)
            .finish()
    }
}
