use futures::future::BoxFuture;
use std::fmt::Display;

/// Ordered list of ways to obtain a value, tried one after another until one
/// succeeds. Failures are logged and swallowed.
pub struct FallbackChain<'a, T, E> {
    steps: Vec<(&'static str, BoxFuture<'a, Result<T, E>>)>,
}

impl<'a, T, E: Display> FallbackChain<'a, T, E> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a strategy. Nothing runs until [`resolve`](Self::resolve).
    pub fn then(mut self, name: &'static str, step: BoxFuture<'a, Result<T, E>>) -> Self {
        self.steps.push((name, step));
        self
    }

    /// Value from the first strategy that succeeds.
    pub async fn resolve(self) -> Option<T> {
        for (name, step) in self.steps {
            match step.await {
                Ok(value) => return Some(value),
                Err(e) => tracing::warn!(strategy = name, "Fallback step failed: {}", e),
            }
        }
        None
    }

    pub async fn resolve_or(self, sentinel: T) -> T {
        self.resolve().await.unwrap_or(sentinel)
    }
}

impl<'a, T, E: Display> Default for FallbackChain<'a, T, E> {
    fn default() -> Self {
        Self::new()
    }
}
