use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

type Pending<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

/// Shared in-flight request map.
///
/// While a fetch for a key is outstanding, further callers for that key await
/// the same future instead of issuing their own request. Each fetch is driven
/// on its own task, so it runs to completion even when every caller has gone
/// away. The slot is released as soon as the fetch settles, so a failed fetch
/// is not replayed to later callers.
pub struct RequestCoalescer<V, E> {
    pending: Arc<Mutex<HashMap<String, Pending<V, E>>>>,
}

impl<V, E> Clone for RequestCoalescer<V, E> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<V, E> Default for RequestCoalescer<V, E> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V, E> RequestCoalescer<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` for `key`, or join the fetch already running for it.
    pub async fn run<F, Fut>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock();
            match pending.get(key) {
                Some(existing) => {
                    tracing::debug!(key, "Joining in-flight request");
                    existing.clone()
                }
                None => {
                    let fut = fetch().boxed().shared();
                    pending.insert(key.to_string(), fut.clone());
                    self.drive(key.to_string(), fut.clone());
                    fut
                }
            }
        };

        let result = shared.clone().await;
        self.release(key, &shared);
        result
    }

    // Polls the fetch to completion independently of the callers, then frees
    // the slot if nobody else did.
    fn drive(&self, key: String, fut: Pending<V, E>) {
        let coalescer = self.clone();
        tokio::spawn(async move {
            let _ = fut.clone().await;
            coalescer.release(&key, &fut);
        });
    }

    // A newer fetch that reused the key is left alone.
    fn release(&self, key: &str, settled: &Pending<V, E>) {
        let mut pending = self.pending.lock();
        if pending
            .get(key)
            .is_some_and(|current| Shared::ptr_eq(current, settled))
        {
            pending.remove(key);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.pending.lock().len()
    }
}
