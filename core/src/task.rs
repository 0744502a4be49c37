//! Cancellable fetch contract.
//!
//! # Design
//! A fetch reports through two callbacks: `on_cached`, fired at most once
//! with a locally available snapshot, and `on_complete`, fired exactly once
//! with the terminal result unless the fetch is cancelled first. Both are
//! guarded by a shared gate rather than by callback discipline:
//!
//! - `Completion::complete` consumes the completion and moves the gate from
//!   pending to completed; only the winner of that transition invokes
//!   `on_complete`.
//! - `CancellationHandle::cancel` moves the gate from pending to cancelled.
//!   Once it returns, neither callback fires again. After completion it has
//!   no effect.
//! - `CachedSender::send` consumes the sender and only fires while the gate is
//!   pending, so a snapshot can never follow the terminal result. A
//!   completion that arrives mid-delivery blocks on the delivery lock rather
//!   than spinning, and a panicking snapshot callback still returns the gate
//!   to pending so the abandoned completion can report.
//!
//! Work runs on the caller's Tokio runtime and is raced against the handle's
//! `CancellationToken`; cancelling drops the in-flight transport future,
//! which is as far as cancellation reaches into the transport.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ApiError, Result, TransportError};

pub type CachedCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;
pub type CompletionCallback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

const PENDING: u8 = 0;
const DELIVERING_CACHED: u8 = 1;
const COMPLETED: u8 = 2;
const CANCELLED: u8 = 3;

#[derive(Debug)]
struct Gate {
    state: AtomicU8,
    token: CancellationToken,
    // Held for the whole snapshot delivery so a completion can wait on it.
    delivery: Mutex<()>,
}

impl Gate {
    fn transition(&self, from: u8, to: u8) -> std::result::Result<u8, u8> {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
    }

    // A panicking snapshot callback poisons the lock; the state it guards is
    // restored by `Delivering`, so the poison carries no information.
    fn lock_delivery(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Returns the gate to pending when a snapshot delivery ends, including by
/// unwinding out of the callback.
struct Delivering<'a> {
    gate: &'a Gate,
}

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        // A cancel that raced the callback leaves the gate cancelled.
        let _ = self.gate.transition(DELIVERING_CACHED, PENDING);
    }
}

/// Caller-owned token for requesting early termination of a fetch.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    gate: Arc<Gate>,
}

impl CancellationHandle {
    /// Request cancellation. Idempotent, and a no-op once the fetch has completed.
    pub fn cancel(&self) {
        loop {
            match self.gate.state.load(Ordering::Acquire) {
                COMPLETED | CANCELLED => return,
                current => {
                    if self.gate.transition(current, CANCELLED).is_ok() {
                        self.gate.token.cancel();
                        tracing::debug!("Fetch cancelled");
                        return;
                    }
                }
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Completed or cancelled; no callback will fire from here on.
    pub fn is_finished(&self) -> bool {
        matches!(self.gate.state.load(Ordering::Acquire), COMPLETED | CANCELLED)
    }

    /// Token that fires when cancellation is requested, for cooperative transports.
    pub fn token(&self) -> CancellationToken {
        self.gate.token.clone()
    }
}

/// Delivers the single cached snapshot of a fetch.
pub struct CachedSender<T> {
    gate: Arc<Gate>,
    on_cached: CachedCallback<T>,
}

impl<T> CachedSender<T> {
    /// Deliver `value` if the fetch is still pending. Returns whether it was delivered.
    pub fn send(self, value: T) -> bool {
        let _delivery = self.gate.lock_delivery();
        if self.gate.transition(PENDING, DELIVERING_CACHED).is_err() {
            return false;
        }
        let _delivering = Delivering { gate: &self.gate };
        (self.on_cached)(value);
        true
    }
}

/// Delivers the terminal result of a fetch, exactly once.
pub struct Completion<T> {
    gate: Arc<Gate>,
    on_complete: Option<CompletionCallback<T>>,
}

impl<T> Completion<T> {
    pub fn complete(mut self, result: Result<T>) {
        if let Some(on_complete) = self.on_complete.take() {
            self.finish(on_complete, result);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.state.load(Ordering::Acquire) == CANCELLED
    }

    fn finish(&self, on_complete: CompletionCallback<T>, result: Result<T>) {
        loop {
            match self.gate.transition(PENDING, COMPLETED) {
                Ok(_) => {
                    on_complete(result);
                    return;
                }
                // The snapshot callback is still running; block until it returns.
                Err(DELIVERING_CACHED) => drop(self.gate.lock_delivery()),
                Err(_) => return,
            }
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            self.finish(
                on_complete,
                Err(ApiError::Transport(TransportError::Other(
                    "fetch abandoned before completion".to_string(),
                ))),
            );
        }
    }
}

/// Create the guarded callback pair for one fetch and the handle controlling it.
pub fn channel<T>(
    on_cached: CachedCallback<T>,
    on_complete: CompletionCallback<T>,
) -> (CachedSender<T>, Completion<T>, CancellationHandle) {
    let gate = Arc::new(Gate {
        state: AtomicU8::new(PENDING),
        token: CancellationToken::new(),
        delivery: Mutex::new(()),
    });
    (
        CachedSender {
            gate: Arc::clone(&gate),
            on_cached,
        },
        Completion {
            gate: Arc::clone(&gate),
            on_complete: Some(on_complete),
        },
        CancellationHandle { gate },
    )
}

/// Run a fetch on the current Tokio runtime under the callback contract.
///
/// `work` receives the cached-snapshot sender and returns the future
/// producing the terminal result. Without a runtime the fetch cannot start:
/// `on_complete` is invoked synchronously with `NotConnected` and no handle
/// is returned.
pub fn spawn_fetch<T, F, Fut>(
    on_cached: CachedCallback<T>,
    on_complete: CompletionCallback<T>,
    work: F,
) -> Option<CancellationHandle>
where
    T: Send + 'static,
    F: FnOnce(CachedSender<T>) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let (cached, completion, handle) = channel(on_cached, on_complete);
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::warn!(error = %e, "No async runtime, fetch not started");
            completion.complete(Err(ApiError::Transport(TransportError::NotConnected)));
            return None;
        }
    };

    let token = handle.token();
    let work = work(cached);
    let span = tracing::debug_span!("fetch", request_id = %Uuid::new_v4());
    runtime.spawn(
        async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Dropping in-flight work after cancellation");
                }
                result = work => completion.complete(result),
            }
        }
        .instrument(span),
    );
    Some(handle)
}
