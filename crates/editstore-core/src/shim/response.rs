//! Event-style response object
//!
//! The editor's network client reports completion through callbacks:
//! `on('load', status, body)` and `on('error', status, err)`. An
//! [`ApiResponse`] gives local operations the same shape. The wrapped
//! future runs on a spawned task; once it resolves and a fixed delay
//! passes, the response settles and every registered observer of the
//! matching kind runs exactly once.
//!
//! Observers may be registered at any time. One registered after the
//! response settled runs immediately with the stored outcome, so a caller
//! can start the call and subscribe afterwards without missing it.

use std::convert::Infallible;
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::warn;

/// Status reported with `load`
pub const STATUS_OK: u16 = 200;

/// Status reported with `error`, whatever the underlying failure
pub const STATUS_ERROR: u16 = 500;

type LoadHandler<T> = Box<dyn FnOnce(u16, &T) + Send>;
type ErrorHandler = Box<dyn FnOnce(u16, &str) + Send>;

enum Outcome<T> {
    Load(Arc<T>),
    Error(Arc<str>),
}

impl<T> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        match self {
            Outcome::Load(body) => Outcome::Load(Arc::clone(body)),
            Outcome::Error(message) => Outcome::Error(Arc::clone(message)),
        }
    }
}

struct Shared<T> {
    outcome: Option<Outcome<T>>,
    load_handlers: Vec<LoadHandler<T>>,
    error_handlers: Vec<ErrorHandler>,
}

/// Failure delivered by [`ApiResponse::wait`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Pending result of a shim call
pub struct ApiResponse<T> {
    shared: Arc<Mutex<Shared<T>>>,
    settled: watch::Receiver<bool>,
}

impl<T> Clone for ApiResponse<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            settled: self.settled.clone(),
        }
    }
}

fn lock<T>(shared: &Mutex<Shared<T>>) -> MutexGuard<'_, Shared<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + Sync + 'static> ApiResponse<T> {
    /// Run `operation` on a new task and settle `delay` after it finishes
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, E>(delay: Duration, operation: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(Shared {
            outcome: None,
            load_handlers: Vec::new(),
            error_handlers: Vec::new(),
        }));
        let (settled_tx, settled_rx) = watch::channel(false);

        let task_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let result = operation.await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let outcome = match result {
                Ok(body) => Outcome::Load(Arc::new(body)),
                Err(e) => {
                    warn!("Offline request failed: {}", e);
                    Outcome::Error(Arc::from(e.to_string()))
                }
            };
            settle(&task_shared, outcome);
            let _ = settled_tx.send(true);
        });

        Self {
            shared,
            settled: settled_rx,
        }
    }

    /// A response that loads `body` after `delay`
    pub fn ready(delay: Duration, body: T) -> Self {
        Self::spawn(delay, async move { Ok::<_, Infallible>(body) })
    }

    /// Observe a successful result
    pub fn on_load<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(u16, &T) + Send + 'static,
    {
        let mut shared = lock(&self.shared);
        let body = match &shared.outcome {
            Some(Outcome::Load(body)) => Arc::clone(body),
            Some(Outcome::Error(_)) => return self,
            None => {
                shared.load_handlers.push(Box::new(handler));
                return self;
            }
        };
        drop(shared);

        handler(STATUS_OK, &body);
        self
    }

    /// Observe a failure
    pub fn on_error<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(u16, &str) + Send + 'static,
    {
        let mut shared = lock(&self.shared);
        let message = match &shared.outcome {
            Some(Outcome::Error(message)) => Arc::clone(message),
            Some(Outcome::Load(_)) => return self,
            None => {
                shared.error_handlers.push(Box::new(handler));
                return self;
            }
        };
        drop(shared);

        handler(STATUS_ERROR, &message);
        self
    }

    /// Whether the response has settled
    pub fn is_settled(&self) -> bool {
        *self.settled.borrow()
    }

    /// Wait until the response settles; observers have run by then
    pub async fn settled(&self) {
        let mut rx = self.settled.clone();
        // Err means the task died before settling; nothing more will happen
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Wait for the outcome directly instead of through observers
    pub async fn wait(&self) -> Result<Arc<T>, ApiError> {
        self.settled().await;
        match lock(&self.shared).outcome.clone() {
            Some(Outcome::Load(body)) => Ok(body),
            Some(Outcome::Error(message)) => Err(ApiError {
                status: STATUS_ERROR,
                message: message.to_string(),
            }),
            None => Err(ApiError {
                status: STATUS_ERROR,
                message: "request task ended without a result".to_string(),
            }),
        }
    }
}

/// Store the outcome and flush the matching observers, outside the lock
fn settle<T>(shared: &Mutex<Shared<T>>, outcome: Outcome<T>) {
    let (load_handlers, error_handlers) = {
        let mut shared = lock(shared);
        shared.outcome = Some(outcome.clone());
        (
            std::mem::take(&mut shared.load_handlers),
            std::mem::take(&mut shared.error_handlers),
        )
    };

    match outcome {
        Outcome::Load(body) => {
            for handler in load_handlers {
                handler(STATUS_OK, &body);
            }
        }
        Outcome::Error(message) => {
            for handler in error_handlers {
                handler(STATUS_ERROR, &message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DELAY: Duration = Duration::from_millis(5);

    #[tokio::test]
    async fn test_load_fires_with_ok_status() {
        let response = ApiResponse::ready(DELAY, 42_i64);
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        response.on_load(move |status, body| {
            *sink.lock().unwrap() = Some((status, *body));
        });

        assert!(!response.is_settled());
        response.settled().await;
        assert_eq!(*seen.lock().unwrap(), Some((STATUS_OK, 42)));
    }

    #[tokio::test]
    async fn test_error_fires_with_generic_status() {
        let response: ApiResponse<i64> =
            ApiResponse::spawn(DELAY, async { Err::<i64, _>("project 7 not found") });

        let loads = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let load_count = Arc::clone(&loads);
        let error_sink = Arc::clone(&errors);
        response
            .on_load(move |_, _| {
                load_count.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |status, message| {
                error_sink.lock().unwrap().push((status, message.to_string()));
            });

        response.settled().await;
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert_eq!(
            *errors.lock().unwrap(),
            vec![(STATUS_ERROR, "project 7 not found".to_string())]
        );
    }

    #[tokio::test]
    async fn test_late_subscriber_still_fires() {
        let response = ApiResponse::ready(Duration::ZERO, "done".to_string());
        response.settled().await;

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        response.on_load(move |status, body| {
            assert_eq!(status, STATUS_OK);
            assert_eq!(body, "done");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_observer_fires_once() {
        let response = ApiResponse::ready(DELAY, ());
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&fired);
            response.on_load(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        response.settled().await;
        response.settled().await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_settles_only_after_delay() {
        let delay = Duration::from_millis(30);
        let started = tokio::time::Instant::now();

        let response = ApiResponse::ready(delay, 1_u8);
        response.settled().await;

        assert!(started.elapsed() >= delay);
    }

    #[tokio::test]
    async fn test_wait_returns_outcome() {
        let ok = ApiResponse::ready(DELAY, vec![1, 2, 3]);
        assert_eq!(*ok.wait().await.unwrap(), vec![1, 2, 3]);

        let failed: ApiResponse<()> = ApiResponse::spawn(DELAY, async { Err::<(), _>("boom") });
        let err = failed.wait().await.unwrap_err();
        assert_eq!(err.status, STATUS_ERROR);
        assert_eq!(err.message, "boom");
    }
}
