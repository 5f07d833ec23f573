//! One-shot position fix. Platform callbacks are bridged into a future with an explicit outcome.

use std::future::Future;
use std::time::Duration;

use geogate_core::Coordinate;
use tokio::sync::oneshot;

/// Extra time granted past the platform timeout before the callback is considered lost.
pub const CALLBACK_GRACE: Duration = Duration::from_secs(1);

/// Options for a single fix. Defaults: low accuracy, 5 s timeout, cached fix up to 10 s old.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout: Duration::from_millis(5000),
            maximum_age: Duration::from_millis(10000),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("position request timed out")]
    Timeout,
    /// The platform dropped the callback without answering.
    #[error("position callback dropped")]
    Abandoned,
    #[error("platform location error: {0}")]
    Platform(String),
}

/// Current position, once.
pub trait PositionProvider: Send + Sync {
    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// Success/failure handle given to the platform. Consuming methods make a second answer impossible.
#[derive(Debug)]
pub struct PositionCallback {
    tx: oneshot::Sender<Result<Coordinate, LocationError>>,
}

impl PositionCallback {
    pub fn succeed(self, coordinate: Coordinate) {
        // Receiver gone means the caller stopped waiting; nothing to do.
        let _ = self.tx.send(Ok(coordinate));
    }

    pub fn fail(self, error: LocationError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Waiting side of a [`PositionCallback`].
#[derive(Debug)]
pub struct PendingPosition {
    rx: oneshot::Receiver<Result<Coordinate, LocationError>>,
    guard: Duration,
}

impl PendingPosition {
    /// Resolve with the platform's answer, `Abandoned` if the callback was dropped, or
    /// `Timeout` if nothing arrives within the guard.
    pub async fn wait(self) -> Result<Coordinate, LocationError> {
        match tokio::time::timeout(self.guard, self.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(LocationError::Abandoned),
            Err(_) => Err(LocationError::Timeout),
        }
    }
}

/// Callback/receiver pair; the receiver gives up after `guard`.
pub fn one_shot(guard: Duration) -> (PositionCallback, PendingPosition) {
    let (tx, rx) = oneshot::channel();
    (PositionCallback { tx }, PendingPosition { rx, guard })
}

/// Adapts a callback-style `getCurrentPosition(options, callback)` into a [`PositionProvider`].
pub struct CallbackPositionProvider<F> {
    request: F,
}

impl<F> CallbackPositionProvider<F>
where
    F: Fn(PositionOptions, PositionCallback) + Send + Sync,
{
    pub fn new(request: F) -> Self {
        Self { request }
    }
}

impl<F> PositionProvider for CallbackPositionProvider<F>
where
    F: Fn(PositionOptions, PositionCallback) + Send + Sync,
{
    async fn current_position(&self, options: PositionOptions) -> Result<Coordinate, LocationError> {
        let (callback, pending) = one_shot(options.timeout + CALLBACK_GRACE);
        (self.request)(options, callback);
        pending.wait().await
    }
}
