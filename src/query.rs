//! Async query abstraction for data fetching.
//!
//! Inspired by TanStack Query, this module provides a `Query<T>` type that
//! encapsulates async data fetching, loading states, and error handling,
//! and a `Mutation<T>` for one-shot writes whose result the view waits for.
//!
//! # Example
//!
//! ```ignore
//! let catalog = catalog.clone();
//! let mut query = Query::new(move || {
//!     let catalog = catalog.clone();
//!     async move { catalog.load_virus_page().await.map_err(|e| e.to_string()) }
//! });
//!
//! // Start fetching
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```
//!
//! Freshness is decided by the resource cache, not here: `refetch()` always
//! runs the fetcher.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Outcome of polling a channel-backed task
enum Received<T> {
  Pending,
  Done(Result<T, String>),
}

fn try_receive<T>(receiver: &mut Option<mpsc::UnboundedReceiver<Result<T, String>>>) -> Received<T> {
  let Some(rx) = receiver else {
    return Received::Pending;
  };

  match rx.try_recv() {
    Ok(result) => {
      *receiver = None;
      Received::Done(result)
    }
    Err(mpsc::error::TryRecvError::Empty) => Received::Pending,
    Err(mpsc::error::TryRecvError::Disconnected) => {
      // Sender dropped without sending
      *receiver = None;
      Received::Done(Err("Request was cancelled".to_string()))
    }
  }
}

fn spawn_task<T: Send + 'static>(
  future: BoxFuture<T>,
) -> mpsc::UnboundedReceiver<Result<T, String>> {
  let (tx, rx) = mpsc::unbounded_channel();
  tokio::spawn(async move {
    let result = future.await;
    // Ignore send errors - receiver may have been dropped
    let _ = tx.send(result);
  });
  rx
}

/// Async query for data fetching with state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - Loading/success/error states
/// - Async result handling via channels
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time `fetch()` or `refetch()` is invoked.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn data_mut(&mut self) -> Option<&mut T> {
    match &mut self.state {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Start fetching data if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, even if already loading or data exists.
  pub fn refetch(&mut self) {
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch();
  }

  /// Replace the data with a result obtained elsewhere, e.g. the list a
  /// mutation refetched. Any pending fetch is dropped.
  pub fn set_success(&mut self, data: T) {
    self.receiver = None;
    self.state = QueryState::Success(data);
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  pub fn poll(&mut self) -> bool {
    match try_receive(&mut self.receiver) {
      Received::Pending => false,
      Received::Done(Ok(data)) => {
        self.state = QueryState::Success(data);
        true
      }
      Received::Done(Err(error)) => {
        self.state = QueryState::Error(error);
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    self.state = QueryState::Loading;
    self.receiver = Some(spawn_task((self.fetcher)()));
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

/// One write in flight at a time.
///
/// Unlike `Query`, each run takes its own future, since every write carries
/// different input.
pub struct Mutation<T> {
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T> Default for Mutation<T> {
  fn default() -> Self {
    Self { receiver: None }
  }
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_pending(&self) -> bool {
    self.receiver.is_some()
  }

  /// Start a write. Ignored while another write is pending.
  pub fn start<Fut>(&mut self, future: Fut) -> bool
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.is_pending() {
      return false;
    }
    self.receiver = Some(spawn_task(Box::pin(future)));
    true
  }

  /// The result, once the write has finished.
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    match try_receive(&mut self.receiver) {
      Received::Pending => None,
      Received::Done(result) => Some(result),
    }
  }
}
