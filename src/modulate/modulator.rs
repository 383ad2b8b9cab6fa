//! The debounce-cache combinator.
//!
//! A [`Modulator`] wraps a target function and coalesces bursts of calls
//! into a single invocation. Calls made while a timer is armed share one
//! outcome: whichever arguments were recorded last are executed, and every
//! caller of that window observes the same result.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::cache::{ResultCache, cache_key};
use super::{InvalidArgument, ModulateError, Options};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type Target<R, A, T, E> = dyn Fn(Option<R>, A) -> BoxFuture<Result<T, E>> + Send + Sync;

/// Outcome shared by every caller of a window.
pub type Outcome<T, E> = Result<T, ModulateError<E>>;

type Window<T, E> = watch::Sender<Option<Outcome<T, E>>>;

/// A debounced, caching wrapper around a target function.
///
/// # Behavior
///
/// | Situation | Effect of `call` |
/// |-----------|------------------|
/// | Arguments cached | Resolves with the cached value, timeline untouched |
/// | Idle, `immediate` | Invokes now, arms a cooldown of `wait` |
/// | Otherwise | Re-arms the trailing timer; the last call's arguments win |
///
/// With `max_wait`, the trailing timer never fires later than `max_wait`
/// after the first call of the burst.
///
/// Clones share the same timeline, cache and history. Dropping the last
/// clone rejects any window still waiting for its timer with
/// [`ModulateError::Cancelled`]. A target that panics rejects its window
/// with [`ModulateError::Panicked`] and leaves the modulator usable.
///
/// # Example
///
/// ```
/// use modulate::{Modulator, Options};
/// use std::convert::Infallible;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let search = Modulator::from_sync(
///     Options::new(Duration::from_millis(200)),
///     |_: Option<()>, query: String| Ok::<_, Infallible>(query.len()),
/// )
/// .unwrap();
///
/// let first = search.call("ru".to_string());
/// let second = search.call("rust".to_string());
///
/// // Both callers observe the result of the last call.
/// assert_eq!(first.await.unwrap(), 4);
/// assert_eq!(second.await.unwrap(), 4);
/// # }
/// ```
pub struct Modulator<A, T, E, R = ()> {
    shared: Arc<Shared<A, T, E, R>>,
}

impl<A, T, E, R> Clone for Modulator<A, T, E, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, T, E, R> std::fmt::Debug for Modulator<A, T, E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let options = &self.shared.options;
        f.debug_struct("Modulator")
            .field("wait", &options.wait())
            .field("immediate", &options.immediate())
            .field("max_cache_size", &options.max_cache_size())
            .field("max_wait", &options.max_wait())
            .finish_non_exhaustive()
    }
}

struct Shared<A, T, E, R> {
    options: Options<R>,
    target: Box<Target<R, A, T, E>>,
    state: Mutex<State<A, T, E, R>>,
}

/// Mutable bookkeeping of the current burst.
struct State<A, T, E, R> {
    timer: Option<Timer>,
    timer_seq: u64,
    /// Arguments the trailing timer will execute.
    payload: Option<Payload<A, R>>,
    window: Option<Window<T, E>>,
    last_call: Option<Instant>,
    last_invoke: Option<Instant>,
    /// First call of the current burst; anchors `max_wait`.
    burst_start: Option<Instant>,
    cache: ResultCache<T>,
    results: Vec<T>,
}

struct Timer {
    id: u64,
    kind: TimerKind,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    /// Blocks leading-edge calls; fires without invoking.
    Cooldown,
    /// Invokes with the most recent payload.
    Trailing,
}

struct Payload<A, R> {
    args: A,
    receiver: Option<R>,
    key: Option<String>,
}

/// Work handed out of the lock to run the target.
struct Invocation<A, T, E, R> {
    payload: Payload<A, R>,
    window: Option<Window<T, E>>,
}

enum Ticket<T, E> {
    Ready(Outcome<T, E>),
    Waiting(watch::Receiver<Option<Outcome<T, E>>>),
}

impl<A, T, E, R> Modulator<A, T, E, R>
where
    A: Serialize + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Wraps an asynchronous target.
    ///
    /// The target receives the effective receiver (the configured context,
    /// else the call-site receiver) and the call's arguments.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`] if the options are inconsistent.
    pub fn new<F, Fut>(options: Options<R>, target: F) -> Result<Self, InvalidArgument>
    where
        F: Fn(Option<R>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        options.validate()?;

        let state = State {
            timer: None,
            timer_seq: 0,
            payload: None,
            window: None,
            last_call: None,
            last_invoke: None,
            burst_start: None,
            cache: ResultCache::new(options.max_cache_size()),
            results: Vec::new(),
        };

        let target: Box<Target<R, A, T, E>> =
            Box::new(move |receiver: Option<R>, args: A| -> BoxFuture<Result<T, E>> {
                Box::pin(target(receiver, args))
            });

        Ok(Self {
            shared: Arc::new(Shared {
                options,
                target,
                state: Mutex::new(state),
            }),
        })
    }

    /// Wraps a synchronous target.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`] if the options are inconsistent.
    pub fn from_sync<F>(options: Options<R>, target: F) -> Result<Self, InvalidArgument>
    where
        F: Fn(Option<R>, A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::new(options, move |receiver, args| {
            std::future::ready(target(receiver, args))
        })
    }

    /// Calls the debounced function without a call-site receiver.
    ///
    /// All state transitions happen before this returns; the future only
    /// waits for the shared outcome.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn call(&self, args: A) -> impl Future<Output = Outcome<T, E>> + Send + use<A, T, E, R> {
        self.dispatch(None, args)
    }

    /// Calls the debounced function with a call-site receiver.
    ///
    /// The receiver is ignored when the options bind a context.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn call_on(
        &self,
        receiver: R,
        args: A,
    ) -> impl Future<Output = Outcome<T, E>> + Send + use<A, T, E, R> {
        self.dispatch(Some(receiver), args)
    }

    /// Cancels the pending window.
    ///
    /// Clears the timer, discards the recorded arguments and rejects the
    /// outstanding outcome with [`ModulateError::Cancelled`]. The cache is
    /// kept. An invocation already running is not retracted.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Returns every value produced by an actual invocation, oldest first.
    ///
    /// Cache hits and failed invocations are not recorded.
    #[must_use]
    pub fn results(&self) -> Vec<T> {
        self.shared.lock().results.clone()
    }

    /// Returns true while a cooldown or trailing timer is armed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    /// Returns the number of cached results.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.shared.lock().cache.len()
    }

    /// Returns the options this combinator was created with.
    #[must_use]
    pub fn options(&self) -> &Options<R> {
        &self.shared.options
    }

    fn dispatch(
        &self,
        receiver: Option<R>,
        args: A,
    ) -> impl Future<Output = Outcome<T, E>> + Send + use<A, T, E, R> {
        let key = if self.shared.options.caches() {
            let key = cache_key(&args);
            if key.is_none() {
                tracing::debug!("Arguments are not serializable, bypassing cache");
            }
            key
        } else {
            None
        };

        let ticket = self.shared.submit(receiver, args, key);

        async move {
            match ticket {
                Ticket::Ready(outcome) => outcome,
                Ticket::Waiting(receiver) => settled(receiver).await,
            }
        }
    }
}

impl<A, T, E, R> Shared<A, T, E, R>
where
    A: Serialize + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, State<A, T, E, R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a call and returns the ticket its caller waits on.
    ///
    /// A leading-edge invocation runs after the lock is released, so a
    /// target may call back into the combinator.
    fn submit(
        self: &Arc<Self>,
        receiver: Option<R>,
        args: A,
        key: Option<String>,
    ) -> Ticket<T, E> {
        let now = Instant::now();
        let (ticket, invocation) = {
            let mut state = self.lock();

            if let Some(value) = key.as_deref().and_then(|k| state.cache.get(k)) {
                tracing::trace!("Cache hit, resolving without debouncing");
                return Ticket::Ready(Ok(value.clone()));
            }

            if let Some(previous) = state.last_call {
                tracing::trace!(
                    since_last_call = ?now.saturating_duration_since(previous),
                    "Debounced call"
                );
            }
            state.last_call = Some(now);

            let payload = Payload {
                args,
                receiver: self.options.context().cloned().or(receiver),
                key,
            };
            let ticket = Ticket::Waiting(
                state
                    .window
                    .get_or_insert_with(|| watch::channel(None).0)
                    .subscribe(),
            );

            if state.timer.is_none() {
                state.burst_start = Some(now);
            }

            let invocation = if self.options.immediate() && state.timer.is_none() {
                let invocation = state.begin_invocation(payload, now);
                self.arm(&mut state, self.options.wait(), TimerKind::Cooldown);
                Some(invocation)
            } else {
                state.payload = Some(payload);
                let delay = self.trailing_delay(&state, now);
                self.arm(&mut state, delay, TimerKind::Trailing);
                None
            };

            (ticket, invocation)
        };

        if let Some(invocation) = invocation {
            tracing::debug!("Leading-edge invocation");
            self.perform(invocation);
        }
        ticket
    }

    /// Delay for a trailing timer armed at `now`.
    fn trailing_delay(&self, state: &State<A, T, E, R>, now: Instant) -> Duration {
        let wait = self.options.wait();
        match (self.options.max_wait(), state.burst_start) {
            (Some(max_wait), Some(start)) => {
                let elapsed = now.saturating_duration_since(start);
                wait.min(max_wait.saturating_sub(elapsed))
            }
            _ => wait,
        }
    }

    /// Replaces any armed timer with a new one.
    fn arm(self: &Arc<Self>, state: &mut State<A, T, E, R>, delay: Duration, kind: TimerKind) {
        if let Some(previous) = state.timer.take() {
            previous.handle.abort();
        }

        state.timer_seq += 1;
        let id = state.timer_seq;
        let shared = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.fire(id);
            }
        });

        tracing::trace!(?kind, ?delay, "Timer armed");
        state.timer = Some(Timer { id, kind, handle });
    }

    /// Runs when timer `id` elapses. Superseded timers do nothing.
    fn fire(self: &Arc<Self>, id: u64) {
        let invocation = {
            let mut state = self.lock();
            let kind = match &state.timer {
                Some(timer) if timer.id == id => timer.kind,
                _ => return,
            };
            state.timer = None;
            state.burst_start = None;

            match (kind, state.payload.take()) {
                (TimerKind::Trailing, Some(payload)) => {
                    Some(state.begin_invocation(payload, Instant::now()))
                }
                _ => {
                    tracing::trace!("Cooldown elapsed");
                    None
                }
            }
        };

        if let Some(invocation) = invocation {
            tracing::debug!("Trailing-edge invocation");
            self.perform(invocation);
        }
    }

    /// Invokes the target and settles the detached window when it completes.
    ///
    /// A panic in the target, raised by the call itself or while its future
    /// runs, settles the window with [`ModulateError::Panicked`].
    fn perform(self: &Arc<Self>, invocation: Invocation<A, T, E, R>) {
        let Invocation { payload, window } = invocation;
        let Payload {
            args,
            receiver,
            key,
        } = payload;

        let called = panic::catch_unwind(AssertUnwindSafe(|| (self.target)(receiver, args)));
        let shared: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let outcome = run_target(called).await;

            if let (Ok(value), Some(shared)) = (&outcome, shared.upgrade()) {
                shared.record(key, value);
            }
            if let Some(window) = window {
                window.send_replace(Some(outcome));
            }
        });
    }

    fn record(&self, key: Option<String>, value: &T) {
        let mut state = self.lock();
        state.results.push(value.clone());

        let evicted = key.and_then(|key| state.cache.insert(key, value.clone()));
        if let Some(evicted) = evicted {
            tracing::trace!(%evicted, "Evicted oldest cache entry");
        }
    }

    fn cancel(&self) {
        let window = {
            let mut state = self.lock();
            if let Some(timer) = state.timer.take() {
                timer.handle.abort();
            }
            state.payload = None;
            state.last_call = None;
            state.last_invoke = None;
            state.burst_start = None;
            state.window.take()
        };

        if let Some(window) = window {
            tracing::debug!("Pending window cancelled");
            window.send_replace(Some(Err(ModulateError::Cancelled)));
        }
    }
}

impl<A, T, E, R> State<A, T, E, R> {
    /// Marks an invocation and detaches the current window for it to settle.
    fn begin_invocation(&mut self, payload: Payload<A, R>, now: Instant) -> Invocation<A, T, E, R> {
        if let Some(previous) = self.last_invoke {
            tracing::trace!(
                since_last_invoke = ?now.saturating_duration_since(previous),
                "Invoking target"
            );
        }
        self.last_invoke = Some(now);

        Invocation {
            payload,
            window: self.window.take(),
        }
    }
}

impl<A, T, E, R> Drop for Shared<A, T, E, R> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.timer.take() {
            timer.handle.abort();
        }
    }
}

/// Runs the target's future in its own task so that a panic while polling
/// it is reported instead of tearing down the window.
async fn run_target<T, E>(called: thread::Result<BoxFuture<Result<T, E>>>) -> Outcome<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let joined = match called {
        Ok(future) => tokio::spawn(future).await,
        Err(payload) => return Err(panicked(&*payload)),
    };

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => {
            tracing::debug!("Target failed, rejecting window");
            Err(ModulateError::Target(Arc::new(error)))
        }
        Err(error) => match error.try_into_panic() {
            Ok(payload) => Err(panicked(&*payload)),
            // The runtime is shutting down.
            Err(_) => Err(ModulateError::Cancelled),
        },
    }
}

fn panicked<E>(payload: &(dyn Any + Send)) -> ModulateError<E> {
    let message: Arc<str> = payload
        .downcast_ref::<&str>()
        .map(|message| Arc::from(*message))
        .or_else(|| payload.downcast_ref::<String>().map(|message| Arc::from(message.as_str())))
        .unwrap_or_else(|| Arc::from("non-string panic payload"));

    tracing::warn!(%message, "Target panicked, rejecting window");
    ModulateError::Panicked(message)
}

/// Waits for a window to settle. A window dropped unsettled counts as cancelled.
async fn settled<T: Clone, E>(mut receiver: watch::Receiver<Option<Outcome<T, E>>>) -> Outcome<T, E> {
    let outcome = match receiver.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone(),
        Err(_) => None,
    };
    outcome.unwrap_or(Err(ModulateError::Cancelled))
}
