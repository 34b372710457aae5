#![forbid(unsafe_code)]

//! The mailbox dispatch engine.
//!
//! The store owns the application state on a dedicated consumer thread.
//! `dispatch` enqueues an action; the consumer drains the mailbox and
//! processes one action fully before dequeuing the next:
//!
//! 1. **Reduce** - `state = reduce(&state, &action)`, synchronously on the
//!    consumer thread. Reducer application is therefore serialized: two
//!    dispatches can never interleave their reduce phases.
//! 2. **Observe** - subscribers see the post-reducer snapshot before any
//!    side effect runs.
//! 3. **Fan out** - every registered middleware runs concurrently (scoped
//!    threads) against that snapshot and may enqueue further actions
//!    through its [`Dispatcher`]; those are processed as later mailbox
//!    messages. The fan-out is joined before the next dequeue.
//!
//! Middleware convert their own failures into result actions; the engine
//! additionally catches panics at the join point and logs them. Nothing
//! escapes the consumer loop.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender, SyncSender};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;

use crate::action::Action;
use crate::middleware::Services;
use crate::reducer::reduce;
use crate::state::AppState;

enum Mail {
    Action {
        action: Action,
        done: Option<SyncSender<()>>,
    },
    Barrier(SyncSender<()>),
    Stop,
}

/// Handle for enqueuing actions, shared with middleware.
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Mail>,
    pending: Arc<AtomicUsize>,
}

impl Dispatcher {
    /// Enqueue an action. Never blocks; an action sent to a stopped store
    /// is dropped with a warning.
    pub fn dispatch(&self, action: Action) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self
            .tx
            .send(Mail::Action { action, done: None })
            .is_err()
        {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(target: "rota.store", "action dropped: store is shut down");
        }
    }
}

/// A side-effect handler invoked concurrently after every reduce.
///
/// `state` is the snapshot taken immediately after the reducer ran for
/// `action`; it is read-only. Failures must be converted into result
/// actions and dispatched — they must not escape `handle`.
pub trait Middleware: Send + Sync {
    fn handle(&self, state: &AppState, action: &Action, services: &Services, dispatch: &Dispatcher);
}

/// Builder for a [`Store`].
pub struct StoreBuilder {
    initial: AppState,
    middleware: Vec<Arc<dyn Middleware>>,
    subscribers: Vec<Box<dyn Fn(&AppState) + Send>>,
}

impl StoreBuilder {
    #[must_use]
    pub fn new(initial: AppState) -> Self {
        Self {
            initial,
            middleware: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Register a middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Register a state observer, called after every reduce and before the
    /// middleware fan-out.
    #[must_use]
    pub fn subscriber(mut self, subscriber: impl Fn(&AppState) + Send + 'static) -> Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    /// Start the consumer loop.
    pub fn spawn(self, services: Arc<Services>) -> std::io::Result<Store> {
        let (tx, rx) = mpsc::channel::<Mail>();
        let pending = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher {
            tx: tx.clone(),
            pending: Arc::clone(&pending),
        };
        let current = Arc::new(RwLock::new(Arc::new(self.initial.clone())));

        let loop_dispatcher = dispatcher.clone();
        let loop_current = Arc::clone(&current);
        let loop_pending = Arc::clone(&pending);
        let middleware = self.middleware;
        let subscribers = self.subscribers;
        let initial = self.initial;

        let handle = std::thread::Builder::new()
            .name("rota-store".into())
            .spawn(move || {
                let mut state = Arc::new(initial);
                while let Ok(mail) = rx.recv() {
                    match mail {
                        Mail::Stop => break,
                        Mail::Barrier(ack) => {
                            let _ = ack.send(());
                        }
                        Mail::Action { action, done } => {
                            state = Arc::new(reduce(&state, &action));
                            *loop_current.write().expect("store state poisoned") =
                                Arc::clone(&state);
                            tracing::debug!(
                                target: "rota.store",
                                action = ?action,
                                "reduced"
                            );

                            for subscriber in &subscribers {
                                subscriber(&state);
                            }

                            std::thread::scope(|scope| {
                                for middleware in &middleware {
                                    let state = Arc::clone(&state);
                                    let action = &action;
                                    let services = &services;
                                    let dispatcher = &loop_dispatcher;
                                    scope.spawn(move || {
                                        let outcome = catch_unwind(AssertUnwindSafe(|| {
                                            middleware.handle(
                                                &state, action, services, dispatcher,
                                            );
                                        }));
                                        if outcome.is_err() {
                                            tracing::error!(
                                                target: "rota.store",
                                                action = ?action,
                                                "middleware panicked during fan-out"
                                            );
                                        }
                                    });
                                }
                            });

                            if let Some(done) = done {
                                let _ = done.send(());
                            }
                            loop_pending.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                }
            })?;

        Ok(Store {
            dispatcher,
            current,
            handle: Some(handle),
        })
    }
}

/// The running dispatch engine.
pub struct Store {
    dispatcher: Dispatcher,
    current: Arc<RwLock<Arc<AppState>>>,
    handle: Option<JoinHandle<()>>,
}

impl Store {
    /// Enqueue an action and return immediately.
    pub fn dispatch(&self, action: Action) {
        self.dispatcher.dispatch(action);
    }

    /// Enqueue an action and wait until its reduce and middleware fan-out
    /// have completed. Actions the middleware enqueued in turn are *not*
    /// waited for; see [`settle`](Self::settle).
    pub fn dispatch_blocking(&self, action: Action) {
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        self.dispatcher.pending.fetch_add(1, Ordering::SeqCst);
        if self
            .dispatcher
            .tx
            .send(Mail::Action {
                action,
                done: Some(done_tx),
            })
            .is_err()
        {
            self.dispatcher.pending.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        let _ = done_rx.recv();
    }

    /// Wait until the mailbox is fully drained, including actions that
    /// middleware cascades enqueued along the way.
    pub fn settle(&self) {
        loop {
            let (ack_tx, ack_rx) = mpsc::sync_channel(1);
            if self.dispatcher.tx.send(Mail::Barrier(ack_tx)).is_err() {
                return;
            }
            let _ = ack_rx.recv();
            if self.dispatcher.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.current.read().expect("store state poisoned"))
    }

    /// A dispatch handle usable from other threads.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Stop the consumer loop, processing what was already enqueued.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.dispatcher.tx.send(Mail::Stop);
            let _ = handle.join();
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.stop();
    }
}
