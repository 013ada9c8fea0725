//! Compositor lifecycle and host-side entry points.
//!
//! `Compositor` is the object handlers receive. It ties together:
//! - the engine (native or stub) behind the [`Engine`] trait
//! - the handler registry and its activation mask
//! - the lifecycle state machine
//! - event sources registered with the engine's loop
//!
//! Everything runs on the one thread that calls [`Compositor::run`]. The
//! type is `!Send`; creating a compositor binds it to the current thread as
//! the dispatch target.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::os::raw::c_void;
use std::os::unix::io::RawFd;
use std::ptr;
use std::rc::{Rc, Weak};

use crate::config::BridgeConfig;
use crate::core::engine::Engine;
use crate::core::handle::{EventSource, RawHandle, UserData};
use crate::core::interface::{ActivationMask, EventInterface, Handler};
use crate::core::registry::{self, Registry};
use crate::ffi::errors::{BridgeError, Result};
use crate::ffi::shim;
use crate::ffi::sys;
use crate::ffi::types::EventMask;
use crate::util::logging::LIFECYCLE;

// ============================================================================
// Lifecycle
// ============================================================================

/// Engine lifecycle. Transitions only move forward; there is no way back
/// into `Running` once the loop has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Initialized,
    Running,
    Terminating,
    Exited,
}

impl Lifecycle {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Exited)
    }
}

// ============================================================================
// Event sources
// ============================================================================

type FdCallback = dyn Fn(&Compositor, RawFd, EventMask);
type TimerCallback = dyn Fn(&Compositor);

enum SourceCallback {
    Fd(Box<FdCallback>),
    Timer(Box<TimerCallback>),
}

/// Host side of an fd or timer registration. The engine holds its address
/// as the callback argument; the compositor's source table keeps it alive
/// until the registration is removed.
pub(crate) struct SourceEntry {
    callback: SourceCallback,
}

impl SourceEntry {
    /// Borrow a strong reference from the address handed to the engine.
    ///
    /// # Safety
    /// `arg` must be null or an address produced by `Rc::as_ptr` on an entry
    /// still held in a compositor's source table.
    pub(crate) unsafe fn retain(arg: *mut c_void) -> Option<Rc<SourceEntry>> {
        if arg.is_null() {
            return None;
        }
        let ptr = arg as *const SourceEntry;
        Rc::increment_strong_count(ptr);
        Some(Rc::from_raw(ptr))
    }

    pub(crate) fn fd_ready(&self, compositor: &Compositor, fd: RawFd, mask: EventMask) {
        match &self.callback {
            SourceCallback::Fd(callback) => callback(compositor, fd, mask),
            SourceCallback::Timer(_) => {
                tracing::error!(fd, "Timer source woken as fd source");
            }
        }
    }

    pub(crate) fn timer_expired(&self, compositor: &Compositor) {
        match &self.callback {
            SourceCallback::Timer(callback) => callback(compositor),
            SourceCallback::Fd(_) => tracing::error!("Fd source woken as timer source"),
        }
    }

    fn as_arg(self: &Rc<Self>) -> *mut c_void {
        Rc::as_ptr(self) as *mut c_void
    }
}

// ============================================================================
// Compositor
// ============================================================================

struct Inner {
    engine: Rc<dyn Engine>,
    registry: Registry,
    lifecycle: Cell<Lifecycle>,
    config: BridgeConfig,
    sources: RefCell<HashMap<usize, Rc<SourceEntry>>>,
}

impl Drop for Inner {
    // A compositor dropped before its loop finished must not leave the
    // engine holding addresses of freed source entries.
    fn drop(&mut self) {
        if self.lifecycle.get().is_finished() {
            return;
        }
        for &key in self.sources.get_mut().keys() {
            if let Some(source) = EventSource::from_ptr(key as *mut sys::wlc_event_source) {
                self.engine.remove_event_source(source);
            }
        }
    }
}

/// Shared handle to the bridge state. Cloning is cheap and every clone
/// refers to the same compositor.
#[derive(Clone)]
pub struct Compositor {
    inner: Rc<Inner>,
}

/// Non-owning reference to a compositor, as held by the thread binding.
#[derive(Clone)]
pub(crate) struct WeakCompositor {
    inner: Weak<Inner>,
}

impl WeakCompositor {
    pub(crate) fn upgrade(&self) -> Option<Compositor> {
        self.inner.upgrade().map(|inner| Compositor { inner })
    }

    pub(crate) fn refers_to(&self, compositor: &Compositor) -> bool {
        ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&compositor.inner))
    }
}

impl Compositor {
    /// Create a compositor over `engine` and make it this thread's
    /// dispatch target. The binding does not keep the compositor alive;
    /// once the last clone is dropped, events find no compositor.
    pub fn new(engine: Rc<dyn Engine>, config: BridgeConfig) -> Self {
        if config.forward_engine_log {
            engine.set_log_handler(shim::log_message);
        }

        let compositor = Self {
            inner: Rc::new(Inner {
                engine,
                registry: Registry::new(),
                lifecycle: Cell::new(Lifecycle::Uninitialized),
                config,
                sources: RefCell::new(HashMap::new()),
            }),
        };
        registry::bind(&compositor);

        tracing::debug!("Compositor bridge created");
        compositor
    }

    /// `new`, `install` and `initialize` in one step.
    pub fn with_interface(
        engine: Rc<dyn Engine>,
        interface: EventInterface,
        config: BridgeConfig,
    ) -> Result<Self> {
        let compositor = Self::new(engine, config);
        compositor.install(interface)?;
        compositor.initialize()?;
        Ok(compositor)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    pub fn interface(&self) -> &EventInterface {
        self.inner.registry.interface()
    }

    /// Kinds the engine currently delivers.
    pub fn activation_mask(&self) -> ActivationMask {
        self.inner.registry.active_mask()
    }

    /// The engine, for accessor and mutator calls.
    pub fn engine(&self) -> &dyn Engine {
        &*self.inner.engine
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub(crate) fn downgrade(&self) -> WeakCompositor {
        WeakCompositor {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn set_lifecycle(&self, next: Lifecycle) {
        let prev = self.inner.lifecycle.replace(next);
        tracing::debug!(from = ?prev, to = ?next, "Lifecycle transition");
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Install a whole interface. Allowed once, before the loop runs, and
    /// only before `initialize` for an engine that copies its table.
    pub fn install(&self, interface: EventInterface) -> Result<ActivationMask> {
        match self.lifecycle() {
            Lifecycle::Uninitialized => {}
            Lifecycle::Initialized if self.inner.engine.activates_after_init() => {}
            state => return Err(BridgeError::invalid_state("install", state)),
        }
        self.inner.registry.install(interface, self.engine())
    }

    /// Register a single handler and activate its kind. Returns true when it
    /// replaced an earlier handler for the same kind.
    ///
    /// After `initialize`, a kind that is not active yet only starts being
    /// delivered if the engine still reads the table it was initialized
    /// with (see [`Engine::activates_after_init`]). For an engine that
    /// copied the table this is refused, since the handler could never run.
    /// Replacing the handler of an already active kind is always allowed.
    pub fn register(&self, handler: Handler) -> Result<bool> {
        let state = self.lifecycle();
        if state.is_finished() {
            return Err(BridgeError::invalid_state("register", state));
        }

        let activates = !self.activation_mask().contains(handler.kind().mask());
        if activates && state != Lifecycle::Uninitialized && !self.inner.engine.activates_after_init() {
            tracing::warn!(
                kind = handler.kind().name(),
                "Engine copied its callback table at init; kind cannot be activated"
            );
            return Err(BridgeError::invalid_state("register", state));
        }
        Ok(self.inner.registry.register(handler, self.engine()))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Hand the configured process arguments to the engine. On failure the
    /// compositor is finished and `run` is refused.
    pub fn initialize(&self) -> Result<()> {
        let state = self.lifecycle();
        if state != Lifecycle::Uninitialized {
            return Err(BridgeError::invalid_state("initialize", state));
        }

        if !self.inner.engine.init(&self.inner.config.args) {
            self.set_lifecycle(Lifecycle::Exited);
            registry::unbind(self);
            crate::wlog!(LIFECYCLE, "Engine initialization failed");
            return Err(BridgeError::initialization_failed("engine refused to initialize"));
        }

        self.set_lifecycle(Lifecycle::Initialized);
        tracing::info!(
            backend = ?self.inner.engine.backend_type(),
            mask = self.activation_mask().bits(),
            "Compositor initialized"
        );
        Ok(())
    }

    /// Run the engine loop on this thread until it terminates.
    pub fn run(&self) -> Result<()> {
        let state = self.lifecycle();
        if state != Lifecycle::Initialized {
            return Err(BridgeError::invalid_state("run", state));
        }

        crate::wlog!(LIFECYCLE, "Entering engine loop");
        self.set_lifecycle(Lifecycle::Running);
        self.inner.engine.run();
        self.set_lifecycle(Lifecycle::Exited);
        crate::wlog!(LIFECYCLE, "Engine loop exited");

        registry::unbind(self);
        Ok(())
    }

    /// Ask the loop to exit after the current event. Safe to call from a
    /// handler; calling it again or outside a running loop is harmless.
    pub fn terminate(&self) {
        match self.lifecycle() {
            Lifecycle::Running => {
                self.set_lifecycle(Lifecycle::Terminating);
                self.inner.engine.terminate();
            }
            Lifecycle::Initialized => {
                self.inner.engine.terminate();
                self.set_lifecycle(Lifecycle::Exited);
            }
            Lifecycle::Uninitialized => self.set_lifecycle(Lifecycle::Exited),
            Lifecycle::Terminating | Lifecycle::Exited => {
                tracing::debug!("Terminate already requested");
            }
        }
    }

    /// Spawn `bin` with `args`. Fire and forget.
    pub fn exec<S: AsRef<str>>(&self, bin: &str, args: &[S]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_owned()).collect();
        tracing::info!(bin, ?args, "Spawning process");
        self.inner.engine.exec(bin, &args)
    }

    // =========================================================================
    // Event sources
    // =========================================================================

    /// Watch `fd` in the engine loop. `callback` runs on the dispatch thread
    /// with the triggering mask and `context`.
    pub fn add_fd<T, F>(&self, fd: RawFd, mask: EventMask, context: T, callback: F) -> Result<EventSource>
    where
        T: 'static,
        F: Fn(&Compositor, RawFd, EventMask, &T) + 'static,
    {
        let entry = Rc::new(SourceEntry {
            callback: SourceCallback::Fd(Box::new(move |compositor, fd, mask| {
                callback(compositor, fd, mask, &context)
            })),
        });

        let source = self
            .inner
            .engine
            .add_fd(fd, mask, shim::fd_ready, entry.as_arg())
            .ok_or_else(|| BridgeError::event_source_refused(format!("fd {fd}")))?;

        tracing::debug!(fd, mask = mask.bits(), "Fd source added");
        self.inner.sources.borrow_mut().insert(source.key(), entry);
        Ok(source)
    }

    /// Create a timer source. It stays idle until [`timer_update`](Self::timer_update)
    /// arms it.
    pub fn add_timer<T, F>(&self, context: T, callback: F) -> Result<EventSource>
    where
        T: 'static,
        F: Fn(&Compositor, &T) + 'static,
    {
        let entry = Rc::new(SourceEntry {
            callback: SourceCallback::Timer(Box::new(move |compositor| {
                callback(compositor, &context)
            })),
        });

        let source = self
            .inner
            .engine
            .add_timer(shim::timer_expired, entry.as_arg())
            .ok_or_else(|| BridgeError::event_source_refused("timer"))?;

        tracing::debug!("Timer source added");
        self.inner.sources.borrow_mut().insert(source.key(), entry);
        Ok(source)
    }

    /// Rearm a timer. Best effort; false when the engine refuses.
    pub fn timer_update(&self, source: &EventSource, delay_ms: i32) -> bool {
        self.inner.engine.timer_update(source, delay_ms)
    }

    /// Release a registration. Nothing is delivered for it afterwards.
    pub fn remove_event_source(&self, source: EventSource) {
        let key = source.key();
        self.inner.engine.remove_event_source(source);

        let entry = self.inner.sources.borrow_mut().remove(&key);
        if entry.is_none() {
            tracing::warn!("Removed an event source this compositor did not register");
        }
    }

    /// Number of live fd and timer registrations.
    pub fn event_source_count(&self) -> usize {
        self.inner.sources.borrow().len()
    }

    // =========================================================================
    // User data
    // =========================================================================

    /// Attach an opaque pointer to a handle. Not copied, not freed; release
    /// it in the matching Destroyed handler if it needs cleanup.
    pub fn set_user_data<H: RawHandle>(&self, handle: H, data: UserData) {
        self.inner.engine.handle_set_user_data(handle.as_raw(), data);
    }

    pub fn user_data<H: RawHandle>(&self, handle: H) -> UserData {
        self.inner.engine.handle_user_data(handle.as_raw())
    }
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("lifecycle", &self.lifecycle())
            .field("active", &self.activation_mask())
            .field("sources", &self.event_source_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
