//! Handler registry and the thread-bound current compositor.
//!
//! The engine's callback ABI carries no user context for most events, so
//! the dispatch shims find their handlers through a single per-thread
//! binding. The registry owns the one [`EventInterface`] table and keeps
//! the engine's activation state equal to the set of populated slots.

use std::cell::{Cell, RefCell};

use crate::core::compositor::{Compositor, WeakCompositor};
use crate::core::engine::Engine;
use crate::core::interface::{ActivationMask, EventInterface, Handler};
use crate::ffi::errors::{BridgeError, Result};

#[derive(Debug, Default)]
pub struct Registry {
    interface: EventInterface,
    active: Cell<ActivationMask>,
    installed: Cell<bool>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interface(&self) -> &EventInterface {
        &self.interface
    }

    /// Bits the engine has been told to deliver.
    pub fn active_mask(&self) -> ActivationMask {
        self.active.get()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get()
    }

    /// Bulk install. Allowed once; handlers registered incrementally before
    /// this call are kept unless `interface` populates the same slot.
    pub fn install(&self, interface: EventInterface, engine: &dyn Engine) -> Result<ActivationMask> {
        if self.installed.get() {
            return Err(BridgeError::AlreadyInstalled);
        }

        for handler in interface.into_handlers() {
            self.interface.store(handler);
        }

        let mask = self.interface.activation_mask();
        self.activate(mask, engine);
        self.installed.set(true);

        tracing::debug!(mask = mask.bits(), "Event interface installed");
        Ok(mask)
    }

    /// Incremental registration. Last write wins; only the handler's own bit
    /// is activated. Returns true when an earlier handler was replaced.
    pub fn register(&self, handler: Handler, engine: &dyn Engine) -> bool {
        let kind = handler.kind();
        let replaced = self.interface.store(handler);
        self.activate(kind.mask(), engine);

        tracing::debug!(kind = kind.name(), replaced, "Handler registered");
        replaced
    }

    fn activate(&self, mask: ActivationMask, engine: &dyn Engine) {
        let missing = mask.difference(self.active.get());
        if missing.is_empty() {
            return;
        }
        engine.activate(missing);
        self.active.set(self.active.get() | missing);
    }
}

// ============================================================================
// Current compositor
// ============================================================================

thread_local! {
    static CURRENT: RefCell<Option<WeakCompositor>> = const { RefCell::new(None) };
}

/// Make `compositor` the target of every dispatch on this thread. The
/// binding is weak: it never extends the compositor's lifetime.
pub(crate) fn bind(compositor: &Compositor) {
    CURRENT.with(|current| *current.borrow_mut() = Some(compositor.downgrade()));
}

pub(crate) fn current() -> Option<Compositor> {
    CURRENT.with(|current| current.borrow().as_ref().and_then(WeakCompositor::upgrade))
}

/// Drop the binding if it still points at `compositor`.
pub(crate) fn unbind(compositor: &Compositor) {
    CURRENT.with(|current| {
        let mut current = current.borrow_mut();
        if current.as_ref().is_some_and(|bound| bound.refers_to(compositor)) {
            *current = None;
        }
    });
}
