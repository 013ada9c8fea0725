//! Typed handles for engine-owned objects.
//!
//! Every handle is a weak reference: the engine alone decides whether the
//! object behind it is alive. Handles stay syntactically valid after the
//! object is destroyed and the bridge does no liveness tracking, so using a
//! stale handle yields whatever the engine does for unknown handles
//! (generally a no-op or a default value). The bridge never owns, copies
//! or frees anything a handle points at, user data included.

use std::fmt;
use std::os::raw::c_void;
use std::ptr::NonNull;

use crate::ffi::sys;

/// Conversion to and from the engine's integer handle representation.
pub trait RawHandle: Copy {
    fn from_raw(raw: sys::wlc_handle) -> Self;
    fn as_raw(self) -> sys::wlc_handle;
}

// ============================================================================
// Outputs and Views
// ============================================================================

/// An output (monitor) handle. `Output::NONE` means "no output".
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Output(sys::wlc_handle);

impl Output {
    pub const NONE: Self = Self(0);

    pub fn from_raw(raw: sys::wlc_handle) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> sys::wlc_handle {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl RawHandle for Output {
    fn from_raw(raw: sys::wlc_handle) -> Self {
        Self(raw)
    }

    fn as_raw(self) -> sys::wlc_handle {
        self.0
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// A view (toplevel window) handle. `View::NONE` means "no view / no focus".
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct View(sys::wlc_handle);

impl View {
    pub const NONE: Self = Self(0);

    pub fn from_raw(raw: sys::wlc_handle) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> sys::wlc_handle {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl RawHandle for View {
    fn from_raw(raw: sys::wlc_handle) -> Self {
        Self(raw)
    }

    fn as_raw(self) -> sys::wlc_handle {
        self.0
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Slice cast for passing a view list to the engine by address.
pub(crate) fn views_as_raw(views: &[View]) -> &[sys::wlc_handle] {
    // SAFETY: `View` is `repr(transparent)` over `wlc_handle`.
    unsafe { std::slice::from_raw_parts(views.as_ptr().cast::<sys::wlc_handle>(), views.len()) }
}

// ============================================================================
// Surfaces and devices
// ============================================================================

/// A rendering surface. Derived from a view or from a `wl_surface`
/// resource; it has no lifecycle operations of its own.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Resource(sys::wlc_resource);

impl Resource {
    pub const NONE: Self = Self(0);

    pub fn from_raw(raw: sys::wlc_resource) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> sys::wlc_resource {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// A libinput device announced through the Input handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputDevice(NonNull<sys::libinput_device>);

impl InputDevice {
    pub fn from_ptr(ptr: *mut sys::libinput_device) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut sys::libinput_device {
        self.0.as_ptr()
    }
}

// ============================================================================
// Event sources
// ============================================================================

/// A file descriptor or timer registration in the engine's event loop.
///
/// The token is move-only: the registration is released by handing it back
/// to `remove_event_source`, which consumes it, and never by dropping it.
#[must_use = "an event source stays registered until it is passed to remove_event_source"]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EventSource(NonNull<sys::wlc_event_source>);

impl EventSource {
    pub fn from_ptr(ptr: *mut sys::wlc_event_source) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(&self) -> *mut sys::wlc_event_source {
        self.0.as_ptr()
    }

    pub(crate) fn key(&self) -> usize {
        self.0.as_ptr() as usize
    }
}

/// Opaque host payload attached to a handle.
pub type UserData = *mut c_void;

// ============================================================================
// Tests
// ============================================================================
