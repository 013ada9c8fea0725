//! The downstream engine API.
//!
//! `Engine` is every call the host can make into the compositor engine,
//! expressed with host types. Implementations are thin pass-throughs: the
//! native one (`ffi::native::NativeEngine`) forwards each method to the
//! matching libwlc function, and `core::stub::StubEngine` keeps an
//! in-process model for tests and headless runs.
//!
//! Calls that take or return structs are allocation-symmetric: whatever an
//! implementation allocates to satisfy the native calling convention is
//! released before the method returns.
//!
//! Operations on stale handles are implementation-defined and must not
//! panic.

use std::os::raw::c_void;
use std::os::unix::io::RawFd;

use crate::core::handle::{EventSource, Output, Resource, View};
use crate::core::interface::ActivationMask;
use crate::ffi::errors::Result;
use crate::ffi::sys;
use crate::ffi::types::{
    BackendType, EventMask, Geometry, Modifiers, Point, ResizeEdge, Size, ViewState, ViewType,
};

/// Compositor engine interface
pub trait Engine {
    // ===== Lifecycle =====

    /// Install the dispatch shims for every event kind in `mask`.
    /// Additive: kinds activated earlier stay active.
    fn activate(&self, mask: ActivationMask);

    /// Initialize the engine with the process arguments, dropping
    /// privileges where applicable. Returns false on failure.
    fn init(&self, args: &[String]) -> bool;

    /// Whether kinds activated after `init` are still delivered. This holds
    /// when the engine keeps the address of the callback table it was
    /// initialized with; an engine that copies the table at `init` never
    /// sees later slots.
    fn activates_after_init(&self) -> bool {
        true
    }

    /// Enter the engine loop; blocks until terminated.
    fn run(&self);

    /// Request loop exit once the current event has been processed.
    fn terminate(&self);

    fn backend_type(&self) -> BackendType;

    /// Spawn `bin` with `args` (without the program name). Fire and forget.
    fn exec(&self, bin: &str, args: &[String]) -> Result<()>;

    fn set_log_handler(&self, handler: sys::wlc_log_cb);

    // ===== Event loop =====

    fn add_fd(
        &self,
        fd: RawFd,
        mask: EventMask,
        callback: sys::wlc_fd_cb,
        arg: *mut c_void,
    ) -> Option<EventSource>;

    fn add_timer(&self, callback: sys::wlc_timer_cb, arg: *mut c_void) -> Option<EventSource>;

    /// Reschedule a timer source. Best effort; returns false on failure.
    fn timer_update(&self, source: &EventSource, delay_ms: i32) -> bool;

    /// Release a registration. No callback for it is delivered afterwards.
    fn remove_event_source(&self, source: EventSource);

    // ===== User data =====

    fn handle_set_user_data(&self, handle: sys::wlc_handle, data: *const c_void);
    fn handle_user_data(&self, handle: sys::wlc_handle) -> *mut c_void;

    // ===== Outputs =====

    /// Snapshot of all outputs.
    fn outputs(&self) -> Vec<Output>;
    fn focused_output(&self) -> Output;
    fn output_name(&self, output: Output) -> Option<String>;
    fn output_sleep(&self, output: Output) -> bool;
    fn output_set_sleep(&self, output: Output, sleep: bool);
    fn output_resolution(&self, output: Output) -> Option<Size>;
    fn output_set_resolution(&self, output: Output, resolution: Size);
    fn output_mask(&self, output: Output) -> u32;
    fn output_set_mask(&self, output: Output, mask: u32);
    /// Views in stacking order.
    fn output_views(&self, output: Output) -> Vec<View>;
    /// Views in creation order, unaffected by restacking.
    fn output_mutable_views(&self, output: Output) -> Vec<View>;
    /// Replace the stacking order. False when the engine rejects the list.
    fn output_set_views(&self, output: Output, views: &[View]) -> bool;
    /// Focus an output; `Output::NONE` clears focus.
    fn output_focus(&self, output: Output);
    fn output_schedule_render(&self, output: Output);

    // ===== Views =====

    /// Focus a view; `View::NONE` clears focus.
    fn view_focus(&self, view: View);
    fn view_close(&self, view: View);
    fn view_output(&self, view: View) -> Output;
    fn view_set_output(&self, view: View, output: Output);
    fn view_send_to_back(&self, view: View);
    fn view_send_below(&self, view: View, other: View);
    fn view_bring_above(&self, view: View, other: View);
    fn view_bring_to_front(&self, view: View);
    fn view_mask(&self, view: View) -> u32;
    fn view_set_mask(&self, view: View, mask: u32);
    fn view_geometry(&self, view: View) -> Option<Geometry>;
    /// `edges` is non-empty when the change comes from an interactive resize.
    fn view_set_geometry(&self, view: View, edges: ResizeEdge, geometry: &Geometry);
    fn view_type(&self, view: View) -> ViewType;
    fn view_set_type(&self, view: View, kind: ViewType, toggle: bool);
    fn view_state(&self, view: View) -> ViewState;
    fn view_set_state(&self, view: View, state: ViewState, toggle: bool);
    fn view_parent(&self, view: View) -> View;
    fn view_set_parent(&self, view: View, parent: View);
    fn view_title(&self, view: View) -> Option<String>;
    /// shell-surface only
    fn view_class(&self, view: View) -> Option<String>;
    /// xdg-surface only
    fn view_app_id(&self, view: View) -> Option<String>;

    // ===== Surfaces =====

    fn view_surface(&self, view: View) -> Resource;
    fn surface_size(&self, surface: Resource) -> Option<Size>;
    /// Only meaningful inside render hooks.
    fn surface_render(&self, surface: Resource, geometry: &Geometry);

    // ===== Wayland interop =====

    fn wl_display(&self) -> *mut sys::wl_display;
    fn view_from_surface_resource(&self, resource: *mut sys::wl_resource) -> View;
    fn output_from_output_resource(&self, resource: *mut sys::wl_resource) -> Output;
    fn resource_from_surface_resource(&self, resource: *mut sys::wl_resource) -> Resource;

    // ===== Input =====

    fn keysym_for_key(&self, key: u32, modifiers: Option<&Modifiers>) -> u32;
    fn utf32_for_key(&self, key: u32, modifiers: Option<&Modifiers>) -> u32;
    fn current_keys(&self) -> Vec<u32>;
    fn pointer_position(&self) -> Point;
    fn set_pointer_position(&self, position: Point);
}
