//! `Engine` over the system libwlc.
//!
//! Every method is a direct call into the C library. The callback table
//! handed to `wlc_init` lives for the rest of the process: the engine keeps
//! its address, and activation after init mutates it in place.

use std::cell::Cell;
use std::ffi::CString;
use std::os::raw::c_void;
use std::os::unix::io::RawFd;
use std::ptr;

use crate::core::engine::Engine;
use crate::core::handle::{views_as_raw, EventSource, Output, Resource, View};
use crate::core::interface::ActivationMask;
use crate::ffi::errors::Result;
use crate::ffi::marshal::{from_native, handles_from_raw, string_from_raw, u32s_from_raw, CStrArray};
use crate::ffi::shim;
use crate::ffi::sys::{self, wlc_handle};
use crate::ffi::types::{
    BackendType, EventMask, Geometry, Modifiers, Point, ResizeEdge, Size, ViewState, ViewType,
};
use crate::util::logging::ENGINE;

thread_local! {
    static TABLE: Cell<*mut sys::wlc_interface> = const { Cell::new(ptr::null_mut()) };
}

/// The thread's callback table, allocated on first use and never freed.
fn table() -> *mut sys::wlc_interface {
    TABLE.with(|table| {
        if table.get().is_null() {
            table.set(Box::into_raw(Box::default()));
        }
        table.get()
    })
}

/// The system compositor engine.
#[derive(Debug, Default)]
pub struct NativeEngine {
    _private: (),
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for NativeEngine {
    /// Fill the slots for `mask` in the table passed to `wlc_init`.
    ///
    /// Kinds activated after `init` only reach the engine because libwlc
    /// stores the `wlc_interface` pointer it was given and reads the slots
    /// through it on every event. A libwlc that copied the struct at init
    /// would silently drop them; `activates_after_init` states this
    /// contract to the compositor.
    fn activate(&self, mask: ActivationMask) {
        // SAFETY: the table is thread-local and only touched on this thread;
        // the engine reads it from the same thread.
        unsafe { shim::enable(&mut *table(), mask) };
    }

    fn init(&self, args: &[String]) -> bool {
        let mut argv = match CStrArray::new(args) {
            Ok(argv) => argv,
            Err(err) => {
                crate::wlog!(ENGINE, "Cannot pass process arguments to wlc: {}", err);
                return false;
            }
        };
        unsafe { sys::wlc_init(table(), argv.argc(), argv.as_mut_ptr()) }
    }

    fn activates_after_init(&self) -> bool {
        true
    }

    fn run(&self) {
        unsafe { sys::wlc_run() }
    }

    fn terminate(&self) {
        unsafe { sys::wlc_terminate() }
    }

    fn backend_type(&self) -> BackendType {
        BackendType::from_raw(unsafe { sys::wlc_get_backend_type() })
    }

    fn exec(&self, bin: &str, args: &[String]) -> Result<()> {
        // argv[0] is the program itself.
        let argv = CStrArray::new(std::iter::once(bin).chain(args.iter().map(String::as_str)))?;
        let bin = CString::new(bin)?;
        unsafe { sys::wlc_exec(bin.as_ptr(), argv.as_ptr()) };
        Ok(())
    }

    fn set_log_handler(&self, handler: sys::wlc_log_cb) {
        unsafe { sys::wlc_log_set_handler(Some(handler)) }
    }

    // ===== Event loop =====

    fn add_fd(
        &self,
        fd: RawFd,
        mask: EventMask,
        callback: sys::wlc_fd_cb,
        arg: *mut c_void,
    ) -> Option<EventSource> {
        EventSource::from_ptr(unsafe { sys::wlc_event_loop_add_fd(fd, mask.bits(), callback, arg) })
    }

    fn add_timer(&self, callback: sys::wlc_timer_cb, arg: *mut c_void) -> Option<EventSource> {
        EventSource::from_ptr(unsafe { sys::wlc_event_loop_add_timer(callback, arg) })
    }

    fn timer_update(&self, source: &EventSource, delay_ms: i32) -> bool {
        unsafe { sys::wlc_event_source_timer_update(source.as_ptr(), delay_ms) }
    }

    fn remove_event_source(&self, source: EventSource) {
        unsafe { sys::wlc_event_source_remove(source.as_ptr()) }
    }

    // ===== User data =====

    fn handle_set_user_data(&self, handle: wlc_handle, data: *const c_void) {
        unsafe { sys::wlc_handle_set_user_data(handle, data) }
    }

    fn handle_user_data(&self, handle: wlc_handle) -> *mut c_void {
        unsafe { sys::wlc_handle_get_user_data(handle) }
    }

    // ===== Outputs =====

    fn outputs(&self) -> Vec<Output> {
        let mut len: usize = 0;
        unsafe {
            let ptr = sys::wlc_get_outputs(&mut len);
            handles_from_raw(ptr, len)
        }
    }

    fn focused_output(&self) -> Output {
        Output::from_raw(unsafe { sys::wlc_get_focused_output() })
    }

    fn output_name(&self, output: Output) -> Option<String> {
        unsafe { string_from_raw(sys::wlc_output_get_name(output.as_raw())) }
    }

    fn output_sleep(&self, output: Output) -> bool {
        unsafe { sys::wlc_output_get_sleep(output.as_raw()) }
    }

    fn output_set_sleep(&self, output: Output, sleep: bool) {
        unsafe { sys::wlc_output_set_sleep(output.as_raw(), sleep) }
    }

    fn output_resolution(&self, output: Output) -> Option<Size> {
        unsafe { from_native(sys::wlc_output_get_resolution(output.as_raw())) }
    }

    fn output_set_resolution(&self, output: Output, resolution: Size) {
        let native: sys::wlc_size = resolution.into();
        unsafe { sys::wlc_output_set_resolution(output.as_raw(), &native) }
    }

    fn output_mask(&self, output: Output) -> u32 {
        unsafe { sys::wlc_output_get_mask(output.as_raw()) }
    }

    fn output_set_mask(&self, output: Output, mask: u32) {
        unsafe { sys::wlc_output_set_mask(output.as_raw(), mask) }
    }

    fn output_views(&self, output: Output) -> Vec<View> {
        let mut len: usize = 0;
        unsafe {
            let ptr = sys::wlc_output_get_views(output.as_raw(), &mut len);
            handles_from_raw(ptr, len)
        }
    }

    fn output_mutable_views(&self, output: Output) -> Vec<View> {
        let mut len: usize = 0;
        unsafe {
            let ptr = sys::wlc_output_get_mutable_views(output.as_raw(), &mut len);
            handles_from_raw(ptr, len)
        }
    }

    fn output_set_views(&self, output: Output, views: &[View]) -> bool {
        let raw = views_as_raw(views);
        unsafe { sys::wlc_output_set_views(output.as_raw(), raw.as_ptr(), raw.len()) }
    }

    fn output_focus(&self, output: Output) {
        unsafe { sys::wlc_output_focus(output.as_raw()) }
    }

    fn output_schedule_render(&self, output: Output) {
        unsafe { sys::wlc_output_schedule_render(output.as_raw()) }
    }

    // ===== Views =====

    fn view_focus(&self, view: View) {
        unsafe { sys::wlc_view_focus(view.as_raw()) }
    }

    fn view_close(&self, view: View) {
        unsafe { sys::wlc_view_close(view.as_raw()) }
    }

    fn view_output(&self, view: View) -> Output {
        Output::from_raw(unsafe { sys::wlc_view_get_output(view.as_raw()) })
    }

    fn view_set_output(&self, view: View, output: Output) {
        unsafe { sys::wlc_view_set_output(view.as_raw(), output.as_raw()) }
    }

    fn view_send_to_back(&self, view: View) {
        unsafe { sys::wlc_view_send_to_back(view.as_raw()) }
    }

    fn view_send_below(&self, view: View, other: View) {
        unsafe { sys::wlc_view_send_below(view.as_raw(), other.as_raw()) }
    }

    fn view_bring_above(&self, view: View, other: View) {
        unsafe { sys::wlc_view_bring_above(view.as_raw(), other.as_raw()) }
    }

    fn view_bring_to_front(&self, view: View) {
        unsafe { sys::wlc_view_bring_to_front(view.as_raw()) }
    }

    fn view_mask(&self, view: View) -> u32 {
        unsafe { sys::wlc_view_get_mask(view.as_raw()) }
    }

    fn view_set_mask(&self, view: View, mask: u32) {
        unsafe { sys::wlc_view_set_mask(view.as_raw(), mask) }
    }

    fn view_geometry(&self, view: View) -> Option<Geometry> {
        unsafe { from_native(sys::wlc_view_get_geometry(view.as_raw())) }
    }

    fn view_set_geometry(&self, view: View, edges: ResizeEdge, geometry: &Geometry) {
        let native: sys::wlc_geometry = (*geometry).into();
        unsafe { sys::wlc_view_set_geometry(view.as_raw(), edges.bits(), &native) }
    }

    fn view_type(&self, view: View) -> ViewType {
        ViewType::from_bits_retain(unsafe { sys::wlc_view_get_type(view.as_raw()) })
    }

    fn view_set_type(&self, view: View, kind: ViewType, toggle: bool) {
        unsafe { sys::wlc_view_set_type(view.as_raw(), kind.bits(), toggle) }
    }

    fn view_state(&self, view: View) -> ViewState {
        ViewState::from_bits_retain(unsafe { sys::wlc_view_get_state(view.as_raw()) })
    }

    fn view_set_state(&self, view: View, state: ViewState, toggle: bool) {
        unsafe { sys::wlc_view_set_state(view.as_raw(), state.bits(), toggle) }
    }

    fn view_parent(&self, view: View) -> View {
        View::from_raw(unsafe { sys::wlc_view_get_parent(view.as_raw()) })
    }

    fn view_set_parent(&self, view: View, parent: View) {
        unsafe { sys::wlc_view_set_parent(view.as_raw(), parent.as_raw()) }
    }

    fn view_title(&self, view: View) -> Option<String> {
        unsafe { string_from_raw(sys::wlc_view_get_title(view.as_raw())) }
    }

    fn view_class(&self, view: View) -> Option<String> {
        unsafe { string_from_raw(sys::wlc_view_get_class(view.as_raw())) }
    }

    fn view_app_id(&self, view: View) -> Option<String> {
        unsafe { string_from_raw(sys::wlc_view_get_app_id(view.as_raw())) }
    }

    // ===== Surfaces =====

    fn view_surface(&self, view: View) -> Resource {
        Resource::from_raw(unsafe { sys::wlc_view_get_surface(view.as_raw()) })
    }

    fn surface_size(&self, surface: Resource) -> Option<Size> {
        unsafe { from_native(sys::wlc_surface_get_size(surface.as_raw())) }
    }

    fn surface_render(&self, surface: Resource, geometry: &Geometry) {
        let native: sys::wlc_geometry = (*geometry).into();
        unsafe { sys::wlc_surface_render(surface.as_raw(), &native) }
    }

    // ===== Wayland interop =====

    fn wl_display(&self) -> *mut sys::wl_display {
        unsafe { sys::wlc_get_wl_display() }
    }

    fn view_from_surface_resource(&self, resource: *mut sys::wl_resource) -> View {
        View::from_raw(unsafe { sys::wlc_handle_from_wl_surface_resource(resource) })
    }

    fn output_from_output_resource(&self, resource: *mut sys::wl_resource) -> Output {
        Output::from_raw(unsafe { sys::wlc_handle_from_wl_output_resource(resource) })
    }

    fn resource_from_surface_resource(&self, resource: *mut sys::wl_resource) -> Resource {
        Resource::from_raw(unsafe { sys::wlc_resource_from_wl_surface_resource(resource) })
    }

    // ===== Input =====

    fn keysym_for_key(&self, key: u32, modifiers: Option<&Modifiers>) -> u32 {
        let native = modifiers.map(|m| sys::wlc_modifiers::from(*m));
        let ptr = native.as_ref().map_or(ptr::null(), |m| m as *const _);
        unsafe { sys::wlc_keyboard_get_keysym_for_key(key, ptr) }
    }

    fn utf32_for_key(&self, key: u32, modifiers: Option<&Modifiers>) -> u32 {
        let native = modifiers.map(|m| sys::wlc_modifiers::from(*m));
        let ptr = native.as_ref().map_or(ptr::null(), |m| m as *const _);
        unsafe { sys::wlc_keyboard_get_utf32_for_key(key, ptr) }
    }

    fn current_keys(&self) -> Vec<u32> {
        let mut len: usize = 0;
        unsafe {
            let ptr = sys::wlc_keyboard_get_current_keys(&mut len);
            u32s_from_raw(ptr, len)
        }
    }

    fn pointer_position(&self) -> Point {
        let mut native = sys::wlc_point::default();
        unsafe { sys::wlc_pointer_get_position(&mut native) };
        native.into()
    }

    fn set_pointer_position(&self, position: Point) {
        let native: sys::wlc_point = position.into();
        unsafe { sys::wlc_pointer_set_position(&native) }
    }
}
