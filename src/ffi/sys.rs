//! Raw libwlc ABI.
//!
//! Fixed-layout structs, the `wlc_interface` callback descriptor and the
//! exported engine functions. Everything here mirrors `wlc/wlc.h`,
//! `wlc/wlc-render.h` and `wlc/wlc-wayland.h` field for field; a mismatch in
//! argument count, order or struct layout is an ABI break.
//!
//! The function declarations are only compiled with the `native` feature,
//! which also links `libwlc` (see `build.rs`).

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_void};

/// Opaque object handle (`uintptr_t`), zero means "none".
pub type wlc_handle = usize;

/// Opaque surface resource (`uintptr_t`), zero means "none".
pub type wlc_resource = usize;

// ============================================================================
// Value structs
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct wlc_point {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct wlc_size {
    pub w: u32,
    pub h: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct wlc_geometry {
    pub origin: wlc_point,
    pub size: wlc_size,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct wlc_modifiers {
    pub leds: u32,
    pub mods: u32,
}

// ============================================================================
// Opaque engine-owned objects
// ============================================================================

#[repr(C)]
pub struct wlc_event_source {
    _private: [u8; 0],
}

#[repr(C)]
pub struct libinput_device {
    _private: [u8; 0],
}

#[repr(C)]
pub struct wl_resource {
    _private: [u8; 0],
}

#[repr(C)]
pub struct wl_display {
    _private: [u8; 0],
}

// ============================================================================
// Callback signatures
// ============================================================================

pub type wlc_created_cb = extern "C" fn(handle: wlc_handle) -> bool;
pub type wlc_handle_cb = extern "C" fn(handle: wlc_handle);
pub type wlc_focus_cb = extern "C" fn(handle: wlc_handle, focus: bool);
pub type wlc_resolution_cb =
    extern "C" fn(output: wlc_handle, from: *const wlc_size, to: *const wlc_size);
pub type wlc_move_to_output_cb =
    extern "C" fn(view: wlc_handle, from_output: wlc_handle, to_output: wlc_handle);
pub type wlc_geometry_request_cb = extern "C" fn(view: wlc_handle, geometry: *const wlc_geometry);
pub type wlc_state_request_cb = extern "C" fn(view: wlc_handle, state: u32, toggle: bool);
pub type wlc_move_request_cb = extern "C" fn(view: wlc_handle, origin: *const wlc_point);
pub type wlc_resize_request_cb =
    extern "C" fn(view: wlc_handle, edges: u32, origin: *const wlc_point);
pub type wlc_key_cb = extern "C" fn(
    view: wlc_handle,
    time: u32,
    modifiers: *const wlc_modifiers,
    key: u32,
    state: u32,
) -> bool;
pub type wlc_button_cb = extern "C" fn(
    view: wlc_handle,
    time: u32,
    modifiers: *const wlc_modifiers,
    button: u32,
    state: u32,
    position: *const wlc_point,
) -> bool;
pub type wlc_scroll_cb = extern "C" fn(
    view: wlc_handle,
    time: u32,
    modifiers: *const wlc_modifiers,
    axis_bits: u8,
    amount: *const f64,
) -> bool;
pub type wlc_motion_cb =
    extern "C" fn(view: wlc_handle, time: u32, position: *const wlc_point) -> bool;
pub type wlc_touch_cb = extern "C" fn(
    view: wlc_handle,
    time: u32,
    modifiers: *const wlc_modifiers,
    touch: u32,
    slot: i32,
    position: *const wlc_point,
) -> bool;
pub type wlc_void_cb = extern "C" fn();
pub type wlc_device_created_cb = extern "C" fn(device: *mut libinput_device) -> bool;
pub type wlc_device_cb = extern "C" fn(device: *mut libinput_device);

pub type wlc_fd_cb = extern "C" fn(fd: c_int, mask: u32, arg: *mut c_void) -> c_int;
pub type wlc_timer_cb = extern "C" fn(arg: *mut c_void) -> c_int;
pub type wlc_log_cb = extern "C" fn(kind: u32, text: *const c_char);

// ============================================================================
// Interface descriptor
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_render_interface {
    pub pre: Option<wlc_handle_cb>,
    pub post: Option<wlc_handle_cb>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_output_interface {
    pub created: Option<wlc_created_cb>,
    pub destroyed: Option<wlc_handle_cb>,
    pub focus: Option<wlc_focus_cb>,
    pub resolution: Option<wlc_resolution_cb>,
    pub render: wlc_render_interface,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_view_request_interface {
    pub geometry: Option<wlc_geometry_request_cb>,
    pub state: Option<wlc_state_request_cb>,
    pub move_: Option<wlc_move_request_cb>,
    pub resize: Option<wlc_resize_request_cb>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_view_interface {
    pub created: Option<wlc_created_cb>,
    pub destroyed: Option<wlc_handle_cb>,
    pub focus: Option<wlc_focus_cb>,
    pub move_to_output: Option<wlc_move_to_output_cb>,
    pub request: wlc_view_request_interface,
    pub render: wlc_render_interface,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_keyboard_interface {
    pub key: Option<wlc_key_cb>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_pointer_interface {
    pub button: Option<wlc_button_cb>,
    pub scroll: Option<wlc_scroll_cb>,
    pub motion: Option<wlc_motion_cb>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_touch_interface {
    pub touch: Option<wlc_touch_cb>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_compositor_interface {
    pub ready: Option<wlc_void_cb>,
    pub terminate: Option<wlc_void_cb>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_input_interface {
    pub created: Option<wlc_device_created_cb>,
    pub destroyed: Option<wlc_device_cb>,
}

/// The callback table handed to `wlc_init`. A `None` slot is never called
/// by the engine.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct wlc_interface {
    pub output: wlc_output_interface,
    pub view: wlc_view_interface,
    pub keyboard: wlc_keyboard_interface,
    pub pointer: wlc_pointer_interface,
    pub touch: wlc_touch_interface,
    pub compositor: wlc_compositor_interface,
    pub input: wlc_input_interface,
}

// ============================================================================
// Engine entry points
// ============================================================================

#[cfg(feature = "native")]
extern "C" {
    // core
    pub fn wlc_log_set_handler(cb: Option<wlc_log_cb>);
    pub fn wlc_init(interface: *const wlc_interface, argc: c_int, argv: *mut *mut c_char) -> bool;
    pub fn wlc_terminate();
    pub fn wlc_get_backend_type() -> u32;
    pub fn wlc_exec(bin: *const c_char, args: *const *mut c_char);
    pub fn wlc_run();
    pub fn wlc_handle_set_user_data(handle: wlc_handle, userdata: *const c_void);
    pub fn wlc_handle_get_user_data(handle: wlc_handle) -> *mut c_void;
    pub fn wlc_event_loop_add_fd(
        fd: c_int,
        mask: u32,
        cb: wlc_fd_cb,
        arg: *mut c_void,
    ) -> *mut wlc_event_source;
    pub fn wlc_event_loop_add_timer(cb: wlc_timer_cb, arg: *mut c_void) -> *mut wlc_event_source;
    pub fn wlc_event_source_timer_update(source: *mut wlc_event_source, ms_delay: i32) -> bool;
    pub fn wlc_event_source_remove(source: *mut wlc_event_source);

    // outputs
    pub fn wlc_get_outputs(out_memb: *mut usize) -> *const wlc_handle;
    pub fn wlc_get_focused_output() -> wlc_handle;
    pub fn wlc_output_get_name(output: wlc_handle) -> *const c_char;
    pub fn wlc_output_get_sleep(output: wlc_handle) -> bool;
    pub fn wlc_output_set_sleep(output: wlc_handle, sleep: bool);
    pub fn wlc_output_get_resolution(output: wlc_handle) -> *const wlc_size;
    pub fn wlc_output_set_resolution(output: wlc_handle, resolution: *const wlc_size);
    pub fn wlc_output_get_mask(output: wlc_handle) -> u32;
    pub fn wlc_output_set_mask(output: wlc_handle, mask: u32);
    pub fn wlc_output_get_views(output: wlc_handle, out_memb: *mut usize) -> *const wlc_handle;
    pub fn wlc_output_get_mutable_views(output: wlc_handle, out_memb: *mut usize)
        -> *mut wlc_handle;
    pub fn wlc_output_set_views(output: wlc_handle, views: *const wlc_handle, memb: usize)
        -> bool;
    pub fn wlc_output_focus(output: wlc_handle);

    // views
    pub fn wlc_view_focus(view: wlc_handle);
    pub fn wlc_view_close(view: wlc_handle);
    pub fn wlc_view_get_output(view: wlc_handle) -> wlc_handle;
    pub fn wlc_view_set_output(view: wlc_handle, output: wlc_handle);
    pub fn wlc_view_send_to_back(view: wlc_handle);
    pub fn wlc_view_send_below(view: wlc_handle, other: wlc_handle);
    pub fn wlc_view_bring_above(view: wlc_handle, other: wlc_handle);
    pub fn wlc_view_bring_to_front(view: wlc_handle);
    pub fn wlc_view_get_mask(view: wlc_handle) -> u32;
    pub fn wlc_view_set_mask(view: wlc_handle, mask: u32);
    pub fn wlc_view_get_geometry(view: wlc_handle) -> *const wlc_geometry;
    pub fn wlc_view_set_geometry(view: wlc_handle, edges: u32, geometry: *const wlc_geometry);
    pub fn wlc_view_get_type(view: wlc_handle) -> u32;
    pub fn wlc_view_set_type(view: wlc_handle, kind: u32, toggle: bool);
    pub fn wlc_view_get_state(view: wlc_handle) -> u32;
    pub fn wlc_view_set_state(view: wlc_handle, state: u32, toggle: bool);
    pub fn wlc_view_get_parent(view: wlc_handle) -> wlc_handle;
    pub fn wlc_view_set_parent(view: wlc_handle, parent: wlc_handle);
    pub fn wlc_view_get_title(view: wlc_handle) -> *const c_char;
    pub fn wlc_view_get_class(view: wlc_handle) -> *const c_char;
    pub fn wlc_view_get_app_id(view: wlc_handle) -> *const c_char;

    // input
    pub fn wlc_keyboard_get_keysym_for_key(key: u32, modifiers: *const wlc_modifiers) -> u32;
    pub fn wlc_keyboard_get_utf32_for_key(key: u32, modifiers: *const wlc_modifiers) -> u32;
    pub fn wlc_keyboard_get_current_keys(out_memb: *mut usize) -> *const u32;
    pub fn wlc_pointer_get_position(out_position: *mut wlc_point);
    pub fn wlc_pointer_set_position(position: *const wlc_point);

    // render
    pub fn wlc_surface_render(surface: wlc_resource, geometry: *const wlc_geometry);
    pub fn wlc_output_schedule_render(output: wlc_handle);

    // wayland
    pub fn wlc_get_wl_display() -> *mut wl_display;
    pub fn wlc_handle_from_wl_surface_resource(resource: *mut wl_resource) -> wlc_handle;
    pub fn wlc_handle_from_wl_output_resource(resource: *mut wl_resource) -> wlc_handle;
    pub fn wlc_resource_from_wl_surface_resource(resource: *mut wl_resource) -> wlc_resource;
    pub fn wlc_view_get_surface(view: wlc_handle) -> wlc_resource;
    pub fn wlc_surface_get_size(surface: wlc_resource) -> *const wlc_size;
}
