//! Dispatch shims: the entry points the engine calls.
//!
//! One `extern "C"` function per event kind, each with the engine's exact
//! argument list. A shim converts handles and by-address structs into host
//! values, looks up the single handler for its kind on the thread's bound
//! compositor, calls it synchronously and converts the result back to the
//! native boolean.
//!
//! Only shims whose kind is active are ever placed in the engine's table
//! (see [`enable`]), so an empty slot is unreachable in a correct setup.
//! If it happens anyway the shim logs the contract violation and returns
//! the engine's own default: accept new objects, pass input through.
//!
//! Handlers must not panic. Unwinding cannot cross an `extern "C"`
//! boundary, so a panicking handler aborts the process. Translate host
//! errors before returning from a handler.

use std::os::raw::{c_char, c_int, c_void};

use crate::core::compositor::{Compositor, SourceEntry};
use crate::core::handle::{InputDevice, Output, View};
use crate::core::interface::{
    ActivationMask, ButtonEvent, EventKind, KeyEvent, MotionEvent, ScrollEvent, TouchEvent,
};
use crate::core::registry;
use crate::ffi::marshal::{from_native, string_from_raw};
use crate::ffi::sys::{self, wlc_handle};
use crate::ffi::types::{
    ButtonState, EventMask, Geometry, KeyState, LogType, Modifiers, Point, ResizeEdge, ScrollAxis,
    Size, TouchType, ViewState,
};

const ACCEPT_BY_DEFAULT: bool = true;
const PASS_THROUGH_BY_DEFAULT: bool = false;

/// Run `f` against the bound compositor. `f` returns `None` when the slot
/// for `kind` is empty.
fn dispatch<R>(kind: EventKind, fallback: R, f: impl FnOnce(&Compositor) -> Option<R>) -> R {
    let Some(compositor) = registry::current() else {
        tracing::error!(kind = kind.name(), "Event delivered with no compositor bound");
        return fallback;
    };

    tracing::trace!(kind = kind.name(), "Dispatching event");
    match f(&compositor) {
        Some(result) => result,
        None => {
            tracing::error!(kind = kind.name(), "Event delivered to an empty handler slot");
            fallback
        }
    }
}

fn notify(kind: EventKind, f: impl FnOnce(&Compositor) -> Option<()>) {
    dispatch(kind, (), f)
}

// Native structs arrive by address. A null pointer is a broken engine; use
// the zero value rather than dereferencing it.
unsafe fn point(ptr: *const sys::wlc_point) -> Point {
    from_native(ptr).unwrap_or_default()
}

unsafe fn size(ptr: *const sys::wlc_size) -> Size {
    from_native(ptr).unwrap_or_default()
}

unsafe fn modifiers(ptr: *const sys::wlc_modifiers) -> Modifiers {
    from_native(ptr).unwrap_or_default()
}

// ============================================================================
// Output
// ============================================================================

extern "C" fn output_created(output: wlc_handle) -> bool {
    dispatch(EventKind::OutputCreated, ACCEPT_BY_DEFAULT, |c| {
        let handler = c.interface().output.created.get()?;
        Some(handler(c, Output::from_raw(output)).into())
    })
}

extern "C" fn output_destroyed(output: wlc_handle) {
    notify(EventKind::OutputDestroyed, |c| {
        let handler = c.interface().output.destroyed.get()?;
        handler(c, Output::from_raw(output));
        Some(())
    })
}

extern "C" fn output_focus(output: wlc_handle, focus: bool) {
    notify(EventKind::OutputFocus, |c| {
        let handler = c.interface().output.focus.get()?;
        handler(c, Output::from_raw(output), focus);
        Some(())
    })
}

extern "C" fn output_resolution(
    output: wlc_handle,
    from: *const sys::wlc_size,
    to: *const sys::wlc_size,
) {
    notify(EventKind::OutputResolution, |c| {
        let handler = c.interface().output.resolution.get()?;
        let (from, to) = unsafe { (size(from), size(to)) };
        handler(c, Output::from_raw(output), from, to);
        Some(())
    })
}

extern "C" fn output_render_pre(output: wlc_handle) {
    notify(EventKind::OutputRenderPre, |c| {
        let handler = c.interface().output.render.pre.get()?;
        handler(c, Output::from_raw(output));
        Some(())
    })
}

extern "C" fn output_render_post(output: wlc_handle) {
    notify(EventKind::OutputRenderPost, |c| {
        let handler = c.interface().output.render.post.get()?;
        handler(c, Output::from_raw(output));
        Some(())
    })
}

// ============================================================================
// View
// ============================================================================

extern "C" fn view_created(view: wlc_handle) -> bool {
    dispatch(EventKind::ViewCreated, ACCEPT_BY_DEFAULT, |c| {
        let handler = c.interface().view.created.get()?;
        Some(handler(c, View::from_raw(view)).into())
    })
}

extern "C" fn view_destroyed(view: wlc_handle) {
    notify(EventKind::ViewDestroyed, |c| {
        let handler = c.interface().view.destroyed.get()?;
        handler(c, View::from_raw(view));
        Some(())
    })
}

extern "C" fn view_focus(view: wlc_handle, focus: bool) {
    notify(EventKind::ViewFocus, |c| {
        let handler = c.interface().view.focus.get()?;
        handler(c, View::from_raw(view), focus);
        Some(())
    })
}

extern "C" fn view_move_to_output(view: wlc_handle, from: wlc_handle, to: wlc_handle) {
    notify(EventKind::ViewMoveToOutput, |c| {
        let handler = c.interface().view.move_to_output.get()?;
        handler(c, View::from_raw(view), Output::from_raw(from), Output::from_raw(to));
        Some(())
    })
}

extern "C" fn view_request_geometry(view: wlc_handle, geometry: *const sys::wlc_geometry) {
    notify(EventKind::ViewRequestGeometry, |c| {
        let handler = c.interface().view.request.geometry.get()?;
        let geometry: Geometry = unsafe { from_native(geometry) }.unwrap_or_default();
        handler(c, View::from_raw(view), geometry);
        Some(())
    })
}

extern "C" fn view_request_state(view: wlc_handle, state: u32, toggle: bool) {
    notify(EventKind::ViewRequestState, |c| {
        let handler = c.interface().view.request.state.get()?;
        handler(c, View::from_raw(view), ViewState::from_bits_retain(state), toggle);
        Some(())
    })
}

extern "C" fn view_request_move(view: wlc_handle, origin: *const sys::wlc_point) {
    notify(EventKind::ViewRequestMove, |c| {
        let handler = c.interface().view.request.move_.get()?;
        handler(c, View::from_raw(view), unsafe { point(origin) });
        Some(())
    })
}

extern "C" fn view_request_resize(view: wlc_handle, edges: u32, origin: *const sys::wlc_point) {
    notify(EventKind::ViewRequestResize, |c| {
        let handler = c.interface().view.request.resize.get()?;
        let edges = ResizeEdge::from_bits_retain(edges);
        handler(c, View::from_raw(view), edges, unsafe { point(origin) });
        Some(())
    })
}

extern "C" fn view_render_pre(view: wlc_handle) {
    notify(EventKind::ViewRenderPre, |c| {
        let handler = c.interface().view.render.pre.get()?;
        handler(c, View::from_raw(view));
        Some(())
    })
}

extern "C" fn view_render_post(view: wlc_handle) {
    notify(EventKind::ViewRenderPost, |c| {
        let handler = c.interface().view.render.post.get()?;
        handler(c, View::from_raw(view));
        Some(())
    })
}

// ============================================================================
// Input events
// ============================================================================

extern "C" fn keyboard_key(
    view: wlc_handle,
    time: u32,
    mods: *const sys::wlc_modifiers,
    key: u32,
    state: u32,
) -> bool {
    dispatch(EventKind::KeyboardKey, PASS_THROUGH_BY_DEFAULT, |c| {
        let handler = c.interface().keyboard.key.get()?;
        let event = KeyEvent {
            view: View::from_raw(view),
            time,
            modifiers: unsafe { modifiers(mods) },
            key,
            state: KeyState::from_raw(state),
        };
        Some(handler(c, &event).into())
    })
}

extern "C" fn pointer_button(
    view: wlc_handle,
    time: u32,
    mods: *const sys::wlc_modifiers,
    button: u32,
    state: u32,
    position: *const sys::wlc_point,
) -> bool {
    dispatch(EventKind::PointerButton, PASS_THROUGH_BY_DEFAULT, |c| {
        let handler = c.interface().pointer.button.get()?;
        let event = ButtonEvent {
            view: View::from_raw(view),
            time,
            modifiers: unsafe { modifiers(mods) },
            button,
            state: ButtonState::from_raw(state),
            position: unsafe { point(position) },
        };
        Some(handler(c, &event).into())
    })
}

extern "C" fn pointer_scroll(
    view: wlc_handle,
    time: u32,
    mods: *const sys::wlc_modifiers,
    axis_bits: u8,
    amount: *const f64,
) -> bool {
    dispatch(EventKind::PointerScroll, PASS_THROUGH_BY_DEFAULT, |c| {
        let handler = c.interface().pointer.scroll.get()?;
        // `double amount[2]`: vertical, horizontal.
        let amount = if amount.is_null() {
            [0.0; 2]
        } else {
            unsafe { *amount.cast::<[f64; 2]>() }
        };
        let event = ScrollEvent {
            view: View::from_raw(view),
            time,
            modifiers: unsafe { modifiers(mods) },
            axes: ScrollAxis::from_bits_retain(axis_bits),
            amount,
        };
        Some(handler(c, &event).into())
    })
}

extern "C" fn pointer_motion(view: wlc_handle, time: u32, position: *const sys::wlc_point) -> bool {
    dispatch(EventKind::PointerMotion, PASS_THROUGH_BY_DEFAULT, |c| {
        let handler = c.interface().pointer.motion.get()?;
        let event = MotionEvent {
            view: View::from_raw(view),
            time,
            position: unsafe { point(position) },
        };
        Some(handler(c, &event).into())
    })
}

extern "C" fn touch(
    view: wlc_handle,
    time: u32,
    mods: *const sys::wlc_modifiers,
    touch: u32,
    slot: i32,
    position: *const sys::wlc_point,
) -> bool {
    dispatch(EventKind::Touch, PASS_THROUGH_BY_DEFAULT, |c| {
        let handler = c.interface().touch.touch.get()?;
        let event = TouchEvent {
            view: View::from_raw(view),
            time,
            modifiers: unsafe { modifiers(mods) },
            touch: TouchType::from_raw(touch),
            slot,
            position: unsafe { point(position) },
        };
        Some(handler(c, &event).into())
    })
}

// ============================================================================
// Compositor and input devices
// ============================================================================

extern "C" fn compositor_ready() {
    notify(EventKind::CompositorReady, |c| {
        let handler = c.interface().compositor.ready.get()?;
        handler(c);
        Some(())
    })
}

extern "C" fn compositor_terminate() {
    notify(EventKind::CompositorTerminate, |c| {
        let handler = c.interface().compositor.terminate.get()?;
        handler(c);
        Some(())
    })
}

extern "C" fn input_created(device: *mut sys::libinput_device) -> bool {
    let Some(device) = InputDevice::from_ptr(device) else {
        tracing::warn!("Input device announced without a device pointer");
        return ACCEPT_BY_DEFAULT;
    };
    dispatch(EventKind::InputCreated, ACCEPT_BY_DEFAULT, |c| {
        let handler = c.interface().input.created.get()?;
        Some(handler(c, device).into())
    })
}

extern "C" fn input_destroyed(device: *mut sys::libinput_device) {
    let Some(device) = InputDevice::from_ptr(device) else {
        return;
    };
    notify(EventKind::InputDestroyed, |c| {
        let handler = c.interface().input.destroyed.get()?;
        handler(c, device);
        Some(())
    })
}

// ============================================================================
// Event loop and log trampolines
// ============================================================================

// The compositor is looked up first: its source table is what keeps the
// entry behind `arg` alive.
pub(crate) extern "C" fn fd_ready(fd: c_int, mask: u32, arg: *mut c_void) -> c_int {
    let Some(compositor) = registry::current() else {
        tracing::error!(fd, "Fd source fired with no compositor bound");
        return 0;
    };
    if let Some(entry) = unsafe { SourceEntry::retain(arg) } {
        entry.fd_ready(&compositor, fd, EventMask::from_bits_retain(mask));
    }
    0
}

pub(crate) extern "C" fn timer_expired(arg: *mut c_void) -> c_int {
    let Some(compositor) = registry::current() else {
        tracing::error!("Timer fired with no compositor bound");
        return 0;
    };
    if let Some(entry) = unsafe { SourceEntry::retain(arg) } {
        entry.timer_expired(&compositor);
    }
    0
}

/// Forward an engine log line into `tracing`.
pub(crate) extern "C" fn log_message(kind: u32, text: *const c_char) {
    let text = unsafe { string_from_raw(text) }.unwrap_or_default();
    match LogType::from_raw(kind) {
        LogType::Info => tracing::info!(target: "wlc", "{}", text),
        LogType::Warn => tracing::warn!(target: "wlc", "{}", text),
        LogType::Error => tracing::error!(target: "wlc", "{}", text),
        LogType::Wayland => tracing::debug!(target: "wlc::wayland", "{}", text),
    }
}

// ============================================================================
// Table population
// ============================================================================

/// Point every slot of `table` whose kind is in `mask` at its shim. Slots
/// outside `mask` are left untouched.
pub(crate) fn enable(table: &mut sys::wlc_interface, mask: ActivationMask) {
    for kind in mask.kinds() {
        match kind {
            EventKind::OutputCreated => table.output.created = Some(output_created),
            EventKind::OutputDestroyed => table.output.destroyed = Some(output_destroyed),
            EventKind::OutputFocus => table.output.focus = Some(output_focus),
            EventKind::OutputResolution => table.output.resolution = Some(output_resolution),
            EventKind::OutputRenderPre => table.output.render.pre = Some(output_render_pre),
            EventKind::OutputRenderPost => table.output.render.post = Some(output_render_post),
            EventKind::ViewCreated => table.view.created = Some(view_created),
            EventKind::ViewDestroyed => table.view.destroyed = Some(view_destroyed),
            EventKind::ViewFocus => table.view.focus = Some(view_focus),
            EventKind::ViewMoveToOutput => table.view.move_to_output = Some(view_move_to_output),
            EventKind::ViewRequestGeometry => {
                table.view.request.geometry = Some(view_request_geometry)
            }
            EventKind::ViewRequestState => table.view.request.state = Some(view_request_state),
            EventKind::ViewRequestMove => table.view.request.move_ = Some(view_request_move),
            EventKind::ViewRequestResize => table.view.request.resize = Some(view_request_resize),
            EventKind::ViewRenderPre => table.view.render.pre = Some(view_render_pre),
            EventKind::ViewRenderPost => table.view.render.post = Some(view_render_post),
            EventKind::KeyboardKey => table.keyboard.key = Some(keyboard_key),
            EventKind::PointerButton => table.pointer.button = Some(pointer_button),
            EventKind::PointerScroll => table.pointer.scroll = Some(pointer_scroll),
            EventKind::PointerMotion => table.pointer.motion = Some(pointer_motion),
            EventKind::Touch => table.touch.touch = Some(touch),
            EventKind::CompositorReady => table.compositor.ready = Some(compositor_ready),
            EventKind::CompositorTerminate => table.compositor.terminate = Some(compositor_terminate),
            EventKind::InputCreated => table.input.created = Some(input_created),
            EventKind::InputDestroyed => table.input.destroyed = Some(input_destroyed),
        }
    }
}

/// Which kinds of `table` are populated, in [`ActivationMask`] form.
pub(crate) fn populated(table: &sys::wlc_interface) -> ActivationMask {
    let slots = [
        table.output.created.is_some(),
        table.output.destroyed.is_some(),
        table.output.focus.is_some(),
        table.output.resolution.is_some(),
        table.output.render.pre.is_some(),
        table.output.render.post.is_some(),
        table.view.created.is_some(),
        table.view.destroyed.is_some(),
        table.view.focus.is_some(),
        table.view.move_to_output.is_some(),
        table.view.request.geometry.is_some(),
        table.view.request.state.is_some(),
        table.view.request.move_.is_some(),
        table.view.request.resize.is_some(),
        table.view.render.pre.is_some(),
        table.view.render.post.is_some(),
        table.keyboard.key.is_some(),
        table.pointer.button.is_some(),
        table.pointer.scroll.is_some(),
        table.pointer.motion.is_some(),
        table.touch.touch.is_some(),
        table.compositor.ready.is_some(),
        table.compositor.terminate.is_some(),
        table.input.created.is_some(),
        table.input.destroyed.is_some(),
    ];
    EventKind::ALL
        .into_iter()
        .zip(slots)
        .filter(|&(_, set)| set)
        .fold(ActivationMask::empty(), |mask, (kind, _)| mask | kind.mask())
}
