//! Demo window manager over the bridge.
//!
//! Tiles views in two columns and supports Ctrl+drag to move, Ctrl+right
//! drag to resize, Ctrl+Q to close, Ctrl+Down to send to back, Ctrl+Return
//! to spawn `$TERMINAL` and Ctrl+Escape to quit. Built with the `native`
//! feature it drives the system libwlc; otherwise it replays a short
//! scripted session on the stub engine.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};

use wlc_bridge::util::logging::{init_tracing, MAIN, WM};
use wlc_bridge::{
    wlog, BridgeConfig, ButtonEvent, ButtonState, Compositor, Engine, EventInterface, Geometry,
    Handler, KeyEvent, Mods, MotionEvent, Output, Point, Propagation, ResizeEdge, Size, Verdict,
    View, ViewState,
};

// linux/input-event-codes.h
const BTN_LEFT: u32 = 0x110;
const BTN_RIGHT: u32 = 0x111;

// xkbcommon-keysyms.h
const XKB_KEY_Q: u32 = 0x0071;
const XKB_KEY_ESCAPE: u32 = 0xff1b;
const XKB_KEY_RETURN: u32 = 0xff0d;
const XKB_KEY_DOWN: u32 = 0xff54;

const MIN_SIZE: Size = Size { w: 80, h: 40 };

#[derive(Debug, Clone, Copy)]
struct Action {
    view: View,
    grab: Point,
    edges: ResizeEdge,
}

#[derive(Debug, Default)]
struct WindowManager {
    action: RefCell<Option<Action>>,
}

impl WindowManager {
    fn interface(self: &Rc<Self>) -> EventInterface {
        let wm = Rc::clone(self);
        let on_created = Handler::view_created(move |c, view| wm.view_created(c, view));
        let wm = Rc::clone(self);
        let on_destroyed = Handler::view_destroyed(move |c, view| wm.view_destroyed(c, view));
        let wm = Rc::clone(self);
        let on_resolution =
            Handler::output_resolution(move |c, output, _, _| wm.relayout(c, output, View::NONE));
        let wm = Rc::clone(self);
        let on_move = Handler::view_request_move(move |c, view, origin| {
            wm.start_action(c, view, origin);
        });
        let wm = Rc::clone(self);
        let on_resize = Handler::view_request_resize(move |c, view, edges, origin| {
            wm.start_resize(c, view, edges, origin)
        });
        let wm = Rc::clone(self);
        let on_button = Handler::pointer_button(move |c, event| wm.pointer_button(c, event));
        let wm = Rc::clone(self);
        let on_motion = Handler::pointer_motion(move |c, event| wm.pointer_motion(c, event));

        EventInterface::builder()
            .on(on_created)
            .on(on_destroyed)
            .on(on_resolution)
            .on(on_move)
            .on(on_resize)
            .on(on_button)
            .on(on_motion)
            .on(Handler::view_focus(|c, view, focus| {
                c.engine().view_set_state(view, ViewState::ACTIVATED, focus);
            }))
            .on(Handler::keyboard_key(keyboard_key))
            .on(Handler::compositor_ready(|c| {
                wlog!(WM, "Compositor ready on {:?} backend", c.engine().backend_type());
            }))
            .build()
    }

    fn view_created(&self, c: &Compositor, view: View) -> Verdict {
        let engine = c.engine();
        let output = engine.view_output(view);
        engine.view_set_mask(view, engine.output_mask(output));
        engine.view_bring_to_front(view);
        engine.view_focus(view);
        self.relayout(c, output, View::NONE);
        tracing::info!(%view, title = ?engine.view_title(view), "View mapped");
        Verdict::Accepted
    }

    fn view_destroyed(&self, c: &Compositor, view: View) {
        let engine = c.engine();
        let output = engine.view_output(view);
        if self.action.borrow().is_some_and(|action| action.view == view) {
            self.action.replace(None);
        }
        engine.view_focus(topmost(engine, output, view));
        self.relayout(c, output, view);
    }

    /// Two columns, filled row by row; an odd last view spans the width.
    /// `leaving` is a view being destroyed that still shows up in the list.
    fn relayout(&self, c: &Compositor, output: Output, leaving: View) {
        let engine = c.engine();
        let Some(resolution) = engine.output_resolution(output) else {
            return;
        };
        let views: Vec<View> = engine
            .output_views(output)
            .into_iter()
            .filter(|&view| view != leaving)
            .collect();
        if views.is_empty() {
            return;
        }

        let rows = u32::try_from(((views.len() + 1) / 2).max(1)).unwrap_or(u32::MAX);
        let w = resolution.w / 2;
        let h = resolution.h / rows;

        for (i, &view) in views.iter().enumerate() {
            let column = i % 2;
            let row = u32::try_from(i / 2).unwrap_or(u32::MAX);
            let last_alone = column == 0 && i == views.len() - 1;

            let geometry = Geometry::from_parts(
                i32::try_from(column as u32 * w).unwrap_or(i32::MAX),
                i32::try_from(row.saturating_mul(h)).unwrap_or(i32::MAX),
                if last_alone { resolution.w } else { w },
                h,
            );
            engine.view_set_geometry(view, ResizeEdge::empty(), &geometry);
        }
    }

    fn start_action(&self, c: &Compositor, view: View, origin: Point) -> bool {
        if self.action.borrow().is_some() {
            return false;
        }
        self.action.replace(Some(Action {
            view,
            grab: origin,
            edges: ResizeEdge::empty(),
        }));
        c.engine().view_bring_to_front(view);
        true
    }

    fn start_resize(&self, c: &Compositor, view: View, edges: ResizeEdge, origin: Point) {
        let Some(geometry) = c.engine().view_geometry(view) else {
            return;
        };
        if !self.start_action(c, view, origin) {
            return;
        }

        let mut edges = edges;
        if edges.is_empty() {
            let half_w = i64::from(geometry.origin.x) + i64::from(geometry.size.w / 2);
            let half_h = i64::from(geometry.origin.y) + i64::from(geometry.size.h / 2);
            let (x, y) = (i64::from(origin.x), i64::from(origin.y));
            if x < half_w {
                edges |= ResizeEdge::LEFT;
            } else if x > half_w {
                edges |= ResizeEdge::RIGHT;
            }
            if y < half_h {
                edges |= ResizeEdge::TOP;
            } else if y > half_h {
                edges |= ResizeEdge::BOTTOM;
            }
        }

        if let Some(action) = self.action.borrow_mut().as_mut() {
            action.edges = edges;
        }
        c.engine().view_set_state(view, ViewState::RESIZING, true);
    }

    fn stop_action(&self, c: &Compositor) {
        if let Some(action) = self.action.take() {
            c.engine().view_set_state(action.view, ViewState::RESIZING, false);
        }
    }

    fn pointer_button(&self, c: &Compositor, event: &ButtonEvent) -> Propagation {
        if event.state == ButtonState::Pressed {
            c.engine().view_focus(event.view);
            let ctrl = event.modifiers.mods.contains(Mods::CTRL);
            if event.view != View::NONE && ctrl {
                match event.button {
                    BTN_LEFT => {
                        self.start_action(c, event.view, event.position);
                    }
                    BTN_RIGHT => self.start_resize(c, event.view, ResizeEdge::empty(), event.position),
                    _ => {}
                }
            }
        } else {
            self.stop_action(c);
        }

        Propagation::from(self.action.borrow().is_some())
    }

    fn pointer_motion(&self, c: &Compositor, event: &MotionEvent) -> Propagation {
        let engine = c.engine();
        let action = *self.action.borrow();

        if let Some(mut action) = action {
            if let Some(geometry) = engine.view_geometry(action.view) {
                let dx = event.position.x.saturating_sub(action.grab.x);
                let dy = event.position.y.saturating_sub(action.grab.y);
                let next = drag(geometry, action.edges, dx, dy);
                engine.view_set_geometry(action.view, action.edges, &next);
            }
            action.grab = event.position;
            self.action.replace(Some(action));
        }

        engine.set_pointer_position(event.position);
        Propagation::from(action.is_some())
    }
}

/// Apply a pointer delta to `geometry`: a move when `edges` is empty,
/// otherwise a resize that never shrinks below `MIN_SIZE`.
fn drag(geometry: Geometry, edges: ResizeEdge, dx: i32, dy: i32) -> Geometry {
    if edges.is_empty() {
        let origin = Point::new(
            geometry.origin.x.saturating_add(dx),
            geometry.origin.y.saturating_add(dy),
        );
        return Geometry::new(origin, geometry.size);
    }

    let (mut x, mut y) = (i64::from(geometry.origin.x), i64::from(geometry.origin.y));
    let (mut w, mut h) = (i64::from(geometry.size.w), i64::from(geometry.size.h));
    let (dx, dy) = (i64::from(dx), i64::from(dy));

    if edges.contains(ResizeEdge::LEFT) {
        w -= dx;
        x += dx;
    } else if edges.contains(ResizeEdge::RIGHT) {
        w += dx;
    }
    if edges.contains(ResizeEdge::TOP) {
        h -= dy;
        y += dy;
    } else if edges.contains(ResizeEdge::BOTTOM) {
        h += dy;
    }

    let mut next = geometry;
    if w >= i64::from(MIN_SIZE.w) {
        next.origin.x = i32::try_from(x).unwrap_or(next.origin.x);
        next.size.w = u32::try_from(w).unwrap_or(next.size.w);
    }
    if h >= i64::from(MIN_SIZE.h) {
        next.origin.y = i32::try_from(y).unwrap_or(next.origin.y);
        next.size.h = u32::try_from(h).unwrap_or(next.size.h);
    }
    next
}

fn topmost(engine: &dyn Engine, output: Output, leaving: View) -> View {
    engine
        .output_views(output)
        .into_iter()
        .rev()
        .find(|&view| view != leaving)
        .unwrap_or(View::NONE)
}

fn keyboard_key(c: &Compositor, event: &KeyEvent) -> Propagation {
    if !event.state.is_pressed() || !event.modifiers.mods.contains(Mods::CTRL) {
        return Propagation::PassThrough;
    }
    let engine = c.engine();

    match engine.keysym_for_key(event.key, None) {
        XKB_KEY_Q if event.view != View::NONE => engine.view_close(event.view),
        XKB_KEY_DOWN if event.view != View::NONE => {
            let output = engine.view_output(event.view);
            engine.view_send_to_back(event.view);
            engine.view_focus(topmost(engine, output, View::NONE));
        }
        XKB_KEY_ESCAPE => c.terminate(),
        XKB_KEY_RETURN => {
            let terminal = std::env::var("TERMINAL")
                .ok()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "weston-terminal".to_string());
            if let Err(err) = c.exec(&terminal, &[] as &[&str]) {
                tracing::warn!("Cannot spawn {}: {}", terminal, err);
            }
        }
        _ => return Propagation::PassThrough,
    }
    Propagation::Consumed
}

// ============================================================================
// Engine selection
// ============================================================================

#[cfg(feature = "native")]
fn engine() -> Rc<dyn Engine> {
    Rc::new(wlc_bridge::NativeEngine::new())
}

#[cfg(not(feature = "native"))]
fn engine() -> Rc<dyn Engine> {
    use wlc_bridge::{KeyState, Modifiers, StubEngine, ViewSpec};

    // evdev key codes
    const KEY_ESC: u32 = 1;
    const KEY_ENTER: u32 = 28;

    let stub = Rc::new(StubEngine::new());
    stub.map_key(KEY_ESC, XKB_KEY_ESCAPE, 0x1b);
    stub.map_key(KEY_ENTER, XKB_KEY_RETURN, 0x0d);

    stub.schedule(|e| {
        if let Some(output) = e.connect_output("HEADLESS-1", Size::new(1280, 720)) {
            e.map_view(output, ViewSpec::new("left", Geometry::default()));
            e.map_view(output, ViewSpec::new("right", Geometry::default()));
            e.map_view(output, ViewSpec::new("bottom", Geometry::default()));
        }
    });
    stub.schedule(|e| {
        e.set_modifiers(Modifiers::new(Default::default(), Mods::CTRL));
        e.motion(Point::new(100, 100));
        e.button(BTN_LEFT, ButtonState::Pressed);
        e.motion(Point::new(160, 130));
        e.button(BTN_LEFT, ButtonState::Released);
    });
    stub.schedule(|e| {
        e.key(KEY_ENTER, KeyState::Pressed);
        e.key(KEY_ENTER, KeyState::Released);
    });
    stub.schedule(|e| {
        for output in e.outputs() {
            for view in e.output_views(output) {
                wlog!(MAIN, "{} {:?} at {:?}", view, e.view_title(view), e.view_geometry(view));
            }
        }
        e.key(KEY_ESC, KeyState::Pressed);
    });
    stub
}

fn main() -> Result<()> {
    let config = BridgeConfig::from_env();
    init_tracing(&config.log_filter);

    let wm = Rc::new(WindowManager::default());
    let compositor = Compositor::with_interface(engine(), wm.interface(), config)
        .context("Failed to start compositor")?;

    wlog!(MAIN, "Running with event mask {:#x}", compositor.activation_mask().bits());
    compositor.run().context("Compositor loop failed")?;
    wlog!(MAIN, "Bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_moves_without_edges() {
        let g = Geometry::from_parts(10, 10, 200, 100);
        assert_eq!(drag(g, ResizeEdge::empty(), -20, 5), Geometry::from_parts(-10, 15, 200, 100));
    }

    #[test]
    fn test_drag_move_clamps_at_coordinate_limits() {
        let g = Geometry::from_parts(i32::MAX - 10, i32::MIN + 10, 200, 100);
        let moved = drag(g, ResizeEdge::empty(), 50, -50);
        assert_eq!(moved, Geometry::from_parts(i32::MAX, i32::MIN, 200, 100));

        let resized = drag(g, ResizeEdge::LEFT, i32::MIN, 0);
        assert_eq!(resized, Geometry::from_parts(-11, i32::MIN + 10, 2_147_483_848, 100));
    }

    #[test]
    fn test_drag_resize_respects_minimum() {
        let g = Geometry::from_parts(0, 0, 100, 50);
        let grown = drag(g, ResizeEdge::BOTTOM_RIGHT, 30, 10);
        assert_eq!(grown, Geometry::from_parts(0, 0, 130, 60));

        let shrunk = drag(g, ResizeEdge::TOP_LEFT, 50, 20);
        assert_eq!(shrunk, g);
    }
}
