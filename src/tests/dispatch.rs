use std::cell::Cell;
use std::rc::Rc;

use super::{recorder, setup};
use crate::core::{
    ActivationMask, ButtonEvent, Engine, EventInterface, Handler, KeyEvent, MotionEvent,
    Propagation, ScrollEvent, TouchEvent, Verdict, View, ViewSpec,
};
use crate::ffi::types::{
    ButtonState, Geometry, KeyState, Leds, Modifiers, Mods, Point, ResizeEdge, ScrollAxis, Size,
    TouchType, ViewState,
};

#[test]
fn test_view_created_and_pointer_motion_scenario() {
    let (engine, compositor) = setup();
    let created = recorder();
    let moved = recorder();

    let log = created.clone();
    let motions = moved.clone();
    let interface = EventInterface::builder()
        .on(Handler::view_created(move |_, view| {
            log.borrow_mut().push(view);
            Verdict::Accepted
        }))
        .on(Handler::pointer_motion(move |_, event: &MotionEvent| {
            motions.borrow_mut().push(*event);
            Propagation::Consumed
        }))
        .build();

    let mask = compositor.install(interface).unwrap();
    assert_eq!(mask.bits(), (1 << 6) | (1 << 19));
    assert_eq!(engine.active_mask(), mask);

    let output = engine.connect_output("DP-1", Size::new(1024, 768)).unwrap();
    let view = engine
        .map_view(output, ViewSpec::new("term", Geometry::from_parts(0, 0, 400, 300)))
        .unwrap();
    assert_eq!(*created.borrow(), vec![view]);

    assert_eq!(engine.motion(Point::new(10, 20)), Propagation::Consumed);
    assert_eq!(engine.motion(Point::new(500, 20)), Propagation::Consumed);
    let moved = moved.borrow();
    assert_eq!(moved.len(), 2);
    assert_eq!(moved[0].view, view);
    assert_eq!(moved[0].position, Point::new(10, 20));
    assert_eq!(moved[1].view, View::NONE);

    // Keyboard was never activated; the engine passes the key through.
    assert_eq!(engine.key(30, KeyState::Pressed), Propagation::PassThrough);
}

#[test]
fn test_rejected_view_gets_no_later_events() {
    let (engine, compositor) = setup();
    let rejected = Rc::new(Cell::new(View::NONE));
    let later = recorder();

    let seen = rejected.clone();
    compositor
        .register(Handler::view_created(move |_, view| {
            seen.set(view);
            Verdict::Rejected
        }))
        .unwrap();
    let log = later.clone();
    compositor
        .register(Handler::view_destroyed(move |_, view| log.borrow_mut().push(("destroyed", view))))
        .unwrap();
    let log = later.clone();
    compositor
        .register(Handler::view_focus(move |_, view, _| log.borrow_mut().push(("focus", view))))
        .unwrap();
    let log = later.clone();
    compositor
        .register(Handler::view_render_pre(move |_, view| log.borrow_mut().push(("render", view))))
        .unwrap();

    let output = engine.connect_output("DP-1", Size::new(800, 600)).unwrap();
    let spec = ViewSpec::new("popup", Geometry::from_parts(0, 0, 100, 100));
    assert!(engine.map_view(output, spec).is_none());

    let view = rejected.get();
    assert!(!view.is_none());
    assert!(engine.output_views(output).is_empty());

    engine.view_focus(view);
    engine.render(output);
    engine.unmap_view(view);
    assert!(later.borrow().is_empty());
}

#[test]
fn test_rejected_output_is_dropped() {
    let (engine, compositor) = setup();
    compositor
        .register(Handler::output_created(|c, output| {
            Verdict::from(c.engine().output_name(output).as_deref() != Some("VIRTUAL-1"))
        }))
        .unwrap();

    assert!(engine.connect_output("VIRTUAL-1", Size::new(640, 480)).is_none());
    let kept = engine.connect_output("HDMI-A-1", Size::new(1920, 1080)).unwrap();
    assert_eq!(engine.outputs(), vec![kept]);
    assert_eq!(engine.focused_output(), kept);
}

#[test]
fn test_register_replaces_handler_in_place() {
    let (engine, compositor) = setup();
    let calls = recorder();

    let log = calls.clone();
    assert!(!compositor
        .register(Handler::keyboard_key(move |_, _| {
            log.borrow_mut().push("first");
            Propagation::PassThrough
        }))
        .unwrap());
    let log = calls.clone();
    assert!(compositor
        .register(Handler::keyboard_key(move |_, _| {
            log.borrow_mut().push("second");
            Propagation::Consumed
        }))
        .unwrap());

    assert_eq!(engine.active_mask(), ActivationMask::KEYBOARD_KEY);
    assert_eq!(engine.key(1, KeyState::Pressed), Propagation::Consumed);
    assert_eq!(*calls.borrow(), vec!["second"]);
}

#[test]
fn test_handlers_reenter_the_engine() {
    let (engine, compositor) = setup();
    let focus = recorder();

    let log = focus.clone();
    let interface = EventInterface::builder()
        .on(Handler::view_created(|c, view| {
            let engine = c.engine();
            engine.view_set_geometry(
                view,
                ResizeEdge::empty(),
                &Geometry::from_parts(-5, 10, 800, 600),
            );
            engine.view_focus(view);
            Verdict::Accepted
        }))
        .on(Handler::view_focus(move |c, view, focused| {
            c.engine().view_set_state(view, ViewState::ACTIVATED, focused);
            log.borrow_mut().push((view, focused));
        }))
        .build();
    compositor.install(interface).unwrap();

    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let first = engine.map_view(output, ViewSpec::default()).unwrap();
    let second = engine.map_view(output, ViewSpec::default()).unwrap();

    assert_eq!(
        *focus.borrow(),
        vec![(first, true), (first, false), (second, true)]
    );
    assert_eq!(engine.focused_view(), second);
    assert!(engine.view_state(second).contains(ViewState::ACTIVATED));
    assert!(!engine.view_state(first).contains(ViewState::ACTIVATED));
    assert_eq!(
        engine.view_geometry(first),
        Some(Geometry::new(Point::new(-5, 10), Size::new(800, 600)))
    );
}

#[test]
fn test_geometry_request_round_trip() {
    let (engine, compositor) = setup();
    compositor
        .register(Handler::view_request_geometry(|c, view, geometry| {
            c.engine().view_set_geometry(view, ResizeEdge::empty(), &geometry);
        }))
        .unwrap();

    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let view = engine.map_view(output, ViewSpec::default()).unwrap();
    let requested = Geometry::new(Point::new(-5, 10), Size::new(800, 600));

    engine.request_geometry(view, requested);
    assert_eq!(engine.view_geometry(view), Some(requested));
}

#[test]
fn test_view_requests_carry_arguments() {
    let (engine, compositor) = setup();
    let requests = recorder();

    let log = requests.clone();
    compositor
        .register(Handler::view_request_state(move |_, view, state, toggle| {
            log.borrow_mut().push(format!("{view} state {:?} {toggle}", state));
        }))
        .unwrap();
    let log = requests.clone();
    compositor
        .register(Handler::view_request_move(move |_, view, origin| {
            log.borrow_mut().push(format!("{view} move {},{}", origin.x, origin.y));
        }))
        .unwrap();
    let log = requests.clone();
    compositor
        .register(Handler::view_request_resize(move |_, view, edges, origin| {
            log.borrow_mut()
                .push(format!("{view} resize {} {},{}", edges.bits(), origin.x, origin.y));
        }))
        .unwrap();

    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let view = engine.map_view(output, ViewSpec::default()).unwrap();
    engine.request_state(view, ViewState::FULLSCREEN, true);
    engine.request_move(view, Point::new(-3, 7));
    engine.request_resize(view, ResizeEdge::BOTTOM_RIGHT, Point::new(40, 50));

    assert_eq!(
        *requests.borrow(),
        vec![
            format!("{view} state {:?} true", ViewState::FULLSCREEN),
            format!("{view} move -3,7"),
            format!("{view} resize 10 40,50"),
        ]
    );
}

#[test]
fn test_key_event_payload() {
    let (engine, compositor) = setup();
    let keys = recorder();

    let log = keys.clone();
    compositor
        .register(Handler::keyboard_key(move |c, event: &KeyEvent| {
            let keysym = c.engine().keysym_for_key(event.key, Some(&event.modifiers));
            log.borrow_mut().push((*event, keysym));
            Propagation::from(event.modifiers.mods.contains(Mods::CTRL))
        }))
        .unwrap();
    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let view = engine.map_view(output, ViewSpec::default()).unwrap();
    engine.view_focus(view);
    engine.map_key(16, 0x71, 'q' as u32);

    assert_eq!(engine.key(16, KeyState::Pressed), Propagation::PassThrough);
    assert_eq!(engine.current_keys(), vec![16]);
    engine.set_modifiers(Modifiers::new(Leds::NUM, Mods::CTRL));
    assert_eq!(engine.key(16, KeyState::Released), Propagation::Consumed);
    assert!(engine.current_keys().is_empty());

    let keys = keys.borrow();
    assert_eq!(keys.len(), 2);
    let (pressed, keysym) = keys[0];
    assert_eq!(pressed.view, view);
    assert_eq!(pressed.key, 16);
    assert_eq!(pressed.state, KeyState::Pressed);
    assert_eq!(keysym, 0x71);
    let (released, _) = keys[1];
    assert_eq!(released.state, KeyState::Released);
    assert_eq!(released.modifiers, Modifiers::new(Leds::NUM, Mods::CTRL));
    assert!(released.time > pressed.time);
    assert_eq!(engine.utf32_for_key(16, None), 'q' as u32);
}

#[test]
fn test_pointer_button_and_scroll_payloads() {
    let (engine, compositor) = setup();
    let buttons = recorder();
    let scrolls = recorder();

    let log = buttons.clone();
    compositor
        .register(Handler::pointer_button(move |_, event: &ButtonEvent| {
            log.borrow_mut().push(*event);
            Propagation::from(!event.view.is_none())
        }))
        .unwrap();
    let log = scrolls.clone();
    compositor
        .register(Handler::pointer_scroll(move |_, event: &ScrollEvent| {
            log.borrow_mut().push(*event);
            Propagation::PassThrough
        }))
        .unwrap();

    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let view = engine
        .map_view(output, ViewSpec::new("a", Geometry::from_parts(100, 100, 200, 200)))
        .unwrap();

    engine.set_pointer_position(Point::new(150, 150));
    assert_eq!(engine.button(0x110, ButtonState::Pressed), Propagation::Consumed);
    engine.set_pointer_position(Point::new(5, 5));
    assert_eq!(engine.button(0x110, ButtonState::Released), Propagation::PassThrough);

    engine.set_pointer_position(Point::new(150, 150));
    assert_eq!(
        engine.scroll(ScrollAxis::VERTICAL, [-2.5, 0.0]),
        Propagation::PassThrough
    );

    let buttons = buttons.borrow();
    assert_eq!(buttons[0].view, view);
    assert_eq!(buttons[0].button, 0x110);
    assert_eq!(buttons[0].position, Point::new(150, 150));
    assert_eq!(buttons[1].view, View::NONE);
    assert_eq!(buttons[1].state, ButtonState::Released);

    let scrolls = scrolls.borrow();
    assert_eq!(scrolls.len(), 1);
    assert_eq!(scrolls[0].view, view);
    assert_eq!(scrolls[0].axes, ScrollAxis::VERTICAL);
    assert_eq!(scrolls[0].amount, [-2.5, 0.0]);
}

#[test]
fn test_touch_payload() {
    let (engine, compositor) = setup();
    let touches = recorder();

    let log = touches.clone();
    compositor
        .register(Handler::touch(move |_, event: &TouchEvent| {
            log.borrow_mut().push(*event);
            Propagation::Consumed
        }))
        .unwrap();
    let output = engine.connect_output("eDP-1", Size::new(1920, 1080)).unwrap();
    let view = engine
        .map_view(output, ViewSpec::new("canvas", Geometry::from_parts(0, 0, 1920, 1080)))
        .unwrap();

    assert_eq!(
        engine.touch(TouchType::Down, 3, Point::new(12, 34)),
        Propagation::Consumed
    );
    let touches = touches.borrow();
    assert_eq!(touches[0].view, view);
    assert_eq!(touches[0].touch, TouchType::Down);
    assert_eq!(touches[0].slot, 3);
    assert_eq!(touches[0].position, Point::new(12, 34));
}

#[test]
fn test_output_events() {
    let (engine, compositor) = setup();
    let events = recorder();

    let log = events.clone();
    let interface = EventInterface::builder()
        .on(Handler::output_focus({
            let log = log.clone();
            move |_, output, focus| log.borrow_mut().push(format!("focus {output} {focus}"))
        }))
        .on(Handler::output_resolution({
            let log = log.clone();
            move |_, output, from, to| {
                log.borrow_mut()
                    .push(format!("resolution {output} {}x{} {}x{}", from.w, from.h, to.w, to.h))
            }
        }))
        .on(Handler::output_render_pre({
            let log = log.clone();
            move |_, output| log.borrow_mut().push(format!("pre {output}"))
        }))
        .on(Handler::output_render_post({
            let log = log.clone();
            move |_, output| log.borrow_mut().push(format!("post {output}"))
        }))
        .on(Handler::output_destroyed(move |_, output| {
            log.borrow_mut().push(format!("destroyed {output}"))
        }))
        .build();
    compositor.install(interface).unwrap();

    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    engine.change_resolution(output, Size::new(1920, 1080));
    engine.change_resolution(output, Size::new(1920, 1080));
    engine.render(output);
    engine.disconnect_output(output);

    assert_eq!(
        *events.borrow(),
        vec![
            format!("focus {output} true"),
            format!("resolution {output} 1280x720 1920x1080"),
            format!("pre {output}"),
            format!("post {output}"),
            format!("destroyed {output}"),
        ]
    );
    assert!(engine.outputs().is_empty());
}

#[test]
fn test_view_render_follows_stacking_order() {
    let (engine, compositor) = setup();
    let rendered = recorder();

    let log = rendered.clone();
    compositor
        .register(Handler::view_render_pre(move |_, view| log.borrow_mut().push(view)))
        .unwrap();
    compositor
        .register(Handler::view_render_post(|c, view| {
            let engine = c.engine();
            if let Some(geometry) = engine.view_geometry(view) {
                engine.surface_render(engine.view_surface(view), &geometry);
            }
        }))
        .unwrap();

    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let a = engine.map_view(output, ViewSpec::default()).unwrap();
    let b = engine.map_view(output, ViewSpec::default()).unwrap();
    engine.view_bring_to_front(a);
    engine.render(output);

    assert_eq!(*rendered.borrow(), vec![b, a]);
    let surfaces: Vec<_> = engine.rendered_surfaces().into_iter().map(|(s, _)| s).collect();
    assert_eq!(surfaces, vec![engine.view_surface(b), engine.view_surface(a)]);

    engine.output_set_sleep(output, true);
    engine.render(output);
    assert_eq!(rendered.borrow().len(), 2);
}

#[test]
fn test_view_move_to_output() {
    let (engine, compositor) = setup();
    let moves = recorder();

    let log = moves.clone();
    compositor
        .register(Handler::view_move_to_output(move |_, view, from, to| {
            log.borrow_mut().push((view, from, to));
        }))
        .unwrap();

    let left = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let right = engine.connect_output("DP-2", Size::new(1280, 720)).unwrap();
    let view = engine.map_view(left, ViewSpec::default()).unwrap();

    engine.view_set_output(view, right);
    engine.view_set_output(view, right);
    assert_eq!(*moves.borrow(), vec![(view, left, right)]);
    assert_eq!(engine.view_output(view), right);
}

#[test]
fn test_input_devices() {
    let (engine, compositor) = setup();
    let accepted = Rc::new(Cell::new(0));
    let destroyed = recorder();

    let count = accepted.clone();
    compositor
        .register(Handler::input_created(move |_, _| {
            count.set(count.get() + 1);
            Verdict::from(count.get() == 1)
        }))
        .unwrap();
    let log = destroyed.clone();
    compositor
        .register(Handler::input_destroyed(move |_, device| log.borrow_mut().push(device)))
        .unwrap();

    let keyboard = engine.plug_device().unwrap();
    assert!(engine.plug_device().is_none());
    engine.unplug_device(keyboard);
    engine.unplug_device(keyboard);

    assert_eq!(accepted.get(), 2);
    assert_eq!(*destroyed.borrow(), vec![keyboard]);
}
