use std::cell::{Cell, RefCell};
use std::ptr;
use std::rc::Rc;

use tracing::Level;

use super::{capture_logs, recorder, setup};
use crate::config::BridgeConfig;
use crate::core::{
    ActivationMask, Compositor, Engine, EventInterface, EventSource, Handler, KeyEvent, Lifecycle,
    Propagation, StubEngine, ViewSpec,
};
use crate::ffi::errors::BridgeError;
use crate::ffi::types::{EventMask, KeyState, LogType, Size};

#[test]
fn test_run_delivers_ready_then_terminate() {
    let (engine, compositor) = setup();
    let events = recorder();

    let log = events.clone();
    let interface = EventInterface::builder()
        .on(Handler::compositor_ready({
            let log = log.clone();
            move |c| log.borrow_mut().push(("ready", c.lifecycle()))
        }))
        .on(Handler::compositor_terminate(move |c| {
            log.borrow_mut().push(("terminate", c.lifecycle()))
        }))
        .build();
    compositor.install(interface).unwrap();
    compositor.initialize().unwrap();

    let step = events.clone();
    let skipped = Rc::new(Cell::new(true));
    let flag = skipped.clone();
    let running = Rc::new(Cell::new(false));
    let running_in_step = running.clone();
    let inner = compositor.clone();
    engine.schedule(move |e| {
        step.borrow_mut().push(("step", inner.lifecycle()));
        running_in_step.set(e.is_running());
        inner.terminate();
    });
    engine.schedule(move |_| flag.set(false));

    compositor.run().unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            ("ready", Lifecycle::Running),
            ("step", Lifecycle::Running),
            ("terminate", Lifecycle::Terminating),
        ]
    );
    assert!(running.get());
    // The second step never ran: terminate stops the loop.
    assert!(skipped.get());
    assert_eq!(compositor.lifecycle(), Lifecycle::Exited);
    assert!(!engine.is_running());
}

#[test]
fn test_terminate_from_handler() {
    let (engine, compositor) = setup();
    let states = recorder();

    let log = states.clone();
    compositor
        .register(Handler::keyboard_key(move |c, event: &KeyEvent| {
            if event.state.is_pressed() {
                c.terminate();
                log.borrow_mut().push(c.lifecycle());
                c.terminate();
            }
            Propagation::Consumed
        }))
        .unwrap();
    compositor.initialize().unwrap();

    let after = Rc::new(Cell::new(false));
    let flag = after.clone();
    engine.schedule(|e| {
        e.key(1, KeyState::Pressed);
    });
    engine.schedule(move |_| flag.set(true));

    compositor.run().unwrap();
    assert_eq!(*states.borrow(), vec![Lifecycle::Terminating]);
    assert!(!after.get());
    assert_eq!(compositor.lifecycle(), Lifecycle::Exited);
}

#[test]
fn test_incremental_registration_while_running() {
    let (engine, compositor) = setup();
    let keys = recorder();
    let registrations = recorder();

    let log = keys.clone();
    let outcomes = registrations.clone();
    compositor
        .register(Handler::compositor_ready(move |c| {
            let log = log.clone();
            let outcome = c.register(Handler::keyboard_key(move |_, event: &KeyEvent| {
                log.borrow_mut().push(event.key);
                Propagation::Consumed
            }));
            outcomes.borrow_mut().push(outcome);
        }))
        .unwrap();
    compositor.initialize().unwrap();
    assert_eq!(engine.active_mask(), ActivationMask::COMPOSITOR_READY);

    let result = Rc::new(Cell::new(Propagation::PassThrough));
    let out = result.clone();
    engine.schedule(move |e| out.set(e.key(42, KeyState::Pressed)));
    compositor.run().unwrap();

    assert_eq!(*registrations.borrow(), vec![Ok(false)]);
    assert_eq!(*keys.borrow(), vec![42]);
    assert_eq!(result.get(), Propagation::Consumed);
    assert_eq!(
        engine.active_mask(),
        ActivationMask::COMPOSITOR_READY | ActivationMask::KEYBOARD_KEY
    );
}

#[test]
fn test_late_activation_refused_when_engine_copies_table() {
    let engine = Rc::new(StubEngine::new());
    engine.copy_table_at_init();
    let compositor = Compositor::new(engine.clone(), BridgeConfig::for_tests());
    let keys = recorder();

    let log = keys.clone();
    let first = compositor.register(Handler::keyboard_key(move |_, event: &KeyEvent| {
        log.borrow_mut().push(("first", event.key));
        Propagation::Consumed
    }));
    assert_eq!(first, Ok(false));
    compositor.initialize().unwrap();

    let err = compositor
        .register(Handler::view_destroyed(|_, _| {}))
        .unwrap_err();
    assert_eq!(err, BridgeError::invalid_state("register", Lifecycle::Initialized));
    assert!(!compositor.activation_mask().contains(ActivationMask::VIEW_DESTROYED));
    assert_eq!(
        compositor.install(EventInterface::new()),
        Err(BridgeError::invalid_state("install", Lifecycle::Initialized))
    );

    // Swapping the handler of a kind the engine already copied still works.
    let log = keys.clone();
    let second = compositor.register(Handler::keyboard_key(move |_, event: &KeyEvent| {
        log.borrow_mut().push(("second", event.key));
        Propagation::Consumed
    }));
    assert_eq!(second, Ok(true));
    assert_eq!(engine.key(7, KeyState::Pressed), Propagation::Consumed);
    assert_eq!(*keys.borrow(), vec![("second", 7)]);
}

#[test]
fn test_install_after_initialize_when_engine_keeps_table() {
    let (engine, compositor) = setup();
    compositor.initialize().unwrap();

    let interface = EventInterface::builder()
        .on(Handler::keyboard_key(|_, _| Propagation::Consumed))
        .build();
    assert_eq!(compositor.install(interface), Ok(ActivationMask::KEYBOARD_KEY));
    assert_eq!(engine.key(1, KeyState::Pressed), Propagation::Consumed);
}

#[test]
fn test_register_refused_after_exit() {
    let (_engine, compositor) = setup();
    compositor.initialize().unwrap();
    compositor.run().unwrap();

    let err = compositor
        .register(Handler::compositor_ready(|_| {}))
        .unwrap_err();
    assert_eq!(err, BridgeError::invalid_state("register", Lifecycle::Exited));
}

#[test]
fn test_second_install_is_an_error() {
    let (_engine, compositor) = setup();
    compositor.install(EventInterface::new()).unwrap();
    assert_eq!(
        compositor.install(EventInterface::new()),
        Err(BridgeError::AlreadyInstalled)
    );
}

#[test]
fn test_with_interface_initializes() {
    let engine = Rc::new(StubEngine::new());
    let interface = EventInterface::builder()
        .on(Handler::view_destroyed(|_, _| {}))
        .build();
    let compositor =
        Compositor::with_interface(engine.clone(), interface, BridgeConfig::for_tests()).unwrap();

    assert_eq!(compositor.lifecycle(), Lifecycle::Initialized);
    assert_eq!(compositor.activation_mask(), ActivationMask::VIEW_DESTROYED);
    assert_eq!(engine.init_args(), vec!["wlc-bridge"]);
}

#[test]
fn test_with_interface_reports_init_failure() {
    let engine = Rc::new(StubEngine::new());
    engine.fail_init();
    let err = Compositor::with_interface(engine, EventInterface::new(), BridgeConfig::for_tests())
        .unwrap_err();
    assert!(err.is_fatal());
}

// ============================================================================
// Event sources
// ============================================================================

#[test]
fn test_fd_callback_receives_mask_and_context() {
    let (engine, compositor) = setup();
    let calls = recorder();

    let log = calls.clone();
    let source = compositor
        .add_fd(7, EventMask::READABLE | EventMask::HANGUP, "ipc".to_string(), move |_, fd, mask, ctx| {
            log.borrow_mut().push((fd, mask, ctx.clone()));
        })
        .unwrap();

    assert_eq!(engine.fd_ready(7, EventMask::WRITABLE), 0);
    assert_eq!(engine.fd_ready(8, EventMask::READABLE), 0);
    assert_eq!(engine.fd_ready(7, EventMask::READABLE), 1);
    assert_eq!(*calls.borrow(), vec![(7, EventMask::READABLE, "ipc".to_string())]);

    compositor.remove_event_source(source);
}

#[test]
fn test_removed_fd_source_is_never_called() {
    let (engine, compositor) = setup();
    let called = Rc::new(Cell::new(false));

    let flag = called.clone();
    let source = compositor
        .add_fd(3, EventMask::READABLE, (), move |_, _, _, _| flag.set(true))
        .unwrap();
    assert_eq!(compositor.event_source_count(), 1);
    assert_eq!(engine.source_count(), 1);

    compositor.remove_event_source(source);
    assert_eq!(compositor.event_source_count(), 0);
    assert_eq!(engine.source_count(), 0);
    assert_eq!(engine.fd_ready(3, EventMask::READABLE), 0);
    assert!(!called.get());
}

#[test]
fn test_fd_source_removes_itself() {
    let (engine, compositor) = setup();
    let token: Rc<RefCell<Option<EventSource>>> = Rc::new(RefCell::new(None));
    let calls = Rc::new(Cell::new(0));

    let slot = token.clone();
    let count = calls.clone();
    let source = compositor
        .add_fd(5, EventMask::READABLE, (), move |c, _, _, _| {
            count.set(count.get() + 1);
            if let Some(source) = slot.borrow_mut().take() {
                c.remove_event_source(source);
            }
        })
        .unwrap();
    *token.borrow_mut() = Some(source);

    assert_eq!(engine.fd_ready(5, EventMask::READABLE), 1);
    assert_eq!(engine.fd_ready(5, EventMask::READABLE), 0);
    assert_eq!(calls.get(), 1);
    assert_eq!(compositor.event_source_count(), 0);
}

#[test]
fn test_fd_source_removed_by_earlier_callback() {
    let (engine, compositor) = setup();
    let victim_token: Rc<RefCell<Option<EventSource>>> = Rc::new(RefCell::new(None));
    let victim_called = Rc::new(Cell::new(false));

    let slot = victim_token.clone();
    let first = compositor
        .add_fd(9, EventMask::READABLE, (), move |c, _, _, _| {
            if let Some(source) = slot.borrow_mut().take() {
                c.remove_event_source(source);
            }
        })
        .unwrap();
    let flag = victim_called.clone();
    let victim = compositor
        .add_fd(9, EventMask::READABLE, (), move |_, _, _, _| flag.set(true))
        .unwrap();
    *victim_token.borrow_mut() = Some(victim);

    assert_eq!(engine.fd_ready(9, EventMask::READABLE), 1);
    assert!(!victim_called.get());
    compositor.remove_event_source(first);
    assert_eq!(engine.source_count(), 0);
}

#[test]
fn test_refused_fd_source() {
    let (_engine, compositor) = setup();
    let err = compositor
        .add_fd(-1, EventMask::READABLE, (), |_, _, _, _| {})
        .unwrap_err();
    assert!(matches!(err, BridgeError::EventSourceRefused { .. }));
    assert!(!err.is_usage_error());
    assert_eq!(compositor.event_source_count(), 0);
}

#[test]
fn test_timer_fires_once_per_arming() {
    let (engine, compositor) = setup();
    let fired = recorder();

    let log = fired.clone();
    let timer = compositor
        .add_timer(42u32, move |_, ctx| log.borrow_mut().push(*ctx))
        .unwrap();

    assert_eq!(engine.expire_timers(), 0);
    assert!(compositor.timer_update(&timer, 250));
    assert_eq!(engine.timer_delay(&timer), Some(250));
    assert_eq!(engine.expire_timers(), 1);
    assert_eq!(engine.expire_timers(), 0);
    assert_eq!(*fired.borrow(), vec![42]);

    assert!(compositor.timer_update(&timer, 10));
    assert!(compositor.timer_update(&timer, 0));
    assert_eq!(engine.expire_timers(), 0);

    compositor.remove_event_source(timer);
    assert_eq!(engine.source_count(), 0);
}

// ============================================================================
// User data and logging
// ============================================================================

#[test]
fn test_user_data_pass_through() {
    let (engine, compositor) = setup();
    let output = engine.connect_output("DP-1", Size::new(800, 600)).unwrap();
    let view = engine.map_view(output, ViewSpec::default()).unwrap();

    let mut payload = 17u64;
    let data = ptr::addr_of_mut!(payload).cast();
    assert!(compositor.user_data(view).is_null());
    compositor.set_user_data(view, data);
    assert_eq!(compositor.user_data(view), data);
    assert!(compositor.user_data(output).is_null());

    engine.unmap_view(view);
    assert!(compositor.user_data(view).is_null());
}

#[test]
fn test_engine_log_forwarding() {
    let engine = Rc::new(StubEngine::new());
    let config = BridgeConfig {
        forward_engine_log: true,
        ..BridgeConfig::for_tests()
    };
    let _compositor = Compositor::new(engine.clone(), config);

    let records = capture_logs("wlc", || {
        engine.log(LogType::Info, "backend: headless");
        engine.log(LogType::Warn, "xwayland missing");
        engine.log(LogType::Wayland, "wl_display@1.error");
        engine.log(LogType::Error, "");
    });

    let seen: Vec<_> = records
        .iter()
        .map(|r| (r.level, r.target.as_str(), r.message.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (Level::INFO, "wlc", "backend: headless"),
            (Level::WARN, "wlc", "xwayland missing"),
            (Level::DEBUG, "wlc::wayland", "wl_display@1.error"),
            (Level::ERROR, "wlc", ""),
        ]
    );
}

#[test]
fn test_engine_log_not_forwarded_when_disabled() {
    let engine = Rc::new(StubEngine::new());
    let _compositor = Compositor::new(engine.clone(), BridgeConfig::for_tests());

    let records = capture_logs("wlc", || {
        engine.log(LogType::Error, "renderer lost");
    });
    assert!(records.is_empty());
}
