use std::collections::HashSet;

use super::setup;
use crate::core::{Engine, Output, Resource, View, ViewSpec};
use crate::ffi::types::{BackendType, Geometry, Point, Size, ViewState, ViewType};

fn sorted(mut views: Vec<View>) -> Vec<View> {
    views.sort();
    views
}

#[test]
fn test_output_views_belong_to_their_output() {
    let (engine, _compositor) = setup();
    let left = engine.connect_output("DP-1", Size::new(1920, 1080)).unwrap();
    let right = engine.connect_output("DP-2", Size::new(1920, 1080)).unwrap();

    let mut mapped = Vec::new();
    for i in 0..6 {
        let output = if i % 2 == 0 { left } else { right };
        mapped.push(engine.map_view(output, ViewSpec::default()).unwrap());
    }
    engine.view_set_output(mapped[0], right);

    for output in engine.outputs() {
        for view in engine.output_views(output) {
            assert_eq!(engine.view_output(view), output);
        }
    }
    assert_eq!(engine.output_views(left).len(), 2);
    assert_eq!(engine.output_views(right).len(), 4);
    assert!(engine.output_views(Output::NONE).is_empty());
}

#[test]
fn test_mutable_views_ignore_restacking() {
    let (engine, _compositor) = setup();
    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let a = engine.map_view(output, ViewSpec::default()).unwrap();
    let b = engine.map_view(output, ViewSpec::default()).unwrap();
    let c = engine.map_view(output, ViewSpec::default()).unwrap();

    let creation = engine.output_mutable_views(output);
    assert_eq!(creation, vec![a, b, c]);
    assert_eq!(engine.output_views(output), creation);

    engine.view_bring_to_front(a);
    assert_eq!(engine.output_views(output), vec![b, c, a]);
    engine.view_send_to_back(c);
    assert_eq!(engine.output_views(output), vec![c, b, a]);
    engine.view_bring_above(c, a);
    assert_eq!(engine.output_views(output), vec![b, a, c]);
    engine.view_send_below(c, b);
    assert_eq!(engine.output_views(output), vec![c, b, a]);

    assert!(engine.output_set_views(output, &[a, c, b]));
    let stacking = engine.output_views(output);
    assert_eq!(stacking, vec![a, c, b]);

    assert_eq!(engine.output_mutable_views(output), creation);
    assert_eq!(sorted(stacking), sorted(creation));
}

#[test]
fn test_set_views_rejects_non_permutations() {
    let (engine, _compositor) = setup();
    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let other = engine.connect_output("DP-2", Size::new(1280, 720)).unwrap();
    let a = engine.map_view(output, ViewSpec::default()).unwrap();
    let b = engine.map_view(output, ViewSpec::default()).unwrap();
    let stranger = engine.map_view(other, ViewSpec::default()).unwrap();

    assert!(!engine.output_set_views(output, &[a]));
    assert!(!engine.output_set_views(output, &[a, a]));
    assert!(!engine.output_set_views(output, &[a, stranger]));
    assert!(!engine.output_set_views(Output::NONE, &[]));
    assert_eq!(engine.output_views(output), vec![a, b]);
}

#[test]
fn test_unmapped_views_leave_both_orders() {
    let (engine, _compositor) = setup();
    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let a = engine.map_view(output, ViewSpec::default()).unwrap();
    let b = engine.map_view(output, ViewSpec::default()).unwrap();

    engine.view_close(a);
    assert_eq!(engine.output_views(output), vec![b]);
    assert_eq!(engine.output_mutable_views(output), vec![b]);
    assert_eq!(engine.view_output(a), Output::NONE);
    assert_eq!(engine.view_geometry(a), None);
}

#[test]
fn test_handles_stay_distinct() {
    let (engine, _compositor) = setup();
    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();

    let mut seen = HashSet::new();
    for _ in 0..4 {
        let view = engine.map_view(output, ViewSpec::default()).unwrap();
        assert!(seen.insert(view));
        engine.unmap_view(view);
    }
    assert!(!seen.contains(&View::NONE));
}

#[test]
fn test_output_accessors() {
    let (engine, _compositor) = setup();
    let output = engine.connect_output("HDMI-A-1", Size::new(1920, 1080)).unwrap();

    assert_eq!(engine.focused_output(), output);
    assert_eq!(engine.output_name(output).as_deref(), Some("HDMI-A-1"));
    assert_eq!(engine.output_resolution(output), Some(Size::new(1920, 1080)));
    assert_eq!(engine.output_resolution(Output::NONE), None);

    engine.output_set_mask(output, 0b10);
    assert_eq!(engine.output_mask(output), 0b10);
    assert!(!engine.output_sleep(output));
    engine.output_set_sleep(output, true);
    assert!(engine.output_sleep(output));

    engine.output_schedule_render(output);
    assert_eq!(engine.scheduled_renders(), vec![output]);
    assert_eq!(engine.backend_type(), BackendType::None);
}

#[test]
fn test_view_accessors() {
    let (engine, _compositor) = setup();
    let output = engine.connect_output("DP-1", Size::new(1280, 720)).unwrap();
    let parent = engine.map_view(output, ViewSpec::default()).unwrap();
    let spec = ViewSpec::new("Save As", Geometry::from_parts(-5, 10, 800, 600))
        .with_class("gedit")
        .with_app_id("org.gnome.gedit")
        .with_parent(parent);
    let dialog = engine.map_view(output, spec).unwrap();

    assert_eq!(engine.view_title(dialog).as_deref(), Some("Save As"));
    assert_eq!(engine.view_class(dialog).as_deref(), Some("gedit"));
    assert_eq!(engine.view_app_id(dialog).as_deref(), Some("org.gnome.gedit"));
    assert_eq!(engine.view_title(parent), None);
    assert_eq!(engine.view_parent(dialog), parent);
    engine.view_set_parent(dialog, View::NONE);
    assert_eq!(engine.view_parent(dialog), View::NONE);

    engine.view_set_type(dialog, ViewType::MODAL, true);
    engine.view_set_type(dialog, ViewType::POPUP, true);
    engine.view_set_type(dialog, ViewType::POPUP, false);
    assert_eq!(engine.view_type(dialog), ViewType::MODAL);

    engine.view_set_state(dialog, ViewState::MAXIMIZED | ViewState::ACTIVATED, true);
    engine.view_set_state(dialog, ViewState::MAXIMIZED, false);
    assert_eq!(engine.view_state(dialog), ViewState::ACTIVATED);

    engine.view_set_mask(dialog, 4);
    assert_eq!(engine.view_mask(dialog), 4);

    let geometry = Geometry::new(Point::new(-5, 10), Size::new(800, 600));
    assert_eq!(engine.view_geometry(dialog), Some(geometry));

    let surface = engine.view_surface(dialog);
    assert!(!surface.is_none());
    assert_eq!(engine.surface_size(surface), Some(Size::new(800, 600)));
    assert_eq!(engine.surface_size(Resource::NONE), None);
}

#[test]
fn test_pointer_position_round_trip() {
    let (engine, _compositor) = setup();
    engine.set_pointer_position(Point::new(-1, 2048));
    assert_eq!(engine.pointer_position(), Point::new(-1, 2048));
}

#[test]
fn test_wayland_lookups_miss_without_display() {
    let (engine, _compositor) = setup();
    assert!(engine.wl_display().is_null());
    let resource = std::ptr::null_mut();
    assert_eq!(engine.view_from_surface_resource(resource), View::NONE);
    assert_eq!(engine.output_from_output_resource(resource), Output::NONE);
    assert_eq!(engine.resource_from_surface_resource(resource), Resource::NONE);
}
