//! In-process engine for tests and headless runs.
//!
//! `StubEngine` implements [`Engine`] over a small world model (outputs,
//! views, event sources, keyboard and pointer state) and delivers events
//! through the same dispatch shims and the same `wlc_interface` table
//! layout the native engine uses. Only slots enabled through
//! [`Engine::activate`] are ever called.
//!
//! Behaviour worth knowing when writing tests:
//! - handles are allocated from one counter and never reused
//! - operations on unknown handles are no-ops returning defaults
//! - geometry is stored exactly as given (no clamping)
//! - a rejected Created event removes the object without a Destroyed event
//! - `run()` delivers Ready, drains the scheduled steps until terminate is
//!   requested or none are left, then delivers Terminate
//!
//! No `RefCell` borrow is held while a callback runs, so handlers may call
//! back into the engine freely.

pub mod tree;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ffi::CString;
use std::os::raw::c_void;
use std::os::unix::io::RawFd;
use std::ptr;

use crate::core::engine::Engine;
use crate::core::handle::{EventSource, InputDevice, Output, Resource, View};
use crate::core::interface::{ActivationMask, Propagation, Verdict};
use crate::ffi::errors::Result;
use crate::ffi::marshal::CStrArray;
use crate::ffi::shim;
use crate::ffi::sys::{self, wlc_handle};
use crate::ffi::types::{
    BackendType, ButtonState, EventMask, Geometry, KeyState, LogType, Modifiers, Point,
    ResizeEdge, ScrollAxis, Size, TouchType, ViewState, ViewType,
};
use crate::util::logging::STUB;

pub use tree::ViewTree;

// ============================================================================
// World model
// ============================================================================

/// Description of a client view about to be mapped.
#[derive(Debug, Clone, Default)]
pub struct ViewSpec {
    pub title: Option<String>,
    pub class: Option<String>,
    pub app_id: Option<String>,
    pub geometry: Geometry,
    pub kind: ViewType,
    pub parent: View,
}

impl ViewSpec {
    pub fn new(title: &str, geometry: Geometry) -> Self {
        Self {
            title: Some(title.to_owned()),
            geometry,
            ..Self::default()
        }
    }

    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_owned());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_owned());
        self
    }

    pub fn with_parent(mut self, parent: View) -> Self {
        self.parent = parent;
        self
    }
}

#[derive(Debug)]
struct OutputRecord {
    name: String,
    sleep: bool,
    resolution: Size,
    mask: u32,
    views: ViewTree,
}

#[derive(Debug)]
struct ViewRecord {
    output: Output,
    geometry: Geometry,
    mask: u32,
    kind: ViewType,
    state: ViewState,
    parent: View,
    title: Option<String>,
    class: Option<String>,
    app_id: Option<String>,
    surface: Resource,
}

#[derive(Debug, Clone, Copy)]
enum SourceRecord {
    Fd {
        fd: RawFd,
        mask: EventMask,
        callback: sys::wlc_fd_cb,
        arg: *mut c_void,
    },
    Timer {
        callback: sys::wlc_timer_cb,
        arg: *mut c_void,
        armed: Option<i32>,
    },
}

#[derive(Debug)]
struct World {
    next_handle: usize,
    outputs: BTreeMap<wlc_handle, OutputRecord>,
    views: HashMap<wlc_handle, ViewRecord>,
    devices: Vec<usize>,
    focused_output: Output,
    focused_view: View,
    user_data: HashMap<wlc_handle, usize>,
    sources: BTreeMap<usize, SourceRecord>,
    keymap: HashMap<u32, (u32, u32)>,
    pressed_keys: Vec<u32>,
    modifiers: Modifiers,
    pointer: Point,
    init_args: Vec<String>,
    spawned: Vec<(String, Vec<String>)>,
    rendered: Vec<(Resource, Geometry)>,
    scheduled_renders: Vec<Output>,
    log_handler: Option<sys::wlc_log_cb>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            next_handle: 0,
            outputs: BTreeMap::new(),
            views: HashMap::new(),
            devices: Vec::new(),
            focused_output: Output::NONE,
            focused_view: View::NONE,
            user_data: HashMap::new(),
            sources: BTreeMap::new(),
            keymap: HashMap::new(),
            pressed_keys: Vec::new(),
            modifiers: Modifiers::default(),
            pointer: Point::ORIGIN,
            init_args: Vec::new(),
            spawned: Vec::new(),
            rendered: Vec::new(),
            scheduled_renders: Vec::new(),
            log_handler: None,
        }
    }
}

impl World {
    fn alloc(&mut self) -> usize {
        self.next_handle += 1;
        self.next_handle
    }

    fn tree_mut(&mut self, view: View) -> Option<&mut ViewTree> {
        let output = self.views.get(&view.as_raw())?.output;
        self.outputs.get_mut(&output.as_raw()).map(|o| &mut o.views)
    }

    fn view_under(&self, position: Point) -> View {
        let Some(output) = self.outputs.get(&self.focused_output.as_raw()) else {
            return View::NONE;
        };
        output
            .views
            .stacking_order
            .iter()
            .rev()
            .copied()
            .find(|view| {
                self.views
                    .get(&view.as_raw())
                    .is_some_and(|record| record.geometry.contains_point(position))
            })
            .unwrap_or(View::NONE)
    }
}

// Fabricated addresses for engine-owned pointers. Never dereferenced.
fn fake_ptr<T>(id: usize) -> *mut T {
    (id << 4) as *mut T
}

fn ptr_id<T>(ptr: *mut T) -> usize {
    (ptr as usize) >> 4
}

type Step = Box<dyn FnOnce(&StubEngine)>;

// ============================================================================
// StubEngine
// ============================================================================

/// Scriptable engine double.
pub struct StubEngine {
    table: RefCell<sys::wlc_interface>,
    // Set at init when the engine copies its table instead of keeping it.
    frozen: RefCell<Option<sys::wlc_interface>>,
    copies_table: Cell<bool>,
    active: Cell<ActivationMask>,
    world: RefCell<World>,
    script: RefCell<VecDeque<Step>>,
    clock: Cell<u32>,
    init_succeeds: Cell<bool>,
    terminate_requested: Cell<bool>,
    running: Cell<bool>,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            table: RefCell::new(sys::wlc_interface::default()),
            frozen: RefCell::new(None),
            copies_table: Cell::new(false),
            active: Cell::new(ActivationMask::empty()),
            world: RefCell::new(World::default()),
            script: RefCell::new(VecDeque::new()),
            clock: Cell::new(0),
            init_succeeds: Cell::new(true),
            terminate_requested: Cell::new(false),
            running: Cell::new(false),
        }
    }

    // A copy of the table, so no borrow is held across a callback.
    fn slots(&self) -> sys::wlc_interface {
        match *self.frozen.borrow() {
            Some(frozen) => frozen,
            None => *self.table.borrow(),
        }
    }

    fn tick(&self) -> u32 {
        let now = self.clock.get().wrapping_add(1);
        self.clock.set(now);
        now
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Queue a step for `run()` to execute inside the loop.
    pub fn schedule(&self, step: impl FnOnce(&StubEngine) + 'static) {
        self.script.borrow_mut().push_back(Box::new(step));
    }

    /// Behave like an engine that copies the callback table at `init`:
    /// slots filled in afterwards are never called.
    pub fn copy_table_at_init(&self) {
        self.copies_table.set(true);
    }

    /// Make the next `init` report failure.
    pub fn fail_init(&self) {
        self.init_succeeds.set(false);
    }

    /// Teach the keyboard a keysym and code point for `key`.
    pub fn map_key(&self, key: u32, keysym: u32, utf32: u32) {
        self.world.borrow_mut().keymap.insert(key, (keysym, utf32));
    }

    pub fn set_modifiers(&self, modifiers: Modifiers) {
        self.world.borrow_mut().modifiers = modifiers;
    }

    /// Emit a line through the installed log handler, if any.
    pub fn log(&self, kind: LogType, text: &str) {
        let handler = self.world.borrow().log_handler;
        if let (Some(handler), Ok(text)) = (handler, CString::new(text)) {
            handler(kind.to_raw(), text.as_ptr());
        }
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Plug in a monitor. `None` when the Created handler rejected it.
    pub fn connect_output(&self, name: &str, resolution: Size) -> Option<Output> {
        let output = {
            let mut world = self.world.borrow_mut();
            let output = Output::from_raw(world.alloc());
            world.outputs.insert(
                output.as_raw(),
                OutputRecord {
                    name: name.to_owned(),
                    sleep: false,
                    resolution,
                    mask: 1,
                    views: ViewTree::new(),
                },
            );
            output
        };

        if let Some(created) = self.slots().output.created {
            if !created(output.as_raw()) {
                self.world.borrow_mut().outputs.remove(&output.as_raw());
                crate::wlog!(STUB, "Output {} rejected", output);
                return None;
            }
        }

        if self.world.borrow().focused_output.is_none() {
            self.output_focus(output);
        }
        Some(output)
    }

    /// Unplug a monitor. Its views are unmapped first.
    pub fn disconnect_output(&self, output: Output) {
        let views = match self.world.borrow().outputs.get(&output.as_raw()) {
            Some(record) => record.views.creation_order.clone(),
            None => return,
        };
        for view in views {
            self.unmap_view(view);
        }

        {
            let mut world = self.world.borrow_mut();
            if world.focused_output == output {
                world.focused_output = Output::NONE;
            }
        }
        if let Some(destroyed) = self.slots().output.destroyed {
            destroyed(output.as_raw());
        }
        let mut world = self.world.borrow_mut();
        world.outputs.remove(&output.as_raw());
        world.user_data.remove(&output.as_raw());
    }

    /// Change a mode as the hardware would; delivers Resolution.
    pub fn change_resolution(&self, output: Output, resolution: Size) {
        self.output_set_resolution(output, resolution);
    }

    /// Run one frame: output pre, every view pre/post in stacking order,
    /// output post.
    pub fn render(&self, output: Output) {
        let views = match self.world.borrow().outputs.get(&output.as_raw()) {
            Some(record) if !record.sleep => record.views.stacking_order.clone(),
            _ => return,
        };
        let slots = self.slots();

        if let Some(pre) = slots.output.render.pre {
            pre(output.as_raw());
        }
        for view in views {
            if !self.world.borrow().views.contains_key(&view.as_raw()) {
                continue;
            }
            if let Some(pre) = slots.view.render.pre {
                pre(view.as_raw());
            }
            if let Some(post) = slots.view.render.post {
                post(view.as_raw());
            }
        }
        if let Some(post) = slots.output.render.post {
            post(output.as_raw());
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Map a client view on `output`. `None` when the Created handler
    /// rejected it or the output is unknown.
    pub fn map_view(&self, output: Output, spec: ViewSpec) -> Option<View> {
        let view = {
            let mut world = self.world.borrow_mut();
            if !world.outputs.contains_key(&output.as_raw()) {
                return None;
            }
            let view = View::from_raw(world.alloc());
            let surface = Resource::from_raw(world.alloc());
            world.views.insert(
                view.as_raw(),
                ViewRecord {
                    output,
                    geometry: spec.geometry,
                    mask: 1,
                    kind: spec.kind,
                    state: ViewState::empty(),
                    parent: spec.parent,
                    title: spec.title,
                    class: spec.class,
                    app_id: spec.app_id,
                    surface,
                },
            );
            if let Some(record) = world.outputs.get_mut(&output.as_raw()) {
                record.views.insert(view);
            }
            view
        };

        if let Some(created) = self.slots().view.created {
            if !created(view.as_raw()) {
                self.forget_view(view);
                crate::wlog!(STUB, "View {} rejected", view);
                return None;
            }
        }
        Some(view)
    }

    /// The client destroyed its view; delivers Destroyed.
    pub fn unmap_view(&self, view: View) {
        if !self.world.borrow().views.contains_key(&view.as_raw()) {
            return;
        }
        {
            let mut world = self.world.borrow_mut();
            if world.focused_view == view {
                world.focused_view = View::NONE;
            }
        }
        if let Some(destroyed) = self.slots().view.destroyed {
            destroyed(view.as_raw());
        }
        self.forget_view(view);
    }

    fn forget_view(&self, view: View) {
        let mut world = self.world.borrow_mut();
        if let Some(tree) = world.tree_mut(view) {
            tree.remove(view);
        }
        world.views.remove(&view.as_raw());
        world.user_data.remove(&view.as_raw());
        if world.focused_view == view {
            world.focused_view = View::NONE;
        }
    }

    pub fn request_geometry(&self, view: View, geometry: Geometry) {
        if let Some(request) = self.slots().view.request.geometry {
            let native: sys::wlc_geometry = geometry.into();
            request(view.as_raw(), &native);
        }
    }

    pub fn request_state(&self, view: View, state: ViewState, toggle: bool) {
        if let Some(request) = self.slots().view.request.state {
            request(view.as_raw(), state.bits(), toggle);
        }
    }

    pub fn request_move(&self, view: View, origin: Point) {
        if let Some(request) = self.slots().view.request.move_ {
            let native: sys::wlc_point = origin.into();
            request(view.as_raw(), &native);
        }
    }

    pub fn request_resize(&self, view: View, edges: ResizeEdge, origin: Point) {
        if let Some(request) = self.slots().view.request.resize {
            let native: sys::wlc_point = origin.into();
            request(view.as_raw(), edges.bits(), &native);
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Press or release a key on the focused view.
    pub fn key(&self, key: u32, state: KeyState) -> Propagation {
        let (view, modifiers) = {
            let mut world = self.world.borrow_mut();
            world.pressed_keys.retain(|&k| k != key);
            if state.is_pressed() {
                world.pressed_keys.push(key);
            }
            (world.focused_view, world.modifiers)
        };
        let Some(callback) = self.slots().keyboard.key else {
            return Propagation::PassThrough;
        };
        let modifiers: sys::wlc_modifiers = modifiers.into();
        callback(view.as_raw(), self.tick(), &modifiers, key, state.to_raw()).into()
    }

    /// Press or release a button at the pointer position.
    pub fn button(&self, button: u32, state: ButtonState) -> Propagation {
        let (view, modifiers, position) = {
            let world = self.world.borrow();
            (world.view_under(world.pointer), world.modifiers, world.pointer)
        };
        let Some(callback) = self.slots().pointer.button else {
            return Propagation::PassThrough;
        };
        let modifiers: sys::wlc_modifiers = modifiers.into();
        let position: sys::wlc_point = position.into();
        callback(view.as_raw(), self.tick(), &modifiers, button, state.to_raw(), &position).into()
    }

    pub fn scroll(&self, axes: ScrollAxis, amount: [f64; 2]) -> Propagation {
        let (view, modifiers) = {
            let world = self.world.borrow();
            (world.view_under(world.pointer), world.modifiers)
        };
        let Some(callback) = self.slots().pointer.scroll else {
            return Propagation::PassThrough;
        };
        let modifiers: sys::wlc_modifiers = modifiers.into();
        callback(view.as_raw(), self.tick(), &modifiers, axes.bits(), amount.as_ptr()).into()
    }

    /// Move the pointer to `position`.
    pub fn motion(&self, position: Point) -> Propagation {
        let view = {
            let mut world = self.world.borrow_mut();
            world.pointer = position;
            world.view_under(position)
        };
        let Some(callback) = self.slots().pointer.motion else {
            return Propagation::PassThrough;
        };
        let native: sys::wlc_point = position.into();
        callback(view.as_raw(), self.tick(), &native).into()
    }

    pub fn touch(&self, touch: TouchType, slot: i32, position: Point) -> Propagation {
        let (view, modifiers) = {
            let world = self.world.borrow();
            (world.view_under(position), world.modifiers)
        };
        let Some(callback) = self.slots().touch.touch else {
            return Propagation::PassThrough;
        };
        let modifiers: sys::wlc_modifiers = modifiers.into();
        let native: sys::wlc_point = position.into();
        callback(view.as_raw(), self.tick(), &modifiers, touch.to_raw(), slot, &native).into()
    }

    /// Attach an input device. `None` when rejected.
    pub fn plug_device(&self) -> Option<InputDevice> {
        let id = {
            let mut world = self.world.borrow_mut();
            let id = world.alloc();
            world.devices.push(id);
            id
        };
        let device = InputDevice::from_ptr(fake_ptr(id))?;

        if let Some(created) = self.slots().input.created {
            let verdict = Verdict::from(created(device.as_ptr()));
            if !verdict.is_accepted() {
                self.world.borrow_mut().devices.retain(|&d| d != id);
                return None;
            }
        }
        Some(device)
    }

    pub fn unplug_device(&self, device: InputDevice) {
        let id = ptr_id(device.as_ptr());
        if !self.world.borrow().devices.contains(&id) {
            return;
        }
        if let Some(destroyed) = self.slots().input.destroyed {
            destroyed(device.as_ptr());
        }
        self.world.borrow_mut().devices.retain(|&d| d != id);
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Report readiness on `fd`. Every registration watching `fd` for any
    /// bit of `mask` is called, unless an earlier callback removed it.
    pub fn fd_ready(&self, fd: RawFd, mask: EventMask) -> usize {
        let ids: Vec<usize> = self
            .world
            .borrow()
            .sources
            .iter()
            .filter_map(|(&id, record)| match *record {
                SourceRecord::Fd { fd: watched, mask: interest, .. }
                    if watched == fd && interest.intersects(mask) =>
                {
                    Some(id)
                }
                _ => None,
            })
            .collect();

        let mut delivered = 0;
        for id in ids {
            let record = self.world.borrow().sources.get(&id).copied();
            if let Some(SourceRecord::Fd { fd, callback, arg, .. }) = record {
                callback(fd, mask.bits(), arg);
                delivered += 1;
            }
        }
        delivered
    }

    /// Fire every armed timer once; each is disarmed before its callback.
    pub fn expire_timers(&self) -> usize {
        let ids: Vec<usize> = self
            .world
            .borrow()
            .sources
            .iter()
            .filter_map(|(&id, record)| match record {
                SourceRecord::Timer { armed: Some(_), .. } => Some(id),
                _ => None,
            })
            .collect();

        let mut fired = 0;
        for id in ids {
            let due = {
                let mut world = self.world.borrow_mut();
                match world.sources.get_mut(&id) {
                    Some(SourceRecord::Timer { callback, arg, armed }) if armed.is_some() => {
                        *armed = None;
                        Some((*callback, *arg))
                    }
                    _ => None,
                }
            };
            if let Some((callback, arg)) = due {
                callback(arg);
                fired += 1;
            }
        }
        fired
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn active_mask(&self) -> ActivationMask {
        self.active.get()
    }

    pub fn init_args(&self) -> Vec<String> {
        self.world.borrow().init_args.clone()
    }

    pub fn spawned(&self) -> Vec<(String, Vec<String>)> {
        self.world.borrow().spawned.clone()
    }

    pub fn rendered_surfaces(&self) -> Vec<(Resource, Geometry)> {
        self.world.borrow().rendered.clone()
    }

    pub fn scheduled_renders(&self) -> Vec<Output> {
        self.world.borrow().scheduled_renders.clone()
    }

    /// Registrations the engine still holds.
    pub fn source_count(&self) -> usize {
        self.world.borrow().sources.len()
    }

    /// Delay the timer behind `source` is armed with, if any.
    pub fn timer_delay(&self, source: &EventSource) -> Option<i32> {
        match self.world.borrow().sources.get(&ptr_id(source.as_ptr())) {
            Some(SourceRecord::Timer { armed, .. }) => *armed,
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn focused_view(&self) -> View {
        self.world.borrow().focused_view
    }

    fn add_source(&self, record: SourceRecord) -> Option<EventSource> {
        let mut world = self.world.borrow_mut();
        let id = world.alloc();
        world.sources.insert(id, record);
        EventSource::from_ptr(fake_ptr(id))
    }
}

// ============================================================================
// Engine
// ============================================================================

impl Engine for StubEngine {
    fn activate(&self, mask: ActivationMask) {
        shim::enable(&mut self.table.borrow_mut(), mask);
        self.active.set(self.active.get() | mask);
    }

    fn init(&self, args: &[String]) -> bool {
        self.world.borrow_mut().init_args = args.to_vec();
        if !self.init_succeeds.get() {
            return false;
        }
        if self.copies_table.get() {
            *self.frozen.borrow_mut() = Some(*self.table.borrow());
        }
        true
    }

    fn activates_after_init(&self) -> bool {
        !self.copies_table.get()
    }

    fn run(&self) {
        self.running.set(true);
        if let Some(ready) = self.slots().compositor.ready {
            ready();
        }

        while !self.terminate_requested.get() {
            let Some(step) = self.script.borrow_mut().pop_front() else {
                break;
            };
            step(self);
        }

        if let Some(terminate) = self.slots().compositor.terminate {
            terminate();
        }
        self.running.set(false);
    }

    fn terminate(&self) {
        self.terminate_requested.set(true);
    }

    fn backend_type(&self) -> BackendType {
        BackendType::None
    }

    fn exec(&self, bin: &str, args: &[String]) -> Result<()> {
        // Same argv validation the native call needs.
        CStrArray::new(std::iter::once(bin).chain(args.iter().map(String::as_str)))?;
        self.world
            .borrow_mut()
            .spawned
            .push((bin.to_owned(), args.to_vec()));
        Ok(())
    }

    fn set_log_handler(&self, handler: sys::wlc_log_cb) {
        self.world.borrow_mut().log_handler = Some(handler);
    }

    fn add_fd(
        &self,
        fd: RawFd,
        mask: EventMask,
        callback: sys::wlc_fd_cb,
        arg: *mut c_void,
    ) -> Option<EventSource> {
        if fd < 0 {
            return None;
        }
        self.add_source(SourceRecord::Fd { fd, mask, callback, arg })
    }

    fn add_timer(&self, callback: sys::wlc_timer_cb, arg: *mut c_void) -> Option<EventSource> {
        self.add_source(SourceRecord::Timer { callback, arg, armed: None })
    }

    fn timer_update(&self, source: &EventSource, delay_ms: i32) -> bool {
        let mut world = self.world.borrow_mut();
        match world.sources.get_mut(&ptr_id(source.as_ptr())) {
            Some(SourceRecord::Timer { armed, .. }) => {
                *armed = if delay_ms > 0 { Some(delay_ms) } else { None };
                true
            }
            _ => false,
        }
    }

    fn remove_event_source(&self, source: EventSource) {
        self.world.borrow_mut().sources.remove(&ptr_id(source.as_ptr()));
    }

    fn handle_set_user_data(&self, handle: wlc_handle, data: *const c_void) {
        let mut world = self.world.borrow_mut();
        let known = world.outputs.contains_key(&handle) || world.views.contains_key(&handle);
        if known {
            world.user_data.insert(handle, data as usize);
        }
    }

    fn handle_user_data(&self, handle: wlc_handle) -> *mut c_void {
        self.world
            .borrow()
            .user_data
            .get(&handle)
            .map_or(ptr::null_mut(), |&data| data as *mut c_void)
    }

    // ===== Outputs =====

    fn outputs(&self) -> Vec<Output> {
        self.world.borrow().outputs.keys().map(|&raw| Output::from_raw(raw)).collect()
    }

    fn focused_output(&self) -> Output {
        self.world.borrow().focused_output
    }

    fn output_name(&self, output: Output) -> Option<String> {
        self.world.borrow().outputs.get(&output.as_raw()).map(|o| o.name.clone())
    }

    fn output_sleep(&self, output: Output) -> bool {
        self.world.borrow().outputs.get(&output.as_raw()).is_some_and(|o| o.sleep)
    }

    fn output_set_sleep(&self, output: Output, sleep: bool) {
        if let Some(record) = self.world.borrow_mut().outputs.get_mut(&output.as_raw()) {
            record.sleep = sleep;
        }
    }

    fn output_resolution(&self, output: Output) -> Option<Size> {
        self.world.borrow().outputs.get(&output.as_raw()).map(|o| o.resolution)
    }

    fn output_set_resolution(&self, output: Output, resolution: Size) {
        let from = {
            let mut world = self.world.borrow_mut();
            let Some(record) = world.outputs.get_mut(&output.as_raw()) else {
                return;
            };
            std::mem::replace(&mut record.resolution, resolution)
        };
        if from == resolution {
            return;
        }
        if let Some(changed) = self.slots().output.resolution {
            let (from, to): (sys::wlc_size, sys::wlc_size) = (from.into(), resolution.into());
            changed(output.as_raw(), &from, &to);
        }
    }

    fn output_mask(&self, output: Output) -> u32 {
        self.world.borrow().outputs.get(&output.as_raw()).map_or(0, |o| o.mask)
    }

    fn output_set_mask(&self, output: Output, mask: u32) {
        if let Some(record) = self.world.borrow_mut().outputs.get_mut(&output.as_raw()) {
            record.mask = mask;
        }
    }

    fn output_views(&self, output: Output) -> Vec<View> {
        self.world
            .borrow()
            .outputs
            .get(&output.as_raw())
            .map(|o| o.views.stacking_order.clone())
            .unwrap_or_default()
    }

    fn output_mutable_views(&self, output: Output) -> Vec<View> {
        self.world
            .borrow()
            .outputs
            .get(&output.as_raw())
            .map(|o| o.views.creation_order.clone())
            .unwrap_or_default()
    }

    fn output_set_views(&self, output: Output, views: &[View]) -> bool {
        self.world
            .borrow_mut()
            .outputs
            .get_mut(&output.as_raw())
            .is_some_and(|o| o.views.restack(views))
    }

    fn output_focus(&self, output: Output) {
        let previous = {
            let world = self.world.borrow();
            if !output.is_none() && !world.outputs.contains_key(&output.as_raw()) {
                return;
            }
            world.focused_output
        };
        if previous == output {
            return;
        }
        self.world.borrow_mut().focused_output = output;

        if let Some(focus) = self.slots().output.focus {
            if !previous.is_none() {
                focus(previous.as_raw(), false);
            }
            if !output.is_none() {
                focus(output.as_raw(), true);
            }
        }
    }

    fn output_schedule_render(&self, output: Output) {
        let mut world = self.world.borrow_mut();
        if world.outputs.contains_key(&output.as_raw()) {
            world.scheduled_renders.push(output);
        }
    }

    // ===== Views =====

    fn view_focus(&self, view: View) {
        let previous = {
            let world = self.world.borrow();
            if !view.is_none() && !world.views.contains_key(&view.as_raw()) {
                return;
            }
            world.focused_view
        };
        if previous == view {
            return;
        }
        self.world.borrow_mut().focused_view = view;

        if let Some(focus) = self.slots().view.focus {
            if !previous.is_none() {
                focus(previous.as_raw(), false);
            }
            if !view.is_none() {
                focus(view.as_raw(), true);
            }
        }
    }

    fn view_close(&self, view: View) {
        // The client honours the close request right away.
        self.unmap_view(view);
    }

    fn view_output(&self, view: View) -> Output {
        self.world
            .borrow()
            .views
            .get(&view.as_raw())
            .map_or(Output::NONE, |v| v.output)
    }

    fn view_set_output(&self, view: View, output: Output) {
        let from = {
            let mut world = self.world.borrow_mut();
            if !world.outputs.contains_key(&output.as_raw()) {
                return;
            }
            let Some(from) = world.views.get(&view.as_raw()).map(|v| v.output) else {
                return;
            };
            if from == output {
                return;
            }
            if let Some(tree) = world.tree_mut(view) {
                tree.remove(view);
            }
            if let Some(record) = world.views.get_mut(&view.as_raw()) {
                record.output = output;
            }
            if let Some(record) = world.outputs.get_mut(&output.as_raw()) {
                record.views.insert(view);
            }
            from
        };
        if let Some(moved) = self.slots().view.move_to_output {
            moved(view.as_raw(), from.as_raw(), output.as_raw());
        }
    }

    fn view_send_to_back(&self, view: View) {
        if let Some(tree) = self.world.borrow_mut().tree_mut(view) {
            tree.send_to_back(view);
        }
    }

    fn view_send_below(&self, view: View, other: View) {
        if let Some(tree) = self.world.borrow_mut().tree_mut(view) {
            tree.send_below(view, other);
        }
    }

    fn view_bring_above(&self, view: View, other: View) {
        if let Some(tree) = self.world.borrow_mut().tree_mut(view) {
            tree.bring_above(view, other);
        }
    }

    fn view_bring_to_front(&self, view: View) {
        if let Some(tree) = self.world.borrow_mut().tree_mut(view) {
            tree.bring_to_front(view);
        }
    }

    fn view_mask(&self, view: View) -> u32 {
        self.world.borrow().views.get(&view.as_raw()).map_or(0, |v| v.mask)
    }

    fn view_set_mask(&self, view: View, mask: u32) {
        if let Some(record) = self.world.borrow_mut().views.get_mut(&view.as_raw()) {
            record.mask = mask;
        }
    }

    fn view_geometry(&self, view: View) -> Option<Geometry> {
        self.world.borrow().views.get(&view.as_raw()).map(|v| v.geometry)
    }

    fn view_set_geometry(&self, view: View, _edges: ResizeEdge, geometry: &Geometry) {
        if let Some(record) = self.world.borrow_mut().views.get_mut(&view.as_raw()) {
            record.geometry = *geometry;
        }
    }

    fn view_type(&self, view: View) -> ViewType {
        self.world
            .borrow()
            .views
            .get(&view.as_raw())
            .map_or(ViewType::empty(), |v| v.kind)
    }

    fn view_set_type(&self, view: View, kind: ViewType, toggle: bool) {
        if let Some(record) = self.world.borrow_mut().views.get_mut(&view.as_raw()) {
            record.kind.set(kind, toggle);
        }
    }

    fn view_state(&self, view: View) -> ViewState {
        self.world
            .borrow()
            .views
            .get(&view.as_raw())
            .map_or(ViewState::empty(), |v| v.state)
    }

    fn view_set_state(&self, view: View, state: ViewState, toggle: bool) {
        if let Some(record) = self.world.borrow_mut().views.get_mut(&view.as_raw()) {
            record.state.set(state, toggle);
        }
    }

    fn view_parent(&self, view: View) -> View {
        self.world
            .borrow()
            .views
            .get(&view.as_raw())
            .map_or(View::NONE, |v| v.parent)
    }

    fn view_set_parent(&self, view: View, parent: View) {
        if let Some(record) = self.world.borrow_mut().views.get_mut(&view.as_raw()) {
            record.parent = parent;
        }
    }

    fn view_title(&self, view: View) -> Option<String> {
        self.world.borrow().views.get(&view.as_raw()).and_then(|v| v.title.clone())
    }

    fn view_class(&self, view: View) -> Option<String> {
        self.world.borrow().views.get(&view.as_raw()).and_then(|v| v.class.clone())
    }

    fn view_app_id(&self, view: View) -> Option<String> {
        self.world.borrow().views.get(&view.as_raw()).and_then(|v| v.app_id.clone())
    }

    // ===== Surfaces =====

    fn view_surface(&self, view: View) -> Resource {
        self.world
            .borrow()
            .views
            .get(&view.as_raw())
            .map_or(Resource::NONE, |v| v.surface)
    }

    fn surface_size(&self, surface: Resource) -> Option<Size> {
        self.world
            .borrow()
            .views
            .values()
            .find(|v| v.surface == surface)
            .map(|v| v.geometry.size)
    }

    fn surface_render(&self, surface: Resource, geometry: &Geometry) {
        if !surface.is_none() {
            self.world.borrow_mut().rendered.push((surface, *geometry));
        }
    }

    // ===== Wayland interop =====
    // The stub has no Wayland display; every lookup misses.

    fn wl_display(&self) -> *mut sys::wl_display {
        ptr::null_mut()
    }

    fn view_from_surface_resource(&self, _resource: *mut sys::wl_resource) -> View {
        View::NONE
    }

    fn output_from_output_resource(&self, _resource: *mut sys::wl_resource) -> Output {
        Output::NONE
    }

    fn resource_from_surface_resource(&self, _resource: *mut sys::wl_resource) -> Resource {
        Resource::NONE
    }

    // ===== Input =====

    fn keysym_for_key(&self, key: u32, _modifiers: Option<&Modifiers>) -> u32 {
        self.world.borrow().keymap.get(&key).map_or(0, |&(keysym, _)| keysym)
    }

    fn utf32_for_key(&self, key: u32, _modifiers: Option<&Modifiers>) -> u32 {
        self.world.borrow().keymap.get(&key).map_or(0, |&(_, utf32)| utf32)
    }

    fn current_keys(&self) -> Vec<u32> {
        self.world.borrow().pressed_keys.clone()
    }

    fn pointer_position(&self) -> Point {
        self.world.borrow().pointer
    }

    fn set_pointer_position(&self, position: Point) {
        self.world.borrow_mut().pointer = position;
    }
}
