//! Event interface: the tree of optional handler slots.
//!
//! The shape mirrors the engine's callback table: Output, View, Keyboard,
//! Pointer, Touch, Compositor and Input groups, each slot independently
//! nullable. [`ActivationMask`] assigns one fixed bit per slot; the mask of
//! an interface is computed on demand from which slots are populated and is
//! only handed to the engine at an explicit install step.
//!
//! Handlers receive the [`Compositor`] they were registered on as their
//! first argument, so they can call back into the engine without ambient
//! lookups.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::core::compositor::Compositor;
use crate::core::handle::{InputDevice, Output, View};
use crate::ffi::types::{
    ButtonState, Geometry, KeyState, Modifiers, Point, ResizeEdge, ScrollAxis, Size, TouchType,
    ViewState,
};

// ============================================================================
// Handler results
// ============================================================================

/// Result of a Created handler.
///
/// `Rejected` makes the engine destroy the new object; no further event is
/// delivered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl From<bool> for Verdict {
    fn from(accept: bool) -> Self {
        if accept {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }
}

impl From<Verdict> for bool {
    fn from(verdict: Verdict) -> Self {
        verdict.is_accepted()
    }
}

/// Result of an input-filtering handler.
///
/// `Consumed` keeps the event away from the client it would otherwise
/// reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Propagation {
    Consumed,
    PassThrough,
}

impl Propagation {
    pub fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }
}

impl From<bool> for Propagation {
    fn from(consumed: bool) -> Self {
        if consumed {
            Self::Consumed
        } else {
            Self::PassThrough
        }
    }
}

impl From<Propagation> for bool {
    fn from(propagation: Propagation) -> Self {
        propagation.is_consumed()
    }
}

// ============================================================================
// Input event payloads
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Focused view, or `View::NONE`.
    pub view: View,
    pub time: u32,
    pub modifiers: Modifiers,
    pub key: u32,
    pub state: KeyState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub view: View,
    pub time: u32,
    pub modifiers: Modifiers,
    pub button: u32,
    pub state: ButtonState,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub view: View,
    pub time: u32,
    pub modifiers: Modifiers,
    pub axes: ScrollAxis,
    /// `[vertical, horizontal]`; only the entries flagged in `axes` carry a value.
    pub amount: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub view: View,
    pub time: u32,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub view: View,
    pub time: u32,
    pub modifiers: Modifiers,
    pub touch: TouchType,
    pub slot: i32,
    pub position: Point,
}

// ============================================================================
// Event kinds and the activation mask
// ============================================================================

/// Every event the engine can deliver. The discriminant is the kind's bit
/// position in [`ActivationMask`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    OutputCreated = 0,
    OutputDestroyed = 1,
    OutputFocus = 2,
    OutputResolution = 3,
    OutputRenderPre = 4,
    OutputRenderPost = 5,
    ViewCreated = 6,
    ViewDestroyed = 7,
    ViewFocus = 8,
    ViewMoveToOutput = 9,
    ViewRequestGeometry = 10,
    ViewRequestState = 11,
    ViewRequestMove = 12,
    ViewRequestResize = 13,
    ViewRenderPre = 14,
    ViewRenderPost = 15,
    KeyboardKey = 16,
    PointerButton = 17,
    PointerScroll = 18,
    PointerMotion = 19,
    Touch = 20,
    CompositorReady = 21,
    CompositorTerminate = 22,
    InputCreated = 23,
    InputDestroyed = 24,
}

impl EventKind {
    /// All kinds in bit order.
    pub const ALL: [EventKind; 25] = [
        Self::OutputCreated,
        Self::OutputDestroyed,
        Self::OutputFocus,
        Self::OutputResolution,
        Self::OutputRenderPre,
        Self::OutputRenderPost,
        Self::ViewCreated,
        Self::ViewDestroyed,
        Self::ViewFocus,
        Self::ViewMoveToOutput,
        Self::ViewRequestGeometry,
        Self::ViewRequestState,
        Self::ViewRequestMove,
        Self::ViewRequestResize,
        Self::ViewRenderPre,
        Self::ViewRenderPost,
        Self::KeyboardKey,
        Self::PointerButton,
        Self::PointerScroll,
        Self::PointerMotion,
        Self::Touch,
        Self::CompositorReady,
        Self::CompositorTerminate,
        Self::InputCreated,
        Self::InputDestroyed,
    ];

    pub fn bit(self) -> u32 {
        self as u32
    }

    pub fn mask(self) -> ActivationMask {
        ActivationMask::from_bits_retain(1 << self.bit())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OutputCreated => "output.created",
            Self::OutputDestroyed => "output.destroyed",
            Self::OutputFocus => "output.focus",
            Self::OutputResolution => "output.resolution",
            Self::OutputRenderPre => "output.render.pre",
            Self::OutputRenderPost => "output.render.post",
            Self::ViewCreated => "view.created",
            Self::ViewDestroyed => "view.destroyed",
            Self::ViewFocus => "view.focus",
            Self::ViewMoveToOutput => "view.move_to_output",
            Self::ViewRequestGeometry => "view.request.geometry",
            Self::ViewRequestState => "view.request.state",
            Self::ViewRequestMove => "view.request.move",
            Self::ViewRequestResize => "view.request.resize",
            Self::ViewRenderPre => "view.render.pre",
            Self::ViewRenderPost => "view.render.post",
            Self::KeyboardKey => "keyboard.key",
            Self::PointerButton => "pointer.button",
            Self::PointerScroll => "pointer.scroll",
            Self::PointerMotion => "pointer.motion",
            Self::Touch => "touch.touch",
            Self::CompositorReady => "compositor.ready",
            Self::CompositorTerminate => "compositor.terminate",
            Self::InputCreated => "input.created",
            Self::InputDestroyed => "input.destroyed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Which event kinds the engine should deliver, one bit per kind in
    /// [`EventKind`] order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActivationMask: u32 {
        const OUTPUT_CREATED = 1 << 0;
        const OUTPUT_DESTROYED = 1 << 1;
        const OUTPUT_FOCUS = 1 << 2;
        const OUTPUT_RESOLUTION = 1 << 3;
        const OUTPUT_RENDER_PRE = 1 << 4;
        const OUTPUT_RENDER_POST = 1 << 5;
        const VIEW_CREATED = 1 << 6;
        const VIEW_DESTROYED = 1 << 7;
        const VIEW_FOCUS = 1 << 8;
        const VIEW_MOVE_TO_OUTPUT = 1 << 9;
        const VIEW_REQUEST_GEOMETRY = 1 << 10;
        const VIEW_REQUEST_STATE = 1 << 11;
        const VIEW_REQUEST_MOVE = 1 << 12;
        const VIEW_REQUEST_RESIZE = 1 << 13;
        const VIEW_RENDER_PRE = 1 << 14;
        const VIEW_RENDER_POST = 1 << 15;
        const KEYBOARD_KEY = 1 << 16;
        const POINTER_BUTTON = 1 << 17;
        const POINTER_SCROLL = 1 << 18;
        const POINTER_MOTION = 1 << 19;
        const TOUCH = 1 << 20;
        const COMPOSITOR_READY = 1 << 21;
        const COMPOSITOR_TERMINATE = 1 << 22;
        const INPUT_CREATED = 1 << 23;
        const INPUT_DESTROYED = 1 << 24;
    }
}

impl ActivationMask {
    /// The kinds whose bits are set, in bit order.
    pub fn kinds(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.mask()))
    }
}

impl From<EventKind> for ActivationMask {
    fn from(kind: EventKind) -> Self {
        kind.mask()
    }
}

// ============================================================================
// Handler signatures
// ============================================================================

pub type CreatedFn<H> = dyn Fn(&Compositor, H) -> Verdict;
pub type NotifyFn<H> = dyn Fn(&Compositor, H);
pub type FocusFn<H> = dyn Fn(&Compositor, H, bool);
/// `(output, from, to)`
pub type ResolutionFn = dyn Fn(&Compositor, Output, Size, Size);
/// `(view, from_output, to_output)`
pub type MoveToOutputFn = dyn Fn(&Compositor, View, Output, Output);
pub type GeometryRequestFn = dyn Fn(&Compositor, View, Geometry);
/// `(view, requested_state, toggle)`
pub type StateRequestFn = dyn Fn(&Compositor, View, ViewState, bool);
pub type MoveRequestFn = dyn Fn(&Compositor, View, Point);
pub type ResizeRequestFn = dyn Fn(&Compositor, View, ResizeEdge, Point);
pub type InputFn<E> = dyn Fn(&Compositor, &E) -> Propagation;
pub type LifecycleFn = dyn Fn(&Compositor);

/// One nullable handler slot.
///
/// The handler is stored behind an `Rc` so dispatch can clone it out and
/// release the slot before invoking it; a handler may therefore replace
/// its own slot while it runs.
pub struct Slot<F: ?Sized> {
    handler: RefCell<Option<Rc<F>>>,
}

impl<F: ?Sized> Slot<F> {
    pub fn is_set(&self) -> bool {
        self.handler.borrow().is_some()
    }

    pub fn get(&self) -> Option<Rc<F>> {
        self.handler.borrow().clone()
    }

    /// Store `handler`, returning the one it replaced.
    pub(crate) fn replace(&self, handler: Rc<F>) -> Option<Rc<F>> {
        self.handler.borrow_mut().replace(handler)
    }

    pub(crate) fn take(&self) -> Option<Rc<F>> {
        self.handler.borrow_mut().take()
    }
}

impl<F: ?Sized> Default for Slot<F> {
    fn default() -> Self {
        Self {
            handler: RefCell::new(None),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Slot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_set() { "Slot(set)" } else { "Slot(empty)" })
    }
}

// ============================================================================
// Slot tree
// ============================================================================

#[derive(Debug)]
pub struct RenderEvents<H> {
    pub pre: Slot<NotifyFn<H>>,
    pub post: Slot<NotifyFn<H>>,
}

impl<H> Default for RenderEvents<H> {
    fn default() -> Self {
        Self {
            pre: Slot::default(),
            post: Slot::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct OutputEvents {
    pub created: Slot<CreatedFn<Output>>,
    pub destroyed: Slot<NotifyFn<Output>>,
    pub focus: Slot<FocusFn<Output>>,
    pub resolution: Slot<ResolutionFn>,
    pub render: RenderEvents<Output>,
}

#[derive(Debug, Default)]
pub struct ViewRequests {
    pub geometry: Slot<GeometryRequestFn>,
    pub state: Slot<StateRequestFn>,
    pub move_: Slot<MoveRequestFn>,
    pub resize: Slot<ResizeRequestFn>,
}

#[derive(Debug, Default)]
pub struct ViewEvents {
    pub created: Slot<CreatedFn<View>>,
    pub destroyed: Slot<NotifyFn<View>>,
    pub focus: Slot<FocusFn<View>>,
    pub move_to_output: Slot<MoveToOutputFn>,
    pub request: ViewRequests,
    pub render: RenderEvents<View>,
}

#[derive(Debug, Default)]
pub struct KeyboardEvents {
    pub key: Slot<InputFn<KeyEvent>>,
}

#[derive(Debug, Default)]
pub struct PointerEvents {
    pub button: Slot<InputFn<ButtonEvent>>,
    pub scroll: Slot<InputFn<ScrollEvent>>,
    pub motion: Slot<InputFn<MotionEvent>>,
}

#[derive(Debug, Default)]
pub struct TouchEvents {
    pub touch: Slot<InputFn<TouchEvent>>,
}

#[derive(Debug, Default)]
pub struct CompositorEvents {
    pub ready: Slot<LifecycleFn>,
    pub terminate: Slot<LifecycleFn>,
}

#[derive(Debug, Default)]
pub struct InputEvents {
    pub created: Slot<CreatedFn<InputDevice>>,
    pub destroyed: Slot<NotifyFn<InputDevice>>,
}

/// The full handler table.
#[derive(Debug, Default)]
pub struct EventInterface {
    pub output: OutputEvents,
    pub view: ViewEvents,
    pub keyboard: KeyboardEvents,
    pub pointer: PointerEvents,
    pub touch: TouchEvents,
    pub compositor: CompositorEvents,
    pub input: InputEvents,
}

impl EventInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InterfaceBuilder {
        InterfaceBuilder::default()
    }

    /// One bit per populated slot. Pure; nothing is sent to the engine.
    pub fn activation_mask(&self) -> ActivationMask {
        EventKind::ALL
            .into_iter()
            .filter(|&kind| self.is_set(kind))
            .fold(ActivationMask::empty(), |mask, kind| mask | kind.mask())
    }

    pub fn is_set(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::OutputCreated => self.output.created.is_set(),
            EventKind::OutputDestroyed => self.output.destroyed.is_set(),
            EventKind::OutputFocus => self.output.focus.is_set(),
            EventKind::OutputResolution => self.output.resolution.is_set(),
            EventKind::OutputRenderPre => self.output.render.pre.is_set(),
            EventKind::OutputRenderPost => self.output.render.post.is_set(),
            EventKind::ViewCreated => self.view.created.is_set(),
            EventKind::ViewDestroyed => self.view.destroyed.is_set(),
            EventKind::ViewFocus => self.view.focus.is_set(),
            EventKind::ViewMoveToOutput => self.view.move_to_output.is_set(),
            EventKind::ViewRequestGeometry => self.view.request.geometry.is_set(),
            EventKind::ViewRequestState => self.view.request.state.is_set(),
            EventKind::ViewRequestMove => self.view.request.move_.is_set(),
            EventKind::ViewRequestResize => self.view.request.resize.is_set(),
            EventKind::ViewRenderPre => self.view.render.pre.is_set(),
            EventKind::ViewRenderPost => self.view.render.post.is_set(),
            EventKind::KeyboardKey => self.keyboard.key.is_set(),
            EventKind::PointerButton => self.pointer.button.is_set(),
            EventKind::PointerScroll => self.pointer.scroll.is_set(),
            EventKind::PointerMotion => self.pointer.motion.is_set(),
            EventKind::Touch => self.touch.touch.is_set(),
            EventKind::CompositorReady => self.compositor.ready.is_set(),
            EventKind::CompositorTerminate => self.compositor.terminate.is_set(),
            EventKind::InputCreated => self.input.created.is_set(),
            EventKind::InputDestroyed => self.input.destroyed.is_set(),
        }
    }

    /// Put `handler` into its slot. Returns true when it replaced one.
    pub(crate) fn store(&self, handler: Handler) -> bool {
        match handler {
            Handler::OutputCreated(h) => self.output.created.replace(h).is_some(),
            Handler::OutputDestroyed(h) => self.output.destroyed.replace(h).is_some(),
            Handler::OutputFocus(h) => self.output.focus.replace(h).is_some(),
            Handler::OutputResolution(h) => self.output.resolution.replace(h).is_some(),
            Handler::OutputRenderPre(h) => self.output.render.pre.replace(h).is_some(),
            Handler::OutputRenderPost(h) => self.output.render.post.replace(h).is_some(),
            Handler::ViewCreated(h) => self.view.created.replace(h).is_some(),
            Handler::ViewDestroyed(h) => self.view.destroyed.replace(h).is_some(),
            Handler::ViewFocus(h) => self.view.focus.replace(h).is_some(),
            Handler::ViewMoveToOutput(h) => self.view.move_to_output.replace(h).is_some(),
            Handler::ViewRequestGeometry(h) => self.view.request.geometry.replace(h).is_some(),
            Handler::ViewRequestState(h) => self.view.request.state.replace(h).is_some(),
            Handler::ViewRequestMove(h) => self.view.request.move_.replace(h).is_some(),
            Handler::ViewRequestResize(h) => self.view.request.resize.replace(h).is_some(),
            Handler::ViewRenderPre(h) => self.view.render.pre.replace(h).is_some(),
            Handler::ViewRenderPost(h) => self.view.render.post.replace(h).is_some(),
            Handler::KeyboardKey(h) => self.keyboard.key.replace(h).is_some(),
            Handler::PointerButton(h) => self.pointer.button.replace(h).is_some(),
            Handler::PointerScroll(h) => self.pointer.scroll.replace(h).is_some(),
            Handler::PointerMotion(h) => self.pointer.motion.replace(h).is_some(),
            Handler::Touch(h) => self.touch.touch.replace(h).is_some(),
            Handler::CompositorReady(h) => self.compositor.ready.replace(h).is_some(),
            Handler::CompositorTerminate(h) => self.compositor.terminate.replace(h).is_some(),
            Handler::InputCreated(h) => self.input.created.replace(h).is_some(),
            Handler::InputDestroyed(h) => self.input.destroyed.replace(h).is_some(),
        }
    }

    fn take(&self, kind: EventKind) -> Option<Handler> {
        match kind {
            EventKind::OutputCreated => self.output.created.take().map(Handler::OutputCreated),
            EventKind::OutputDestroyed => self.output.destroyed.take().map(Handler::OutputDestroyed),
            EventKind::OutputFocus => self.output.focus.take().map(Handler::OutputFocus),
            EventKind::OutputResolution => {
                self.output.resolution.take().map(Handler::OutputResolution)
            }
            EventKind::OutputRenderPre => self.output.render.pre.take().map(Handler::OutputRenderPre),
            EventKind::OutputRenderPost => {
                self.output.render.post.take().map(Handler::OutputRenderPost)
            }
            EventKind::ViewCreated => self.view.created.take().map(Handler::ViewCreated),
            EventKind::ViewDestroyed => self.view.destroyed.take().map(Handler::ViewDestroyed),
            EventKind::ViewFocus => self.view.focus.take().map(Handler::ViewFocus),
            EventKind::ViewMoveToOutput => {
                self.view.move_to_output.take().map(Handler::ViewMoveToOutput)
            }
            EventKind::ViewRequestGeometry => {
                self.view.request.geometry.take().map(Handler::ViewRequestGeometry)
            }
            EventKind::ViewRequestState => {
                self.view.request.state.take().map(Handler::ViewRequestState)
            }
            EventKind::ViewRequestMove => self.view.request.move_.take().map(Handler::ViewRequestMove),
            EventKind::ViewRequestResize => {
                self.view.request.resize.take().map(Handler::ViewRequestResize)
            }
            EventKind::ViewRenderPre => self.view.render.pre.take().map(Handler::ViewRenderPre),
            EventKind::ViewRenderPost => self.view.render.post.take().map(Handler::ViewRenderPost),
            EventKind::KeyboardKey => self.keyboard.key.take().map(Handler::KeyboardKey),
            EventKind::PointerButton => self.pointer.button.take().map(Handler::PointerButton),
            EventKind::PointerScroll => self.pointer.scroll.take().map(Handler::PointerScroll),
            EventKind::PointerMotion => self.pointer.motion.take().map(Handler::PointerMotion),
            EventKind::Touch => self.touch.touch.take().map(Handler::Touch),
            EventKind::CompositorReady => self.compositor.ready.take().map(Handler::CompositorReady),
            EventKind::CompositorTerminate => {
                self.compositor.terminate.take().map(Handler::CompositorTerminate)
            }
            EventKind::InputCreated => self.input.created.take().map(Handler::InputCreated),
            EventKind::InputDestroyed => self.input.destroyed.take().map(Handler::InputDestroyed),
        }
    }

    /// Empty the table, yielding the populated slots in bit order.
    pub fn into_handlers(self) -> Vec<Handler> {
        EventKind::ALL
            .into_iter()
            .filter_map(|kind| self.take(kind))
            .collect()
    }
}

// ============================================================================
// Handler
// ============================================================================

/// A handler bound to its event kind, for incremental registration and for
/// building an [`EventInterface`].
#[derive(Clone)]
pub enum Handler {
    OutputCreated(Rc<CreatedFn<Output>>),
    OutputDestroyed(Rc<NotifyFn<Output>>),
    OutputFocus(Rc<FocusFn<Output>>),
    OutputResolution(Rc<ResolutionFn>),
    OutputRenderPre(Rc<NotifyFn<Output>>),
    OutputRenderPost(Rc<NotifyFn<Output>>),
    ViewCreated(Rc<CreatedFn<View>>),
    ViewDestroyed(Rc<NotifyFn<View>>),
    ViewFocus(Rc<FocusFn<View>>),
    ViewMoveToOutput(Rc<MoveToOutputFn>),
    ViewRequestGeometry(Rc<GeometryRequestFn>),
    ViewRequestState(Rc<StateRequestFn>),
    ViewRequestMove(Rc<MoveRequestFn>),
    ViewRequestResize(Rc<ResizeRequestFn>),
    ViewRenderPre(Rc<NotifyFn<View>>),
    ViewRenderPost(Rc<NotifyFn<View>>),
    KeyboardKey(Rc<InputFn<KeyEvent>>),
    PointerButton(Rc<InputFn<ButtonEvent>>),
    PointerScroll(Rc<InputFn<ScrollEvent>>),
    PointerMotion(Rc<InputFn<MotionEvent>>),
    Touch(Rc<InputFn<TouchEvent>>),
    CompositorReady(Rc<LifecycleFn>),
    CompositorTerminate(Rc<LifecycleFn>),
    InputCreated(Rc<CreatedFn<InputDevice>>),
    InputDestroyed(Rc<NotifyFn<InputDevice>>),
}

impl Handler {
    // ===== Output =====

    pub fn output_created(f: impl Fn(&Compositor, Output) -> Verdict + 'static) -> Self {
        Self::OutputCreated(Rc::new(f))
    }

    pub fn output_destroyed(f: impl Fn(&Compositor, Output) + 'static) -> Self {
        Self::OutputDestroyed(Rc::new(f))
    }

    pub fn output_focus(f: impl Fn(&Compositor, Output, bool) + 'static) -> Self {
        Self::OutputFocus(Rc::new(f))
    }

    pub fn output_resolution(f: impl Fn(&Compositor, Output, Size, Size) + 'static) -> Self {
        Self::OutputResolution(Rc::new(f))
    }

    pub fn output_render_pre(f: impl Fn(&Compositor, Output) + 'static) -> Self {
        Self::OutputRenderPre(Rc::new(f))
    }

    pub fn output_render_post(f: impl Fn(&Compositor, Output) + 'static) -> Self {
        Self::OutputRenderPost(Rc::new(f))
    }

    // ===== View =====

    pub fn view_created(f: impl Fn(&Compositor, View) -> Verdict + 'static) -> Self {
        Self::ViewCreated(Rc::new(f))
    }

    pub fn view_destroyed(f: impl Fn(&Compositor, View) + 'static) -> Self {
        Self::ViewDestroyed(Rc::new(f))
    }

    pub fn view_focus(f: impl Fn(&Compositor, View, bool) + 'static) -> Self {
        Self::ViewFocus(Rc::new(f))
    }

    pub fn view_move_to_output(f: impl Fn(&Compositor, View, Output, Output) + 'static) -> Self {
        Self::ViewMoveToOutput(Rc::new(f))
    }

    pub fn view_request_geometry(f: impl Fn(&Compositor, View, Geometry) + 'static) -> Self {
        Self::ViewRequestGeometry(Rc::new(f))
    }

    pub fn view_request_state(f: impl Fn(&Compositor, View, ViewState, bool) + 'static) -> Self {
        Self::ViewRequestState(Rc::new(f))
    }

    pub fn view_request_move(f: impl Fn(&Compositor, View, Point) + 'static) -> Self {
        Self::ViewRequestMove(Rc::new(f))
    }

    pub fn view_request_resize(
        f: impl Fn(&Compositor, View, ResizeEdge, Point) + 'static,
    ) -> Self {
        Self::ViewRequestResize(Rc::new(f))
    }

    pub fn view_render_pre(f: impl Fn(&Compositor, View) + 'static) -> Self {
        Self::ViewRenderPre(Rc::new(f))
    }

    pub fn view_render_post(f: impl Fn(&Compositor, View) + 'static) -> Self {
        Self::ViewRenderPost(Rc::new(f))
    }

    // ===== Input =====

    pub fn keyboard_key(f: impl Fn(&Compositor, &KeyEvent) -> Propagation + 'static) -> Self {
        Self::KeyboardKey(Rc::new(f))
    }

    pub fn pointer_button(
        f: impl Fn(&Compositor, &ButtonEvent) -> Propagation + 'static,
    ) -> Self {
        Self::PointerButton(Rc::new(f))
    }

    pub fn pointer_scroll(
        f: impl Fn(&Compositor, &ScrollEvent) -> Propagation + 'static,
    ) -> Self {
        Self::PointerScroll(Rc::new(f))
    }

    pub fn pointer_motion(
        f: impl Fn(&Compositor, &MotionEvent) -> Propagation + 'static,
    ) -> Self {
        Self::PointerMotion(Rc::new(f))
    }

    pub fn touch(f: impl Fn(&Compositor, &TouchEvent) -> Propagation + 'static) -> Self {
        Self::Touch(Rc::new(f))
    }

    // ===== Lifecycle and devices =====

    pub fn compositor_ready(f: impl Fn(&Compositor) + 'static) -> Self {
        Self::CompositorReady(Rc::new(f))
    }

    pub fn compositor_terminate(f: impl Fn(&Compositor) + 'static) -> Self {
        Self::CompositorTerminate(Rc::new(f))
    }

    pub fn input_created(f: impl Fn(&Compositor, InputDevice) -> Verdict + 'static) -> Self {
        Self::InputCreated(Rc::new(f))
    }

    pub fn input_destroyed(f: impl Fn(&Compositor, InputDevice) + 'static) -> Self {
        Self::InputDestroyed(Rc::new(f))
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::OutputCreated(_) => EventKind::OutputCreated,
            Self::OutputDestroyed(_) => EventKind::OutputDestroyed,
            Self::OutputFocus(_) => EventKind::OutputFocus,
            Self::OutputResolution(_) => EventKind::OutputResolution,
            Self::OutputRenderPre(_) => EventKind::OutputRenderPre,
            Self::OutputRenderPost(_) => EventKind::OutputRenderPost,
            Self::ViewCreated(_) => EventKind::ViewCreated,
            Self::ViewDestroyed(_) => EventKind::ViewDestroyed,
            Self::ViewFocus(_) => EventKind::ViewFocus,
            Self::ViewMoveToOutput(_) => EventKind::ViewMoveToOutput,
            Self::ViewRequestGeometry(_) => EventKind::ViewRequestGeometry,
            Self::ViewRequestState(_) => EventKind::ViewRequestState,
            Self::ViewRequestMove(_) => EventKind::ViewRequestMove,
            Self::ViewRequestResize(_) => EventKind::ViewRequestResize,
            Self::ViewRenderPre(_) => EventKind::ViewRenderPre,
            Self::ViewRenderPost(_) => EventKind::ViewRenderPost,
            Self::KeyboardKey(_) => EventKind::KeyboardKey,
            Self::PointerButton(_) => EventKind::PointerButton,
            Self::PointerScroll(_) => EventKind::PointerScroll,
            Self::PointerMotion(_) => EventKind::PointerMotion,
            Self::Touch(_) => EventKind::Touch,
            Self::CompositorReady(_) => EventKind::CompositorReady,
            Self::CompositorTerminate(_) => EventKind::CompositorTerminate,
            Self::InputCreated(_) => EventKind::InputCreated,
            Self::InputDestroyed(_) => EventKind::InputDestroyed,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.kind()).finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Bulk construction of an [`EventInterface`]. The mask is not computed
/// until the built interface is installed.
#[derive(Debug, Default)]
pub struct InterfaceBuilder {
    interface: EventInterface,
}

impl InterfaceBuilder {
    /// Add a handler; a later handler for the same kind replaces it.
    pub fn on(self, handler: Handler) -> Self {
        self.interface.store(handler);
        self
    }

    pub fn build(self) -> EventInterface {
        self.interface
    }
}

// ============================================================================
// Tests
// ============================================================================
