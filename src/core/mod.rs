pub mod compositor;
pub mod engine;
pub mod handle;
pub mod interface;
pub mod registry;
pub mod stub;

// Re-export key types
pub use compositor::{Compositor, Lifecycle};
pub use engine::Engine;
pub use handle::{EventSource, InputDevice, Output, RawHandle, Resource, UserData, View};
pub use interface::{
    ActivationMask, ButtonEvent, EventInterface, EventKind, Handler, InterfaceBuilder, KeyEvent,
    MotionEvent, Propagation, ScrollEvent, TouchEvent, Verdict,
};
pub use stub::{StubEngine, ViewSpec};
