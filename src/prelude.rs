//! Common imports for code written against the bridge.

pub use std::rc::Rc;

pub use crate::config::BridgeConfig;
pub use crate::core::{
    ActivationMask, Compositor, Engine, EventInterface, EventKind, Handler, Lifecycle, Output,
    Propagation, Resource, Verdict, View,
};
pub use crate::ffi::types::{Geometry, Modifiers, Point, Size};

pub type Result<T> = std::result::Result<T, crate::ffi::errors::BridgeError>;
