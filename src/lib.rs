// wlc-bridge
//
// Callback-dispatch and handle bridge between Rust hosts and the wlc
// compositor engine. The engine owns every object and runs the loop;
// this crate routes its events to host handlers and marshals host calls
// back into it.

pub mod config;
pub mod core;
pub mod ffi;
pub mod prelude;
pub mod util;

pub use crate::config::BridgeConfig;
pub use crate::core::*;
pub use crate::ffi::errors::{BridgeError, Result};
pub use crate::ffi::types::*;

#[cfg(feature = "native")]
pub use crate::ffi::native::NativeEngine;

#[cfg(test)]
mod tests;
