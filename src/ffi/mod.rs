//! FFI module - ABI boundary with the compositor engine
//!
//! `sys` mirrors the C headers, `marshal` converts values across the
//! boundary, `shim` holds the entry points the engine calls, and `native`
//! (behind the `native` feature) is the `Engine` implemented over libwlc.

pub mod errors;
pub mod marshal;
pub mod shim;
pub mod sys;
pub mod types;

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::NativeEngine;
