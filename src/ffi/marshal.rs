//! Value marshaling between native structs and host types.
//!
//! Value conversions are plain `From` impls in both directions and never
//! clamp or validate. Structs handed to the engine by address are passed as
//! stack temporaries that live exactly as long as the call. The only heap
//! temporaries the native calling convention needs are NULL-terminated
//! argument vectors; [`CStrArray`] owns those and frees them on every exit
//! path, unwinding included.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use crate::core::handle::RawHandle;
use crate::ffi::errors::{BridgeError, Result};
use crate::ffi::sys;
use crate::ffi::types::{Geometry, Leds, Modifiers, Mods, Point, Size};

// ============================================================================
// Value structs
// ============================================================================

impl From<Point> for sys::wlc_point {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<sys::wlc_point> for Point {
    fn from(p: sys::wlc_point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Size> for sys::wlc_size {
    fn from(s: Size) -> Self {
        Self { w: s.w, h: s.h }
    }
}

impl From<sys::wlc_size> for Size {
    fn from(s: sys::wlc_size) -> Self {
        Self { w: s.w, h: s.h }
    }
}

impl From<Geometry> for sys::wlc_geometry {
    fn from(g: Geometry) -> Self {
        Self {
            origin: g.origin.into(),
            size: g.size.into(),
        }
    }
}

impl From<sys::wlc_geometry> for Geometry {
    fn from(g: sys::wlc_geometry) -> Self {
        Self {
            origin: g.origin.into(),
            size: g.size.into(),
        }
    }
}

impl From<Modifiers> for sys::wlc_modifiers {
    fn from(m: Modifiers) -> Self {
        Self {
            leds: m.leds.bits(),
            mods: m.mods.bits(),
        }
    }
}

impl From<sys::wlc_modifiers> for Modifiers {
    fn from(m: sys::wlc_modifiers) -> Self {
        // Unknown bits are kept so the value survives a round trip.
        Self {
            leds: Leds::from_bits_retain(m.leds),
            mods: Mods::from_bits_retain(m.mods),
        }
    }
}

/// Read a native struct passed by address.
///
/// # Safety
/// `ptr` must be null or point to a valid, initialized `N`.
pub unsafe fn from_native<N: Copy, V: From<N>>(ptr: *const N) -> Option<V> {
    ptr.as_ref().map(|native| V::from(*native))
}

// ============================================================================
// Arrays and strings
// ============================================================================

/// Copy a native handle array into an owned snapshot.
///
/// # Safety
/// `ptr` must be null or valid for `len` reads.
pub unsafe fn handles_from_raw<H: RawHandle>(ptr: *const sys::wlc_handle, len: usize) -> Vec<H> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(ptr, len)
        .iter()
        .map(|&raw| H::from_raw(raw))
        .collect()
}

/// Copy a native `u32` array into an owned snapshot.
///
/// # Safety
/// `ptr` must be null or valid for `len` reads.
pub unsafe fn u32s_from_raw(ptr: *const u32, len: usize) -> Vec<u32> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(ptr, len).to_vec()
}

/// Copy an engine-owned C string. Invalid UTF-8 is replaced.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn string_from_raw(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// Owned, NULL-terminated `char *argv[]`.
///
/// The strings and the pointer vector are released together when the value
/// drops, so the allocation never outlives the call it was built for.
#[derive(Debug)]
pub struct CStrArray {
    // Owns the storage `ptrs` points into.
    _owned: Vec<CString>,
    ptrs: Vec<*mut c_char>,
}

impl CStrArray {
    pub fn new<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let owned = items
            .into_iter()
            .map(|item| CString::new(item.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(BridgeError::from)?;

        let mut ptrs: Vec<*mut c_char> = owned.iter().map(|s| s.as_ptr() as *mut c_char).collect();
        ptrs.push(ptr::null_mut());

        Ok(Self { _owned: owned, ptrs })
    }

    /// Number of strings, not counting the terminator.
    pub fn len(&self) -> usize {
        self.ptrs.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn argc(&self) -> c_int {
        c_int::try_from(self.len()).unwrap_or(c_int::MAX)
    }

    pub fn as_ptr(&self) -> *const *mut c_char {
        self.ptrs.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }
}

// ============================================================================
// Tests
// ============================================================================
