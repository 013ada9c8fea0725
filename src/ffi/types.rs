//! Host-side value types.
//!
//! These are what handlers and engine accessors see. Their native
//! counterparts live in [`crate::ffi::sys`]; conversions are in
//! [`crate::ffi::marshal`].

use bitflags::bitflags;

// ============================================================================
// Geometry Types
// ============================================================================

/// 2D point in compositor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// 2D size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const ZERO: Self = Self { w: 0, h: 0 };

    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Origin plus size. No normalization is applied anywhere in the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Geometry {
    pub origin: Point,
    pub size: Size,
}

impl Geometry {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn from_parts(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self::new(Point::new(x, y), Size::new(w, h))
    }

    pub fn contains_point(&self, point: Point) -> bool {
        let (x, y) = (i64::from(point.x), i64::from(point.y));
        let (left, top) = (i64::from(self.origin.x), i64::from(self.origin.y));
        x >= left
            && x < left + i64::from(self.size.w)
            && y >= top
            && y < top + i64::from(self.size.h)
    }
}

// ============================================================================
// Bit Sets
// ============================================================================

bitflags! {
    /// Active keyboard LED indicators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Leds: u32 {
        const NUM = 1 << 0;
        const CAPS = 1 << 1;
        const SCROLL = 1 << 2;
    }
}

bitflags! {
    /// Active modifier keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mods: u32 {
        const SHIFT = 1 << 0;
        const CAPS = 1 << 1;
        const CTRL = 1 << 2;
        const ALT = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const LOGO = 1 << 6;
        const MOD5 = 1 << 7;
    }
}

/// LED and modifier state attached to keyboard, pointer and touch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub leds: Leds,
    pub mods: Mods,
}

impl Modifiers {
    pub fn new(leds: Leds, mods: Mods) -> Self {
        Self { leds, mods }
    }
}

bitflags! {
    /// View state bits, both as requested by clients and as set by the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewState: u32 {
        const MAXIMIZED = 1 << 0;
        const FULLSCREEN = 1 << 1;
        const RESIZING = 1 << 2;
        const MOVING = 1 << 3;
        const ACTIVATED = 1 << 4;
    }
}

bitflags! {
    /// View type bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewType: u32 {
        /// Override redirect (x11)
        const OVERRIDE_REDIRECT = 1 << 0;
        /// Tooltips, DnD's, menus (x11)
        const UNMANAGED = 1 << 1;
        const SPLASH = 1 << 2;
        const MODAL = 1 << 3;
        const POPUP = 1 << 4;
    }
}

bitflags! {
    /// Edges involved in an interactive resize.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResizeEdge: u32 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

bitflags! {
    /// Axes carrying a value in a scroll event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScrollAxis: u8 {
        const VERTICAL = 1 << 0;
        const HORIZONTAL = 1 << 1;
    }
}

bitflags! {
    /// Readiness conditions for file descriptor event sources.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u32 {
        const READABLE = 0x01;
        const WRITABLE = 0x02;
        const HANGUP = 0x04;
        const ERROR = 0x08;
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Key state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyState {
    #[default]
    Released,
    Pressed,
}

impl KeyState {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Pressed,
            _ => Self::Released,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Released => 0,
            Self::Pressed => 1,
        }
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self, Self::Pressed)
    }
}

/// Pointer button state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    #[default]
    Released,
    Pressed,
}

impl ButtonState {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Pressed,
            _ => Self::Released,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Released => 0,
            Self::Pressed => 1,
        }
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self, Self::Pressed)
    }
}

/// Touch event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchType {
    Down,
    Up,
    Motion,
    Frame,
    Cancel,
}

impl TouchType {
    /// Unknown phases are reported as `Cancel`.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Down,
            1 => Self::Up,
            2 => Self::Motion,
            3 => Self::Frame,
            _ => Self::Cancel,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Down => 0,
            Self::Up => 1,
            Self::Motion => 2,
            Self::Frame => 3,
            Self::Cancel => 4,
        }
    }
}

/// Severity of a line emitted by the engine's logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    Info,
    Warn,
    Error,
    Wayland,
}

impl LogType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Warn,
            2 => Self::Error,
            3 => Self::Wayland,
            _ => Self::Info,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Info => 0,
            Self::Warn => 1,
            Self::Error => 2,
            Self::Wayland => 3,
        }
    }
}

/// Backend the engine is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    #[default]
    None,
    Drm,
    X11,
}

impl BackendType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Drm,
            2 => Self::X11,
            _ => Self::None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_contains_point() {
        let g = Geometry::from_parts(-5, 10, 800, 600);
        assert!(g.contains_point(Point::new(-5, 10)));
        assert!(g.contains_point(Point::new(794, 609)));
        assert!(!g.contains_point(Point::new(795, 10)));
        assert!(!g.contains_point(Point::new(0, 9)));
    }

    #[test]
    fn test_resize_edge_corners() {
        assert_eq!(ResizeEdge::TOP_LEFT.bits(), 5);
        assert_eq!(ResizeEdge::BOTTOM_LEFT.bits(), 6);
        assert_eq!(ResizeEdge::TOP_RIGHT.bits(), 9);
        assert_eq!(ResizeEdge::BOTTOM_RIGHT.bits(), 10);
    }

    #[test]
    fn test_state_enums_from_raw() {
        assert!(KeyState::from_raw(1).is_pressed());
        assert!(!ButtonState::from_raw(0).is_pressed());
        assert_eq!(TouchType::from_raw(2), TouchType::Motion);
        assert_eq!(TouchType::from_raw(42), TouchType::Cancel);
        assert_eq!(LogType::from_raw(3), LogType::Wayland);
        assert_eq!(BackendType::from_raw(2), BackendType::X11);
    }
}
