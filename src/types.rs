//! Numeric newtypes for construction space.
//!
//! Construction space is the plane a task is authored in: Y points up and one
//! unit is whatever the author had in mind (usually centimetres). Backends
//! convert to pixels through a [`Scaler`].

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Distance or coordinate in construction units
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Length(pub f64);

impl Length {
    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn abs(self) -> Length {
        Length(self.0.abs())
    }

    #[inline]
    pub fn min(self, other: Length) -> Length {
        Length(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Length) -> Length {
        Length(self.0.max(other.0))
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length {
        Length(self.0 + rhs.0)
    }
}

impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length {
        Length(self.0 - rhs.0)
    }
}

impl Mul<f64> for Length {
    type Output = Length;
    fn mul(self, rhs: f64) -> Length {
        Length(self.0 * rhs)
    }
}

impl Div<f64> for Length {
    type Output = Length;
    fn div(self, rhs: f64) -> Length {
        Length(self.0 / rhs)
    }
}

/// Direction in degrees, counter-clockwise from +x
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Angle(pub f64);

impl Angle {
    #[inline]
    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn direction(self) -> UnitVec {
        let (sin, cos) = self.0.to_radians().sin_cos();
        UnitVec { dx: cos, dy: sin }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Pixels per construction unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaler {
    pub r_scale: f64,
}

impl Scaler {
    /// `None` unless `r_scale` is positive and finite
    pub fn new(r_scale: f64) -> Option<Scaler> {
        (r_scale.is_finite() && r_scale > 0.0).then_some(Scaler { r_scale })
    }

    #[inline]
    pub fn px(&self, l: Length) -> f64 {
        l.0 * self.r_scale
    }
}

/// Position in construction space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PtU {
    pub x: Length,
    pub y: Length,
}

impl PtU {
    pub fn units(x: f64, y: f64) -> PtU {
        PtU { x: Length(x), y: Length(y) }
    }

    pub fn midpoint(self, other: PtU) -> PtU {
        PtU { x: (self.x + other.x) / 2.0, y: (self.y + other.y) / 2.0 }
    }

    /// `self` at `t = 0`, `other` at `t = 1`; `t` is not clamped
    pub fn lerp(self, other: PtU, t: f64) -> PtU {
        self + (other - self) * t
    }

    pub fn distance(self, other: PtU) -> Length {
        (other - self).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Displacement between two positions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Offset {
    pub dx: Length,
    pub dy: Length,
}

impl Offset {
    pub fn length(self) -> Length {
        Length(self.dx.0.hypot(self.dy.0))
    }

    /// Unit direction of this displacement, `None` when it is zero
    pub fn direction(self) -> Option<UnitVec> {
        UnitVec::normalized(self.dx.0, self.dy.0)
    }
}

impl Mul<f64> for Offset {
    type Output = Offset;
    fn mul(self, rhs: f64) -> Offset {
        Offset { dx: self.dx * rhs, dy: self.dy * rhs }
    }
}

impl Add<Offset> for PtU {
    type Output = PtU;
    fn add(self, rhs: Offset) -> PtU {
        PtU { x: self.x + rhs.dx, y: self.y + rhs.dy }
    }
}

impl Sub for PtU {
    type Output = Offset;
    fn sub(self, rhs: PtU) -> Offset {
        Offset { dx: self.x - rhs.x, dy: self.y - rhs.y }
    }
}

/// Normalized direction, dimensionless
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitVec {
    dx: f64,
    dy: f64,
}

impl UnitVec {
    /// `None` for a zero or non-finite input
    pub fn normalized(dx: f64, dy: f64) -> Option<UnitVec> {
        let len = dx.hypot(dy);
        (len > 0.0 && len.is_finite()).then(|| UnitVec { dx: dx / len, dy: dy / len })
    }

    #[inline]
    pub fn dx(self) -> f64 {
        self.dx
    }

    #[inline]
    pub fn dy(self) -> f64 {
        self.dy
    }

    /// Quarter turn counter-clockwise (Y up)
    pub fn perp(self) -> UnitVec {
        UnitVec { dx: -self.dy, dy: self.dx }
    }

    pub fn dot(self, other: UnitVec) -> f64 {
        self.dx * other.dx + self.dy * other.dy
    }

    /// Direction halfway between `self` and `other`, `None` when they are opposite
    pub fn halfway(self, other: UnitVec) -> Option<UnitVec> {
        UnitVec::normalized(self.dx + other.dx, self.dy + other.dy)
    }
}

impl Neg for UnitVec {
    type Output = UnitVec;
    fn neg(self) -> UnitVec {
        UnitVec { dx: -self.dx, dy: -self.dy }
    }
}

impl Mul<Length> for UnitVec {
    type Output = Offset;
    fn mul(self, len: Length) -> Offset {
        Offset { dx: Length(self.dx * len.0), dy: Length(self.dy * len.0) }
    }
}

/// Axis-aligned bounds in construction units; starts empty
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxU {
    pub min: PtU,
    pub max: PtU,
}

impl BoxU {
    pub fn new() -> BoxU {
        BoxU { min: PtU::units(f64::MAX, f64::MAX), max: PtU::units(f64::MIN, f64::MIN) }
    }

    /// True until the first point is added
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_point(&mut self, p: PtU) {
        self.min = PtU { x: self.min.x.min(p.x), y: self.min.y.min(p.y) };
        self.max = PtU { x: self.max.x.max(p.x), y: self.max.y.max(p.y) };
    }

    pub fn width(&self) -> Length {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> Length {
        self.max.y - self.min.y
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}
