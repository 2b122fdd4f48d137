//! Planar vector math and arena bounds shared by agents and the world.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Two-dimensional vector used for positions, velocities and forces.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Construct a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction, or zero when the length is zero.
    #[must_use]
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            self / len
        } else {
            Self::ZERO
        }
    }

    /// Rescales the vector down to `max` when it is longer; shorter vectors are untouched.
    #[must_use]
    pub fn limit(self, max: f32) -> Self {
        let len_sq = self.length_squared();
        if len_sq > max * max && len_sq > 0.0 {
            self * (max / len_sq.sqrt())
        } else {
            self
        }
    }

    /// Same direction with the given magnitude; zero stays zero.
    #[must_use]
    pub fn with_length(self, length: f32) -> Self {
        self.normalize_or_zero() * length
    }

    /// Angle of the vector in radians, measured from the positive x axis.
    #[must_use]
    pub fn heading(self) -> f32 {
        self.y.atan2(self.x)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Random direction obtained by normalising a uniform draw from `[-spread, spread]^2`.
    ///
    /// The draw is not uniform on the circle (diagonals are favoured slightly); a
    /// zero draw yields the zero vector.
    pub fn random_direction<R: Rng + ?Sized>(rng: &mut R, spread: f32) -> Self {
        if spread <= 0.0 {
            return Self::ZERO;
        }
        let x = rng.random_range(-spread..=spread);
        let y = rng.random_range(-spread..=spread);
        Self::new(x, y).normalize_or_zero()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl DivAssign<f32> for Vec2 {
    fn div_assign(&mut self, rhs: f32) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Rectangular extent of the simulated area, owned by the host surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when a non-empty interior remains inside `margin` on every edge.
    #[must_use]
    pub fn fits_margin(&self, margin: f32) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width > 2.0 * margin
            && self.height > 2.0 * margin
    }

    /// Lower and upper corners of the region agents are confined to.
    #[must_use]
    pub fn interior(&self, margin: f32) -> (Vec2, Vec2) {
        (
            Vec2::new(margin, margin),
            Vec2::new(self.width - margin, self.height - margin),
        )
    }

    /// Uniform random point inside the margins.
    pub fn random_point<R: Rng + ?Sized>(&self, margin: f32, rng: &mut R) -> Vec2 {
        let (lo, hi) = self.interior(margin);
        Vec2::new(
            rng.random_range(lo.x..=hi.x),
            rng.random_range(lo.y..=hi.y),
        )
    }

    /// Elastic bounce against the inward margins, each axis handled independently.
    ///
    /// A coordinate past an edge is clamped onto it and the matching velocity
    /// component is turned to point back inside. This departs from a plain
    /// negation on purpose: an agent already outside the interior with an
    /// inward velocity keeps heading inward instead of being flipped back out.
    pub fn reflect(&self, position: &mut Vec2, velocity: &mut Vec2, margin: f32) {
        let (lo, hi) = self.interior(margin);
        reflect_axis(&mut position.x, &mut velocity.x, lo.x, hi.x);
        reflect_axis(&mut position.y, &mut velocity.y, lo.y, hi.y);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

fn reflect_axis(coord: &mut f32, speed: &mut f32, lo: f32, hi: f32) {
    if *coord < lo {
        *coord = lo;
        *speed = speed.abs();
    } else if *coord > hi {
        *coord = hi;
        *speed = -speed.abs();
    }
}
