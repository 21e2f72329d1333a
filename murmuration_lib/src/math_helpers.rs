use std::f32::consts::PI;

use glam::Vec2;

/// Steering arithmetic on top of glam's [`Vec2`].
///
/// Every method returns a new vector, nothing is mutated in place. The singular cases
/// (dividing by zero, normalizing or measuring the angle of a zero vector) have defined
/// fallback values instead of producing NaN.
///
/// Names must not collide with glam's inherent methods (`normalize`, `lerp`, ...), those take
/// precedence over trait methods.
pub trait SteerVec {
    /// Component-wise division, `(0, 0)` when `k == 0`.
    fn div_or_zero(self, k: f32) -> Self;

    /// Unit vector in the same direction, or `self` unchanged when its length is 0.
    fn normalize_or_self(self) -> Self;

    /// Rescales to exactly `max` if longer than `max`.
    fn limit(self, max: f32) -> Self;

    /// Rescales to exactly `min` if `0 < length < min`. A zero vector has no direction and is
    /// left as zero.
    fn bottom_limit(self, min: f32) -> Self;

    /// `self * (1 - t) + rhs * t`, `t` is not clamped.
    fn lerp_unclamped(self, rhs: Self, t: f32) -> Self;

    fn distance_to(self, rhs: Self) -> f32;

    /// Unsigned angle in `[0, π]`, `π` when either vector has zero length.
    fn angle_between_or_pi(self, rhs: Self) -> f32;
}

impl SteerVec for Vec2 {
    #[inline]
    fn div_or_zero(self, k: f32) -> Self {
        if k != 0. {
            Vec2::new(self.x / k, self.y / k)
        } else {
            Vec2::ZERO
        }
    }

    #[inline]
    fn normalize_or_self(self) -> Self {
        let mag = self.length();
        if mag != 0. {
            self / mag
        } else {
            self
        }
    }

    #[inline]
    fn limit(self, max: f32) -> Self {
        let mag = self.length();
        if mag > max {
            self * (max / mag)
        } else {
            self
        }
    }

    #[inline]
    fn bottom_limit(self, min: f32) -> Self {
        let mag = self.length();
        if mag < min && mag != 0. {
            self * (min / mag)
        } else {
            self
        }
    }

    #[inline]
    fn lerp_unclamped(self, rhs: Self, t: f32) -> Self {
        Vec2::new(
            self.x * (1. - t) + rhs.x * t,
            self.y * (1. - t) + rhs.y * t,
        )
    }

    #[inline]
    fn distance_to(self, rhs: Self) -> f32 {
        (self - rhs).length()
    }

    fn angle_between_or_pi(self, rhs: Self) -> f32 {
        let mag1 = self.length();
        let mag2 = rhs.length();
        if mag1 == 0. || mag2 == 0. {
            return PI;
        }

        // rounding can push the cosine slightly outside of acos' domain
        let cos = (self.dot(rhs) / (mag1 * mag2)).clamp(-1., 1.);
        cos.acos()
    }
}

/// Heading of a velocity in radians, `atan2(y, x)`.
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * PI / 180.
}
