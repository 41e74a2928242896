use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 2D vector in logical units.
///
/// All operations are value-returning; degenerate inputs (zero divisor, zero-length
/// normalize) produce the zero vector instead of NaN/Infinity.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);
    pub const ONE: Vec2 = Vec2::new(1.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    /// Unit vector pointing at `angle` radians (0 = +X, positive = towards +Y).
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    #[inline]
    pub fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }

    #[inline]
    pub fn subtract(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }

    #[inline]
    pub fn multiply_scalar(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    /// Component-wise product.
    #[inline]
    pub fn multiply(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x * rhs.x, self.y * rhs.y)
    }

    /// Divides by `s`; a zero divisor yields the zero vector.
    #[inline]
    pub fn divide_scalar(self, s: f32) -> Vec2 {
        if s == 0.0 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / s, self.y / s)
        }
    }

    #[inline]
    pub fn dot(self, rhs: Vec2) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// 2D cross product (z component of the 3D cross product).
    #[inline]
    pub fn cross(self, rhs: Vec2) -> f32 {
        self.x * rhs.y - self.y * rhs.x
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    #[inline]
    pub fn distance(self, rhs: Vec2) -> f32 {
        (rhs - self).length()
    }

    /// Unit-length copy; the zero vector normalizes to itself.
    #[inline]
    pub fn normalize(self) -> Vec2 {
        self.divide_scalar(self.length())
    }

    /// Linear interpolation towards `to`; `t` is not clamped.
    #[inline]
    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        Vec2::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }

    /// Caps the length at `max`, keeping direction.
    #[inline]
    pub fn limit(self, max: f32) -> Vec2 {
        let len_sq = self.length_sq();
        if len_sq > max * max {
            self.normalize() * max
        } else {
            self
        }
    }

    /// Heading in radians, `atan2(y, x)`.
    #[inline]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Rotates by `angle` radians around the origin.
    #[inline]
    pub fn rotate(self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    pub fn approx_eq(self, rhs: Vec2, eps: f32) -> bool {
        (self.x - rhs.x).abs() <= eps && (self.y - rhs.y).abs() <= eps
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::add(self, rhs)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        self.subtract(rhs)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec2) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        self.multiply_scalar(rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn div(self, rhs: f32) -> Vec2 {
        self.divide_scalar(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    #[inline]
    fn from((x, y): (f32, f32)) -> Self {
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    // ── normalize ─────────────────────────────────────────────────────────

    #[test]
    fn normalize_has_unit_length() {
        for v in [Vec2::new(3.0, 4.0), Vec2::new(-0.001, 7.5), Vec2::new(1e4, -1e4)] {
            assert!((v.normalize().length() - 1.0).abs() < EPS, "{v:?}");
        }
    }

    #[test]
    fn normalize_zero_is_zero() {
        let n = Vec2::ZERO.normalize();
        assert_eq!(n, Vec2::ZERO);
        assert!(n.is_finite());
    }

    // ── division ──────────────────────────────────────────────────────────

    #[test]
    fn divide_by_zero_yields_zero_vector() {
        assert_eq!(Vec2::new(5.0, -2.0) / 0.0, Vec2::ZERO);
    }

    #[test]
    fn divide_scalar() {
        assert_eq!(Vec2::new(4.0, 8.0) / 2.0, Vec2::new(2.0, 4.0));
    }

    // ── products and lengths ──────────────────────────────────────────────

    #[test]
    fn dot_and_length() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.dot(Vec2::new(1.0, 0.0)), 3.0);
        assert_eq!(v.length_sq(), 25.0);
        assert_eq!(v.length(), 5.0);
    }

    #[test]
    fn lerp_midpoint() {
        let a = Vec2::new(0.0, 10.0);
        let b = Vec2::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 15.0));
    }

    #[test]
    fn limit_caps_long_vectors_only() {
        let long = Vec2::new(30.0, 40.0).limit(5.0);
        assert!(long.approx_eq(Vec2::new(3.0, 4.0), EPS));

        let short = Vec2::new(1.0, 1.0);
        assert_eq!(short.limit(5.0), short);
    }

    // ── angles ────────────────────────────────────────────────────────────

    #[test]
    fn angle_round_trips_through_from_angle() {
        let a = 1.2_f32;
        assert!((Vec2::from_angle(a).angle() - a).abs() < EPS);
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = Vec2::new(1.0, 0.0).rotate(core::f32::consts::FRAC_PI_2);
        assert!(r.approx_eq(Vec2::new(0.0, 1.0), EPS));
    }
}
