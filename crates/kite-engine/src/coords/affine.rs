use core::ops::Mul;

use super::Vec2;

/// 2D affine transform.
///
/// Stores the six scalars of
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
///
/// Points are column vectors, so `A * B` applies `B` first. [`append`](Self::append)
/// post-multiplies (`self = self * other`, i.e. `other` acts in `self`'s local frame);
/// [`prepend`](Self::prepend) pre-multiplies (`self = other * self`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub const fn from_translation(t: Vec2) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, t.x, t.y)
    }

    #[inline]
    pub const fn from_scale(s: Vec2) -> Self {
        Self::new(s.x, 0.0, 0.0, s.y, 0.0, 0.0)
    }

    #[inline]
    pub fn from_rotation(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// `translate(position) * rotate(rotation) * scale(scale)`.
    pub fn from_trs(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        let mut m = Self::IDENTITY;
        m.translate(position.x, position.y)
            .rotate(rotation)
            .scale(scale.x, scale.y);
        m
    }

    /// Resets to identity.
    #[inline]
    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::IDENTITY;
        self
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// `self = self * other`.
    pub fn append(&mut self, other: &Affine2) -> &mut Self {
        let Affine2 { a, b, c, d, tx, ty } = *self;
        self.a = a * other.a + c * other.b;
        self.b = b * other.a + d * other.b;
        self.c = a * other.c + c * other.d;
        self.d = b * other.c + d * other.d;
        self.tx = a * other.tx + c * other.ty + tx;
        self.ty = b * other.tx + d * other.ty + ty;
        self
    }

    /// `self = other * self`.
    pub fn prepend(&mut self, other: &Affine2) -> &mut Self {
        let mut m = *other;
        m.append(self);
        *self = m;
        self
    }

    /// Post-multiplies a translation.
    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        self.tx += self.a * x + self.c * y;
        self.ty += self.b * x + self.d * y;
        self
    }

    /// Post-multiplies a (possibly non-uniform) scale.
    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.a *= sx;
        self.b *= sx;
        self.c *= sy;
        self.d *= sy;
        self
    }

    /// Post-multiplies a rotation by `angle` radians.
    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        let (sin, cos) = angle.sin_cos();
        let Affine2 { a, b, c, d, .. } = *self;
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
        self
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverts in place. A singular (or non-finite) matrix resets to identity.
    pub fn invert(&mut self) -> &mut Self {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return self.set_identity();
        }

        let Affine2 { a, b, c, d, tx, ty } = *self;
        let inv = 1.0 / det;
        self.a = d * inv;
        self.b = -b * inv;
        self.c = -c * inv;
        self.d = a * inv;
        self.tx = (c * ty - d * tx) * inv;
        self.ty = (b * tx - a * ty) * inv;
        self
    }

    /// Non-mutating [`invert`](Self::invert).
    #[inline]
    pub fn inverse(&self) -> Affine2 {
        let mut m = *self;
        m.invert();
        m
    }

    /// Applies the full affine map, translation included.
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Same mapping as [`transform_point`](Self::transform_point).
    #[inline]
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        self.transform_point(v)
    }

    /// Linear part only (no translation); for directions and extents.
    #[inline]
    pub fn transform_direction(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }

    #[inline]
    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.tx, self.ty)
    }

    /// Column norms. Only exact when the matrix carries no shear.
    #[inline]
    pub fn scale_factors(&self) -> Vec2 {
        Vec2::new(self.a.hypot(self.b), self.c.hypot(self.d))
    }

    /// Rotation of the first column, `atan2(b, a)`.
    #[inline]
    pub fn rotation_angle(&self) -> f32 {
        self.b.atan2(self.a)
    }

    pub fn approx_eq(&self, other: &Affine2, eps: f32) -> bool {
        (self.a - other.a).abs() <= eps
            && (self.b - other.b).abs() <= eps
            && (self.c - other.c).abs() <= eps
            && (self.d - other.d).abs() <= eps
            && (self.tx - other.tx).abs() <= eps
            && (self.ty - other.ty).abs() <= eps
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.c.is_finite()
            && self.d.is_finite()
            && self.tx.is_finite()
            && self.ty.is_finite()
    }
}

impl Mul for Affine2 {
    type Output = Affine2;
    #[inline]
    fn mul(self, rhs: Affine2) -> Affine2 {
        let mut m = self;
        m.append(&rhs);
        m
    }
}

impl Mul<Vec2> for Affine2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: Vec2) -> Vec2 {
        self.transform_point(rhs)
    }
}

#[cfg(test)]
mod tests {
    use core::f32::consts::{FRAC_PI_2, PI};

    use super::*;

    const EPS: f32 = 1e-4;

    fn sample() -> Affine2 {
        Affine2::from_trs(Vec2::new(12.0, -3.0), 0.7, Vec2::new(2.0, 0.5))
    }

    // ── composition ───────────────────────────────────────────────────────

    #[test]
    fn identity_is_neutral() {
        let m = sample();
        assert!((m * Affine2::IDENTITY).approx_eq(&m, EPS));
        assert!((Affine2::IDENTITY * m).approx_eq(&m, EPS));
    }

    #[test]
    fn append_applies_other_first() {
        // Scale in local space, then translate: point (1,0) -> (2,0) -> (12,0).
        let mut m = Affine2::from_translation(Vec2::new(10.0, 0.0));
        m.append(&Affine2::from_scale(Vec2::new(2.0, 2.0)));
        assert!(m.transform_point(Vec2::new(1.0, 0.0)).approx_eq(Vec2::new(12.0, 0.0), EPS));
    }

    #[test]
    fn prepend_applies_other_last() {
        // Translate, then scale: point (1,0) -> (11,0) -> (22,0).
        let mut m = Affine2::from_translation(Vec2::new(10.0, 0.0));
        m.prepend(&Affine2::from_scale(Vec2::new(2.0, 2.0)));
        assert!(m.transform_point(Vec2::new(1.0, 0.0)).approx_eq(Vec2::new(22.0, 0.0), EPS));
    }

    #[test]
    fn append_and_prepend_mirror_each_other() {
        let a = sample();
        let b = Affine2::from_trs(Vec2::new(-4.0, 9.0), -1.3, Vec2::new(0.75, 3.0));

        let mut ab = a;
        ab.append(&b);
        let mut ab2 = b;
        ab2.prepend(&a);
        assert!(ab.approx_eq(&ab2, EPS));
    }

    #[test]
    fn composition_is_associative() {
        let a = sample();
        let b = Affine2::from_rotation(0.3);
        let c = Affine2::from_translation(Vec2::new(5.0, 6.0));
        assert!(((a * b) * c).approx_eq(&(a * (b * c)), EPS));
    }

    #[test]
    fn trs_matches_manual_composition() {
        let m = sample();
        let manual = Affine2::from_translation(Vec2::new(12.0, -3.0))
            * Affine2::from_rotation(0.7)
            * Affine2::from_scale(Vec2::new(2.0, 0.5));
        assert!(m.approx_eq(&manual, EPS));
    }

    #[test]
    fn rotate_quarter_turn_maps_x_to_y() {
        let mut m = Affine2::IDENTITY;
        m.rotate(FRAC_PI_2);
        assert!(m.transform_point(Vec2::new(1.0, 0.0)).approx_eq(Vec2::new(0.0, 1.0), EPS));
    }

    // ── inversion ─────────────────────────────────────────────────────────

    #[test]
    fn double_inverse_is_original() {
        let m = sample();
        assert!(m.inverse().inverse().approx_eq(&m, EPS));
    }

    #[test]
    fn inverse_undoes_transform() {
        let m = sample();
        let p = Vec2::new(3.5, -8.0);
        let back = m.inverse().transform_point(m.transform_point(p));
        assert!(back.approx_eq(p, EPS));
    }

    #[test]
    fn singular_inverse_resets_to_identity() {
        let mut m = Affine2::from_scale(Vec2::new(0.0, 4.0));
        m.tx = 7.0;
        m.invert();
        assert!(m.is_identity());
        assert!(m.is_finite());
    }

    // ── decomposition ─────────────────────────────────────────────────────

    #[test]
    fn decompose_trs() {
        let m = Affine2::from_trs(Vec2::new(1.0, 2.0), PI / 6.0, Vec2::new(3.0, 4.0));
        assert!(m.translation().approx_eq(Vec2::new(1.0, 2.0), EPS));
        assert!(m.scale_factors().approx_eq(Vec2::new(3.0, 4.0), EPS));
        assert!((m.rotation_angle() - PI / 6.0).abs() < EPS);
    }

    #[test]
    fn transform_direction_ignores_translation() {
        let m = Affine2::from_translation(Vec2::new(100.0, 100.0));
        assert_eq!(m.transform_direction(Vec2::new(1.0, 2.0)), Vec2::new(1.0, 2.0));
        assert_eq!(m.transform_vector(Vec2::new(1.0, 2.0)), Vec2::new(101.0, 102.0));
    }
}
