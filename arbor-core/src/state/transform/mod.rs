use ultraviolet::{Rotor3, Vec3};

/// A transform consisting of a uniform scale, then rotation, then translation.
///
/// This transform maintains the "Similarity" of shapes and their image, maintaining
/// all angles and the ratios between all lengths. Composing and inverting similarities
/// yields similarities again, so a node's transform can always be re-expressed relative to a new parent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Rotor3,
    /// Uniform scale. Zero makes the transform non-invertible.
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zero(),
            rotation: Rotor3::identity(),
            scale: 1.0,
        }
    }
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }
    /// Apply `self` after `inner`. For a parent's world transform and a child's local
    /// transform, this gives the child's world transform.
    #[must_use]
    pub fn compose(&self, inner: &Self) -> Self {
        let mut translation = inner.translation * self.scale;
        self.rotation.rotate_vec(&mut translation);
        Self {
            translation: self.translation + translation,
            rotation: self.rotation * inner.rotation,
            scale: self.scale * inner.scale,
        }
    }
    #[must_use]
    pub fn inverse(&self) -> Self {
        let scale = self.scale.recip();
        let rotation = self.rotation.reversed();
        let mut translation = -self.translation * scale;
        rotation.rotate_vec(&mut translation);
        Self {
            translation,
            rotation,
            scale,
        }
    }
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let mut point = point * self.scale;
        self.rotation.rotate_vec(&mut point);
        point + self.translation
    }
    /// Whether every component is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        let Self {
            translation,
            rotation,
            scale,
        } = *self;
        [
            translation.x,
            translation.y,
            translation.z,
            rotation.s,
            rotation.bv.xy,
            rotation.bv.xz,
            rotation.bv.yz,
            scale,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
    /// Whether [`Self::inverse`] yields a finite transform. False for a collapsed (zero) scale.
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        self.is_finite() && self.scale.recip().is_finite()
    }
    /// Compare with a tolerance, treating a rotor and its negation as the same rotation.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        let (a, b) = (self.rotation, other.rotation);
        let dot = a.s * b.s + a.bv.xy * b.bv.xy + a.bv.xz * b.bv.xz + a.bv.yz * b.bv.yz;

        (self.translation - other.translation).mag() <= epsilon
            && (self.scale - other.scale).abs() <= epsilon
            && (1.0 - dot.abs()) <= epsilon
    }
}

/// What happens to a spatial node's local transform when it is reparented.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReparentPolicy {
    /// Re-derive the local transform so the node stays put in world space.
    #[default]
    PreserveWorld,
    /// Keep the local transform, letting the node move with its new parent's frame.
    KeepLocal,
}
