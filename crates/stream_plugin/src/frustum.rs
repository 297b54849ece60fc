//! View-frustum planes as supplied by the camera layer.
//!
//! Six planes in the order left, right, bottom, top, near, far. Each plane is
//! `ax + by + cz + d = 0` with the normal pointing into the frustum, so a
//! positive signed distance means "inside".

use glam::{DMat4, DVec3, DVec4};

use crate::constants::{PLANE_COEFFICIENTS, PLANE_COUNT, VIEW_PLANE_LEN};

/// 24 doubles: 6 planes x `[a, b, c, d]`.
#[derive(Clone, Copy, Debug)]
pub struct ViewPlanes {
  coefficients: [f64; VIEW_PLANE_LEN],
}

impl ViewPlanes {
  /// Wrap a raw 24-double plane set.
  pub fn new(coefficients: [f64; VIEW_PLANE_LEN]) -> Self {
    Self { coefficients }
  }

  /// Build from six `[a, b, c, d]` planes.
  pub fn from_planes(planes: [[f64; PLANE_COEFFICIENTS]; PLANE_COUNT]) -> Self {
    let mut coefficients = [0.0; VIEW_PLANE_LEN];
    for (i, plane) in planes.iter().enumerate() {
      coefficients[i * PLANE_COEFFICIENTS..(i + 1) * PLANE_COEFFICIENTS].copy_from_slice(plane);
    }
    Self { coefficients }
  }

  /// Axis-aligned box frustum for a camera at the origin looking down `-z`.
  ///
  /// `half_width`/`half_height` bound x/y, `near`/`far` are positive depths.
  pub fn orthographic(half_width: f64, half_height: f64, near: f64, far: f64) -> Self {
    Self::from_planes([
      [1.0, 0.0, 0.0, half_width],
      [-1.0, 0.0, 0.0, half_width],
      [0.0, 1.0, 0.0, half_height],
      [0.0, -1.0, 0.0, half_height],
      [0.0, 0.0, -1.0, -near],
      [0.0, 0.0, 1.0, far],
    ])
  }

  /// Extract normalized planes from a view-projection matrix.
  ///
  /// Assumes OpenGL clip conventions (`-w <= z <= w`), which is what
  /// `DMat4::perspective_rh_gl` and `DMat4::orthographic_rh_gl` produce.
  pub fn from_view_projection(view_proj: &DMat4) -> Self {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);

    let raw: [DVec4; PLANE_COUNT] = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2];

    let mut planes = [[0.0; PLANE_COEFFICIENTS]; PLANE_COUNT];
    for (out, p) in planes.iter_mut().zip(raw.iter()) {
      let len = p.truncate().length();
      let n = if len > 0.0 { *p / len } else { *p };
      *out = n.to_array();
    }
    Self::from_planes(planes)
  }

  /// Coefficients of plane `i`.
  #[inline]
  pub fn plane(&self, i: usize) -> [f64; PLANE_COEFFICIENTS] {
    let s = i * PLANE_COEFFICIENTS;
    [
      self.coefficients[s],
      self.coefficients[s + 1],
      self.coefficients[s + 2],
      self.coefficients[s + 3],
    ]
  }

  /// Signed distance from `point` to plane `i`.
  #[inline]
  pub fn signed_distance(&self, i: usize, point: DVec3) -> f64 {
    let [a, b, c, d] = self.plane(i);
    a * point.x + b * point.y + c * point.z + d
  }

  pub fn as_array(&self) -> &[f64; VIEW_PLANE_LEN] {
    &self.coefficients
  }

  /// Bit-for-bit equality (`NaN == NaN`, `0.0 != -0.0`).
  pub fn bit_eq(&self, other: &ViewPlanes) -> bool {
    self
      .coefficients
      .iter()
      .zip(other.coefficients.iter())
      .all(|(a, b)| a.to_bits() == b.to_bits())
  }
}

impl From<[f64; VIEW_PLANE_LEN]> for ViewPlanes {
  fn from(coefficients: [f64; VIEW_PLANE_LEN]) -> Self {
    Self::new(coefficients)
  }
}

#[cfg(test)]
#[path = "frustum_test.rs"]
mod frustum_test;
