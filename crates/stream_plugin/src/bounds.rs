//! Axis-aligned bounding box with double precision and an invalid state.

use glam::DVec3;

/// Double-precision axis-aligned bounding box.
///
/// A box is *invalid* (uninitialized) when `min > max` on any axis. Invalid
/// boxes describe blocks that must be skipped entirely.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockBounds {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl BlockBounds {
	/// The uninitialized box. Union with any valid box yields that box.
	pub const INVALID: Self = Self {
		min: DVec3::splat(f64::MAX),
		max: DVec3::splat(-f64::MAX),
	};

	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new AABB from center and half-extents.
	pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Build from `[xmin, xmax, ymin, ymax, zmin, zmax]`.
	///
	/// No ordering check: an unordered array yields an invalid box.
	pub fn from_array(b: [f64; 6]) -> Self {
		Self {
			min: DVec3::new(b[0], b[2], b[4]),
			max: DVec3::new(b[1], b[3], b[5]),
		}
	}

	/// Convert to `[xmin, xmax, ymin, ymax, zmin, zmax]`.
	pub fn to_array(&self) -> [f64; 6] {
		[
			self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z,
		]
	}

	/// Smallest box enclosing all points. Invalid when `points` is empty.
	pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec3>) -> Self {
		points.into_iter().fold(Self::INVALID, |mut acc, p| {
			acc.add_point(*p);
			acc
		})
	}

	/// True when the box has been initialized (min <= max on all axes).
	#[inline]
	pub fn is_valid(&self) -> bool {
		self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
	}

	/// Grow to include a point.
	#[inline]
	pub fn add_point(&mut self, p: DVec3) {
		self.min = self.min.min(p);
		self.max = self.max.max(p);
	}

	/// Grow to include another box. Invalid boxes are ignored.
	#[inline]
	pub fn add_bounds(&mut self, other: &BlockBounds) {
		if other.is_valid() {
			self.min = self.min.min(other.min);
			self.max = self.max.max(other.max);
		}
	}

	/// Union of two boxes.
	pub fn union(&self, other: &BlockBounds) -> BlockBounds {
		let mut out = *self;
		out.add_bounds(other);
		out
	}

	/// Check if this AABB overlaps with another.
	///
	/// Two AABBs overlap if they share any interior or boundary points.
	#[inline]
	pub fn overlaps(&self, other: &BlockBounds) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
			&& self.min.z <= other.max.z
			&& self.max.z >= other.min.z
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// True when either the min or the max corner of `other` lies inside.
	///
	/// This is the clamp-region test used by re-prioritization.
	#[inline]
	pub fn contains_either_corner(&self, other: &BlockBounds) -> bool {
		self.contains_point(other.min) || self.contains_point(other.max)
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// Length of the main diagonal.
	#[inline]
	pub fn diagonal_length(&self) -> f64 {
		self.size().length()
	}

	/// The 8 corners, bit i of the index selecting max on axis i.
	pub fn corners(&self) -> [DVec3; 8] {
		std::array::from_fn(|i| {
			DVec3::new(
				if i & 1 == 0 { self.min.x } else { self.max.x },
				if i & 2 == 0 { self.min.y } else { self.max.y },
				if i & 4 == 0 { self.min.z } else { self.max.z },
			)
		})
	}
}

impl Default for BlockBounds {
	fn default() -> Self {
		Self::INVALID
	}
}
