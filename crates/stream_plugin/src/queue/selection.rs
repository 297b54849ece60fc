//! Thresholds deciding whether a re-prioritized block is wanted.

use serde::Deserialize;

use super::item::BlockItem;
use crate::constants::{
	DEFAULT_COVERAGE_THRESHOLD, DEFAULT_DETAIL_LEVEL_TO_LOAD, DEFAULT_EAGER_REFINEMENT, MIN_DIAGONAL,
};

/// Selection thresholds shared by both queue policies.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
	/// Coverage at or above which a block is wanted at any refinement.
	pub coverage_threshold: f64,
	/// Blocks at or below this refinement are always wanted.
	pub eager_refinement: f64,
	/// Normalized feature-size threshold for the detail-aware test.
	pub detail_level_to_load: f64,
	/// Use the detail-aware test for blocks that carry a detail hint.
	pub use_detail: bool,
}

impl SelectionConfig {
	/// Tuned defaults, generic selection only.
	pub const DEFAULT: Self = Self {
		coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
		eager_refinement: DEFAULT_EAGER_REFINEMENT,
		detail_level_to_load: DEFAULT_DETAIL_LEVEL_TO_LOAD,
		use_detail: false,
	};

	/// Tuned defaults with the detail-aware test enabled.
	pub const DETAIL_AWARE: Self = Self {
		use_detail: true,
		..Self::DEFAULT
	};

	/// `refinement <= eager OR coverage >= threshold`.
	#[inline]
	pub fn generic_select(&self, item: &BlockItem) -> bool {
		item.refinement <= self.eager_refinement || item.coverage >= self.coverage_threshold
	}

	/// Compare the block's normalized distance against the detail threshold.
	///
	/// Level 0 blocks always pass.
	#[inline]
	pub fn detail_select(&self, item: &BlockItem) -> bool {
		if item.refinement <= 0.0 {
			return true;
		}
		let diagonal = item.bounds.diagonal_length().max(MIN_DIAGONAL);
		item.distance / diagonal < self.detail_level_to_load / item.refinement && item.coverage > 0.0
	}

	/// Whether the detail-aware test applies to this item.
	#[inline]
	pub fn uses_detail_for(&self, item: &BlockItem) -> bool {
		self.use_detail && item.amount_of_detail > 0.0
	}

	/// Pick the test for the item and apply it.
	pub fn select(&self, item: &BlockItem) -> bool {
		if self.uses_detail_for(item) {
			self.detail_select(item)
		} else {
			self.generic_select(item)
		}
	}
}

impl Default for SelectionConfig {
	fn default() -> Self {
		Self::DEFAULT
	}
}

#[cfg(test)]
mod tests {
	use glam::DVec3;

	use super::*;
	use crate::bounds::BlockBounds;

	fn item(refinement: f64, coverage: f64, distance: f64) -> BlockItem {
		let mut item = BlockItem::new(
			0,
			refinement,
			BlockBounds::new(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0)),
		);
		item.coverage = coverage;
		item.distance = distance;
		item
	}

	#[test]
	fn test_generic_select() {
		let cfg = SelectionConfig::DEFAULT;
		assert!(cfg.generic_select(&item(0.0, 0.0, 10.0)));
		assert!(cfg.generic_select(&item(1.0, 0.0, 10.0)));
		assert!(!cfg.generic_select(&item(2.0, 0.5, 10.0)));
		assert!(cfg.generic_select(&item(2.0, 0.75, 10.0)));
	}

	#[test]
	fn test_detail_select() {
		let cfg = SelectionConfig {
			detail_level_to_load: 1.0,
			..SelectionConfig::DETAIL_AWARE
		};
		// Unit diagonal: distance / 1 < 1 / refinement
		assert!(cfg.detail_select(&item(0.0, 0.0, 1e9)));
		assert!(cfg.detail_select(&item(2.0, 0.1, 0.4)));
		assert!(!cfg.detail_select(&item(2.0, 0.1, 0.6)));
		assert!(!cfg.detail_select(&item(2.0, 0.0, 0.1)));
	}

	#[test]
	fn test_select_uses_detail_only_with_hint() {
		let cfg = SelectionConfig::DETAIL_AWARE;
		let mut far = item(1.0, 0.1, 1000.0);
		// No hint: generic test, refinement 1 is eager
		assert!(cfg.select(&far));
		far.amount_of_detail = 500.0;
		assert!(!cfg.select(&far));
	}
}
