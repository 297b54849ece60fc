//! Streaming configuration loaded from TOML.
//!
//! ```toml
//! streaming_enabled = true
//!
//! [amr]
//! request_size = 1
//!
//! [particles]
//! request_size = 50
//! distribution = "ownership_hints"
//!
//! [particles.selection]
//! use_detail = true
//! ```
//!
//! Omitted keys fall back to the defaults of the representation they belong
//! to, so a partial `[particles]` table keeps the particle defaults.

use std::path::Path;

use serde::Deserialize;

use crate::bounds::BlockBounds;
use crate::constants::{AMR_REQUEST_SIZE, PARTICLE_REQUEST_SIZE};
use crate::error::{StreamError, StreamResult};
use crate::queue::{DistributionMode, SelectionConfig};

/// Settings for one streaming representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepresentationConfig {
	/// Blocks requested per streaming round.
	pub request_size: usize,
	/// Remove purged blocks from the render tree before merging a piece.
	pub purge_on_merge: bool,
	/// Only consider blocks with a corner inside this region.
	pub clamp_bounds: Option<[f64; 6]>,
	/// Check that all ranks agree on the streaming round number.
	pub verify_rounds: bool,
	pub distribution: DistributionMode,
	pub selection: SelectionConfig,
}

impl RepresentationConfig {
	/// AMR outline streaming: one block per round, no purge on merge.
	pub const AMR: Self = Self {
		request_size: AMR_REQUEST_SIZE,
		purge_on_merge: false,
		clamp_bounds: None,
		verify_rounds: false,
		distribution: DistributionMode::RoundRobin,
		selection: SelectionConfig::DEFAULT,
	};

	/// Particle streaming: batched requests, purge superseded levels.
	pub const PARTICLES: Self = Self {
		request_size: PARTICLE_REQUEST_SIZE,
		purge_on_merge: true,
		..Self::AMR
	};

	/// Clamp region, invalid when none is configured.
	pub fn clamp(&self) -> BlockBounds {
		self.clamp_bounds
			.map(BlockBounds::from_array)
			.unwrap_or(BlockBounds::INVALID)
	}

	pub fn validate(&self, name: &str) -> StreamResult<()> {
		if self.request_size == 0 {
			return Err(StreamError::InvalidConfig(format!(
				"{name}.request_size must be at least 1"
			)));
		}
		let threshold = self.selection.coverage_threshold;
		if !(threshold > 0.0 && threshold <= 1.0) {
			return Err(StreamError::InvalidConfig(format!(
				"{name}.selection.coverage_threshold must be in (0, 1], got {threshold}"
			)));
		}
		if !(self.selection.detail_level_to_load > 0.0) {
			return Err(StreamError::InvalidConfig(format!(
				"{name}.selection.detail_level_to_load must be positive, got {}",
				self.selection.detail_level_to_load
			)));
		}
		if let Some(b) = self.clamp_bounds {
			if !BlockBounds::from_array(b).is_valid() {
				return Err(StreamError::InvalidConfig(format!(
					"{name}.clamp_bounds must be ordered [xmin, xmax, ymin, ymax, zmin, zmax], got {b:?}"
				)));
			}
		}
		Ok(())
	}
}

/// Partial table as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RepresentationTable {
	request_size: Option<usize>,
	purge_on_merge: Option<bool>,
	clamp_bounds: Option<[f64; 6]>,
	verify_rounds: Option<bool>,
	distribution: Option<DistributionMode>,
	selection: Option<SelectionConfig>,
}

impl RepresentationTable {
	fn over(self, base: RepresentationConfig) -> RepresentationConfig {
		RepresentationConfig {
			request_size: self.request_size.unwrap_or(base.request_size),
			purge_on_merge: self.purge_on_merge.unwrap_or(base.purge_on_merge),
			clamp_bounds: self.clamp_bounds.or(base.clamp_bounds),
			verify_rounds: self.verify_rounds.unwrap_or(base.verify_rounds),
			distribution: self.distribution.unwrap_or(base.distribution),
			selection: self.selection.unwrap_or(base.selection),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StreamingTable {
	streaming_enabled: Option<bool>,
	#[serde(default)]
	amr: RepresentationTable,
	#[serde(default)]
	particles: RepresentationTable,
}

/// Root configuration.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "StreamingTable")]
pub struct StreamingConfig {
	/// Global streaming switch seeded into the streaming context.
	pub streaming_enabled: bool,
	pub amr: RepresentationConfig,
	pub particles: RepresentationConfig,
}

impl From<StreamingTable> for StreamingConfig {
	fn from(table: StreamingTable) -> Self {
		Self {
			streaming_enabled: table.streaming_enabled.unwrap_or(true),
			amr: table.amr.over(RepresentationConfig::AMR),
			particles: table.particles.over(RepresentationConfig::PARTICLES),
		}
	}
}

impl Default for StreamingConfig {
	fn default() -> Self {
		StreamingTable::default().into()
	}
}

impl StreamingConfig {
	/// Load and validate configuration from a TOML file.
	pub fn load(path: &Path) -> StreamResult<Self> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Parse and validate configuration from TOML text.
	pub fn from_toml_str(content: &str) -> StreamResult<Self> {
		let config: StreamingConfig = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> StreamResult<()> {
		self.amr.validate("amr")?;
		self.particles.validate("particles")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_file_gives_defaults() {
		let config = StreamingConfig::from_toml_str("").unwrap();
		assert_eq!(config, StreamingConfig::default());
		assert!(config.streaming_enabled);
		assert_eq!(config.amr, RepresentationConfig::AMR);
		assert_eq!(config.particles.request_size, 50);
		assert!(config.particles.purge_on_merge);
	}

	#[test]
	fn test_partial_table_keeps_representation_defaults() {
		let config = StreamingConfig::from_toml_str(
			r#"
			streaming_enabled = false

			[particles]
			distribution = "ownership_hints"
			verify_rounds = true

			[particles.selection]
			use_detail = true
			detail_level_to_load = 0.5
			"#,
		)
		.unwrap();
		assert!(!config.streaming_enabled);
		assert_eq!(config.particles.request_size, 50);
		assert!(config.particles.purge_on_merge);
		assert!(config.particles.verify_rounds);
		assert_eq!(config.particles.distribution, DistributionMode::OwnershipHints);
		assert!(config.particles.selection.use_detail);
		assert_eq!(config.particles.selection.detail_level_to_load, 0.5);
		assert_eq!(config.particles.selection.coverage_threshold, 0.75);
		assert_eq!(config.amr, RepresentationConfig::AMR);
	}

	#[test]
	fn test_clamp_bounds() {
		let config = StreamingConfig::from_toml_str(
			"[amr]\nclamp_bounds = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0]\n",
		)
		.unwrap();
		assert!(config.amr.clamp().is_valid());
		assert!(!config.particles.clamp().is_valid());
	}

	#[test]
	fn test_validation_errors() {
		let cases = [
			"[amr]\nrequest_size = 0\n",
			"[particles.selection]\ncoverage_threshold = 1.5\n",
			"[amr.selection]\ndetail_level_to_load = 0.0\n",
			"[amr]\nclamp_bounds = [1.0, 0.0, 0.0, 1.0, 0.0, 1.0]\n",
		];
		for case in cases {
			match StreamingConfig::from_toml_str(case) {
				Err(StreamError::InvalidConfig(_)) => {}
				other => panic!("expected InvalidConfig for {case:?}, got {other:?}"),
			}
		}
	}

	#[test]
	fn test_parse_error() {
		assert!(matches!(
			StreamingConfig::from_toml_str("[amr]\nrequest_size = \"many\"\n"),
			Err(StreamError::Toml(_))
		));
		assert!(matches!(
			StreamingConfig::from_toml_str("bogus = 1\n"),
			Err(StreamError::Toml(_))
		));
	}

	#[test]
	fn test_missing_file() {
		assert!(matches!(
			StreamingConfig::load(Path::new("/definitely/not/here.toml")),
			Err(StreamError::Io(_))
		));
	}
}
