//! Error types for the streaming subsystem.

use thiserror::Error;

/// Result alias used across the crate.
pub type StreamResult<T> = Result<T, StreamError>;

/// Failures surfaced by queues, representations, collectives and config.
#[derive(Debug, Error)]
pub enum StreamError {
  /// `streaming_update` was entered while a streaming pass was running.
  #[error("streaming_update called while a streaming pass is already in progress")]
  ReentrantStreamingUpdate,

  /// `pop` was called with nothing left to request.
  #[error("pop called on an empty block queue")]
  EmptyQueue,

  /// A block id does not exist in the current metadata.
  #[error("block {0} is not described by the current metadata")]
  UnknownBlock(u32),

  /// The particle policy needs the same block count on every level.
  #[error("level {level} has {found} blocks, expected {expected} on every level")]
  NonUniformLevels {
    level: usize,
    found: usize,
    expected: usize,
  },

  /// The round handshake found a rank out of lockstep with the root.
  #[error("rank {rank} is at streaming round {local} but the root is at round {root}")]
  RoundDesync { rank: usize, local: u64, root: u64 },

  /// A peer disconnected or sent an unexpected payload.
  #[error("collective operation failed: {0}")]
  Collective(String),

  /// The upstream block source could not satisfy a request.
  #[error("upstream source failed: {0}")]
  Source(String),

  /// Configuration values are out of range.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("failed to read config: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse config: {0}")]
  Toml(#[from] toml::de::Error),
}
