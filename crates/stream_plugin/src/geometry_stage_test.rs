use super::*;
use crate::geometry::{GeometryOptions, GeometryRepresentation};
use crate::test_utils::scene_dataset;

#[test]
fn test_single_request() {
  let mut stage = GeometryStage::new();
  let data = scene_dataset();
  stage.enqueue(3, data.get(3).cloned().unwrap());
  assert_eq!(stage.pending_count(), 1);

  let producer = GeometryRepresentation::new(GeometryOptions::OUTLINE);
  let processed = stage.tick(&producer);
  assert_eq!(processed, 1);
  assert_eq!(stage.pending_count(), 0);
  assert_eq!(stage.completed_count(), 1);

  let completions = stage.drain_completions();
  assert_eq!(completions.len(), 1);
  assert_eq!(completions[0].id, 3);
  assert_eq!(completions[0].geometry.lines.len(), 12);
  assert!(stage.is_idle());
}

#[test]
fn test_composite_enqueues_present_blocks() {
  let mut stage = GeometryStage::new();
  stage.enqueue_composite(&scene_dataset().extract(&[0, 4, 7]).unwrap());
  assert_eq!(stage.pending_count(), 3);

  stage.tick(&GeometryRepresentation::new(GeometryOptions::SURFACE));
  let mut completions = stage.drain_completions();
  completions.sort_by_key(|c| c.id);
  assert_eq!(completions.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 4, 7]);
  assert!(completions.iter().all(|c| c.geometry.polys.len() == 6));
}

#[test]
fn test_empty_tick() {
  let mut stage = GeometryStage::new();
  assert_eq!(stage.tick(&GeometryRepresentation::default()), 0);
  assert!(stage.drain_completions().is_empty());
}
