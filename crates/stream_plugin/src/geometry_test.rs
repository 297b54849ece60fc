use super::*;
use crate::test_utils::aabb;

fn unit() -> BlockBounds {
  aabb([0.0; 3], [1.0; 3])
}

/// Two quads sharing the edge (1, 2).
fn two_quads() -> PolyGeometry {
  PolyGeometry {
    points: vec![
      DVec3::new(0.0, 0.0, 0.0),
      DVec3::new(1.0, 0.0, 0.0),
      DVec3::new(1.0, 1.0, 0.0),
      DVec3::new(0.0, 1.0, 0.0),
      DVec3::new(2.0, 0.0, 0.0),
      DVec3::new(2.0, 1.0, 0.0),
    ],
    polys: vec![
      PolyCell::from_slice(&[0, 1, 2, 3]),
      PolyCell::from_slice(&[1, 4, 5, 2]),
    ],
    ..Default::default()
  }
}

#[test]
fn test_box_outline_has_twelve_edges() {
  let outline = PolyGeometry::box_outline(&unit());
  assert_eq!(outline.points.len(), 8);
  assert_eq!(outline.lines.len(), 12);
  for [a, b] in &outline.lines {
    let d = outline.points[*a as usize] - outline.points[*b as usize];
    assert!((d.length() - 1.0).abs() < 1e-12);
  }
  assert!(PolyGeometry::box_outline(&BlockBounds::INVALID).is_empty());
}

#[test]
fn test_box_surface_wireframe_matches_outline_edges() {
  let wire = PolyGeometry::box_surface(&unit()).to_wireframe();
  assert!(wire.polys.is_empty());
  assert_eq!(wire.lines.len(), 12);
}

#[test]
fn test_append_reindexes_cells() {
  let mut a = PolyGeometry::box_outline(&unit());
  let b = PolyGeometry::box_surface(&aabb([2.0; 3], [3.0; 3]));
  a.append(&b);
  assert_eq!(a.points.len(), 16);
  assert_eq!(a.lines.len(), 12);
  assert_eq!(a.polys.len(), 6);
  assert!(a.polys.iter().flatten().all(|&i| (8..16).contains(&i)));
  assert_eq!(a.bounds(), aabb([0.0; 3], [3.0; 3]));
}

#[test]
fn test_feature_edges_drop_shared_edges() {
  let edges = two_quads().feature_edges();
  assert_eq!(edges.lines.len(), 6);
  assert!(!edges.lines.contains(&[1, 2]));
  assert_eq!(two_quads().to_wireframe().lines.len(), 7);
}

#[test]
fn test_outline_preset_ignores_payload_kind() {
  let producer = GeometryRepresentation::new(GeometryOptions::OUTLINE);
  let points = Dataset::Points(vec![DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0)]);
  let out = producer.produce(&points);
  assert_eq!(out.lines.len(), 12);
  assert_eq!(out.bounds(), aabb([0.0; 3], [1.0, 2.0, 3.0]));
}

#[test]
fn test_presets_on_image_patch() {
  let image = Dataset::Image(ImagePatch::covering(&unit(), [3, 3, 3]));

  let surface = GeometryRepresentation::new(GeometryOptions::SURFACE).produce(&image);
  assert_eq!(surface.polys.len(), 6);

  let points = GeometryRepresentation::new(GeometryOptions::POINTS).produce(&image);
  assert_eq!(points.verts.len(), 27);

  let edges = GeometryRepresentation::new(GeometryOptions::FEATURE_EDGES).produce(&image);
  assert_eq!(edges.lines.len(), 12);
  assert!(edges.polys.is_empty());
}

#[test]
fn test_surface_preset_passes_poly_through() {
  let poly = two_quads();
  let out = GeometryRepresentation::default().produce(&Dataset::Poly(poly.clone()));
  assert_eq!(out, poly);
}
