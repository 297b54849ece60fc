//! Renderable polygonal geometry and the dataset-to-geometry adapter.
//!
//! One configurable [`GeometryRepresentation`] covers outline, feature-edge,
//! surface and point rendering; presets pick the options.

use std::collections::BTreeMap;

use glam::DVec3;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::bounds::BlockBounds;
use crate::dataset::{Dataset, ImagePatch};

/// Polygon cell, quads stay inline.
pub type PolyCell = SmallVec<[u32; 4]>;

/// Indexed polygonal data: points plus vertex, line and polygon cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyGeometry {
  pub points: Vec<DVec3>,
  /// Point indices rendered as vertices.
  pub verts: Vec<u32>,
  /// Point index pairs rendered as line segments.
  pub lines: Vec<[u32; 2]>,
  /// Point index loops rendered as polygons.
  pub polys: Vec<PolyCell>,
}

// Corner `i` of a box selects max on axis `k` when bit `k` of `i` is set.
const BOX_FACES: [[u32; 4]; 6] = [
  [0, 2, 6, 4], // -X
  [1, 5, 7, 3], // +X
  [0, 4, 5, 1], // -Y
  [2, 3, 7, 6], // +Y
  [0, 1, 3, 2], // -Z
  [4, 6, 7, 5], // +Z
];

impl PolyGeometry {
  pub fn new() -> Self {
    Self::default()
  }

  /// 8 corners and 12 edges of a box. Empty for invalid bounds.
  pub fn box_outline(bounds: &BlockBounds) -> Self {
    if !bounds.is_valid() {
      return Self::default();
    }
    let mut lines = Vec::with_capacity(12);
    for i in 0..8u32 {
      for bit in [1, 2, 4] {
        if i & bit == 0 {
          lines.push([i, i | bit]);
        }
      }
    }
    Self {
      points: bounds.corners().to_vec(),
      lines,
      ..Default::default()
    }
  }

  /// 8 corners and 6 quads of a box. Empty for invalid bounds.
  pub fn box_surface(bounds: &BlockBounds) -> Self {
    if !bounds.is_valid() {
      return Self::default();
    }
    Self {
      points: bounds.corners().to_vec(),
      polys: BOX_FACES.iter().map(|f| PolyCell::from_slice(f)).collect(),
      ..Default::default()
    }
  }

  /// Every point as a vertex cell.
  pub fn point_cloud(points: Vec<DVec3>) -> Self {
    let verts = (0..points.len() as u32).collect();
    Self {
      points,
      verts,
      ..Default::default()
    }
  }

  /// Geometric append: `other`'s cells are re-indexed past our points.
  pub fn append(&mut self, other: &PolyGeometry) {
    let offset = self.points.len() as u32;
    self.points.extend_from_slice(&other.points);
    self.verts.extend(other.verts.iter().map(|v| v + offset));
    self
      .lines
      .extend(other.lines.iter().map(|[a, b]| [a + offset, b + offset]));
    self
      .polys
      .extend(other.polys.iter().map(|p| p.iter().map(|v| v + offset).collect()));
  }

  pub fn bounds(&self) -> BlockBounds {
    BlockBounds::from_points(&self.points)
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn cell_count(&self) -> usize {
    self.verts.len() + self.lines.len() + self.polys.len()
  }

  /// Unique polygon edges whose use count passes `keep`, in index order.
  fn polygon_edges(&self, keep: impl Fn(usize) -> bool) -> Vec<[u32; 2]> {
    let mut uses: BTreeMap<[u32; 2], usize> = BTreeMap::new();
    for poly in &self.polys {
      for (i, &a) in poly.iter().enumerate() {
        let b = poly[(i + 1) % poly.len()];
        let key = if a < b { [a, b] } else { [b, a] };
        *uses.entry(key).or_default() += 1;
      }
    }
    uses
      .into_iter()
      .filter(|(_, count)| keep(*count))
      .map(|(edge, _)| edge)
      .collect()
  }

  /// Same points, polygons replaced by their unique edges.
  pub fn to_wireframe(&self) -> Self {
    let mut lines = self.lines.clone();
    lines.extend(self.polygon_edges(|_| true));
    Self {
      points: self.points.clone(),
      verts: self.verts.clone(),
      lines,
      polys: Vec::new(),
    }
  }

  /// Same points, only existing lines plus polygon boundary edges.
  pub fn feature_edges(&self) -> Self {
    let mut lines = self.lines.clone();
    lines.extend(self.polygon_edges(|count| count == 1));
    Self {
      points: self.points.clone(),
      lines,
      ..Default::default()
    }
  }
}

/// How surfaces are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationStyle {
  Points,
  Wireframe,
  #[default]
  Surface,
}

/// Options of the geometry adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeometryOptions {
  /// Produce only the bounding-box outline of each block.
  pub use_outline: bool,
  /// Produce feature edges instead of the styled surface.
  pub generate_feature_edges: bool,
  pub style: RepresentationStyle,
}

impl GeometryOptions {
  pub const OUTLINE: Self = Self {
    use_outline: true,
    generate_feature_edges: false,
    style: RepresentationStyle::Wireframe,
  };

  pub const FEATURE_EDGES: Self = Self {
    use_outline: false,
    generate_feature_edges: true,
    style: RepresentationStyle::Wireframe,
  };

  pub const SURFACE: Self = Self {
    use_outline: false,
    generate_feature_edges: false,
    style: RepresentationStyle::Surface,
  };

  pub const POINTS: Self = Self {
    use_outline: false,
    generate_feature_edges: false,
    style: RepresentationStyle::Points,
  };
}

impl Default for GeometryOptions {
  fn default() -> Self {
    Self::SURFACE
  }
}

/// Converts one dataset into renderable geometry.
pub trait GeometryProducer {
  fn produce(&self, dataset: &Dataset) -> PolyGeometry;
}

/// Configurable geometry adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometryRepresentation {
  pub options: GeometryOptions,
}

impl GeometryRepresentation {
  pub fn new(options: GeometryOptions) -> Self {
    Self { options }
  }

  fn image_surface(&self, image: &ImagePatch) -> PolyGeometry {
    let bounds = image.bounds();
    if self.options.generate_feature_edges {
      return PolyGeometry::box_outline(&bounds);
    }
    match self.options.style {
      RepresentationStyle::Points => PolyGeometry::point_cloud(image.points()),
      RepresentationStyle::Wireframe => PolyGeometry::box_surface(&bounds).to_wireframe(),
      RepresentationStyle::Surface => PolyGeometry::box_surface(&bounds),
    }
  }

  fn poly_surface(&self, poly: &PolyGeometry) -> PolyGeometry {
    if self.options.generate_feature_edges {
      return poly.feature_edges();
    }
    match self.options.style {
      RepresentationStyle::Points => PolyGeometry::point_cloud(poly.points.clone()),
      RepresentationStyle::Wireframe => poly.to_wireframe(),
      RepresentationStyle::Surface => poly.clone(),
    }
  }
}

impl GeometryProducer for GeometryRepresentation {
  fn produce(&self, dataset: &Dataset) -> PolyGeometry {
    if self.options.use_outline {
      return PolyGeometry::box_outline(&dataset.bounds());
    }
    match dataset {
      Dataset::Image(image) => self.image_surface(image),
      Dataset::Points(points) => PolyGeometry::point_cloud(points.clone()),
      Dataset::Poly(poly) => self.poly_surface(poly),
    }
  }
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;
