//! The in-memory geometry of a single feature.

use std::ops::Range;

use crate::bounds::Bounds;
use crate::error::{Result, ShapefileError};
use crate::r#type::{PartType, ShapeType};

/// The start of a part within a shape's vertex arrays, and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub start: u32,
    pub part_type: PartType,
}

impl Part {
    pub fn new(start: u32, part_type: PartType) -> Self {
        Self { start, part_type }
    }

    /// A plain ring part, the only kind used outside of MultiPatch shapes.
    pub fn ring(start: u32) -> Self {
        Self::new(start, PartType::Ring)
    }
}

/// A single vertex. `z` and `m` are zero for shape types without those dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

/// Mutable access to the coordinate arrays of a [`Shape`].
///
/// The arrays can be edited but not resized. Call [`Shape::compute_extents`] afterwards to bring
/// the shape's bounds back in line with its vertices.
#[derive(Debug)]
pub struct CoordsMut<'a> {
    pub x: &'a mut [f64],
    pub y: &'a mut [f64],
    pub z: &'a mut [f64],
    pub m: &'a mut [f64],
}

/// One feature's geometry: type, optional id, parts and parallel coordinate arrays.
///
/// `z` is empty unless the type has a Z dimension and `m` is empty unless the type has an M
/// dimension. Otherwise both have one value per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub(crate) shape_type: ShapeType,
    pub(crate) shape_id: Option<u32>,
    pub(crate) parts: Vec<Part>,
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
    pub(crate) z: Vec<f64>,
    pub(crate) m: Vec<f64>,
    pub(crate) bounds: Bounds,
}

impl Shape {
    /// Create a shape, validating its part and vertex structure.
    ///
    /// - `parts` is only used for Arc, Polygon and MultiPatch types. If empty, a single ring part
    ///   starting at vertex 0 is assumed. Part types other than MultiPatch are normalized to
    ///   [`PartType::Ring`].
    /// - `z` and `m` default to zeros for types that carry them, and are dropped for types that
    ///   don't.
    pub fn new(
        shape_type: ShapeType,
        shape_id: Option<u32>,
        parts: &[Part],
        x: Vec<f64>,
        y: Vec<f64>,
        z: Option<Vec<f64>>,
        m: Option<Vec<f64>>,
    ) -> Result<Self> {
        if shape_type == ShapeType::Null {
            if !x.is_empty() || !y.is_empty() {
                return Err(ShapefileError::MalformedGeometry(
                    "Null shapes cannot carry vertices.".to_string(),
                ));
            }
            return Ok(Self::null(shape_id));
        }

        let num_vertices = x.len();
        if y.len() != num_vertices {
            return Err(ShapefileError::MalformedGeometry(format!(
                "Got {} y values for {} vertices.",
                y.len(),
                num_vertices
            )));
        }
        if num_vertices == 0 {
            return Err(ShapefileError::MalformedGeometry(format!(
                "{} shapes need at least one vertex.",
                shape_type.name()
            )));
        }
        if shape_type.is_point() && num_vertices != 1 {
            return Err(ShapefileError::MalformedGeometry(format!(
                "{} shapes have exactly one vertex, got {}.",
                shape_type.name(),
                num_vertices
            )));
        }
        if u32::try_from(num_vertices).is_err() {
            return Err(ShapefileError::MalformedGeometry(format!(
                "Too many vertices: {}.",
                num_vertices
            )));
        }

        let z = dimension_values("z", z, shape_type.has_z(), num_vertices)?;
        let m = dimension_values("m", m, shape_type.has_m(), num_vertices)?;
        let parts = if shape_type.has_parts() {
            validate_parts(shape_type, parts, num_vertices)?
        } else {
            vec![]
        };

        let mut shape = Self {
            shape_type,
            shape_id,
            parts,
            x,
            y,
            z,
            m,
            bounds: Bounds::default(),
        };
        shape.compute_extents();
        Ok(shape)
    }

    /// Create a single-part shape, or a point or multipoint, without an id or M values.
    pub fn simple(
        shape_type: ShapeType,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Option<Vec<f64>>,
    ) -> Result<Self> {
        Self::new(shape_type, None, &[Part::ring(0)], x, y, z, None)
    }

    /// A shape without geometry.
    pub fn null(shape_id: Option<u32>) -> Self {
        Self {
            shape_type: ShapeType::Null,
            shape_id,
            parts: vec![],
            x: vec![],
            y: vec![],
            z: vec![],
            m: vec![],
            bounds: Bounds::default(),
        }
    }

    /// Recompute [`Shape::bounds`] from the current vertices.
    ///
    /// A shape without vertices gets zeroed bounds, as do the Z and M axes of types that don't
    /// carry them.
    pub fn compute_extents(&mut self) {
        let mut bounds = Bounds::default();
        if self.x.is_empty() {
            self.bounds = bounds;
            return;
        }

        for (axis, values) in [&self.x, &self.y, &self.z, &self.m].into_iter().enumerate() {
            if let Some((min, max)) = min_max(values) {
                bounds.min[axis] = min;
                bounds.max[axis] = max;
            }
        }
        self.bounds = bounds;
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn is_null(&self) -> bool {
        self.shape_type == ShapeType::Null
    }

    /// The record id of this shape, `None` if unassigned.
    pub fn shape_id(&self) -> Option<u32> {
        self.shape_id
    }

    pub fn set_shape_id(&mut self, shape_id: Option<u32>) {
        self.shape_id = shape_id;
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.x.len()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn m(&self) -> &[f64] {
        &self.m
    }

    /// Edit coordinates in place. Bounds are stale until [`Shape::compute_extents`] is called.
    pub fn coords_mut(&mut self) -> CoordsMut<'_> {
        CoordsMut {
            x: &mut self.x,
            y: &mut self.y,
            z: &mut self.z,
            m: &mut self.m,
        }
    }

    /// The range of vertex indices making up part `i`, or `None` if there is no such part.
    /// Point and MultiPoint shapes have no parts.
    pub fn part_range(&self, i: usize) -> Option<Range<usize>> {
        let start = self.parts.get(i)?.start as usize;
        let end = self
            .parts
            .get(i + 1)
            .map(|part| part.start as usize)
            .unwrap_or(self.num_vertices());
        Some(start..end)
    }

    /// Iterate over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        (0..self.num_vertices()).map(move |i| Vertex {
            x: self.x[i],
            y: self.y[i],
            z: self.z.get(i).copied().unwrap_or(0.),
            m: self.m.get(i).copied().unwrap_or(0.),
        })
    }
}

fn dimension_values(
    name: &str,
    values: Option<Vec<f64>>,
    carried: bool,
    num_vertices: usize,
) -> Result<Vec<f64>> {
    match values {
        Some(values) if values.len() != num_vertices => {
            Err(ShapefileError::MalformedGeometry(format!(
                "Got {} {} values for {} vertices.",
                values.len(),
                name,
                num_vertices
            )))
        }
        Some(values) if carried => Ok(values),
        None if carried => Ok(vec![0.; num_vertices]),
        _ => Ok(vec![]),
    }
}

fn validate_parts(shape_type: ShapeType, parts: &[Part], num_vertices: usize) -> Result<Vec<Part>> {
    if parts.is_empty() {
        return Ok(vec![Part::ring(0)]);
    }
    if parts[0].start != 0 {
        return Err(ShapefileError::MalformedGeometry(format!(
            "First part starts at vertex {} instead of 0.",
            parts[0].start
        )));
    }
    for pair in parts.windows(2) {
        if pair[1].start <= pair[0].start {
            return Err(ShapefileError::MalformedGeometry(format!(
                "Part starts are not increasing: {} then {}.",
                pair[0].start, pair[1].start
            )));
        }
    }
    if let Some(last) = parts.last() {
        if last.start as usize >= num_vertices {
            return Err(ShapefileError::MalformedGeometry(format!(
                "Part starts at vertex {} but shape has {} vertices.",
                last.start, num_vertices
            )));
        }
    }

    let parts = if shape_type == ShapeType::MultiPatch {
        parts.to_vec()
    } else {
        parts.iter().map(|part| Part::ring(part.start)).collect()
    };
    Ok(parts)
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let (first, rest) = values.split_first()?;
    let mut min = *first;
    let mut max = *first;
    for value in rest {
        if *value < min {
            min = *value;
        }
        if *value > max {
            max = *value;
        }
    }
    Some((min, max))
}
