//! Encoding and decoding of individual geometry records.
//!
//! A record is an 8 byte big-endian header (1-based record number, content length in 16-bit
//! words) followed by little-endian content starting with the shape type code.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{Result, ShapefileError};
use crate::r#type::{PartType, ShapeType};
use crate::shape::{Part, Shape};
use crate::store::constants::RECORD_HEADER_SIZE;
use crate::store::header::to_words;

/// Encode `shape` as a complete record, header included.
///
/// When `multipatch_measure` is false, MultiPatch records are written without their optional M
/// block.
pub(crate) fn encode_record(
    shape: &Shape,
    record_number: u32,
    multipatch_measure: bool,
) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::with_capacity(RECORD_HEADER_SIZE + content_capacity(shape));
    // Placeholder header, patched once the content length is known
    buf.extend_from_slice(&[0; RECORD_HEADER_SIZE]);
    buf.write_i32::<LittleEndian>(shape.shape_type.code())?;

    let shape_type = shape.shape_type;
    if shape_type.is_point() {
        buf.write_f64::<LittleEndian>(shape.x[0])?;
        buf.write_f64::<LittleEndian>(shape.y[0])?;
        if shape_type.has_z() {
            buf.write_f64::<LittleEndian>(shape.z[0])?;
        }
        if shape_type.has_m() {
            buf.write_f64::<LittleEndian>(shape.m[0])?;
        }
    } else if shape_type != ShapeType::Null {
        let bounds = shape.bounds;
        buf.write_f64::<LittleEndian>(bounds.min[0])?;
        buf.write_f64::<LittleEndian>(bounds.min[1])?;
        buf.write_f64::<LittleEndian>(bounds.max[0])?;
        buf.write_f64::<LittleEndian>(bounds.max[1])?;

        if shape_type.has_parts() {
            buf.write_i32::<LittleEndian>(shape.parts.len() as i32)?;
        }
        buf.write_i32::<LittleEndian>(shape.x.len() as i32)?;

        if shape_type.has_parts() {
            for part in &shape.parts {
                buf.write_i32::<LittleEndian>(part.start as i32)?;
            }
        }
        if shape_type == ShapeType::MultiPatch {
            for part in &shape.parts {
                buf.write_i32::<LittleEndian>(part.part_type.code())?;
            }
        }

        for (x, y) in shape.x.iter().zip(&shape.y) {
            buf.write_f64::<LittleEndian>(*x)?;
            buf.write_f64::<LittleEndian>(*y)?;
        }

        if shape_type.has_z() {
            write_range(&mut buf, bounds.min[2], bounds.max[2], &shape.z)?;
        }
        let write_m = shape_type.has_m()
            && (shape_type != ShapeType::MultiPatch || multipatch_measure);
        if write_m {
            write_range(&mut buf, bounds.min[3], bounds.max[3], &shape.m)?;
        }
    }

    let content_length = (buf.len() - RECORD_HEADER_SIZE) as u64;
    BigEndian::write_i32(&mut buf[0..4], record_number as i32);
    BigEndian::write_i32(&mut buf[4..8], to_words(content_length)?);
    Ok(buf)
}

fn write_range(buf: &mut Vec<u8>, min: f64, max: f64, values: &[f64]) -> Result<()> {
    buf.write_f64::<LittleEndian>(min)?;
    buf.write_f64::<LittleEndian>(max)?;
    for value in values {
        buf.write_f64::<LittleEndian>(*value)?;
    }
    Ok(())
}

fn content_capacity(shape: &Shape) -> usize {
    4 + 32 + 8 + shape.parts.len() * 8 + shape.x.len() * 32 + 32
}

/// Decode record content (the bytes following the record header) into a shape.
///
/// Never reads outside of `content`. Any count that would require more bytes than are present is
/// an encoding error.
pub(crate) fn decode_record(content: &[u8], shape_id: u32) -> Result<Shape> {
    let mut reader = RecordReader::new(content);
    let shape_type = ShapeType::from_code(reader.read_i32()?)?;

    if shape_type == ShapeType::Null {
        return Ok(Shape::null(Some(shape_id)));
    }

    if shape_type.is_point() {
        let x = reader.read_f64()?;
        let y = reader.read_f64()?;
        let z = if shape_type.has_z() {
            Some(vec![reader.read_f64()?])
        } else {
            None
        };
        let m = if shape_type.has_m() && reader.remaining() >= 8 {
            Some(vec![reader.read_f64()?])
        } else {
            None
        };
        return Shape::new(shape_type, Some(shape_id), &[], vec![x], vec![y], z, m);
    }

    // The stored box is recomputed from the vertices
    reader.skip(32)?;

    let num_parts = if shape_type.has_parts() {
        reader.read_count("part")?
    } else {
        0
    };
    let num_vertices = reader.read_count("vertex")?;

    let part_bytes = if shape_type == ShapeType::MultiPatch {
        num_parts * 8
    } else {
        num_parts * 4
    };
    let mut required = part_bytes + num_vertices * 16;
    if shape_type.has_z() {
        required += 16 + num_vertices * 8;
    }
    if required > reader.remaining() {
        return Err(ShapefileError::Encoding(format!(
            "Record declares {} parts and {} vertices but only {} bytes remain.",
            num_parts,
            num_vertices,
            reader.remaining()
        )));
    }

    let mut parts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        let start = reader.read_i32()?;
        let start = u32::try_from(start).map_err(|_| {
            ShapefileError::MalformedGeometry(format!("Negative part start {}.", start))
        })?;
        parts.push(Part::ring(start));
    }
    if shape_type == ShapeType::MultiPatch {
        for part in parts.iter_mut() {
            part.part_type = PartType::from_code(reader.read_i32()?)?;
        }
    }

    let mut x = Vec::with_capacity(num_vertices);
    let mut y = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        x.push(reader.read_f64()?);
        y.push(reader.read_f64()?);
    }

    let z = if shape_type.has_z() {
        reader.skip(16)?;
        Some(reader.read_f64_array(num_vertices)?)
    } else {
        None
    };

    // The M block is optional, even for M types
    let m = if shape_type.has_m() && reader.remaining() >= 16 + num_vertices * 8 {
        reader.skip(16)?;
        Some(reader.read_f64_array(num_vertices)?)
    } else {
        None
    };

    Shape::new(shape_type, Some(shape_id), &parts, x, y, z, m)
}

/// Bounds-checked little-endian reader over one record's content.
struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(ShapefileError::Encoding(format!(
                "Record truncated: needed {} bytes at offset {}, record has {}.",
                len,
                self.pos,
                self.data.len()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    fn read_count(&mut self, what: &str) -> Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| ShapefileError::Encoding(format!("Negative {} count {}.", what, count)))
    }

    fn read_f64_array(&mut self, len: usize) -> Result<Vec<f64>> {
        let bytes = self.take(len * 8)?;
        let mut values = vec![0.; len];
        LittleEndian::read_f64_into(bytes, &mut values);
        Ok(values)
    }
}
