//! The 100 byte header shared by the geometry file and the offset index file.
//!
//! The file code and file length are big-endian, everything after them is little-endian.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::bounds::Bounds;
use crate::error::{Result, ShapefileError};
use crate::r#type::ShapeType;
use crate::store::constants::{FILE_CODE, FILE_VERSION, HEADER_SIZE};

/// Parsed contents of a file header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FileHeader {
    /// Total file length in bytes.
    pub(crate) file_length: u64,
    pub(crate) shape_type: ShapeType,
    pub(crate) bounds: Bounds,
}

impl FileHeader {
    pub(crate) fn try_new(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(ShapefileError::Open(format!(
                "Header truncated: got {} bytes, expected {}.",
                data.len(),
                HEADER_SIZE
            )));
        }

        let file_code = BigEndian::read_i32(&data[0..4]);
        if file_code != FILE_CODE {
            return Err(ShapefileError::Open(format!(
                "Bad file code {}, expected {}.",
                file_code, FILE_CODE
            )));
        }

        let file_length_words = BigEndian::read_i32(&data[24..28]);
        if file_length_words < (HEADER_SIZE / 2) as i32 {
            return Err(ShapefileError::Open(format!(
                "File length of {} words is shorter than the header.",
                file_length_words
            )));
        }

        // The version is not checked: files in the wild carry assorted values here.
        let type_code = LittleEndian::read_i32(&data[32..36]);
        let shape_type = ShapeType::from_code(type_code).map_err(|_| {
            ShapefileError::Open(format!("Unknown shape type {} in header.", type_code))
        })?;

        let mut values = [0.; 8];
        LittleEndian::read_f64_into(&data[36..100], &mut values);
        let bounds = Bounds::new(
            [values[0], values[1], values[4], values[6]],
            [values[2], values[3], values[5], values[7]],
        );

        Ok(Self {
            file_length: file_length_words as u64 * 2,
            shape_type,
            bounds,
        })
    }

    pub(crate) fn to_bytes(&self) -> Result<[u8; HEADER_SIZE]> {
        let mut data = [0u8; HEADER_SIZE];
        BigEndian::write_i32(&mut data[0..4], FILE_CODE);
        BigEndian::write_i32(&mut data[24..28], to_words(self.file_length)?);
        LittleEndian::write_i32(&mut data[28..32], FILE_VERSION);
        LittleEndian::write_i32(&mut data[32..36], self.shape_type.code());

        let b = &self.bounds;
        let values = [
            b.min[0], b.min[1], b.max[0], b.max[1], b.min[2], b.max[2], b.min[3], b.max[3],
        ];
        LittleEndian::write_f64_into(&values, &mut data[36..100]);
        Ok(data)
    }
}

/// Convert a byte count into the 16-bit word count stored on disk.
pub(crate) fn to_words(bytes: u64) -> Result<i32> {
    i32::try_from(bytes / 2).map_err(|_| {
        ShapefileError::Encoding(format!("{} bytes exceeds the format's size limit.", bytes))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_layout() {
        let header = FileHeader {
            file_length: 236,
            shape_type: ShapeType::PolygonZ,
            bounds: Bounds::new([1., 2., 3., 4.], [5., 6., 7., 8.]),
        };
        let data = header.to_bytes().unwrap();

        assert_eq!(&data[0..4], &[0, 0, 0x27, 0x0a]);
        assert_eq!(&data[24..28], &[0, 0, 0, 118]);
        assert_eq!(LittleEndian::read_i32(&data[28..32]), 1000);
        assert_eq!(LittleEndian::read_i32(&data[32..36]), 15);
        // x min, y min, x max, y max, z min, z max, m min, m max
        assert_eq!(LittleEndian::read_f64(&data[36..44]), 1.);
        assert_eq!(LittleEndian::read_f64(&data[52..60]), 5.);
        assert_eq!(LittleEndian::read_f64(&data[68..76]), 3.);
        assert_eq!(LittleEndian::read_f64(&data[76..84]), 7.);

        assert_eq!(FileHeader::try_new(&data).unwrap(), header);
    }

    #[test]
    fn rejects_bad_magic_and_truncation() {
        let header = FileHeader {
            file_length: 100,
            shape_type: ShapeType::Point,
            bounds: Bounds::default(),
        };
        let mut data = header.to_bytes().unwrap();
        assert!(matches!(
            FileHeader::try_new(&data[..60]),
            Err(ShapefileError::Open(_))
        ));

        data[3] = 0;
        assert!(matches!(
            FileHeader::try_new(&data),
            Err(ShapefileError::Open(_))
        ));
    }
}
