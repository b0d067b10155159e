use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::bounds::Bounds;
use crate::error::{Result, ShapefileError};
use crate::r#type::ShapeType;
use crate::shape::Shape;
use crate::store::codec::{decode_record, encode_record};
use crate::store::constants::{HEADER_SIZE, INDEX_ENTRY_SIZE, RECORD_HEADER_SIZE};
use crate::store::header::{to_words, FileHeader};

/// How a [`ShapeStore`] is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Location of one record in the geometry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordEntry {
    /// Byte offset of the record header.
    pub offset: u64,
    /// Length in bytes of the record content, excluding the 8 byte record header.
    pub size: u32,
}

impl RecordEntry {
    /// Byte offset one past the end of this record.
    pub fn end(&self) -> u64 {
        self.offset + RECORD_HEADER_SIZE as u64 + self.size as u64
    }
}

/// A snapshot of a store's summary information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreInfo {
    pub num_records: u32,
    pub shape_type: ShapeType,
    /// Extent of every shape written so far. Zeroed for a store without non-null shapes.
    pub bounds: Bounds,
}

/// A geometry file (`.shp`) together with its offset index file (`.shx`).
///
/// The whole offset index is held in memory. Headers of both files are only rewritten by
/// [`ShapeStore::close`], or when a modified store is dropped.
///
/// Records are never compacted: a shape that no longer fits in its slot is appended to the end of
/// the geometry file and the old bytes are left in place.
#[derive(Debug)]
pub struct ShapeStore {
    shp: File,
    shx: File,
    mode: AccessMode,
    shape_type: ShapeType,
    file_size: u64,
    records: Vec<RecordEntry>,
    bounds: Option<Bounds>,
    dirty: bool,
    multipatch_measure: bool,
}

impl ShapeStore {
    /// Open an existing store. `path` may name either file of the pair, or neither: its extension
    /// is replaced by `shp` and `shx`.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self> {
        let path = path.as_ref();
        let shp_path = existing_sibling(path, "shp");
        let shx_path = existing_sibling(path, "shx");
        log::debug!("Opening store {:?} ({:?})", shp_path, mode);

        let mut shp = open_file(&shp_path, mode)?;
        let mut shx = open_file(&shx_path, mode)?;

        let mut header_buf = [0u8; HEADER_SIZE];
        read_header_bytes(&mut shp, &mut header_buf, &shp_path)?;
        let header = FileHeader::try_new(&header_buf)?;

        let mut index_buf = vec![];
        shx.read_to_end(&mut index_buf)?;
        let index_header = FileHeader::try_new(&index_buf)?;
        let records = parse_offset_index(&index_buf, &index_header)?;

        let file_size = shp.metadata()?.len();
        if let Some(bad) = records.iter().position(|entry| entry.end() > file_size) {
            log::warn!(
                "Offset index of {:?} points past the end of the geometry file at record {}",
                shp_path,
                bad
            );
        }

        let bounds = if records.is_empty() {
            None
        } else if header.bounds == Bounds::default() && !has_non_null_record(&shp, &records)? {
            // Zeroed bounds are only real when some record carries geometry
            None
        } else {
            Some(header.bounds)
        };

        Ok(Self {
            shp,
            shx,
            mode,
            shape_type: header.shape_type,
            file_size,
            records,
            bounds,
            dirty: false,
            multipatch_measure: true,
        })
    }

    /// Create an empty store, replacing any existing files.
    pub fn create(path: impl AsRef<Path>, shape_type: ShapeType) -> Result<Self> {
        let path = path.as_ref();
        let shp_path = path.with_extension("shp");
        let shx_path = path.with_extension("shx");
        log::debug!("Creating {} store {:?}", shape_type.name(), shp_path);

        let create = |path: &Path| {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|e| ShapefileError::Open(format!("{}: {}", path.display(), e)))
        };

        let mut store = Self {
            shp: create(&shp_path)?,
            shx: create(&shx_path)?,
            mode: AccessMode::ReadWrite,
            shape_type,
            file_size: HEADER_SIZE as u64,
            records: vec![],
            bounds: None,
            dirty: false,
            multipatch_measure: true,
        };
        store.write_headers()?;
        Ok(store)
    }

    /// Record count, nominal type and accumulated bounds.
    pub fn info(&self) -> StoreInfo {
        StoreInfo {
            num_records: self.num_records(),
            shape_type: self.shape_type,
            bounds: self.bounds.unwrap_or_default(),
        }
    }

    pub fn num_records(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// The accumulated extent of all shapes written, `None` if there are none.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether there are changes that [`ShapeStore::close`] still has to write.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Location of record `id` in the geometry file.
    pub fn record_entry(&self, id: u32) -> Option<RecordEntry> {
        self.records.get(id as usize).copied()
    }

    /// Current length of the geometry file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Whether MultiPatch records are written with their M values. Defaults to `true`.
    pub fn set_write_multipatch_measure(&mut self, write: bool) {
        self.multipatch_measure = write;
    }

    /// Read and decode record `id`.
    pub fn read_shape(&self, id: u32) -> Result<Shape> {
        let entry = self.record_entry(id).ok_or(ShapefileError::Range {
            id,
            count: self.num_records(),
        })?;
        if entry.end() > self.file_size {
            return Err(ShapefileError::Encoding(format!(
                "Record {} extends past the end of the geometry file.",
                id
            )));
        }

        let mut data = vec![0u8; RECORD_HEADER_SIZE + entry.size as usize];
        let mut file = &self.shp;
        file.seek(SeekFrom::Start(entry.offset))?;
        file.read_exact(&mut data).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => ShapefileError::Encoding(format!(
                "Record {} extends past the end of the geometry file.",
                id
            )),
            _ => ShapefileError::Io(e),
        })?;

        decode_record(&data[RECORD_HEADER_SIZE..], id)
    }

    /// Write `shape` as record `id`, or append it when `id` is `None` or equal to the record
    /// count. Returns the id the shape was written to.
    ///
    /// An existing record is overwritten in place when the new encoding fits in its slot and is
    /// otherwise moved to the end of the file. The store's bounds only ever grow.
    pub fn write_shape(&mut self, id: Option<u32>, shape: &Shape) -> Result<u32> {
        if self.mode == AccessMode::ReadOnly {
            return Err(ShapefileError::ReadOnly);
        }
        if shape.shape_type() != ShapeType::Null && shape.shape_type() != self.shape_type {
            return Err(ShapefileError::Encoding(format!(
                "Cannot write a {} shape to a {} store.",
                shape.shape_type().name(),
                self.shape_type.name()
            )));
        }

        let count = self.num_records();
        let existing = match id {
            None => None,
            Some(id) if id == count => None,
            Some(id) if id < count => Some(id),
            Some(id) => return Err(ShapefileError::Range { id, count }),
        };
        let id = existing.unwrap_or(count);

        let record = encode_record(shape, id + 1, self.multipatch_measure)?;
        let size = (record.len() - RECORD_HEADER_SIZE) as u32;

        let offset = match existing.map(|id| self.records[id as usize]) {
            Some(entry) if size <= entry.size => entry.offset,
            _ => {
                to_words(self.file_size + record.len() as u64)?;
                self.file_size
            }
        };

        self.shp.seek(SeekFrom::Start(offset))?;
        self.shp.write_all(&record)?;
        if offset == self.file_size {
            self.file_size += record.len() as u64;
        }

        let entry = RecordEntry { offset, size };
        match existing {
            Some(id) => self.records[id as usize] = entry,
            None => self.records.push(entry),
        }

        if !shape.is_null() {
            match self.bounds.as_mut() {
                Some(bounds) => bounds.expand(shape.bounds()),
                None => self.bounds = Some(*shape.bounds()),
            }
        }
        self.dirty = true;
        Ok(id)
    }

    /// Rebuild the store's bounds by reading every record. Unlike writes, this can shrink them.
    pub fn recompute_extents(&mut self) -> Result<()> {
        let mut bounds: Option<Bounds> = None;
        for id in 0..self.num_records() {
            let shape = self.read_shape(id)?;
            if shape.is_null() {
                continue;
            }
            match bounds.as_mut() {
                Some(bounds) => bounds.expand(shape.bounds()),
                None => bounds = Some(*shape.bounds()),
            }
        }
        self.bounds = bounds;
        if self.mode == AccessMode::ReadWrite {
            self.dirty = true;
        }
        Ok(())
    }

    /// Write final headers and the offset index if anything changed, and release the files.
    pub fn close(mut self) -> Result<()> {
        log::debug!("Closing store with {} records", self.records.len());
        if self.dirty {
            self.write_headers()?;
        }
        Ok(())
    }

    fn write_headers(&mut self) -> Result<()> {
        let bounds = self.bounds.unwrap_or_default();
        let header = FileHeader {
            file_length: self.file_size,
            shape_type: self.shape_type,
            bounds,
        };
        self.shp.seek(SeekFrom::Start(0))?;
        self.shp.write_all(&header.to_bytes()?)?;
        self.shp.flush()?;

        let index_length = HEADER_SIZE + self.records.len() * INDEX_ENTRY_SIZE;
        let mut index = Vec::with_capacity(index_length);
        let index_header = FileHeader {
            file_length: index_length as u64,
            ..header
        };
        index.extend_from_slice(&index_header.to_bytes()?);
        for entry in &self.records {
            let mut buf = [0u8; INDEX_ENTRY_SIZE];
            BigEndian::write_i32(&mut buf[0..4], to_words(entry.offset)?);
            BigEndian::write_i32(&mut buf[4..8], to_words(entry.size as u64)?);
            index.extend_from_slice(&buf);
        }
        self.shx.seek(SeekFrom::Start(0))?;
        self.shx.write_all(&index)?;
        self.shx.set_len(index_length as u64)?;
        self.shx.flush()?;

        self.dirty = false;
        Ok(())
    }
}

impl Drop for ShapeStore {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.write_headers() {
                log::warn!("Failed to write store headers on drop: {}", e);
            }
        }
    }
}

/// Parse the `(offset, length)` pairs following the offset index header.
fn parse_offset_index(data: &[u8], header: &FileHeader) -> Result<Vec<RecordEntry>> {
    let declared = header.file_length as usize;
    if data.len() < declared {
        return Err(ShapefileError::Open(format!(
            "Offset index truncated: header declares {} bytes, file has {}.",
            declared,
            data.len()
        )));
    }

    let num_records = (declared - HEADER_SIZE) / INDEX_ENTRY_SIZE;
    let records = data[HEADER_SIZE..HEADER_SIZE + num_records * INDEX_ENTRY_SIZE]
        .chunks_exact(INDEX_ENTRY_SIZE)
        .enumerate()
        .map(|(i, entry)| {
            let offset = BigEndian::read_i32(&entry[0..4]);
            let size = BigEndian::read_i32(&entry[4..8]);
            if offset < 0 || size < 0 {
                return Err(ShapefileError::Open(format!(
                    "Offset index entry {} is negative: ({}, {}).",
                    i, offset, size
                )));
            }
            Ok(RecordEntry {
                offset: offset as u64 * 2,
                size: size as u32 * 2,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(records)
}

/// Whether any record's type code is something other than Null. Records that cannot be read are
/// skipped.
fn has_non_null_record(shp: &File, records: &[RecordEntry]) -> Result<bool> {
    let mut file = shp;
    let mut code = [0u8; 4];
    for entry in records {
        file.seek(SeekFrom::Start(entry.offset + RECORD_HEADER_SIZE as u64))?;
        match file.read_exact(&mut code) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => continue,
            Err(e) => return Err(e.into()),
        }
        if entry.size >= 4 && LittleEndian::read_i32(&code) != ShapeType::Null.code() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn read_header_bytes(file: &mut File, buf: &mut [u8], path: &Path) -> Result<()> {
    file.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            ShapefileError::Open(format!("{}: header truncated.", path.display()))
        }
        _ => ShapefileError::Io(e),
    })
}

fn open_file(path: &Path, mode: AccessMode) -> Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    if mode == AccessMode::ReadWrite {
        options.write(true);
    }
    options
        .open(path)
        .map_err(|e| ShapefileError::Open(format!("{}: {}", path.display(), e)))
}

/// Sibling file with the given extension, preferring lower case but falling back to an existing
/// upper case name.
fn existing_sibling(path: &Path, extension: &str) -> PathBuf {
    let lower = path.with_extension(extension);
    if lower.exists() {
        return lower;
    }
    let upper = path.with_extension(extension.to_uppercase());
    if upper.exists() {
        upper
    } else {
        lower
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::r#type::PartType;
    use crate::shape::Part;
    use tempfile::TempDir;

    fn square(offset: f64, size: f64) -> Shape {
        Shape::simple(
            ShapeType::Polygon,
            vec![offset, offset, offset + size, offset + size, offset],
            vec![offset, offset + size, offset + size, offset, offset],
            None,
        )
        .unwrap()
    }

    fn line(num_vertices: usize) -> Shape {
        let x = (0..num_vertices).map(|i| i as f64).collect();
        let y = (0..num_vertices).map(|i| (i * 2) as f64).collect();
        Shape::simple(ShapeType::Arc, x, y, None).unwrap()
    }

    fn assert_offset_index_consistent(store: &ShapeStore) {
        let mut entries = store.records.clone();
        entries.sort_by_key(|entry| entry.offset);
        for entry in &entries {
            assert!(entry.offset >= HEADER_SIZE as u64);
            assert!(entry.end() <= store.file_size());
        }
        for pair in entries.windows(2) {
            assert!(pair[0].end() <= pair[1].offset);
        }
    }

    #[test]
    fn write_then_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("squares");

        let mut store = ShapeStore::create(&path, ShapeType::Polygon).unwrap();
        let id = store.write_shape(None, &square(0., 10.)).unwrap();
        assert_eq!(id, 0);
        let info = store.info();
        assert_eq!(info.num_records, 1);
        assert_eq!(info.bounds, Bounds::from_xy(0., 0., 10., 10.));
        store.close().unwrap();

        assert!(dir.path().join("squares.shp").exists());
        assert!(dir.path().join("squares.shx").exists());

        let store = ShapeStore::open(dir.path().join("squares.shp"), AccessMode::ReadOnly).unwrap();
        assert_eq!(store.info().num_records, 1);
        assert_eq!(store.shape_type(), ShapeType::Polygon);
        assert_eq!(store.bounds(), Some(Bounds::from_xy(0., 0., 10., 10.)));

        let mut expected = square(0., 10.);
        expected.set_shape_id(Some(0));
        assert_eq!(store.read_shape(0).unwrap(), expected);
    }

    #[test]
    fn file_lengths_match_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lines.shp");
        let mut store = ShapeStore::create(&path, ShapeType::Arc).unwrap();
        store.write_shape(None, &line(2)).unwrap();
        store.write_shape(None, &line(3)).unwrap();
        store.close().unwrap();

        let shp = std::fs::read(dir.path().join("lines.shp")).unwrap();
        let shx = std::fs::read(dir.path().join("lines.shx")).unwrap();
        assert_eq!(BigEndian::read_i32(&shp[24..28]) as usize * 2, shp.len());
        assert_eq!(shx.len(), HEADER_SIZE + 2 * INDEX_ENTRY_SIZE);
        assert_eq!(BigEndian::read_i32(&shx[24..28]) as usize * 2, shx.len());
        // first record starts right after the header, in 16-bit words
        assert_eq!(BigEndian::read_i32(&shx[100..104]), 50);
        // first record number is 1-based
        assert_eq!(BigEndian::read_i32(&shp[100..104]), 1);
    }

    #[test]
    fn overwrite_in_place_or_relocate() {
        let dir = TempDir::new().unwrap();
        let mut store = ShapeStore::create(dir.path().join("a"), ShapeType::Arc).unwrap();
        store.write_shape(None, &line(3)).unwrap();
        store.write_shape(None, &line(3)).unwrap();
        let first = store.record_entry(0).unwrap();
        let end = store.file_size();

        // Same size: stays in place
        assert_eq!(store.write_shape(Some(0), &line(3)).unwrap(), 0);
        assert_eq!(store.record_entry(0).unwrap(), first);
        assert_eq!(store.file_size(), end);

        // Smaller: stays in place with the smaller size
        store.write_shape(Some(0), &line(2)).unwrap();
        let shrunk = store.record_entry(0).unwrap();
        assert_eq!(shrunk.offset, first.offset);
        assert!(shrunk.size < first.size);
        assert_eq!(store.file_size(), end);

        // Larger: moved to the end of the file
        store.write_shape(Some(0), &line(10)).unwrap();
        let moved = store.record_entry(0).unwrap();
        assert_eq!(moved.offset, end);
        assert_eq!(store.file_size(), moved.end());
        assert_offset_index_consistent(&store);

        assert_eq!(store.read_shape(0).unwrap().num_vertices(), 10);
        assert_eq!(store.read_shape(1).unwrap().num_vertices(), 3);
        assert_eq!(store.num_records(), 2);
    }

    #[test]
    fn id_equal_to_count_appends() {
        let dir = TempDir::new().unwrap();
        let mut store = ShapeStore::create(dir.path().join("a"), ShapeType::Arc).unwrap();
        assert_eq!(store.write_shape(Some(0), &line(2)).unwrap(), 0);
        assert_eq!(store.write_shape(Some(1), &line(2)).unwrap(), 1);
        assert!(matches!(
            store.write_shape(Some(5), &line(2)),
            Err(ShapefileError::Range { id: 5, count: 2 })
        ));
        assert!(matches!(
            store.read_shape(2),
            Err(ShapefileError::Range { id: 2, count: 2 })
        ));
    }

    #[test]
    fn rejects_mismatched_types() {
        let dir = TempDir::new().unwrap();
        let mut store = ShapeStore::create(dir.path().join("a"), ShapeType::Polygon).unwrap();
        assert!(matches!(
            store.write_shape(None, &line(2)),
            Err(ShapefileError::Encoding(_))
        ));
        assert_eq!(store.num_records(), 0);

        // Null shapes go anywhere
        assert_eq!(store.write_shape(None, &Shape::null(None)).unwrap(), 0);
        let read = store.read_shape(0).unwrap();
        assert!(read.is_null());
        assert_eq!(read.num_vertices(), 0);
        assert_eq!(store.bounds(), None);
    }

    #[test]
    fn bounds_only_grow_until_recomputed() {
        let dir = TempDir::new().unwrap();
        let mut store = ShapeStore::create(dir.path().join("a"), ShapeType::Polygon).unwrap();
        store.write_shape(None, &Shape::null(None)).unwrap();
        store.write_shape(None, &square(5., 1.)).unwrap();
        assert_eq!(store.bounds(), Some(Bounds::from_xy(5., 5., 6., 6.)));
        store.write_shape(None, &square(-2., 3.)).unwrap();
        assert_eq!(store.bounds(), Some(Bounds::from_xy(-2., -2., 6., 6.)));

        store.write_shape(Some(2), &square(5., 0.5)).unwrap();
        assert_eq!(store.bounds(), Some(Bounds::from_xy(-2., -2., 6., 6.)));

        store.recompute_extents().unwrap();
        assert_eq!(store.bounds(), Some(Bounds::from_xy(5., 5., 6., 6.)));
    }

    #[test]
    fn z_and_m_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("z");
        let shape = Shape::new(
            ShapeType::ArcZ,
            None,
            &[Part::ring(0), Part::ring(2)],
            vec![0., 1., 2., 3.],
            vec![4., 5., 6., 7.],
            Some(vec![-1., 1., 2., 3.]),
            Some(vec![0.25, 0.5, 0.75, 1.]),
        )
        .unwrap();

        let mut store = ShapeStore::create(&path, ShapeType::ArcZ).unwrap();
        store.write_shape(None, &shape).unwrap();
        store.close().unwrap();

        let store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
        let read = store.read_shape(0).unwrap();
        assert_eq!(read.z(), shape.z());
        assert_eq!(read.m(), shape.m());
        assert_eq!(read.parts(), shape.parts());
        assert_eq!(read.bounds(), shape.bounds());
        let bounds = store.bounds().unwrap();
        assert_eq!(bounds.min[2], -1.);
        assert_eq!(bounds.max[3], 1.);
    }

    #[test]
    fn read_only_stores_reject_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a");
        ShapeStore::create(&path, ShapeType::Arc).unwrap().close().unwrap();

        let mut store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
        assert!(matches!(
            store.write_shape(None, &line(2)),
            Err(ShapefileError::ReadOnly)
        ));
    }

    #[test]
    fn open_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.shp"), vec![7u8; 200]).unwrap();
        std::fs::write(dir.path().join("bad.shx"), vec![7u8; 200]).unwrap();
        assert!(matches!(
            ShapeStore::open(dir.path().join("bad"), AccessMode::ReadOnly),
            Err(ShapefileError::Open(_))
        ));

        std::fs::write(dir.path().join("short.shp"), vec![0u8; 20]).unwrap();
        std::fs::write(dir.path().join("short.shx"), vec![0u8; 20]).unwrap();
        assert!(matches!(
            ShapeStore::open(dir.path().join("short"), AccessMode::ReadOnly),
            Err(ShapefileError::Open(_))
        ));

        assert!(matches!(
            ShapeStore::open(dir.path().join("missing"), AccessMode::ReadOnly),
            Err(ShapefileError::Open(_))
        ));
    }

    #[test]
    fn truncated_geometry_file_is_an_encoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a");
        let mut store = ShapeStore::create(&path, ShapeType::Arc).unwrap();
        store.write_shape(None, &line(2)).unwrap();
        store.write_shape(None, &line(20)).unwrap();
        store.close().unwrap();

        let shp = OpenOptions::new()
            .write(true)
            .open(dir.path().join("a.shp"))
            .unwrap();
        let len = shp.metadata().unwrap().len();
        shp.set_len(len - 40).unwrap();
        drop(shp);

        let store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
        assert!(store.read_shape(0).is_ok());
        assert!(matches!(
            store.read_shape(1),
            Err(ShapefileError::Encoding(_))
        ));
    }

    #[test]
    fn dropping_a_dirty_store_flushes_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a");
        {
            let mut store = ShapeStore::create(&path, ShapeType::Arc).unwrap();
            store.write_shape(None, &line(4)).unwrap();
            assert!(store.is_dirty());
        }
        let store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
        assert_eq!(store.num_records(), 1);
    }

    #[test]
    fn oversized_index_entry_is_an_encoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a");
        let mut store = ShapeStore::create(&path, ShapeType::Arc).unwrap();
        store.write_shape(None, &line(3)).unwrap();
        store.close().unwrap();

        let shx_path = dir.path().join("a.shx");
        let mut shx = std::fs::read(&shx_path).unwrap();
        BigEndian::write_i32(&mut shx[104..108], i32::MAX);
        std::fs::write(&shx_path, shx).unwrap();

        let store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
        assert!(matches!(
            store.read_shape(0),
            Err(ShapefileError::Encoding(_))
        ));
    }

    #[test]
    fn reopened_null_only_store_has_no_bounds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a");
        let mut store = ShapeStore::create(&path, ShapeType::Polygon).unwrap();
        store.write_shape(None, &Shape::null(None)).unwrap();
        store.close().unwrap();

        let mut store = ShapeStore::open(&path, AccessMode::ReadWrite).unwrap();
        assert_eq!(store.num_records(), 1);
        assert_eq!(store.bounds(), None);
        store.write_shape(None, &square(5., 1.)).unwrap();
        assert_eq!(store.bounds(), Some(Bounds::from_xy(5., 5., 6., 6.)));
    }

    #[test]
    fn reopened_point_at_origin_keeps_bounds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a");
        let mut store = ShapeStore::create(&path, ShapeType::Point).unwrap();
        store.write_shape(None, &Shape::null(None)).unwrap();
        let origin = Shape::simple(ShapeType::Point, vec![0.], vec![0.], None).unwrap();
        store.write_shape(None, &origin).unwrap();
        store.close().unwrap();

        let store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
        assert_eq!(store.bounds(), Some(Bounds::default()));
    }

    fn sample_shape(shape_type: ShapeType) -> Shape {
        let num_vertices = if shape_type.is_point() { 1 } else { 4 };
        let x: Vec<f64> = (0..num_vertices).map(|i| 1.5 + i as f64).collect();
        let y: Vec<f64> = (0..num_vertices).map(|i| -2.25 * i as f64).collect();
        let z: Vec<f64> = (0..num_vertices).map(|i| 10. + i as f64).collect();
        let m: Vec<f64> = (0..num_vertices).map(|i| 0.5 * i as f64).collect();
        let parts = [
            Part::new(0, PartType::TriStrip),
            Part::new(2, PartType::OuterRing),
        ];
        Shape::new(shape_type, None, &parts, x, y, Some(z), Some(m)).unwrap()
    }

    #[test]
    fn every_shape_type_round_trips() {
        let types = [
            ShapeType::Point,
            ShapeType::Arc,
            ShapeType::Polygon,
            ShapeType::MultiPoint,
            ShapeType::PointZ,
            ShapeType::ArcZ,
            ShapeType::PolygonZ,
            ShapeType::MultiPointZ,
            ShapeType::PointM,
            ShapeType::ArcM,
            ShapeType::PolygonM,
            ShapeType::MultiPointM,
            ShapeType::MultiPatch,
        ];

        let dir = TempDir::new().unwrap();
        for shape_type in types {
            let path = dir.path().join(shape_type.name());
            let shape = sample_shape(shape_type);

            let mut store = ShapeStore::create(&path, shape_type).unwrap();
            store.write_shape(None, &shape).unwrap();
            store.write_shape(None, &Shape::null(None)).unwrap();
            store.close().unwrap();

            let store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
            let mut expected = shape.clone();
            expected.set_shape_id(Some(0));
            assert_eq!(store.read_shape(0).unwrap(), expected, "{:?}", shape_type);
            assert_eq!(store.read_shape(1).unwrap(), Shape::null(Some(1)));
            assert_eq!(store.bounds(), Some(*shape.bounds()), "{:?}", shape_type);
        }
    }

    #[test]
    fn multipatch_without_measure_reads_zero_m() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patch");
        let shape = sample_shape(ShapeType::MultiPatch);

        let mut store = ShapeStore::create(&path, ShapeType::MultiPatch).unwrap();
        store.set_write_multipatch_measure(false);
        store.write_shape(None, &shape).unwrap();
        store.close().unwrap();

        let store = ShapeStore::open(&path, AccessMode::ReadOnly).unwrap();
        let read = store.read_shape(0).unwrap();
        assert_eq!(read.z(), shape.z());
        assert_eq!(read.parts(), shape.parts());
        assert_eq!(read.m(), &[0.; 4]);
    }
}
