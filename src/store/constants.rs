/// Magic number at the start of both the geometry and the offset index files.
pub(crate) const FILE_CODE: i32 = 9994;

/// The only format version in use.
pub(crate) const FILE_VERSION: i32 = 1000;

/// Size in bytes of the header shared by the geometry and offset index files.
pub(crate) const HEADER_SIZE: usize = 100;

/// Size in bytes of the record number and content length preceding each record.
pub(crate) const RECORD_HEADER_SIZE: usize = 8;

/// Size in bytes of one `(offset, length)` entry in the offset index file.
pub(crate) const INDEX_ENTRY_SIZE: usize = 8;
