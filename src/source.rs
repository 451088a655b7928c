//! Byte sources a table can be (re)opened from.
//!
//! Every scan opens its own reader, so a source must hand out fresh,
//! independently positioned streams over bytes that do not change while
//! any stream is open.

use crate::streaming::buffers::MMAP_THRESHOLD;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A re-openable, immutable byte source.
pub trait TableSource: Sync {
    type Reader: Read;

    /// Identifier used in error messages and logs.
    fn id(&self) -> &str;

    /// Open a fresh stream positioned at the start of the data.
    fn open(&self) -> io::Result<Self::Reader>;

    /// Size of the underlying data in bytes, when known.
    fn size_bytes(&self) -> Option<u64> {
        None
    }
}

/// Shared byte buffer usable as a cursor target.
#[derive(Clone)]
pub struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Shared memory map usable as a cursor target.
#[derive(Clone)]
pub struct SharedMap(Arc<Mmap>);

impl AsRef<[u8]> for SharedMap {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// In-memory table data (stdin, tests).
#[derive(Clone)]
pub struct MemorySource {
    id: String,
    bytes: SharedBytes,
}

impl MemorySource {
    pub fn new(id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            bytes: SharedBytes(bytes.into()),
        }
    }

    /// Buffer a whole stream so it can be scanned more than once.
    pub fn from_reader<R: Read>(id: impl Into<String>, mut reader: R) -> io::Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(Self::new(id, buffer))
    }
}

impl TableSource for MemorySource {
    type Reader = Cursor<SharedBytes>;

    fn id(&self) -> &str {
        &self.id
    }

    fn open(&self) -> io::Result<Self::Reader> {
        Ok(Cursor::new(self.bytes.clone()))
    }

    fn size_bytes(&self) -> Option<u64> {
        Some(self.bytes.as_ref().len() as u64)
    }
}

/// A table stored in a file on disk.
///
/// Files of at least [`MMAP_THRESHOLD`] bytes are mapped once and every
/// open yields a cursor over the shared map; smaller files are reopened
/// with buffered I/O.
pub struct FileSource {
    id: String,
    path: PathBuf,
    size: u64,
    map: Option<SharedMap>,
}

impl FileSource {
    /// Open a file source. The file must not be modified while the source
    /// or any reader opened from it is alive.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let size = file.metadata()?.len();

        let map = if size >= MMAP_THRESHOLD {
            // SAFETY: the file is treated as immutable for the lifetime of the source
            let mmap = unsafe { Mmap::map(&file)? };
            Some(SharedMap(Arc::new(mmap)))
        } else {
            None
        };

        Ok(Self {
            id: path.display().to_string(),
            path,
            size,
            map,
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether reads go through a memory map.
    pub fn is_mapped(&self) -> bool {
        self.map.is_some()
    }
}

/// Reader returned by [`FileSource::open`].
pub enum FileReader {
    Buffered(File),
    Mapped(Cursor<SharedMap>),
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileReader::Buffered(file) => file.read(buf),
            FileReader::Mapped(cursor) => cursor.read(buf),
        }
    }
}

impl TableSource for FileSource {
    type Reader = FileReader;

    fn id(&self) -> &str {
        &self.id
    }

    fn open(&self) -> io::Result<Self::Reader> {
        match &self.map {
            Some(map) => Ok(FileReader::Mapped(Cursor::new(map.clone()))),
            None => Ok(FileReader::Buffered(File::open(&self.path)?)),
        }
    }

    fn size_bytes(&self) -> Option<u64> {
        Some(self.size)
    }
}
