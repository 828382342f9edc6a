//! Chunk framing shared by PSK and PSA files.
//!
//! Every chunk starts with a 32 byte [`ChunkHeader`] followed by
//! `element_count * element_size` bytes of homogeneous records. The reader only
//! frames chunks, [`Chunk::records`] interprets the payload.

use std::{
    fmt::{self, Debug, Display, Formatter},
    io::{Cursor, Read, Seek, SeekFrom},
};

use binrw::BinRead;
use log::{debug, trace, warn};

use crate::{error::ImportError, text::decode_name};

pub const TAG_LEN: usize = 20;
pub const HEADER_SIZE: u64 = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, BinRead)]
pub struct ChunkTag(pub [u8; TAG_LEN]);

impl ChunkTag {
    /// Tag of an unknown chunk, reported when not even a header could be read.
    pub const UNKNOWN: ChunkTag = ChunkTag([0; TAG_LEN]);

    /// Build a null padded tag. Names longer than the tag are cut.
    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut tag = [0u8; TAG_LEN];
        let mut index = 0;
        while index < bytes.len() && index < TAG_LEN {
            tag[index] = bytes[index];
            index += 1;
        }
        Self(tag)
    }

    pub fn name(&self) -> String {
        decode_name(&self.0)
    }
}

impl Display for ChunkTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name())
    }
}

impl Debug for ChunkTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({:?})", self.name())
    }
}

#[derive(Debug, Clone, Copy, BinRead)]
#[br(little)]
pub struct ChunkHeader {
    pub id: ChunkTag,
    pub type_flag: i32,
    pub element_size: i32,
    pub element_count: i32,
}

impl Display for ChunkHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} flag {:#x}, {} records of {} bytes",
            self.id, self.type_flag, self.element_count, self.element_size
        )
    }
}

impl ChunkHeader {
    fn payload_len(&self) -> Result<u64, ImportError> {
        if self.element_size < 0 || self.element_count < 0 {
            return Err(ImportError::InvalidChunk {
                chunk: self.id,
                element_size: self.element_size,
                element_count: self.element_count,
            });
        }
        Ok(self.element_size as u64 * self.element_count as u64)
    }

    /// Fail with [`ImportError::InvalidFormat`] unless this header carries `magic`.
    pub fn expect_magic(&self, magic: ChunkTag) -> Result<(), ImportError> {
        if self.id == magic {
            Ok(())
        } else {
            Err(ImportError::InvalidFormat {
                expected: magic,
                found: self.id,
            })
        }
    }
}

/// Fixed-size record stored inside a chunk.
pub trait ChunkRecord: for<'a> BinRead<Args<'a> = ()> {
    /// Bytes this layout consumes. Files may declare a larger stride.
    const SIZE: usize;
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub header: ChunkHeader,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.header.element_count.max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Warn when the chunk id differs from the tag the file order implies.
    pub fn check_id(&self, expected: ChunkTag) {
        if self.header.id != expected {
            warn!(
                "Expected chunk {}, found {}; decoding by position",
                expected, self.header.id
            );
        }
    }

    /// Decode every record, record `i` starting at `i * element_size`.
    pub fn records<T: ChunkRecord + Debug>(&self) -> Result<Vec<T>, ImportError> {
        let count = self.len();
        if count == 0 {
            return Ok(Vec::new());
        }
        let stride = self.header.element_size as usize;
        if stride < T::SIZE {
            return Err(ImportError::RecordSize {
                chunk: self.header.id,
                expected: T::SIZE,
                found: stride,
            });
        } else if stride > T::SIZE {
            debug!(
                "Chunk {} records carry {} trailing bytes, skipped",
                self.header.id,
                stride - T::SIZE
            );
        }

        self.data
            .chunks_exact(stride)
            .take(count)
            .map(|bytes| {
                let record = T::read_le(&mut Cursor::new(bytes))?;
                trace!("{:?}", record);
                Ok(record)
            })
            .collect()
    }
}

fn remaining<R: Seek>(reader: &mut R) -> Result<u64, ImportError> {
    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    Ok(end.saturating_sub(position))
}

/// Whether the reader has no bytes left.
pub fn at_end<R: Seek>(reader: &mut R) -> Result<bool, ImportError> {
    Ok(remaining(reader)? == 0)
}

/// Read exactly one chunk header, without touching the payload.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<ChunkHeader, ImportError> {
    let available = remaining(reader)?;
    if available < HEADER_SIZE {
        return Err(ImportError::TruncatedStream {
            chunk: ChunkTag::UNKNOWN,
            expected: HEADER_SIZE,
            available,
        });
    }
    let header = ChunkHeader::read(reader)?;
    debug!("Chunk {}", header);
    Ok(header)
}

/// Read a chunk header and its whole payload.
pub fn read_chunk<R: Read + Seek>(reader: &mut R) -> Result<Chunk, ImportError> {
    let header = read_header(reader)?;
    read_payload(reader, header)
}

/// Read the payload that follows an already read `header`.
pub fn read_payload<R: Read + Seek>(
    reader: &mut R,
    header: ChunkHeader,
) -> Result<Chunk, ImportError> {
    let expected = header.payload_len()?;
    let available = remaining(reader)?;
    if available < expected {
        return Err(ImportError::TruncatedStream {
            chunk: header.id,
            expected,
            available,
        });
    }
    let mut data = vec![0u8; expected as usize];
    reader.read_exact(&mut data)?;
    Ok(Chunk { header, data })
}

/// Skip a chunk payload, returning only its header.
pub fn skip_chunk<R: Read + Seek>(reader: &mut R) -> Result<ChunkHeader, ImportError> {
    let header = read_header(reader)?;
    let expected = header.payload_len()?;
    let available = remaining(reader)?;
    if available < expected {
        return Err(ImportError::TruncatedStream {
            chunk: header.id,
            expected,
            available,
        });
    }
    reader.seek(SeekFrom::Current(expected as i64))?;
    Ok(header)
}

/// Read the zero-sized file header chunk and check its tag.
///
/// On a tag mismatch the reader is left right after the 32 header bytes.
pub fn read_file_header<R: Read + Seek>(
    reader: &mut R,
    magic: ChunkTag,
) -> Result<ChunkHeader, ImportError> {
    let header = read_header(reader)?;
    header.expect_magic(magic)?;
    let expected = header.payload_len()?;
    if expected > 0 {
        // Never seen in the wild, but the framing allows it
        reader.seek(SeekFrom::Current(expected as i64))?;
    }
    Ok(header)
}
