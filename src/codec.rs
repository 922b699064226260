//! Primitive big-endian encoding over a seekable byte stream, plus the
//! shared-immutable-bytes-with-independent-cursors abstraction the read side
//! is built on.
//!
//! Every multi-byte value in the artifact is big-endian (§4.1). Writers are
//! plain `std::io::Write` sinks driven sequentially — the writer never seeks
//! (§4.6) — so the write side reuses `byteorder`'s `WriteBytesExt` directly.
//! The read side needs more: independent cursors into one shared immutable
//! byte image (§5, §9 "thread-local views... cheap to duplicate"), which
//! `byteorder` alone doesn't model, hence `ByteSource`/`Cursor` below.

use std::io::Write;
use std::sync::Arc;

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{AnnError, AnnResult};

/// Write a big-endian `i32`.
pub fn write_i32<W: Write>(w: &mut W, v: i32) -> AnnResult<()> {
    w.write_i32::<BigEndian>(v).map_err(AnnError::from)
}

/// Write a big-endian `u32`.
pub fn write_u32<W: Write>(w: &mut W, v: u32) -> AnnResult<()> {
    w.write_u32::<BigEndian>(v).map_err(AnnError::from)
}

/// Write a big-endian `f32`.
pub fn write_f32<W: Write>(w: &mut W, v: f32) -> AnnResult<()> {
    w.write_f32::<BigEndian>(v).map_err(AnnError::from)
}

/// Write an array of big-endian `i32`s, in order.
pub fn write_i32_array<W: Write>(w: &mut W, values: &[i32]) -> AnnResult<()> {
    for &v in values {
        write_i32(w, v)?;
    }
    Ok(())
}

/// Write an array of big-endian `f32`s, in order.
pub fn write_f32_array<W: Write>(w: &mut W, values: &[f32]) -> AnnResult<()> {
    for &v in values {
        write_f32(w, v)?;
    }
    Ok(())
}

/// An immutable byte image backing a `Cursor`. Implementors own the storage
/// (a memory map or an owned buffer) and hand out read-only slices; they
/// carry no seek position themselves, which is what lets `Cursor::duplicate`
/// be a cheap, race-free operation (§5: "share the immutable backing bytes...
/// but not file-pointer state").
pub trait ByteSource: Send + Sync {
    /// The full backing byte image.
    fn bytes(&self) -> &[u8];

    /// Total length in bytes.
    fn len(&self) -> usize {
        self.bytes().len()
    }
}

/// A byte source backed by a memory-mapped file.
pub struct MmapSource(memmap2::Mmap);

impl MmapSource {
    /// Memory-map the given file for read-only access.
    pub fn open(file: &std::fs::File) -> AnnResult<Self> {
        let mmap = unsafe { memmap2::Mmap::map(file)? };
        Ok(Self(mmap))
    }
}

impl ByteSource for MmapSource {
    fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A byte source backed by an owned in-memory buffer, for tests and for
/// embedding an artifact that was never written to disk.
pub struct SliceSource(Box<[u8]>);

impl SliceSource {
    /// Wrap an owned buffer as a byte source.
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }
}

impl ByteSource for SliceSource {
    fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// An independent, stateful read cursor into a shared [`ByteSource`].
///
/// Cloning the `Arc` and resetting position is how `duplicate()` produces a
/// cursor cheap enough to hand one to each worker thread (§5, §9).
#[derive(Clone)]
pub struct Cursor<S: ByteSource + ?Sized> {
    source: Arc<S>,
    pos: usize,
}

impl<S: ByteSource + ?Sized> Cursor<S> {
    /// Wrap a byte source in a cursor positioned at offset 0.
    pub fn new(source: Arc<S>) -> Self {
        Self { source, pos: 0 }
    }

    /// An independent cursor sharing the same backing bytes, positioned at 0.
    pub fn duplicate(&self) -> Self {
        Self {
            source: self.source.clone(),
            pos: 0,
        }
    }

    /// Move the cursor to an absolute byte offset.
    pub fn seek(&mut self, offset: u64) {
        self.pos = offset as usize;
    }

    /// The cursor's current absolute byte offset.
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Total length of the backing byte image.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    fn remaining(&self) -> &[u8] {
        let bytes = self.source.bytes();
        if self.pos >= bytes.len() {
            &[]
        } else {
            &bytes[self.pos..]
        }
    }

    /// Read exactly `buf.len()` bytes, advancing the cursor.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> AnnResult<()> {
        let remaining = self.remaining();
        if remaining.len() < buf.len() {
            return Err(AnnError::format("truncated artifact: short read"));
        }
        buf.copy_from_slice(&remaining[..buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    /// Read a big-endian `i32`.
    pub fn read_i32(&mut self) -> AnnResult<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> AnnResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Read a big-endian `f32`.
    pub fn read_f32(&mut self) -> AnnResult<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_be_bytes(buf))
    }

    /// Bulk-read `count` big-endian `i32`s into `dst`, which must have
    /// exactly `count` capacity semantics honored by the caller.
    pub fn read_i32_array(&mut self, dst: &mut Vec<i32>, count: usize) -> AnnResult<()> {
        dst.clear();
        dst.reserve(count);
        for _ in 0..count {
            dst.push(self.read_i32()?);
        }
        Ok(())
    }

    /// Bulk-read `count` big-endian `f32`s.
    pub fn read_f32_array(&mut self, count: usize) -> AnnResult<Vec<f32>> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_f32()?);
        }
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> AnnResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

