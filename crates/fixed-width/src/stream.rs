//! Byte sources for parsing.
//!
//! Parsing needs "read exactly `n` bytes, fewer only at end of input" and,
//! when the source knows it, the current offset for error messages. Writing
//! goes through [`std::io::Write`] directly.

use std::fs::File;
use std::io::{self, BufReader, Cursor, ErrorKind, Read, Seek};

/// A byte source records and files parse from.
pub trait RecordRead {
    /// Read `len` bytes; fewer are returned only at end of input.
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>>;

    /// Current offset, if the source can tell.
    ///
    /// Only used to enrich error messages.
    fn position(&mut self) -> Option<u64> {
        None
    }
}

/// Fill up to `len` bytes from `reader`, stopping early at end of input.
pub(crate) fn read_up_to<R: Read + ?Sized>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let mut filled = 0usize;
    while filled < len {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Adapter for readers that cannot report an offset (pipes, sockets, ...).
#[derive(Debug)]
pub struct Sequential<R> {
    inner: R,
}

impl<R: Read> Sequential<R> {
    /// Wrap `inner`; offsets are never reported.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> RecordRead for Sequential<R> {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        read_up_to(&mut self.inner, len)
    }
}

impl RecordRead for &[u8] {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        read_up_to(self, len)
    }
}

impl<T: AsRef<[u8]>> RecordRead for Cursor<T> {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        read_up_to(self, len)
    }

    fn position(&mut self) -> Option<u64> {
        Some(Cursor::position(self))
    }
}

impl RecordRead for File {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        read_up_to(self, len)
    }

    fn position(&mut self) -> Option<u64> {
        self.stream_position().ok()
    }
}

impl<R: Read + Seek> RecordRead for BufReader<R> {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        read_up_to(self, len)
    }

    fn position(&mut self) -> Option<u64> {
        self.stream_position().ok()
    }
}

impl<T: RecordRead + ?Sized> RecordRead for &mut T {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        (**self).read_chunk(len)
    }

    fn position(&mut self) -> Option<u64> {
        (**self).position()
    }
}

impl<T: RecordRead + ?Sized> RecordRead for Box<T> {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        (**self).read_chunk(len)
    }

    fn position(&mut self) -> Option<u64> {
        (**self).position()
    }
}
