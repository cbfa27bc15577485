//! Checksummed streams with one-step lookahead.
//!
//! Files that carry their own checksum cannot hash everything they read: the
//! bytes holding the checksum must stay out. [`ChecksumStream`] hashes bytes
//! as they are consumed, but also lets a caller read *ahead*: such bytes are
//! held back and only hashed when the next read (ahead or not) happens. If
//! the peeked bytes turn out to be the checksum itself, the caller discards
//! them instead, optionally substituting other bytes.
//!
//! ```
//! use std::io::Cursor;
//! use fixed_width::Sha256ChecksumStream;
//!
//! let mut stream = Sha256ChecksumStream::new(Cursor::new(b"datasum".to_vec()));
//! stream.read_bytes(4).unwrap();
//! let trailer = stream.read_bytes_ahead(3).unwrap();
//! assert_eq!(trailer, b"sum");
//! stream.discard_ahead(None);
//! // Only "data" was hashed.
//! assert_eq!(
//!     stream.hex_digest(),
//!     "3a6eb0790f39ac87c94f3856b2dd2c5d110e6811602261a9a923d3bb23adc8b7"
//! );
//! ```
//!
//! The stream cannot seek, except internally for [`ChecksumStream::peek`].

use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use tracing::trace;

use crate::error::{Result, XfwError};
use crate::stream::{RecordRead, read_up_to};

/// MD5 checksummed stream, for legacy formats only.
pub type Md5ChecksumStream<S> = ChecksumStream<S, Md5>;
/// SHA-1 checksummed stream, for legacy formats only.
pub type Sha1ChecksumStream<S> = ChecksumStream<S, Sha1>;
/// SHA-224 checksummed stream.
pub type Sha224ChecksumStream<S> = ChecksumStream<S, Sha224>;
/// SHA-256 checksummed stream.
pub type Sha256ChecksumStream<S> = ChecksumStream<S, Sha256>;
/// SHA-384 checksummed stream.
pub type Sha384ChecksumStream<S> = ChecksumStream<S, Sha384>;
/// SHA-512 checksummed stream.
pub type Sha512ChecksumStream<S> = ChecksumStream<S, Sha512>;

/// A stream wrapper hashing every byte read or written through it.
///
/// `D` selects the hash algorithm.
#[derive(Debug)]
pub struct ChecksumStream<S, D> {
    stream: S,
    hasher: D,
    ahead: Option<Vec<u8>>,
}

impl<S, D: Digest + Clone> ChecksumStream<S, D> {
    /// Wrap `stream` with a fresh hasher.
    pub fn new(stream: S) -> Self {
        Self::with_hasher(stream, D::new())
    }

    /// Wrap `stream`, continuing from an existing hasher state.
    pub fn with_hasher(stream: S, hasher: D) -> Self {
        Self {
            stream,
            hasher,
            ahead: None,
        }
    }

    /// Hash `data`, after any pending lookahead bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.flush_ahead();
        self.hasher.update(data);
    }

    /// Hash any pending lookahead bytes, then hold `data` back instead.
    pub fn update_ahead(&mut self, data: Vec<u8>) {
        self.flush_ahead();
        self.ahead = Some(data);
    }

    /// Drop pending lookahead bytes without hashing them.
    ///
    /// `replacement`, if given, becomes the pending bytes and is hashed on
    /// the next flush. Returns the dropped bytes.
    pub fn discard_ahead(&mut self, replacement: Option<Vec<u8>>) -> Option<Vec<u8>> {
        std::mem::replace(&mut self.ahead, replacement)
    }

    /// Bytes read ahead and not yet hashed.
    #[must_use]
    pub fn pending_ahead(&self) -> Option<&[u8]> {
        self.ahead.as_deref()
    }

    /// Digest of all bytes hashed so far; pending lookahead bytes excluded.
    #[must_use]
    pub fn digest(&self) -> Vec<u8> {
        self.hasher.clone().finalize().to_vec()
    }

    /// Lowercase hex form of [`ChecksumStream::digest`].
    #[must_use]
    pub fn hex_digest(&self) -> String {
        hex::encode(self.digest())
    }

    /// Compare [`ChecksumStream::hex_digest`] with `expected`, ignoring case.
    pub fn verify(&self, expected: &str) -> Result<()> {
        let actual = self.hex_digest();
        let expected = expected.trim().to_lowercase();
        if actual != expected {
            return Err(XfwError::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Bytes moved through the returned reference are not hashed.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn flush_ahead(&mut self) {
        if let Some(ahead) = self.ahead.take() {
            trace!(len = ahead.len(), "hashing lookahead bytes");
            self.hasher.update(&ahead);
        }
    }
}

impl<S: RecordRead, D: Digest + Clone> ChecksumStream<S, D> {
    /// Read up to `len` bytes and hash them.
    pub fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let data = self.stream.read_chunk(len)?;
        self.update(&data);
        Ok(data)
    }

    /// Read up to `len` bytes, holding them back from the hash until the
    /// next read.
    pub fn read_bytes_ahead(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let data = self.stream.read_chunk(len)?;
        self.update_ahead(data.clone());
        Ok(data)
    }
}

impl<S: BufRead, D: Digest + Clone> ChecksumStream<S, D> {
    /// Read one line, newline included, and hash it.
    pub fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let line = self.next_line()?;
        self.update(&line);
        Ok(line)
    }

    /// Read one line, holding it back from the hash until the next read.
    pub fn read_line_ahead(&mut self) -> io::Result<Vec<u8>> {
        let line = self.next_line()?;
        self.update_ahead(line.clone());
        Ok(line)
    }

    fn next_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        self.stream.read_until(b'\n', &mut line)?;
        Ok(line)
    }
}

impl<S: Read + Seek, D> ChecksumStream<S, D> {
    /// Read up to `len` bytes without consuming or hashing them.
    ///
    /// Pending lookahead bytes are left alone.
    pub fn peek(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let position = self.stream.stream_position()?;
        let data = read_up_to(&mut self.stream, len)?;
        self.stream.seek(SeekFrom::Start(position))?;
        Ok(data)
    }

    /// Current position of the underlying stream.
    pub fn tell(&mut self) -> io::Result<u64> {
        self.stream.stream_position()
    }

    /// [`ChecksumStream::tell`] plus the length of pending lookahead bytes.
    pub fn tell_ahead(&mut self) -> io::Result<u64> {
        let pending = self.ahead.as_ref().map_or(0, Vec::len) as u64;
        Ok(self.tell()? + pending)
    }
}

impl<S: BufRead + Seek, D> ChecksumStream<S, D> {
    /// Read one line without consuming or hashing it.
    pub fn peek_line(&mut self) -> io::Result<Vec<u8>> {
        let position = self.stream.stream_position()?;
        let mut line = Vec::new();
        self.stream.read_until(b'\n', &mut line)?;
        self.stream.seek(SeekFrom::Start(position))?;
        Ok(line)
    }
}

impl<S: Write, D: Digest + Clone> Write for ChecksumStream<S, D> {
    /// Written bytes are hashed right away; lookahead does not apply.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.stream.write(buf)?;
        self.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl<S: RecordRead, D: Digest + Clone> RecordRead for ChecksumStream<S, D> {
    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        self.read_bytes(len)
    }

    fn position(&mut self) -> Option<u64> {
        self.stream.position()
    }
}
