//! Integration tests for checksummed streams.
//!
//! The main scenario is a file that carries the SHA-256 digest of everything
//! before it on its last line.

use std::io::{BufReader, Cursor, Seek, SeekFrom, Write};

use fixed_width::{
    ChecksumStream, ErrorKind, Field, FileChunk, FileOptions, Layout, Record, RecordFile,
    Sha256ChecksumStream, Sha384ChecksumStream, Values,
};
use sha2::{Digest, Sha256};

fn ledger() -> RecordFile {
    let head = Record::builder(8)
        .fixed_value("tag", "LEDGER")
        .mandatory(Field::string(6), "tag")
        .field(Field::integer(2).with_cast(true), "n")
        .build()
        .unwrap();
    let item = Record::builder(10)
        .mandatory(Field::string(4), "code")
        .field(Field::integer(6).with_cast(true), "amount")
        .build()
        .unwrap();
    RecordFile::const_item_type(head, Some("n"), Some(Layout::from(item)), "\n").unwrap()
}

fn ledger_data() -> FileChunk {
    let items = [("RENT", 1200i64), ("FOOD", 310)]
        .iter()
        .map(|&(code, amount)| Values::new().with("code", code).with("amount", amount).into())
        .collect();
    FileChunk::with_items(Values::new(), items)
}

/// Write the ledger followed by its own digest.
fn write_signed(out: impl Write) -> Vec<u8> {
    let options = FileOptions::new().with_trailing_separator(true);
    let mut stream = Sha256ChecksumStream::new(out);
    ledger()
        .generate_stream_with_options(&mut stream, &ledger_data(), &options)
        .unwrap();
    let digest = stream.hex_digest();
    let mut out = stream.into_inner();
    writeln!(out, "{digest}").unwrap();
    digest.into_bytes()
}

#[test]
fn test_self_checksummed_file() {
    let mut file = tempfile::tempfile().unwrap();
    let digest = write_signed(&mut file);
    file.seek(SeekFrom::Start(0)).unwrap();

    let options = FileOptions::new().with_trailing_separator(true);
    let mut stream = Sha256ChecksumStream::new(BufReader::new(file));
    let parsed = ledger()
        .parse_stream_with_options(&mut stream, &options)
        .unwrap();
    assert_eq!(parsed.items().len(), 2);
    assert_eq!(stream.tell().unwrap(), 31);

    // The trailer must not be part of what it checks.
    let trailer = stream.read_line_ahead().unwrap();
    assert_eq!(trailer.trim_ascii_end(), &digest[..]);
    stream.discard_ahead(None);

    let trailer = String::from_utf8(trailer).unwrap();
    stream.verify(&trailer).unwrap();
}

#[test]
fn test_tampered_file_fails_verification() {
    let mut buffer = Vec::new();
    let digest = write_signed(&mut buffer);
    buffer[9] = b'L';

    let options = FileOptions::new().with_trailing_separator(true);
    let mut stream = Sha256ChecksumStream::new(Cursor::new(buffer));
    ledger()
        .parse_stream_with_options(&mut stream, &options)
        .unwrap();

    let err = stream
        .verify(std::str::from_utf8(&digest).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Checksum);
}

#[test]
fn test_peek_on_real_file() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"AAAABBBB").unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let mut stream = Sha256ChecksumStream::new(file);
    stream.read_bytes(2).unwrap();
    assert_eq!(stream.peek(4).unwrap(), b"AABB");
    assert_eq!(stream.tell().unwrap(), 2);
    stream.read_bytes_ahead(2).unwrap();
    assert_eq!(stream.tell_ahead().unwrap(), 6);
    stream.read_bytes(4).unwrap();

    assert_eq!(stream.digest(), Sha256::digest(b"AAAABBBB").to_vec());
}

#[test]
fn test_lookahead_equivalence() {
    let data = b"first-second";

    let mut plain = Sha256ChecksumStream::new(Cursor::new(data.to_vec()));
    plain.read_bytes(6).unwrap();
    plain.read_bytes(6).unwrap();

    let mut ahead = Sha256ChecksumStream::new(Cursor::new(data.to_vec()));
    ahead.read_bytes_ahead(6).unwrap();
    ahead.read_bytes(6).unwrap();

    assert_eq!(plain.hex_digest(), ahead.hex_digest());
}

#[test]
fn test_resume_from_hasher_state() {
    let mut hasher = sha2::Sha384::new();
    hasher.update(b"prefix:");
    let mut stream: Sha384ChecksumStream<&[u8]> = ChecksumStream::with_hasher(&b"body"[..], hasher);
    stream.read_bytes(4).unwrap();
    assert_eq!(
        stream.digest(),
        sha2::Sha384::digest(b"prefix:body").to_vec()
    );
}
