//! Fixed-width record files.
//!
//! This crate reads and writes text files made of fixed-length records, as
//! used by bank interchange formats and similar legacy feeds.
//!
//! # Features
//!
//! - Typed fields (string, integer, date/time) with padding and truncation
//! - Records with separators, nested records, fillers and fixed values
//! - Header/items files whose head decides how many items follow
//! - Checksummed streams (SHA-2, plus MD5 and SHA-1 for legacy formats) with
//!   one-step lookahead, for files that carry their own checksum
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use fixed_width::{Field, FileChunk, Layout, Record, RecordFile, Values};
//!
//! let head = Record::builder(6)
//!     .fixed_value("kind", "HD")
//!     .mandatory(Field::string(2), "kind")
//!     .field(Field::integer(4).with_cast(true), "count")
//!     .build()
//!     .unwrap();
//! let item = Record::builder(4)
//!     .mandatory(Field::integer(4).with_cast(true), "amount")
//!     .build()
//!     .unwrap();
//! let file =
//!     RecordFile::const_item_type(head, Some("count"), Some(Layout::from(item)), "\n").unwrap();
//!
//! let items = (1..=2i64)
//!     .map(|n| Values::new().with("amount", n * 100).into())
//!     .collect();
//! let mut out = Vec::new();
//! file.generate_stream(&mut out, &FileChunk::with_items(Values::new(), items))
//!     .unwrap();
//! assert_eq!(out, b"HD0002\n0100\n0200");
//!
//! let parsed = file.parse_stream(&mut Cursor::new(out)).unwrap();
//! assert_eq!(parsed.head_values().get_int("count"), Some(2));
//! assert_eq!(parsed.items().len(), 2);
//! ```

mod checksum;
mod error;
mod field;
mod file;
mod record;
mod stream;
mod value;

// Re-export error types
pub use error::{ErrorKind, Result, XfwError};

// Re-export core types
pub use field::{Field, FieldKind};
pub use record::{Entry, FieldEntry, Record, RecordBuilder};
pub use value::{Value, Values};

// Re-export file layouts
pub use file::{Chunk, ConstItemType, FileChunk, FileOptions, HeadOnly, ItemCallback, Layout, RecordFile};

// Re-export stream adapters
pub use checksum::{
    ChecksumStream, Md5ChecksumStream, Sha1ChecksumStream, Sha224ChecksumStream,
    Sha256ChecksumStream, Sha384ChecksumStream, Sha512ChecksumStream,
};
pub use stream::{RecordRead, Sequential};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
