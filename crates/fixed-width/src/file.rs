//! Header/items files.
//!
//! A file is one head chunk followed by a number of item chunks that the head
//! determines:
//!
//! ```text
//! FILE: HEAD [SEP ITEM [SEP ITEM [...]]] [SEP]
//! ```
//!
//! Separators sit strictly between chunks; the final one is only present
//! when [`FileOptions::trailing_separator`] is set. Heads and items are
//! [`Layout`]s: flat records, or nested files for multi-level structures.
//!
//! An [`ItemCallback`] decides, from the parsed head, how many items follow
//! and what they look like. [`HeadOnly`] and [`ConstItemType`] cover the
//! common shapes; closures work for anything else.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Result, XfwError};
use crate::record::Record;
use crate::stream::RecordRead;
use crate::value::{Value, Values};

/// Something that parses and generates one chunk.
#[derive(Debug, Clone)]
pub enum Layout {
    Record(Arc<Record>),
    File(Arc<RecordFile>),
}

impl Layout {
    /// Parse one chunk from `stream`.
    pub fn parse_stream<R: RecordRead + ?Sized>(&self, stream: &mut R) -> Result<Chunk> {
        match self {
            Self::Record(record) => record.parse_stream(stream).map(Chunk::Record),
            Self::File(file) => file.parse_stream(stream).map(Chunk::File),
        }
    }

    /// Generate one chunk into `stream`.
    pub fn generate_stream<W: Write + ?Sized>(&self, stream: &mut W, chunk: &Chunk) -> Result<()> {
        match (self, chunk) {
            (Self::Record(record), Chunk::Record(values)) => record.generate_stream(stream, values),
            (Self::File(file), Chunk::File(data)) => file.generate_stream(stream, data),
            (Self::Record(_), other) => Err(XfwError::TypeMismatch {
                expected: "record",
                found: other.type_name(),
            }),
            (Self::File(_), other) => Err(XfwError::TypeMismatch {
                expected: "file",
                found: other.type_name(),
            }),
        }
    }
}

impl From<Record> for Layout {
    fn from(record: Record) -> Self {
        Self::Record(Arc::new(record))
    }
}

impl From<RecordFile> for Layout {
    fn from(file: RecordFile) -> Self {
        Self::File(Arc::new(file))
    }
}

impl From<Arc<Record>> for Layout {
    fn from(record: Arc<Record>) -> Self {
        Self::Record(record)
    }
}

impl From<Arc<RecordFile>> for Layout {
    fn from(file: Arc<RecordFile>) -> Self {
        Self::File(file)
    }
}

/// Parsed content of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Record(Values),
    File(FileChunk),
}

impl Chunk {
    /// Values of the leading record: the record itself, or the innermost
    /// head of a nested file.
    #[must_use]
    pub fn head_values(&self) -> &Values {
        match self {
            Self::Record(values) => values,
            Self::File(file) => file.head.head_values(),
        }
    }

    /// Mutable access to [`Chunk::head_values`].
    pub fn head_values_mut(&mut self) -> &mut Values {
        match self {
            Self::Record(values) => values,
            Self::File(file) => file.head.head_values_mut(),
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&Values> {
        match self {
            Self::Record(values) => Some(values),
            Self::File(_) => None,
        }
    }

    #[must_use]
    pub fn as_file(&self) -> Option<&FileChunk> {
        match self {
            Self::Record(_) => None,
            Self::File(file) => Some(file),
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Record(_) => "record",
            Self::File(_) => "file",
        }
    }
}

impl From<Values> for Chunk {
    fn from(values: Values) -> Self {
        Self::Record(values)
    }
}

impl From<FileChunk> for Chunk {
    fn from(file: FileChunk) -> Self {
        Self::File(file)
    }
}

/// Parsed content of a file: its head and, when the head declares any, its
/// items.
#[derive(Debug, Clone, PartialEq)]
pub struct FileChunk {
    pub head: Box<Chunk>,
    pub items: Option<Vec<Chunk>>,
}

impl FileChunk {
    /// A file with no items.
    #[must_use]
    pub fn new(head: impl Into<Chunk>) -> Self {
        Self {
            head: Box::new(head.into()),
            items: None,
        }
    }

    /// A file with items.
    #[must_use]
    pub fn with_items(head: impl Into<Chunk>, items: Vec<Chunk>) -> Self {
        Self {
            head: Box::new(head.into()),
            items: Some(items),
        }
    }

    /// See [`Chunk::head_values`].
    #[must_use]
    pub fn head_values(&self) -> &Values {
        self.head.head_values()
    }

    /// Items, or an empty slice.
    #[must_use]
    pub fn items(&self) -> &[Chunk] {
        self.items.as_deref().unwrap_or_default()
    }
}

/// Resolves the items that follow a head.
///
/// `items` is `None` while parsing and carries the items to write while
/// generating. The returned count is ignored when generating; callbacks may
/// instead update `head` before it is generated.
pub trait ItemCallback: Send + Sync {
    fn resolve(&self, head: &mut Chunk, items: Option<&[Chunk]>) -> Result<(usize, Option<Layout>)>;
}

impl<F> ItemCallback for F
where
    F: Fn(&mut Chunk, Option<&[Chunk]>) -> Result<(usize, Option<Layout>)> + Send + Sync,
{
    fn resolve(&self, head: &mut Chunk, items: Option<&[Chunk]>) -> Result<(usize, Option<Layout>)> {
        self(head, items)
    }
}

/// Callback for files that hold nothing but a head.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadOnly;

impl ItemCallback for HeadOnly {
    fn resolve(&self, _head: &mut Chunk, items: Option<&[Chunk]>) -> Result<(usize, Option<Layout>)> {
        if items.is_some() {
            return Err(XfwError::ItemsNotAllowed);
        }
        Ok((0, None))
    }
}

/// Callback for files whose items all share one layout and whose head holds
/// the item count.
#[derive(Debug, Clone)]
pub struct ConstItemType {
    count_id: String,
    item: Layout,
}

impl ConstItemType {
    pub fn new(count_id: impl Into<String>, item: impl Into<Layout>) -> Self {
        Self {
            count_id: count_id.into(),
            item: item.into(),
        }
    }

    #[must_use]
    pub fn count_id(&self) -> &str {
        &self.count_id
    }

    #[must_use]
    pub fn item(&self) -> &Layout {
        &self.item
    }

    fn read_count(&self, head: &Values) -> Result<usize> {
        let invalid = |value: &Value| XfwError::InvalidItemCount {
            id: self.count_id.clone(),
            value: value.to_string(),
        };
        match head.get(&self.count_id) {
            None => Ok(0),
            Some(value @ Value::Int(n)) => usize::try_from(*n).map_err(|_| invalid(value)),
            Some(value @ Value::Str(s)) => s.trim().parse::<usize>().map_err(|_| invalid(value)),
            Some(other) => Err(invalid(other)),
        }
    }
}

impl ItemCallback for ConstItemType {
    fn resolve(&self, head: &mut Chunk, items: Option<&[Chunk]>) -> Result<(usize, Option<Layout>)> {
        let values = head.head_values_mut();
        if let Some(items) = items {
            let count = i64::try_from(items.len()).map_err(|_| XfwError::InvalidItemCount {
                id: self.count_id.clone(),
                value: items.len().to_string(),
            })?;
            values.set(self.count_id.as_str(), count);
        }
        Ok((self.read_count(values)?, Some(self.item.clone())))
    }
}

/// Options for parsing and generating files.
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// Expect (parse) or emit (generate) one more separator after the last
    /// chunk (default: false).
    pub trailing_separator: bool,
}

impl FileOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect or emit a trailing separator.
    #[must_use]
    pub fn with_trailing_separator(mut self, trailing: bool) -> Self {
        self.trailing_separator = trailing;
        self
    }
}

/// A header/items file layout.
#[derive(Clone)]
pub struct RecordFile {
    head: Layout,
    callback: Arc<dyn ItemCallback>,
    separator: String,
}

impl fmt::Debug for RecordFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordFile")
            .field("head", &self.head)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

impl RecordFile {
    /// Create a file layout with a custom item callback.
    pub fn new(
        head: impl Into<Layout>,
        callback: impl ItemCallback + 'static,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            callback: Arc::new(callback),
            separator: separator.into(),
        }
    }

    /// A file holding only a head.
    pub fn head_only(head: impl Into<Layout>, separator: impl Into<String>) -> Self {
        Self::new(head, HeadOnly, separator)
    }

    /// A file whose items share `item` and whose head field `count_id` holds
    /// their number.
    ///
    /// `count_id` and `item` must be given together; without both the file
    /// holds only a head.
    pub fn const_item_type(
        head: impl Into<Layout>,
        count_id: Option<&str>,
        item: Option<Layout>,
        separator: impl Into<String>,
    ) -> Result<Self> {
        match (count_id, item) {
            (Some(count_id), Some(item)) => Ok(Self::new(
                head,
                ConstItemType::new(count_id, item),
                separator,
            )),
            (None, None) => Ok(Self::head_only(head, separator)),
            _ => Err(XfwError::InconsistentItemLayout),
        }
    }

    #[must_use]
    pub fn head(&self) -> &Layout {
        &self.head
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Parse a file from `stream`.
    pub fn parse_stream<R: RecordRead + ?Sized>(&self, stream: &mut R) -> Result<FileChunk> {
        self.parse_stream_with_options(stream, &FileOptions::default())
    }

    /// Parse a file from `stream` with options.
    pub fn parse_stream_with_options<R: RecordRead + ?Sized>(
        &self,
        stream: &mut R,
        options: &FileOptions,
    ) -> Result<FileChunk> {
        let mut head = self.head.parse_stream(stream)?;
        let (count, item) = self.callback.resolve(&mut head, None)?;
        debug!(count, "parsed file head");

        let items = if count == 0 {
            None
        } else {
            let item = item.ok_or(XfwError::MissingItemLayout { count })?;
            self.eat_separator(stream)?;
            let mut items = Vec::new();
            for index in 0..count {
                if index > 0 {
                    self.eat_separator(stream)?;
                }
                trace!(index, "parsing item");
                items.push(item.parse_stream(stream)?);
            }
            Some(items)
        };

        if options.trailing_separator {
            self.eat_separator(stream)?;
        }
        Ok(FileChunk {
            head: Box::new(head),
            items,
        })
    }

    /// Generate `data` into `stream`.
    pub fn generate_stream<W: Write + ?Sized>(&self, stream: &mut W, data: &FileChunk) -> Result<()> {
        self.generate_stream_with_options(stream, data, &FileOptions::default())
    }

    /// Generate `data` into `stream` with options.
    ///
    /// The callback may update the head (an item count, say) before it is
    /// written; `data` itself is left untouched. Bytes already written stay
    /// written when a later chunk fails.
    pub fn generate_stream_with_options<W: Write + ?Sized>(
        &self,
        stream: &mut W,
        data: &FileChunk,
        options: &FileOptions,
    ) -> Result<()> {
        let mut head = (*data.head).clone();
        let (_, item) = self.callback.resolve(&mut head, data.items.as_deref())?;
        self.head.generate_stream(stream, &head)?;

        let items = data.items();
        debug!(count = items.len(), "generating file");
        if !items.is_empty() {
            let item = item.ok_or(XfwError::MissingItemLayout { count: items.len() })?;
            stream.write_all(self.separator.as_bytes())?;
            for (index, chunk) in items.iter().enumerate() {
                if index > 0 {
                    stream.write_all(self.separator.as_bytes())?;
                }
                item.generate_stream(stream, chunk)?;
            }
        }

        if options.trailing_separator {
            stream.write_all(self.separator.as_bytes())?;
        }
        Ok(())
    }

    /// Consume one separator, reporting where a wrong one was found.
    fn eat_separator<R: RecordRead + ?Sized>(&self, stream: &mut R) -> Result<()> {
        let found = stream.read_chunk(self.separator.len())?;
        if found != self.separator.as_bytes() {
            let offset = stream
                .position()
                .map(|position| position.saturating_sub(found.len() as u64));
            let found = String::from_utf8_lossy(&found).into_owned();
            warn!(?offset, expected = %self.separator, %found, "unexpected separator");
            return Err(XfwError::separator_mismatch(
                self.separator.as_str(),
                found,
                offset,
            ));
        }
        Ok(())
    }
}
