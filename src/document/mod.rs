/*!
 * Document model and format adapters.
 *
 * A document is the ordered list of segments parsed from one input file.
 * Each supported input format has an adapter implementing
 * [`DocumentAdapter`]; the adapter is chosen once per file through
 * [`DocumentFormat::detect`]. Every format is written back out as SRT.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::DocumentError;

pub mod ass;
pub mod plain;
pub mod srt;

pub use ass::AssAdapter;
pub use plain::PlainTextAdapter;
pub use srt::SrtAdapter;

/// Duration given to untimed segments when they are written as SRT
pub const DEFAULT_UNTIMED_DURATION_MS: u64 = 10_000;

/// One unit of translatable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 1-based position in the document
    pub index: usize,

    /// Start time in ms, absent for plain text
    pub start_time_ms: Option<u64>,

    /// End time in ms, absent for plain text
    pub end_time_ms: Option<u64>,

    /// Text to translate
    pub text: String,
}

impl Segment {
    /// Create a timed segment
    pub fn new(index: usize, start_time_ms: u64, end_time_ms: u64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_time_ms: Some(start_time_ms),
            end_time_ms: Some(end_time_ms),
            text: text.into(),
        }
    }

    /// Create a segment without timing
    pub fn untimed(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            start_time_ms: None,
            end_time_ms: None,
            text: text.into(),
        }
    }

    /// Whether there is nothing to translate
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Ordered segments parsed from one file
#[derive(Debug, Clone)]
pub struct Document {
    /// File the document was parsed from
    pub source_path: PathBuf,

    /// Format the file was parsed as
    pub format: DocumentFormat,

    /// Segments in file order
    pub segments: Vec<Segment>,
}

impl Document {
    /// Create a document from already parsed segments
    pub fn new(source_path: impl Into<PathBuf>, format: DocumentFormat, segments: Vec<Segment>) -> Self {
        Self {
            source_path: source_path.into(),
            format,
            segments,
        }
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the document has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment texts in order
    pub fn texts(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.text.clone()).collect()
    }

    /// Copy of this document with its texts replaced, timing untouched
    pub fn with_texts(&self, texts: &[String]) -> Self {
        let mut copy = self.clone();
        for (segment, text) in copy.segments.iter_mut().zip(texts) {
            segment.text.clone_from(text);
        }
        copy
    }
}

/// Byte encoding for written files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputEncoding {
    /// Plain UTF-8
    #[default]
    Utf8,
    /// UTF-8 with a byte order mark, for players that need it
    Utf8Bom,
}

impl OutputEncoding {
    /// Encode rendered text
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf8Bom => {
                let mut bytes = Vec::with_capacity(text.len() + 3);
                bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
        }
    }
}

/// Capability set every input format provides
pub trait DocumentAdapter: Send + Sync {
    /// Parse a file into a document
    fn parse(&self, path: &Path) -> Result<Document, DocumentError>;

    /// Render a document as an SRT file in the requested encoding
    fn serialize(&self, document: &Document, encoding: OutputEncoding) -> Vec<u8> {
        encoding.encode(&srt::render(&document.segments))
    }

    /// Extension of the serialized output
    fn output_extension(&self) -> &'static str {
        "srt"
    }
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// SubRip (.srt, or .txt with SRT content)
    Srt,
    /// Advanced SubStation Alpha (.ass)
    Ass,
    /// Plain text (.txt)
    PlainText,
}

static SRT_ADAPTER: SrtAdapter = SrtAdapter;
static ASS_ADAPTER: AssAdapter = AssAdapter;
static PLAIN_ADAPTER: PlainTextAdapter = PlainTextAdapter;

impl DocumentFormat {
    /// Pick the format of a file from its extension, sniffing `.txt` files
    pub fn detect(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "srt" => Ok(Self::Srt),
            "ass" | "ssa" => Ok(Self::Ass),
            "txt" => {
                if looks_like_srt(path)? {
                    Ok(Self::Srt)
                } else {
                    Ok(Self::PlainText)
                }
            }
            _ => Err(DocumentError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Whether lines of this format may start with a speaker label
    pub fn carries_speaker_labels(&self) -> bool {
        matches!(self, Self::Srt | Self::Ass)
    }

    /// The adapter for this format
    pub fn adapter(&self) -> &'static dyn DocumentAdapter {
        match self {
            Self::Srt => &SRT_ADAPTER,
            Self::Ass => &ASS_ADAPTER,
            Self::PlainText => &PLAIN_ADAPTER,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Srt => write!(f, "SRT"),
            Self::Ass => write!(f, "ASS"),
            Self::PlainText => write!(f, "plain text"),
        }
    }
}

/// A `.txt` file is SRT when its first line is a number and the second holds `-->`
fn looks_like_srt(path: &Path) -> Result<bool, DocumentError> {
    let file = std::fs::File::open(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = BufReader::new(file).lines();

    let first = match lines.next() {
        Some(Ok(line)) => line,
        _ => return Ok(false),
    };
    let second = match lines.next() {
        Some(Ok(line)) => line,
        _ => return Ok(false),
    };

    let first = first.trim_start_matches('\u{feff}').trim();
    Ok(!first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) && second.contains("-->"))
}

/// Read a whole file as text, dropping a UTF-8 byte order mark
pub(crate) fn read_text(path: &Path) -> Result<String, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.trim_start_matches('\u{feff}').to_string())
}
