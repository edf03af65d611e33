use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use std::path::Path;

use super::{read_text, Document, DocumentAdapter, DocumentFormat, Segment, DEFAULT_UNTIMED_DURATION_MS};
use crate::errors::DocumentError;

// @module: SubRip parsing and rendering

// @const: SRT timestamp regex, accepts ',' or '.' before the milliseconds
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp regex is valid")
});

/// Adapter for SubRip files
#[derive(Debug, Default, Clone, Copy)]
pub struct SrtAdapter;

impl DocumentAdapter for SrtAdapter {
    fn parse(&self, path: &Path) -> Result<Document, DocumentError> {
        let content = read_text(path)?;
        let segments = parse_str(&content, path)?;
        debug!("Parsed {} SRT segments from {}", segments.len(), path.display());
        Ok(Document::new(path, DocumentFormat::Srt, segments))
    }
}

/// Parse SRT content; `path` is only used in error messages
pub fn parse_str(content: &str, path: &Path) -> Result<Vec<Segment>, DocumentError> {
    let mut segments = Vec::new();

    // (start_ms, end_ms) of the entry being read, text collected so far
    let mut timing: Option<(u64, u64)> = None;
    let mut awaiting_timestamp = false;
    let mut text = String::new();

    let parse_error = |line: usize, message: String| DocumentError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if let Some((start, end)) = timing.take() {
                segments.push(Segment::new(segments.len() + 1, start, end, text.trim_end()));
                text.clear();
            } else if awaiting_timestamp {
                return Err(parse_error(line_no, "sequence number without timestamp".to_string()));
            }
            continue;
        }

        if awaiting_timestamp {
            let caps = TIMESTAMP_REGEX
                .captures(trimmed)
                .ok_or_else(|| parse_error(line_no, format!("expected timestamp, found '{}'", trimmed)))?;
            let start = timestamp_to_ms(&caps, 1);
            let end = timestamp_to_ms(&caps, 5);
            if end < start {
                warn!("Entry at line {} ends before it starts", line_no);
            }
            timing = Some((start, end));
            awaiting_timestamp = false;
            continue;
        }

        if timing.is_some() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(trimmed);
            continue;
        }

        if trimmed.parse::<usize>().is_ok() {
            awaiting_timestamp = true;
            continue;
        }

        // Some files omit the sequence number entirely
        if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
            timing = Some((timestamp_to_ms(&caps, 1), timestamp_to_ms(&caps, 5)));
            continue;
        }

        return Err(parse_error(line_no, format!("unexpected text '{}'", trimmed)));
    }

    if awaiting_timestamp {
        return Err(parse_error(content.lines().count(), "truncated entry".to_string()));
    }

    if let Some((start, end)) = timing {
        segments.push(Segment::new(segments.len() + 1, start, end, text.trim_end()));
    }

    if segments.is_empty() {
        return Err(parse_error(1, "no subtitle entries found".to_string()));
    }

    Ok(segments)
}

fn timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |i: usize| -> u64 { caps.get(start_idx + i).map_or(0, |m| m.as_str().parse().unwrap_or(0)) };
    part(0) * 3_600_000 + part(1) * 60_000 + part(2) * 1_000 + part(3)
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Render segments as SRT text, numbering entries sequentially
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let start = segment.start_time_ms.unwrap_or(0);
        let end = segment
            .end_time_ms
            .unwrap_or(start + DEFAULT_UNTIMED_DURATION_MS);

        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(out, "{} --> {}", format_timestamp(start), format_timestamp(end));
        let _ = writeln!(out, "{}", segment.text);
        out.push('\n');
    }

    out
}
