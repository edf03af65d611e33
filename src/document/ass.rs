use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::{read_text, Document, DocumentAdapter, DocumentFormat, Segment};
use crate::errors::DocumentError;

// @module: Advanced SubStation Alpha parsing; output is written as SRT

// @const: override blocks such as {\i1} or {\pos(10,20)}
static OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").expect("override regex is valid"));

/// Adapter for ASS/SSA files
#[derive(Debug, Default, Clone, Copy)]
pub struct AssAdapter;

impl DocumentAdapter for AssAdapter {
    fn parse(&self, path: &Path) -> Result<Document, DocumentError> {
        let content = read_text(path)?;
        let segments = parse_str(&content, path)?;
        debug!("Parsed {} ASS events from {}", segments.len(), path.display());
        Ok(Document::new(path, DocumentFormat::Ass, segments))
    }
}

/// Parse the `[Events]` section of an ASS script into segments
pub fn parse_str(content: &str, path: &Path) -> Result<Vec<Segment>, DocumentError> {
    let parse_error = |line: usize, message: &str| DocumentError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    };

    let mut in_events = false;
    let mut seen_events = false;
    let mut columns: Option<Vec<String>> = None;
    let mut segments = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.starts_with('[') && line.ends_with(']') {
            in_events = line.eq_ignore_ascii_case("[events]");
            seen_events |= in_events;
            continue;
        }

        if !in_events || line.is_empty() || line.starts_with(';') {
            continue;
        }

        let Some((kind, rest)) = line.split_once(':') else {
            continue;
        };

        match kind.trim() {
            "Format" => {
                columns = Some(rest.split(',').map(|c| c.trim().to_lowercase()).collect());
            }
            "Dialogue" => {
                let cols = columns
                    .as_ref()
                    .ok_or_else(|| parse_error(line_no, "Dialogue before Format line"))?;
                let fields: Vec<&str> = rest.trim_start().splitn(cols.len(), ',').collect();
                if fields.len() != cols.len() {
                    return Err(parse_error(line_no, "Dialogue line has too few fields"));
                }

                let field = |name: &str| cols.iter().position(|c| c == name).map(|i| fields[i]);
                let start = field("start")
                    .and_then(parse_time)
                    .ok_or_else(|| parse_error(line_no, "invalid Start time"))?;
                let end = field("end")
                    .and_then(parse_time)
                    .ok_or_else(|| parse_error(line_no, "invalid End time"))?;
                let text = field("text").ok_or_else(|| parse_error(line_no, "missing Text column"))?;

                segments.push(Segment::new(segments.len() + 1, start, end, clean_text(text)));
            }
            // Comment and other event kinds are not displayed
            _ => {}
        }
    }

    if !seen_events {
        return Err(parse_error(1, "no [Events] section"));
    }

    Ok(segments)
}

/// Parse `H:MM:SS.CC` into milliseconds
fn parse_time(value: &str) -> Option<u64> {
    let mut parts = value.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let (secs, frac) = parts.next()?.split_once('.')?;
    let seconds: u64 = secs.parse().ok()?;

    // Centiseconds in practice, but tolerate other precisions
    let frac_ms = match frac.len() {
        1 => frac.parse::<u64>().ok()? * 100,
        2 => frac.parse::<u64>().ok()? * 10,
        3 => frac.parse::<u64>().ok()?,
        _ => return None,
    };

    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + frac_ms)
}

/// Turn ASS markup into plain subtitle text
fn clean_text(text: &str) -> String {
    let stripped = OVERRIDE_REGEX.replace_all(text, "");
    stripped
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ")
        .trim()
        .to_string()
}
