//! Language utilities for ISO language code handling
//!
//! Provider language codes are ISO 639-1 or ISO 639-2 codes, optionally
//! followed by a region or script suffix (`zh-CN`, `pt-BR`). Only the base
//! code is validated; the suffix is passed to the provider untouched.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// Default target languages as (display name, provider code)
pub const DEFAULT_TARGET_LANGUAGES: &[(&str, &str)] = &[
    ("Spanish", "es"),
    ("Dutch", "nl"),
    ("Russian", "ru"),
    ("German", "de"),
    ("Turkish", "tr"),
    ("Chinese", "zh-CN"),
    ("Japanese", "ja"),
    ("Persian", "fa"),
    ("Portuguese", "pt"),
    ("Arabic", "ar"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("Malayalam", "ml"),
    ("Bengali", "bn"),
    ("Indonesian", "id"),
    ("Filipino", "tl"),
];

// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Base language part of a code (`zh-CN` -> `zh`), lowercased
pub fn base_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let base = base_code(code);

    if base.len() == 2 && Language::from_639_1(&base).is_some() {
        return Ok(LanguageCodeType::Part1);
    }

    if base.len() == 3 {
        if Language::from_639_3(&base).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if part2b_to_part2t(&base).is_some() {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let base = base_code(code);

    if base.len() == 2 {
        if let Some(lang) = Language::from_639_1(&base) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if base.len() == 3 {
        if Language::from_639_3(&base).is_some() {
            return Ok(base);
        }
        if let Some(part2t) = part2b_to_part2t(&base) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Name used in output filenames.
///
/// The default table wins so `tl` stays "Filipino" and `zh-CN` "Chinese";
/// unknown codes fall back to the code itself.
pub fn display_name(code: &str) -> String {
    let trimmed = code.trim();
    if let Some((name, _)) = DEFAULT_TARGET_LANGUAGES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(trimmed))
    {
        return (*name).to_string();
    }

    get_language_name(trimmed).unwrap_or_else(|_| trimmed.to_string())
}
