/*!
 * Tests for language utility functions
 */

use polysub::language_utils::{
    self, base_code, display_name, get_language_name, language_codes_match, normalize_to_part2t,
    validate_language_code, LanguageCodeType,
};

/// Test language code validation
#[test]
fn test_validate_language_code_withVariousCodes_shouldClassifyCorrectly() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("fra").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B);
    assert_eq!(validate_language_code("zh-CN").unwrap(), LanguageCodeType::Part1);

    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("english").is_err());
}

/// Test normalization to ISO 639-2/T
#[test]
fn test_normalize_to_part2t_withEquivalentCodes_shouldMatch() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("pt-BR").unwrap(), "por");
    assert!(normalize_to_part2t("invalid").is_err());
}

/// Test language code matching across code systems
#[test]
fn test_language_codes_match_withDifferentForms_shouldMatchSameLanguage() {
    assert!(language_codes_match("de", "deu"));
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("zh-CN", "zho"));
    assert!(!language_codes_match("de", "fr"));
    assert!(!language_codes_match("de", "invalid"));
}

/// Test English names
#[test]
fn test_get_language_name_withValidCode_shouldReturnName() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert!(get_language_name("invalid").is_err());
}

/// Test names used in output filenames
#[test]
fn test_display_name_withTableAndIsoCodes_shouldPreferTable() {
    assert_eq!(display_name("tl"), "Filipino");
    assert_eq!(display_name("zh-CN"), "Chinese");
    assert_eq!(display_name("fa"), "Persian");
    assert_eq!(display_name("fr"), "French");
    assert_eq!(display_name("xx"), "xx");
}

/// Test that every default target language is valid
#[test]
fn test_default_target_languages_shouldAllValidate() {
    assert_eq!(language_utils::DEFAULT_TARGET_LANGUAGES.len(), 16);
    for (name, code) in language_utils::DEFAULT_TARGET_LANGUAGES {
        assert!(validate_language_code(code).is_ok(), "{} ({}) should be valid", name, code);
    }
    assert_eq!(base_code("zh-CN"), "zh");
}
