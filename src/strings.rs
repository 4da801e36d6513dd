//! `pass.strings` translation files
//!
//! One `"placeholder" = "translation";` pair per line. `/* ... */` and `//`
//! comments (whole-line or trailing a pair) and blank lines are skipped on
//! parse; quotes, backslashes and newlines are escaped on write.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

/// Name of the translation file inside every `<lang>.lproj` folder
pub const STRINGS_FILE_NAME: &str = "pass.strings";

static STRINGS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*"((?:[^"\\]|\\.)*)"\s*=\s*"((?:[^"\\]|\\.)*)"\s*;\s*(?P<comment>/\*.*|//.*)?$"#,
    )
    .expect("valid strings line pattern")
});

static LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid language code pattern"));

static STRINGS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+)\.lproj/pass\.strings$").expect("valid strings path pattern")
});

/// Whether `lang` can name a `<lang>.lproj` folder, e.g. `it`, `zh-Hans`, `es-419`
pub fn is_valid_language(lang: &str) -> bool {
    LANGUAGE_CODE.is_match(lang)
}

/// Folder holding the localized resources for `lang`
pub fn lproj_folder(lang: &str) -> String {
    format!("{}.lproj/", lang)
}

/// Path of the translation file for `lang`
pub fn strings_path(lang: &str) -> String {
    format!("{}{}", lproj_folder(lang), STRINGS_FILE_NAME)
}

/// Language code of a `<lang>.lproj/pass.strings` path, if it is one
pub fn language_of(path: &str) -> Option<&str> {
    STRINGS_PATH
        .captures(path)
        .and_then(|captures| captures.get(1))
        .map(|lang| lang.as_str())
}

/// Parse translation pairs, skipping comments and unparsable lines
pub fn parse(data: &[u8]) -> BTreeMap<String, String> {
    let text = String::from_utf8_lossy(data);
    let text = text.trim_start_matches('\u{feff}');

    let mut translations = BTreeMap::new();
    let mut in_comment = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if in_comment {
            if trimmed.contains("*/") {
                in_comment = false;
            }
            continue;
        }

        if trimmed.starts_with("/*") {
            in_comment = !trimmed.contains("*/");
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        match STRINGS_LINE.captures(trimmed) {
            Some(captures) => {
                translations.insert(unescape(&captures[1]), unescape(&captures[2]));
                // A trailing block comment may continue on the following lines
                if let Some(comment) = captures.name("comment") {
                    let comment = comment.as_str();
                    in_comment = comment.starts_with("/*") && !comment.contains("*/");
                }
            }
            None => debug!("Skipping unparsable strings line: {}", trimmed),
        }
    }

    translations
}

/// Serialize translation pairs, one per line
pub fn serialize(translations: &BTreeMap<String, String>) -> Vec<u8> {
    let mut out = String::new();
    for (placeholder, value) in translations {
        out.push_str(&format!("\"{}\" = \"{}\";\n", escape(placeholder), escape(value)));
    }
    out.into_bytes()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
