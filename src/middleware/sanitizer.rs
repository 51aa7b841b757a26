//! Input sanitization for form field values
//!
//! Every function here is total and idempotent: applying it twice gives the
//! same result as applying it once.

use crate::forms::{FieldFormat, FieldValues, FormSchema};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Maximum length of a sanitized free-text value, in characters
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Maximum length of an email address (RFC 5321)
pub const MAX_EMAIL_CHARS: usize = 254;

fn script_scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // ASCII-only case folding
        Regex::new(r"(?i-u)javascript:|data:").expect("script scheme pattern is valid")
    })
}

/// Cut `input` to at most `max_chars` characters
fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

fn strip_injection(input: &str) -> String {
    let without_brackets: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    script_scheme_pattern()
        .replace_all(&without_brackets, "")
        .into_owned()
}

/// Sanitize a free-text value.
///
/// Removes `<` and `>`, removes `javascript:` and `data:` in any letter case
/// wherever they appear, trims surrounding whitespace and bounds the result to
/// [`MAX_TEXT_CHARS`] characters.
pub fn sanitize_text(input: &str) -> String {
    // A removal can splice a new match together ("java<script:"), so repeat
    // until nothing changes. Each productive pass shortens the string.
    let mut current = strip_injection(input);
    loop {
        let next = strip_injection(&current);
        if next == current {
            break;
        }
        current = next;
    }

    truncate_chars(current.trim(), MAX_TEXT_CHARS)
        .trim_end()
        .to_string()
}

/// Normalize an email address: trim, lowercase, bound to [`MAX_EMAIL_CHARS`].
///
/// Does not check the format; that is the validator's job.
pub fn sanitize_email(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    truncate_chars(&lowered, MAX_EMAIL_CHARS).trim_end().to_string()
}

/// Normalize a URL, keeping only absolute `http` and `https` URLs.
///
/// Anything else, including `javascript:` and `data:` URLs, becomes empty.
pub fn sanitize_url(input: &str) -> String {
    match Url::parse(input.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.into(),
        _ => String::new(),
    }
}

/// Sanitize every value of a submission according to its declared format.
///
/// Keys and their order are preserved; fields the schema does not declare are
/// treated as free text.
pub fn sanitize_fields(schema: &FormSchema, fields: &FieldValues) -> FieldValues {
    fields
        .iter()
        .map(|(name, value)| {
            let format = schema.field(name).map(|rule| rule.format).unwrap_or_default();
            let clean = match format {
                FieldFormat::Email => sanitize_email(value),
                FieldFormat::Url => sanitize_url(value),
                FieldFormat::Freeform => sanitize_text(value),
            };
            (name.clone(), clean)
        })
        .collect()
}
