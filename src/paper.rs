use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SkipReason;
use crate::fields::RawEntry;
use crate::latex::clean_latex;

const FALLBACK_TITLE: &str = "No Title";

/// One bibliography record, flattened for shelf display and file
/// matching. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Citation key, trimmed. May be empty when the title carries the
    /// entry instead.
    pub id: String,
    /// Cleaned title, `"No Title"` when the entry has none.
    pub title: String,
    /// Cleaned author names, never blank.
    pub authors: Vec<String>,
    /// Publication year, `0` when unknown.
    pub year: i32,
    /// Bare attachment filename from the `file` field, `""` when absent.
    /// The resolution layer swaps this for a full path.
    pub file_name: String,
    /// Caller-supplied folder identity, stored verbatim and never
    /// dereferenced here.
    pub folder_token: String,
}

/// Builds a [`Paper`] from a tokenized entry, or reports why the entry
/// cannot stand on its own.
pub(crate) fn build_paper(entry: RawEntry, folder_token: &str) -> Result<Paper, SkipReason> {
    let RawEntry { key, fields, .. } = entry;
    let title = clean_latex(
        fields
            .get("title")
            .or_else(|| fields.get("booktitle"))
            .map(String::as_str)
            .unwrap_or(FALLBACK_TITLE),
    );
    if title == FALLBACK_TITLE && key.is_empty() {
        return Err(SkipReason::Anonymous);
    }
    let authors = split_authors(fields.get("author").map(String::as_str).unwrap_or(""));
    let year = parse_year(&fields);
    let file_name = fields
        .get("file")
        .map(|value| extract_file_name(value))
        .unwrap_or_default();
    Ok(Paper {
        id: key,
        title: squash_title_dots(&title),
        authors,
        year,
        file_name,
        folder_token: folder_token.to_owned(),
    })
}

// Author lists separate names with the word "and". Pieces are dropped
// when blank, and again when cleaning leaves nothing of them.
fn split_authors(raw: &str) -> Vec<String> {
    static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());
    AND_RE
        .split(raw)
        .filter(|piece| !piece.trim().is_empty())
        .map(clean_latex)
        .filter(|name| !name.is_empty())
        .collect()
}

// The year field wins when it parses as written; otherwise the leading
// digits of urldate (at most four) stand in, and failing that, zero.
fn parse_year(fields: &HashMap<String, String>) -> i32 {
    if let Some(year) = fields.get("year") {
        if let Ok(parsed) = year.parse() {
            return parsed;
        }
    }
    fields
        .get("urldate")
        .map(|date| {
            date.chars()
                .take_while(|c| c.is_ascii_digit())
                .take(4)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

// File fields commonly encode `description:path:type`. A trailing
// `type/subtype` segment names the attachment's MIME type, not its path,
// so it is dropped before the separator chain runs. The chain itself
// takes whatever follows the last `:`, `/` and `\`.
fn extract_file_name(file_field: &str) -> String {
    static MIME_TAIL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r":[A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+$").unwrap());
    let path_part = if file_field.matches(':').count() >= 2 {
        MIME_TAIL_RE.replace(file_field, "")
    } else {
        Cow::from(file_field)
    };
    let name = after_last(&path_part, ':');
    let name = after_last(name, '/');
    after_last(name, '\\').to_owned()
}

fn after_last(text: &str, separator: char) -> &str {
    text.rsplit(separator).next().unwrap_or(text)
}

// Titles lose their periods for display; each one melts into a single
// space together with any whitespace behind it.
fn squash_title_dots(title: &str) -> String {
    static DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s*").unwrap());
    DOT_RE.replace_all(title, " ").trim().to_owned()
}
