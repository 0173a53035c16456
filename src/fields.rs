use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SkipReason;

/// One segmented entry, tokenized but not yet cleaned.
///
/// `fields` maps lowercased field names to their raw values. Duplicated
/// names keep the last value seen. `kind` is the entry-type tag as
/// written; it stops here and never reaches the record model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub(crate) kind: String,
    pub(crate) key: String,
    pub(crate) fields: HashMap<String, String>,
}

/// Tokenizes one entry block into a [`RawEntry`].
///
/// The header has to look like `@type{key,` at the start of the block.
/// The field region runs from the header's comma to the last `}` of the
/// block; whatever sits outside it is ignored. Anything that goes wrong
/// inside the region ends the scan but keeps the fields parsed so far.
pub(crate) fn tokenize_entry(block: &str) -> Result<RawEntry, SkipReason> {
    static HEADER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^@([A-Za-z]+)\s*\{\s*([^,]+),").unwrap());

    let header = HEADER_RE
        .captures(block)
        .ok_or(SkipReason::MalformedHeader)?;
    let header_end = header.get(0).map_or(0, |m| m.end());
    let region_end = match block.rfind('}') {
        Some(index) if header_end < index => index,
        _ => return Err(SkipReason::NoFields),
    };
    Ok(RawEntry {
        kind: header[1].to_owned(),
        key: header[2].trim().to_owned(),
        fields: tokenize_fields(&block[header_end..region_end]),
    })
}

fn tokenize_fields(region: &str) -> HashMap<String, String> {
    static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z0-9_-]+)\s*=\s*").unwrap());

    let bytes = region.as_bytes();
    let mut fields = HashMap::new();
    let mut cursor = 0;
    while cursor < region.len() {
        // Unanchored search, so junk between fields is skipped along the
        // way instead of ending the scan.
        let caps = match KEY_RE.captures(&region[cursor..]) {
            Some(caps) => caps,
            None => break,
        };
        let name = caps[1].to_ascii_lowercase();
        let mut value_start = cursor + caps.get(0).map_or(0, |m| m.end());
        while value_start < bytes.len() && bytes[value_start].is_ascii_whitespace() {
            value_start += 1;
        }
        if value_start >= bytes.len() {
            break;
        }
        let (value, resume) = match bytes[value_start] {
            b'{' => match scan_braced(region, value_start) {
                Some(scanned) => scanned,
                // Unterminated value: keep what was parsed so far.
                None => break,
            },
            b'"' => match scan_quoted(region, value_start) {
                Some(scanned) => scanned,
                None => break,
            },
            _ => scan_bare(region, value_start),
        };
        fields.insert(name, value);
        cursor = resume;
        while cursor < bytes.len()
            && (bytes[cursor] == b',' || bytes[cursor].is_ascii_whitespace())
        {
            cursor += 1;
        }
    }
    fields
}

// Scans a `{...}` value starting at the opening brace. Braces directly
// preceded by a backslash do not count toward the nesting depth.
fn scan_braced(region: &str, open: usize) -> Option<(String, usize)> {
    let bytes = region.as_bytes();
    let mut depth = 0;
    let mut pos = open + 1;
    while pos < bytes.len() {
        let escaped = pos > 0 && bytes[pos - 1] == b'\\';
        match bytes[pos] {
            b'{' if !escaped => depth += 1,
            b'}' if !escaped => {
                if depth == 0 {
                    return Some((region[open + 1..pos].to_owned(), pos + 1));
                }
                depth -= 1;
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

// Scans a `"..."` value. A quote behind an odd run of backslashes is
// escaped text, not the terminator; `\"` is unescaped in the result.
fn scan_quoted(region: &str, open: usize) -> Option<(String, usize)> {
    let bytes = region.as_bytes();
    let mut escaped = false;
    let mut pos = open + 1;
    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte == b'"' && !escaped {
            let value = region[open + 1..pos].replace("\\\"", "\"");
            return Some((value, pos + 1));
        }
        escaped = byte == b'\\' && !escaped;
        pos += 1;
    }
    None
}

// Bare values run to the next unescaped comma or the end of the region.
fn scan_bare(region: &str, start: usize) -> (String, usize) {
    let bytes = region.as_bytes();
    let mut pos = start;
    while pos < bytes.len() {
        if bytes[pos] == b',' && (pos == 0 || bytes[pos - 1] != b'\\') {
            break;
        }
        pos += 1;
    }
    (region[start..pos].trim().to_owned(), pos)
}
