use once_cell::sync::Lazy;
use regex::Regex;

// Umlaut digraphs handled before generic command stripping eats the
// backslash. Ordering within the table does not matter, the patterns are
// disjoint.
const UMLAUT_DIGRAPHS: [(&str, &str); 6] = [
    ("\\\"u", "ü"),
    ("\\\"a", "ä"),
    ("\\\"o", "ö"),
    ("\\\"U", "Ü"),
    ("\\\"A", "Ä"),
    ("\\\"O", "Ö"),
];

/// Reduces LaTeX-flavored field text to plain display text.
///
/// The passes run in a fixed order: one surrounding brace layer is
/// dropped, umlaut digraphs become their unicode letters, backslash
/// commands collapse to spaces, inline math is removed, whitespace is
/// normalized and the leftover markup characters are stripped. The
/// function is idempotent, cleaning already-clean text changes nothing.
pub fn clean_latex(raw: &str) -> String {
    static COMMAND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[a-zA-Z]+").unwrap());
    static MATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[^$]*\$").unwrap());
    static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[{}&%$#_^~]+").unwrap());

    let mut text = strip_outer_braces(raw).to_owned();
    for (digraph, letter) in UMLAUT_DIGRAPHS {
        text = text.replace(digraph, letter);
    }
    let text = COMMAND_RE.replace_all(&text, " ");
    let text = MATH_RE.replace_all(&text, "");
    // Second sweep for command remnants; anything still matching here is
    // removed outright rather than spaced.
    let text = COMMAND_RE.replace_all(&text, "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = text.trim();
    MARKUP_RE.replace_all(text, "").into_owned()
}

// Drops exactly one brace layer, and only when the string carries both
// ends. `{a} and {b}` keeps its inner braces.
fn strip_outer_braces(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('{') && text.ends_with('}') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
