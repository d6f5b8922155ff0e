//! Escaping of arbitrary values into HTML-safe text.

use std::fmt::Display;

use kstring::KString;

/// The number of decimal places float values are rounded to before
/// being printed, unless overridden on a `Renderer`. Keeps repeating
/// expansions like `6.3333333333` out of the output.
pub const DEFAULT_FLOAT_PRECISION: u32 = 2;

/// A piece of text that is safe to insert into HTML output without
/// further escaping; either because it went through `escape_text`, or
/// because the caller explicitly vouched for it via `unsafe_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeHtml(KString);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_kstring(self) -> KString {
        self.0
    }

    pub(crate) fn from_kstring(s: KString) -> SafeHtml {
        SafeHtml(s)
    }
}

impl Display for SafeHtml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// `From<SafeHtml> for SafeHtml` comes for free and makes
// `unsafe_text` idempotent: re-wrapping safe text is a no-op.
impl From<&str> for SafeHtml {
    fn from(s: &str) -> Self {
        SafeHtml(KString::from_ref(s))
    }
}
impl From<String> for SafeHtml {
    fn from(s: String) -> Self {
        SafeHtml(KString::from_string(s))
    }
}
impl From<KString> for SafeHtml {
    fn from(s: KString) -> Self {
        SafeHtml(s)
    }
}

/// Append `s` to `out`, escaping the five characters that are unsafe
/// in HTML text and attribute values.
pub fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

const UNSAFE_CHARS: &[char] = &['&', '<', '>', '"', '\''];

pub fn escape_str(s: &str) -> SafeHtml {
    // The scan is cheaper than the allocation we'd otherwise do for
    // the common case of text without markup characters.
    if s.contains(UNSAFE_CHARS) {
        let mut out = String::with_capacity(s.len() + 8);
        escape_into(&mut out, s);
        SafeHtml(KString::from_string(out))
    } else {
        SafeHtml(KString::from_ref(s))
    }
}

/// Escape a value for insertion into HTML, stringifying it first.
/// Escaping is total: any `Display` value becomes safe text.
pub fn escape_text(value: impl Display) -> SafeHtml {
    escape_str(&value.to_string())
}

/// Mark `value` as already-safe markup, bypassing escaping. The
/// caller takes the injection risk. Passing a `SafeHtml` back in is a
/// no-op.
pub fn unsafe_text(value: impl Into<SafeHtml>) -> SafeHtml {
    value.into()
}

/// Fixed-point formatting used for float nodes; `precision` decimal
/// places, trailing zeros kept.
pub fn fmt_float(value: f64, precision: u32) -> String {
    format!("{:.*}", precision as usize, value)
}
