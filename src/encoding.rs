//! Encoding labels and byte-to-text coercion.
//!
//! The affix file declares its own encoding with the `SET` command and the
//! word-list file inherits it. Everything inside the crate is `String`, so
//! the only place an encoding matters is when a raw input line is decoded.

use std::borrow::Cow;

/// A case-normalized encoding label from a `SET` command.
///
/// Labels are upper-cased ASCII-wise and the common `UTF8` misspelling is
/// collapsed to `UTF-8`. An empty label means no `SET` command was seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    name: String,
}

impl Encoding {
    pub fn new(label: &str) -> Self {
        let mut name = label.to_ascii_uppercase();
        if name == "UTF8" {
            name = String::from("UTF-8");
        }
        Self { name }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_utf8(&self) -> bool {
        self.name == "UTF-8"
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl From<&str> for Encoding {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Removes a UTF-8 byte order mark from the front of `line`, if present.
///
/// Anything that is not exactly `EF BB BF` — including inputs shorter than
/// three bytes — is returned unchanged. Only the first line of a file may
/// carry a BOM.
pub(crate) fn strip_bom(line: &[u8]) -> &[u8] {
    match line.strip_prefix(b"\xEF\xBB\xBF") {
        Some(rest) => rest,
        None => line,
    }
}

/// Whether `bytes` decodes without error to a sequence of Unicode scalar
/// values.
pub(crate) fn validate_utf8(bytes: &[u8]) -> bool {
    core::str::from_utf8(bytes).is_ok()
}

/// Strips one trailing `\n` or `\r\n` left behind by `read_until`.
pub(crate) fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Decodes one raw input line under the declared encoding.
///
/// UTF-8 and undeclared encodings go through UTF-8 validation with a
/// byte-as-char fallback, so a line of mixed UTF-8 and legacy bytes (the
/// Hungarian dictionary does this) still round-trips every byte into a
/// distinct char. Legacy labels decode through `encoding_rs`; labels it
/// does not know get the same byte-as-char treatment.
pub(crate) fn decode_line<'a>(bytes: &'a [u8], encoding: &Encoding) -> Cow<'a, str> {
    if encoding.is_empty() || encoding.is_utf8() {
        match core::str::from_utf8(bytes) {
            Ok(line) => Cow::Borrowed(line),
            Err(_) => Cow::Owned(latin1_to_string(bytes)),
        }
    } else {
        match encoding_rs::Encoding::for_label(encoding.name().as_bytes()) {
            Some(enc) => {
                let (line, _had_errors) = enc.decode_without_bom_handling(bytes);
                line
            }
            None => Cow::Owned(latin1_to_string(bytes)),
        }
    }
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
