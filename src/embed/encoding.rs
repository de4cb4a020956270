//! Reading embedded files whose encoding is unknown.
//!
//! The embedded file's encoding is guessed from the host document: a file
//! referenced from a document in some encoding probably uses it too. Every
//! read succeeds; the last attempt decodes lossily.

use std::fmt;
use std::path::Path;

use encoding_rs::Encoding;

/// Code page 437, bytes 0x80..=0xFF. The lower half is ASCII.
const CP437_HIGH: &str = concat!(
    "ÇüéâäàåçêëèïîìÄÅ",
    "ÉæÆôöòûùÿÖÜ¢£¥₧ƒ",
    "áíóúñÑªº¿⌐¬½¼¡«»",
    "░▒▓│┤╡╢╖╕╣║╗╝╜╛┐",
    "└┴┬├─┼╞╟╚╔╩╦╠═╬╧",
    "╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀",
    "αßΓπΣσµτΦΘΩδ∞φε∩",
    "≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{a0}",
);

/// The encoding a file was finally read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// The host document's declared encoding.
    Declared(&'static Encoding),
    /// Legacy 8-bit fallback when UTF-8 fails.
    Cp437,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("utf-8"),
            Self::Declared(encoding) => f.write_str(&encoding.name().to_ascii_lowercase()),
            Self::Cp437 => f.write_str("cp437"),
        }
    }
}

/// Whether a host encoding name denotes UTF-8 without BOM, the default.
pub fn is_default_encoding(label: &str) -> bool {
    label.eq_ignore_ascii_case("utf8") || label.eq_ignore_ascii_case("utf-8")
}

/// Decode `bytes`, guided by the host document's declared encoding.
///
/// A non-default declared encoding is tried strictly first, then UTF-8
/// lossily. When the declaration is already UTF-8, strict UTF-8 comes first
/// and code page 437 is the fallback.
pub fn decode_with_fallback(bytes: &[u8], declared: &str) -> (String, TextEncoding) {
    if is_default_encoding(declared) {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return (text.to_string(), TextEncoding::Utf8);
        }
        return (decode_cp437(bytes), TextEncoding::Cp437);
    }

    let strict = Encoding::for_label(declared.as_bytes()).and_then(|encoding| {
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| (text.into_owned(), TextEncoding::Declared(encoding)))
    });
    strict.unwrap_or_else(|| {
        tracing::debug!(declared, "declared encoding failed, reading as utf-8");
        (
            String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf8,
        )
    })
}

/// Read a file with [`decode_with_fallback`].
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_with_fallback(path: &Path, declared: &str) -> std::io::Result<(String, TextEncoding)> {
    let bytes = std::fs::read(path)?;
    let (text, encoding) = decode_with_fallback(&bytes, declared);
    tracing::info!(path = %path.display(), %encoding, "read embedded file");
    Ok((text, encoding))
}

fn decode_cp437(bytes: &[u8]) -> String {
    if bytes.is_ascii() {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let high: Vec<char> = CP437_HIGH.chars().collect();
    bytes
        .iter()
        .map(|&byte| {
            if byte.is_ascii() {
                char::from(byte)
            } else {
                high[usize::from(byte - 0x80)]
            }
        })
        .collect()
}
