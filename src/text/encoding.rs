//! Stream encodings a `TextChunk` may store its bytes in. Characters
//! can be wider than one byte, so character offsets are turned into
//! byte offsets by stepping through the bytes one character at a time.

use Error;
use std::char;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "UTF-16LE")]
    Utf16Le,
    #[serde(rename = "UTF-16BE")]
    Utf16Be,
    #[serde(rename = "ISO-8859-1")]
    Latin1,
}

impl Encoding {
    /// Returns the canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match *self {
            Encoding::Utf8    => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Latin1  => "ISO-8859-1",
        }
    }

    /// Looks up an encoding by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Encoding> {
        match name.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Some(Encoding::Utf8),
            "UTF-16LE" => Some(Encoding::Utf16Le),
            "UTF-16BE" => Some(Encoding::Utf16Be),
            "ISO-8859-1" | "LATIN1" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    /// Returns the byte width of the character at the start of `bytes`,
    /// or None if `bytes` does not start with a complete character.
    pub fn char_width(&self, bytes: &[u8]) -> Option<usize> {
        match *self {
            Encoding::Utf8 => utf8_width(bytes),
            Encoding::Utf16Le => utf16_width(bytes, u16::from_le_bytes),
            Encoding::Utf16Be => utf16_width(bytes, u16::from_be_bytes),
            Encoding::Latin1 => if bytes.is_empty() { None } else { Some(1) },
        }
    }

    /// Returns the byte offset of the `n`th character in `bytes`.
    /// `n` may equal the number of characters, in which case the
    /// result is `bytes.len()`.
    pub fn byte_offset(&self, bytes: &[u8], n: usize) -> Option<usize> {
        let mut offset = 0;
        for _ in 0..n {
            offset += self.char_width(&bytes[offset..])?;
        }
        Some(offset)
    }

    /// Counts the characters in `bytes`. Returns None if the bytes are
    /// not a sequence of complete characters.
    pub fn char_count(&self, bytes: &[u8]) -> Option<usize> {
        if *self == Encoding::Latin1 { return Some(bytes.len()) }

        let mut offset = 0;
        let mut count  = 0;
        while offset < bytes.len() {
            offset += self.char_width(&bytes[offset..])?;
            count  += 1;
        }
        Some(count)
    }

    /// Converts text in this encoding to UTF-8.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, Error> {
        match *self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| Error::Encoding(self.name())),
            Encoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes).ok_or(Error::Encoding(self.name())),
            Encoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes).ok_or(Error::Encoding(self.name())),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Converts UTF-8 text to this encoding. Fails if the text contains
    /// characters the encoding cannot represent.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, Error> {
        match *self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Utf16Le => Ok(text.encode_utf16().flat_map(|unit| unit.to_le_bytes().to_vec()).collect()),
            Encoding::Utf16Be => Ok(text.encode_utf16().flat_map(|unit| unit.to_be_bytes().to_vec()).collect()),
            Encoding::Latin1 => {
                let mut bytes = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    try_assert!((ch as u32) <= 0xFF, Error::Encoding(self.name()));
                    bytes.push(ch as u8);
                }
                Ok(bytes)
            }
        }
    }
}

fn utf8_width(bytes: &[u8]) -> Option<usize> {
    let width = match *bytes.first()? {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };

    if bytes.len() < width { return None }
    if bytes[1..width].iter().any(|&b| b & 0xC0 != 0x80) { return None }
    Some(width)
}

fn utf16_width(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<usize> {
    if bytes.len() < 2 { return None }

    match unit([bytes[0], bytes[1]]) {
        0xD800..=0xDBFF => {
            if bytes.len() < 4 { return None }
            match unit([bytes[2], bytes[3]]) {
                0xDC00..=0xDFFF => Some(4),
                _ => None,
            }
        }
        0xDC00..=0xDFFF => None,
        _ => Some(2),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 { return None }
    let units = bytes.chunks(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}
