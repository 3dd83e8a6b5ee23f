//! Author-segmented text.
//!
//! A `TextChunk` is a run of text in one stream encoding, split into
//! segments that record which user wrote which characters. Segments
//! cover the chunk without gaps, are stored in offset order, and each
//! one knows its absolute character offset from the start of the chunk.
//! A new segment boundary appears only where authorship changes or where
//! a caller forced a split (e.g. by extracting a substring).

mod encoding;
mod xml;

pub use self::encoding::Encoding;

use Error;
use UserId;
use serde::{Serialize, Serializer, Deserialize, Deserializer};
use serde::de;
use std::cmp::min;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    encoding: Encoding,
    length:   usize,
    segments: Vec<Segment>,
}

/// A run of characters written by one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    author: UserId,
    text:   Vec<u8>,
    length: usize,
    offset: usize,
}

impl Segment {
    fn new(author: UserId, text: Vec<u8>, length: usize, offset: usize) -> Self {
        Segment{author, text, length, offset}
    }

    /// The user who wrote the segment.
    pub fn author(&self) -> UserId {
        self.author
    }

    /// The raw bytes of the segment in the chunk's encoding.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// The number of characters in the segment.
    pub fn len(&self) -> usize {
        self.length
    }

    /// The character offset of the segment from the start of the chunk.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn end(&self) -> usize {
        self.offset + self.length
    }

    // Splits the segment at character `at`. Self keeps [0, at).
    fn split_off(&mut self, at: usize, encoding: Encoding) -> Segment {
        let byte = char_offset_to_byte_offset(self, at, encoding);
        let text = self.text.split_off(byte);
        let right = Segment::new(self.author, text, self.length - at, self.offset + at);
        self.length = at;
        right
    }
}

/// Returns the byte offset of character `n` within `segment`. Panics if
/// `n` is past the end of the segment or if the segment's bytes are not
/// valid in `encoding`.
pub fn char_offset_to_byte_offset(segment: &Segment, n: usize, encoding: Encoding) -> usize {
    assert!(n <= segment.length, "character offset {} is past the end of a {}-character segment", n, segment.length);
    match encoding.byte_offset(&segment.text, n) {
        Some(offset) => offset,
        None => panic!("segment by user {} is not valid {}", segment.author, encoding.name()),
    }
}

impl TextChunk {
    /// Constructs an empty chunk that stores text in `encoding`.
    pub fn new(encoding: Encoding) -> Self {
        TextChunk{encoding, length: 0, segments: vec![]}
    }

    /// Constructs a chunk holding `text` written by `author`. Panics
    /// if `text` is not valid in `encoding`.
    pub fn with_text(encoding: Encoding, text: &[u8], author: UserId) -> Self {
        let mut chunk = TextChunk::new(encoding);
        chunk.insert(0, text, author);
        chunk
    }

    /// Constructs a chunk from UTF-8 text, converting it to `encoding`.
    pub fn from_utf8(text: &str, author: UserId, encoding: Encoding) -> Result<Self, Error> {
        let bytes = encoding.encode(text)?;
        Ok(TextChunk::with_text(encoding, &bytes, author))
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the number of characters in the chunk.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Concatenates the raw bytes of all segments. No encoding
    /// conversion takes place.
    pub fn text(&self) -> Vec<u8> {
        let capacity = self.segments.iter().map(|s| s.text.len()).sum();
        let mut text = Vec::with_capacity(capacity);
        for segment in &self.segments {
            text.extend_from_slice(&segment.text);
        }
        text
    }

    /// Returns the chunk's text converted to UTF-8.
    pub fn to_utf8(&self) -> Result<String, Error> {
        self.encoding.decode(&self.text())
    }

    /// Inserts `text`, written by `author`, at character `offset`.
    /// The text extends an adjacent segment of the same author where
    /// possible and splits a segment of another author otherwise.
    /// Panics if `offset` is past the end of the chunk or if `text` is
    /// not valid in the chunk's encoding.
    pub fn insert(&mut self, offset: usize, text: &[u8], author: UserId) {
        assert!(offset <= self.length, "insert at {} is out of bounds for a chunk of length {}", offset, self.length);
        let length = match self.encoding.char_count(text) {
            Some(length) => length,
            None => panic!("inserted text is not valid {}", self.encoding.name()),
        };
        if length == 0 { return }

        trace!("inserting {} characters by user {} at {}", length, author, offset);
        let encoding = self.encoding;
        let idx = self.segments.partition_point(|s| s.offset < offset);

        let shift_from = if idx > 0 && self.segments[idx-1].end() > offset {
            let segment = &mut self.segments[idx-1];
            if segment.author == author {
                let at = char_offset_to_byte_offset(segment, offset - segment.offset, encoding);
                segment.text.splice(at..at, text.iter().cloned());
                segment.length += length;
                idx
            } else {
                let right = segment.split_off(offset - segment.offset, encoding);
                self.segments.insert(idx, Segment::new(author, text.to_vec(), length, offset));
                self.segments.insert(idx+1, right);
                idx + 1
            }
        } else if idx > 0 && self.segments[idx-1].author == author {
            let segment = &mut self.segments[idx-1];
            segment.text.extend_from_slice(text);
            segment.length += length;
            idx
        } else if idx < self.segments.len() && self.segments[idx].author == author {
            let segment = &mut self.segments[idx];
            segment.text.splice(0..0, text.iter().cloned());
            segment.length += length;
            idx + 1
        } else {
            self.segments.insert(idx, Segment::new(author, text.to_vec(), length, offset));
            idx + 1
        };

        self.length += length;
        self.update_offsets(shift_from);
    }

    /// Inserts UTF-8 text, converting it to the chunk's encoding first.
    pub fn insert_str(&mut self, offset: usize, text: &str, author: UserId) -> Result<(), Error> {
        let bytes = self.encoding.encode(text)?;
        self.insert(offset, &bytes, author);
        Ok(())
    }

    /// Inserts all segments of `other` at character `offset`. The
    /// outermost segments of `other` merge with the neighbouring
    /// segments of `self` when the authors match; the others are
    /// copied as they are. Both chunks must share an encoding.
    pub fn insert_chunk(&mut self, offset: usize, other: &TextChunk) {
        assert!(self.encoding == other.encoding, "cannot insert {} text into a {} chunk", other.encoding.name(), self.encoding.name());
        assert!(offset <= self.length, "insert at {} is out of bounds for a chunk of length {}", offset, self.length);
        if other.is_empty() { return }

        trace!("inserting {} segments at {}", other.segments.len(), offset);
        let idx = self.split_at(offset);
        let count = other.segments.len();

        self.segments.splice(idx..idx, other.segments.iter().cloned());
        self.length += other.length;
        self.update_offsets(idx);

        self.merge_at(idx + count);
        self.merge_at(idx);
    }

    /// Removes `length` characters starting at `begin`. Segments that
    /// end up next to each other with the same author are merged.
    pub fn erase(&mut self, begin: usize, length: usize) {
        let end = begin.checked_add(length).expect("erase range overflows");
        assert!(end <= self.length, "erase of [{}, {}) is out of bounds for a chunk of length {}", begin, end, self.length);
        if length == 0 { return }

        trace!("erasing {} characters at {}", length, begin);
        let encoding = self.encoding;
        let first = self.segments.partition_point(|s| s.end() <= begin);
        let mut idx = first;

        while idx < self.segments.len() && self.segments[idx].offset < end {
            let segment = &mut self.segments[idx];
            let from = begin.saturating_sub(segment.offset);
            let to = min(end, segment.end()) - segment.offset;

            if from == 0 && to == segment.length {
                self.segments.remove(idx);
                continue;
            }

            let byte_from = char_offset_to_byte_offset(segment, from, encoding);
            let byte_to = char_offset_to_byte_offset(segment, to, encoding);
            segment.text.drain(byte_from..byte_to);
            segment.length -= to - from;
            idx += 1;
        }

        self.length -= length;
        self.update_offsets(first);

        let boundary = self.segments.partition_point(|s| s.offset < begin);
        if boundary < self.segments.len() && self.segments[boundary].offset == begin {
            self.merge_at(boundary);
        }
    }

    /// Returns a new chunk with the `length` characters starting at
    /// `begin`. Segments cut by the range are split; authorship is kept.
    pub fn substring(&self, begin: usize, length: usize) -> TextChunk {
        let end = begin.checked_add(length).expect("substring range overflows");
        assert!(end <= self.length, "substring [{}, {}) is out of bounds for a chunk of length {}", begin, end, self.length);

        let mut chunk = TextChunk::new(self.encoding);
        if length == 0 { return chunk }

        let first = self.segments.partition_point(|s| s.end() <= begin);
        for segment in &self.segments[first..] {
            if segment.offset >= end { break }

            let from = begin.saturating_sub(segment.offset);
            let to = min(end, segment.end()) - segment.offset;
            let byte_from = char_offset_to_byte_offset(segment, from, self.encoding);
            let byte_to = char_offset_to_byte_offset(segment, to, self.encoding);

            let text = segment.text[byte_from..byte_to].to_vec();
            chunk.push_segment(segment.author, text, to - from);
        }

        chunk
    }

    // Appends text by `author` at the end, extending the last segment
    // when it has the same author.
    fn push_segment(&mut self, author: UserId, text: Vec<u8>, length: usize) {
        if length == 0 { return }
        self.length += length;

        if let Some(last) = self.segments.last_mut() {
            if last.author == author {
                last.text.extend(text);
                last.length += length;
                return
            }
        }

        let offset = self.length - length;
        self.segments.push(Segment::new(author, text, length, offset));
    }

    // Makes sure a segment starts at `offset` and returns its index.
    fn split_at(&mut self, offset: usize) -> usize {
        let idx = self.segments.partition_point(|s| s.offset < offset);
        if idx > 0 && self.segments[idx-1].end() > offset {
            let encoding = self.encoding;
            let segment = &mut self.segments[idx-1];
            let right = segment.split_off(offset - segment.offset, encoding);
            self.segments.insert(idx, right);
        }
        idx
    }

    // Merges segment `idx` into its predecessor if both have the same author.
    fn merge_at(&mut self, idx: usize) {
        if idx == 0 || idx >= self.segments.len() { return }
        if self.segments[idx-1].author != self.segments[idx].author { return }

        let next = self.segments.remove(idx);
        let prev = &mut self.segments[idx-1];
        prev.text.extend(next.text);
        prev.length += next.length;
    }

    fn update_offsets(&mut self, from: usize) {
        for idx in from..self.segments.len() {
            self.segments[idx].offset = if idx == 0 { 0 } else { self.segments[idx-1].end() };
        }
    }
}

#[derive(Serialize)]
struct SerializedChunk<'a> {
    #[serde(rename = "e")]
    encoding: Encoding,
    #[serde(rename = "s")]
    segments: Vec<(UserId, &'a [u8])>,
}

#[derive(Deserialize)]
struct DeserializedChunk {
    #[serde(rename = "e")]
    encoding: Encoding,
    #[serde(rename = "s")]
    segments: Vec<(UserId, Vec<u8>)>,
}

impl Serialize for TextChunk {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        let segments = self.segments.iter().map(|s| (s.author, &s.text[..])).collect();
        SerializedChunk{encoding: self.encoding, segments}.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TextChunk {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let DeserializedChunk{encoding, segments} = DeserializedChunk::deserialize(deserializer)?;
        let mut chunk = TextChunk::new(encoding);

        for (author, text) in segments {
            let length = encoding.char_count(&text).ok_or_else(|| de::Error::custom(Error::Encoding(encoding.name())))?;
            chunk.push_segment(author, text, length);
        }

        Ok(chunk)
    }
}
