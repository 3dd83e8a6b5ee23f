//! The document operations are applied to.

use Error;
use UserId;
use text::{Encoding, TextChunk};

/// A document that operations can be applied to. Positions and lengths
/// are in characters.
pub trait Buffer {
    fn encoding(&self) -> Encoding;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the `len` characters starting at `pos`.
    fn slice(&self, pos: usize, len: usize) -> TextChunk;

    fn insert_chunk(&mut self, pos: usize, chunk: &TextChunk, author: UserId);

    fn erase(&mut self, pos: usize, len: usize, author: UserId);
}

/// A buffer that keeps the whole document in a single `TextChunk`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBuffer {
    chunk: TextChunk,
}

impl TextBuffer {
    pub fn new(encoding: Encoding) -> Self {
        TextBuffer{chunk: TextChunk::new(encoding)}
    }

    pub fn with_chunk(chunk: TextChunk) -> Self {
        TextBuffer{chunk}
    }

    /// Constructs a buffer holding `text`, written by `author` and
    /// stored in `encoding`.
    pub fn from_utf8(text: &str, author: UserId, encoding: Encoding) -> Result<Self, Error> {
        Ok(TextBuffer{chunk: TextChunk::from_utf8(text, author, encoding)?})
    }

    pub fn chunk(&self) -> &TextChunk {
        &self.chunk
    }

    pub fn into_chunk(self) -> TextChunk {
        self.chunk
    }
}

impl Buffer for TextBuffer {
    fn encoding(&self) -> Encoding {
        self.chunk.encoding()
    }

    fn len(&self) -> usize {
        self.chunk.len()
    }

    fn slice(&self, pos: usize, len: usize) -> TextChunk {
        self.chunk.substring(pos, len)
    }

    fn insert_chunk(&mut self, pos: usize, chunk: &TextChunk, author: UserId) {
        trace!("user {} inserts {} characters at {}", author, chunk.len(), pos);
        self.chunk.insert_chunk(pos, chunk);
    }

    fn erase(&mut self, pos: usize, len: usize, author: UserId) {
        trace!("user {} erases {} characters at {}", author, len, pos);
        self.chunk.erase(pos, len);
    }
}
