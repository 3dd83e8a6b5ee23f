//! Edit primitives applied to a `Buffer`.
//!
//! The set of operations is closed: inserts, deletes (with or without the
//! deleted text), splits of two sequential operations and a no-op. Every
//! operation can be transformed against any other operation that was
//! generated at the same state.

mod transform;

use Buffer;
use TextChunk;
use UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Inserts `chunk` at character position `pos`.
    #[serde(rename = "i")]
    Insert{pos: usize, chunk: TextChunk},
    /// Deletes the text `chunk` starting at `pos`. Carrying the deleted
    /// text makes the delete reversible.
    #[serde(rename = "d")]
    Delete{pos: usize, chunk: TextChunk},
    /// Deletes `len` characters starting at `pos`, as received from a
    /// remote site that did not send the deleted text.
    #[serde(rename = "r")]
    RemoteDelete{pos: usize, len: usize},
    /// Applies the first operation, then the second one. The second
    /// operation is defined on the state after the first.
    #[serde(rename = "s")]
    Split(Box<Operation>, Box<Operation>),
    #[serde(rename = "n")]
    NoOp,
}

/// Decides which of two inserts at the same position goes first. The
/// operation being transformed with `Own` ends up after the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcurrencyId {
    Own,
    Other,
}

impl ConcurrencyId {
    /// The id the other operation uses for the same conflict.
    pub fn flip(self) -> Self {
        match self {
            ConcurrencyId::Own => ConcurrencyId::Other,
            ConcurrencyId::Other => ConcurrencyId::Own,
        }
    }
}

impl Operation {
    pub fn insert(pos: usize, chunk: TextChunk) -> Self {
        Operation::Insert{pos, chunk}
    }

    pub fn delete(pos: usize, chunk: TextChunk) -> Self {
        Operation::Delete{pos, chunk}
    }

    pub fn remote_delete(pos: usize, len: usize) -> Self {
        Operation::RemoteDelete{pos, len}
    }

    /// Builds a split, dropping halves that do nothing.
    pub fn split(first: Operation, second: Operation) -> Self {
        match (first, second) {
            (Operation::NoOp, second) => second,
            (first, Operation::NoOp) => first,
            (first, second) => Operation::Split(Box::new(first), Box::new(second)),
        }
    }

    /// Returns the position and length of a delete.
    pub fn delete_range(&self) -> Option<(usize, usize)> {
        match *self {
            Operation::Delete{pos, ref chunk} => Some((pos, chunk.len())),
            Operation::RemoteDelete{pos, len} => Some((pos, len)),
            _ => None,
        }
    }

    /// Transforms `self` so that it applies after `against`, which
    /// was generated at the same state. `lcs` holds the two operations
    /// as they were at their least common state and is consulted when
    /// the current positions alone cannot order the two operations.
    pub fn transform(&self, against: &Operation, lcs: Option<(&Operation, &Operation)>, cid: ConcurrencyId) -> Operation {
        transform::transform(self, against, lcs, cid)
    }

    /// Returns true if transforming `self` against `against` needs a
    /// concurrency id to break a tie.
    pub fn need_concurrency_id(&self, against: &Operation) -> bool {
        match (self, against) {
            (&Operation::Insert{pos: p1, ..}, &Operation::Insert{pos: p2, ..}) => p1 == p2,
            (&Operation::Split(ref first, ref second), _) =>
                first.need_concurrency_id(against) || second.need_concurrency_id(against),
            (_, &Operation::Split(ref first, ref second)) =>
                self.need_concurrency_id(first) || self.need_concurrency_id(second),
            _ => false,
        }
    }

    /// Returns the operation that undoes `self`. Panics if `self` is not
    /// reversible.
    pub fn revert(&self) -> Operation {
        match *self {
            Operation::Insert{pos, ref chunk} => Operation::Delete{pos, chunk: chunk.clone()},
            Operation::Delete{pos, ref chunk} => Operation::Insert{pos, chunk: chunk.clone()},
            Operation::Split(ref first, ref second) => Operation::split(second.revert(), first.revert()),
            Operation::NoOp => Operation::NoOp,
            Operation::RemoteDelete{pos, len} =>
                panic!("delete of {} characters at {} does not know its text and cannot be reverted", len, pos),
        }
    }

    pub fn is_reversible(&self) -> bool {
        match *self {
            Operation::RemoteDelete{..} => false,
            Operation::Split(ref first, ref second) => first.is_reversible() && second.is_reversible(),
            _ => true,
        }
    }

    pub fn affects_buffer(&self) -> bool {
        match *self {
            Operation::NoOp => false,
            Operation::Split(ref first, ref second) => first.affects_buffer() || second.affects_buffer(),
            _ => true,
        }
    }

    /// Applies the operation to `buffer` on behalf of `author`.
    pub fn apply<B: Buffer>(&self, author: UserId, buffer: &mut B) {
        match *self {
            Operation::Insert{pos, ref chunk} => buffer.insert_chunk(pos, chunk, author),
            Operation::Delete{pos, ref chunk} => buffer.erase(pos, chunk.len(), author),
            Operation::RemoteDelete{pos, len} => buffer.erase(pos, len, author),
            Operation::Split(ref first, ref second) => {
                first.apply(author, buffer);
                second.apply(author, buffer);
            }
            Operation::NoOp => (),
        }
    }

    /// Returns a reversible version of `self` by reading the text it
    /// would delete from `buffer`, which must be in the state the
    /// operation applies to.
    pub fn make_reversible<B: Buffer>(&self, buffer: &B) -> Operation {
        match *self {
            _ if self.is_reversible() => self.clone(),
            Operation::RemoteDelete{pos, len} => Operation::Delete{pos, chunk: buffer.slice(pos, len)},
            _ => {
                let mut scratch = buffer.slice(0, buffer.len());
                self.replay_reversible(&mut scratch)
            }
        }
    }

    // Applies `self` to `chunk`, capturing deleted text along the way.
    fn replay_reversible(&self, chunk: &mut TextChunk) -> Operation {
        match *self {
            Operation::Insert{pos, chunk: ref inserted} => {
                chunk.insert_chunk(pos, inserted);
                self.clone()
            }
            Operation::Delete{pos, chunk: ref deleted} => {
                chunk.erase(pos, deleted.len());
                self.clone()
            }
            Operation::RemoteDelete{pos, len} => {
                let deleted = chunk.substring(pos, len);
                chunk.erase(pos, len);
                Operation::Delete{pos, chunk: deleted}
            }
            Operation::Split(ref first, ref second) => {
                let first = first.replay_reversible(chunk);
                let second = second.replay_reversible(chunk);
                Operation::split(first, second)
            }
            Operation::NoOp => Operation::NoOp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use {Encoding, TextBuffer};

    fn text(s: &str, author: UserId) -> TextChunk {
        TextChunk::with_text(Encoding::Utf8, s.as_bytes(), author)
    }

    #[test]
    fn test_revert() {
        let op = Operation::insert(3, text("abc", 1));
        assert!(op.revert() == Operation::delete(3, text("abc", 1)));
        assert!(op.revert().revert() == op);
    }

    #[test]
    fn test_revert_split() {
        let op = Operation::split(Operation::delete(0, text("ab", 1)), Operation::delete(2, text("cd", 1)));
        let expected = Operation::split(Operation::insert(2, text("cd", 1)), Operation::insert(0, text("ab", 1)));
        assert!(op.revert() == expected);
    }

    #[test]
    #[should_panic]
    fn test_revert_remote_delete() {
        Operation::remote_delete(0, 1).revert();
    }

    #[test]
    fn test_split_drops_noops() {
        let op = Operation::remote_delete(1, 2);
        assert!(Operation::split(Operation::NoOp, op.clone()) == op);
        assert!(Operation::split(op.clone(), Operation::NoOp) == op);
    }

    #[test]
    fn test_flags() {
        assert!(Operation::NoOp.is_reversible());
        assert!(!Operation::NoOp.affects_buffer());
        assert!(!Operation::remote_delete(0, 1).is_reversible());
        assert!(Operation::remote_delete(0, 1).affects_buffer());

        let split = Operation::split(Operation::delete(0, text("a", 1)), Operation::remote_delete(1, 1));
        assert!(!split.is_reversible());
        assert!(split.affects_buffer());
    }

    #[test]
    fn test_need_concurrency_id() {
        let a = Operation::insert(2, text("x", 1));
        let b = Operation::insert(2, text("y", 2));
        let c = Operation::insert(3, text("z", 2));
        assert!(a.need_concurrency_id(&b));
        assert!(!a.need_concurrency_id(&c));
        assert!(!a.need_concurrency_id(&Operation::remote_delete(2, 1)));
        assert!(Operation::split(Operation::NoOp, a.clone()).need_concurrency_id(&b));
    }

    #[test]
    fn test_apply() {
        let mut buffer = TextBuffer::from_utf8("hello", 1, Encoding::Utf8).unwrap();
        Operation::insert(5, text(" world", 2)).apply(2, &mut buffer);
        Operation::remote_delete(0, 1).apply(2, &mut buffer);
        assert!(buffer.chunk().to_utf8().unwrap() == "ello world");

        let split = Operation::split(Operation::remote_delete(0, 1), Operation::remote_delete(4, 1));
        split.apply(1, &mut buffer);
        assert!(buffer.chunk().to_utf8().unwrap() == "llo orld");
    }

    #[test]
    fn test_make_reversible() {
        let mut buffer = TextBuffer::from_utf8("hello", 1, Encoding::Utf8).unwrap();
        let op = Operation::remote_delete(1, 3).make_reversible(&buffer);
        assert!(op == Operation::delete(1, text("ell", 1)));

        op.apply(1, &mut buffer);
        op.revert().apply(1, &mut buffer);
        assert!(buffer.chunk() == &text("hello", 1));
    }

    #[test]
    fn test_make_reversible_split() {
        let buffer = TextBuffer::from_utf8("abcdef", 1, Encoding::Utf8).unwrap();
        let split = Operation::split(Operation::remote_delete(0, 2), Operation::remote_delete(1, 2));
        let reversible = split.make_reversible(&buffer);
        let expected = Operation::split(Operation::delete(0, text("ab", 1)), Operation::delete(1, text("de", 1)));
        assert!(reversible == expected);
    }
}
