use Operation;
use TextChunk;
use request::Request;
use super::GroupingPolicy;

/// Groups typing the way text editors usually do: a word typed
/// character by character is one undo step, and so is a run of
/// backspaces or forward deletes. Only consecutive requests of the same
/// user with nothing in between are grouped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextGroupingPolicy;

impl GroupingPolicy for TextGroupingPolicy {
    fn group_with(&mut self, previous: &Request, request: &Request) -> bool {
        if previous.user() != request.user() { return false }
        if !previous.vector().causally_before(request.vector()) { return false }
        if previous.vector().vdiff(request.vector()) != 1 { return false }

        match (previous.operation(), request.operation()) {
            (Some(previous), Some(op)) => operations_group(previous, op),
            _ => false,
        }
    }
}

fn operations_group(previous: &Operation, op: &Operation) -> bool {
    if let (&Operation::Insert{pos: prev_pos, chunk: ref prev_chunk}, &Operation::Insert{pos, ref chunk}) = (previous, op) {
        return pos == prev_pos + prev_chunk.len() && !word_boundary(prev_chunk, chunk)
    }

    match (previous.delete_range(), op.delete_range()) {
        (Some((prev_pos, _)), Some((pos, len))) => pos + len == prev_pos || pos == prev_pos,
        _ => false,
    }
}

// True between a word and the whitespace after it, and around newlines.
fn word_boundary(previous: &TextChunk, next: &TextChunk) -> bool {
    let (previous, next) = match (previous.to_utf8(), next.to_utf8()) {
        (Ok(previous), Ok(next)) => (previous, next),
        _ => return true,
    };

    if previous.ends_with('\n') || next.contains('\n') { return true }

    match (previous.chars().last(), next.chars().next()) {
        (Some(last), Some(first)) => !last.is_whitespace() && first.is_whitespace(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use {Encoding, StateVector, UserId};

    fn vector(s: &str) -> StateVector {
        s.parse().unwrap()
    }

    fn typed(v: &str, user: UserId, pos: usize, text: &str) -> Request {
        let chunk = TextChunk::with_text(Encoding::Utf8, text.as_bytes(), user);
        Request::new_do(vector(v), user, Operation::insert(pos, chunk))
    }

    fn deleted(v: &str, user: UserId, pos: usize, len: usize) -> Request {
        Request::new_do(vector(v), user, Operation::remote_delete(pos, len))
    }

    #[test]
    fn test_typing_a_word() {
        let mut policy = TextGroupingPolicy;
        assert!(policy.group_with(&typed("1:1", 1, 0, "h"), &typed("1:2", 1, 1, "i")));
        assert!(policy.group_with(&typed("1:1", 1, 3, " "), &typed("1:2", 1, 4, "w")));
    }

    #[test]
    fn test_whitespace_after_word_breaks() {
        let mut policy = TextGroupingPolicy;
        assert!(!policy.group_with(&typed("1:1", 1, 0, "hi"), &typed("1:2", 1, 2, " ")));
        assert!(policy.group_with(&typed("1:1", 1, 0, " "), &typed("1:2", 1, 1, " ")));
    }

    #[test]
    fn test_newline_breaks() {
        let mut policy = TextGroupingPolicy;
        assert!(!policy.group_with(&typed("1:1", 1, 0, "a"), &typed("1:2", 1, 1, "\n")));
        assert!(!policy.group_with(&typed("1:1", 1, 0, "\n"), &typed("1:2", 1, 1, "a")));
    }

    #[test]
    fn test_non_adjacent_insert() {
        let mut policy = TextGroupingPolicy;
        assert!(!policy.group_with(&typed("1:1", 1, 0, "a"), &typed("1:2", 1, 5, "b")));
    }

    #[test]
    fn test_delete_runs() {
        let mut policy = TextGroupingPolicy;
        // backspace
        assert!(policy.group_with(&deleted("1:1", 1, 5, 1), &deleted("1:2", 1, 4, 1)));
        // forward delete
        assert!(policy.group_with(&deleted("1:1", 1, 5, 1), &deleted("1:2", 1, 5, 1)));
        assert!(!policy.group_with(&deleted("1:1", 1, 5, 1), &deleted("1:2", 1, 2, 1)));
        assert!(!policy.group_with(&deleted("1:1", 1, 5, 1), &typed("1:2", 1, 5, "a")));
    }

    #[test]
    fn test_requires_consecutive_requests() {
        let mut policy = TextGroupingPolicy;
        assert!(!policy.group_with(&typed("1:1", 1, 0, "a"), &typed("1:2;2:1", 1, 1, "b")));
        assert!(!policy.group_with(&typed("1:1", 1, 0, "a"), &typed("1:3", 1, 1, "b")));
        assert!(!policy.group_with(&typed("1:1", 1, 0, "a"), &typed("1:1;2:1", 2, 1, "b")));
        assert!(!policy.group_with(&typed("1:1;2:1", 1, 0, "a"), &typed("1:2", 1, 1, "b")));
    }
}
