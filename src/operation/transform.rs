use super::{ConcurrencyId, Operation};
use std::cmp::{max, min};
use TextChunk;

pub fn transform(op: &Operation, against: &Operation, lcs: Option<(&Operation, &Operation)>, cid: ConcurrencyId) -> Operation {
    match (op, against) {
        (&Operation::NoOp, _) => Operation::NoOp,
        (_, &Operation::NoOp) => op.clone(),

        // The second half of a split applies after the first one, so the
        // other operation has to be moved past the first half before the
        // second half can be transformed against it.
        (&Operation::Split(ref first, ref second), _) => {
            let first_t = transform(first, against, lcs, cid);
            let against_t = transform(against, first, lcs.map(|(a, b)| (b, a)), cid.flip());
            let second_t = transform(second, &against_t, lcs, cid);
            Operation::split(first_t, second_t)
        }
        (_, &Operation::Split(ref first, ref second)) => {
            let partial = transform(op, first, lcs, cid);
            transform(&partial, second, lcs, cid)
        }

        (&Operation::Insert{pos, ref chunk}, &Operation::Insert{pos: other_pos, chunk: ref other}) =>
            insert_insert(pos, chunk, other_pos, other.len(), lcs, cid),
        (&Operation::Insert{pos, ref chunk}, _) => {
            let (del_pos, del_len) = range(against);
            insert_delete(pos, chunk, del_pos, del_len)
        }
        (_, &Operation::Insert{pos, ref chunk}) => delete_insert(op, pos, chunk.len()),
        (_, _) => delete_delete(op, against),
    }
}

fn insert_insert(pos: usize, chunk: &TextChunk, other_pos: usize, other_len: usize, lcs: Option<(&Operation, &Operation)>, cid: ConcurrencyId) -> Operation {
    let shift = if pos != other_pos {
        pos > other_pos
    } else {
        match lcs {
            Some((&Operation::Insert{pos: lcs_pos, ..}, &Operation::Insert{pos: lcs_other, ..})) if lcs_pos != lcs_other =>
                lcs_pos > lcs_other,
            _ =>
                cid == ConcurrencyId::Own,
        }
    };

    let pos = if shift { pos + other_len } else { pos };
    Operation::Insert{pos, chunk: chunk.clone()}
}

fn insert_delete(pos: usize, chunk: &TextChunk, del_pos: usize, del_len: usize) -> Operation {
    let pos = if pos <= del_pos {
        pos
    } else if pos >= del_pos + del_len {
        pos - del_len
    } else {
        del_pos
    };
    Operation::Insert{pos, chunk: chunk.clone()}
}

// A delete that spans the insert position is cut in two around the
// inserted text.
fn delete_insert(op: &Operation, ins_pos: usize, ins_len: usize) -> Operation {
    let (pos, len) = range(op);

    if ins_pos >= pos + len {
        op.clone()
    } else if ins_pos <= pos {
        slice(op, pos + ins_len, 0, len)
    } else {
        let head = ins_pos - pos;
        Operation::split(slice(op, pos, 0, head), slice(op, pos + ins_len, head, len - head))
    }
}

fn delete_delete(op: &Operation, against: &Operation) -> Operation {
    let (pos, len) = range(op);
    let (other_pos, other_len) = range(against);
    let end = pos + len;
    let other_end = other_pos + other_len;

    if end <= other_pos {
        op.clone()
    } else if pos >= other_end {
        slice(op, pos - other_len, 0, len)
    } else {
        let overlap_begin = max(pos, other_pos);
        let overlap_end = min(end, other_end);
        without(op, min(pos, other_pos), overlap_begin - pos, overlap_end - overlap_begin)
    }
}

fn range(op: &Operation) -> (usize, usize) {
    match op.delete_range() {
        Some(range) => range,
        None => panic!("expected a delete, found {:?}", op),
    }
}

// The `len` characters of delete `op` starting at `from`, moved to `pos`.
fn slice(op: &Operation, pos: usize, from: usize, len: usize) -> Operation {
    match *op {
        Operation::Delete{ref chunk, ..} => Operation::Delete{pos, chunk: chunk.substring(from, len)},
        _ => Operation::RemoteDelete{pos, len},
    }
}

// Delete `op` at `pos`, minus the `len` characters starting at `from`.
fn without(op: &Operation, pos: usize, from: usize, len: usize) -> Operation {
    let (_, total) = range(op);
    if total == len { return Operation::NoOp }

    match *op {
        Operation::Delete{ref chunk, ..} => {
            let mut chunk = chunk.clone();
            chunk.erase(from, len);
            Operation::Delete{pos, chunk}
        }
        _ => Operation::RemoteDelete{pos, len: total - len},
    }
}
