//! Batches a user's requests into undo steps.
//!
//! `UndoGrouping` follows one user's `RequestLog`. Every Do request
//! becomes an item that either starts a new group or joins the group of
//! the item before it. An Undo request moves the cursor back by one item
//! and a Redo request moves it forward; the scheduler issues as many
//! undos as `undo_size` reports to undo a whole group.
//!
//! Items only refer to log entries by index. Undoing an old request
//! requires transforming it against everything that happened since, so
//! the log cannot keep requests forever: items that have drifted further
//! than the configured maximum log size are evicted.

mod text;

pub use self::text::TextGroupingPolicy;

use Config;
use UserId;
use request::{Request, RequestType};
use request_log::RequestLog;
use state_vector::StateVector;
use std::collections::VecDeque;

/// Decides whether a Do request belongs to the same undo step as the
/// one before it.
pub trait GroupingPolicy {
    fn group_with(&mut self, previous: &Request, request: &Request) -> bool;
}

impl<F> GroupingPolicy for F where F: FnMut(&Request, &Request) -> bool {
    fn group_with(&mut self, previous: &Request, request: &Request) -> bool {
        self(previous, request)
    }
}

pub struct UndoGrouping<P> {
    user: UserId,
    policy: P,
    max_total_log_size: Option<usize>,
    capacity: Option<usize>,
    items: VecDeque<Item>,
    item_pos: usize,
    group_ref: usize,
    group_allow_prev: bool,
    group_first_pending: bool,
    allow_with_next: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Item {
    index: usize,
    in_group: bool,
}

impl<P: GroupingPolicy> UndoGrouping<P> {
    pub fn new(user: UserId, policy: P, config: &Config) -> Self {
        UndoGrouping{
            user,
            policy,
            max_total_log_size: config.max_total_log_size,
            capacity: config.max_total_log_size.map(|max| max / 2 + 1),
            items: VecDeque::new(),
            item_pos: 0,
            group_ref: 0,
            group_allow_prev: true,
            group_first_pending: false,
            allow_with_next: true,
        }
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    /// Number of tracked requests, undone ones included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of tracked requests that are currently done. Items before
    /// the cursor can be undone, items after it can be redone.
    pub fn item_pos(&self) -> usize {
        self.item_pos
    }

    /// Must be called for every request added to the user's log.
    pub fn request_added(&mut self, log: &RequestLog, index: usize) {
        assert!(log.user() == self.user, "undo grouping of user {} notified by the log of user {}", self.user, log.user());
        let request = log.get_request(index);

        match request.request_type() {
            RequestType::Do => self.add_item(log, index, request),
            RequestType::Undo => {
                if self.item_pos == 0 {
                    self.clear("undo reached past the tracked requests");
                } else {
                    self.item_pos -= 1;
                }
            }
            RequestType::Redo => {
                if self.item_pos == self.items.len() {
                    self.clear("redo reached past the tracked requests");
                } else {
                    self.item_pos += 1;
                }
            }
        }
    }

    /// Must be called after the scheduler executed `request`, from any
    /// user. `current` is the state after the execution.
    pub fn request_executed(&mut self, log: &RequestLog, request: &Request, applied: bool, current: &StateVector) {
        if applied && request.affects_buffer() {
            self.cleanup(log, current);
        }
    }

    /// Opens an explicit group: every Do request until the matching
    /// `end_group` joins one undo step. The first of them may also join
    /// the step before if `allow_with_prev` is set and the policy agrees.
    /// Groups nest; only the outermost pair counts.
    pub fn start_group(&mut self, allow_with_prev: bool) {
        if self.group_ref == 0 {
            self.group_allow_prev = allow_with_prev;
            self.group_first_pending = true;
        }
        self.group_ref += 1;
    }

    /// Closes an explicit group. The next Do request may join it only
    /// if `allow_with_next` is set and the policy agrees.
    pub fn end_group(&mut self, allow_with_next: bool) {
        assert!(self.group_ref > 0, "end_group without start_group");
        self.group_ref -= 1;
        if self.group_ref == 0 {
            self.allow_with_next = allow_with_next;
            self.group_first_pending = false;
        }
    }

    /// Number of undo requests needed to undo the last group.
    pub fn undo_size(&self) -> usize {
        let mut pos = self.item_pos;
        let mut size = 0;
        while pos > 0 {
            pos -= 1;
            size += 1;
            if !self.items[pos].in_group { break }
        }
        size
    }

    /// Number of redo requests needed to redo the next group.
    pub fn redo_size(&self) -> usize {
        if self.item_pos == self.items.len() { return 0 }

        let mut size = 1;
        while self.item_pos + size < self.items.len() && self.items[self.item_pos + size].in_group {
            size += 1;
        }
        size
    }

    fn add_item(&mut self, log: &RequestLog, index: usize, request: &Request) {
        self.items.truncate(self.item_pos);

        let in_group = match self.items.back().map(|item| item.index) {
            Some(previous) => self.joins_previous(log, previous, request),
            None => false,
        };

        if self.group_ref > 0 {
            self.group_first_pending = false;
        } else {
            self.allow_with_next = true;
        }

        debug!("user {}: request {} {}", self.user, index, if in_group { "joins the previous undo step" } else { "starts an undo step" });
        self.items.push_back(Item{index, in_group});
        self.item_pos = self.items.len();

        // A full window drops its oldest step whole, as cleanup does.
        if let Some(capacity) = self.capacity {
            if self.items.len() > capacity {
                self.evict_front();
                while self.items.front().map_or(false, |item| item.in_group) {
                    self.evict_front();
                }
            }
        }
    }

    fn joins_previous(&mut self, log: &RequestLog, previous: usize, request: &Request) -> bool {
        if self.group_ref > 0 && !self.group_first_pending { return true }

        let allowed = if self.group_ref > 0 { self.group_allow_prev } else { self.allow_with_next };
        if !allowed { return false }

        match log.get(previous) {
            Some(previous) => self.policy.group_with(previous, request),
            None => false,
        }
    }

    // Evicts items whose requests are about to drop out of the log
    // window, together with the rest of their group.
    fn cleanup(&mut self, log: &RequestLog, current: &StateVector) {
        let max = some!(self.max_total_log_size);
        let mut evicted = false;

        while let Some(index) = self.items.front().map(|item| item.index) {
            let expired = match log.get(index) {
                Some(request) => request.vector().vdiff(current) + self.item_pos > max,
                None => true,
            };
            if !expired { break }

            self.evict_front();
            evicted = true;
        }

        if evicted {
            while self.items.front().map_or(false, |item| item.in_group) {
                self.evict_front();
            }
        }
    }

    fn evict_front(&mut self) {
        if self.item_pos == 0 {
            self.clear("a request that could still be redone left the log window");
            return
        }

        if let Some(item) = self.items.pop_front() {
            trace!("user {}: request {} left the undo window", self.user, item.index);
        }
        self.item_pos -= 1;
    }

    fn clear(&mut self, reason: &str) {
        if !self.items.is_empty() {
            warn!("user {}: discarding {} undo items: {}", self.user, self.items.len(), reason);
        }
        self.items.clear();
        self.item_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use {Encoding, Operation, TextChunk};

    struct Session<P> {
        log: RequestLog,
        grouping: UndoGrouping<P>,
        current: StateVector,
    }

    impl<P: GroupingPolicy> Session<P> {
        fn new(policy: P, config: &Config) -> Self {
            Session{log: RequestLog::new(1), grouping: UndoGrouping::new(1, policy, config), current: StateVector::new()}
        }

        fn push(&mut self, request: Request, notify: bool) {
            self.log.add_request(request.clone());
            if notify {
                let index = self.log.end() - 1;
                self.grouping.request_added(&self.log, index);
            }
            self.current.add(1, 1);
            self.grouping.request_executed(&self.log, &request, true, &self.current);
        }

        fn insert(&mut self) {
            let chunk = TextChunk::with_text(Encoding::Utf8, b"x", 1);
            let request = Request::new_do(self.current.clone(), 1, Operation::insert(0, chunk));
            self.push(request, true);
        }

        fn undo(&mut self) {
            let request = Request::new_undo(self.current.clone(), 1);
            self.push(request, true);
        }

        fn redo(&mut self) {
            let request = Request::new_redo(self.current.clone(), 1);
            self.push(request, true);
        }
    }

    fn always(_: &Request, _: &Request) -> bool { true }

    fn never(_: &Request, _: &Request) -> bool { false }

    #[test]
    fn test_policy_decides() {
        let mut session = Session::new(always, &Config::unlimited());
        session.insert();
        session.insert();
        session.insert();
        assert!(session.grouping.len() == 3);
        assert!(session.grouping.undo_size() == 3);
        assert!(session.grouping.redo_size() == 0);

        let mut session = Session::new(never, &Config::unlimited());
        session.insert();
        session.insert();
        assert!(session.grouping.undo_size() == 1);
    }

    #[test]
    fn test_closure_policy() {
        let mut calls = 0;
        {
            let mut session = Session::new(|_: &Request, _: &Request| { calls += 1; calls % 2 == 0 }, &Config::unlimited());
            session.insert();
            session.insert(); // calls = 1, new step
            session.insert(); // calls = 2, joins
            assert!(session.grouping.undo_size() == 2);
        }
        assert!(calls == 2);
    }

    #[test]
    fn test_undo_redo_moves_cursor() {
        let mut session = Session::new(always, &Config::unlimited());
        session.insert();
        session.insert();
        session.undo();
        session.undo();
        assert!(session.grouping.item_pos() == 0);
        assert!(session.grouping.undo_size() == 0);
        assert!(session.grouping.redo_size() == 2);

        session.redo();
        assert!(session.grouping.item_pos() == 1);
        assert!(session.grouping.undo_size() == 1);
        assert!(session.grouping.redo_size() == 1);
    }

    #[test]
    fn test_do_truncates_redo() {
        let mut session = Session::new(never, &Config::unlimited());
        session.insert();
        session.insert();
        session.undo();
        assert!(session.grouping.redo_size() == 1);

        session.insert();
        assert!(session.grouping.len() == 2);
        assert!(session.grouping.redo_size() == 0);
        assert!(session.grouping.item_pos() == 2);
    }

    #[test]
    fn test_explicit_group() {
        let mut session = Session::new(never, &Config::unlimited());
        session.insert();
        session.grouping.start_group(false);
        session.insert();
        session.insert();
        session.insert();
        session.grouping.end_group(false);
        assert!(session.grouping.undo_size() == 3);

        session.insert();
        assert!(session.grouping.undo_size() == 1);
    }

    #[test]
    fn test_explicit_group_joins_neighbours() {
        let mut session = Session::new(always, &Config::unlimited());
        session.insert();
        session.grouping.start_group(true);
        session.insert();
        session.grouping.end_group(true);
        session.insert();
        assert!(session.grouping.undo_size() == 3);

        session.grouping.start_group(false);
        session.insert();
        session.grouping.end_group(false);
        session.insert();
        assert!(session.grouping.undo_size() == 1);
        session.undo();
        assert!(session.grouping.undo_size() == 1);
    }

    #[test]
    fn test_nested_groups() {
        let mut session = Session::new(never, &Config::unlimited());
        session.grouping.start_group(false);
        session.insert();
        session.grouping.start_group(false);
        session.insert();
        session.grouping.end_group(false);
        session.insert();
        session.grouping.end_group(false);
        assert!(session.grouping.undo_size() == 3);
    }

    #[test]
    #[should_panic]
    fn test_unbalanced_end_group() {
        let mut grouping = UndoGrouping::new(1, never, &Config::default());
        grouping.end_group(true);
    }

    // Requests pair up into steps by their position in the log.
    fn pairs(_: &Request, request: &Request) -> bool { request.vector().get(1) % 2 == 1 }

    #[test]
    fn test_capacity() {
        let config = Config{max_total_log_size: Some(4)};
        let mut grouping = UndoGrouping::new(1, pairs, &config);
        let mut log = RequestLog::new(1);
        let mut vector = StateVector::new();
        for n in 0..5 {
            log.add_request(Request::new_do(vector.clone(), 1, Operation::NoOp));
            grouping.request_added(&log, n);
            vector.add(1, 1);
        }

        // Overflowing drops the first step, both of its requests.
        assert!(grouping.len() == 3);
        assert!(grouping.item_pos() == 3);
        assert!(grouping.undo_size() == 1);
        assert!(grouping.items.iter().map(|item| (item.index, item.in_group)).collect::<Vec<_>>() == vec![(2, false), (3, true), (4, false)]);
    }

    #[test]
    fn test_cleanup_evicts_old_requests() {
        let config = Config{max_total_log_size: Some(4)};
        let mut session = Session::new(never, &config);
        session.insert();
        session.insert();
        assert!(session.grouping.len() == 2);

        // The first request is 3 requests old and the cursor is at 3.
        session.insert();
        assert!(session.grouping.len() == 2);
        assert!(session.grouping.item_pos() == 2);
    }

    #[test]
    fn test_cleanup_evicts_whole_group() {
        let config = Config{max_total_log_size: Some(4)};
        let mut session = Session::new(always, &config);
        session.insert();
        session.insert();
        session.insert();
        assert!(session.grouping.is_empty());
        assert!(session.grouping.undo_size() == 0);
    }

    #[test]
    fn test_cleanup_unlimited() {
        let mut session = Session::new(never, &Config::unlimited());
        for _ in 0..50 {
            session.insert();
        }
        assert!(session.grouping.len() == 50);
    }

    #[test]
    fn test_cleanup_skips_unapplied() {
        let config = Config{max_total_log_size: Some(4)};
        let mut session = Session::new(never, &config);
        session.insert();
        session.insert();

        let mut current = session.current.clone();
        current.add(2, 10);
        let remote = Request::new_do(session.current.clone(), 2, Operation::NoOp);
        session.grouping.request_executed(&session.log, &remote, true, &current);
        assert!(session.grouping.len() == 2);

        let remote = Request::new_do(session.current.clone(), 2, Operation::remote_delete(0, 1));
        session.grouping.request_executed(&session.log, &remote, false, &current);
        assert!(session.grouping.len() == 2);

        session.grouping.request_executed(&session.log, &remote, true, &current);
        assert!(session.grouping.is_empty());
    }

    #[test]
    fn test_cleanup_clears_pending_redos() {
        let config = Config{max_total_log_size: Some(6)};
        let mut session = Session::new(never, &config);
        session.insert();
        session.insert();
        session.undo();
        session.undo();
        assert!(session.grouping.len() == 2);
        assert!(session.grouping.item_pos() == 0);
        assert!(session.grouping.redo_size() == 1);

        let mut current = session.current.clone();
        current.add(2, 10);
        let remote = Request::new_do(session.current.clone(), 2, Operation::remote_delete(0, 1));
        session.grouping.request_executed(&session.log, &remote, true, &current);
        assert!(session.grouping.is_empty());
        assert!(session.grouping.item_pos() == 0);
        assert!(session.grouping.redo_size() == 0);
    }

    #[test]
    fn test_undo_past_window_clears() {
        let mut session = Session::new(never, &Config::unlimited());
        let chunk = TextChunk::with_text(Encoding::Utf8, b"x", 1);
        let untracked = Request::new_do(StateVector::new(), 1, Operation::insert(0, chunk));
        session.push(untracked, false);
        session.insert();
        session.undo();
        assert!(session.grouping.len() == 1);

        session.undo();
        assert!(session.grouping.is_empty());
    }

    #[test]
    fn test_redo_past_window_clears() {
        let mut session = Session::new(never, &Config::unlimited());
        session.insert();
        let undo = Request::new_undo(session.current.clone(), 1);
        session.push(undo, false);
        session.redo();
        assert!(session.grouping.is_empty());
    }
}
