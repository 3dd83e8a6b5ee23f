//! The requests of one user, in the order they were issued.
//!
//! Entry `n` is the request the user issued when their own component
//! of the state vector was `n`. Every Undo is associated with the Do or
//! Redo it undoes and every Redo with the Undo it redoes, so a Do and
//! all undos and redos of it form a chain.

use UserId;
use request::{Request, RequestType};
use std::cmp::max;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RequestLog {
    user: UserId,
    begin: usize,
    entries: VecDeque<Entry>,
    undo_stack: Vec<usize>,
    redo_stack: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Entry {
    request: Request,
    original: usize,
    prev_associated: Option<usize>,
    next_associated: Option<usize>,
}

impl RequestLog {
    pub fn new(user: UserId) -> Self {
        RequestLog::with_begin(user, 0)
    }

    /// Constructs a log whose first request will be number `begin`, for
    /// users whose earlier requests are not known locally.
    pub fn with_begin(user: UserId, begin: usize) -> Self {
        RequestLog{user, begin, entries: VecDeque::new(), undo_stack: vec![], redo_stack: vec![]}
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    /// Index of the oldest request still in the log.
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Index the next request will get.
    pub fn end(&self) -> usize {
        self.begin + self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `request` and links Undo and Redo requests to the request
    /// they affect. Panics if the request is not by the log's user, is
    /// not the user's next request, or has nothing to undo or redo.
    pub fn add_request(&mut self, request: Request) {
        let index = self.end();
        assert!(request.user() == self.user, "request of user {} added to the log of user {}", request.user(), self.user);
        assert!(request.vector().get(self.user) as usize == index, "request at {} is not request number {} of user {}", request.vector(), index, self.user);

        let associated = match request.request_type() {
            RequestType::Do => {
                self.redo_stack.clear();
                self.undo_stack.push(index);
                None
            }
            RequestType::Undo => {
                let undone = match self.undo_stack.pop() {
                    Some(undone) => undone,
                    None => panic!("user {} has nothing to undo", self.user),
                };
                self.redo_stack.push(index);
                Some(undone)
            }
            RequestType::Redo => {
                let redone = match self.redo_stack.pop() {
                    Some(redone) => redone,
                    None => panic!("user {} has nothing to redo", self.user),
                };
                self.undo_stack.push(index);
                Some(redone)
            }
        };

        let original = match associated {
            Some(prev) => {
                let entry = self.entry_mut(prev);
                entry.next_associated = Some(index);
                entry.original
            }
            None => index,
        };

        debug!("user {} logs request {} ({:?})", self.user, index, request.request_type());
        self.entries.push_back(Entry{request, original, prev_associated: associated, next_associated: None});
    }

    pub fn get(&self, n: usize) -> Option<&Request> {
        self.entry(n).map(|entry| &entry.request)
    }

    /// Same as `get`, but panics if `n` is not in the log.
    pub fn get_request(&self, n: usize) -> &Request {
        match self.get(n) {
            Some(request) => request,
            None => panic!("request {} of user {} is not in [{}, {})", n, self.user, self.begin, self.end()),
        }
    }

    /// Index of the Do request at the start of the chain `n` is in.
    pub fn original_request(&self, n: usize) -> Option<usize> {
        self.entry(n).map(|entry| entry.original)
    }

    /// Index of the request that `n` undoes or redoes.
    pub fn prev_associated(&self, n: usize) -> Option<usize> {
        self.entry(n).and_then(|entry| entry.prev_associated)
    }

    /// Index of the request that undoes or redoes `n`.
    pub fn next_associated(&self, n: usize) -> Option<usize> {
        self.entry(n).and_then(|entry| entry.next_associated)
    }

    /// Index of the request an Undo issued now would undo.
    pub fn next_undo(&self) -> Option<usize> {
        self.undo_stack.last().cloned()
    }

    /// Index of the Undo a Redo issued now would redo.
    pub fn next_redo(&self) -> Option<usize> {
        self.redo_stack.last().cloned()
    }

    /// Returns the newest request that is related to `n`. Requests are
    /// related when they are in the same chain, or in chains that
    /// overlap. Everything from `n` up to the returned index has to be
    /// kept or removed together.
    pub fn upper_related(&self, n: usize) -> usize {
        assert!(self.entry(n).is_some(), "request {} of user {} is not in the log", n, self.user);

        let mut upper = n;
        let mut idx = n;
        while idx <= upper {
            let mut last = idx;
            while let Some(next) = self.next_associated(last) {
                last = next;
            }
            upper = max(upper, last);
            idx += 1;
        }
        upper
    }

    /// Removes all requests before `up_to`. Panics if a removed request
    /// is associated with one that stays.
    pub fn remove_requests(&mut self, up_to: usize) {
        assert!(up_to <= self.end(), "cannot remove requests up to {} from a log ending at {}", up_to, self.end());

        while self.begin < up_to {
            let entry = match self.entries.pop_front() {
                Some(entry) => entry,
                None => break,
            };
            if let Some(next) = entry.next_associated {
                assert!(next < up_to, "request {} is still associated with request {}", self.begin, next);
            }
            self.begin += 1;
        }

        self.undo_stack.retain(|&idx| idx >= up_to);
        self.redo_stack.retain(|&idx| idx >= up_to);
        debug!("user {} log now starts at {}", self.user, self.begin);
    }

    fn entry(&self, n: usize) -> Option<&Entry> {
        if n < self.begin { return None }
        self.entries.get(n - self.begin)
    }

    fn entry_mut(&mut self, n: usize) -> &mut Entry {
        assert!(n >= self.begin, "request {} was removed from the log", n);
        let begin = self.begin;
        &mut self.entries[n - begin]
    }
}
