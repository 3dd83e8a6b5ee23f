//! Timestamped requests and the adOPTed transformation functions.
//!
//! A request is what one user asks every site to do: perform an
//! operation, undo their last request or redo their last undo. Only Do
//! requests carry an operation. The operation of an Undo or Redo is
//! derived from the user's request log when it is executed.
//!
//! `transform`, `mirror` and `fold` never modify their arguments; each
//! returns a new request. Their preconditions are checked with
//! assertions, since a violation means the caller has already lost track
//! of causality.

use Buffer;
use UserId;
use operation::{ConcurrencyId, Operation};
use state_vector::StateVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "do")]
    Do(Operation),
    #[serde(rename = "undo")]
    Undo,
    #[serde(rename = "redo")]
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Do,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "a")]
    action: Action,
    #[serde(rename = "v")]
    vector: StateVector,
    #[serde(rename = "u")]
    user: UserId,
    #[serde(rename = "r", default)]
    received: Option<u64>,
    #[serde(rename = "x", default)]
    executed: Option<u64>,
}

impl Request {
    /// Constructs a request by `user` to apply `operation` to the state
    /// `vector`.
    pub fn new_do(vector: StateVector, user: UserId, operation: Operation) -> Self {
        Request::new(Action::Do(operation), vector, user)
    }

    pub fn new_undo(vector: StateVector, user: UserId) -> Self {
        Request::new(Action::Undo, vector, user)
    }

    pub fn new_redo(vector: StateVector, user: UserId) -> Self {
        Request::new(Action::Redo, vector, user)
    }

    fn new(action: Action, vector: StateVector, user: UserId) -> Self {
        Request{action, vector, user, received: None, executed: None}
    }

    /// Stamps the time the request arrived, in microseconds.
    pub fn with_received(mut self, received: u64) -> Self {
        self.received = Some(received);
        self
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn request_type(&self) -> RequestType {
        match self.action {
            Action::Do(_) => RequestType::Do,
            Action::Undo  => RequestType::Undo,
            Action::Redo  => RequestType::Redo,
        }
    }

    /// The state the request was generated at.
    pub fn vector(&self) -> &StateVector {
        &self.vector
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    /// The operation of a Do request. Undo and Redo requests have none.
    pub fn operation(&self) -> Option<&Operation> {
        match self.action {
            Action::Do(ref op) => Some(op),
            _ => None,
        }
    }

    pub fn received(&self) -> Option<u64> {
        self.received
    }

    pub fn executed(&self) -> Option<u64> {
        self.executed
    }

    /// Records when the request was executed, in microseconds.
    pub fn set_executed(&mut self, executed: u64) {
        self.executed = Some(executed);
    }

    /// Undo and Redo requests always affect the buffer; only requests
    /// that affected it can be undone in the first place.
    pub fn affects_buffer(&self) -> bool {
        match self.action {
            Action::Do(ref op) => op.affects_buffer(),
            _ => true,
        }
    }

    pub fn is_reversible(&self) -> bool {
        match self.action {
            Action::Do(ref op) => op.is_reversible(),
            _ => true,
        }
    }

    /// Returns a copy of a Do request whose operation has captured the
    /// text it deletes from `buffer`, which must be in the state the
    /// request applies to. Other requests are returned unchanged.
    pub fn make_reversible<B: Buffer>(&self, buffer: &B) -> Request {
        match self.action {
            Action::Do(ref op) if !op.is_reversible() => {
                Request{action: Action::Do(op.make_reversible(buffer)), ..self.clone()}
            }
            _ => self.clone(),
        }
    }

    /// Transforms `request` so that it applies on top of `against`.
    ///
    /// Both requests must be Do requests by different users generated at
    /// the same state. The result is generated at that state plus
    /// `against`. When the two operations cannot be ordered by their
    /// positions alone, `request_lcs` and `against_lcs` must be the two
    /// requests as they were at their least common state.
    pub fn transform(request: &Request, against: &Request, request_lcs: Option<&Request>, against_lcs: Option<&Request>) -> Request {
        let op = request.do_operation();
        let against_op = against.do_operation();
        assert!(request.user != against.user, "cannot transform two requests by user {}", request.user);
        assert!(request.vector == against.vector, "cannot transform {} against {}: states differ", request.vector, against.vector);

        let cid = if request.user > against.user { ConcurrencyId::Own } else { ConcurrencyId::Other };
        let lcs = if op.need_concurrency_id(against_op) {
            let (request_lcs, against_lcs) = match (request_lcs, against_lcs) {
                (Some(request_lcs), Some(against_lcs)) => (request_lcs, against_lcs),
                _ => panic!("transforming a request by user {} against user {} needs both least common state requests", request.user, against.user),
            };
            assert!(request_lcs.user == request.user && against_lcs.user == against.user, "least common state requests are by the wrong users");
            assert!(request_lcs.vector.causally_before(&request.vector), "least common state {} is not before {}", request_lcs.vector, request.vector);
            assert!(against_lcs.vector.causally_before(&against.vector), "least common state {} is not before {}", against_lcs.vector, against.vector);
            Some((request_lcs.do_operation(), against_lcs.do_operation()))
        } else {
            None
        };

        let mut vector = request.vector.clone();
        vector.add(against.user, 1);
        debug!("transforming request of user {} at {} against user {} ({:?})", request.user, request.vector, against.user, cid);

        Request{
            action: Action::Do(op.transform(against_op, lcs, cid)),
            vector,
            user: request.user,
            received: request.received,
            executed: None,
        }
    }

    /// Returns the Do request that reverts `request`, as if `by`
    /// further requests of the same user had happened in between. `by`
    /// must be odd: a request and its mirror are separated by pairs of
    /// undo and redo requests plus the mirrored request itself.
    pub fn mirror(request: &Request, by: i32) -> Request {
        let op = request.do_operation();
        assert!(by % 2 != 0, "mirror distance {} is not odd", by);
        assert!(op.is_reversible(), "request of user {} at {} is not reversible", request.user, request.vector);

        let mut vector = request.vector.clone();
        vector.add(request.user, by);
        debug!("mirroring request of user {} at {} by {}", request.user, request.vector, by);

        Request{
            action: Action::Do(op.revert()),
            vector,
            user: request.user,
            received: request.received,
            executed: None,
        }
    }

    /// Returns `request` as if `by` further requests of user `into` had
    /// happened before it. `by` must be even, `into` must not be the
    /// request's own user.
    pub fn fold(request: &Request, into: UserId, by: i32) -> Request {
        assert!(into != request.user, "cannot fold a request of user {} into its own component", into);
        assert!(by % 2 == 0, "fold distance {} is not even", by);

        let mut vector = request.vector.clone();
        vector.add(into, by);
        debug!("folding request of user {} at {} into user {} by {}", request.user, request.vector, into, by);

        Request{vector, executed: None, ..request.clone()}
    }

    fn do_operation(&self) -> &Operation {
        match self.action {
            Action::Do(ref op) => op,
            _ => panic!("request of user {} at {} is a {:?} request, not a Do request", self.user, self.vector, self.request_type()),
        }
    }
}
