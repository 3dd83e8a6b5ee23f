//! # Adopted
//!
//! Adopted is the consistency core of a real-time collaborative text
//! editor. Many participants edit a shared document concurrently; each
//! site applies its own edits immediately and transforms remote edits
//! against whatever happened locally in the meantime. Once every site has
//! seen every request, all sites hold the same document.
//!
//! The crate provides the pieces a scheduler needs to do that:
//!
//! * **[StateVector](state_vector/struct.StateVector.html):** a vector clock
//!   that timestamps requests and decides causality
//! * **[TextChunk](text/struct.TextChunk.html):** an author-segmented text
//!   buffer in a fixed stream encoding
//! * **[Operation](operation/enum.Operation.html):** the edit primitives
//!   (insert, delete, split) and their pairwise transformation
//! * **[Request](request/struct.Request.html):** a timestamped Do, Undo or
//!   Redo wrapping an operation, with the adOPTed transform, mirror and
//!   fold functions
//! * **[RequestLog](request_log/struct.RequestLog.html):** a per-user log
//!   that pairs undos and redos with the requests they affect
//! * **[UndoGrouping](undo_grouping/struct.UndoGrouping.html):** batches
//!   consecutive requests into single undo steps
//!
//! ## Example
//!
//! ```rust
//! extern crate adopted;
//! use adopted::{Buffer, Encoding, Operation, Request, StateVector, TextBuffer, TextChunk};
//!
//! fn main() {
//!     let mut site1 = TextBuffer::from_utf8("hello", 1, Encoding::Utf8).unwrap();
//!     let mut site2 = site1.clone();
//!
//!     // Two users edit the same state concurrently.
//!     let insert = TextChunk::with_text(Encoding::Utf8, b"!", 1);
//!     let r1 = Request::new_do(StateVector::new(), 1, Operation::insert(5, insert));
//!     let r2 = Request::new_do(StateVector::new(), 2, Operation::remote_delete(0, 1));
//!
//!     // Each site applies its own request, then the transformed remote one.
//!     r1.operation().unwrap().apply(1, &mut site1);
//!     Request::transform(&r2, &r1, None, None).operation().unwrap().apply(2, &mut site1);
//!
//!     r2.operation().unwrap().apply(2, &mut site2);
//!     Request::transform(&r1, &r2, None, None).operation().unwrap().apply(1, &mut site2);
//!
//!     assert_eq!(site1.chunk(), site2.chunk());
//!     assert_eq!(site1.chunk().text(), b"ello!".to_vec());
//! }
//! ```
//!
//! ## Preconditions
//!
//! Malformed input data (state vector strings, XML) is reported through
//! [`Error`](enum.Error.html). Causally inconsistent calls into the
//! transformation functions are programming errors in the surrounding
//! scheduler and panic.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
extern crate quick_xml;
extern crate serde;
#[macro_use] extern crate serde_derive;
extern crate serde_json;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[macro_use] mod macros;

pub mod buffer;
pub mod config;
pub mod operation;
pub mod request;
pub mod request_log;
pub mod state_vector;
pub mod text;
pub mod undo_grouping;

mod error;

/// Identifies a participant. Ids are assigned by the session layer;
/// every request carries the id of the user that issued it.
pub type UserId = u32;

pub use buffer::{Buffer, TextBuffer};
pub use config::Config;
pub use error::Error;
pub use operation::{ConcurrencyId, Operation};
pub use request::{Action, Request, RequestType};
pub use request_log::RequestLog;
pub use state_vector::StateVector;
pub use text::{Encoding, Segment, TextChunk};
pub use undo_grouping::{GroupingPolicy, TextGroupingPolicy, UndoGrouping};
