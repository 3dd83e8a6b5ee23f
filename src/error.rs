use quick_xml;
use serde_json;
use std::num::{IntErrorKind, ParseIntError};
use UserId;

/// Recoverable errors raised while reading external data.
/// A failed parse never leaves a partially built value behind.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum Error {
    #[fail(display = "bad format: {}", _0)]
    BadFormat(String),
    #[fail(display = "component {} is set more than once", _0)]
    DuplicateComponent(UserId),
    #[fail(display = "unexpected end of input")]
    UnexpectedEof,
    #[fail(display = "numeric overflow")]
    Overflow,
    #[fail(display = "invalid XML: {}", _0)]
    InvalidXml(String),
    #[fail(display = "missing attribute \"{}\"", _0)]
    MissingAttribute(&'static str),
    #[fail(display = "invalid author id \"{}\"", _0)]
    InvalidAuthor(String),
    #[fail(display = "text is not valid {}", _0)]
    Encoding(&'static str),
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),
}

impl From<ParseIntError> for Error {
    fn from(err: ParseIntError) -> Error {
        match *err.kind() {
            IntErrorKind::Empty => Error::UnexpectedEof,
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Error::Overflow,
            _ => Error::BadFormat(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        match err {
            quick_xml::Error::UnexpectedEof(_) => Error::UnexpectedEof,
            err => Error::InvalidXml(err.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Error {
        Error::InvalidXml(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::InvalidConfig(err.to_string())
    }
}
