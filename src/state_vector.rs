//! Vector clocks that timestamp requests.
//!
//! A `StateVector` maps each user to the number of that user's requests
//! a site has processed. Users that have not issued a request are absent
//! and count as zero. Components are kept sorted by user id, so lookups
//! and inserts are binary searches.
//!
//! The text form is `"<user>:<count>;<user>:<count>"`, sorted by user,
//! with zero components left out. The diff form uses the same grammar
//! and stores only the distance to a base vector both sides already know.

use Error;
use UserId;
use serde::{Serialize, Serializer, Deserialize, Deserializer};
use serde::de;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub struct StateVector(Vec<Component>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Component {
    user:  UserId,
    count: u32,
}

impl StateVector {
    /// Constructs an empty vector. Every component is zero.
    pub fn new() -> Self {
        StateVector(vec![])
    }

    /// Returns the number of requests of `user` the vector includes.
    pub fn get(&self, user: UserId) -> u32 {
        match self.find(user) {
            Ok(idx) => self.0[idx].count,
            Err(_) => 0,
        }
    }

    /// Sets the component of `user`. Setting a component to zero
    /// removes it.
    pub fn set(&mut self, user: UserId, count: u32) {
        match self.find(user) {
            Ok(idx) if count == 0 => { self.0.remove(idx); }
            Ok(idx) => self.0[idx].count = count,
            Err(_) if count == 0 => (),
            Err(idx) => self.0.insert(idx, Component{user, count}),
        }
    }

    /// Adds `delta` to the component of `user`. Panics if a negative
    /// delta would take the component below zero.
    pub fn add(&mut self, user: UserId, delta: i32) {
        let count = self.get(user);
        let updated = if delta < 0 {
            let decrement = delta.unsigned_abs();
            assert!(decrement <= count, "component {} is {} and cannot decrease by {}", user, count, decrement);
            count - decrement
        } else {
            count.checked_add(delta as u32).expect("state vector component overflow")
        };
        self.set(user, updated);
    }

    /// Returns true if every component is zero.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|c| c.count == 0)
    }

    /// Iterates over the nonzero components in ascending user order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(UserId, u32)> + 'a {
        self.0.iter().filter(|c| c.count > 0).map(|c| (c.user, c.count))
    }

    /// Total number of requests included in the vector.
    pub fn sum(&self) -> u64 {
        self.0.iter().map(|c| u64::from(c.count)).sum()
    }

    /// Returns true if the state `self` happened before or is equal to
    /// `other`, i.e. every component of `self` is less than or equal
    /// to the matching component of `other`.
    pub fn causally_before(&self, other: &StateVector) -> bool {
        self.0.iter().all(|c| c.count <= other.get(c.user))
    }

    /// Same as `causally_before`, except `self` is treated as if the
    /// component of `inc` were one larger. The transformation code
    /// uses this to check a request against the state after it without
    /// building a temporary vector.
    pub fn causally_before_inc(&self, other: &StateVector, inc: UserId) -> bool {
        if self.find(inc).is_err() && other.get(inc) == 0 {
            return false
        }

        self.0.iter().all(|c| {
            let count = if c.user == inc { u64::from(c.count) + 1 } else { u64::from(c.count) };
            count <= u64::from(other.get(c.user))
        })
    }

    /// Returns the number of requests between `self` and `other`: the
    /// sum of the component-wise differences. `self` must be causally
    /// before `other`.
    pub fn vdiff(&self, other: &StateVector) -> usize {
        assert!(self.causally_before(other), "vdiff of {} and {}: first vector is not causally before the second", self, other);
        (other.sum() - self.sum()) as usize
    }

    /// Writes the components of `self` relative to `orig`, which must be
    /// causally before `self`. The result is usually much shorter than
    /// the full text form and is read back with `from_string_diff`.
    pub fn to_string_diff(&self, orig: &StateVector) -> String {
        assert!(orig.causally_before(self), "{} is not causally before {}", orig, self);

        let mut diff = StateVector::new();
        for component in &self.0 {
            let delta = component.count - orig.get(component.user);
            if delta > 0 {
                diff.0.push(Component{user: component.user, count: delta});
            }
        }
        diff.to_string()
    }

    /// Reads a diff written by `to_string_diff` against the same `orig`.
    pub fn from_string_diff(diff: &str, orig: &StateVector) -> Result<StateVector, Error> {
        let diff: StateVector = diff.parse()?;
        let mut vector = orig.clone();

        for component in &diff.0 {
            let count = orig.get(component.user).checked_add(component.count).ok_or(Error::Overflow)?;
            vector.set(component.user, count);
        }

        Ok(vector)
    }

    fn find(&self, user: UserId) -> Result<usize, usize> {
        self.0.binary_search_by(|c| c.user.cmp(&user))
    }
}

/// A strict weak order for sorting vectors. It has nothing to do with
/// causality: concurrent vectors still compare as less or greater.
impl Ord for StateVector {
    fn cmp(&self, other: &StateVector) -> Ordering {
        let mut lhs = self.iter().peekable();
        let mut rhs = other.iter().peekable();

        loop {
            match (lhs.peek().cloned(), rhs.peek().cloned()) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((u1, c1)), Some((u2, c2))) => {
                    if u1 < u2 {
                        return Ordering::Greater
                    } else if u1 > u2 {
                        return Ordering::Less
                    } else if c1 != c2 {
                        return c1.cmp(&c2)
                    }
                    lhs.next();
                    rhs.next();
                }
            }
        }
    }
}

impl PartialOrd for StateVector {
    fn partial_cmp(&self, other: &StateVector) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for StateVector {
    fn eq(&self, other: &StateVector) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StateVector { }

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (idx, (user, count)) in self.iter().enumerate() {
            if idx > 0 { write!(f, ";")? }
            write!(f, "{}:{}", user, count)?;
        }
        Ok(())
    }
}

impl FromStr for StateVector {
    type Err = Error;

    fn from_str(string: &str) -> Result<StateVector, Error> {
        let mut vector = StateVector::new();
        if string.is_empty() { return Ok(vector) }

        for token in string.split(';') {
            let mut parts = token.splitn(2, ':');
            let user  = parse_number(parts.next().unwrap_or(""))?;
            let count = parse_number(parts.next().ok_or_else(|| Error::BadFormat(format!("expected ':' in \"{}\"", token)))?)?;

            match vector.find(user) {
                Ok(_) => return Err(Error::DuplicateComponent(user)),
                Err(idx) => vector.0.insert(idx, Component{user, count}),
            }
        }

        vector.0.retain(|c| c.count > 0);
        Ok(vector)
    }
}

fn parse_number(token: &str) -> Result<u32, Error> {
    try_assert!(token.bytes().all(|b| b.is_ascii_digit()), Error::BadFormat(format!("\"{}\" is not a number", token)));
    Ok(token.parse()?)
}

impl Serialize for StateVector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StateVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(de::Error::custom)
    }
}
