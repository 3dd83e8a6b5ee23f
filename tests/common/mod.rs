extern crate adopted;
extern crate rand;
extern crate rmp_serde;
extern crate serde;
extern crate serde_json;

use self::adopted::{TextChunk, UserId};
use self::rand::Rng;

pub fn test_serde<T>(value: T)
    where T: ::std::fmt::Debug + serde::Serialize + serde::de::DeserializeOwned + PartialEq
 {
    let json = serde_json::to_string(&value).unwrap();
    let value2 = serde_json::from_str(&json).unwrap();
    assert_eq!(value, value2);

    let msgpack = rmp_serde::to_vec(&value).unwrap();
    let value3 = rmp_serde::from_slice(&msgpack).unwrap();
    assert_eq!(value, value3);
}

/// Runs of characters by author, with neighbouring runs of the same
/// author joined, so chunks can be compared regardless of segmentation.
pub fn authored(chunk: &TextChunk) -> Vec<(UserId, String)> {
    let mut runs: Vec<(UserId, String)> = vec![];
    for segment in chunk.segments() {
        let text = chunk.encoding().decode(segment.text()).unwrap();
        let extend = match runs.last() {
            Some(&(author, _)) => author == segment.author(),
            None => false,
        };
        if extend {
            if let Some(last) = runs.last_mut() {
                last.1.push_str(&text);
            }
        } else {
            runs.push((segment.author(), text));
        }
    }
    runs
}

pub fn random_text<R: Rng>(rng: &mut R, max_len: usize) -> String {
    const ALPHABET: &[char] = &['a', 'b', 'c', ' ', 'é', '€', '\n', '😀'];
    let len = rng.gen_range(1..=max_len);
    (0..len).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())]).collect()
}
