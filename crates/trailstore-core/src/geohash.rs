//! Geohash cells.
//!
//! Encoding and decoding go through the `geohash` crate; this module adds
//! the key-range helpers proximity matching needs. The alphabet is
//! ascending in ASCII, so byte-wise string order matches cell order and a
//! cell's descendants form one contiguous key range.

use crate::error::{Error, ErrorClass, ErrorOrigin};
use geohash::{Coord, GeohashError};

pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";
pub const DEFAULT_PRECISION: usize = 12;
pub const MAX_PRECISION: usize = 12;

///
/// Bounds
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    #[must_use]
    pub const fn center(&self) -> (f64, f64) {
        (
            f64::midpoint(self.min_lat, self.max_lat),
            f64::midpoint(self.min_lon, self.max_lon),
        )
    }

    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorClass::Validation, ErrorOrigin::Geohash, message)
}

fn codec_error(err: &GeohashError) -> Error {
    invalid(format!("geohash: {err}"))
}

fn char_index(c: u8) -> Option<usize> {
    BASE32.iter().position(|&b| b == c)
}

/// Encode a coordinate at `precision` characters.
pub fn encode(lat: f64, lon: f64, precision: usize) -> Result<String, Error> {
    if !(1..=MAX_PRECISION).contains(&precision) {
        return Err(invalid(format!(
            "precision {precision} is outside [1, {MAX_PRECISION}]"
        )));
    }

    geohash::encode(Coord { x: lon, y: lat }, precision).map_err(|err| codec_error(&err))
}

/// Reject empty hashes and characters outside the alphabet.
pub fn validate(hash: &str) -> Result<(), Error> {
    if hash.is_empty() {
        return Err(invalid("geohash is empty"));
    }
    if hash.len() > MAX_PRECISION {
        return Err(invalid(format!(
            "geohash '{hash}' is longer than {MAX_PRECISION} characters"
        )));
    }
    if let Some(bad) = hash.bytes().find(|&b| char_index(b).is_none()) {
        return Err(invalid(format!(
            "geohash '{hash}' contains '{}', which is not a base-32 geohash character",
            char::from(bad)
        )));
    }

    Ok(())
}

/// The cell a hash names.
pub fn bounds(hash: &str) -> Result<Bounds, Error> {
    validate(hash)?;

    let rect = geohash::decode_bbox(hash).map_err(|err| codec_error(&err))?;
    let (min, max) = (rect.min(), rect.max());

    Ok(Bounds {
        min_lat: min.y,
        max_lat: max.y,
        min_lon: min.x,
        max_lon: max.x,
    })
}

/// Cell center as `(lat, lon)`.
pub fn decode(hash: &str) -> Result<(f64, f64), Error> {
    validate(hash)?;

    let (center, _, _) = geohash::decode(hash).map_err(|err| codec_error(&err))?;

    Ok((center.y, center.x))
}

/// Enclosing cell one level up; `None` for a single character.
#[must_use]
pub fn parent(hash: &str) -> Option<&str> {
    match hash.len() {
        0 | 1 => None,
        len => hash.get(..len - 1),
    }
}

/// Lexicographic successor of equal length, carrying past `z`.
///
/// `None` when every character is `z`: nothing of that length sorts after
/// it, so the range above it is unbounded.
#[must_use]
pub fn increment(hash: &str) -> Option<String> {
    let mut bytes = hash.as_bytes().to_vec();

    for slot in bytes.iter_mut().rev() {
        let index = char_index(*slot)?;
        if index + 1 < BASE32.len() {
            *slot = BASE32[index + 1];
            return String::from_utf8(bytes).ok();
        }
        *slot = BASE32[0];
    }

    None
}

/// Half-open key range `[lower, upper)` used for proximity matching.
///
/// The hash is truncated by one character and the range spans that prefix
/// up to its successor. This is an approximation: only one neighbouring
/// prefix step is covered, so two points either side of a parent-cell
/// border are not matched even when they are metres apart. A bound of
/// `None` is unbounded.
#[must_use]
pub fn adjacency_range(hash: &str) -> (Option<String>, Option<String>) {
    match parent(hash) {
        Some(prefix) => (Some(prefix.to_string()), increment(prefix)),
        None => (None, None),
    }
}

///
/// TESTS
///
