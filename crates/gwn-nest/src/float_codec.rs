//! Serde adapters that keep non-finite floats in JSON artifacts.
//!
//! JSON has no literal for infinities or NaN, and nested sampling produces
//! them routinely (`-inf` log-likelihoods and log-weights early in a run, NaN
//! noise evidence). Finite values are written as numbers; `inf`, `-inf` and
//! `nan` are written as strings. Used through `#[serde(with = "...")]`.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// `f64` wrapper carrying the codec, for use inside containers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoded(pub f64);

impl Serialize for Encoded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Encoded {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize(deserializer).map(Encoded)
    }
}

/// Serializes one float.
pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

/// Deserializes one float written by [`serialize`].
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(FloatVisitor)
}

struct FloatVisitor;

impl<'de> Visitor<'de> for FloatVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or one of \"inf\", \"-inf\", \"nan\"")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
        Ok(value)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
        match value {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

/// Adapter for `Vec<f64>`.
pub mod vec {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Encoded;

    /// Serializes a float vector.
    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|&value| Encoded(value)))
    }

    /// Deserializes a float vector.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let encoded = Vec::<Encoded>::deserialize(deserializer)?;
        Ok(encoded.into_iter().map(|Encoded(value)| value).collect())
    }
}

/// Adapter for row-major `Vec<Vec<f64>>` tables.
pub mod matrix {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Encoded;

    /// Serializes a table row by row.
    pub fn serialize<S: Serializer>(rows: &[Vec<f64>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            rows.iter()
                .map(|row| row.iter().map(|&value| Encoded(value)).collect::<Vec<_>>()),
        )
    }

    /// Deserializes a table.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<f64>>, D::Error> {
        let encoded = Vec::<Vec<Encoded>>::deserialize(deserializer)?;
        Ok(encoded
            .into_iter()
            .map(|row| row.into_iter().map(|Encoded(value)| value).collect())
            .collect())
    }
}
