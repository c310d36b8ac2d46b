//! Deserializers for numeric fields FMP sometimes sends as strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Num(f64),
    Str(String),
}

impl NumOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumOrString::Num(n) => Ok(n),
            NumOrString::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid number: {:?}", s))),
        }
    }
}

pub(crate) fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumOrString::deserialize(deserializer)?.into_f64()
}

pub(crate) fn opt_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumOrString::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => v.into_f64().map(Some),
    }
}

/// Integer field that may arrive as a float (`3.2e12`) or a string. Truncates.
pub(crate) fn opt_i64_lenient<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_f64_lenient(deserializer)?
        .filter(|v| v.is_finite())
        .map(|v| v as i64))
}
