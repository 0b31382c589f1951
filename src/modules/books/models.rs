use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// A persisted book row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Assigned by the store's sequence; never supplied by callers
    pub id: i32,
    pub title: String,
    pub author: String,
    pub published_year: Option<i32>,
}

/// Request model for creating a new book.
///
/// Fields are not checked here. Each JSON value is carried in its text form
/// and the store coerces it into the column type; a missing or null value
/// reaches the store as NULL and is rejected by its `NOT NULL` constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewBook {
    #[serde(default, deserialize_with = "as_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "as_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "as_text")]
    pub published_year: Option<String>,
}

/// Why a request body could not be turned into a [`NewBook`].
#[derive(Debug, Error)]
pub enum MalformedBody {
    #[error("request body is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("request body has an unusable field: {0}")]
    Field(#[source] serde_json::Error),
}

impl NewBook {
    /// Parse a complete request body.
    pub fn from_json(body: &[u8]) -> Result<Self, MalformedBody> {
        let value: Value = serde_json::from_slice(body).map_err(MalformedBody::Syntax)?;

        if !value.is_object() {
            return Err(MalformedBody::NotAnObject);
        }

        serde_json::from_value(value).map_err(MalformedBody::Field)
    }
}

fn as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_text))
}

/// Text form of a JSON value, as a query parameter would carry it.
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number_text(&number)),
        other => Some(other.to_string()),
    }
}

/// `1999.0` and `1999` are the same number; render integral floats without a fraction.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e15 => {
            format!("{}", float as i64)
        }
        _ => number.to_string(),
    }
}
