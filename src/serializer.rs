//! Pluggable conversion between typed values and wire strings.

use serde::{de::DeserializeOwned, Serialize};
use std::error::Error as StdError;

/// A codec failed to encode or decode a body.
///
/// The underlying codec error is kept as the [`source`](StdError::source).
#[derive(thiserror::Error, Debug)]
#[error("{source}")]
pub struct SerializationError {
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl SerializationError {
    /// Wraps a codec error.
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::new(err)
    }
}

/// Converts values to and from the strings sent over the wire.
///
/// A [`RestService`](crate::RestService) is bound to one serializer for its
/// whole lifetime; the serializer's [`content_type`](Self::content_type)
/// drives the service's default request settings.
///
/// # Examples
///
/// ```
/// use simplerest::{JsonStringSerializer, StringSerializer};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Widget { id: u32 }
///
/// let json = JsonStringSerializer;
/// let wire = json.serialize(Some(&Widget { id: 7 })).unwrap();
/// assert_eq!(wire.as_deref(), Some(r#"{"id":7}"#));
///
/// let widget: Option<Widget> = json.deserialize(r#"{"id":7}"#).unwrap();
/// assert_eq!(widget, Some(Widget { id: 7 }));
/// ```
pub trait StringSerializer: Send + Sync {
    /// The media type produced and expected by this serializer.
    fn content_type(&self) -> &str;

    /// Serializes `value`.
    ///
    /// An absent value produces no body (`Ok(None)`).
    fn serialize<T>(&self, value: Option<&T>) -> Result<Option<String>, SerializationError>
    where
        T: Serialize + ?Sized;

    /// Deserializes `content`.
    ///
    /// Empty or whitespace-only content yields `Ok(None)` without touching
    /// the codec.
    fn deserialize<T>(&self, content: &str) -> Result<Option<T>, SerializationError>
    where
        T: DeserializeOwned;
}

/// JSON serialization backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStringSerializer;

impl StringSerializer for JsonStringSerializer {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn serialize<T>(&self, value: Option<&T>) -> Result<Option<String>, SerializationError>
    where
        T: Serialize + ?Sized,
    {
        match value {
            Some(value) => Ok(Some(serde_json::to_string(value)?)),
            None => Ok(None),
        }
    }

    fn deserialize<T>(&self, content: &str) -> Result<Option<T>, SerializationError>
    where
        T: DeserializeOwned,
    {
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(content)?))
    }
}
