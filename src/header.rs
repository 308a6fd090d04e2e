//! Plain key/value HTTP headers.

use http::HeaderMap;
use std::fmt;

/// A single HTTP header.
///
/// Requests and responses carry headers as an ordered list of these pairs.
/// Keys are not required to be unique, so a response that sends `Set-Cookie`
/// twice yields two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpHeader {
    /// The header name.
    pub key: String,

    /// The header value.
    pub value: String,
}

impl HttpHeader {
    /// Creates a new header.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Flattens a [`HeaderMap`] into an ordered list, keeping every value of
    /// repeated headers.
    ///
    /// Values that are not valid UTF-8 are converted lossily.
    pub fn from_header_map(headers: &HeaderMap) -> Vec<HttpHeader> {
        headers
            .iter()
            .map(|(name, value)| {
                let value = match value.to_str() {
                    Ok(value) => value.to_string(),
                    Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
                };
                HttpHeader::new(name.as_str(), value)
            })
            .collect()
    }
}

impl fmt::Display for HttpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for HttpHeader
where
    K: Into<String>,
    V: Into<String>,
{
    fn from((key, value): (K, V)) -> Self {
        HttpHeader::new(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_from_header_map_keeps_duplicates() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let flat = HttpHeader::from_header_map(&headers);

        assert_eq!(flat.len(), 3);
        let cookies: Vec<&str> = flat
            .iter()
            .filter(|h| h.key == "set-cookie")
            .map(|h| h.value.as_str())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_from_header_map_lossy_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-raw", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let flat = HttpHeader::from_header_map(&headers);

        assert_eq!(flat[0].key, "x-raw");
        assert!(flat[0].value.starts_with("caf"));
    }

    #[test]
    fn test_display() {
        let header = HttpHeader::from(("Accept", "application/json"));
        assert_eq!(header.to_string(), "Accept: application/json");
    }
}
