//! Query-string merging for request URLs.

use crate::Result;
use url::{form_urlencoded, Url};

/// Appends query parameters to a base URL.
///
/// # Examples
///
/// ```
/// use simplerest::UrlBuilder;
///
/// let builder = UrlBuilder::new();
///
/// assert_eq!(
///     builder.build("http://x/y", [("b", "2")]),
///     "http://x/y?b=2"
/// );
/// assert_eq!(
///     builder.build("http://x/y?a=1", [("b", "2")]),
///     "http://x/y?a=1&b=2"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlBuilder;

impl UrlBuilder {
    /// Creates a new `UrlBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Merges `params` into `base_url`.
    ///
    /// Keys and values are form-urlencoded. The pairs are joined with `&` and
    /// appended with `?`, or with `&` when the base already carries a query
    /// component (a literal `?` or an encoded `%3F`). With no parameters the
    /// base is returned unchanged.
    pub fn build<I, K, V>(&self, base_url: &str, params: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let query = params
            .into_iter()
            .map(|(key, value)| format!("{}={}", encode(key.as_ref()), encode(value.as_ref())))
            .collect::<Vec<_>>()
            .join("&");

        if query.is_empty() {
            return base_url.to_string();
        }

        let separator = if has_query(base_url) { '&' } else { '?' };
        format!("{}{}{}", base_url, separator, query)
    }

    /// Like [`build`](Self::build), then parses the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if the merged
    /// URL cannot be parsed.
    pub fn build_url<I, K, V>(&self, base_url: &str, params: I) -> Result<Url>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(Url::parse(&self.build(base_url, params))?)
    }
}

fn encode(component: &str) -> String {
    form_urlencoded::byte_serialize(component.as_bytes()).collect()
}

fn has_query(url: &str) -> bool {
    url.contains('?') || url.to_ascii_lowercase().contains("%3f")
}
