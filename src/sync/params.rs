use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use url::form_urlencoded;

/// Decoded URL query: every key maps to all of its values in arrival order.
///
/// Keys are kept sorted so that encoding is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without its leading `?`.
    ///
    /// Array-style keys (`companies[]`, `companies[0]`) fold into the bare key,
    /// so they read the same as repeated keys.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.append(normalize_key(&key), value.into_owned());
        }
        params
    }

    pub fn append(&mut self, key: &str, value: String) {
        self.pairs.entry(key.to_string()).or_default().push(value);
    }

    /// Replace all values for `key`. An empty list removes the key.
    pub fn set(&mut self, key: &str, values: Vec<String>) {
        if values.is_empty() {
            self.pairs.remove(key);
        } else {
            self.pairs.insert(key.to_string(), values);
        }
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.pairs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as `a=1&a=2&b=3` (no leading `?`).
    pub fn encode(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.pairs {
            for value in values {
                ser.append_pair(key, value);
            }
        }
        ser.finish()
    }
}

fn normalize_key(key: &str) -> &str {
    match key.find('[') {
        Some(idx) if key.ends_with(']') => &key[..idx],
        _ => key,
    }
}

/// A page location: path plus decoded query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub query: QueryParams,
}

impl Location {
    pub fn new(pathname: impl Into<String>, query: QueryParams) -> Self {
        Self {
            pathname: pathname.into(),
            query,
        }
    }

    /// Parse `/path?query`, a bare `?query`, or an absolute URL.
    pub fn parse(input: &str, default_path: &str) -> Result<Self> {
        let input = input.trim();
        if input.starts_with('?') || input.is_empty() {
            return Ok(Self::new(default_path, QueryParams::parse(input)));
        }

        let base = url::Url::parse("http://localhost/").context("Invalid base URL")?;
        let parsed = base
            .join(input)
            .with_context(|| format!("Invalid location: {input}"))?;

        let pathname = match parsed.path() {
            "" | "/" => default_path.to_string(),
            p => p.to_string(),
        };
        Ok(Self::new(
            pathname,
            QueryParams::parse(parsed.query().unwrap_or_default()),
        ))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            write!(f, "{}", self.pathname)
        } else {
            write!(f, "{}?{}", self.pathname, self.query.encode())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_and_array_keys_read_the_same() {
        let repeated = QueryParams::parse("?companies=Google&companies=Meta");
        let array = QueryParams::parse("companies[]=Google&companies[]=Meta");
        let indexed = QueryParams::parse("companies[0]=Google&companies[1]=Meta");
        assert_eq!(repeated, array);
        assert_eq!(repeated, indexed);
        assert_eq!(repeated.get_all("companies"), &["Google", "Meta"]);
    }

    #[test]
    fn encode_sorts_keys_and_escapes_values() {
        let mut params = QueryParams::new();
        params.set("sortType", vec!["TOP".into()]);
        params.set("companies", vec!["Jane Street".into(), "A&B".into()]);
        params.set("roles", Vec::new());
        assert_eq!(
            params.encode(),
            "companies=Jane+Street&companies=A%26B&sortType=TOP"
        );
    }

    #[test]
    fn location_parses_paths_and_absolute_urls() {
        let loc = Location::parse("/questions/browse?sortOrder=asc", "/x").unwrap();
        assert_eq!(loc.pathname, "/questions/browse");
        assert_eq!(loc.query.first("sortOrder"), Some("asc"));

        let loc = Location::parse("https://example.org/questions/browse?a=1", "/x").unwrap();
        assert_eq!(loc.pathname, "/questions/browse");
        assert_eq!(loc.query.first("a"), Some("1"));

        let loc = Location::parse("?roles=SWE", "/questions/browse").unwrap();
        assert_eq!(loc.pathname, "/questions/browse");
        assert_eq!(loc.to_string(), "/questions/browse?roles=SWE");
    }

    #[test]
    fn empty_query_displays_bare_path() {
        let loc = Location::new("/questions/browse", QueryParams::new());
        assert_eq!(loc.to_string(), "/questions/browse");
    }
}
