//! Query-string construction.
//!
//! Query types list their fields explicitly through [`QueryParams`] instead of
//! being introspected at runtime. Omission rules are per field:
//!
//! - strings: omitted when empty
//! - optional values: omitted when `None`
//! - pagination counters (`offset`, `limit`, `page`, `size`): omitted when
//!   zero, which the service treats as "use the default"
//!
//! Fields are emitted in declaration order, joined with `&`.

use std::fmt::Display;

use url::form_urlencoded;

/// A type that can be rendered as a query string.
pub trait QueryParams {
    /// Append this value's fields, in declaration order, to `query`.
    fn write_query(&self, query: &mut QueryString);

    fn to_query_string(&self) -> String {
        let mut query = QueryString::new();
        self.write_query(&mut query);
        query.finish()
    }
}

/// Ordered `name=value` pairs with explicit omission rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string field; empty strings are skipped.
    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.pairs.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Add a pagination counter; zero is skipped.
    pub fn count(&mut self, name: &str, value: u32) -> &mut Self {
        if value != 0 {
            self.pairs.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Add an optional field; `None` is skipped, as is a value that
    /// stringifies to nothing.
    pub fn optional<V: Display>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            let rendered = value.to_string();
            if !rendered.is_empty() {
                self.pairs.push((name.to_string(), rendered));
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Render as `a=1&b=2`, percent-encoding names and values.
    pub fn finish(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Append the rendered query to `path`, adding `?` only when needed.
    pub fn append_to(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.finish())
        }
    }
}

impl QueryParams for QueryString {
    fn write_query(&self, query: &mut QueryString) {
        query.pairs.extend(self.pairs.iter().cloned());
    }
}
