//! Query parameters for Web API requests
//!
//! `QueryParams` is an ordered key/value mapping. Well-known OData options
//! get builder methods; anything else goes through `param`.

use super::filters::Filter;
use super::orderby::OrderBy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary parameter, replacing an earlier value for the same key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// `$select` from a list of fields
    pub fn select(self, fields: &[&str]) -> Self {
        self.param("$select", fields.join(","))
    }

    /// `$select` from an already comma-separated list
    pub fn select_raw(self, fields: impl Into<String>) -> Self {
        self.param("$select", fields)
    }

    pub fn filter(self, filter: Filter) -> Self {
        self.filter_raw(filter.to_odata_string())
    }

    pub fn filter_raw(self, filter: impl Into<String>) -> Self {
        self.param("$filter", filter)
    }

    pub fn orderby(self, order: OrderBy) -> Self {
        self.param("$orderby", order.to_odata_string())
    }

    /// Limit number of results
    pub fn top(self, top: u32) -> Self {
        self.param("$top", top.to_string())
    }

    /// Include `@odata.count` in the response
    pub fn count(self) -> Self {
        self.param("$count", "true")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}
