//! OData filter building
//!
//! Renders `$filter` expressions for the command layer. The client itself
//! never parses or validates filters.

#[derive(Debug, Clone)]
pub enum Filter {
    Eq(String, FilterValue),

    And(Vec<Filter>),
    Or(Vec<Filter>),
}

#[derive(Debug, Clone)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    /// Unquoted GUID literal
    Guid(String),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    /// Convert filter to OData query string
    pub fn to_odata_string(&self) -> String {
        match self {
            Filter::Eq(field, value) => format!("{} eq {}", field, value.to_odata_string()),

            Filter::And(filters) => join(filters, " and "),
            Filter::Or(filters) => join(filters, " or "),
        }
    }
}

fn join(filters: &[Filter], separator: &str) -> String {
    match filters {
        [] => String::new(),
        [single] => single.to_odata_string(),
        many => {
            let parts: Vec<String> = many.iter().map(|f| f.to_odata_string()).collect();
            format!("({})", parts.join(separator))
        }
    }
}

impl FilterValue {
    pub fn guid(value: impl Into<String>) -> Self {
        FilterValue::Guid(value.into())
    }

    pub fn to_odata_string(&self) -> String {
        match self {
            FilterValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Boolean(b) => b.to_string(),
            FilterValue::Guid(g) => g.clone(),
        }
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value as i64)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_filters() {
        assert_eq!(Filter::eq("statecode", 0).to_odata_string(), "statecode eq 0");
        assert_eq!(Filter::eq("ismanaged", false).to_odata_string(), "ismanaged eq false");
        assert_eq!(
            Filter::eq("_solutionid_value", FilterValue::guid("fd140aae-4df4-11dd-bd17-0019b9312238"))
                .to_odata_string(),
            "_solutionid_value eq fd140aae-4df4-11dd-bd17-0019b9312238"
        );
    }

    #[test]
    fn test_logical_operators() {
        let and_filter = Filter::and(vec![Filter::eq("category", 5), Filter::eq("statecode", 1)]);
        assert_eq!(and_filter.to_odata_string(), "(category eq 5 and statecode eq 1)");

        let or_filter = Filter::or(vec![Filter::eq("statecode", 0), Filter::eq("statecode", 1)]);
        assert_eq!(or_filter.to_odata_string(), "(statecode eq 0 or statecode eq 1)");
    }

    #[test]
    fn test_single_element_groups_are_not_wrapped() {
        assert_eq!(Filter::and(vec![Filter::eq("category", 5)]).to_odata_string(), "category eq 5");
        assert_eq!(Filter::or(vec![]).to_odata_string(), "");
    }

    #[test]
    fn test_quote_escaping() {
        assert_eq!(
            Filter::eq("friendlyname", "O'Connor Flows").to_odata_string(),
            "friendlyname eq 'O''Connor Flows'"
        );
    }
}
