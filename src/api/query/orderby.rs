//! OData `$orderby` clauses

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Asc(String),
    Desc(String),
    /// Clause given verbatim, e.g. from the command line
    Raw(String),
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self::Asc(field.into())
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::Desc(field.into())
    }

    pub fn raw(clause: impl Into<String>) -> Self {
        Self::Raw(clause.into())
    }

    pub fn to_odata_string(&self) -> String {
        match self {
            OrderBy::Asc(field) => format!("{} asc", field),
            OrderBy::Desc(field) => format!("{} desc", field),
            OrderBy::Raw(clause) => clause.clone(),
        }
    }
}
