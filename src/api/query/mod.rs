//! OData query parameter building
//!
//! Parameters are forwarded verbatim; nothing here validates them against
//! the server's metadata.

pub mod filters;
pub mod orderby;
pub mod params;

pub use filters::{Filter, FilterValue};
pub use orderby::OrderBy;
pub use params::QueryParams;
