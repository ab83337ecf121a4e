//! Dataverse Web API client
//!
//! Thin wrapper over the OData endpoints: four verbs against relative
//! resource paths, bearer auth from the credential resolver, one retry after
//! a 401, and next-link pagination.

pub mod client;
pub mod constants;
pub mod pagination;
pub mod query;

pub use client::{DataverseClient, MAX_ATTEMPTS};
pub use pagination::{Page, Pages};
pub use query::{Filter, FilterValue, OrderBy, QueryParams};
