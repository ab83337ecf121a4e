//! Web API paths, headers and well-known Dataverse codes

/// Dataverse Web API version
pub const API_VERSION: &str = "v9.2";

/// Base API path for Dataverse
pub const API_BASE_PATH: &str = "/api/data";

/// Full API path with version
pub fn api_path() -> String {
    format!("{}/{}", API_BASE_PATH, API_VERSION)
}

/// Path of a single record, e.g. `workflows(<guid>)`
pub fn record_path(entity_set: &str, id: &str) -> String {
    format!("{}({})", entity_set, id)
}

/// Standard headers for Dataverse requests
pub mod headers {
    pub const ACCEPT_JSON: &str = "application/json";

    pub const ODATA_MAX_VERSION: &str = "OData-MaxVersion";

    pub const ODATA_VERSION: &str = "OData-Version";

    pub const ODATA_VERSION_VALUE: &str = "4.0";

    /// Returned by creates answered with 204; holds the new record URL
    pub const ODATA_ENTITY_ID: &str = "OData-EntityId";

    pub const PREFER: &str = "Prefer";

    /// Prefer header for returning representation
    pub const PREFER_RETURN_REPRESENTATION: &str = "return=representation";

    /// Prefer header limiting records per page
    pub fn prefer_max_page_size(size: u32) -> String {
        format!("odata.maxpagesize={}", size)
    }
}

/// Annotations found in OData response bodies
pub mod annotations {
    pub const NEXT_LINK: &str = "@odata.nextLink";
    pub const COUNT: &str = "@odata.count";
}

/// `workflow.category` value of modern cloud flows
pub const CATEGORY_CLOUD_FLOW: i64 = 5;

/// `solutioncomponent.componenttype` codes
pub mod component_types {
    pub const WORKFLOW: i64 = 29;
    pub const CONNECTOR: i64 = 372;
}
