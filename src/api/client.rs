use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

use super::constants::headers;
use super::pagination::{Page, Pages};
use super::query::QueryParams;
use crate::auth::CredentialResolver;
use crate::config::Config;
use crate::error::{DataverseError, Result};

/// A request is sent at most this many times: once, plus one retry after a 401
pub const MAX_ATTEMPTS: usize = 2;

/// Dataverse Web API client.
///
/// Paths are relative to `{base_url}/api/data/v9.2`; absolute URLs (next
/// links) are used as given. The bearer token always comes from the owned
/// `CredentialResolver`.
pub struct DataverseClient {
    http_client: reqwest::Client,
    api_base: String,
    credentials: CredentialResolver,
    page_size: Option<u32>,
}

/// Outcome of a single send
enum Attempt {
    Completed(Response),
    Unauthorized(String),
}

/// Everything needed to send (and resend) one request
struct RequestSpec<'a> {
    method: Method,
    target: &'a str,
    params: &'a QueryParams,
    body: Option<Value>,
    prefer: Option<String>,
}

impl DataverseClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("dataverse-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::with_http_client(config, http_client)
    }

    /// Create a new client with custom HTTP client configuration
    pub fn with_http_client(config: &Config, http_client: reqwest::Client) -> Result<Self> {
        let credentials = CredentialResolver::with_http_client(config, http_client.clone())?;

        Ok(Self {
            http_client,
            api_base: config.api_base()?,
            credentials,
            page_size: None,
        })
    }

    /// Ask the server for at most `size` records per page on GET requests
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    /// Absolute URL for a relative resource path. Absolute URLs (next links)
    /// pass through only when they stay under the Web API root, so the bearer
    /// token never leaves this environment.
    pub fn url_for(&self, path: &str) -> Result<String> {
        if !(path.starts_with("http://") || path.starts_with("https://")) {
            return Ok(format!("{}/{}", self.api_base, path.trim_start_matches('/')));
        }

        let rest = path.strip_prefix(self.api_base.as_str()).unwrap_or_default();
        if rest.starts_with('/') || rest.starts_with('?') {
            Ok(path.to_string())
        } else {
            Err(DataverseError::InvalidResponse(format!(
                "Refusing to follow URL outside {}: {}",
                self.api_base, path
            )))
        }
    }

    pub async fn get(&mut self, path: &str, params: &QueryParams) -> Result<Value> {
        let prefer = self.page_size.map(headers::prefer_max_page_size);
        let response = self
            .execute(RequestSpec {
                method: Method::GET,
                target: path,
                params,
                body: None,
                prefer,
            })
            .await?;

        decode_body(response).await
    }

    /// Lazy page sequence starting with `GET path`
    pub fn pages(&mut self, path: &str, params: &QueryParams) -> Pages<'_> {
        Pages::start(self, path, params)
    }

    /// Continue paging from a list response already returned by `get`
    pub fn pages_from(&mut self, first: Value) -> Result<Pages<'_>> {
        let page = Page::from_json(first)?;
        Ok(Pages::resume(self, page))
    }

    /// Every record of a list query, following next links to the end
    pub async fn get_all(&mut self, path: &str, params: &QueryParams) -> Result<Vec<Value>> {
        self.pages(path, params).collect_records().await
    }

    /// Create a record. A `204 No Content` reply yields `{"id": <guid>}` when
    /// the server reports the new record's URL.
    pub async fn post<T: Serialize + ?Sized>(&mut self, path: &str, data: &T) -> Result<Value> {
        let empty = QueryParams::new();
        let response = self
            .execute(RequestSpec {
                method: Method::POST,
                target: path,
                params: &empty,
                body: Some(serde_json::to_value(data)?),
                prefer: Some(headers::PREFER_RETURN_REPRESENTATION.to_string()),
            })
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            let entity_id = response
                .headers()
                .get(headers::ODATA_ENTITY_ID)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_entity_id);

            return Ok(match entity_id {
                Some(id) => json!({ "id": id }),
                None => json!({}),
            });
        }

        decode_body(response).await
    }

    pub async fn patch<T: Serialize + ?Sized>(&mut self, path: &str, data: &T) -> Result<Value> {
        let empty = QueryParams::new();
        let response = self
            .execute(RequestSpec {
                method: Method::PATCH,
                target: path,
                params: &empty,
                body: Some(serde_json::to_value(data)?),
                prefer: None,
            })
            .await?;

        decode_body(response).await
    }

    pub async fn delete(&mut self, path: &str) -> Result<()> {
        let empty = QueryParams::new();
        self.execute(RequestSpec {
            method: Method::DELETE,
            target: path,
            params: &empty,
            body: None,
            prefer: None,
        })
        .await?;

        Ok(())
    }

    /// Identity of the caller as seen by the server
    pub async fn whoami(&mut self) -> Result<Value> {
        self.get("WhoAmI()", &QueryParams::new()).await
    }

    /// Send with the current token; on a 401 drop the token and send once more.
    async fn execute(&mut self, request: RequestSpec<'_>) -> Result<Response> {
        let mut unauthorized_body = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(&request).await? {
                Attempt::Completed(response) => return Ok(response),
                Attempt::Unauthorized(body) => {
                    if attempt < MAX_ATTEMPTS {
                        warn!(
                            "{} {} returned 401, refreshing token and retrying",
                            request.method, request.target
                        );
                        self.credentials.invalidate();
                    }
                    unauthorized_body = body;
                }
            }
        }

        Err(DataverseError::Authentication(format!(
            "Request still unauthorized after token refresh: {}",
            unauthorized_body
        )))
    }

    async fn attempt(&mut self, request: &RequestSpec<'_>) -> Result<Attempt> {
        let token = self.credentials.get_token().await?.value().to_string();
        let response = self.build(request, &token)?.send().await?;
        let status = response.status();

        debug!("{} {} -> {}", request.method, request.target, status);

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Unauthorized(body));
        }

        if !status.is_success() {
            let body = response.text().await?;
            return Err(DataverseError::Api {
                status_code: status.as_u16(),
                body,
            });
        }

        Ok(Attempt::Completed(response))
    }

    fn build(&self, request: &RequestSpec<'_>, token: &str) -> Result<RequestBuilder> {
        let url = self.url_for(request.target)?;

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .bearer_auth(token)
            .header(ACCEPT, headers::ACCEPT_JSON)
            .header(headers::ODATA_MAX_VERSION, headers::ODATA_VERSION_VALUE)
            .header(headers::ODATA_VERSION, headers::ODATA_VERSION_VALUE);

        if !request.params.is_empty() {
            builder = builder.query(request.params.pairs());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(prefer) = &request.prefer {
            builder = builder.header(headers::PREFER, prefer);
        }

        Ok(builder)
    }
}

/// JSON body of a successful response; empty bodies become `{}`
async fn decode_body(response: Response) -> Result<Value> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&text)
        .map_err(|e| DataverseError::InvalidResponse(format!("Response body is not JSON: {}", e)))
}

/// Record ID from an `OData-EntityId` URL such as `.../workflows(<guid>)`
fn parse_entity_id(url: &str) -> Option<String> {
    let start = url.rfind('(')? + 1;
    let end = url[start..].find(')')? + start;
    let id = &url[start..end];
    (!id.is_empty()).then(|| id.to_string())
}
