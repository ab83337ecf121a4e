//! Next-link pagination
//!
//! List responses carry their records in `value` and, when more remain, an
//! absolute `@odata.nextLink` URL. `Pages` walks that chain one request at a
//! time.

use futures::Stream;
use serde_json::Value;

use super::client::DataverseClient;
use super::constants::annotations;
use super::query::QueryParams;
use crate::error::{DataverseError, Result};

/// One page of a list response
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
    pub count: Option<u64>,
    pub next_link: Option<String>,
}

impl Page {
    /// Parse an OData list response
    pub fn from_json(json: Value) -> Result<Self> {
        let count = json.get(annotations::COUNT).and_then(|c| c.as_u64());

        let next_link = json
            .get(annotations::NEXT_LINK)
            .and_then(|n| n.as_str())
            .map(|s| s.to_string());

        let records = match json {
            Value::Object(mut map) => match map.remove("value") {
                Some(Value::Array(records)) => records,
                _ => {
                    return Err(DataverseError::InvalidResponse(
                        "Missing or invalid 'value' array in response".to_string(),
                    ));
                }
            },
            _ => {
                return Err(DataverseError::InvalidResponse(
                    "List response is not a JSON object".to_string(),
                ));
            }
        };

        Ok(Self {
            records,
            count,
            next_link,
        })
    }

    pub fn has_more(&self) -> bool {
        self.next_link.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

enum Cursor {
    Start { path: String, params: QueryParams },
    Ready(Page),
    Next(String),
    Done,
}

/// Lazy, forward-only sequence of pages.
///
/// Each call to `next_page` issues at most one GET. Once the chain ends, or a
/// request fails, the sequence is exhausted and cannot be restarted.
pub struct Pages<'c> {
    client: &'c mut DataverseClient,
    cursor: Cursor,
}

impl<'c> Pages<'c> {
    pub(crate) fn start(client: &'c mut DataverseClient, path: &str, params: &QueryParams) -> Self {
        Self {
            client,
            cursor: Cursor::Start {
                path: path.to_string(),
                params: params.clone(),
            },
        }
    }

    /// Continue from a page the caller already fetched
    pub(crate) fn resume(client: &'c mut DataverseClient, first: Page) -> Self {
        Self {
            client,
            cursor: Cursor::Ready(first),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.cursor, Cursor::Done)
    }

    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        let page = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return Ok(None),
            Cursor::Ready(page) => page,
            Cursor::Start { path, params } => Page::from_json(self.client.get(&path, &params).await?)?,
            Cursor::Next(link) => {
                log::debug!("Following next link: {}", link);
                Page::from_json(self.client.get(&link, &QueryParams::new()).await?)?
            }
        };

        if let Some(link) = &page.next_link {
            self.cursor = Cursor::Next(link.clone());
        }

        Ok(Some(page))
    }

    /// Drain the remaining pages into one flat list of records
    pub async fn collect_records(mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page.records);
        }
        Ok(records)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> + 'c {
        futures::stream::try_unfold(self, |mut pages| async move {
            Ok::<_, DataverseError>(pages.next_page().await?.map(|page| (page, pages)))
        })
    }
}
