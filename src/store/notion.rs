//! Notion REST API store.
//!
//! Lists database rows through `POST databases/{id}/query` and reads page
//! bodies through `GET blocks/{id}/children`. Both endpoints are cursor
//! paginated; block children are followed to the end so that a body is
//! always complete.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Block, BlockKind, Config, Entry, EntryPage, PropertyNames, PropertyValue};
use crate::store::DocumentStore;

/// Largest page the API accepts.
const MAX_PAGE_SIZE: usize = 100;

/// HTTP client for a Notion workspace.
pub struct NotionStore {
    client: Client,
    base_url: Url,
    properties: PropertyNames,
}

impl NotionStore {
    /// Create a store from configuration, reading the token from `store.token_env`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = std::env::var(&config.store.token_env).map_err(|_| {
            AppError::config(format!(
                "API token not found in environment variable {}",
                config.store.token_env
            ))
        })?;
        Self::new(config, &token)
    }

    /// Create a store with an explicit token.
    pub fn new(config: &Config, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AppError::config(format!("Invalid API token: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        let version = HeaderValue::from_str(&config.store.notion_version)
            .map_err(|e| AppError::config(format!("Invalid notion_version: {e}")))?;
        headers.insert("Notion-Version", version);

        let client = Client::builder()
            .user_agent(&config.store.user_agent)
            .timeout(Duration::from_secs(config.store.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(&config.store.base_url)?,
            properties: config.properties.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn fetch_children(
        &self,
        entry_id: &str,
        cursor: Option<&str>,
    ) -> Result<RawList<RawBlock>> {
        let mut url = self.endpoint(&format!("blocks/{entry_id}/children"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page_size", &MAX_PAGE_SIZE.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("start_cursor", cursor);
            }
        }

        let response = self.client.get(url).send().await?;
        decode(&format!("blocks/{entry_id}"), response).await
    }
}

#[async_trait]
impl DocumentStore for NotionStore {
    async fn query(
        &self,
        source_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<EntryPage> {
        let url = self.endpoint(&format!("databases/{source_id}/query"))?;
        let mut body = json!({ "page_size": page_size.clamp(1, MAX_PAGE_SIZE) });
        if let Some(cursor) = cursor {
            body["start_cursor"] = Value::from(cursor);
        }

        log::debug!("Querying {source_id} (cursor: {cursor:?})");
        let response = self.client.post(url).json(&body).send().await?;
        let list: RawList<RawPage> = decode(&format!("databases/{source_id}"), response).await?;

        Ok(EntryPage {
            results: list
                .results
                .into_iter()
                .map(|page| page.into_entry(&self.properties))
                .collect(),
            has_more: list.has_more,
            next_cursor: list.next_cursor,
        })
    }

    async fn list_blocks(&self, entry_id: &str) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let list = self.fetch_children(entry_id, cursor.as_deref()).await?;
            blocks.extend(list.results.into_iter().map(RawBlock::into_block));

            match (list.has_more, list.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                (true, None) => {
                    return Err(AppError::upstream(
                        format!("blocks/{entry_id}"),
                        "has_more set without next_cursor",
                    ));
                }
                (false, _) => break,
            }
        }

        Ok(blocks)
    }
}

/// Parse the API root, making sure relative joins append to its path.
fn base_url(raw: &str) -> Result<Url> {
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

/// Decode a success body, or turn an error body into [`AppError::Upstream`].
async fn decode<T: DeserializeOwned>(context: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::upstream(context, error_message(status.as_u16(), &body)))
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<RawError>(body) {
        Ok(err) => format!("HTTP {status} {}: {}", err.code, err.message),
        Err(_) => format!("HTTP {status}"),
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct RawList<T> {
    results: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(default)]
    plain_text: String,
}

fn join_runs(runs: &[RawText]) -> String {
    runs.iter().map(|t| t.plain_text.as_str()).collect()
}

#[derive(Debug, Deserialize)]
struct RawPage {
    id: String,
    #[serde(default)]
    properties: BTreeMap<String, RawProperty>,
}

impl RawPage {
    fn into_entry(self, names: &PropertyNames) -> Entry {
        let properties: BTreeMap<String, PropertyValue> = self
            .properties
            .into_iter()
            .map(|(name, raw)| (name, raw.into_value()))
            .collect();

        let title = properties
            .get(&names.title)
            .and_then(PropertyValue::as_text)
            .unwrap_or_default()
            .to_string();
        let date = properties
            .get(&names.date)
            .and_then(PropertyValue::as_date)
            .map(String::from);
        let media_ref = properties
            .get(&names.media)
            .and_then(PropertyValue::as_url)
            .map(String::from);

        Entry {
            id: self.id,
            title,
            date,
            media_ref,
            properties,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDate {
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawProperty {
    Title {
        #[serde(default)]
        title: Vec<RawText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RawText>,
    },
    Date {
        date: Option<RawDate>,
    },
    Url {
        url: Option<String>,
    },
    Number {
        number: Option<f64>,
    },
    Select {
        select: Option<RawOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<RawOption>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    #[serde(other)]
    Unsupported,
}

impl RawProperty {
    fn into_value(self) -> PropertyValue {
        match self {
            Self::Title { title } => PropertyValue::Title {
                text: join_runs(&title),
            },
            Self::RichText { rich_text } => PropertyValue::RichText {
                text: join_runs(&rich_text),
            },
            Self::Date { date } => PropertyValue::Date {
                start: date.as_ref().and_then(|d| d.start.clone()),
                end: date.and_then(|d| d.end),
            },
            Self::Url { url } => PropertyValue::Url { url },
            Self::Number { number } => PropertyValue::Number { value: number },
            Self::Select { select } => PropertyValue::Select {
                name: select.map(|o| o.name),
            },
            Self::MultiSelect { multi_select } => PropertyValue::MultiSelect {
                names: multi_select.into_iter().map(|o| o.name).collect(),
            },
            Self::Checkbox { checkbox } => PropertyValue::Checkbox { value: checkbox },
            Self::Unsupported => PropertyValue::Unsupported,
        }
    }
}

/// A block keeps its payload under a key named after its own `type`.
#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    payload: serde_json::Map<String, Value>,
}

impl RawBlock {
    fn into_block(self) -> Block {
        let runs = self
            .payload
            .get(&self.kind)
            .and_then(|body| body.get("rich_text"))
            .and_then(Value::as_array)
            .map(|runs| {
                runs.iter()
                    .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Block {
            kind: BlockKind::from_type(&self.kind),
            text: runs,
        }
    }
}
