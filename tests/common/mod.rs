// tests/common/mod.rs
//! Shared fixtures: a scripted transport and builders for raw Notion JSON.
#![allow(dead_code)]

use notion_table::{
    ApiKey, ApiRequest, ApiResponse, AppError, NotionId, NotionTable, NotionTransport, TableConfig,
};
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub const DATABASE_ID: &str = "0123456789abcdef0123456789abcdef";
pub const DATABASE_PATH: &str = "databases/01234567-89ab-cdef-0123-456789abcdef/query";
pub const PAGE_ID: &str = "fedcba9876543210fedcba9876543210";
pub const PAGE_CHILDREN_PATH: &str = "blocks/fedcba98-7654-3210-fedc-ba9876543210/children";

/// A row or block identifier in the hyphenated form the API returns.
pub fn uuid(n: u8) -> String {
    let hex = format!("{:02x}", n).repeat(16);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

pub fn children_path(id: &str) -> String {
    format!("blocks/{}/children", id)
}

enum Reply {
    Status(u16, Value),
    Timeout,
}

struct Route {
    method: Method,
    prefix: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
struct Script {
    routes: Vec<Route>,
    calls: Vec<ApiRequest>,
    files: HashMap<String, Option<Vec<u8>>>,
    downloads: Vec<String>,
    sessions: u32,
}

/// A [`NotionTransport`] answering from a script instead of the network.
///
/// Replies queued for a route are consumed in order; the last one keeps
/// answering. Child sessions share the same script.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for requests whose endpoint starts with `prefix`.
    pub fn reply(&self, method: Method, prefix: &str, status: u16, body: Value) -> &Self {
        self.push(method, prefix, Reply::Status(status, body))
    }

    /// Queues a deadline expiry for requests whose endpoint starts with `prefix`.
    pub fn time_out(&self, method: Method, prefix: &str) -> &Self {
        self.push(method, prefix, Reply::Timeout)
    }

    fn push(&self, method: Method, prefix: &str, reply: Reply) -> &Self {
        let mut script = self.script.lock();
        match script
            .routes
            .iter_mut()
            .find(|route| route.method == method && route.prefix == prefix)
        {
            Some(route) => route.replies.push_back(reply),
            None => script.routes.push(Route {
                method,
                prefix: prefix.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Serves `bytes` for a download of `url`; `None` answers 403.
    pub fn serve_file(&self, url: &str, bytes: Option<&[u8]>) -> &Self {
        self.script
            .lock()
            .files
            .insert(url.to_string(), bytes.map(<[u8]>::to_vec));
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.script.lock().calls.clone()
    }

    pub fn calls_to(&self, method: Method, prefix: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.endpoint.starts_with(prefix))
            .collect()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.script.lock().downloads.clone()
    }

    pub fn sessions(&self) -> u32 {
        self.script.lock().sessions
    }

    pub fn shared(&self) -> Arc<dyn NotionTransport> {
        Arc::new(self.clone())
    }
}

#[async_trait::async_trait]
impl NotionTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse<String>, AppError> {
        let mut script = self.script.lock();
        script.calls.push(request.clone());

        let route = script
            .routes
            .iter_mut()
            .filter(|route| {
                route.method == request.method && request.endpoint.starts_with(&route.prefix)
            })
            .max_by_key(|route| route.prefix.len())
            .ok_or_else(|| AppError::InternalError {
                message: format!("no scripted reply for {} {}", request.method, request.endpoint),
                source: None,
            })?;

        let reply = if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().map(|reply| match reply {
                Reply::Status(status, body) => Reply::Status(*status, body.clone()),
                Reply::Timeout => Reply::Timeout,
            })
        };

        match reply {
            Some(Reply::Status(status, body)) => Ok(ApiResponse {
                data: body.to_string(),
                status: StatusCode::from_u16(status).expect("valid status"),
                url: format!("https://api.notion.com/v1/{}", request.endpoint),
            }),
            Some(Reply::Timeout) | None => Err(AppError::Timeout {
                endpoint: request.endpoint.clone(),
                after: std::time::Duration::from_secs(10),
            }),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let mut script = self.script.lock();
        script.downloads.push(url.to_string());
        match script.files.get(url) {
            Some(Some(bytes)) => Ok(bytes.clone()),
            _ => Err(AppError::transport(403, "AccessDenied", url)),
        }
    }

    fn child_session(&self) -> Result<Arc<dyn NotionTransport>, AppError> {
        self.script.lock().sessions += 1;
        Ok(Arc::new(self.clone()))
    }
}

pub fn test_key() -> ApiKey {
    ApiKey::new("secret_scripted_transport_key").expect("valid test key")
}

pub fn database_config() -> TableConfig {
    TableConfig::new(NotionId::parse(DATABASE_ID).expect("valid id"), vec![test_key()])
}

pub fn page_config() -> TableConfig {
    TableConfig::new(NotionId::parse(PAGE_ID).expect("valid id"), vec![test_key()]).as_page(true)
}

pub fn table(config: TableConfig, transport: &ScriptedTransport) -> NotionTable {
    NotionTable::with_transport(config, transport.shared())
}

// --- Raw Notion JSON ---

pub fn run(text: &str) -> Value {
    json!({
        "type": "text",
        "text": { "content": text, "link": null },
        "annotations": {
            "bold": false, "italic": false, "strikethrough": false,
            "underline": false, "code": false, "color": "default"
        },
        "plain_text": text,
        "href": null
    })
}

pub fn title(text: &str) -> Value {
    json!({ "id": "title", "type": "title", "title": [run(text)] })
}

pub fn rich_text(text: &str) -> Value {
    json!({ "id": "rt", "type": "rich_text", "rich_text": [run(text)] })
}

pub fn url(value: Option<&str>) -> Value {
    json!({ "id": "u", "type": "url", "url": value })
}

pub fn unique_id(prefix: Option<&str>, number: i64) -> Value {
    json!({ "id": "uid", "type": "unique_id", "unique_id": { "prefix": prefix, "number": number } })
}

pub fn select(name: &str) -> Value {
    json!({ "id": "sel", "type": "select", "select": { "name": name } })
}

pub fn database_row(id: &str, properties: Value) -> Value {
    json!({
        "object": "page",
        "id": id,
        "parent": { "type": "database_id", "database_id": DATABASE_ID },
        "properties": properties
    })
}

pub fn block(id: &str, block_type: &str, body: Value, has_children: bool) -> Value {
    json!({
        "object": "block",
        "id": id,
        "parent": { "type": "page_id", "page_id": PAGE_ID },
        "type": block_type,
        "has_children": has_children,
        block_type: body
    })
}

pub fn paragraph(id: &str, text: &str) -> Value {
    block(id, "paragraph", json!({ "rich_text": [run(text)], "color": "default" }), false)
}

pub fn image(id: &str, source: &str) -> Value {
    block(
        id,
        "image",
        json!({ "caption": [], "type": "file", "file": { "url": source, "expiry_time": "2030-01-01T00:00:00.000Z" } }),
        false,
    )
}

pub fn listing(results: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "object": "list",
        "results": results,
        "next_cursor": next_cursor,
        "has_more": next_cursor.is_some()
    })
}

pub fn error_body(status: u16, code: &str) -> Value {
    json!({ "object": "error", "status": status, "code": code, "message": code })
}

/// The three-row task database: `Name` (title) and `Status` (text).
pub fn task_rows() -> Vec<Value> {
    vec![
        database_row(&uuid(1), json!({ "Name": title("Write report"), "Status": rich_text("todo") })),
        database_row(&uuid(2), json!({ "Name": title("Ship release"), "Status": rich_text("done") })),
        database_row(&uuid(3), json!({ "Name": title("Plan sprint"), "Status": rich_text("todo") })),
    ]
}
