use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task;
use tracing::info;

use crate::domain::{ArticleRecord, Draft};

use super::AppState;

type ApiError = (StatusCode, Json<Value>);

/// Article shape the frontend consumes. The link doubles as the id
/// since ingestion dedupes on it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub publish_time: String,
    pub content: String,
    pub image_url: Option<String>,
}

impl From<ArticleRecord> for ArticleItem {
    fn from(record: ArticleRecord) -> Self {
        Self {
            id: record.link,
            title: record.title,
            summary: record.summary,
            source: record.source,
            publish_time: record.published_date.to_rfc3339(),
            content: record.content,
            image_url: record.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArticlesQuery {
    #[serde(rename = "sourceId")]
    pub source_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSourcePayload {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveSourcePayload {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidatePayload {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub email: String,
}

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}

fn bad_request(body: Value) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(body))
}

/// `GET /api/articles` with an optional `sourceId` filter on the
/// source name, oldest first.
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticlesQuery>,
) -> Result<Json<Value>, ApiError> {
    let articles = state.service.recent_articles().map_err(internal_error)?;
    let items: Vec<ArticleItem> = articles
        .into_iter()
        .filter(|article| {
            query
                .source_id
                .as_deref()
                .map_or(true, |source| article.source == source)
        })
        .map(ArticleItem::from)
        .collect();

    Ok(Json(json!({ "items": items })))
}

/// `GET /api/sources` lists the custom sources only; the built-ins are
/// not editable and the frontend hardcodes them.
pub async fn list_sources(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "sources": state.service.custom_sources() }))
}

/// `POST /api/sources` validates the URL, registers it, and fetches it
/// once before answering.
pub async fn add_source(
    State(state): State<AppState>,
    Json(payload): Json<AddSourcePayload>,
) -> Result<Json<Value>, ApiError> {
    let url = payload.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(bad_request(
            json!({ "success": false, "error": "URL is required" }),
        ));
    }

    let service = state.service.clone();
    let name = payload.name;
    let added = task::spawn_blocking(move || service.add_source(name.as_deref(), &url))
        .await
        .map_err(internal_error)?;

    Ok(match added {
        Some(name) => Json(json!({ "success": true, "name": name })),
        None => Json(json!({ "success": false, "error": "Invalid RSS feed URL" })),
    })
}

/// `DELETE /api/sources` removes a custom source by name.
pub async fn remove_source(
    State(state): State<AppState>,
    Json(payload): Json<RemoveSourcePayload>,
) -> Result<Json<Value>, ApiError> {
    let name = payload.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(bad_request(
            json!({ "success": false, "error": "Source name is required" }),
        ));
    }

    let removed = state.service.remove_source(&name);
    Ok(Json(json!({ "success": removed })))
}

/// `POST /api/sources/validate` probes a URL without registering it.
pub async fn validate_source(
    State(state): State<AppState>,
    Json(payload): Json<ValidatePayload>,
) -> Result<Json<Value>, ApiError> {
    let url = payload.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(bad_request(
            json!({ "valid": false, "error": "URL is required" }),
        ));
    }

    let service = state.service.clone();
    let title = task::spawn_blocking(move || service.validate_source(&url))
        .await
        .map_err(internal_error)?;

    Ok(match title {
        Some(title) => Json(json!({ "valid": true, "title": title })),
        None => Json(json!({
            "valid": false,
            "error": "Could not find a valid RSS or Atom feed at this URL"
        })),
    })
}

/// `POST /api/sources/import-opml` takes the uploaded file as the first
/// multipart field and reports how many sources were added.
pub async fn import_opml(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(json!({ "error": err.to_string() })))?;
    let Some(field) = field else {
        return Err(bad_request(json!({ "error": "OPML file is required" })));
    };
    let content = field
        .text()
        .await
        .map_err(|err| bad_request(json!({ "error": err.to_string() })))?;

    let importer = state.importer.clone();
    let report = task::spawn_blocking(move || importer.import_opml(&content))
        .await
        .map_err(internal_error)?
        .map_err(|err| bad_request(json!({ "error": err.to_string() })))?;

    info!(
        added = report.added.len(),
        duplicates = report.duplicates.len(),
        invalid = report.invalid.len(),
        "OPML import finished"
    );
    Ok(Json(json!({ "count": report.added.len() })))
}

/// `POST /api/auth/register`, a development stand-in until real
/// accounts exist.
pub async fn register(Json(payload): Json<AuthPayload>) -> Json<Value> {
    Json(dev_session(&payload.email))
}

/// `POST /api/auth/login`, same stand-in as registration.
pub async fn login(Json(payload): Json<AuthPayload>) -> Json<Value> {
    Json(dev_session(&payload.email))
}

fn dev_session(email: &str) -> Value {
    json!({
        "token": format!("dev-token-{}", Utc::now().timestamp_millis()),
        "user": { "id": "user-1", "email": email }
    })
}

/// `POST /api/drafts/export` renders a draft to markdown.
pub async fn export_draft(State(state): State<AppState>, Json(draft): Json<Draft>) -> Json<Value> {
    Json(json!({ "contentMd": state.drafts.to_markdown(&draft) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::services::{DraftExportService, FeedService, ImportExportService};
    use crate::storage::{ArticleStore, InMemoryArticleStore};

    fn setup() -> (AppState, Arc<InMemoryArticleStore>) {
        let store = Arc::new(InMemoryArticleStore::new());
        let service = FeedService::new(store.clone());
        let state = AppState {
            service: service.clone(),
            importer: ImportExportService::new(service),
            drafts: DraftExportService::new(),
        };
        (state, store)
    }

    // The blocking HTTP clients inside AppState must be built and dropped
    // outside a runtime, so tests stay sync and only the handler future
    // runs on one.
    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn stored_article(title: &str, link: &str, source: &str) -> ArticleRecord {
        ArticleRecord::new(title.to_string(), link.to_string(), source.to_string())
    }

    #[test]
    fn test_list_articles_returns_all() {
        let (state, store) = setup();
        store
            .save(stored_article("First", "https://a.example/1", "Wired"))
            .unwrap();
        store
            .save(stored_article("Second", "https://b.example/2", "The Verge"))
            .unwrap();

        let query = Query(ArticlesQuery { source_id: None });
        let Json(body) = block_on(list_articles(State(state.clone()), query)).unwrap();

        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "First");
        assert_eq!(items[0]["id"], "https://a.example/1");
        assert!(items[0]["publishTime"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_list_articles_filters_by_source() {
        let (state, store) = setup();
        store
            .save(stored_article("First", "https://a.example/1", "Wired"))
            .unwrap();
        store
            .save(stored_article("Second", "https://b.example/2", "The Verge"))
            .unwrap();

        let query = Query(ArticlesQuery {
            source_id: Some("Wired".to_string()),
        });
        let Json(body) = block_on(list_articles(State(state.clone()), query)).unwrap();

        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["source"], "Wired");
    }

    #[test]
    fn test_list_sources_starts_empty() {
        let (state, _) = setup();

        let Json(body) = block_on(list_sources(State(state.clone())));

        assert_eq!(body["sources"], json!([]));
    }

    #[test]
    fn test_add_source_requires_url() {
        let (state, _) = setup();
        let payload = AddSourcePayload {
            name: Some("Blog".to_string()),
            url: Some("   ".to_string()),
        };

        let (status, Json(body)) =
            block_on(add_source(State(state.clone()), Json(payload))).unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "URL is required");
    }

    #[test]
    fn test_remove_source_requires_name() {
        let (state, _) = setup();
        let payload = RemoveSourcePayload { name: None };

        let (status, Json(body)) =
            block_on(remove_source(State(state.clone()), Json(payload))).unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Source name is required");
    }

    #[test]
    fn test_remove_source_reports_miss() {
        let (state, _) = setup();
        let payload = RemoveSourcePayload {
            name: Some("Nonexistent".to_string()),
        };

        let Json(body) = block_on(remove_source(State(state.clone()), Json(payload))).unwrap();

        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_validate_requires_url() {
        let (state, _) = setup();
        let payload = ValidatePayload { url: None };

        let (status, Json(body)) =
            block_on(validate_source(State(state.clone()), Json(payload))).unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["valid"], false);
        assert_eq!(body["error"], "URL is required");
    }

    #[test]
    fn test_register_issues_dev_token() {
        let payload = AuthPayload {
            email: "reader@example.com".to_string(),
        };

        let Json(body) = block_on(register(Json(payload)));

        assert!(body["token"].as_str().unwrap().starts_with("dev-token-"));
        assert_eq!(body["user"]["id"], "user-1");
        assert_eq!(body["user"]["email"], "reader@example.com");
    }

    #[test]
    fn test_export_draft_returns_markdown() {
        let (state, _) = setup();
        let draft = Draft {
            id: "draft-1".to_string(),
            title: "Notes".to_string(),
            body: "A paragraph.".to_string(),
            source_url: "https://example.com/post".to_string(),
        };

        let Json(body) = block_on(export_draft(State(state.clone()), Json(draft)));

        assert_eq!(
            body["contentMd"],
            "# Notes\n\nA paragraph.\n\n[source](https://example.com/post)\n"
        );
    }
}
