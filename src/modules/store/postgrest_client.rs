use async_trait::async_trait;
use serde_json::Value;

use crate::core::config::StoreConfig;
use crate::core::error::{AppError, Result};
use crate::modules::store::record_store::{Filter, RecordStore};

/// HTTP client for the record store's PostgREST-style contract.
///
/// Mutations request `return=representation` so created and updated rows
/// round-trip without a second read.
pub struct PostgrestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("CinemapCore/1.0 (film-map)")
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn query_pairs(filters: &[Filter], order: Option<&str>) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = filters
            .iter()
            .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
            .collect();
        if let Some(order) = order {
            pairs.push(("order".to_string(), order.to_string()));
        }
        pairs
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Record store error: HTTP {} - {}", status, body);
        Err(classify_store_failure(status.as_u16(), &body))
    }
}

/// Map a store failure payload onto the domain error taxonomy.
///
/// The store reports failures as JSON with a SQLSTATE-style `code` and a
/// `message`; policy rejections additionally mention the violated policy in
/// the message text.
pub fn classify_store_failure(status: u16, body: &str) -> AppError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|v| v.get("code"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(body);

    if code == "42501" || message.contains("row-level security") {
        return AppError::Auth(format!("Store policy rejected the request: {}", message));
    }
    if code == "23505" {
        return AppError::Conflict(format!("Duplicate value: {}", message));
    }
    if code.starts_with("22") {
        return AppError::Validation(format!("Invalid data format: {}", message));
    }

    AppError::Store(format!("HTTP {} - {}", status, message))
}

#[async_trait]
impl RecordStore for PostgrestClient {
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
        order: Option<&str>,
    ) -> Result<Vec<Value>> {
        let mut pairs = Self::query_pairs(filters, order);
        pairs.push(("select".to_string(), columns.to_string()));

        let response = self
            .authed(self.client.get(self.table_url(table)).query(&pairs))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Record store select on {} failed: {}", table, e);
                AppError::Store(format!("select on {} failed: {}", table, e))
            })?;
        let response = self.check(response).await?;

        response.json::<Vec<Value>>().await.map_err(|e| {
            tracing::error!("Failed to parse select response from {}: {}", table, e);
            AppError::Store(format!("Failed to parse select response: {}", e))
        })
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Record store insert into {} failed: {}", table, e);
                AppError::Store(format!("insert into {} failed: {}", table, e))
            })?;
        let response = self.check(response).await?;

        let mut rows: Vec<Value> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse insert response from {}: {}", table, e);
            AppError::Store(format!("Failed to parse insert response: {}", e))
        })?;

        if rows.is_empty() {
            return Err(AppError::Store(format!(
                "insert into {} returned no representation",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Value> {
        let pairs = Self::query_pairs(filters, None);

        let response = self
            .authed(self.client.patch(self.table_url(table)).query(&pairs))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Record store update on {} failed: {}", table, e);
                AppError::Store(format!("update on {} failed: {}", table, e))
            })?;
        let response = self.check(response).await?;

        let mut rows: Vec<Value> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse update response from {}: {}", table, e);
            AppError::Store(format!("Failed to parse update response: {}", e))
        })?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!(
                "No matching record in {}",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        let pairs = Self::query_pairs(filters, None);

        let response = self
            .authed(self.client.delete(self.table_url(table)).query(&pairs))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Record store delete on {} failed: {}", table, e);
                AppError::Store(format!("delete on {} failed: {}", table, e))
            })?;
        self.check(response).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value> {
        let response = self
            .authed(self.client.post(self.rpc_url(function)))
            .json(&args)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Record store rpc {} failed: {}", function, e);
                AppError::Store(format!("rpc {} failed: {}", function, e))
            })?;
        let response = self.check(response).await?;

        response.json::<Value>().await.map_err(|e| {
            tracing::error!("Failed to parse rpc response from {}: {}", function, e);
            AppError::Store(format!("Failed to parse rpc response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::{get, patch, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> PostgrestClient {
        PostgrestClient::new(StoreConfig {
            base_url,
            api_key: "test-key".to_string(),
        })
    }

    #[tokio::test]
    async fn test_select_builds_eq_filters_and_order() {
        let router = Router::new().route(
            "/rest/v1/films",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("status").map(String::as_str), Some("eq.approved"));
                assert_eq!(
                    params.get("order").map(String::as_str),
                    Some("created_at.desc")
                );
                assert_eq!(params.get("select").map(String::as_str), Some("id,title"));
                Json(json!([{"id": "a", "title": "First"}]))
            }),
        );
        let base = spawn_stub(router).await;

        let rows = client_for(base)
            .select(
                "films",
                "id,title",
                &[Filter::eq("status", "approved")],
                Some("created_at.desc"),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "First");
    }

    #[tokio::test]
    async fn test_insert_returns_first_representation_row() {
        let router = Router::new().route(
            "/rest/v1/films",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["title"], "Wanted");
                Json(json!([{"id": "new-id", "title": "Wanted"}]))
            }),
        );
        let base = spawn_stub(router).await;

        let row = client_for(base)
            .insert("films", json!({"title": "Wanted"}))
            .await
            .unwrap();

        assert_eq!(row["id"], "new-id");
    }

    #[tokio::test]
    async fn test_update_with_no_match_is_not_found() {
        let router = Router::new().route(
            "/rest/v1/films",
            patch(|| async { Json(json!([])) }),
        );
        let base = spawn_stub(router).await;

        let err = client_for(base)
            .update("films", &[Filter::eq("id", "missing")], json!({"year": 2001}))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_classified() {
        let router = Router::new().route(
            "/rest/v1/films",
            post(|| async {
                (
                    axum::http::StatusCode::CONFLICT,
                    Json(json!({"code": "23505", "message": "duplicate key value"})),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let err = client_for(base)
            .insert("films", json!({"title": "Twice"}))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_classify_policy_rejection() {
        let err = classify_store_failure(
            403,
            r#"{"code":"42501","message":"new row violates row-level security policy"}"#,
        );
        assert!(matches!(err, AppError::Auth(_)));

        let err = classify_store_failure(
            403,
            r#"{"message":"new row violates row-level security policy for table films"}"#,
        );
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn test_classify_duplicate_and_data_format() {
        let err = classify_store_failure(409, r#"{"code":"23505","message":"duplicate"}"#);
        assert!(matches!(err, AppError::Conflict(_)));

        let err = classify_store_failure(400, r#"{"code":"22P02","message":"invalid input"}"#);
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_classify_unknown_is_store_error() {
        let err = classify_store_failure(500, "backend exploded");
        assert!(matches!(err, AppError::Store(_)));
    }
}
