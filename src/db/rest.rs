// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the hosted backend.
//!
//! Handles:
//! - Activity rows via the REST endpoint (`/rest/v1/{table}`)
//! - Image objects via the storage endpoint (`/storage/v1/object/{bucket}`)
//! - Error mapping so the sync engine can log and move on

use crate::db::{ObjectStorage, RemoteStore};
use crate::error::AppError;
use crate::models::RemoteActivityRecord;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;

/// REST + storage client for the hosted backend.
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    bucket: String,
}

impl RestBackend {
    /// Create a new client for the backend at `base_url`.
    pub fn new(base_url: &str, api_key: String, table: String, bucket: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
            bucket,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Row URL filtered to a single id (`?id=eq.<id>`).
    fn row_url(&self, id: &str) -> String {
        format!("{}?id=eq.{}", self.table_url(), urlencoding::encode(id))
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_path(path)
        )
    }

    /// Public URL of an uploaded object.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_path(path)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch_rows(&self) -> Result<Vec<serde_json::Value>, AppError> {
        let response = self
            .authorized(self.http.get(self.table_url()))
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        let response = check_response(response).await.map_err(AppError::Remote)?;
        response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("JSON parse error: {}", e)))
    }

    async fn insert_row(&self, record: &RemoteActivityRecord) -> Result<(), AppError> {
        let response = self
            .authorized(self.http.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        check_response(response).await.map_err(AppError::Remote)?;
        Ok(())
    }

    async fn update_row(&self, id: &str, record: &RemoteActivityRecord) -> Result<(), AppError> {
        let response = self
            .authorized(self.http.patch(self.row_url(id)))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        check_response(response).await.map_err(AppError::Remote)?;
        Ok(())
    }

    async fn delete_row(&self, id: &str) -> Result<(), AppError> {
        let response = self
            .authorized(self.http.delete(self.row_url(id)))
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        check_response(response).await.map_err(AppError::Remote)?;
        Ok(())
    }

    async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> Result<String, AppError> {
        let response = self
            .authorized(self.http.post(self.object_url(path)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", overwrite.to_string())
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::ObjectStorage(e.to_string()))?;

        check_response(response)
            .await
            .map_err(AppError::ObjectStorage)?;
        Ok(self.public_url(path))
    }

    async fn remove_objects(&self, paths: &[String]) -> Result<(), AppError> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let body = serde_json::json!({ "prefixes": paths });

        let response = self
            .authorized(self.http.delete(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ObjectStorage(e.to_string()))?;

        check_response(response)
            .await
            .map_err(AppError::ObjectStorage)?;
        Ok(())
    }
}

impl RemoteStore for RestBackend {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<serde_json::Value>, AppError>> {
        self.fetch_rows().boxed()
    }

    fn insert<'a>(&'a self, record: &'a RemoteActivityRecord) -> BoxFuture<'a, Result<(), AppError>> {
        self.insert_row(record).boxed()
    }

    fn update_by_id<'a>(
        &'a self,
        id: &'a str,
        record: &'a RemoteActivityRecord,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        self.update_row(id, record).boxed()
    }

    fn delete_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), AppError>> {
        self.delete_row(id).boxed()
    }
}

impl ObjectStorage for RestBackend {
    fn upload<'a>(
        &'a self,
        path: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
        overwrite: bool,
    ) -> BoxFuture<'a, Result<String, AppError>> {
        self.upload_object(path, bytes, content_type, overwrite)
            .boxed()
    }

    fn remove<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, Result<(), AppError>> {
        self.remove_objects(paths).boxed()
    }
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    #[serde(alias = "error")]
    message: Option<String>,
}

/// Check response status; on failure return a readable message.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        tracing::warn!("Backend rate limit hit (429)");
    }

    let message = serde_json::from_str::<BackendErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(body);

    Err(format!("HTTP {}: {}", status, message))
}

/// Percent-encode each segment of an object path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
