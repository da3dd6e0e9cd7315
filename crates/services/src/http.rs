//! HTTP-backed service implementations.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use shared::{
    domain::{
        Comment, CommentDraft, CommentListData, CommentSearch, CurUser, ListData, ListSearch,
        PhotoDetail, PhotoListItem, ProjectConfig, VideoListItem,
    },
    error::AppError,
};

use crate::{ContentService, LoginRequest, SessionService, SettingsService};

/// Thin JSON client over the configured API base URL.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        // `Url::join` drops the last path segment of a base without a
        // trailing slash; normalize so "http://host/api" behaves.
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&base_url).map_err(|err| {
            AppError::new(
                "config_invalid",
                format!("invalid api base url '{base_url}': {err}"),
            )
        })?;
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url.join(path).map_err(|err| {
            AppError::new("config_invalid", format!("invalid api path '{path}': {err}"))
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, AppError> {
        let url = self.endpoint(path)?;
        debug!(%url, "api get");
        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await.map_err(request_error)?;
        let response = response.error_for_status().map_err(request_error)?;
        response.json().await.map_err(request_error)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let url = self.endpoint(path)?;
        debug!(%url, "api post");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;
        let response = response.error_for_status().map_err(request_error)?;
        response.json().await.map_err(request_error)
    }

    /// POST where only the status matters; the collector returns no body.
    async fn post_unit<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), AppError> {
        let url = self.endpoint(path)?;
        debug!(%url, "api post");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;
        response.error_for_status().map_err(request_error)?;
        Ok(())
    }
}

/// Map transport failures to the error protocol: HTTP status codes become
/// the error code (so a backend 404/500 classifies as reportable), anything
/// without a status is a network-class failure.
fn request_error(err: reqwest::Error) -> AppError {
    let code = err
        .status()
        .map(|status| status.as_u16().to_string())
        .unwrap_or_else(|| "network".to_string());
    AppError::new(code, err.to_string())
}

pub struct HttpSessionService {
    api: ApiClient,
}

impl HttpSessionService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SessionService for HttpSessionService {
    async fn get_cur_user(&self) -> Result<CurUser, AppError> {
        self.api.get_json("session", None::<&()>).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<CurUser, AppError> {
        self.api.post_json("session/login", request).await
    }
}

pub struct HttpSettingsService {
    api: ApiClient,
}

impl HttpSettingsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SettingsService for HttpSettingsService {
    async fn get_settings(&self) -> Result<ProjectConfig, AppError> {
        self.api.get_json("settings", None::<&()>).await
    }

    async fn report_error(&self, error: &AppError) -> Result<(), AppError> {
        self.api.post_unit("settings/error-report", error).await
    }
}

pub struct HttpContentService {
    api: ApiClient,
}

impl HttpContentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ContentService for HttpContentService {
    async fn list_photos(&self, search: &ListSearch) -> Result<ListData<PhotoListItem>, AppError> {
        self.api.get_json("photos", Some(search)).await
    }

    async fn photo_detail(&self, id: &str) -> Result<PhotoDetail, AppError> {
        self.api.get_json(&format!("photos/{id}"), None::<&()>).await
    }

    async fn list_videos(&self, search: &ListSearch) -> Result<ListData<VideoListItem>, AppError> {
        self.api.get_json("videos", Some(search)).await
    }

    async fn list_comments(&self, search: &CommentSearch) -> Result<CommentListData, AppError> {
        self.api.get_json("comments", Some(search)).await
    }

    async fn submit_comment(&self, draft: &CommentDraft) -> Result<Comment, AppError> {
        self.api.post_json("comments", draft).await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
