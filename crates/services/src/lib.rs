//! External service collaborators at their interface boundary.
//!
//! Every collaborator is an `async_trait` seam with an HTTP-backed
//! implementation in [`http`] and a `Missing*` null implementation that
//! fails with a descriptive error when the collaborator is not wired.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use shared::{
    domain::{
        Comment, CommentDraft, CommentListData, CommentSearch, CurUser, ListData, ListSearch,
        PhotoDetail, PhotoListItem, ProjectConfig, VideoListItem,
    },
    error::AppError,
};

pub mod http;

pub use http::{ApiClient, HttpContentService, HttpSessionService, HttpSettingsService};

pub const SERVICE_UNAVAILABLE: &str = "service_unavailable";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn get_cur_user(&self) -> Result<CurUser, AppError>;
    async fn login(&self, request: &LoginRequest) -> Result<CurUser, AppError>;
}

#[async_trait]
pub trait SettingsService: Send + Sync {
    async fn get_settings(&self) -> Result<ProjectConfig, AppError>;
    /// Telemetry sink for reportable errors; never surfaced to the end user.
    async fn report_error(&self, error: &AppError) -> Result<(), AppError>;
}

#[async_trait]
pub trait ContentService: Send + Sync {
    async fn list_photos(&self, search: &ListSearch) -> Result<ListData<PhotoListItem>, AppError>;
    async fn photo_detail(&self, id: &str) -> Result<PhotoDetail, AppError>;
    async fn list_videos(&self, search: &ListSearch) -> Result<ListData<VideoListItem>, AppError>;
    async fn list_comments(&self, search: &CommentSearch) -> Result<CommentListData, AppError>;
    async fn submit_comment(&self, draft: &CommentDraft) -> Result<Comment, AppError>;
}

/// Blocking user-facing alert. Login failures alert instead of flowing into
/// the error protocol; nothing else uses this.
pub trait Alerter: Send + Sync {
    fn alert(&self, message: &str);
}

fn unavailable(what: &str) -> AppError {
    AppError::new(SERVICE_UNAVAILABLE, format!("{what} service is unavailable"))
}

pub struct MissingSessionService;

#[async_trait]
impl SessionService for MissingSessionService {
    async fn get_cur_user(&self) -> Result<CurUser, AppError> {
        Err(unavailable("session"))
    }

    async fn login(&self, _request: &LoginRequest) -> Result<CurUser, AppError> {
        Err(unavailable("session"))
    }
}

pub struct MissingSettingsService;

#[async_trait]
impl SettingsService for MissingSettingsService {
    async fn get_settings(&self) -> Result<ProjectConfig, AppError> {
        Err(unavailable("settings"))
    }

    async fn report_error(&self, error: &AppError) -> Result<(), AppError> {
        warn!(code = %error.code, "error report dropped, settings service unavailable");
        Err(unavailable("settings"))
    }
}

pub struct MissingContentService;

#[async_trait]
impl ContentService for MissingContentService {
    async fn list_photos(&self, _search: &ListSearch) -> Result<ListData<PhotoListItem>, AppError> {
        Err(unavailable("content"))
    }

    async fn photo_detail(&self, _id: &str) -> Result<PhotoDetail, AppError> {
        Err(unavailable("content"))
    }

    async fn list_videos(&self, _search: &ListSearch) -> Result<ListData<VideoListItem>, AppError> {
        Err(unavailable("content"))
    }

    async fn list_comments(&self, _search: &CommentSearch) -> Result<CommentListData, AppError> {
        Err(unavailable("content"))
    }

    async fn submit_comment(&self, _draft: &CommentDraft) -> Result<Comment, AppError> {
        Err(unavailable("content"))
    }
}

/// Shell implementation of the alert seam; a real view layer would pop a
/// modal here.
pub struct TracingAlerter;

impl Alerter for TracingAlerter {
    fn alert(&self, message: &str) {
        warn!(alert = message, "user-facing alert");
    }
}
