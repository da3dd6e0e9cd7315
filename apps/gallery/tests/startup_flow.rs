//! End-to-end startup against stub services: navigate, mount the root
//! module, let the resolver mount feature modules, and inspect the tree.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::timeout;

use client_store::{
    router::{MemoryHistory, Navigator},
    Action, LoadingState, Store,
};
use gallery::{
    modules::{
        app::{self, AppState},
        comments::{self, CommentEditor, CommentsState},
        names,
        photos::{self, ListOptions, PhotosState},
        videos::VideosState,
    },
    routes::build_registry,
};
use services::{Alerter, ContentService, LoginRequest, SessionService, SettingsService};
use shared::{
    domain::{
        Comment, CommentDraft, CommentListData, CommentSearch, CurUser, ListData, ListSearch,
        ListSummary, PhotoDetail, PhotoFrame, PhotoListItem, ProjectConfig, StartupStep,
        VideoListItem,
    },
    error::AppError,
    query::QueryValue,
};

struct StubSession {
    user: CurUser,
    fail_login: bool,
}

#[async_trait]
impl SessionService for StubSession {
    async fn get_cur_user(&self) -> Result<CurUser, AppError> {
        Ok(self.user.clone())
    }

    async fn login(&self, request: &LoginRequest) -> Result<CurUser, AppError> {
        if self.fail_login {
            return Err(AppError::new("401", "bad credentials"));
        }
        Ok(CurUser {
            uid: "u1".into(),
            username: request.username.clone(),
            has_login: true,
            avatar_url: String::new(),
        })
    }
}

struct StubSettings {
    fail: bool,
    reports: Arc<Mutex<Vec<AppError>>>,
}

#[async_trait]
impl SettingsService for StubSettings {
    async fn get_settings(&self) -> Result<ProjectConfig, AppError> {
        if self.fail {
            return Err(AppError::new("503", "settings backend down"));
        }
        Ok(ProjectConfig {
            title: "gallery".into(),
            keywords: "photos, videos".into(),
            description: "a content site".into(),
        })
    }

    async fn report_error(&self, error: &AppError) -> Result<(), AppError> {
        self.reports.lock().expect("reports lock").push(error.clone());
        Ok(())
    }
}

fn photo(id: &str) -> PhotoListItem {
    PhotoListItem {
        id: id.to_string(),
        title: "Highland mist".into(),
        cover_url: format!("/img/{id}.jpg"),
        hits: 12,
        comment_count: 1,
        create_time_desc: "yesterday".into(),
        photos: vec![PhotoFrame {
            id: format!("{id}-f1"),
            photo_id: id.to_string(),
            photo_url: format!("/img/{id}-full.jpg"),
        }],
    }
}

fn comment(article_id: &str) -> Comment {
    Comment {
        id: "c1".into(),
        article_id: article_id.to_string(),
        username: "ann".into(),
        avatar_url: String::new(),
        content: "first!".into(),
        create_time: Utc::now(),
    }
}

struct StubContent {
    submitted: Arc<Mutex<Vec<CommentDraft>>>,
}

#[async_trait]
impl ContentService for StubContent {
    async fn list_photos(&self, search: &ListSearch) -> Result<ListData<PhotoListItem>, AppError> {
        Ok(ListData {
            search: search.clone(),
            items: Some(vec![photo("p1")]),
            summary: Some(ListSummary {
                page: search.page,
                page_size: search.page_size,
                total: 1,
                total_pages: 1,
            }),
        })
    }

    async fn photo_detail(&self, id: &str) -> Result<PhotoDetail, AppError> {
        Ok(PhotoDetail {
            item: photo(id),
            remark: "shot at dawn".into(),
        })
    }

    async fn list_videos(&self, search: &ListSearch) -> Result<ListData<VideoListItem>, AppError> {
        Ok(ListData {
            search: search.clone(),
            items: Some(Vec::new()),
            summary: None,
        })
    }

    async fn list_comments(&self, search: &CommentSearch) -> Result<CommentListData, AppError> {
        Ok(CommentListData {
            search: search.clone(),
            items: Some(vec![comment(&search.article_id)]),
            summary: None,
        })
    }

    async fn submit_comment(&self, draft: &CommentDraft) -> Result<Comment, AppError> {
        self.submitted.lock().expect("submitted lock").push(draft.clone());
        Ok(comment(&draft.article_id))
    }
}

struct RecordingAlerter {
    alerts: Arc<Mutex<Vec<String>>>,
}

impl Alerter for RecordingAlerter {
    fn alert(&self, message: &str) {
        self.alerts.lock().expect("alerts lock").push(message.to_string());
    }
}

struct Harness {
    store: Store,
    history: Arc<MemoryHistory>,
    reports: Arc<Mutex<Vec<AppError>>>,
    alerts: Arc<Mutex<Vec<String>>>,
    submitted: Arc<Mutex<Vec<CommentDraft>>>,
}

impl Harness {
    async fn app_state(&self) -> AppState {
        self.store.slice(names::APP).await.expect("app slice")
    }

    async fn photos_state(&self) -> PhotosState {
        self.store.slice(names::PHOTOS).await.expect("photos slice")
    }

    async fn comments_state(&self) -> CommentsState {
        self.store
            .slice(names::COMMENTS)
            .await
            .expect("comments slice")
    }

    async fn settle(&self) {
        timeout(Duration::from_secs(5), self.store.settle())
            .await
            .expect("store settled");
    }
}

#[derive(Default)]
struct StartOptions {
    logged_in: bool,
    settings_fail: bool,
    login_fail: bool,
}

async fn start(path: &str, options: StartOptions) -> Harness {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let alerts = Arc::new(Mutex::new(Vec::new()));
    let submitted = Arc::new(Mutex::new(Vec::new()));

    let user = if options.logged_in {
        CurUser {
            uid: "u1".into(),
            username: "kit".into(),
            has_login: true,
            avatar_url: String::new(),
        }
    } else {
        CurUser::guest()
    };

    let session = Arc::new(StubSession {
        user,
        fail_login: options.login_fail,
    });
    let settings = Arc::new(StubSettings {
        fail: options.settings_fail,
        reports: Arc::clone(&reports),
    });
    let content = Arc::new(StubContent {
        submitted: Arc::clone(&submitted),
    });
    let alerter = Arc::new(RecordingAlerter {
        alerts: Arc::clone(&alerts),
    });

    let store = Store::new();
    let history = MemoryHistory::new(store.clone());
    let navigator: Arc<dyn Navigator> = history.clone();

    let registry = build_registry(content, Arc::clone(&navigator));
    let app = app::AppModule::new(session, settings, alerter, navigator, registry, "/public/");

    history.navigate(path);
    store.settle().await;
    store.mount(Arc::new(app)).await;

    let harness = Harness {
        store,
        history,
        reports,
        alerts,
        submitted,
    };
    harness.settle().await;
    harness
}

#[tokio::test]
async fn startup_mounts_every_matching_panel() {
    let harness = start("/photos?photos-page=2", StartOptions::default()).await;

    let app_state = harness.app_state().await;
    assert_eq!(app_state.startup_step, StartupStep::ConfigLoaded);
    assert_eq!(app_state.query["photos"]["page"], QueryValue::Int(2));
    assert_eq!(
        app_state.loading.get(app::LOADING_GLOBAL),
        Some(&LoadingState::Stop)
    );

    let state = harness.store.snapshot().await;
    assert_eq!(
        state.router.data.matched,
        vec![names::PHOTOS.to_string(), names::COMMENTS.to_string()]
    );

    let photos_state = harness.photos_state().await;
    assert_eq!(photos_state.list_data.search.page, 2);
    assert_eq!(photos_state.list_data.items.as_deref().map(<[_]>::len), Some(1));
    assert_eq!(
        photos_state.loading.get(photos::LOADING_GLOBAL),
        Some(&LoadingState::Stop)
    );
}

#[tokio::test]
async fn unmatched_route_hard_redirects_to_not_found() {
    let harness = start("/nowhere", StartOptions::default()).await;

    assert_eq!(
        harness.history.hard_redirects(),
        vec!["/public/404.html".to_string()]
    );
    // Config and session fetches resolved before resolution failed.
    assert_eq!(
        harness.app_state().await.startup_step,
        StartupStep::ConfigLoaded
    );
}

#[tokio::test]
async fn guest_visiting_my_lands_on_login() {
    let harness = start("/my", StartOptions::default()).await;

    let state = harness.store.snapshot().await;
    assert_eq!(state.router.location.pathname, "/login");
    assert!(!state.modules.contains_key(names::PHOTOS));
    assert!(harness.history.hard_redirects().is_empty());
}

#[tokio::test]
async fn logged_in_user_leaves_login_and_fast_redirects_home() {
    let harness = start(
        "/login",
        StartOptions {
            logged_in: true,
            ..StartOptions::default()
        },
    )
    .await;

    // "/login" redirects to "/", which fast-redirects to the gallery.
    let state = harness.store.snapshot().await;
    assert_eq!(state.router.location.pathname, "/photos");
}

#[tokio::test]
async fn failed_startup_fetch_stays_in_init_and_reports() {
    let harness = start(
        "/photos",
        StartOptions {
            settings_fail: true,
            ..StartOptions::default()
        },
    )
    .await;

    let app_state = harness.app_state().await;
    assert_eq!(app_state.startup_step, StartupStep::Init);
    assert_eq!(
        app_state.loading.get(app::LOADING_GLOBAL),
        Some(&LoadingState::Failed)
    );

    let reports = harness.reports.lock().expect("reports lock");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].code, "503");
}

#[tokio::test]
async fn login_success_lands_the_session_user() {
    let harness = start("/photos", StartOptions::default()).await;

    harness.store.dispatch(Action::new(
        names::APP,
        app::LOGIN,
        LoginRequest {
            username: "kit".into(),
            password: "hunter2".into(),
        },
    ));
    harness.settle().await;

    let app_state = harness.app_state().await;
    assert_eq!(app_state.cur_user.map(|u| u.has_login), Some(true));
    assert_eq!(
        app_state.loading.get(app::LOADING_LOGIN),
        Some(&LoadingState::Stop)
    );
}

#[tokio::test]
async fn login_failure_alerts_instead_of_raising() {
    let harness = start(
        "/photos",
        StartOptions {
            login_fail: true,
            ..StartOptions::default()
        },
    )
    .await;

    harness.store.dispatch(Action::new(
        names::APP,
        app::LOGIN,
        LoginRequest {
            username: "kit".into(),
            password: "wrong".into(),
        },
    ));
    harness.settle().await;

    assert_eq!(
        *harness.alerts.lock().expect("alerts lock"),
        vec!["bad credentials".to_string()]
    );
    assert!(harness.reports.lock().expect("reports lock").is_empty());
    assert_eq!(
        harness.app_state().await.cur_user.map(|u| u.has_login),
        Some(false)
    );
}

#[tokio::test]
async fn photo_detail_page_opens_detail_and_comment_panels() {
    let harness = start("/photos/p1", StartOptions::default()).await;

    let photos_state = harness.photos_state().await;
    assert_eq!(
        photos_state.detail.as_ref().map(|d| d.item.id.as_str()),
        Some("p1")
    );

    let comments_state = harness.comments_state().await;
    assert_eq!(comments_state.editor.article_id.as_deref(), Some("p1"));
    assert_eq!(
        comments_state.list_data.items.as_deref().map(<[_]>::len),
        Some(1)
    );
}

#[tokio::test]
async fn submitting_a_comment_clears_the_editor_and_refetches() {
    let harness = start("/photos/p1", StartOptions::default()).await;

    harness.store.dispatch(Action::new(
        names::COMMENTS,
        comments::PUT_EDITOR,
        CommentEditor {
            article_id: Some("p1".into()),
            content: "lovely light".into(),
        },
    ));
    harness.store.dispatch(Action::new(
        names::COMMENTS,
        comments::SUBMIT,
        serde_json::Value::Null,
    ));
    harness.settle().await;

    {
        let submitted = harness.submitted.lock().expect("submitted lock");
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].content, "lovely light");
    }

    let comments_state = harness.comments_state().await;
    assert!(comments_state.editor.content.is_empty());
    assert_eq!(
        comments_state.loading.get(comments::LOADING_SUBMIT),
        Some(&LoadingState::Stop)
    );
}

#[tokio::test]
async fn videos_route_mounts_only_the_video_list() {
    let harness = start("/videos?videos-page=4", StartOptions::default()).await;

    let state = harness.store.snapshot().await;
    assert_eq!(state.router.data.matched, vec![names::VIDEOS.to_string()]);
    assert!(!state.modules.contains_key(names::PHOTOS));

    let videos_state: VideosState = harness
        .store
        .slice(names::VIDEOS)
        .await
        .expect("videos slice");
    assert_eq!(videos_state.list_data.search.page, 4);
    assert_eq!(videos_state.list_data.items, Some(Vec::new()));
}

#[tokio::test]
async fn pagination_intent_updates_url_and_refetches() {
    let harness = start("/photos?photos-page=2", StartOptions::default()).await;

    harness.store.dispatch(Action::new(
        names::PHOTOS,
        photos::OPEN_LIST,
        ListOptions {
            page: Some(3),
            ..ListOptions::default()
        },
    ));
    harness.settle().await;

    let state = harness.store.snapshot().await;
    assert!(state.router.location.search.contains("photos-page=3"));

    let photos_state = harness.photos_state().await;
    assert_eq!(photos_state.list_data.search.page, 3);
}
