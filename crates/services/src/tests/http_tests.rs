use axum::{
    extract::Query,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tokio::net::TcpListener;

use shared::domain::ListSummary;

use super::*;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn api(base: &str) -> ApiClient {
    ApiClient::new(base).expect("api client")
}

fn photo_item(id: &str) -> PhotoListItem {
    PhotoListItem {
        id: id.to_string(),
        title: "Highland mist".into(),
        cover_url: format!("/img/{id}.jpg"),
        hits: 12,
        comment_count: 3,
        create_time_desc: "yesterday".into(),
        photos: Vec::new(),
    }
}

#[tokio::test]
async fn fetches_current_user_and_logs_in() {
    let router = Router::new()
        .route("/session", get(|| async { Json(CurUser::guest()) }))
        .route(
            "/session/login",
            post(|Json(request): Json<LoginRequest>| async move {
                Json(CurUser {
                    uid: "u1".into(),
                    username: request.username,
                    has_login: true,
                    avatar_url: String::new(),
                })
            }),
        );
    let base = serve(router).await;
    let service = HttpSessionService::new(api(&base));

    let guest = service.get_cur_user().await.expect("cur user");
    assert!(!guest.has_login);

    let user = service
        .login(&LoginRequest {
            username: "kit".into(),
            password: "hunter2".into(),
        })
        .await
        .expect("login");
    assert!(user.has_login);
    assert_eq!(user.username, "kit");
}

#[tokio::test]
async fn lists_photos_passing_search_as_query_string() {
    let router = Router::new().route(
        "/photos",
        get(|Query(search): Query<ListSearch>| async move {
            Json(ListData::<PhotoListItem> {
                search,
                items: Some(vec![photo_item("p1")]),
                summary: Some(ListSummary {
                    page: 2,
                    page_size: 10,
                    total: 11,
                    total_pages: 2,
                }),
            })
        }),
    );
    let base = serve(router).await;
    let service = HttpContentService::new(api(&base));

    let search = ListSearch {
        title: Some("mist".into()),
        page: 2,
        page_size: 10,
    };
    let data = service.list_photos(&search).await.expect("list photos");
    // The server echoes the search it decoded from the query string.
    assert_eq!(data.search, search);
    assert_eq!(data.items.as_deref().map(<[_]>::len), Some(1));
    assert_eq!(data.summary.map(|s| s.total_pages), Some(2));
}

#[tokio::test]
async fn submits_comment_drafts() {
    let router = Router::new().route(
        "/comments",
        post(|Json(draft): Json<CommentDraft>| async move {
            Json(Comment {
                id: "c9".into(),
                article_id: draft.article_id,
                username: "kit".into(),
                avatar_url: String::new(),
                content: draft.content,
                create_time: Utc::now(),
            })
        }),
    );
    let base = serve(router).await;
    let service = HttpContentService::new(api(&base));

    let comment = service
        .submit_comment(&CommentDraft {
            article_id: "p1".into(),
            content: "lovely light".into(),
        })
        .await
        .expect("submit comment");
    assert_eq!(comment.article_id, "p1");
    assert_eq!(comment.content, "lovely light");
}

#[tokio::test]
async fn reports_errors_to_the_collector() {
    let router = Router::new().route(
        "/settings/error-report",
        post(|Json(_error): Json<AppError>| async move { StatusCode::NO_CONTENT }),
    );
    let base = serve(router).await;
    let service = HttpSettingsService::new(api(&base));

    service
        .report_error(&AppError::new("500", "backend exploded"))
        .await
        .expect("report error");
}

#[tokio::test]
async fn maps_http_status_onto_error_code() {
    let router = Router::new().route(
        "/settings",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = serve(router).await;
    let service = HttpSettingsService::new(api(&base));

    let err = service.get_settings().await.unwrap_err();
    assert_eq!(err.code, "500");
}

#[tokio::test]
async fn unreachable_host_is_a_network_class_error() {
    // Nothing listens on this port.
    let service = HttpSessionService::new(api("http://127.0.0.1:9"));
    let err = service.get_cur_user().await.unwrap_err();
    assert_eq!(err.code, "network");
}
