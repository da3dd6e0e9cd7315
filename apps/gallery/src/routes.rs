//! Static route table, fast redirects, and the lazy module registry.

use std::sync::Arc;

use client_store::{
    resolver::{ModuleRegistry, RouteDecision, RouteEntry},
    router::Navigator,
    ModuleModel,
};
use services::ContentService;
use shared::{domain::CurUser, error::REDIRECT_MOVED};

use crate::modules::{comments::CommentsModule, names, photos::PhotosModule, videos::VideosModule};

/// Bare or legacy paths that jump straight to their canonical destination,
/// checked on every location change before any module work happens.
pub fn fast_redirect(pathname: &str) -> Option<&'static str> {
    match pathname {
        "" | "/" | "/index.html" => Some("/photos"),
        _ => None,
    }
}

/// First path segment after `/photos/`: the article whose detail and comment
/// panels are open.
pub fn photo_article_id(pathname: &str) -> Option<String> {
    pathname
        .strip_prefix("/photos/")
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub fn route_table(cur_user: &CurUser) -> Vec<RouteEntry> {
    let has_login = cur_user.has_login;
    vec![
        // Auth gates: "my" needs a session, the login page is for guests.
        RouteEntry::new("/my", true, move || {
            if has_login {
                RouteDecision::Module(names::PHOTOS)
            } else {
                RouteDecision::Redirect {
                    code: REDIRECT_MOVED,
                    to: "/login".into(),
                }
            }
        }),
        RouteEntry::new("/login", true, move || {
            if has_login {
                RouteDecision::Redirect {
                    code: REDIRECT_MOVED,
                    to: "/".into(),
                }
            } else {
                RouteDecision::Placeholder
            }
        }),
        // Independent panels: every photos path carries the comment panel
        // next to the gallery itself.
        RouteEntry::new("/photos", false, || RouteDecision::Module(names::PHOTOS)),
        RouteEntry::new("/photos", false, || RouteDecision::Module(names::COMMENTS)),
        RouteEntry::new("/videos", true, || RouteDecision::Module(names::VIDEOS)),
    ]
}

pub fn build_registry(
    content: Arc<dyn ContentService>,
    navigator: Arc<dyn Navigator>,
) -> ModuleRegistry {
    let photos_content = Arc::clone(&content);
    let photos_navigator = Arc::clone(&navigator);
    let videos_content = Arc::clone(&content);
    ModuleRegistry::new()
        .register(names::PHOTOS, move || {
            Arc::new(PhotosModule::new(
                Arc::clone(&photos_content),
                Arc::clone(&photos_navigator),
            )) as Arc<dyn ModuleModel>
        })
        .register(names::VIDEOS, move || {
            Arc::new(VideosModule::new(Arc::clone(&videos_content))) as Arc<dyn ModuleModel>
        })
        .register(names::COMMENTS, move || {
            Arc::new(CommentsModule::new(Arc::clone(&content))) as Arc<dyn ModuleModel>
        })
}
