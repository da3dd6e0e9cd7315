pub mod app;
pub mod comments;
pub mod photos;
pub mod videos;

/// Module names double as state-slice keys and query namespaces.
pub mod names {
    pub const APP: &str = "app";
    pub const COMMENTS: &str = "comments";
    pub const PHOTOS: &str = "photos";
    pub const VIDEOS: &str = "videos";
}
