use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupStep {
    Init,
    ConfigLoaded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurUser {
    pub uid: String,
    pub username: String,
    pub has_login: bool,
    pub avatar_url: String,
}

impl CurUser {
    pub fn guest() -> Self {
        Self {
            uid: String::new(),
            username: "guest".into(),
            has_login: false,
            avatar_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub title: String,
    pub keywords: String,
    pub description: String,
}

/// Search criteria shared by every paginated list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListSearch {
    fn default() -> Self {
        Self {
            title: None,
            page: 1,
            page_size: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub page: u32,
    pub page_size: u32,
    pub total: u32,
    pub total_pages: u32,
}

/// List envelope a module keeps in its state slice: the search that produced
/// the page, the page items, and the paging summary. `items == None` means
/// "not fetched yet", distinct from an empty page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListData<T> {
    pub search: ListSearch,
    #[serde(default = "Option::default")]
    pub items: Option<Vec<T>>,
    #[serde(default = "Option::default")]
    pub summary: Option<ListSummary>,
}

impl<T> Default for ListData<T> {
    fn default() -> Self {
        Self {
            search: ListSearch::default(),
            items: None,
            summary: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoFrame {
    pub id: String,
    pub photo_id: String,
    pub photo_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoListItem {
    pub id: String,
    pub title: String,
    pub cover_url: String,
    pub hits: u32,
    pub comment_count: u32,
    pub create_time_desc: String,
    pub photos: Vec<PhotoFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDetail {
    #[serde(flatten)]
    pub item: PhotoListItem,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    pub id: String,
    pub title: String,
    pub cover_url: String,
    pub hits: u32,
    pub comment_count: u32,
    pub create_time_desc: String,
    pub duration_desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub username: String,
    pub avatar_url: String,
    pub content: String,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSearch {
    pub article_id: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for CommentSearch {
    fn default() -> Self {
        Self {
            article_id: String::new(),
            page: 1,
            page_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub article_id: String,
    pub content: String,
}

/// Comment list envelope; comments are scoped to an article, so their search
/// criteria differ from the generic [`ListSearch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListData {
    pub search: CommentSearch,
    #[serde(default = "Option::default")]
    pub items: Option<Vec<Comment>>,
    #[serde(default = "Option::default")]
    pub summary: Option<ListSummary>,
}
