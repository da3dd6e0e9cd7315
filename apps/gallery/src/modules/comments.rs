//! Comment module: article-scoped list plus a persistent editor panel.
//! Mounted alongside photos on `/photos` paths.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use client_store::{
    decode_payload, decode_slice, encode_slice, parse_query, Action, Capabilities, Effect,
    LoadingState, ModuleModel, Store,
};
use services::ContentService;
use shared::{
    domain::{CommentDraft, CommentListData, CommentSearch},
    error::AppError,
    query::QueryValue,
};

use crate::{modules::names, routes::photo_article_id};

pub const PUT_LIST: &str = "putList";
pub const PUT_EDITOR: &str = "putEditor";
pub const CLEAR_EDITOR: &str = "clearEditor";
pub const FETCH_LIST: &str = "fetchList";
pub const SUBMIT: &str = "submit";

pub const LOADING_GLOBAL: &str = "global";
pub const LOADING_SUBMIT: &str = "submit";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentEditor {
    pub article_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentsState {
    pub list_data: CommentListData,
    pub editor: CommentEditor,
    pub loading: BTreeMap<String, LoadingState>,
}

impl Default for CommentsState {
    fn default() -> Self {
        let mut loading = BTreeMap::new();
        loading.insert(LOADING_GLOBAL.to_string(), LoadingState::Stop);
        loading.insert(LOADING_SUBMIT.to_string(), LoadingState::Stop);
        Self {
            list_data: CommentListData::default(),
            editor: CommentEditor::default(),
            loading,
        }
    }
}

fn put_list(slice: Value, payload: &Value) -> Value {
    let mut state: CommentsState = decode_slice(slice, names::COMMENTS);
    state.list_data = decode_payload(payload, "comments/putList");
    encode_slice(&state)
}

fn put_editor(slice: Value, payload: &Value) -> Value {
    let mut state: CommentsState = decode_slice(slice, names::COMMENTS);
    state.editor = decode_payload(payload, "comments/putEditor");
    encode_slice(&state)
}

fn clear_editor(slice: Value, _payload: &Value) -> Value {
    let mut state: CommentsState = decode_slice(slice, names::COMMENTS);
    state.editor.content.clear();
    encode_slice(&state)
}

pub struct CommentsModule {
    content: Arc<dyn ContentService>,
}

impl CommentsModule {
    pub fn new(content: Arc<dyn ContentService>) -> Self {
        Self { content }
    }

    fn fetch_list_effect(&self) -> Effect {
        let content = Arc::clone(&self.content);
        Effect::with_loading(LOADING_GLOBAL, move |store: Store, payload: Value| {
            let content = Arc::clone(&content);
            async move {
                let search: CommentSearch = decode_payload(&payload, "comments/fetchList");
                let data = content.list_comments(&search).await?;
                store.dispatch(Action::new(names::COMMENTS, PUT_LIST, data));
                Ok(())
            }
        })
    }

    fn submit_effect(&self) -> Effect {
        let content = Arc::clone(&self.content);
        Effect::with_loading(LOADING_SUBMIT, move |store: Store, _payload: Value| {
            let content = Arc::clone(&content);
            async move {
                let state: CommentsState =
                    store.slice(names::COMMENTS).await.unwrap_or_default();
                let Some(article_id) = state.editor.article_id else {
                    return Err(AppError::new(
                        "validation",
                        "comment submitted without an article",
                    ));
                };
                if state.editor.content.trim().is_empty() {
                    return Err(AppError::new("validation", "empty comment rejected"));
                }

                content
                    .submit_comment(&CommentDraft {
                        article_id: article_id.clone(),
                        content: state.editor.content.clone(),
                    })
                    .await?;

                store.dispatch(Action::new(names::COMMENTS, CLEAR_EDITOR, Value::Null));
                // Show the fresh comment: reload the first page.
                store.dispatch(Action::new(
                    names::COMMENTS,
                    FETCH_LIST,
                    CommentSearch {
                        article_id,
                        page: 1,
                        page_size: state.list_data.search.page_size,
                    },
                ));
                Ok(())
            }
        })
    }

    fn init_reaction(&self) -> Effect {
        Effect::new(move |store: Store, _payload: Value| async move {
            let location = store.snapshot().await.router.location;
            let Some(article_id) = photo_article_id(&location.pathname) else {
                // List page: the panel stays idle until a photo is opened.
                return Ok(());
            };
            store.dispatch(Action::new(
                names::COMMENTS,
                PUT_EDITOR,
                CommentEditor {
                    article_id: Some(article_id.clone()),
                    content: String::new(),
                },
            ));
            let query = parse_query(&location.search);
            let page = query
                .get(names::COMMENTS)
                .and_then(|entries| entries.get("page"))
                .and_then(QueryValue::as_u32)
                .unwrap_or(1);
            store.dispatch(Action::new(
                names::COMMENTS,
                FETCH_LIST,
                CommentSearch {
                    article_id,
                    page,
                    ..CommentSearch::default()
                },
            ));
            Ok(())
        })
    }
}

impl ModuleModel for CommentsModule {
    fn name(&self) -> &'static str {
        names::COMMENTS
    }

    fn initial_state(&self) -> Value {
        encode_slice(&CommentsState::default())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .reducer(PUT_LIST, put_list)
            .reducer(PUT_EDITOR, put_editor)
            .reducer(CLEAR_EDITOR, clear_editor)
            .effect(FETCH_LIST, self.fetch_list_effect())
            .effect(SUBMIT, self.submit_effect())
            .reaction(format!("{}/INIT", names::COMMENTS), self.init_reaction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_editor_keeps_the_target_article() {
        let mut state = CommentsState::default();
        state.editor = CommentEditor {
            article_id: Some("p9".into()),
            content: "draft text".into(),
        };
        let slice = clear_editor(encode_slice(&state), &Value::Null);
        let state: CommentsState = decode_slice(slice, names::COMMENTS);
        assert_eq!(state.editor.article_id.as_deref(), Some("p9"));
        assert!(state.editor.content.is_empty());
    }
}
