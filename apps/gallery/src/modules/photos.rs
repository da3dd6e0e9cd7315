//! Photo gallery module: paginated list plus item detail.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use client_store::{
    decode_payload, decode_slice, encode_slice,
    query::{extend_search, parse_query, ModuleQuery},
    router::Navigator,
    Action, Capabilities, Effect, LoadingState, ModuleModel, Store,
};
use services::ContentService;
use shared::{
    domain::{ListData, ListSearch, PhotoDetail, PhotoListItem},
    query::QueryValue,
};

use crate::{modules::names, routes::photo_article_id};

pub const PUT_LIST: &str = "putList";
pub const PUT_DETAIL: &str = "putDetail";
pub const FETCH_LIST: &str = "fetchList";
pub const FETCH_DETAIL: &str = "fetchDetail";
pub const OPEN_LIST: &str = "openList";

pub const LOADING_GLOBAL: &str = "global";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotosState {
    pub list_data: ListData<PhotoListItem>,
    pub detail: Option<PhotoDetail>,
    pub loading: BTreeMap<String, LoadingState>,
}

impl Default for PhotosState {
    fn default() -> Self {
        let mut loading = BTreeMap::new();
        loading.insert(LOADING_GLOBAL.to_string(), LoadingState::Stop);
        Self {
            list_data: ListData::default(),
            detail: None,
            loading,
        }
    }
}

/// Partial search patch carried by `openList` (a pagination click patches
/// only `page`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

pub(crate) fn merge_options(search: &ListSearch, options: &ListOptions) -> ListSearch {
    ListSearch {
        title: options.title.clone().or_else(|| search.title.clone()),
        page: options.page.unwrap_or(search.page),
        page_size: options.page_size.unwrap_or(search.page_size),
    }
}

/// Build the list search from this module's query namespace; absent keys fall
/// back to the defaults.
pub(crate) fn search_from_query(query: Option<&ModuleQuery>) -> ListSearch {
    let mut search = ListSearch::default();
    let Some(query) = query else {
        return search;
    };
    if let Some(page) = query.get("page").and_then(QueryValue::as_u32) {
        search.page = page;
    }
    if let Some(page_size) = query.get("pageSize").and_then(QueryValue::as_u32) {
        search.page_size = page_size;
    }
    if let Some(title) = query.get("title").and_then(|value| value.as_str()) {
        search.title = Some(title.to_string());
    }
    search
}

fn put_list(slice: Value, payload: &Value) -> Value {
    let mut state: PhotosState = decode_slice(slice, names::PHOTOS);
    state.list_data = decode_payload(payload, "photos/putList");
    encode_slice(&state)
}

fn put_detail(slice: Value, payload: &Value) -> Value {
    let mut state: PhotosState = decode_slice(slice, names::PHOTOS);
    state.detail = Some(decode_payload(payload, "photos/putDetail"));
    encode_slice(&state)
}

pub struct PhotosModule {
    content: Arc<dyn ContentService>,
    navigator: Arc<dyn Navigator>,
}

impl PhotosModule {
    pub fn new(content: Arc<dyn ContentService>, navigator: Arc<dyn Navigator>) -> Self {
        Self { content, navigator }
    }

    fn fetch_list_effect(&self) -> Effect {
        let content = Arc::clone(&self.content);
        Effect::with_loading(LOADING_GLOBAL, move |store: Store, payload: Value| {
            let content = Arc::clone(&content);
            async move {
                let search: ListSearch = decode_payload(&payload, "photos/fetchList");
                let data = content.list_photos(&search).await?;
                store.dispatch(Action::new(names::PHOTOS, PUT_LIST, data));
                Ok(())
            }
        })
    }

    fn fetch_detail_effect(&self) -> Effect {
        let content = Arc::clone(&self.content);
        Effect::with_loading(LOADING_GLOBAL, move |store: Store, payload: Value| {
            let content = Arc::clone(&content);
            async move {
                let id: String = decode_payload(&payload, "photos/fetchDetail");
                let detail = content.photo_detail(&id).await?;
                store.dispatch(Action::new(names::PHOTOS, PUT_DETAIL, detail));
                Ok(())
            }
        })
    }

    /// Pagination/search intent from the view layer: patch the current
    /// search, reflect it in the URL, refetch.
    fn open_list_effect(&self) -> Effect {
        let navigator = Arc::clone(&self.navigator);
        Effect::new(move |store: Store, payload: Value| {
            let navigator = Arc::clone(&navigator);
            async move {
                let options: ListOptions = decode_payload(&payload, "photos/openList");
                let state: PhotosState =
                    store.slice(names::PHOTOS).await.unwrap_or_default();
                let merged = merge_options(&state.list_data.search, &options);

                let location = store.snapshot().await.router.location;
                let mut patch = ModuleQuery::new();
                patch.insert("page".into(), QueryValue::Int(i64::from(merged.page)));
                patch.insert(
                    "pageSize".into(),
                    QueryValue::Int(i64::from(merged.page_size)),
                );
                if let Some(title) = &merged.title {
                    patch.insert("title".into(), QueryValue::Text(title.clone()));
                }
                let search = extend_search(names::PHOTOS, &parse_query(&location.search), patch);
                navigator.replace(&format!("{}{search}", location.pathname));

                store.dispatch(Action::new(names::PHOTOS, FETCH_LIST, merged));
                Ok(())
            }
        })
    }

    fn init_reaction(&self) -> Effect {
        Effect::new(move |store: Store, _payload: Value| async move {
            let location = store.snapshot().await.router.location;
            let query = parse_query(&location.search);
            let search = search_from_query(query.get(names::PHOTOS));
            store.dispatch(Action::new(names::PHOTOS, FETCH_LIST, search));
            if let Some(id) = photo_article_id(&location.pathname) {
                store.dispatch(Action::new(names::PHOTOS, FETCH_DETAIL, id));
            }
            Ok(())
        })
    }
}

impl ModuleModel for PhotosModule {
    fn name(&self) -> &'static str {
        names::PHOTOS
    }

    fn initial_state(&self) -> Value {
        encode_slice(&PhotosState::default())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .reducer(PUT_LIST, put_list)
            .reducer(PUT_DETAIL, put_detail)
            .effect(FETCH_LIST, self.fetch_list_effect())
            .effect(FETCH_DETAIL, self.fetch_detail_effect())
            .effect(OPEN_LIST, self.open_list_effect())
            .reaction(format!("{}/INIT", names::PHOTOS), self.init_reaction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_falls_back_to_defaults() {
        assert_eq!(search_from_query(None), ListSearch::default());
    }

    #[test]
    fn search_reads_module_namespace() {
        let query = parse_query("photos-page=3&photos-pageSize=20&photos-title=mist");
        let search = search_from_query(query.get(names::PHOTOS));
        assert_eq!(search.page, 3);
        assert_eq!(search.page_size, 20);
        assert_eq!(search.title.as_deref(), Some("mist"));
    }

    #[test]
    fn options_patch_only_what_they_carry() {
        let search = ListSearch {
            title: Some("mist".into()),
            page: 2,
            page_size: 10,
        };
        let merged = merge_options(
            &search,
            &ListOptions {
                page: Some(3),
                ..ListOptions::default()
            },
        );
        assert_eq!(merged.page, 3);
        assert_eq!(merged.page_size, 10);
        assert_eq!(merged.title.as_deref(), Some("mist"));
    }

    #[test]
    fn put_list_replaces_the_envelope() {
        let data = ListData::<PhotoListItem> {
            search: ListSearch::default(),
            items: Some(Vec::new()),
            summary: None,
        };
        let slice = put_list(
            encode_slice(&PhotosState::default()),
            &serde_json::to_value(&data).expect("list data"),
        );
        let state: PhotosState = decode_slice(slice, names::PHOTOS);
        assert_eq!(state.list_data.items, Some(Vec::new()));
    }
}
