//! Video gallery module, the list-only sibling of photos.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use client_store::{
    decode_payload, decode_slice, encode_slice, parse_query, Action, Capabilities, Effect,
    LoadingState, ModuleModel, Store,
};
use services::ContentService;
use shared::domain::{ListData, VideoListItem};

use crate::modules::{names, photos::search_from_query};

pub const PUT_LIST: &str = "putList";
pub const FETCH_LIST: &str = "fetchList";

pub const LOADING_GLOBAL: &str = "global";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideosState {
    pub list_data: ListData<VideoListItem>,
    pub loading: BTreeMap<String, LoadingState>,
}

impl Default for VideosState {
    fn default() -> Self {
        let mut loading = BTreeMap::new();
        loading.insert(LOADING_GLOBAL.to_string(), LoadingState::Stop);
        Self {
            list_data: ListData::default(),
            loading,
        }
    }
}

fn put_list(slice: Value, payload: &Value) -> Value {
    let mut state: VideosState = decode_slice(slice, names::VIDEOS);
    state.list_data = decode_payload(payload, "videos/putList");
    encode_slice(&state)
}

pub struct VideosModule {
    content: Arc<dyn ContentService>,
}

impl VideosModule {
    pub fn new(content: Arc<dyn ContentService>) -> Self {
        Self { content }
    }

    fn fetch_list_effect(&self) -> Effect {
        let content = Arc::clone(&self.content);
        Effect::with_loading(LOADING_GLOBAL, move |store: Store, payload: Value| {
            let content = Arc::clone(&content);
            async move {
                let search = decode_payload(&payload, "videos/fetchList");
                let data = content.list_videos(&search).await?;
                store.dispatch(Action::new(names::VIDEOS, PUT_LIST, data));
                Ok(())
            }
        })
    }

    fn init_reaction(&self) -> Effect {
        Effect::new(move |store: Store, _payload: Value| async move {
            let location = store.snapshot().await.router.location;
            let query = parse_query(&location.search);
            let search = search_from_query(query.get(names::VIDEOS));
            store.dispatch(Action::new(names::VIDEOS, FETCH_LIST, search));
            Ok(())
        })
    }
}

impl ModuleModel for VideosModule {
    fn name(&self) -> &'static str {
        names::VIDEOS
    }

    fn initial_state(&self) -> Value {
        encode_slice(&VideosState::default())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .reducer(PUT_LIST, put_list)
            .effect(FETCH_LIST, self.fetch_list_effect())
            .reaction(format!("{}/INIT", names::VIDEOS), self.init_reaction())
    }
}
