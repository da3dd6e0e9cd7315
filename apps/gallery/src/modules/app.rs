//! Root module: owns startup, the URL query namespace map, the current
//! session identity, and the global error channel.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use client_store::{
    decode_payload, decode_slice, encode_slice, parse_query,
    resolver::{resolve, ModuleRegistry, RouteDecision},
    Action, Capabilities, Effect, LoadingState, Location, ModuleModel, QueryMap, RouteData, Store,
    ERROR_ACTION, LOCATION_CHANGE_ACTION,
};
use services::{Alerter, LoginRequest, SessionService, SettingsService};
use shared::{
    domain::{CurUser, ProjectConfig, StartupStep},
    error::{classify, AppError, ErrorDisposition, NOT_FOUND_MARKER},
};

use crate::{
    modules::names,
    routes::{fast_redirect, route_table},
};

pub const PUT_STARTUP: &str = "putStartup";
pub const PUT_QUERY: &str = "putQuery";
pub const PUT_CUR_USER: &str = "putCurUser";
pub const UPDATE: &str = "update";
pub const LOGIN: &str = "login";

pub const LOADING_GLOBAL: &str = "global";
pub const LOADING_LOGIN: &str = "login";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub query: QueryMap,
    pub project_config: Option<ProjectConfig>,
    pub cur_user: Option<CurUser>,
    pub startup_step: StartupStep,
    pub loading: BTreeMap<String, LoadingState>,
}

impl Default for AppState {
    fn default() -> Self {
        let mut loading = BTreeMap::new();
        loading.insert(LOADING_GLOBAL.to_string(), LoadingState::Stop);
        loading.insert(LOADING_LOGIN.to_string(), LoadingState::Stop);
        Self {
            query: QueryMap::new(),
            project_config: None,
            cur_user: None,
            startup_step: StartupStep::Init,
            loading,
        }
    }
}

/// Single combined commit of everything startup learned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupCommit {
    pub query: QueryMap,
    pub project_config: ProjectConfig,
    pub cur_user: CurUser,
    pub startup_step: StartupStep,
}

fn put_startup(slice: Value, payload: &Value) -> Value {
    let mut state: AppState = decode_slice(slice, names::APP);
    state.startup_step = decode_payload(payload, "app/putStartup");
    encode_slice(&state)
}

fn put_query(slice: Value, payload: &Value) -> Value {
    let mut state: AppState = decode_slice(slice, names::APP);
    state.query = decode_payload(payload, "app/putQuery");
    encode_slice(&state)
}

fn put_cur_user(slice: Value, payload: &Value) -> Value {
    let mut state: AppState = decode_slice(slice, names::APP);
    state.cur_user = Some(decode_payload(payload, "app/putCurUser"));
    encode_slice(&state)
}

fn update(slice: Value, payload: &Value) -> Value {
    let mut state: AppState = decode_slice(slice, names::APP);
    let commit: StartupCommit = decode_payload(payload, "app/update");
    state.query = commit.query;
    state.project_config = Some(commit.project_config);
    state.cur_user = Some(commit.cur_user);
    state.startup_step = commit.startup_step;
    encode_slice(&state)
}

pub struct AppModule {
    session: Arc<dyn SessionService>,
    settings: Arc<dyn SettingsService>,
    alerter: Arc<dyn Alerter>,
    navigator: Arc<dyn client_store::router::Navigator>,
    registry: ModuleRegistry,
    client_public_path: String,
}

impl AppModule {
    pub fn new(
        session: Arc<dyn SessionService>,
        settings: Arc<dyn SettingsService>,
        alerter: Arc<dyn Alerter>,
        navigator: Arc<dyn client_store::router::Navigator>,
        registry: ModuleRegistry,
        client_public_path: impl Into<String>,
    ) -> Self {
        Self {
            session,
            settings,
            alerter,
            navigator,
            registry,
            client_public_path: client_public_path.into(),
        }
    }

    fn init_effect(&self) -> Effect {
        let session = Arc::clone(&self.session);
        let settings = Arc::clone(&self.settings);
        let registry = self.registry.clone();
        let client_public_path = self.client_public_path.clone();
        Effect::with_loading(LOADING_GLOBAL, move |store: Store, _payload: Value| {
            let session = Arc::clone(&session);
            let settings = Arc::clone(&settings);
            let registry = registry.clone();
            let client_public_path = client_public_path.clone();
            async move {
                let router = store.snapshot().await.router;
                let query = parse_query(&router.location.search);

                let (project_config, cur_user) =
                    tokio::try_join!(settings.get_settings(), session.get_cur_user())?;
                info!(user = %cur_user.username, "startup configuration loaded");

                store.dispatch(Action::new(
                    names::APP,
                    UPDATE,
                    StartupCommit {
                        query,
                        project_config,
                        cur_user: cur_user.clone(),
                        startup_step: StartupStep::ConfigLoaded,
                    },
                ));

                let table = route_table(&cur_user);
                let not_found_url = format!("{client_public_path}{NOT_FOUND_MARKER}");
                let mut matched = Vec::new();
                for resolution in resolve(&router.location.pathname, &table, &not_found_url) {
                    match resolution.decision {
                        RouteDecision::Module(id) => {
                            let model = registry.load(id)?;
                            store.mount(model).await;
                            matched.push(id.to_string());
                        }
                        RouteDecision::Placeholder => {}
                        RouteDecision::Redirect { code, to } => {
                            return Err(AppError::redirect(code, to));
                        }
                    }
                }
                store.dispatch(Action::route_data(&RouteData { matched }));
                Ok(())
            }
        })
    }

    fn location_change_reaction(&self) -> Effect {
        let navigator = Arc::clone(&self.navigator);
        Effect::new(move |store: Store, payload: Value| {
            let navigator = Arc::clone(&navigator);
            async move {
                let location: Location = decode_payload(&payload, LOCATION_CHANGE_ACTION);
                if let Some(to) = fast_redirect(&location.pathname) {
                    navigator.replace(to);
                    return Ok(());
                }
                // Query parsing is centralized here; modules read their own
                // namespace from the app slice.
                let query = parse_query(&location.search);
                store.dispatch(Action::new(names::APP, PUT_QUERY, query));
                Ok(())
            }
        })
    }

    fn error_reaction(&self) -> Effect {
        let navigator = Arc::clone(&self.navigator);
        let settings = Arc::clone(&self.settings);
        Effect::new(move |_store: Store, payload: Value| {
            let navigator = Arc::clone(&navigator);
            let settings = Arc::clone(&settings);
            async move {
                let error: AppError = decode_payload(&payload, ERROR_ACTION);
                match classify(&error, NOT_FOUND_MARKER) {
                    ErrorDisposition::HardRedirect(url) => navigator.hard_redirect(&url),
                    ErrorDisposition::ReplacePath(path) => navigator.replace(&path),
                    ErrorDisposition::Report => settings.report_error(&error).await?,
                }
                Ok(())
            }
        })
    }

    fn login_effect(&self) -> Effect {
        let session = Arc::clone(&self.session);
        let alerter = Arc::clone(&self.alerter);
        Effect::with_loading(LOADING_LOGIN, move |store: Store, payload: Value| {
            let session = Arc::clone(&session);
            let alerter = Arc::clone(&alerter);
            async move {
                let request: LoginRequest = decode_payload(&payload, "app/login");
                match session.login(&request).await {
                    Ok(user) => store.dispatch(Action::new(names::APP, PUT_CUR_USER, user)),
                    // Login failures alert instead of entering the error
                    // protocol; the one user-facing exception.
                    Err(err) => alerter.alert(&err.message),
                }
                Ok(())
            }
        })
    }
}

impl ModuleModel for AppModule {
    fn name(&self) -> &'static str {
        names::APP
    }

    fn initial_state(&self) -> Value {
        encode_slice(&AppState::default())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .reducer(PUT_STARTUP, put_startup)
            .reducer(PUT_QUERY, put_query)
            .reducer(PUT_CUR_USER, put_cur_user)
            .reducer(UPDATE, update)
            .effect(LOGIN, self.login_effect())
            .reaction(format!("{}/INIT", names::APP), self.init_effect())
            .reaction(LOCATION_CHANGE_ACTION, self.location_change_reaction())
            .reaction(ERROR_ACTION, self.error_reaction())
    }
}
