//! Module state orchestrator: one global state tree, one dispatch stream.
//!
//! Each feature module owns a named slice of [`RootState`] and declares an
//! explicit [`Capabilities`] record: pure reducers keyed by action kind,
//! asynchronous effects keyed by action kind, and reactions keyed by a
//! foreign action's full type tag. A single dispatch loop applies reducers
//! in dispatch order and spawns effects; effects are the only suspension
//! points, and the loop is the only writer of the state tree.

use std::{
    collections::{BTreeMap, HashMap},
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, Notify, RwLock};
use tracing::{debug, error, warn};

use shared::error::AppError;

pub mod loading;
pub mod query;
pub mod resolver;
pub mod router;

pub use loading::LoadingState;
pub use query::{parse_query, QueryMap};
pub use router::{Location, RouteData, RouterState};

/// Pseudo-module owning framework-level actions (the global error channel).
pub const FRAMEWORK_MODULE: &str = "@@framework";
/// Pseudo-module owning router actions.
pub const ROUTER_MODULE: &str = "@@router";

pub const ERROR_KIND: &str = "ERROR";
pub const INIT_KIND: &str = "INIT";
pub const LOADING_KIND: &str = "LOADING";
pub const LOCATION_CHANGE_KIND: &str = "LOCATION_CHANGE";
pub const ROUTE_DATA_KIND: &str = "ROUTE_DATA";

/// Full type tag of the global error action.
pub const ERROR_ACTION: &str = "@@framework/ERROR";
/// Full type tag of the location change action.
pub const LOCATION_CHANGE_ACTION: &str = "@@router/LOCATION_CHANGE";

/// A dispatched record describing an intended state change or event. Every
/// state mutation is attributed to exactly one action, applied in dispatch
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub module: String,
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    pub fn new(module: impl Into<String>, kind: impl Into<String>, payload: impl Serialize) -> Self {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                error!("unserializable action payload: {err}");
                Value::Null
            }
        };
        Self {
            module: module.into(),
            kind: kind.into(),
            payload,
        }
    }

    /// `"<module>/<kind>"`, the tag reactions are keyed by.
    pub fn tag(&self) -> String {
        format!("{}/{}", self.module, self.kind)
    }

    pub fn error(err: &AppError) -> Self {
        Self::new(FRAMEWORK_MODULE, ERROR_KIND, err)
    }

    pub fn location_change(location: &Location) -> Self {
        Self::new(ROUTER_MODULE, LOCATION_CHANGE_KIND, location)
    }

    pub fn route_data(data: &RouteData) -> Self {
        Self::new(ROUTER_MODULE, ROUTE_DATA_KIND, data)
    }

    fn loading(module: &str, key: &str, state: LoadingState) -> Self {
        Self::new(module, LOADING_KIND, LoadingPayload {
            key: key.to_string(),
            state,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LoadingPayload {
    key: String,
    state: LoadingState,
}

/// Decode an action payload into its declared shape. A mismatch is a
/// programming error under correct dispatch and fails fast.
pub fn decode_payload<T: DeserializeOwned>(payload: &Value, context: &str) -> T {
    match serde_json::from_value(payload.clone()) {
        Ok(decoded) => decoded,
        Err(err) => panic!("invalid payload for {context}: {err}"),
    }
}

/// Decode a module's state slice. Slices are written only by their owning
/// module's reducers, so a shape mismatch is a programming error.
pub fn decode_slice<T: DeserializeOwned>(slice: Value, module: &str) -> T {
    match serde_json::from_value(slice) {
        Ok(decoded) => decoded,
        Err(err) => panic!("state slice of module '{module}' does not decode: {err}"),
    }
}

pub fn encode_slice<T: Serialize>(state: &T) -> Value {
    match serde_json::to_value(state) {
        Ok(value) => value,
        Err(err) => panic!("state slice does not encode: {err}"),
    }
}

/// Pure synchronous state transition: `(slice, payload) -> slice`. The fn
/// pointer type keeps reducers capture-free.
pub type Reducer = fn(Value, &Value) -> Value;

pub type EffectFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send>>;
pub type EffectFn = Arc<dyn Fn(Store, Value) -> EffectFuture + Send + Sync>;

/// Asynchronous coordinator: may call external services and dispatch further
/// actions. An effect bound to a loading key drives that key through
/// `Stop -> Loading -> Stop/Failed` around its run.
#[derive(Clone)]
pub struct Effect {
    loading_key: Option<&'static str>,
    run: EffectFn,
}

impl Effect {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Store, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        Self {
            loading_key: None,
            run: Arc::new(move |store, payload| -> EffectFuture {
                Box::pin(f(store, payload))
            }),
        }
    }

    pub fn with_loading<F, Fut>(key: &'static str, f: F) -> Self
    where
        F: Fn(Store, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        Self {
            loading_key: Some(key),
            ..Self::new(f)
        }
    }
}

/// Explicit capability record of one feature module.
///
/// `reducers` and `effects` answer the module's own action kinds; `effects`
/// are the module's public asynchronous surface. `reactions` are private:
/// keyed by a full action tag (usually another module's), they run only when
/// the dispatcher sees that action flow by and cannot be invoked directly.
#[derive(Clone, Default)]
pub struct Capabilities {
    reducers: HashMap<&'static str, Reducer>,
    effects: HashMap<&'static str, Effect>,
    reactions: HashMap<String, Effect>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reducer(mut self, kind: &'static str, reduce: Reducer) -> Self {
        self.reducers.insert(kind, reduce);
        self
    }

    pub fn effect(mut self, kind: &'static str, effect: Effect) -> Self {
        self.effects.insert(kind, effect);
        self
    }

    pub fn reaction(mut self, tag: impl Into<String>, effect: Effect) -> Self {
        self.reactions.insert(tag.into(), effect);
        self
    }
}

/// A self-contained feature unit owning one named slice of global state.
pub trait ModuleModel: Send + Sync {
    fn name(&self) -> &'static str;
    fn initial_state(&self) -> Value;
    fn capabilities(&self) -> Capabilities;
}

/// The union of all mounted module slices plus router state. Created once at
/// startup; slices are replaced, never mutated in place, on every reducer
/// application.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RootState {
    pub router: RouterState,
    pub modules: BTreeMap<String, Value>,
}

impl RootState {
    pub fn raw_slice(&self, module: &str) -> Option<&Value> {
        self.modules.get(module)
    }

    pub fn slice<T: DeserializeOwned>(&self, module: &str) -> Option<T> {
        self.modules
            .get(module)
            .map(|value| decode_slice(value.clone(), module))
    }
}

struct StoreInner {
    state: RwLock<RootState>,
    mounted: Mutex<BTreeMap<&'static str, Capabilities>>,
    /// Queued actions plus in-flight effects; zero means quiescent.
    pending: AtomicUsize,
    idle: Notify,
}

impl StoreInner {
    fn begin(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    fn done(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Handle to the shared store: dispatch actions, read snapshots, mount
/// modules. Cloning is cheap; all clones address the same state tree.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    tx: mpsc::UnboundedSender<Action>,
}

impl Store {
    /// Create the store and start its dispatch loop. Must be called from
    /// within a tokio runtime. The loop stops once every handle is dropped
    /// and the queue has drained.
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let inner = Arc::new(StoreInner {
            state: RwLock::new(RootState::default()),
            mounted: Mutex::new(BTreeMap::new()),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
        });

        let loop_inner = Arc::clone(&inner);
        let loop_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(action) = rx.recv().await {
                process(&loop_inner, &loop_tx, action).await;
                loop_inner.done();
            }
        });

        Self { inner, tx }
    }

    pub fn dispatch(&self, action: Action) {
        self.inner.begin();
        if self.tx.send(action).is_err() {
            self.inner.done();
            warn!("dispatch after store loop stopped");
        }
    }

    pub async fn snapshot(&self) -> RootState {
        self.inner.state.read().await.clone()
    }

    pub async fn slice<T: DeserializeOwned>(&self, module: &str) -> Option<T> {
        self.inner.state.read().await.slice(module)
    }

    /// Mount a feature module against the store: install its capabilities,
    /// seed its initial slice, and dispatch `<module>/INIT`. Idempotent per
    /// application lifetime; returns false when the module was already
    /// mounted.
    pub async fn mount(&self, model: Arc<dyn ModuleModel>) -> bool {
        let name = model.name();
        {
            let mut mounted = self.inner.mounted.lock().expect("mounted lock");
            if mounted.contains_key(name) {
                debug!(module = name, "module already mounted");
                return false;
            }
            mounted.insert(name, model.capabilities());
        }
        {
            let mut state = self.inner.state.write().await;
            state
                .modules
                .entry(name.to_string())
                .or_insert_with(|| model.initial_state());
        }
        debug!(module = name, "module mounted");
        self.dispatch(Action::new(name, INIT_KIND, Value::Null));
        true
    }

    pub fn is_mounted(&self, module: &str) -> bool {
        self.inner
            .mounted
            .lock()
            .expect("mounted lock")
            .contains_key(module)
    }

    /// Wait until the queue is empty and no effect is in flight.
    pub async fn settle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before the check so a wakeup between the two is not
            // lost.
            notified.as_mut().enable();
            if self.inner.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

async fn process(inner: &Arc<StoreInner>, tx: &mpsc::UnboundedSender<Action>, action: Action) {
    debug!(tag = %action.tag(), "dispatch");

    if action.module == ROUTER_MODULE {
        match action.kind.as_str() {
            LOCATION_CHANGE_KIND => {
                let location: Location = decode_payload(&action.payload, LOCATION_CHANGE_ACTION);
                let mut state = inner.state.write().await;
                state.router.location = location;
            }
            ROUTE_DATA_KIND => {
                let data: RouteData = decode_payload(&action.payload, "@@router/ROUTE_DATA");
                let mut state = inner.state.write().await;
                state.router.data = data;
            }
            _ => {}
        }
    } else if action.kind == LOADING_KIND {
        apply_loading(inner, &action).await;
    } else {
        let target = {
            let mounted = inner.mounted.lock().expect("mounted lock");
            mounted
                .get_key_value(action.module.as_str())
                .map(|(name, caps)| {
                    (
                        *name,
                        caps.reducers.get(action.kind.as_str()).copied(),
                        caps.effects.get(action.kind.as_str()).cloned(),
                    )
                })
        };

        if let Some((module, reducer, effect)) = target {
            if let Some(reduce) = reducer {
                let mut state = inner.state.write().await;
                match state.modules.get(&action.module).cloned() {
                    Some(slice) => {
                        let next = reduce(slice, &action.payload);
                        state.modules.insert(action.module.clone(), next);
                    }
                    None => warn!(tag = %action.tag(), "reducer for a module with no state slice"),
                }
            } else if let Some(effect) = effect {
                spawn_effect(inner, tx, module, effect, action.payload.clone(), false);
            }
        }
    }

    // Reactions: any mounted module listening on this action's full tag.
    let tag = action.tag();
    let reactions: Vec<(&'static str, Effect)> = {
        let mounted = inner.mounted.lock().expect("mounted lock");
        mounted
            .iter()
            .filter_map(|(name, caps)| caps.reactions.get(&tag).map(|e| (*name, e.clone())))
            .collect()
    };
    let suppress_error_dispatch = tag == ERROR_ACTION;
    for (module, effect) in reactions {
        spawn_effect(
            inner,
            tx,
            module,
            effect,
            action.payload.clone(),
            suppress_error_dispatch,
        );
    }
}

async fn apply_loading(inner: &Arc<StoreInner>, action: &Action) {
    let LoadingPayload { key, state: next } =
        decode_payload(&action.payload, &format!("{}/{}", action.module, LOADING_KIND));
    let mut state = inner.state.write().await;
    let Some(slice) = state.modules.get(&action.module) else {
        warn!(module = %action.module, "loading update for unmounted module");
        return;
    };
    let mut slice = slice.clone();
    match slice.get_mut("loading").and_then(Value::as_object_mut) {
        Some(loading) => {
            loading.insert(key, encode_slice(&next));
            state.modules.insert(action.module.clone(), slice);
        }
        None => warn!(
            module = %action.module,
            "module slice has no loading map, update dropped"
        ),
    }
}

fn spawn_effect(
    inner: &Arc<StoreInner>,
    tx: &mpsc::UnboundedSender<Action>,
    module: &'static str,
    effect: Effect,
    payload: Value,
    suppress_error_dispatch: bool,
) {
    let store = Store {
        inner: Arc::clone(inner),
        tx: tx.clone(),
    };
    inner.begin();
    tokio::spawn(async move {
        if let Some(key) = effect.loading_key {
            store.dispatch(Action::loading(module, key, LoadingState::Loading));
        }
        match (effect.run)(store.clone(), payload).await {
            Ok(()) => {
                if let Some(key) = effect.loading_key {
                    store.dispatch(Action::loading(module, key, LoadingState::Stop));
                }
            }
            Err(err) => {
                if let Some(key) = effect.loading_key {
                    store.dispatch(Action::loading(module, key, LoadingState::Failed));
                }
                if suppress_error_dispatch {
                    // The error handler itself failed; re-raising would loop.
                    error!(module, code = %err.code, "error reaction failed: {}", err.message);
                } else {
                    debug!(module, code = %err.code, "effect failed: {}", err.message);
                    store.dispatch(Action::error(&err));
                }
            }
        }
        store.inner.done();
    });
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
