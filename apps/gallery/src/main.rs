use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use tokio::time::timeout;
use tracing::info;

use client_store::{
    router::{MemoryHistory, Navigator},
    Store,
};
use gallery::{
    config,
    modules::{app::AppModule, app::AppState, names},
    routes::build_registry,
};
use services::{
    ApiClient, HttpContentService, HttpSessionService, HttpSettingsService, TracingAlerter,
};

#[derive(Parser, Debug)]
struct Args {
    /// Initial location, e.g. "/photos?photos-page=2".
    #[arg(long, default_value = "/photos")]
    path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = config::load_settings();

    let api = ApiClient::new(&settings.api_base_url)?;
    let session = Arc::new(HttpSessionService::new(api.clone()));
    let settings_service = Arc::new(HttpSettingsService::new(api.clone()));
    let content = Arc::new(HttpContentService::new(api));

    let store = Store::new();
    let history = MemoryHistory::new(store.clone());
    let navigator: Arc<dyn Navigator> = history.clone();

    let registry = build_registry(content, Arc::clone(&navigator));
    let app = AppModule::new(
        session,
        settings_service,
        Arc::new(TracingAlerter),
        navigator,
        registry,
        settings.client_public_path.clone(),
    );

    // The initial location must be in place before the root module mounts;
    // its startup effect reads the router state, not the raw argv.
    history.navigate(&args.path);
    store.settle().await;
    store.mount(Arc::new(app)).await;

    if timeout(
        Duration::from_secs(settings.startup_timeout_secs),
        store.settle(),
    )
    .await
    .is_err()
    {
        anyhow::bail!(
            "startup did not settle within {}s",
            settings.startup_timeout_secs
        );
    }

    let state = store.snapshot().await;
    if let Some(app_state) = state.slice::<AppState>(names::APP) {
        info!(step = ?app_state.startup_step, "startup settled");
    }
    println!("{}", serde_json::to_string_pretty(&state)?);
    for url in history.hard_redirects() {
        println!("hard redirect -> {url}");
    }
    Ok(())
}
