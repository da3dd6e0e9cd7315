use std::{collections::HashMap, env, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub client_public_path: String,
    pub startup_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8443/api".into(),
            client_public_path: "/public/".into(),
            startup_timeout_secs: 10,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("gallery.toml") {
        apply_file_config(&mut settings, &raw);
    }

    if let Ok(v) = env::var("GALLERY__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = env::var("GALLERY__CLIENT_PUBLIC_PATH") {
        settings.client_public_path = v;
    }
    if let Ok(v) = env::var("GALLERY__STARTUP_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.startup_timeout_secs = parsed;
        }
    }

    settings.client_public_path = normalize_public_path(&settings.client_public_path);
    settings
}

fn apply_file_config(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("api_base_url") {
            settings.api_base_url = v.clone();
        }
        if let Some(v) = file_cfg.get("client_public_path") {
            settings.client_public_path = v.clone();
        }
        if let Some(v) = file_cfg.get("startup_timeout_secs") {
            if let Ok(parsed) = v.parse::<u64>() {
                settings.startup_timeout_secs = parsed;
            }
        }
    }
}

/// The public path prefixes redirect targets (`<path>404.html`), so it must
/// carry both slashes.
fn normalize_public_path(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().client_public_path;
    }
    let mut path = String::new();
    if !raw.starts_with('/') {
        path.push('/');
    }
    path.push_str(raw);
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}
