use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Native hosts configure the backend through this variable.
pub const API_BASE_URL_ENV: &str = "LEDGER_API_BASE_URL";

/// Access tokens this close to `exp` are refreshed before use.
pub const REFRESH_THRESHOLD_SECS: i64 = 300;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub api_base_url: Option<String>,
}

static API_BASE_URL: OnceLock<String> = OnceLock::new();

fn cache_base_url(value: &str) -> String {
    let value = normalize_base_url(value);
    let _ = API_BASE_URL.set(value.clone());
    API_BASE_URL.get().cloned().unwrap_or(value)
}

/// Strips trailing slashes so endpoint paths can always start with `/`.
pub fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

#[cfg(target_arch = "wasm32")]
mod source {
    use super::RuntimeConfig;

    fn global_value(object: &str, keys: [&str; 2]) -> Option<String> {
        let window = web_sys::window()?;
        let any = js_sys::Reflect::get(&window, &object.into()).ok()?;
        if any.is_undefined() || any.is_null() {
            return None;
        }
        let obj = js_sys::Object::from(any);
        keys.iter()
            .filter_map(|key| js_sys::Reflect::get(&obj, &(*key).into()).ok())
            .find(|v| !v.is_undefined() && !v.is_null())
            .and_then(|v| v.as_string())
    }

    // window.__LEDGER_ENV (env.js) wins over window.__LEDGER_CONFIG.
    pub fn snapshot() -> Option<String> {
        global_value("__LEDGER_ENV", ["API_BASE_URL", "api_base_url"])
            .or_else(|| global_value("__LEDGER_CONFIG", ["api_base_url", "API_BASE_URL"]))
    }

    pub async fn fetch() -> Option<RuntimeConfig> {
        // Relative to the page, like `./config.json`.
        let page = web_sys::window()?.location().href().ok()?;
        let url = reqwest::Url::parse(&page).ok()?.join("config.json").ok()?;
        let resp = reqwest::get(url).await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json::<RuntimeConfig>().await.ok()
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod source {
    use super::{RuntimeConfig, API_BASE_URL_ENV};

    pub fn snapshot() -> Option<String> {
        std::env::var(API_BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    pub async fn fetch() -> Option<RuntimeConfig> {
        None
    }
}

/// Resolves the backend base URL once and caches it for the process.
pub async fn await_api_base_url() -> String {
    if let Some(cached) = API_BASE_URL.get() {
        return cached.clone();
    }
    if let Some(existing) = source::snapshot() {
        log::debug!("API base URL taken from host configuration");
        return cache_base_url(&existing);
    }
    if let Some(url) = source::fetch().await.and_then(|cfg| cfg.api_base_url) {
        log::debug!("API base URL loaded from config.json");
        return cache_base_url(&url);
    }
    cache_base_url(DEFAULT_API_BASE_URL)
}

pub async fn init() {
    let base = await_api_base_url().await;
    log::info!("Runtime config initialized (api base: {})", base);
}
