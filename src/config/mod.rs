use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_DATABASE: &str = "(default)";

/// Document store connection settings.
///
/// Deployments inject these through `window.ENV` in `index.html`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database_id: String,
    pub api_url: String,
    pub api_key: Option<String>,
}

impl FirestoreConfig {
    /// Build from a key lookup. Each setting is looked up under its
    /// `UPPER_CASE` name first, then the `lower_case` spelling.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .or_else(|| lookup(&key.to_lowercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            project_id: get("FIREBASE_PROJECT_ID").unwrap_or_default(),
            database_id: get("FIRESTORE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            api_url: get("FIRESTORE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: get("FIREBASE_API_KEY"),
        }
    }

    /// Read `window.ENV`; missing keys fall back to defaults.
    pub fn from_window_env() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        Self::from_lookup(|key| {
            let env = env.as_ref()?;
            js_sys::Reflect::get(env, &key.into()).ok()?.as_string()
        })
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
