use serde::{Deserialize, Serialize};

/// Environment variable holding the regulation API base URL.
pub const REGULATIONS_ENDPOINT_ENV: &str = "SEGMENT_REGULATIONS_ENDPOINT";

/// Environment variable holding the delete-API source ID.
pub const DELETE_API_SOURCE_ID_ENV: &str = "SEGMENT_DELETE_API_SOURCE_ID";

/// Tracker configuration.
///
/// Both regulation fields are optional. When either is missing, the
/// data-deletion workflow short-circuits to an error result without
/// attempting a network call.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Base URL of the vendor regulation (deletion and suppression) API.
    #[serde(default)]
    pub regulations_endpoint: Option<String>,

    /// Source ID that deletion requests are scoped to.
    #[serde(default)]
    pub delete_api_source_id: Option<String>,
}

impl Config {
    /// Read the configuration from the process environment.
    ///
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        Self {
            regulations_endpoint: env_var(REGULATIONS_ENDPOINT_ENV),
            delete_api_source_id: env_var(DELETE_API_SOURCE_ID_ENV),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
