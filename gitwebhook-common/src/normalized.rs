use serde::{Deserialize, Serialize};

/// The provider-independent record sent to event listeners.
#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub repo_url: String,
    pub repo_name: String,
    pub repo_hash: String,
    pub actor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_email: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_repo: Option<String>,
}

impl NormalizedEvent {
    /// Body of the request sent to event listeners.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}
