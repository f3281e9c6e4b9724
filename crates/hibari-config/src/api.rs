use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

fn default_timeout_secs() -> u64 {
    3
}

fn default_max_retries() -> u32 {
    1
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfiguration {
    pub base_url: SmolStr,

    /// Per-request timeout for confirmation calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum Configuration {
    Http(HttpConfiguration),
    #[default]
    InProcess,
}
