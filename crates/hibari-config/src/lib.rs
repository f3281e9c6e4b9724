pub mod api;
pub mod feed;
pub mod messaging;
pub mod preferences;
pub mod toast;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Configuration {
    pub api: api::Configuration,
    pub feed: feed::Configuration,
    pub messaging: messaging::Configuration,
    pub preferences: preferences::Configuration,
    pub toast: toast::Configuration,
}

impl Configuration {
    pub async fn load<P>(path: P) -> eyre::Result<Self>
    where
        P: AsRef<Path>,
    {
        let content = fs::read_to_string(path).await?;
        toml::from_str(&content).map_err(eyre::Report::from)
    }
}
