use serde::{Deserialize, Serialize};

fn default_max_notifications() -> usize {
    100
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Upper bound of the merged feed; the oldest entries are evicted first
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_notifications: default_max_notifications(),
        }
    }
}
