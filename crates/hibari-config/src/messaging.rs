use serde::{Deserialize, Serialize};

fn default_channel_capacity() -> usize {
    512
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InProcessConfiguration {
    /// Per-channel buffer size; a consumer that falls further behind lags
    /// and loses the oldest events
    pub channel_capacity: usize,
}

impl Default for InProcessConfiguration {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum Configuration {
    InProcess(InProcessConfiguration),
}

impl Default for Configuration {
    fn default() -> Self {
        Self::InProcess(InProcessConfiguration::default())
    }
}
