use serde::{Deserialize, Serialize};

fn default_duration_ms() -> u64 {
    5000
}

fn default_entry_delay_ms() -> u64 {
    50
}

fn default_exit_animation_ms() -> u64 {
    200
}

fn default_max_visible() -> usize {
    5
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Configuration {
    /// How long a toast stays visible before auto-dismiss
    pub duration_ms: u64,

    /// Window between creation and the transition to fully visible
    pub entry_delay_ms: u64,

    /// Length of the dismiss animation before removal
    pub exit_animation_ms: u64,

    /// Visible cap; the oldest toast is dismissed once exceeded
    pub max_visible: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            entry_delay_ms: default_entry_delay_ms(),
            exit_animation_ms: default_exit_animation_ms(),
            max_visible: default_max_visible(),
        }
    }
}
