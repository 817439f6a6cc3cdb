use serde::{Deserialize, Serialize};

/// Global hotkey binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Key combination that saves the replay, e.g. `ctrl+alt+s`.
    #[serde(default)]
    pub save: Option<String>,
}
