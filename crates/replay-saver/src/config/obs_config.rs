use serde::{Deserialize, Serialize};

/// OBS connection settings.
///
/// Fields are optional on disk so a partially written file can be
/// completed by the first-run prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsConfig {
    /// Host name or IP of the machine running OBS.
    #[serde(default)]
    pub host: Option<String>,
    /// obs-websocket port.
    #[serde(default)]
    pub port: Option<u16>,
    /// obs-websocket password. Empty means no authentication.
    #[serde(default)]
    pub password: Option<String>,
}
