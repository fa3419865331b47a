//! Engine configuration loaded via OrthoConfig.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ContentServiceSettings;

/// Tunables for the content services and the binaries that host them.
///
/// Values come from `CONTENT_ENGINE_*` environment variables, configuration
/// files, or command-line flags, falling back to the defaults below.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CONTENT_ENGINE")]
pub struct EngineSettings {
    /// Attempts per write before a lost revision race becomes a conflict.
    #[ortho_config(default = 5)]
    pub max_write_attempts: u32,
    /// Page size used when a listing names no limit.
    #[ortho_config(default = 20)]
    pub default_list_limit: usize,
    /// Upper bound on any listing page size.
    #[ortho_config(default = 100)]
    pub max_list_limit: usize,
    /// Emit logs as JSON lines instead of human-readable text.
    ///
    /// Unset unless configured; read through [`EngineSettings::json_logs`].
    pub json_logs: Option<bool>,
}

impl EngineSettings {
    /// Whether JSON log output was requested; off unless set.
    pub fn json_logs(&self) -> bool {
        self.json_logs.unwrap_or(false)
    }
}

impl From<&EngineSettings> for ContentServiceSettings {
    fn from(settings: &EngineSettings) -> Self {
        let max_list_limit = settings.max_list_limit.max(1);
        Self {
            max_write_attempts: settings.max_write_attempts.max(1),
            default_list_limit: settings.default_list_limit.clamp(1, max_list_limit),
            max_list_limit,
        }
    }
}
