use serde::Deserialize;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "wizard-form-data";

/// Wizard behaviour switches.
///
/// Deserializable so a host application can keep it next to its own settings;
/// missing fields take their defaults.
///
/// # Examples
///
/// ```
/// use stepwise::WizardConfig;
///
/// let config: WizardConfig =
///     serde_json::from_str(r#"{ "allow_step_skipping": true }"#).unwrap();
/// assert!(config.allow_step_skipping);
/// assert!(config.persist_state);
/// assert_eq!(config.storage_key, stepwise::DEFAULT_STORAGE_KEY);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Allow jumping ahead to steps that were never reached. Default: false.
    pub allow_step_skipping: bool,
    /// Save and restore form data through the persistence adapter. Default: true.
    pub persist_state: bool,
    /// Key under which form data is stored.
    pub storage_key: String,
    /// Remove the stored form data once the wizard completes. Default: true.
    pub clear_storage_on_complete: bool,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            allow_step_skipping: false,
            persist_state: true,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            clear_storage_on_complete: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WizardConfig::default();
        assert!(!config.allow_step_skipping);
        assert!(config.persist_state);
        assert!(config.clear_storage_on_complete);
        assert_eq!(config.storage_key, "wizard-form-data");
    }

    #[test]
    fn test_partial_deserialize() {
        let config: WizardConfig =
            serde_json::from_str(r#"{"persist_state": false, "storage_key": "seller-setup"}"#)
                .expect("valid config");
        assert!(!config.persist_state);
        assert_eq!(config.storage_key, "seller-setup");
        assert!(!config.allow_step_skipping);
    }
}
