use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "palliative-triage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming an explicit triage policy file.
pub const POLICY_ENV: &str = "TRIAGE_POLICY";

/// File name of the policy inside the config directory.
pub const POLICY_FILE: &str = "policy.json";

/// Per-user configuration directory, e.g. ~/.config/palliative-triage/
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Where the triage policy is read from: `$TRIAGE_POLICY` when set,
/// otherwise `policy.json` in the config directory.
pub fn policy_path() -> Option<PathBuf> {
    match std::env::var_os(POLICY_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => config_dir().map(|dir| dir.join(POLICY_FILE)),
    }
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "palliative_triage=info,triage=info"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_ends_with_app_name() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().contains("palliative_triage"));
    }
}
