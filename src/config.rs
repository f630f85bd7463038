//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pm/pm.toml`
//! 3. Environment variables: `PM_*` prefix
//!
//! With nothing configured the dispatcher derives its prefix from its own program
//! name, searches its install directory and then `PATH`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment, Map};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer};

use crate::application::ApplicationError;

/// How a located subcommand is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationMode {
    /// Replace the dispatcher process (Unix only)
    Exec,
    /// Spawn a child and wait for it
    Spawn,
}

impl Default for DelegationMode {
    fn default() -> Self {
        if cfg!(unix) {
            DelegationMode::Exec
        } else {
            DelegationMode::Spawn
        }
    }
}

impl FromStr for DelegationMode {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exec" => Ok(DelegationMode::Exec),
            "spawn" => Ok(DelegationMode::Spawn),
            other => Err(ApplicationError::Config {
                message: format!("invalid mode '{other}', expected 'exec' or 'spawn'"),
            }),
        }
    }
}

// same spelling rules for the config file and PM_MODE
impl<'de> Deserialize<'de> for DelegationMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DelegationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelegationMode::Exec => write!(f, "exec"),
            DelegationMode::Spawn => write!(f, "spawn"),
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, keep lower layer).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub prefix: Option<String>,
    pub search_paths: Option<Vec<PathBuf>>,
    pub mode: Option<DelegationMode>,
}

/// Effective dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Executable name prefix; `None` means "use the program's own name"
    pub prefix: Option<String>,
    /// Extra directories searched after the install dir and before `PATH`
    pub search_paths: Vec<PathBuf>,
    /// Exec-replace or spawn-and-wait
    pub mode: DelegationMode,
}

/// Get the XDG config directory for pm.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pm").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pm.toml"))
}

/// Load a TOML file into RawSettings.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings from defaults, the global config file and `PM_*` variables.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `config_file` in place of the global config path.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(config_file, None)
    }

    /// Like [`load_from`](Self::load_from), but `PM_*` overrides come from `env`
    /// instead of the process environment.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Map<String, String>,
    ) -> Result<Self, ApplicationError> {
        Self::load_layers(config_file, Some(env))
    }

    fn load_layers(
        config_file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env)?;
        current.expand_paths();

        Ok(current)
    }

    /// Scalars and lists from `overlay` replace the base when specified.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            prefix: overlay.prefix.clone().or_else(|| self.prefix.clone()),
            search_paths: overlay
                .search_paths
                .clone()
                .unwrap_or_else(|| self.search_paths.clone()),
            mode: overlay.mode.unwrap_or(self.mode),
        }
    }

    /// Prefix to use for a dispatcher invoked as `program`.
    pub fn effective_prefix<'a>(&'a self, program: &'a str) -> &'a str {
        self.prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(program)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in search paths.
    fn expand_paths(&mut self) {
        for path in &mut self.search_paths {
            let raw = path.to_string_lossy().into_owned();
            // unresolvable variables leave the path as written
            if let Ok(expanded) = shellexpand::full(&raw) {
                *path = PathBuf::from(expanded.into_owned());
            }
        }
    }

    /// Apply PM_* environment variables as explicit overrides.
    ///
    /// `source` replaces the process environment when given.
    fn apply_env_overrides(
        mut settings: Self,
        source: Option<Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PM")
                    .source(source)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("search_paths"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("prefix") {
            settings.prefix = Some(val);
        }
        if let Ok(val) = config.get::<Vec<String>>("search_paths") {
            settings.search_paths = val
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Ok(val) = config.get_string("mode") {
            settings.mode = val.parse()?;
        }

        Ok(settings)
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn given_default_settings_when_created_then_has_no_prefix_or_extra_paths() {
        let settings = Settings::default();
        assert_eq!(settings.prefix, None);
        assert!(settings.search_paths.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn given_unix_when_default_mode_then_exec() {
        assert_eq!(DelegationMode::default(), DelegationMode::Exec);
    }

    #[test]
    fn given_mode_strings_when_parsing_then_accepts_case_insensitively() {
        assert_eq!("exec".parse::<DelegationMode>().unwrap(), DelegationMode::Exec);
        assert_eq!("SPAWN".parse::<DelegationMode>().unwrap(), DelegationMode::Spawn);
        assert!("fork".parse::<DelegationMode>().is_err());
    }

    #[rstest]
    #[case("mode = \"spawn\"", DelegationMode::Spawn)]
    #[case("mode = \"Spawn\"", DelegationMode::Spawn)]
    #[case("mode = \"EXEC\"", DelegationMode::Exec)]
    fn given_mode_in_toml_when_parsing_then_matches_env_var_spelling(
        #[case] content: &str,
        #[case] expected: DelegationMode,
    ) {
        let raw: RawSettings = toml::from_str(content).unwrap();
        assert_eq!(raw.mode, Some(expected));
    }

    fn env(vars: &[(&str, &str)]) -> Map<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn given_pm_vars_when_loading_then_override_defaults() {
        let settings = Settings::load_with_env(
            None,
            env(&[
                ("PM_PREFIX", "things"),
                ("PM_MODE", "Spawn"),
                ("PM_SEARCH_PATHS", "/opt/a,/opt/b"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.prefix.as_deref(), Some("things"));
        assert_eq!(settings.mode, DelegationMode::Spawn);
        assert_eq!(
            settings.search_paths,
            vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
    }

    #[test]
    fn given_empty_env_when_loading_then_defaults() {
        let settings = Settings::load_with_env(None, Map::new()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn given_invalid_mode_var_when_loading_then_config_error() {
        let err = Settings::load_with_env(None, env(&[("PM_MODE", "fork")])).unwrap_err();
        assert!(err.to_string().contains("invalid mode 'fork'"));
    }

    #[test]
    fn given_overlay_when_merging_then_specified_fields_replace_base() {
        let base = Settings {
            prefix: Some("pm".into()),
            search_paths: vec![PathBuf::from("/a")],
            mode: DelegationMode::Exec,
        };
        let overlay = RawSettings {
            prefix: None,
            search_paths: Some(vec![PathBuf::from("/b")]),
            mode: Some(DelegationMode::Spawn),
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.prefix, Some("pm".into()));
        assert_eq!(result.search_paths, vec![PathBuf::from("/b")]);
        assert_eq!(result.mode, DelegationMode::Spawn);
    }

    #[test]
    fn given_prefix_setting_when_effective_prefix_then_overrides_program_name() {
        let mut settings = Settings::default();
        assert_eq!(settings.effective_prefix("pm"), "pm");

        settings.prefix = Some("things".into());
        assert_eq!(settings.effective_prefix("pm"), "things");

        settings.prefix = Some(String::new());
        assert_eq!(settings.effective_prefix("pm"), "pm");
    }

    #[test]
    fn given_tilde_in_search_path_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            search_paths: vec![PathBuf::from("~/libexec/pm")],
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let expanded = settings.search_paths[0].to_string_lossy();
        assert!(
            expanded.starts_with(&home),
            "search path should start with home dir: {}",
            expanded
        );
    }
}
