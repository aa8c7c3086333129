//! Configuration for Sprint View, read from `sprintview.toml`.
//!
//! Settings are layered: file, then environment, then CLI flags. Every
//! section is optional and falls back to defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [project]
//! name = "workspace"
//!
//! [data]
//! path = "./project_data"
//! backup_path = "/tmp/project_data.bak"
//!
//! [remote]
//! base_url = "https://gitlab.com/api/v4"
//! project_id = "2693506"
//! file_path = "i5k_workspace_json"
//! branch = "master"
//!
//! [tracker]
//! base_url = "https://gitlab.com/api/v4"
//! project_id = "1090162"
//! issue_url = "https://gitlab.com/i5k_Workspace/workspace_roadmap/issues"
//!
//! [view]
//! cache_ttl_secs = 900
//! default_sort = "dev_sort"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [log]
//! dir = "/tmp"
//! level = "info"
//!
//! [developers]
//! jdoe = "john"
//! ```
//!
//! # Environment
//!
//! | Variable                | Overrides                                  |
//! |-------------------------|--------------------------------------------|
//! | `SPRINTVIEW_PATH`       | `data.path`                                |
//! | `SPRINTVIEW_TOKEN`      | GitLab private token (never read from file)|
//! | `SPRINTVIEW_DEVELOPERS` | merged into `[developers]`, `id=name,...`  |
//! | `SPRINTVIEW_LOGDIR`     | `log.dir`                                  |
//! | `SPRINTVIEW_LOG_LEVEL`  | `log.level`                                |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::board::DeveloperDirectory;
use crate::view::{RenderOptions, SortColumn, ViewSettings};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "sprintview.toml";

/// Project bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Name written into a newly created project document.
    #[serde(default = "default_project_name")]
    pub name: String,
}

fn default_project_name() -> String {
    "workspace".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

/// Local project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    /// JSON document; used when readable, otherwise the remote store is.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Copy written after every save to the remote store.
    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./project_data")
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("/tmp/project_data.bak")
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            backup_path: default_backup_path(),
        }
    }
}

/// Project document stored as a file in a GitLab repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default = "default_gitlab_api")]
    pub base_url: String,
    #[serde(default = "default_remote_project")]
    pub project_id: String,
    #[serde(default = "default_remote_file")]
    pub file_path: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gitlab_api() -> String {
    "https://gitlab.com/api/v4".to_string()
}

fn default_remote_project() -> String {
    "2693506".to_string()
}

fn default_remote_file() -> String {
    "i5k_workspace_json".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: default_gitlab_api(),
            project_id: default_remote_project(),
            file_path: default_remote_file(),
            branch: default_branch(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// GitLab project whose issues become tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSection {
    #[serde(default = "default_gitlab_api")]
    pub base_url: String,
    #[serde(default = "default_tracker_project")]
    pub project_id: String,
    /// Web page base for issue links.
    #[serde(default = "default_issue_url")]
    pub issue_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tracker_project() -> String {
    "1090162".to_string()
}

fn default_issue_url() -> String {
    "https://gitlab.com/i5k_Workspace/workspace_roadmap/issues".to_string()
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            base_url: default_gitlab_api(),
            project_id: default_tracker_project(),
            issue_url: default_issue_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Board rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSection {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_description_max")]
    pub description_max: usize,
    #[serde(default = "default_developer_max")]
    pub developer_max: usize,
    /// One of `dev_sort`, `issue_sort`, `desc_sort`, `status_sort`.
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

fn default_cache_ttl_secs() -> u64 {
    900
}

fn default_description_max() -> usize {
    90
}

fn default_developer_max() -> usize {
    10
}

fn default_sort() -> String {
    "dev_sort".to_string()
}

impl Default for ViewSection {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            description_max: default_description_max(),
            developer_max: default_developer_max(),
            default_sort: default_sort(),
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Directory of the daily `sprintview.log` files.
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Filter directive for the `sprintview` target, e.g. `info` or `debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write the log file in addition to the console.
    #[serde(default = "default_log_file")]
    pub file: bool,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> bool {
    true
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// The complete sprintview.toml configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SprintviewToml {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub tracker: TrackerSection,
    #[serde(default)]
    pub view: ViewSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub log: LogSection,
    /// Login id to developer name.
    #[serde(default)]
    pub developers: BTreeMap<String, String>,
    /// GitLab private token, only ever taken from the environment.
    #[serde(skip)]
    pub token: Option<String>,
}

impl SprintviewToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse sprintview.toml")
    }

    /// Load `path`, or `./sprintview.toml` when no path is given. A missing
    /// default file yields the defaults; a missing explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize sprintview.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `SPRINTVIEW_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("SPRINTVIEW_PATH") {
            self.data.path = PathBuf::from(path);
        }
        if let Some(token) = get("SPRINTVIEW_TOKEN") {
            self.token = Some(token);
        }
        if let Some(pairs) = get("SPRINTVIEW_DEVELOPERS") {
            self.developers
                .extend(DeveloperDirectory::parse_pairs(&pairs));
        }
        if let Some(dir) = get("SPRINTVIEW_LOGDIR") {
            self.log.dir = PathBuf::from(dir);
        }
        if let Some(level) = get("SPRINTVIEW_LOG_LEVEL") {
            self.log.level = level;
        }
    }

    pub fn directory(&self) -> DeveloperDirectory {
        DeveloperDirectory::new(self.developers.clone())
    }

    /// Default sort column, falling back to the developer column when the
    /// configured name is unknown.
    pub fn default_sort_column(&self) -> SortColumn {
        self.view.default_sort.parse().unwrap_or_default()
    }

    pub fn view_settings(&self) -> ViewSettings {
        let issue_url = self.tracker.issue_url.trim();
        ViewSettings {
            ttl: Duration::from_secs(self.view.cache_ttl_secs),
            default_column: self.default_sort_column(),
            options: RenderOptions {
                description_max: self.view.description_max,
                developer_max: self.view.developer_max,
                issue_url_base: (!issue_url.is_empty()).then(|| issue_url.to_string()),
            },
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.project.name.trim().is_empty() {
            warnings.push("project.name is empty".to_string());
        }
        if let Err(e) = self.view.default_sort.parse::<SortColumn>() {
            warnings.push(format!("{}; using dev_sort", e));
        }
        if self.view.cache_ttl_secs == 0 {
            warnings.push("view.cache_ttl_secs is 0: every request re-renders the board".to_string());
        }
        if self.view.description_max == 0 || self.view.developer_max == 0 {
            warnings.push("view.description_max and view.developer_max must be positive".to_string());
        }
        if self.remote.timeout_secs == 0 || self.tracker.timeout_secs == 0 {
            warnings.push("timeout_secs of 0 disables GitLab request timeouts".to_string());
        }
        if self.token.is_none() {
            warnings.push(
                "SPRINTVIEW_TOKEN is not set: GitLab requests are unauthenticated".to_string(),
            );
        }
        if !self.data.path.exists() {
            warnings.push(format!(
                "data.path {} does not exist: the remote store will be used",
                self.data.path.display()
            ));
        }
        for (id, name) in &self.developers {
            if name.trim().is_empty() {
                warnings.push(format!("developer '{}' has an empty name", id));
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    // =========================================
    // Parsing tests
    // =========================================

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = SprintviewToml::parse("").unwrap();
        assert_eq!(toml.project.name, "workspace");
        assert_eq!(toml.data.path, PathBuf::from("./project_data"));
        assert_eq!(toml.data.backup_path, PathBuf::from("/tmp/project_data.bak"));
        assert_eq!(toml.view.cache_ttl_secs, 900);
        assert_eq!(toml.view.description_max, 90);
        assert_eq!(toml.view.developer_max, 10);
        assert_eq!(toml.remote.branch, "master");
        assert_eq!(toml.server.port, 8000);
        assert!(toml.token.is_none());
    }

    #[test]
    fn test_parse_sections() {
        let content = r#"
[project]
name = "roadmap"

[view]
cache_ttl_secs = 60
default_sort = "status_sort"

[developers]
jdoe = "john"
"#;
        let toml = SprintviewToml::parse(content).unwrap();
        assert_eq!(toml.project.name, "roadmap");
        assert_eq!(toml.view.cache_ttl_secs, 60);
        assert_eq!(toml.default_sort_column(), SortColumn::Status);
        assert_eq!(toml.directory().resolve_id("John"), "jdoe");
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(SprintviewToml::parse("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn test_token_never_serialized() {
        let mut toml = SprintviewToml::default();
        toml.token = Some("secret".into());
        let text = toml::to_string_pretty(&toml).unwrap();
        assert!(!text.contains("secret"));
    }

    // =========================================
    // Environment tests
    // =========================================

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            ("SPRINTVIEW_PATH", "/data/board.json"),
            ("SPRINTVIEW_TOKEN", "tok"),
            ("SPRINTVIEW_DEVELOPERS", "jdoe=john,asmith=anna"),
            ("SPRINTVIEW_LOGDIR", "/var/log/sv"),
            ("SPRINTVIEW_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut toml = SprintviewToml::parse("[developers]\nbob = \"robert\"").unwrap();
        toml.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(toml.data.path, PathBuf::from("/data/board.json"));
        assert_eq!(toml.token.as_deref(), Some("tok"));
        assert_eq!(toml.developers.len(), 3);
        assert_eq!(toml.log.dir, PathBuf::from("/var/log/sv"));
        assert_eq!(toml.log.level, "debug");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut toml = SprintviewToml::default();
        toml.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(toml.data.path, PathBuf::from("./project_data"));
        assert!(toml.token.is_none());
    }

    // =========================================
    // Validation tests
    // =========================================

    #[test]
    fn test_validate_flags_bad_values() {
        let content = r#"
[view]
cache_ttl_secs = 0
default_sort = "size_sort"
"#;
        let toml = SprintviewToml::parse(content).unwrap();
        let warnings = toml.validate();
        assert!(warnings.iter().any(|w| w.contains("size_sort")));
        assert!(warnings.iter().any(|w| w.contains("cache_ttl_secs")));
        assert!(warnings.iter().any(|w| w.contains("SPRINTVIEW_TOKEN")));
        assert_eq!(toml.default_sort_column(), SortColumn::Developer);
    }

    #[test]
    fn test_view_settings() {
        let toml = SprintviewToml::default();
        let settings = toml.view_settings();
        assert_eq!(settings.ttl, Duration::from_secs(900));
        assert_eq!(
            settings.options.issue_url(7).as_deref(),
            Some("https://gitlab.com/i5k_Workspace/workspace_roadmap/issues/7")
        );
    }

    // =========================================
    // File I/O tests
    // =========================================

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut toml = SprintviewToml::default();
        toml.project.name = "roadmap".to_string();
        toml.developers.insert("jdoe".into(), "john".into());
        toml.save(&path).unwrap();

        let loaded = SprintviewToml::load(&path).unwrap();
        assert_eq!(loaded.project.name, "roadmap");
        assert_eq!(loaded.developers.get("jdoe").map(String::as_str), Some("john"));
    }

    #[test]
    fn test_load_or_default_explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(SprintviewToml::load_or_default(Some(&missing)).is_err());
    }
}
