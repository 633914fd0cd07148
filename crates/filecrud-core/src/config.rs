use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::context::{PathPolicy, ServerContext};

/// Config file name looked up in the server home directory.
pub const CONFIG_FILE_NAME: &str = "filecrud.toml";

/// Top-level server config from filecrud.toml
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Directory relative paths resolve against (default: working directory).
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub path_policy: PathPolicy,
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: None,
            path_policy: PathPolicy::default(),
            listen: default_listen(),
        }
    }
}

impl ServerConfig {
    /// Load config from `path`, falling back to defaults when the file is
    /// missing or unparseable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                log::warn!("config parse error in {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Build the immutable server context. A relative `root` is taken
    /// relative to `cwd`.
    pub fn to_context(&self, cwd: &Path) -> io::Result<ServerContext> {
        let root = match &self.root {
            Some(r) if r.is_absolute() => r.clone(),
            Some(r) => cwd.join(r),
            None => cwd.to_path_buf(),
        };
        ServerContext::new(root, self.path_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_full_config() {
        let toml = r#"
root = "/srv/data"
path_policy = "unrestricted"
listen = "0.0.0.0:9000"
"#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.root, Some(PathBuf::from("/srv/data")));
        assert_eq!(cfg.path_policy, PathPolicy::Unrestricted);
        assert_eq!(cfg.listen, "0.0.0.0:9000");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert!(cfg.root.is_none());
        assert_eq!(cfg.path_policy, PathPolicy::Confined);
        assert_eq!(cfg.listen, "127.0.0.1:8000");
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let result: Result<ServerConfig, _> = toml::from_str(r#"path_policy = "yolo""#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_returns_defaults() {
        let cfg = ServerConfig::load(Path::new("/nonexistent/path/filecrud.toml"));
        assert_eq!(cfg.path_policy, PathPolicy::Confined);
        assert_eq!(cfg.listen, "127.0.0.1:8000");
    }

    #[test]
    fn malformed_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "path_policy = [").unwrap();
        let cfg = ServerConfig::load(&path);
        assert_eq!(cfg.path_policy, PathPolicy::Confined);
    }

    #[test]
    fn relative_root_joins_cwd() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("data")).unwrap();
        let cfg = ServerConfig {
            root: Some(PathBuf::from("data")),
            ..ServerConfig::default()
        };
        let ctx = cfg.to_context(tmp.path()).unwrap();
        assert_eq!(
            ctx.root(),
            tmp.path().join("data").canonicalize().unwrap()
        );
        assert_eq!(ctx.policy(), PathPolicy::Confined);
    }
}
