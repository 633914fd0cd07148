//! Explicit, immutable server context.
//!
//! Holds the directory relative paths resolve against and the policy that
//! decides whether a resolved path may leave it. One context is built at
//! startup and shared by every request.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use strum::Display;
use tokio::fs;

use crate::error::{FsError, Result};

/// Whether resolved paths must stay under the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PathPolicy {
    /// Every path must resolve (through symlinks) to somewhere under the root.
    #[default]
    Confined,
    /// Any path the host process can reach is addressable.
    Unrestricted,
}

#[derive(Debug, Clone)]
pub struct ServerContext {
    /// Canonical form of the configured root.
    root: PathBuf,
    policy: PathPolicy,
}

impl ServerContext {
    /// Build a context rooted at `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>, policy: PathPolicy) -> io::Result<Self> {
        let root = root.into();
        let canonical = root.canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Could not resolve root '{}': {}", root.display(), e),
            )
        })?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("Root '{}' is not a directory", root.display()),
            ));
        }
        Ok(Self {
            root: canonical,
            policy,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> PathPolicy {
        self.policy
    }

    /// Resolve a caller-supplied path to the absolute path an action will use.
    ///
    /// Relative paths are joined onto the root and `.`/`..` are folded
    /// lexically. Under [`PathPolicy::Confined`] the path is followed through
    /// every symlink, dangling ones included, and must land under the root.
    pub async fn resolve(&self, raw: &str) -> Result<PathBuf> {
        self.resolve_with(raw, true).await
    }

    /// Like [`resolve`](Self::resolve), but a symlink in the final component
    /// is not followed: only its parent has to lie under the root. Used for
    /// operations that act on the link itself.
    pub async fn resolve_entry(&self, raw: &str) -> Result<PathBuf> {
        self.resolve_with(raw, false).await
    }

    async fn resolve_with(&self, raw: &str, follow_final: bool) -> Result<PathBuf> {
        let joined = {
            let p = Path::new(raw);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                self.root.join(p)
            }
        };
        let normalized = normalize(&joined);

        if self.policy == PathPolicy::Confined {
            let real = match (follow_final, normalized.parent(), normalized.file_name()) {
                (false, Some(parent), Some(name)) => {
                    real_path(parent).await.map(|p| p.join(name))
                }
                _ => real_path(&normalized).await,
            };
            if !real.is_some_and(|r| r.starts_with(&self.root)) {
                return Err(FsError::PermissionDenied(format!(
                    "Path '{}' is outside the server root '{}'",
                    raw,
                    self.root.display()
                )));
            }
        }
        Ok(normalized)
    }
}

/// Fold `.` and `..` without consulting the filesystem. `..` at the root stays
/// at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

const MAX_SYMLINK_HOPS: usize = 40;

/// Where `path` really points once every existing symlink is followed.
///
/// The longest existing prefix is canonicalised and the missing rest is
/// re-appended. A dangling symlink on the way is read and its target followed
/// in turn, so the result names the location a create-through-the-link would
/// touch. `None` when the chain cannot be followed (loops, unreadable links).
async fn real_path(path: &Path) -> Option<PathBuf> {
    let mut current = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();
    let mut hops = 0;
    loop {
        if let Ok(mut real) = fs::canonicalize(&current).await {
            for name in tail.iter().rev() {
                real.push(name);
            }
            return Some(real);
        }

        if let Ok(meta) = fs::symlink_metadata(&current).await
            && meta.file_type().is_symlink()
        {
            hops += 1;
            if hops > MAX_SYMLINK_HOPS {
                return None;
            }
            let target = fs::read_link(&current).await.ok()?;
            let base = fs::canonicalize(current.parent()?).await.ok()?;
            current = base.join(target);
            continue;
        }

        let name = current.file_name()?.to_os_string();
        let parent = current.parent()?.to_path_buf();
        tail.push(name);
        current = parent;
    }
}
