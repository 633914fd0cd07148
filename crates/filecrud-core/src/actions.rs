//! The seven filesystem actions.
//!
//! Each action receives an already-resolved path, performs one short
//! sequence of `tokio::fs` calls, and returns a typed payload. Text is always
//! UTF-8; sizes are counted in characters.

use std::path::Path;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{FsError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadOutput {
    pub path: String,
    pub content: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutput {
    pub path: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendOutput {
    pub path: String,
    pub appended_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutput {
    pub path: String,
    pub replacements: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutput {
    pub path: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDirOutput {
    pub path: String,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    /// A symlink whose target could not be resolved.
    Symlink,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListOutput {
    pub path: String,
    pub items: Vec<DirEntry>,
    pub count: usize,
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Read the whole file as UTF-8 text.
async fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| FsError::from_io(e, "read", path))?;
    String::from_utf8(bytes).map_err(|e| {
        FsError::DecodeError(format!(
            "File '{}' is not valid UTF-8: {}",
            path.display(),
            e.utf8_error()
        ))
    })
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| FsError::from_io(e, "create parent directories for", path))?;
    }
    Ok(())
}

pub async fn read_file(path: &Path) -> Result<ReadOutput> {
    let content = read_text(path).await?;
    Ok(ReadOutput {
        path: display(path),
        size: content.chars().count(),
        content,
    })
}

/// Overwrite `path` with `content`, creating missing parent directories.
pub async fn write_file(path: &Path, content: &str) -> Result<WriteOutput> {
    ensure_parent(path).await?;
    fs::write(path, content.as_bytes())
        .await
        .map_err(|e| FsError::from_io(e, "write", path))?;
    Ok(WriteOutput {
        path: display(path),
        size: content.chars().count(),
    })
}

/// Append `content`, creating the file (and its parents) when absent.
pub async fn append_file(path: &Path, content: &str) -> Result<AppendOutput> {
    ensure_parent(path).await?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| FsError::from_io(e, "open", path))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| FsError::from_io(e, "append to", path))?;
    file.flush()
        .await
        .map_err(|e| FsError::from_io(e, "append to", path))?;
    Ok(AppendOutput {
        path: display(path),
        appended_size: content.chars().count(),
    })
}

/// Replace every non-overlapping match of `find_pattern` across the whole file.
///
/// In regex mode `replace_text` may use `$1` / `${name}` back-references. The
/// file is only rewritten when at least one match was replaced.
pub async fn update_file(
    path: &Path,
    find_pattern: &str,
    replace_text: &str,
    use_regex: bool,
) -> Result<UpdateOutput> {
    // Compile before any I/O so a bad pattern never touches the file.
    let regex = if use_regex {
        Some(Regex::new(find_pattern).map_err(|e| {
            FsError::PatternError(format!(
                "Invalid regex pattern '{}': {}",
                find_pattern, e
            ))
        })?)
    } else {
        None
    };

    let content = read_text(path).await?;
    let (replacements, updated) = match &regex {
        Some(re) => {
            let count = re.find_iter(&content).count();
            (count, re.replace_all(&content, replace_text).into_owned())
        }
        None => (
            content.matches(find_pattern).count(),
            content.replace(find_pattern, replace_text),
        ),
    };

    if replacements > 0 {
        fs::write(path, updated.as_bytes())
            .await
            .map_err(|e| FsError::from_io(e, "write", path))?;
    }
    Ok(UpdateOutput {
        path: display(path),
        replacements,
    })
}

/// Remove a file or symlink. Directories are refused.
pub async fn delete_file(path: &Path) -> Result<DeleteOutput> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| FsError::from_io(e, "delete", path))?;
    if meta.is_dir() {
        return Err(FsError::Io(format!(
            "Failed to delete '{}': is a directory",
            path.display()
        )));
    }
    fs::remove_file(path)
        .await
        .map_err(|e| FsError::from_io(e, "delete", path))?;
    Ok(DeleteOutput {
        path: display(path),
        deleted: true,
    })
}

/// List the immediate children of a directory, in host enumeration order.
///
/// Symlinks report the kind of their target; a link that cannot be resolved
/// is reported as [`EntryKind::Symlink`]. Entries that vanish or cannot be
/// inspected mid-listing are skipped.
pub async fn list_files(path: &Path) -> Result<ListOutput> {
    let meta = fs::metadata(path)
        .await
        .map_err(|e| FsError::from_io(e, "list", path))?;
    if !meta.is_dir() {
        return Err(FsError::NotADirectory(format!(
            "Not a directory: '{}'",
            path.display()
        )));
    }

    let mut items = Vec::new();
    let mut read_dir = fs::read_dir(path)
        .await
        .map_err(|e| FsError::from_io(e, "list", path))?;
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| FsError::from_io(e, "list", path))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let entry_path = entry.path();
        let (kind, meta) = match fs::metadata(&entry_path).await {
            Ok(m) if m.is_dir() => (EntryKind::Directory, m),
            Ok(m) => (EntryKind::File, m),
            Err(_) => match fs::symlink_metadata(&entry_path).await {
                Ok(m) if m.file_type().is_symlink() => (EntryKind::Symlink, m),
                _ => {
                    log::debug!("skipping unreadable entry '{}'", entry_path.display());
                    continue;
                }
            },
        };
        items.push(DirEntry {
            name,
            kind,
            size: (kind == EntryKind::File).then(|| meta.len()),
            modified: meta
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
        });
    }

    Ok(ListOutput {
        path: display(path),
        count: items.len(),
        items,
    })
}

/// `mkdir -p`: create the directory and any missing ancestors.
pub async fn create_directory(path: &Path) -> Result<CreateDirOutput> {
    if let Ok(meta) = fs::metadata(path).await
        && !meta.is_dir()
    {
        return Err(FsError::AlreadyExistsAsFile(format!(
            "Path exists and is not a directory: '{}'",
            path.display()
        )));
    }
    fs::create_dir_all(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            FsError::AlreadyExistsAsFile(format!(
                "Failed to create directory '{}': {}",
                path.display(),
                e
            ))
        } else {
            FsError::from_io(e, "create directory", path)
        }
    })?;
    Ok(CreateDirOutput {
        path: display(path),
        created: true,
    })
}
