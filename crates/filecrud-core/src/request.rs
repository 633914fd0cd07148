//! Typed operation requests.
//!
//! A caller supplies an operation name plus a loose JSON argument map. Both
//! are checked here, once, and turned into a [`Request`] variant that carries
//! exactly the fields its action needs. Nothing in this module touches the
//! filesystem.

use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{FsError, Result};

/// The fixed, case-sensitive set of operation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    ReadFile,
    WriteFile,
    AppendFile,
    UpdateFile,
    DeleteFile,
    ListFiles,
    CreateDirectory,
}

impl Operation {
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| FsError::InvalidArgument(format!("Unknown operation: {}", name)))
    }
}

/// One validated request per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ReadFile {
        path: String,
    },
    WriteFile {
        path: String,
        content: String,
    },
    AppendFile {
        path: String,
        content: String,
    },
    UpdateFile {
        path: String,
        find_pattern: String,
        replace_text: String,
        use_regex: bool,
    },
    DeleteFile {
        path: String,
    },
    ListFiles {
        path: String,
    },
    CreateDirectory {
        path: String,
    },
}

// Legacy argument names accepted after the canonical one.
const PATH_KEYS: &[&str] = &["path", "filepath", "dirpath"];
const CONTENT_KEYS: &[&str] = &["content"];
const FIND_KEYS: &[&str] = &["find_pattern", "find"];
const REPLACE_KEYS: &[&str] = &["replace_text", "replace"];
const USE_REGEX_KEYS: &[&str] = &["use_regex"];

impl Request {
    /// Validate `arguments` against the schema of the named operation.
    ///
    /// `arguments` may be `null` (treated as an empty map) or an object; any
    /// other JSON type is rejected.
    pub fn from_call(name: &str, arguments: &Value) -> Result<Self> {
        let op = Operation::parse(name)?;
        let empty = Map::new();
        let args = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(FsError::InvalidArgument(format!(
                    "Arguments for '{}' must be an object, got {}",
                    op,
                    json_type(other)
                )));
            }
        };

        let request = match op {
            Operation::ReadFile => Request::ReadFile {
                path: require_path(args)?,
            },
            Operation::WriteFile => Request::WriteFile {
                path: require_path(args)?,
                content: require_str(args, CONTENT_KEYS)?,
            },
            Operation::AppendFile => Request::AppendFile {
                path: require_path(args)?,
                content: require_str(args, CONTENT_KEYS)?,
            },
            Operation::UpdateFile => {
                let path = require_path(args)?;
                let find_pattern = require_str(args, FIND_KEYS)?;
                if find_pattern.is_empty() {
                    return Err(FsError::InvalidArgument(
                        "'find_pattern' must not be empty".to_string(),
                    ));
                }
                Request::UpdateFile {
                    path,
                    find_pattern,
                    replace_text: require_str(args, REPLACE_KEYS)?,
                    use_regex: optional_bool(args, USE_REGEX_KEYS)?.unwrap_or(false),
                }
            }
            Operation::DeleteFile => Request::DeleteFile {
                path: require_path(args)?,
            },
            Operation::ListFiles => Request::ListFiles {
                path: require_path(args)?,
            },
            Operation::CreateDirectory => Request::CreateDirectory {
                path: require_path(args)?,
            },
        };
        Ok(request)
    }

    pub fn operation(&self) -> Operation {
        match self {
            Request::ReadFile { .. } => Operation::ReadFile,
            Request::WriteFile { .. } => Operation::WriteFile,
            Request::AppendFile { .. } => Operation::AppendFile,
            Request::UpdateFile { .. } => Operation::UpdateFile,
            Request::DeleteFile { .. } => Operation::DeleteFile,
            Request::ListFiles { .. } => Operation::ListFiles,
            Request::CreateDirectory { .. } => Operation::CreateDirectory,
        }
    }

    /// The raw target path as the caller supplied it.
    pub fn path(&self) -> &str {
        match self {
            Request::ReadFile { path }
            | Request::WriteFile { path, .. }
            | Request::AppendFile { path, .. }
            | Request::UpdateFile { path, .. }
            | Request::DeleteFile { path }
            | Request::ListFiles { path }
            | Request::CreateDirectory { path } => path,
        }
    }
}

// === Parameter Helpers ===

/// First present, non-null value among `keys`, with the key it was found under.
fn lookup<'a>(args: &'a Map<String, Value>, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|k| args.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
}

fn require_str(args: &Map<String, Value>, keys: &[&'static str]) -> Result<String> {
    match lookup(args, keys) {
        Some((_, Value::String(s))) => Ok(s.clone()),
        Some((key, other)) => Err(FsError::InvalidArgument(format!(
            "'{}' must be a string, got {}",
            key,
            json_type(other)
        ))),
        None => Err(FsError::InvalidArgument(format!(
            "Missing '{}' parameter",
            keys[0]
        ))),
    }
}

fn require_path(args: &Map<String, Value>) -> Result<String> {
    let path = require_str(args, PATH_KEYS)?;
    if path.is_empty() {
        return Err(FsError::InvalidArgument("'path' must not be empty".to_string()));
    }
    if path.contains('\0') {
        return Err(FsError::InvalidArgument(
            "'path' cannot contain null bytes".to_string(),
        ));
    }
    Ok(path)
}

fn optional_bool(args: &Map<String, Value>, keys: &[&'static str]) -> Result<Option<bool>> {
    match lookup(args, keys) {
        Some((_, Value::Bool(b))) => Ok(Some(*b)),
        Some((key, other)) => Err(FsError::InvalidArgument(format!(
            "'{}' must be a boolean, got {}",
            key,
            json_type(other)
        ))),
        None => Ok(None),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
