//! Declarative tool registry: one description per operation, rendered in the
//! MCP `tools/list` format.

use crate::request::Operation;

/// Property definition for a tool parameter
pub struct ToolPropertyDef {
    pub name: &'static str,
    pub prop_type: &'static str,
    pub description: &'static str,
}

/// Tool definition for the declarative registry
pub struct ToolDef {
    pub operation: Operation,
    pub description: &'static str,
    pub properties: &'static [ToolPropertyDef],
    pub required: &'static [&'static str],
}

const PATH_PROP: ToolPropertyDef = ToolPropertyDef {
    name: "path",
    prop_type: "string",
    description: "File path, relative to the server root or absolute",
};

const DIR_PATH_PROP: ToolPropertyDef = ToolPropertyDef {
    name: "path",
    prop_type: "string",
    description: "Directory path, relative to the server root or absolute",
};

/// All tool definitions, in the order `tools/list` reports them.
pub static TOOL_DEFS: &[ToolDef] = &[
    ToolDef {
        operation: Operation::ReadFile,
        description: "Read the full contents of a UTF-8 text file.",
        properties: &[PATH_PROP],
        required: &["path"],
    },
    ToolDef {
        operation: Operation::WriteFile,
        description: "Write content to a file, overwriting it. Missing parent directories are created.",
        properties: &[
            PATH_PROP,
            ToolPropertyDef {
                name: "content",
                prop_type: "string",
                description: "Text to write",
            },
        ],
        required: &["path", "content"],
    },
    ToolDef {
        operation: Operation::AppendFile,
        description: "Append content to the end of a file, creating it if absent.",
        properties: &[
            PATH_PROP,
            ToolPropertyDef {
                name: "content",
                prop_type: "string",
                description: "Text to append",
            },
        ],
        required: &["path", "content"],
    },
    ToolDef {
        operation: Operation::UpdateFile,
        description: "Find and replace across the whole file. Returns the number of replacements (zero is not an error).",
        properties: &[
            PATH_PROP,
            ToolPropertyDef {
                name: "find_pattern",
                prop_type: "string",
                description: "Exact text to find, or a regular expression when use_regex is true",
            },
            ToolPropertyDef {
                name: "replace_text",
                prop_type: "string",
                description: "Replacement text; in regex mode $1 / ${name} refer to capture groups",
            },
            ToolPropertyDef {
                name: "use_regex",
                prop_type: "boolean",
                description: "Treat find_pattern as a regular expression (default: false)",
            },
        ],
        required: &["path", "find_pattern", "replace_text"],
    },
    ToolDef {
        operation: Operation::DeleteFile,
        description: "Delete a file.",
        properties: &[PATH_PROP],
        required: &["path"],
    },
    ToolDef {
        operation: Operation::ListFiles,
        description: "List the files and subdirectories directly inside a directory.",
        properties: &[DIR_PATH_PROP],
        required: &["path"],
    },
    ToolDef {
        operation: Operation::CreateDirectory,
        description: "Create a directory and any missing parents (mkdir -p).",
        properties: &[DIR_PATH_PROP],
        required: &["path"],
    },
];

impl ToolDef {
    /// Convert this tool definition to an MCP tool entry
    pub fn to_mcp_format(&self) -> serde_json::Value {
        let mut props = serde_json::Map::new();
        for prop in self.properties {
            props.insert(
                prop.name.to_string(),
                serde_json::json!({
                    "type": prop.prop_type,
                    "description": prop.description,
                }),
            );
        }

        serde_json::json!({
            "name": self.operation.as_ref(),
            "description": self.description,
            "inputSchema": {
                "type": "object",
                "properties": props,
                "required": self.required,
            }
        })
    }
}

/// Convert all tools to MCP format
pub fn all_tools_to_mcp_format() -> Vec<serde_json::Value> {
    TOOL_DEFS.iter().map(ToolDef::to_mcp_format).collect()
}
