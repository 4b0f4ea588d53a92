//! File tools scoped to a workspace directory.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{parse_arguments, ToolOutput, WorkerTool};
use crate::provider::ToolDefinition;

/// Default `read_file` ceiling, in characters
pub const DEFAULT_MAX_READ_CHARS: usize = 200_000;

/// Marker appended to truncated reads
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// Directory that tool paths are resolved against.
///
/// Resolution is lexical: `..` may not climb above the root and absolute paths
/// must already lie inside it.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a tool-supplied path into the workspace
    pub fn resolve(&self, path: &str) -> Result<PathBuf, String> {
        let outside = || format!("Error: path {} is outside the workspace", path);

        let requested = Path::new(path);
        let relative = if requested.is_absolute() {
            requested.strip_prefix(&self.root).map_err(|_| outside())?
        } else {
            requested
        };

        let mut resolved = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() {
                        return Err(outside());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(outside()),
            }
        }

        Ok(self.root.join(resolved))
    }
}

fn default_path() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default = "default_path")]
    path: String,
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    path: String,
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
    #[serde(default)]
    append: bool,
}

/// `list_files(path)`: sorted entry names, one per line
pub struct ListFiles {
    workspace: Workspace,
}

impl ListFiles {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl WorkerTool for ListFiles {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_files",
            "List files in a directory.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Directory to list", "default": "." }
                }
            }),
        )
    }

    async fn call(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: ListArgs = match parse_arguments("list_files", arguments) {
            Ok(args) => args,
            Err(output) => return output,
        };
        let dir = match self.workspace.resolve(&args.path) {
            Ok(dir) => dir,
            Err(message) => return ToolOutput::error(message),
        };

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => return ToolOutput::error(format!("Error: {}", e)),
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().to_string()),
                Ok(None) => break,
                Err(e) => return ToolOutput::error(format!("Error: {}", e)),
            }
        }
        names.sort();
        ToolOutput::success(names.join("\n"))
    }
}

/// `read_file(path)`: UTF-8 contents, truncated at a character ceiling
pub struct ReadFile {
    workspace: Workspace,
    max_chars: usize,
}

impl ReadFile {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            max_chars: DEFAULT_MAX_READ_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

/// Cut `content` at `max_chars` characters and mark the cut
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &content[..byte_index], TRUNCATION_MARKER),
        None => content.to_string(),
    }
}

#[async_trait]
impl WorkerTool for ReadFile {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "read_file",
            "Read a file.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File to read" }
                },
                "required": ["path"]
            }),
        )
    }

    async fn call(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: ReadArgs = match parse_arguments("read_file", arguments) {
            Ok(args) => args,
            Err(output) => return output,
        };
        let path = match self.workspace.resolve(&args.path) {
            Ok(path) => path,
            Err(message) => return ToolOutput::error(message),
        };

        match fs::read_to_string(&path).await {
            Ok(content) => ToolOutput::success(truncate_content(&content, self.max_chars)),
            Err(e) => ToolOutput::error(format!("Error reading {}: {}", args.path, e)),
        }
    }
}

/// `write_file(path, content, append)`: creates parent directories as needed
pub struct WriteFile {
    workspace: Workspace,
}

impl WriteFile {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    async fn write(path: &Path, content: &str, append: bool) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl WorkerTool for WriteFile {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "write_file",
            "Write content to a file, creating parent directories as needed.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "File to write" },
                    "content": { "type": "string", "description": "Text to write" },
                    "append": { "type": "boolean", "description": "Append instead of overwrite", "default": false }
                },
                "required": ["path", "content"]
            }),
        )
    }

    async fn call(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: WriteArgs = match parse_arguments("write_file", arguments) {
            Ok(args) => args,
            Err(output) => return output,
        };
        let path = match self.workspace.resolve(&args.path) {
            Ok(path) => path,
            Err(message) => return ToolOutput::error(message),
        };

        match Self::write(&path, &args.content, args.append).await {
            Ok(()) => ToolOutput::success(format!(
                "Successfully {} {} characters to {}",
                if args.append { "appended" } else { "wrote" },
                args.content.chars().count(),
                args.path
            )),
            Err(e) => ToolOutput::error(format!("Error writing {}: {}", args.path, e)),
        }
    }
}
