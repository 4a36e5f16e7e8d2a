//! Prompt Library for the AI backends
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/billwise/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Each prompt file starts with YAML frontmatter and is split into a
//! `# System` and a `# User` section. `{{name}}` placeholders in either
//! section are replaced at render time.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const EXTRACT_BILL: &str = include_str!("../../../prompts/extract_bill.md");
    pub const FINANCE_ASSISTANT: &str = include_str!("../../../prompts/finance_assistant.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Vision prompt turning a bill image into structured JSON
    ExtractBill,
    /// Chat prompt answering questions over the transaction ledger
    FinanceAssistant,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractBill => "extract_bill",
            Self::FinanceAssistant => "finance_assistant",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::ExtractBill, Self::FinanceAssistant]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ExtractBill => defaults::EXTRACT_BILL,
            Self::FinanceAssistant => defaults::FINANCE_ASSISTANT,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    /// Kind of model the prompt is written for (vision, narrative)
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt content (system + user sections)
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Get the system section of the prompt
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    /// Get the user section of the prompt
    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the system section with variables, if the prompt has one
    pub fn render_system(&self, vars: &HashMap<&str, &str>) -> Option<String> {
        self.system_section().map(|s| substitute(s, vars))
    }

    /// Render the user section with variables (whole prompt if unsectioned)
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        match self.user_section() {
            Some(user) => substitute(user, vars),
            None => substitute(&self.content, vars),
        }
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("prompt {}", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(override_path) = self.override_path(id).filter(|p| p.exists()) {
            let content = fs::read_to_string(&override_path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override: {}", e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            tracing::debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(override_path),
            });
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("billwise").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;

    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Replace `{{name}}` placeholders in a single pass
///
/// Substituted values are never rescanned, so transaction text that happens
/// to contain `{{question}}` stays literal.
fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let name = after_open[..close].trim();
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 1
task_type: vision
---

# System
Test system prompt.

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.task_type, "vision");
        assert!(body.contains("# System"));
        assert!(body.contains("# User"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# User\nhello").is_err());
        assert!(parse_prompt("---\nid: x\n# User\nhello").is_err());
    }

    #[test]
    fn test_extract_section() {
        let content = "# System\nSystem content here.\n\n# User\nUser content here.";

        assert_eq!(
            extract_section(content, "# System"),
            Some("System content here.")
        );
        assert_eq!(
            extract_section(content, "# User"),
            Some("User content here.")
        );
    }

    #[test]
    fn test_substitute_single_pass() {
        let mut vars = HashMap::new();
        vars.insert("transactions", "[{\"note\": \"{{question}}\"}]");
        vars.insert("question", "How much?");

        let rendered = substitute("Data: {{transactions}} Q: {{question}} {{unknown}}", &vars);
        assert_eq!(
            rendered,
            "Data: [{\"note\": \"{{question}}\"}] Q: How much? {{unknown}}"
        );
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let (metadata, body) = parse_prompt(id.default_content())
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", id.as_str(), e));
            assert_eq!(metadata.id, id.as_str(), "Prompt ID mismatch");
            assert!(body.contains("# User"));
        }
    }

    #[test]
    fn test_embedded_finance_prompt_renders() {
        let mut lib = PromptLibrary::embedded_only();
        let prompt = lib.get(PromptId::FinanceAssistant).unwrap();
        assert!(!prompt.is_override);

        let mut vars = HashMap::new();
        vars.insert("transactions", "[]");
        vars.insert("question", "What did I spend on food?");

        let user = prompt.render_user(&vars);
        assert!(user.contains("Transaction Data:\n[]"));
        assert!(user.contains("User Question: What did I spend on food?"));
        assert!(prompt
            .render_system(&vars)
            .unwrap()
            .contains("personal finance assistant"));
    }

    #[test]
    fn test_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("extract_bill.md"),
            "---\nid: extract_bill\nversion: 2\ntask_type: vision\n---\n# User\nCustom bill prompt",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());

        let prompt = lib.get(PromptId::ExtractBill).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 2);
        assert_eq!(prompt.render_user(&HashMap::new()), "Custom bill prompt");

        // No override file, falls back to the embedded default
        assert!(!lib.get(PromptId::FinanceAssistant).unwrap().is_override);
    }
}
