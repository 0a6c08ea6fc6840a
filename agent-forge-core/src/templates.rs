//! Reference templates used as few-shot context in generation prompts

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Planned path to template file name
pub const TEMPLATE_MAP: [(&str, &str); 8] = [
    ("agent.py", "agent.py.j2"),
    ("config/agent_config.py", "config.py.j2"),
    ("tools/pipedream_tools.py", "pipedream_tools.py.j2"),
    ("tools/pipedream_client.py", "pipedream_client.py.j2"),
    ("tools/__init__.py", "tools_init.py.j2"),
    ("requirements.txt", "requirements.txt.j2"),
    (".env.example", "env.example.j2"),
    ("README.md", "readme.md.j2"),
];

/// Templates loaded once from a directory
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: HashMap<String, String>,
}

impl TemplateStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read every mapped template present in `dir`; unreadable ones are skipped
    pub fn load(dir: &Path) -> Self {
        let mut templates = HashMap::new();
        for (path, file) in TEMPLATE_MAP {
            let full = dir.join(file);
            match std::fs::read_to_string(&full) {
                Ok(content) => {
                    debug!(template = file, chars = content.len(), "loaded template");
                    templates.insert(path.to_string(), content);
                }
                Err(e) => warn!(template = %full.display(), "template not loaded: {e}"),
            }
        }
        Self { templates }
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.templates.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.templates.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
