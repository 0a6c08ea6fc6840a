//! Prompt construction for per-file generation

use crate::state::{AgentSpec, Integrations, PipelineState, ToolRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Registry entries included in a prompt
pub const REGISTRY_EXCERPT: usize = 10;

/// Spec examples included in a prompt
pub const EXAMPLE_EXCERPT: usize = 3;

const DEFAULT_USER_ID: &str = "test-user-123";

/// Everything about a run that a prompt may reference
pub struct PromptContext<'a> {
    pub spec: &'a AgentSpec,
    pub tool_registry: &'a [ToolRecord],
    pub integrations: &'a Integrations,
    pub user_query: &'a str,
}

impl<'a> PromptContext<'a> {
    pub fn from_state(state: &'a PipelineState) -> Self {
        Self {
            spec: &state.agent_spec,
            tool_registry: &state.tool_registry,
            integrations: &state.integrations,
            user_query: &state.user_query,
        }
    }

    fn user_ids(&self) -> BTreeMap<String, String> {
        self.integrations.pipedream_user_ids().cloned().unwrap_or_default()
    }

    /// External user id bound to the primary tool
    fn primary_user_id(&self) -> String {
        let slug = self.spec.primary_tool_slug();
        self.user_ids().get(slug).cloned().unwrap_or_else(|| DEFAULT_USER_ID.to_string())
    }

    fn action_names(&self) -> String {
        self.spec
            .action_list()
            .iter()
            .filter_map(|action| action.name.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Shared block describing the agent, its tools and integrations
    pub fn context_block(&self) -> serde_json::Result<String> {
        let registry: Vec<&ToolRecord> = self.tool_registry.iter().take(REGISTRY_EXCERPT).collect();
        let examples: Vec<&Value> = self
            .spec
            .examples
            .as_deref()
            .unwrap_or_default()
            .iter()
            .take(EXAMPLE_EXCERPT)
            .collect();
        let examples = if examples.is_empty() {
            "None".to_string()
        } else {
            serde_json::to_string_pretty(&examples)?
        };

        Ok(format!(
            "Agent Specification:\n\
             - Name: {name}\n\
             - Description: {description}\n\
             - User Query: {query}\n\
             - Model: {model}\n\n\
             Tools Required:\n{tools}\n\n\
             Tool Registry (available tools):\n{registry}\n\n\
             Actions:\n{actions}\n\n\
             Examples:\n{examples}\n\n\
             Pipedream User IDs:\n{user_ids}\n",
            name = self.spec.display_name(),
            description = self.spec.description_text(),
            query = self.user_query,
            model = self.spec.model(),
            tools = serde_json::to_string_pretty(self.spec.tools())?,
            registry = serde_json::to_string_pretty(&registry)?,
            actions = serde_json::to_string_pretty(self.spec.action_list())?,
            user_ids = serde_json::to_string_pretty(&self.user_ids())?,
        ))
    }

    /// File-specific instructions for the well-known paths
    fn requirements(&self, path: &str) -> Option<String> {
        let identifier = self.spec.identifier();
        let model = self.spec.model();
        let slug = self.spec.primary_tool_slug();
        let user_id = self.primary_user_id();
        let actions = self.action_names();

        let lines: Vec<String> = match path {
            "agent.py" => vec![
                "Import Agent from google.adk".into(),
                "Import get_agent_config from .config and get_agent_tools from .tools".into(),
                format!("Define _get_model() returning \"{model}\""),
                "Build a module-level root_agent = Agent(...) using name, model, \
                 instruction and tools from config"
                    .into(),
                format!(
                    "Add a module docstring describing {} with Pipedream MCP tools",
                    self.spec.display_name()
                ),
            ],
            "config/agent_config.py" => vec![
                "Define get_agent_config() taking no arguments and returning a dict".into(),
                format!(
                    "Keys: 'model' = '{model}', 'name' = '{identifier}', \
                     'description', 'instruction'"
                ),
                format!("The instruction lists the available actions: {actions}"),
                format!(
                    "The instruction explains execute_{identifier}_action and list_pipedream_tools"
                ),
            ],
            "tools/__init__.py" => vec![
                "Import _init_tools_sync from .pipedream_tools".into(),
                "Define get_agent_tools() taking no arguments that returns _init_tools_sync()"
                    .into(),
                "Fall back to create_smart_pipedream_tool and \
                 create_list_pipedream_tools_tool on failure"
                    .into(),
                "Export __all__ = ['get_agent_tools']".into(),
            ],
            "tools/pipedream_client.py" => vec![
                "Guard optional imports of mcp and pipedream with \
                 MCP_AVAILABLE / PIPEDREAM_AVAILABLE flags"
                    .into(),
                "Define class PipedreamMCPClient with async connect, list_tools, \
                 execute_tool and close"
                    .into(),
                "Use mcp ClientSession over the streamable HTTP client".into(),
                format!("Default app_slug: {slug}"),
                "Default mcp_server_url: https://remote.mcp.pipedream.net".into(),
                "Never embed credentials; read them from the environment".into(),
            ],
            "tools/pipedream_tools.py" => vec![
                "Import asyncio, os and PipedreamMCPClient from .pipedream_client".into(),
                "Keep module state in _pipedream_client, _pipedream_tools and \
                 _pipedream_initialized"
                    .into(),
                "Define async initialize_pipedream_client() and \
                 create_pipedream_tool_function(tool_info)"
                    .into(),
                format!(
                    "Define create_smart_pipedream_tool() returning execute_{identifier}_action"
                ),
                "Define create_list_pipedream_tools_tool(), async _init_tools_async() and \
                 _init_tools_sync()"
                    .into(),
                format!("Default app_slug: {slug}; default external user id: {user_id}"),
                format!("Map instruction keywords to these actions: {actions}"),
            ],
            "requirements.txt" => vec![
                "google-adk".into(),
                "mcp>=0.1.0".into(),
                "pipedream>=1.0.0".into(),
                "python-dotenv>=1.0.0".into(),
            ],
            ".env.example" => vec![
                "GOOGLE_API_KEY, PIPEDREAM_PROJECT_ID, PIPEDREAM_CLIENT_ID, \
                 PIPEDREAM_CLIENT_SECRET with comments"
                    .into(),
                "PIPEDREAM_ENVIRONMENT=development".into(),
                format!("EXTERNAL_USER_ID={user_id}"),
                format!("APP_SLUG={slug}"),
                "Placeholder values only".into(),
            ],
            "README.md" => vec![
                format!("Title: {}", self.spec.display_name()),
                format!("Description: {}", self.spec.description_text()),
                "Built with Google's Agent Development Kit and Pipedream MCP tools".into(),
                "Sections: setup, configuration, running with `adk run` and `adk web`, \
                 usage, troubleshooting"
                    .into(),
                format!("Available actions: {actions}"),
                format!("Defaults: EXTERNAL_USER_ID={user_id}, APP_SLUG={slug}"),
            ],
            _ => return None,
        };

        Some(lines.into_iter().map(|line| format!("- {line}\n")).collect())
    }

    /// Full prompt for one file, with the reference template when there is one
    pub fn build(&self, path: &str, template: Option<&str>) -> serde_json::Result<String> {
        let mut prompt = String::new();

        if let Some(template) = template {
            let _ = write!(
                prompt,
                "REFERENCE TEMPLATE (from a working agent):\n\
                 Use it for imports, function signatures, structure and error handling.\n\
                 It uses Jinja2 syntax; emit real values instead of {{{{ ... }}}} placeholders:\n\
                 - agent_name -> {identifier}\n\
                 - agent_description -> {description}\n\
                 - tool_slug -> {slug}\n\n\
                 --- TEMPLATE START ---\n{template}\n--- TEMPLATE END ---\n\n",
                identifier = self.spec.identifier(),
                description = self.spec.description_text(),
                slug = self.spec.primary_tool_slug(),
            );
        }

        let context = self.context_block()?;
        let _ = write!(prompt, "Generate the file `{path}` for this agent.\n\n{context}\n");

        match self.requirements(path) {
            Some(requirements) => {
                let _ = write!(prompt, "Requirements:\n{requirements}\n");
            }
            None => prompt.push_str(
                "Follow the template structure if one is provided. Generate the complete file.\n",
            ),
        }

        prompt.push_str("Output ONLY the file content: no markdown fences, no explanations.");
        Ok(prompt)
    }
}
