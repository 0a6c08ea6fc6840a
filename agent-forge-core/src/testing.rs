//! Shared fixtures for unit tests

use crate::state::{FileMap, PipelineInput};
use serde_json::json;

pub const AGENT_PY: &str = r#""""Mail Bot using Google ADK with Pipedream MCP Tools."""
from google.adk import Agent

from .config import get_agent_config
from .tools import get_agent_tools


def _get_model():
    return "gemini-2.5-flash"


_config = get_agent_config()

root_agent = Agent(
    name=_config["name"],
    model=_get_model(),
    instruction=_config["instruction"],
    tools=get_agent_tools(),
)
"#;

pub const CONFIG_PY: &str = r#"import os


def get_agent_config():
    return {
        "name": "mail_bot",
        "model": os.getenv("MODEL", "gemini-2.5-flash"),
        "description": "Reads mail",
        "instruction": "Help the user with their inbox.",
    }
"#;

pub const TOOLS_INIT_PY: &str = r#"from .pipedream_tools import _init_tools_sync


def get_agent_tools():
    return _init_tools_sync()


__all__ = ["get_agent_tools"]
"#;

pub const CLIENT_PY: &str = r#"import logging
from typing import Any, Dict, List, Optional

from mcp import ClientSession

logger = logging.getLogger(__name__)


class PipedreamMCPClient:
    def __init__(self, project_id: str, client_id: str, client_secret: Optional[str] = None):
        self.project_id = project_id
        self.client_id = client_id
        self.client_secret = client_secret

    async def list_tools(self) -> List[Dict[str, Any]]:
        return []
"#;

pub const TOOLS_PY: &str = r#"import asyncio
import os

from .pipedream_client import PipedreamMCPClient

_pipedream_client = None
_pipedream_tools = []
_pipedream_initialized = False


async def initialize_pipedream_client():
    global _pipedream_client
    _pipedream_client = PipedreamMCPClient(
        os.getenv("PIPEDREAM_PROJECT_ID", ""),
        os.getenv("PIPEDREAM_CLIENT_ID", ""),
    )
    return _pipedream_client


def create_pipedream_tool_function(tool_info):
    async def run(**kwargs):
        return kwargs
    return run


def create_smart_pipedream_tool():
    def execute_mail_bot_action(instruction: str):
        return instruction
    return execute_mail_bot_action


def create_list_pipedream_tools_tool():
    def list_pipedream_tools():
        return []
    return list_pipedream_tools


def _init_tools_sync():
    return [create_smart_pipedream_tool(), create_list_pipedream_tools_tool()]
"#;

/// Content for one planned path that passes every check
pub fn file_for(path: &str) -> String {
    match path {
        "__init__.py" => "from . import agent\n".to_string(),
        "agent.py" => AGENT_PY.to_string(),
        "config/__init__.py" => "from .agent_config import get_agent_config\n".to_string(),
        "config/agent_config.py" => CONFIG_PY.to_string(),
        "tools/__init__.py" => TOOLS_INIT_PY.to_string(),
        "tools/pipedream_client.py" => CLIENT_PY.to_string(),
        "tools/pipedream_tools.py" => TOOLS_PY.to_string(),
        "requirements.txt" => {
            "google-adk\nmcp>=0.1.0\npipedream>=1.0.0\npython-dotenv>=1.0.0\n".to_string()
        }
        ".env.example" => "# Example values only\nGOOGLE_API_KEY=your-key-here\n".to_string(),
        "README.md" => "# Mail Bot\n\nReads mail.\n".to_string(),
        other => format!("# {other}\n"),
    }
}

/// A complete, clean generated project
pub fn clean_project() -> FileMap {
    crate::layout::PLANNED_FILES.iter().map(|path| (path.to_string(), file_for(path))).collect()
}

/// An input document that passes validation
pub fn valid_input() -> PipelineInput {
    serde_json::from_value(json!({
        "pipeline_id": "p-1",
        "user_query": "summarize my inbox",
        "agent_spec": {
            "name": "Mail Bot",
            "description": "Reads mail",
            "runtime": {"model": "gemini-2.5-flash"},
            "tools_required": [
                {"tool_slug": "gmail", "provider": "pipedream", "auth_required": true}
            ],
            "actions": [{"name": "list_messages", "tool_slug": "gmail"}]
        },
        "tool_registry": [{"tool_slug": "gmail", "name": "Gmail"}],
        "integrations": {"pipedream": {"external_user_ids": {"gmail": "user-1"}}}
    }))
    .expect("fixture input is valid")
}
