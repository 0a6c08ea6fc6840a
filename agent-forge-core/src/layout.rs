//! Fixed file layout of a generated agent project

/// Every file the planner schedules, in generation order
pub const PLANNED_FILES: [&str; 10] = [
    "__init__.py",
    "agent.py",
    "config/__init__.py",
    "config/agent_config.py",
    "tools/__init__.py",
    "tools/pipedream_client.py",
    "tools/pipedream_tools.py",
    "requirements.txt",
    ".env.example",
    "README.md",
];

/// Files the test synthesizer expects before writing `test_agent.py`
pub const TEST_PREREQUISITES: [&str; 7] = [
    "__init__.py",
    "agent.py",
    "config/__init__.py",
    "config/agent_config.py",
    "tools/__init__.py",
    "tools/pipedream_client.py",
    "tools/pipedream_tools.py",
];

/// Files whose absence blocks a successful package
pub const CRITICAL_FILES: [&str; 5] = [
    "agent.py",
    "config/agent_config.py",
    "tools/__init__.py",
    "tools/pipedream_client.py",
    "tools/pipedream_tools.py",
];

pub const TEST_FILE: &str = "test_agent.py";

/// Files written alongside the planned ones without an LLM call
pub const SUPPORT_FILES: [&str; 4] = ["setup.sh", "setup.py", "run.sh", TEST_FILE];

/// True for any path the pipeline itself produces
pub fn is_known(path: &str) -> bool {
    PLANNED_FILES.contains(&path) || SUPPORT_FILES.contains(&path)
}
