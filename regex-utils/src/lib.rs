//! Regex utilities for agent-forge
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Secret-declaration idioms that should never appear in generated code
pub mod secrets {
    use super::*;

    /// A compiled secret pattern together with its source text.
    pub struct SecretPattern {
        pub source: &'static str,
        pub regex: Regex,
    }

    const SOURCES: [&str; 7] = [
        r#"api[_-]?key["']?\s*[:=]\s*["'][^"']+["']"#,
        r#"token["']?\s*[:=]\s*["'][^"']+["']"#,
        r#"password["']?\s*[:=]\s*["'][^"']+["']"#,
        r#"secret["']?\s*[:=]\s*["'][^"']+["']"#,
        r#"pipedream[_-]?api[_-]?key["']?\s*[:=]\s*["'][^"']+["']"#,
        r#"client[_-]?secret["']?\s*[:=]\s*["'][^"']+["']"#,
        r#"access[_-]?token["']?\s*[:=]\s*["'][^"']+["']"#,
    ];

    /// Context words that mark a match as documentation rather than a leak
    pub const ALLOW_LIST: [&str; 5] = ["example", "placeholder", "comment", "#", "//"];

    /// Characters inspected on each side of a match start
    pub const WINDOW: usize = 50;

    pub static PATTERNS: Lazy<Vec<SecretPattern>> = Lazy::new(|| {
        SOURCES
            .iter()
            .map(|source| SecretPattern {
                source,
                regex: Regex::new(&format!("(?i){source}")).expect("Invalid regex pattern"),
            })
            .collect()
    });

    /// Lowercased text from `WINDOW` chars before `start` to `WINDOW` chars after it.
    pub fn window(content: &str, start: usize) -> String {
        let before: String = content[..start].chars().rev().take(WINDOW).collect();
        let after: String = content[start..].chars().take(WINDOW).collect();
        before.chars().rev().chain(after.chars()).collect::<String>().to_lowercase()
    }

    /// True when the context around a match contains an allow-listed word
    pub fn is_allowed(content: &str, start: usize) -> bool {
        let context = window(content, start);
        ALLOW_LIST.iter().any(|word| context.contains(word))
    }

    /// Suspicious matches for one pattern, allow-listed ones removed
    pub fn suspicious<'a>(pattern: &SecretPattern, content: &'a str) -> Vec<&'a str> {
        pattern
            .regex
            .find_iter(content)
            .filter(|m| !is_allowed(content, m.start()))
            .map(|m| m.as_str())
            .collect()
    }
}

/// Template placeholders that may survive LLM generation
pub mod placeholders {
    use super::*;

    pub static AGENT_NAME: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\{\{\s*agent_name\s*\}\}").expect("Invalid regex pattern")
    });

    pub static AGENT_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\{\{\s*agent_description\s*\}\}").expect("Invalid regex pattern")
    });

    pub static TOOL_SLUG: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\{\{\s*.*\.tool_slug\s*\}\}").expect("Invalid regex pattern")
    });

    pub static ANY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\{\{[^}]+\}\}").expect("Invalid regex pattern"));

    /// Replace the known placeholders with concrete values
    pub fn substitute(
        content: &str,
        agent_name: &str,
        description: &str,
        tool_slug: &str,
    ) -> String {
        let content = AGENT_NAME.replace_all(content, regex::NoExpand(agent_name));
        let content = AGENT_DESCRIPTION.replace_all(&content, regex::NoExpand(description));
        TOOL_SLUG.replace_all(&content, regex::NoExpand(tool_slug)).into_owned()
    }

    /// Placeholders that are still present
    pub fn remaining(content: &str) -> Vec<&str> {
        ANY.find_iter(content).map(|m| m.as_str()).collect()
    }
}

/// Markdown code fences wrapped around LLM responses
pub mod code_fence {
    /// Drop a leading ``` line and a trailing ``` line when the text starts with a fence
    pub fn strip(content: &str) -> String {
        if !content.starts_with("```") {
            return content.to_string();
        }

        let mut lines: Vec<&str> = content.trim_end().split('\n').collect();
        if lines.first().is_some_and(|line| line.starts_with("```")) {
            lines.remove(0);
        }
        if lines.last().is_some_and(|line| line.trim() == "```") {
            lines.pop();
        }
        lines.join("\n")
    }
}
