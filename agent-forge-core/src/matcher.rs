//! Keyword routing of a free-text instruction to one of a set of discovered tools
//!
//! Generated agents expose a single "smart" action that forwards the user's
//! instruction to whichever remote tool fits best. This is that routing rule:
//! an intent group is active when the instruction contains one of its trigger
//! words, and a tool qualifies for the group when its name contains one of the
//! group's tool words. Tools are tried in discovery order and the first tool
//! always serves as the fallback.

use serde::{Deserialize, Serialize};

/// A remote tool as discovered at runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

struct Intent {
    triggers: &'static [&'static str],
    tool_words: &'static [&'static str],
}

const INTENTS: [Intent; 3] = [
    Intent {
        triggers: &["list", "get", "fetch", "show", "read"],
        tool_words: &["list", "get", "fetch", "read", "message"],
    },
    Intent {
        triggers: &["send", "compose", "write"],
        tool_words: &["send", "compose", "create"],
    },
    Intent { triggers: &["search", "find"], tool_words: &["search"] },
];

fn matches_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|word| haystack.contains(word))
}

/// Indices of the tools to try, best first, ending with the fallback
pub fn candidates(instruction: &str, tools: &[ToolDescriptor]) -> Vec<usize> {
    let instruction = instruction.to_lowercase();
    let active: Vec<&Intent> =
        INTENTS.iter().filter(|intent| matches_any(&instruction, intent.triggers)).collect();

    let mut order: Vec<usize> = tools
        .iter()
        .enumerate()
        .filter(|(_, tool)| {
            let name = tool.name.to_lowercase();
            active.iter().any(|intent| matches_any(&name, intent.tool_words))
        })
        .map(|(index, _)| index)
        .collect();

    if !tools.is_empty() && !order.contains(&0) {
        order.push(0);
    }
    order
}

/// Best tool for `instruction`, or `None` when there are no tools at all
pub fn rank_tools(instruction: &str, tools: &[ToolDescriptor]) -> Option<usize> {
    candidates(instruction, tools).first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gmail_tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("gmail_send_email", "Send an email"),
            ToolDescriptor::new("gmail_find_email", "Search mailbox"),
            ToolDescriptor::new("gmail_list_messages", "List recent messages"),
            ToolDescriptor::new("gmail_search_messages", "Search messages"),
        ]
    }

    #[test]
    fn test_read_intent() {
        assert_eq!(rank_tools("Show my last 5 emails", &gmail_tools()), Some(2));
    }

    #[test]
    fn test_send_intent() {
        assert_eq!(rank_tools("Compose a note to john@example.com", &gmail_tools()), Some(0));
    }

    #[test]
    fn test_search_intent_requires_search_in_name() {
        // "gmail_find_email" does not qualify; only names containing "search" do
        let order = candidates("find invoices from March", &gmail_tools());
        assert_eq!(order, vec![3, 0]);
    }

    #[test]
    fn test_falls_back_to_first_tool() {
        assert_eq!(rank_tools("archive everything", &gmail_tools()), Some(0));
        assert_eq!(candidates("archive everything", &gmail_tools()), vec![0]);
    }

    #[test]
    fn test_no_tools() {
        assert_eq!(rank_tools("list things", &[]), None);
    }

    #[test]
    fn test_multiple_intents_keep_discovery_order() {
        let order = candidates("read then send", &gmail_tools());
        assert_eq!(order, vec![0, 2, 3]);
    }
}
