//! Python rules the tree-sitter grammar does not enforce
//!
//! tree-sitter-python accepts empty suites, recovers from stray indentation
//! without error nodes and still knows the Python 2 `print` statement. This
//! pass runs over an error-free tree and reports the first construct CPython
//! would refuse to parse.

use super::python::{SyntaxIssue, is_splat};
use tree_sitter::Node;

/// Statements and clauses that introduce an indented suite; `try` is checked separately
const SUITE_OWNERS: [&str; 13] = [
    "function_definition",
    "class_definition",
    "if_statement",
    "elif_clause",
    "else_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "with_statement",
    "match_statement",
    "case_clause",
];

pub fn first_violation(root: Node<'_>, source: &str) -> Option<SyntaxIssue> {
    Checker { lines: source.split('\n').collect() }.walk(root)
}

struct Checker<'s> {
    lines: Vec<&'s str>,
}

impl Checker<'_> {
    fn walk(&self, node: Node<'_>) -> Option<SyntaxIssue> {
        if let Some(found) = self.check(node) {
            return Some(found);
        }
        (0..node.child_count()).filter_map(|i| node.child(i)).find_map(|child| self.walk(child))
    }

    fn check(&self, node: Node<'_>) -> Option<SyntaxIssue> {
        match node.kind() {
            "module" => self.check_module(node),
            "block" => self.check_block(node),
            "try_statement" => check_suite(node).or_else(|| check_handlers(node)),
            "parameters" => check_parameters(node),
            "argument_list" => check_arguments(node),
            "delete_statement" => check_delete(node),
            "print_statement" => issue(node, "Missing parentheses in call to 'print'"),
            "exec_statement" => issue(node, "Missing parentheses in call to 'exec'"),
            kind if SUITE_OWNERS.contains(&kind) => check_suite(node),
            _ => None,
        }
    }

    /// Byte width of the leading whitespace on `row`
    fn indentation(&self, row: usize) -> usize {
        self.lines
            .get(row)
            .map_or(0, |line| line.len() - line.trim_start_matches([' ', '\t', '\x0c']).len())
    }

    /// Statements of `container` that begin their own line
    fn line_leading<'t>(&self, container: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = container.walk();
        container
            .named_children(&mut cursor)
            .filter(|node| !is_extra(node))
            .filter(|node| {
                let start = node.start_position();
                start.column == self.indentation(start.row)
            })
            .collect()
    }

    fn check_module(&self, module: Node<'_>) -> Option<SyntaxIssue> {
        self.line_leading(module)
            .into_iter()
            .find(|statement| statement.start_position().column > 0)
            .and_then(|statement| issue(statement, "unexpected indent"))
    }

    fn check_block(&self, block: Node<'_>) -> Option<SyntaxIssue> {
        let statements = self.line_leading(block);
        let first = *statements.first()?;
        let outer = block
            .parent()
            .map_or(0, |owner| self.indentation(owner.start_position().row));

        let column = first.start_position().column;
        if column <= outer {
            return issue(first, "expected an indented block");
        }

        statements.iter().skip(1).find_map(|&statement| {
            let other = statement.start_position().column;
            if other > column {
                issue(statement, "unexpected indent")
            } else if other < column {
                issue(statement, "unindent does not match any outer indentation level")
            } else {
                None
            }
        })
    }
}

fn issue(node: Node<'_>, message: impl Into<String>) -> Option<SyntaxIssue> {
    Some(SyntaxIssue { line: node.start_position().row + 1, message: message.into() })
}

fn is_extra(node: &Node<'_>) -> bool {
    matches!(node.kind(), "comment" | "line_continuation")
}

fn has_statements(block: Node<'_>) -> bool {
    let mut cursor = block.walk();
    block.named_children(&mut cursor).any(|child| !is_extra(&child))
}

/// The owner's block must exist and hold at least one statement
fn check_suite(owner: Node<'_>) -> Option<SyntaxIssue> {
    let mut cursor = owner.walk();
    let body = owner.named_children(&mut cursor).find(|child| child.kind() == "block");
    match body {
        Some(block) if has_statements(block) => None,
        _ => issue(owner, "expected an indented block"),
    }
}

fn check_handlers(try_statement: Node<'_>) -> Option<SyntaxIssue> {
    let mut cursor = try_statement.walk();
    let handled = try_statement.named_children(&mut cursor).any(|child| {
        matches!(child.kind(), "except_clause" | "except_group_clause" | "finally_clause")
    });
    if handled {
        None
    } else {
        issue(try_statement, "expected 'except' or 'finally' block")
    }
}

fn check_parameters(parameters: Node<'_>) -> Option<SyntaxIssue> {
    let mut seen_default = false;
    let mut cursor = parameters.walk();
    for param in parameters.children(&mut cursor) {
        match param.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            // Everything after `*`, `*args` or `**kwargs` is keyword-only
            "*" | "keyword_separator" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                return None;
            }
            "typed_parameter" if is_splat(param) => return None,
            "identifier" | "typed_parameter" if seen_default => {
                return issue(param, "parameter without a default follows parameter with a default");
            }
            _ => {}
        }
    }
    None
}

fn check_arguments(arguments: Node<'_>) -> Option<SyntaxIssue> {
    let mut keyword = false;
    let mut keyword_unpacking = false;
    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        match argument.kind() {
            "comment" | "line_continuation" => {}
            "keyword_argument" => keyword = true,
            "dictionary_splat" => keyword_unpacking = true,
            "list_splat" if keyword_unpacking => {
                return issue(
                    argument,
                    "iterable argument unpacking follows keyword argument unpacking",
                );
            }
            "list_splat" => {}
            _ if keyword_unpacking => {
                return issue(argument, "positional argument follows keyword argument unpacking");
            }
            _ if keyword => return issue(argument, "positional argument follows keyword argument"),
            _ => {}
        }
    }
    None
}

fn check_delete(statement: Node<'_>) -> Option<SyntaxIssue> {
    let target = invalid_delete_target(statement.named_children(&mut statement.walk()).collect())?;
    let what = match target.kind() {
        "call" => "function call",
        "string" | "integer" | "float" | "true" | "false" | "none" => "literal",
        _ => "expression",
    };
    issue(target, format!("cannot delete {what}"))
}

/// First node among `targets` that `del` cannot remove
fn invalid_delete_target(targets: Vec<Node<'_>>) -> Option<Node<'_>> {
    targets.into_iter().filter(|node| !is_extra(node)).find_map(|node| match node.kind() {
        "identifier" | "attribute" | "subscript" => None,
        "expression_list" | "tuple" | "list" | "parenthesized_expression" => {
            invalid_delete_target(node.named_children(&mut node.walk()).collect())
        }
        _ => Some(node),
    })
}

#[cfg(test)]
mod tests {
    use super::super::python::PythonModule;

    fn rejected(source: &str) -> Option<String> {
        PythonModule::parse(source).unwrap().syntax_error().map(|issue| issue.message)
    }

    #[test]
    fn test_empty_suites() {
        for source in ["def f():\n", "class A:\n", "if True:\n"] {
            let message = rejected(source);
            assert_eq!(message.as_deref(), Some("expected an indented block"), "{source:?}");
        }
        for source in ["for i in y:\n", "while x:\n", "with open(p) as f:\n"] {
            assert!(rejected(source).is_some(), "{source:?}");
        }
    }

    #[test]
    fn test_truncated_function_body() {
        let module = PythonModule::parse("import os\n\n\ndef get_agent_config():\n").unwrap();
        let issue = module.syntax_error().unwrap();
        assert_eq!(issue.message, "expected an indented block");
        assert_eq!(issue.line, 4);
    }

    #[test]
    fn test_comment_only_suite() {
        assert!(rejected("def f():\n    # nothing yet\n").is_some());
    }

    #[test]
    fn test_body_not_indented() {
        assert!(rejected("def f():\nreturn 1\n").is_some());
    }

    #[test]
    fn test_unexpected_indent() {
        assert_eq!(rejected("  x = 1\n").as_deref(), Some("unexpected indent"));

        let module = PythonModule::parse("x = 1\n  y = 2\n").unwrap();
        let issue = module.syntax_error().unwrap();
        assert_eq!(issue.message, "unexpected indent");
        assert_eq!(issue.line, 2);
    }

    #[test]
    fn test_try_without_handler() {
        assert!(rejected("try:\n    pass\n").is_some());
        assert!(rejected("try:\n    pass\nfinally:\n    pass\n").is_none());
        assert!(rejected("try:\n    pass\nexcept ValueError:\n    pass\n").is_none());
    }

    #[test]
    fn test_parameter_order() {
        assert!(rejected("def f(a=1, b):\n    pass\n").is_some());
        assert!(rejected("def f(a=1, *, b):\n    pass\n").is_none());
        assert!(rejected("def f(a=1, *args, b):\n    pass\n").is_none());
        assert!(rejected("def f(self, a: int = 1, **kwargs):\n    pass\n").is_none());
    }

    #[test]
    fn test_argument_order() {
        assert!(rejected("f(**kwargs, *args)\n").is_some());
        assert!(rejected("f(a=1, b)\n").is_some());
        assert!(rejected("f(a, *args, key=1, **kwargs)\n").is_none());
        assert!(rejected("f(a=1, *args)\n").is_none());
    }

    #[test]
    fn test_delete_targets() {
        assert_eq!(rejected("del f()\n").as_deref(), Some("cannot delete function call"));
        assert!(rejected("del a, b.c, d[0]\n").is_none());
    }

    #[test]
    fn test_python2_print() {
        assert!(rejected("print \"hello\"\n").is_some());
        assert!(rejected("print(\"hello\")\n").is_none());
    }

    #[test]
    fn test_valid_layouts() {
        let source = "\
import os  # used below


class Helper:
    \"\"\"Doc.\"\"\"

    @staticmethod
    def run(a, b=2):
        if a:  # guard
            return b
        elif b:
            pass
        else:
            x = 1; y = 2
        return os.getenv(
    \"KEY\",
            \"default\",
        )


if __name__ == \"__main__\": Helper.run(1)
";
        assert!(rejected(source).is_none());
    }
}
