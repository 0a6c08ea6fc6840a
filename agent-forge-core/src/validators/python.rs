//! Python source inspection backed by tree-sitter

use super::grammar;
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to load Python grammar: {0}")]
    ParserInit(String),

    #[error("parser produced no tree")]
    ParseFailed,
}

/// First syntax problem found in a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

/// One name brought in by an import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Module of a `from` import, or the imported module itself
    pub module: String,
    /// Imported symbol for `from` imports
    pub name: Option<String>,
    pub is_from: bool,
}

impl ImportedName {
    /// `module.name` for `from` imports, `module` otherwise
    pub fn qualified(&self) -> String {
        match &self.name {
            Some(name) => format!("{}.{}", self.module, name),
            None => self.module.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub is_async: bool,
    pub required_params: usize,
    /// Defined directly in the module body rather than in a class or function
    pub top_level: bool,
}

/// A parsed Python module
pub struct PythonModule<'a> {
    source: &'a str,
    tree: Tree,
}

impl<'a> PythonModule<'a> {
    pub fn parse(source: &'a str) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ParseError::ParserInit(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or(ParseError::ParseFailed)?;
        Ok(Self { source, tree })
    }

    fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    pub fn has_error(&self) -> bool {
        self.root().has_error()
    }

    /// The first error or missing node in document order, or else the first
    /// construct the tree-sitter grammar tolerates but CPython rejects
    pub fn syntax_error(&self) -> Option<SyntaxIssue> {
        if !self.has_error() {
            return grammar::first_violation(self.root(), self.source);
        }
        first_error(self.root()).map(|node| {
            let message = if node.is_missing() {
                format!("expected '{}'", node.kind())
            } else {
                let first_line = self.text(node).lines().next().unwrap_or("");
                let snippet: String = first_line.chars().take(40).collect();
                if snippet.is_empty() {
                    "invalid syntax".to_string()
                } else {
                    format!("invalid syntax near '{snippet}'")
                }
            };
            SyntaxIssue { line: node.start_position().row + 1, message }
        })
    }

    /// Every import anywhere in the module
    pub fn imports(&self) -> Vec<ImportedName> {
        let mut found = Vec::new();
        self.visit(self.root(), &mut |node| match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.children_by_field_name("name", &mut cursor) {
                    found.push(ImportedName {
                        module: self.text(imported_path(child)).to_string(),
                        name: None,
                        is_from: false,
                    });
                }
            }
            "import_from_statement" => {
                let module = node
                    .child_by_field_name("module_name")
                    .map(|module| self.text(module).trim_start_matches('.'))
                    .unwrap_or_default()
                    .to_string();

                let mut cursor = node.walk();
                let names: Vec<Node<'_>> =
                    node.children_by_field_name("name", &mut cursor).collect();
                if names.is_empty() {
                    found.push(ImportedName { module, name: Some("*".to_string()), is_from: true });
                } else {
                    for child in names {
                        found.push(ImportedName {
                            module: module.clone(),
                            name: Some(self.text(imported_path(child)).to_string()),
                            is_from: true,
                        });
                    }
                }
            }
            _ => {}
        });
        found
    }

    /// Every function definition, including async and nested ones
    pub fn functions(&self) -> Vec<FunctionDef> {
        let mut found = Vec::new();
        self.collect_functions(self.root(), true, &mut found);
        found
    }

    fn collect_functions(&self, node: Node<'_>, top_level: bool, found: &mut Vec<FunctionDef>) {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "function_definition" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        found.push(FunctionDef {
                            name: self.text(name).to_string(),
                            is_async: self.text(child).trim_start().starts_with("async"),
                            required_params: child
                                .child_by_field_name("parameters")
                                .map(required_params)
                                .unwrap_or(0),
                            top_level,
                        });
                    }
                    self.collect_functions(child, false, found);
                }
                "class_definition" => self.collect_functions(child, false, found),
                _ => self.collect_functions(child, top_level, found),
            }
        }
    }

    /// Every class name in the module
    pub fn classes(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.visit(self.root(), &mut |node| {
            if node.kind() == "class_definition" {
                if let Some(name) = node.child_by_field_name("name") {
                    found.push(self.text(name).to_string());
                }
            }
        });
        found
    }

    /// Names bound by plain assignments outside function and class bodies
    pub fn module_bindings(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.collect_bindings(self.root(), &mut found);
        found
    }

    fn collect_bindings(&self, node: Node<'_>, found: &mut Vec<String>) {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            match child.kind() {
                "function_definition" | "class_definition" | "lambda" => {}
                "assignment" => {
                    if let Some(left) = child.child_by_field_name("left") {
                        if left.kind() == "identifier" {
                            found.push(self.text(left).to_string());
                        }
                    }
                    // chained `a = b = value`
                    if let Some(right) = child.child_by_field_name("right") {
                        if right.kind() == "assignment" {
                            self.collect_bindings(child, found);
                        }
                    }
                }
                _ => self.collect_bindings(child, found),
            }
        }
    }

    /// Names assigned anywhere in the module, nested scopes included
    pub fn assigned_names(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.visit(self.root(), &mut |node| {
            if node.kind() == "assignment" {
                if let Some(left) = node.child_by_field_name("left") {
                    if left.kind() == "identifier" {
                        found.push(self.text(left).to_string());
                    }
                }
            }
        });
        found
    }

    /// String literal contents, quotes removed
    pub fn string_literals(&self) -> Vec<&'a str> {
        let mut found = Vec::new();
        self.visit(self.root(), &mut |node| {
            if node.kind() == "string_content" {
                found.push(self.text(node));
            }
        });
        found
    }

    fn visit<'t>(&self, node: Node<'t>, f: &mut dyn FnMut(Node<'t>)) {
        f(node);
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.visit(child, f);
            }
        }
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(found) = node.child(i).and_then(first_error) {
            return Some(found);
        }
    }
    None
}

/// The dotted path of an import target, alias stripped
fn imported_path(node: Node<'_>) -> Node<'_> {
    if node.kind() == "aliased_import" {
        node.child_by_field_name("name").unwrap_or(node)
    } else {
        node
    }
}

/// Parameters that must be supplied by the caller
fn required_params(parameters: Node<'_>) -> usize {
    let mut cursor = parameters.walk();
    parameters
        .named_children(&mut cursor)
        .filter(|param| matches!(param.kind(), "identifier" | "typed_parameter"))
        .filter(|param| !matches!(param.kind(), "typed_parameter") || !is_splat(*param))
        .count()
}

pub(super) fn is_splat(param: Node<'_>) -> bool {
    let mut cursor = param.walk();
    param
        .named_children(&mut cursor)
        .any(|child| matches!(child.kind(), "list_splat_pattern" | "dictionary_splat_pattern"))
}
