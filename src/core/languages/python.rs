use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::config::ExtractionConfig;
use crate::core::body::{extract_body, FunctionSpan};
use crate::core::classifier::{ClassKind, DeclaredClass, DeclaredMethod, InterfaceClassifier};
use crate::core::model::{Field, FileLocation, FileRecord, FunctionRecord, Parameter};
use crate::core::type_expr::{node_text, split_string_literal, TypeExpr};
use crate::error::{PymetaError, Result};
use super::LanguageExtractor;

/// Python-specific extractor using Tree-sitter
pub struct PythonExtractor {
    parser: Parser,
    classifier: InterfaceClassifier,
    any_type: String,
    structural_spans: bool,
    include_async: bool,
}

/// Source text plus its lines, shared by every declaration in a file
struct SourceUnit<'a> {
    source: &'a str,
    lines: Vec<&'a str>,
}

/// A function or class node with the decorators written above it
struct Definition<'tree> {
    node: Node<'tree>,
    decorators: Vec<Node<'tree>>,
}

impl PythonExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser
            .set_language(&python_language)
            .map_err(|e| PymetaError::Parser(format!("Failed to set Python language: {}", e)))?;

        Ok(Self {
            parser,
            classifier: InterfaceClassifier::new(config),
            any_type: config.any_type.clone(),
            structural_spans: config.structural_spans,
            include_async: config.include_async,
        })
    }
}

impl LanguageExtractor for PythonExtractor {
    fn extract(&mut self, source: &str, location: FileLocation) -> Result<FileRecord> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| PymetaError::Parser(format!("Failed to parse {}", location.path)))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root)
                .map(|node| node.start_position().row + 1)
                .unwrap_or(1);
            return Err(PymetaError::Syntax {
                path: location.path,
                line,
            });
        }

        let unit = SourceUnit {
            source,
            lines: source.lines().collect(),
        };
        let definitions = definitions_in(root);
        let mut record = FileRecord::empty(location);

        for definition in &definitions {
            if definition.node.kind() == "function_definition" {
                if let Some(function) = self.extract_function(definition.node, &unit) {
                    record.functions.push(function);
                }
            }
        }

        for definition in &definitions {
            if definition.node.kind() == "class_definition" {
                if let Some(class) = self.extract_class(definition.node, &unit) {
                    match self.classifier.classify(class) {
                        ClassKind::Class(class) => record.classes.push(class),
                        ClassKind::Interface(interface) => record.interfaces.push(interface),
                    }
                }
            }
        }

        debug!(
            "{}: {} functions, {} classes, {} interfaces",
            record.path,
            record.functions.len(),
            record.classes.len(),
            record.interfaces.len()
        );

        Ok(record)
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn language_name(&self) -> &str {
        "python"
    }
}

impl PythonExtractor {
    fn extract_function(&self, node: Node, unit: &SourceUnit) -> Option<FunctionRecord> {
        let name = node_text(node.child_by_field_name("name")?, unit.source).to_string();

        if !self.include_async && is_async(node) {
            debug!("Skipping async function {}", name);
            return None;
        }

        let parameters = node
            .child_by_field_name("parameters")
            .map(|parameters| self.extract_parameters(parameters, unit.source))
            .unwrap_or_default();

        let return_types = match node.child_by_field_name("return_type") {
            Some(annotation) => {
                let annotation = TypeExpr::from_node(annotation, unit.source);
                annotation
                    .union_members()
                    .unwrap_or_else(|| vec![annotation.render()])
            }
            None => node
                .child_by_field_name("body")
                .map(|body| infer_return_types(body, unit.source))
                .unwrap_or_else(|| vec!["None".to_string()]),
        };

        Some(FunctionRecord {
            name,
            parameters,
            return_types,
            body: self.function_body(node, unit),
        })
    }

    /// Positional parameters. Positional-only parameters, `*args`,
    /// keyword-only parameters and `**kwargs` are left out.
    fn extract_parameters(&self, node: Node, source: &str) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    parameters.push(Parameter::new(node_text(child, source), &self.any_type));
                }
                "typed_parameter" => match child.named_child(0) {
                    Some(target) if target.kind() == "identifier" => {
                        let type_name = self.annotation_or_any(child, source);
                        parameters.push(Parameter::new(node_text(target, source), type_name));
                    }
                    _ => break,
                },
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(target) = child.child_by_field_name("name") {
                        let type_name = self.annotation_or_any(child, source);
                        parameters.push(Parameter::new(node_text(target, source), type_name));
                    }
                }
                "positional_separator" => parameters.clear(),
                "keyword_separator" | "list_splat_pattern" | "dictionary_splat_pattern" => break,
                _ => {}
            }
        }

        parameters
    }

    fn annotation_or_any(&self, node: Node, source: &str) -> String {
        node.child_by_field_name("type")
            .map(|annotation| TypeExpr::from_node(annotation, source).render())
            .unwrap_or_else(|| self.any_type.clone())
    }

    fn function_body(&self, node: Node, unit: &SourceUnit) -> String {
        let Some(block) = node.child_by_field_name("body") else {
            return String::new();
        };

        let start = node.start_position();
        // The block also spans trailing comments, so stop at its last statement
        let mut cursor = block.walk();
        let last_statement = block
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .last();
        let end = last_statement.unwrap_or(node).end_position();
        // A node ending at column 0 stops on the previous row
        let end_row = if end.column == 0 && end.row > start.row {
            end.row - 1
        } else {
            end.row
        };

        let span = FunctionSpan {
            header_row: start.row,
            body_row: block.start_position().row,
            body_column: block.start_position().column,
            end_row: Some(end_row),
        };
        let span = if self.structural_spans {
            span
        } else {
            span.without_end()
        };

        extract_body(&span, &unit.lines)
    }

    fn extract_class(&self, node: Node, unit: &SourceUnit) -> Option<DeclaredClass> {
        let name = node_text(node.child_by_field_name("name")?, unit.source).to_string();

        let bases = node
            .child_by_field_name("superclasses")
            .map(|superclasses| base_classes(superclasses, unit.source))
            .unwrap_or_default();

        let mut fields = Vec::new();
        let mut methods = Vec::new();

        if let Some(body) = node.child_by_field_name("body") {
            for item in definitions_or_statements(body) {
                match item {
                    ClassItem::Statement(statement) => {
                        if let Some(field) = class_field(statement, unit.source) {
                            fields.push(field);
                        }
                    }
                    ClassItem::Definition(definition) => {
                        if definition.node.kind() != "function_definition" {
                            continue;
                        }
                        if let Some(function) = self.extract_function(definition.node, unit) {
                            let decorators = definition
                                .decorators
                                .iter()
                                .filter_map(|decorator| decorator.named_child(0))
                                .map(|expression| TypeExpr::from_node(expression, unit.source))
                                .collect();
                            methods.push(DeclaredMethod {
                                decorators,
                                function,
                            });
                        }
                    }
                }
            }
        }

        Some(DeclaredClass {
            name,
            bases,
            fields,
            methods,
        })
    }
}

enum ClassItem<'tree> {
    Statement(Node<'tree>),
    Definition(Definition<'tree>),
}

fn definitions_or_statements(block: Node) -> Vec<ClassItem> {
    let mut cursor = block.walk();
    let items = block
        .named_children(&mut cursor)
        .filter_map(|child| match child.kind() {
            "expression_statement" => Some(ClassItem::Statement(child)),
            _ => as_definition(child).map(ClassItem::Definition),
        })
        .collect();
    items
}

fn definitions_in(block: Node) -> Vec<Definition> {
    let mut cursor = block.walk();
    let definitions = block
        .named_children(&mut cursor)
        .filter_map(as_definition)
        .collect();
    definitions
}

fn as_definition(node: Node) -> Option<Definition> {
    match node.kind() {
        "function_definition" | "class_definition" => Some(Definition {
            node,
            decorators: Vec::new(),
        }),
        "decorated_definition" => {
            let definition = node.child_by_field_name("definition")?;
            let mut cursor = node.walk();
            let decorators = node
                .named_children(&mut cursor)
                .filter(|child| child.kind() == "decorator")
                .collect();
            Some(Definition {
                node: definition,
                decorators,
            })
        }
        _ => None,
    }
}

fn is_async(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == "async");
    found
}

fn base_classes(superclasses: Node, source: &str) -> Vec<TypeExpr> {
    let mut cursor = superclasses.walk();
    let bases = superclasses
        .named_children(&mut cursor)
        .filter(|child| {
            !matches!(
                child.kind(),
                "keyword_argument" | "list_splat" | "dictionary_splat" | "comment"
            )
        })
        .map(|base| TypeExpr::from_node(base, source))
        .collect();
    bases
}

/// `name: Type` (optionally with a value) at class body level
fn class_field(statement: Node, source: &str) -> Option<Field> {
    let assignment = statement
        .named_child(0)
        .filter(|node| node.kind() == "assignment")?;
    let target = assignment
        .child_by_field_name("left")
        .filter(|node| node.kind() == "identifier")?;
    let annotation = assignment.child_by_field_name("type")?;

    Some(Field::new(
        node_text(target, source),
        TypeExpr::from_node(annotation, source).render(),
    ))
}

/// Types of the literals and names returned anywhere in `body`, first seen
/// first. Falls back to `None` when nothing qualifies.
fn infer_return_types(body: Node, source: &str) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    let mut stack = vec![body];

    while let Some(node) = stack.pop() {
        if node.kind() == "return_statement" {
            let mut cursor = node.walk();
            let value = node
                .named_children(&mut cursor)
                .find(|child| child.kind() != "comment");
            if let Some(type_name) = value.and_then(|value| literal_type_name(value, source)) {
                if !types.contains(&type_name) {
                    types.push(type_name);
                }
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    if types.is_empty() {
        vec!["None".to_string()]
    } else {
        types
    }
}

/// Runtime type name of a literal, or the name itself for an identifier
fn literal_type_name(node: Node, source: &str) -> Option<String> {
    let text = node_text(node, source);
    let type_name = match node.kind() {
        "identifier" => return Some(text.to_string()),
        "parenthesized_expression" => {
            return node
                .named_child(0)
                .and_then(|inner| literal_type_name(inner, source));
        }
        "integer" | "float" if text.ends_with(['j', 'J']) => "complex",
        "integer" => "int",
        "float" => "float",
        "string" => {
            let (prefix, _) = split_string_literal(text);
            if prefix.contains('f') {
                return None;
            }
            if prefix.contains('b') {
                "bytes"
            } else {
                "str"
            }
        }
        "concatenated_string" => {
            let mut cursor = node.walk();
            let parts: Vec<Node> = node.named_children(&mut cursor).collect();
            let mut part_types = parts
                .iter()
                .map(|part| literal_type_name(*part, source));
            let first = part_types.next().flatten()?;
            return part_types
                .all(|part| part.as_deref() == Some(first.as_str()))
                .then_some(first);
        }
        "true" | "false" => "bool",
        "none" => "NoneType",
        "ellipsis" => "ellipsis",
        _ => return None,
    };
    Some(type_name.to_string())
}

fn first_error<'tree>(node: Node<'tree>) -> Option<Node<'tree>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'tree>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}
