//! Type annotations as a closed expression tree.
//!
//! Annotation nodes from the syntax tree are lowered into [`TypeExpr`] once,
//! and rendering is a total match over it. Nodes outside the modelled set keep
//! their source text, so rendering never fails.

use std::fmt;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Plain name: `int`
    Name(String),

    /// Qualified access: `datetime.datetime`
    Attribute { value: Box<TypeExpr>, attr: String },

    /// Generic subscript: `List[str]`. Several arguments arrive as one tuple.
    Subscript { value: Box<TypeExpr>, slice: Box<TypeExpr> },

    /// Tuple of type expressions: `(int, str)`
    Tuple(Vec<TypeExpr>),

    /// Literal constant, already in its textual value form
    Constant(String),

    /// Bare list display, e.g. the argument list of `Callable[[int], str]`
    List,

    /// Bare dict display
    Dict,

    /// Anything else, kept verbatim
    Other(String),
}

impl TypeExpr {
    /// Lower a syntax tree annotation node
    pub fn from_node(node: Node, source: &str) -> Self {
        match node.kind() {
            "type" | "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => Self::from_node(inner, source),
                None => Self::Other(node_text(node, source).to_string()),
            },
            "identifier" => Self::Name(node_text(node, source).to_string()),
            "attribute" => {
                let value = node.child_by_field_name("object");
                let attr = node.child_by_field_name("attribute");
                match (value, attr) {
                    (Some(value), Some(attr)) => Self::Attribute {
                        value: Box::new(Self::from_node(value, source)),
                        attr: node_text(attr, source).to_string(),
                    },
                    _ => Self::Other(node_text(node, source).to_string()),
                }
            }
            "member_type" => {
                let mut cursor = node.walk();
                let parts: Vec<Node> = node.named_children(&mut cursor).collect();
                match parts.as_slice() {
                    [value, attr] => Self::Attribute {
                        value: Box::new(Self::from_node(*value, source)),
                        attr: node_text(*attr, source).to_string(),
                    },
                    _ => Self::Other(node_text(node, source).to_string()),
                }
            }
            "subscript" => {
                let Some(value) = node.child_by_field_name("value") else {
                    return Self::Other(node_text(node, source).to_string());
                };
                let mut cursor = node.walk();
                let args: Vec<TypeExpr> = node
                    .children_by_field_name("subscript", &mut cursor)
                    .map(|arg| Self::from_node(arg, source))
                    .collect();
                Self::subscript(Self::from_node(value, source), args)
                    .unwrap_or_else(|| Self::Other(node_text(node, source).to_string()))
            }
            "generic_type" => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                let (Some(base), Some(params)) = (children.first(), children.get(1)) else {
                    return Self::Other(node_text(node, source).to_string());
                };
                let mut param_cursor = params.walk();
                let args: Vec<TypeExpr> = params
                    .named_children(&mut param_cursor)
                    .filter(|child| child.kind() != "comment")
                    .map(|arg| Self::from_node(arg, source))
                    .collect();
                Self::subscript(Self::from_node(*base, source), args)
                    .unwrap_or_else(|| Self::Other(node_text(node, source).to_string()))
            }
            "tuple" => {
                let mut cursor = node.walk();
                let elements = node
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() != "comment")
                    .map(|element| Self::from_node(element, source))
                    .collect();
                Self::Tuple(elements)
            }
            "string" => Self::Constant(string_value(node_text(node, source)).to_string()),
            "concatenated_string" => {
                let mut cursor = node.walk();
                let value: String = node
                    .named_children(&mut cursor)
                    .filter(|part| part.kind() == "string")
                    .map(|part| string_value(node_text(part, source)))
                    .collect();
                Self::Constant(value)
            }
            "integer" | "float" => Self::Constant(node_text(node, source).to_string()),
            "true" => Self::Constant("True".to_string()),
            "false" => Self::Constant("False".to_string()),
            "none" => Self::Constant("None".to_string()),
            "ellipsis" => Self::Constant("Ellipsis".to_string()),
            "list" => Self::List,
            "dictionary" => Self::Dict,
            _ => Self::Other(node_text(node, source).to_string()),
        }
    }

    fn subscript(value: TypeExpr, mut args: Vec<TypeExpr>) -> Option<Self> {
        let slice = match args.len() {
            0 => return None,
            1 => args.remove(0),
            _ => Self::Tuple(args),
        };
        Some(Self::Subscript {
            value: Box::new(value),
            slice: Box::new(slice),
        })
    }

    /// Canonical string form
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Last segment of a name-like expression; subscripts report their base
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Attribute { attr, .. } => Some(attr),
            Self::Subscript { value, .. } => value.simple_name(),
            _ => None,
        }
    }

    /// Rendered members of a `Union[...]` annotation
    pub fn union_members(&self) -> Option<Vec<String>> {
        let Self::Subscript { value, slice } = self else {
            return None;
        };
        if value.simple_name() != Some("Union") {
            return None;
        }
        Some(match slice.as_ref() {
            Self::Tuple(members) => members.iter().map(TypeExpr::render).collect(),
            single => vec![single.render()],
        })
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Attribute { value, attr } => match value.as_ref() {
                Self::Name(_) | Self::Attribute { .. } => write!(f, "{}.{}", value, attr),
                _ => f.write_str(attr),
            },
            Self::Subscript { value, slice } => match slice.as_ref() {
                Self::Tuple(args) => write!(f, "{}[{}]", value, join(args)),
                single => write!(f, "{}[{}]", value, single),
            },
            Self::Tuple(elements) => write!(f, "Tuple[{}]", join(elements)),
            Self::Constant(value) => f.write_str(value),
            Self::List => f.write_str("List"),
            Self::Dict => f.write_str("Dict"),
            Self::Other(text) => f.write_str(text),
        }
    }
}

fn join(items: &[TypeExpr]) -> String {
    items
        .iter()
        .map(TypeExpr::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source text of a node; empty when the range is not valid for `source`
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Split a string literal into its lowercase prefix letters and its body
pub fn split_string_literal(literal: &str) -> (String, &str) {
    let quote_start = literal
        .find(|c| c == '"' || c == '\'')
        .unwrap_or(literal.len());
    let prefix = literal[..quote_start].to_ascii_lowercase();
    let quoted = &literal[quote_start..];

    for delimiter in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= delimiter.len() * 2
            && quoted.starts_with(delimiter)
            && quoted.ends_with(delimiter)
        {
            return (prefix, &quoted[delimiter.len()..quoted.len() - delimiter.len()]);
        }
    }
    (prefix, quoted)
}

fn string_value(literal: &str) -> &str {
    split_string_literal(literal).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    /// Render the annotation of `x` in `x: <annotation>`
    fn render(annotation: &str) -> String {
        lower(annotation).render()
    }

    fn lower(annotation: &str) -> TypeExpr {
        let source = format!("x: {}\n", annotation);
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::language()).unwrap();
        let tree = parser.parse(&source, None).unwrap();
        let assignment = tree
            .root_node()
            .named_child(0)
            .and_then(|statement| statement.named_child(0))
            .unwrap();
        let annotation = assignment.child_by_field_name("type").unwrap();
        TypeExpr::from_node(annotation, &source)
    }

    fn name(value: &str) -> TypeExpr {
        TypeExpr::Name(value.to_string())
    }

    #[test]
    fn test_plain_and_qualified_names() {
        assert_eq!(render("int"), "int");
        assert_eq!(render("datetime.datetime"), "datetime.datetime");
        assert_eq!(render("a.b.c.Deep"), "a.b.c.Deep");
    }

    #[test]
    fn test_generic_subscripts() {
        assert_eq!(render("List[str]"), "List[str]");
        assert_eq!(render("Dict[int, T]"), "Dict[int, T]");
        assert_eq!(render("Optional[List[str]]"), "Optional[List[str]]");
        assert_eq!(render("typing.Optional[int]"), "typing.Optional[int]");
    }

    #[test]
    fn test_special_forms() {
        assert_eq!(render("Callable[[User], str]"), "Callable[List, str]");
        assert_eq!(render("Optional['Entity']"), "Optional[Entity]");
        assert_eq!(render("Literal[1, True, None]"), "Literal[1, True, None]");
        assert_eq!(render("Tuple[int, ...]"), "Tuple[int, Ellipsis]");
        assert_eq!(render("'Forward'"), "Forward");
    }

    #[test]
    fn test_bare_tuple_renders_as_tuple_generic() {
        assert_eq!(
            TypeExpr::Tuple(vec![name("A"), name("B")]).render(),
            "Tuple[A, B]"
        );
        let nested = TypeExpr::Subscript {
            value: Box::new(name("Set")),
            slice: Box::new(TypeExpr::Subscript {
                value: Box::new(name("Tuple")),
                slice: Box::new(TypeExpr::Tuple(vec![name("A"), TypeExpr::Tuple(vec![name("B")])])),
            }),
        };
        assert_eq!(nested.render(), "Set[Tuple[A, Tuple[B]]]");
    }

    #[test]
    fn test_unknown_nodes_keep_source_text() {
        assert_eq!(render("str | None"), "str | None");
        assert_eq!(TypeExpr::Dict.render(), "Dict");
    }

    #[test]
    fn test_subscript_nesting_survives_rendering() {
        let rendered = render("Dict[str, List[Optional[int]]]");
        assert_eq!(rendered, "Dict[str, List[Optional[int]]]");

        let mut depth = 0;
        let mut max_depth = 0;
        for c in rendered.chars() {
            match c {
                '[' => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                }
                ']' => depth -= 1,
                _ => {}
            }
        }
        assert_eq!(depth, 0);
        assert_eq!(max_depth, 3);
        assert!(rendered.starts_with("Dict["));
    }

    #[test]
    fn test_union_members() {
        assert_eq!(
            lower("Union[str, List[str]]").union_members(),
            Some(vec!["str".to_string(), "List[str]".to_string()])
        );
        assert_eq!(
            lower("typing.Union[int]").union_members(),
            Some(vec!["int".to_string()])
        );
        assert_eq!(lower("Optional[int]").union_members(), None);
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(lower("abc.ABC").simple_name(), Some("ABC"));
        assert_eq!(lower("Protocol[T]").simple_name(), Some("Protocol"));
        assert_eq!(lower("'Quoted'").simple_name(), None);
    }

    #[test]
    fn test_split_string_literal() {
        assert_eq!(split_string_literal("'a'"), (String::new(), "a"));
        assert_eq!(split_string_literal("b\"raw\""), ("b".to_string(), "raw"));
        assert_eq!(split_string_literal("F'''x'''"), ("f".to_string(), "x"));
    }
}
