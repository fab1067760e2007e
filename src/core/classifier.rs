use std::collections::HashSet;

use crate::config::ExtractionConfig;
use super::model::{ClassRecord, Field, FunctionRecord, InterfaceRecord, MethodRecord};
use super::type_expr::TypeExpr;

/// A class declaration as written, before classification
#[derive(Debug, Clone)]
pub struct DeclaredClass {
    pub name: String,
    pub bases: Vec<TypeExpr>,
    pub fields: Vec<Field>,
    pub methods: Vec<DeclaredMethod>,
}

#[derive(Debug, Clone)]
pub struct DeclaredMethod {
    pub decorators: Vec<TypeExpr>,
    pub function: FunctionRecord,
}

/// Outcome of classifying a class: exactly one of the two
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassKind {
    Class(ClassRecord),
    Interface(InterfaceRecord),
}

/// Name-based heuristic for interface-like classes.
///
/// A class is an interface when a base class name is in the marker set, or
/// when one of its own methods carries an abstract-method decorator.
#[derive(Debug, Clone)]
pub struct InterfaceClassifier {
    base_markers: HashSet<String>,
    abstract_markers: HashSet<String>,
}

impl InterfaceClassifier {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            base_markers: config.interface_bases.iter().cloned().collect(),
            abstract_markers: config.abstract_decorators.iter().cloned().collect(),
        }
    }

    pub fn is_interface(&self, class: &DeclaredClass) -> bool {
        let marker_base = class
            .bases
            .iter()
            .filter_map(TypeExpr::simple_name)
            .any(|name| self.base_markers.contains(name));

        marker_base
            || class
                .methods
                .iter()
                .flat_map(|method| method.decorators.iter())
                .filter_map(TypeExpr::simple_name)
                .any(|name| self.abstract_markers.contains(name))
    }

    pub fn classify(&self, class: DeclaredClass) -> ClassKind {
        let interface = self.is_interface(&class);
        let record = ClassRecord {
            methods: class
                .methods
                .into_iter()
                .map(|method| MethodRecord {
                    receiver: class.name.clone(),
                    function: method.function,
                })
                .collect(),
            name: class.name,
            fields: class.fields,
        };

        if interface {
            ClassKind::Interface(record.into())
        } else {
            ClassKind::Class(record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> TypeExpr {
        TypeExpr::Name(value.to_string())
    }

    fn dotted(module: &str, attr: &str) -> TypeExpr {
        TypeExpr::Attribute {
            value: Box::new(name(module)),
            attr: attr.to_string(),
        }
    }

    fn method(fn_name: &str, decorators: Vec<TypeExpr>) -> DeclaredMethod {
        DeclaredMethod {
            decorators,
            function: FunctionRecord {
                name: fn_name.to_string(),
                parameters: vec![],
                return_types: vec!["None".to_string()],
                body: "pass".to_string(),
            },
        }
    }

    fn class(bases: Vec<TypeExpr>, methods: Vec<DeclaredMethod>) -> DeclaredClass {
        DeclaredClass {
            name: "Repository".to_string(),
            bases,
            fields: vec![Field::new("size", "int")],
            methods,
        }
    }

    fn classifier() -> InterfaceClassifier {
        InterfaceClassifier::new(&ExtractionConfig::default())
    }

    #[test]
    fn test_marker_base_is_interface_even_when_concrete() {
        let classifier = classifier();
        assert!(classifier.is_interface(&class(vec![name("ABC")], vec![method("run", vec![])])));
        assert!(classifier.is_interface(&class(vec![dotted("typing", "Protocol")], vec![])));
        assert!(classifier.is_interface(&class(
            vec![TypeExpr::Subscript {
                value: Box::new(name("Protocol")),
                slice: Box::new(name("T")),
            }],
            vec![],
        )));
    }

    #[test]
    fn test_abstract_method_without_marker_base() {
        let classifier = classifier();
        let declared = class(
            vec![name("Base")],
            vec![
                method("plain", vec![name("staticmethod")]),
                method("find", vec![dotted("abc", "abstractmethod")]),
            ],
        );
        assert!(classifier.is_interface(&declared));
    }

    #[test]
    fn test_neither_rule_is_ordinary_class() {
        let classifier = classifier();
        let declared = class(
            vec![name("Entity"), dotted("abc", "ABCMeta")],
            vec![method("save", vec![name("property")])],
        );
        assert!(!classifier.is_interface(&declared));
        assert!(!classifier.is_interface(&class(vec![], vec![])));
    }

    #[test]
    fn test_classify_projects_interfaces() {
        let classifier = classifier();
        let declared = class(vec![name("ABC")], vec![method("find", vec![name("abstractmethod")])]);

        match classifier.classify(declared) {
            ClassKind::Interface(interface) => {
                assert_eq!(interface.name, "Repository");
                assert_eq!(interface.methods.len(), 1);
                assert_eq!(interface.methods[0].name, "find");
            }
            other => panic!("expected interface, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_sets_receiver_on_classes() {
        let classifier = classifier();
        match classifier.classify(class(vec![], vec![method("save", vec![])])) {
            ClassKind::Class(record) => {
                assert_eq!(record.fields, vec![Field::new("size", "int")]);
                assert_eq!(record.methods[0].receiver, "Repository");
                assert_eq!(record.methods[0].function.name, "save");
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_marker_sets_come_from_config() {
        let config = ExtractionConfig {
            interface_bases: vec!["Port".to_string()],
            abstract_decorators: vec!["contract".to_string()],
            ..ExtractionConfig::default()
        };
        let classifier = InterfaceClassifier::new(&config);

        assert!(classifier.is_interface(&class(vec![name("Port")], vec![])));
        assert!(classifier.is_interface(&class(vec![], vec![method("f", vec![name("contract")])])));
        assert!(!classifier.is_interface(&class(vec![name("ABC")], vec![])));
    }
}
