use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// A named, typed slot: a function parameter or a class field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,
}

/// Class-level annotated assignment (`name: Type`)
pub type Field = Parameter;

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,

    /// Positional parameters in declaration order
    pub parameters: Vec<Parameter>,

    /// Declared or inferred return types, deduplicated
    pub return_types: Vec<String>,

    /// Raw source text of the function body
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    /// Name of the owning class
    pub receiver: String,

    pub function: FunctionRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub fields: Vec<Field>,
    pub methods: Vec<MethodRecord>,
}

/// A class classified as an interface; receiver and field data are dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    pub methods: Vec<FunctionRecord>,
}

impl From<ClassRecord> for InterfaceRecord {
    fn from(class: ClassRecord) -> Self {
        Self {
            name: class.name,
            methods: class.methods.into_iter().map(|m| m.function).collect(),
        }
    }
}

/// Where a file sits in the project: its root-relative path and module name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub path: String,
    pub module: String,
}

/// Everything extracted from one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File path relative to the project root
    pub path: String,

    /// Dotted module name
    pub module: String,

    pub classes: Vec<ClassRecord>,
    pub interfaces: Vec<InterfaceRecord>,
    pub functions: Vec<FunctionRecord>,
}

impl FileRecord {
    /// Record with no declarations, used for files that could not be parsed
    pub fn empty(location: FileLocation) -> Self {
        Self {
            path: location.path,
            module: location.module,
            classes: Vec::new(),
            interfaces: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.interfaces.is_empty() && self.functions.is_empty()
    }
}

/// Result of walking a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Base name of the walked directory
    pub name: String,

    pub files: Vec<FileRecord>,
}

/// Top-level output document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    File(FileRecord),
    Project(ProjectRecord),
}

/// File records bucketed by module name, in first-seen module order
#[derive(Debug, Default)]
pub struct ModuleGroups {
    order: Vec<String>,
    groups: HashMap<String, Vec<FileRecord>>,
}

impl ModuleGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: FileRecord) {
        if !self.groups.contains_key(&record.module) {
            self.order.push(record.module.clone());
        }
        self.groups
            .entry(record.module.clone())
            .or_default()
            .push(record);
    }

    pub fn get(&self, module: &str) -> Option<&[FileRecord]> {
        self.groups.get(module).map(Vec::as_slice)
    }

    /// Module names in first-seen order
    pub fn modules(&self) -> &[String] {
        &self.order
    }

    /// Number of distinct modules
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Concatenate every bucket in module order
    pub fn into_files(mut self) -> Vec<FileRecord> {
        let mut files = Vec::new();
        for module in &self.order {
            if let Some(bucket) = self.groups.remove(module) {
                files.extend(bucket);
            }
        }
        files
    }
}

/// Write a value as JSON, two-space indented when `pretty`
pub fn save_to_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a JSON document back into typed records
pub fn load_from_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
