//! Declared-name table shared by the compiler and the decompiler.
//!
//! Built once, before any rendering, from the top-level assignments of a
//! [`Document`] or the top-level sections of a document tree. Only the kinds
//! that can be referenced by a bare name are tracked: parameters, conditions,
//! resources and mappings.

use std::collections::HashSet;

use serde_json::Value;

use crate::ast::{intrinsics, DeclarationKind, Document, Expr, Statement};

/// Wrapper form a bare name renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// `{"Ref": name}`
    Ref,
    /// `{"Condition": name}`
    Condition,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    parameters: HashSet<String>,
    conditions: HashSet<String>,
    resources: HashSet<String>,
    mappings: HashSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: &Document) -> Self {
        let mut table = SymbolTable::new();
        for statement in &document.statements {
            if let Statement::Assignment(assignment) = statement {
                if let Expr::Declaration(declaration) = &assignment.value {
                    table.declare(declaration.kind(), &assignment.name);
                }
            }
        }
        table
    }

    /// Reads the entry names of `Parameters`, `Conditions`, `Resources` and
    /// `Mappings`. Sections that are not objects are ignored here and
    /// reported by the decompiler.
    pub fn from_tree(tree: &Value) -> Self {
        let mut table = SymbolTable::new();
        for kind in DeclarationKind::ALL {
            if let Some(Value::Object(entries)) = tree.get(kind.section_key()) {
                for name in entries.keys() {
                    table.declare(kind, name);
                }
            }
        }
        table
    }

    pub fn declare(&mut self, kind: DeclarationKind, name: &str) {
        let names = match kind {
            DeclarationKind::Parameter => &mut self.parameters,
            DeclarationKind::Condition => &mut self.conditions,
            DeclarationKind::Resource => &mut self.resources,
            DeclarationKind::Mapping => &mut self.mappings,
            DeclarationKind::Output | DeclarationKind::Rule => return,
        };
        names.insert(name.to_string());
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.parameters.contains(name)
    }

    pub fn is_condition(&self, name: &str) -> bool {
        self.conditions.contains(name)
    }

    pub fn is_resource(&self, name: &str) -> bool {
        self.resources.contains(name)
    }

    pub fn is_mapping(&self, name: &str) -> bool {
        self.mappings.contains(name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.is_parameter(name)
            || self.is_condition(name)
            || self.is_resource(name)
            || self.is_mapping(name)
    }

    /// How a bare `name` renders, or `None` when it is neither declared nor a
    /// pseudo parameter.
    ///
    /// Parameters win over conditions of the same name.
    pub fn resolve(&self, name: &str) -> Option<Reference> {
        if intrinsics::is_pseudo(name) {
            return Some(Reference::Ref);
        }
        if self.is_condition(name) && !self.is_parameter(name) {
            return Some(Reference::Condition);
        }
        if self.is_declared(name) {
            return Some(Reference::Ref);
        }
        None
    }
}
