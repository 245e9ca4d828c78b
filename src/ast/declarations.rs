use std::fmt;

use crate::ast::Expr;

/// Named top-level constructs bound with `Name = <declaration>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `Resource AWS::S3::Bucket { ... } DependsOn(Topic)`
    Resource(Resource),
    /// `Parameter { Type: "String" }`
    Parameter(Expr),
    /// `Output { Value: Bucket.Arn }`
    Output(Expr),
    /// `Mapping { "us-east-1": { Ami: "ami-1" } }`
    Mapping(Expr),
    /// `Condition Env == "prod"`
    Condition(Expr),
    /// `Rule { Assertions: [...] }`
    Rule(Expr),
}

impl Declaration {
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::Resource(_) => DeclarationKind::Resource,
            Declaration::Parameter(_) => DeclarationKind::Parameter,
            Declaration::Output(_) => DeclarationKind::Output,
            Declaration::Mapping(_) => DeclarationKind::Mapping,
            Declaration::Condition(_) => DeclarationKind::Condition,
            Declaration::Rule(_) => DeclarationKind::Rule,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Parameter,
    Mapping,
    Condition,
    Resource,
    Output,
    Rule,
}

impl DeclarationKind {
    /// Decompile order.
    pub const ALL: [DeclarationKind; 6] = [
        DeclarationKind::Parameter,
        DeclarationKind::Mapping,
        DeclarationKind::Condition,
        DeclarationKind::Resource,
        DeclarationKind::Output,
        DeclarationKind::Rule,
    ];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        DeclarationKind::ALL
            .into_iter()
            .find(|kind| kind.keyword() == keyword)
    }

    /// Source keyword, e.g. `Parameter`.
    pub fn keyword(self) -> &'static str {
        match self {
            DeclarationKind::Parameter => "Parameter",
            DeclarationKind::Mapping => "Mapping",
            DeclarationKind::Condition => "Condition",
            DeclarationKind::Resource => "Resource",
            DeclarationKind::Output => "Output",
            DeclarationKind::Rule => "Rule",
        }
    }

    /// Top-level document key the declaration lands in, e.g. `Parameters`.
    pub fn section_key(self) -> &'static str {
        match self {
            DeclarationKind::Parameter => "Parameters",
            DeclarationKind::Mapping => "Mappings",
            DeclarationKind::Condition => "Conditions",
            DeclarationKind::Resource => "Resources",
            DeclarationKind::Output => "Outputs",
            DeclarationKind::Rule => "Rules",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub resource_type: ResourceType,
    /// `None` when no property object was written; `Some` of an empty object
    /// literal for an explicit `{}`.
    pub properties: Option<Expr>,
    pub attributes: Vec<ResourceAttribute>,
}

/// Resource type, either a `::` path of identifiers or a quoted string.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceType {
    Path(Vec<String>),
    Quoted(String),
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Path(segments) => f.write_str(&segments.join("::")),
            ResourceType::Quoted(name) => f.write_str(name),
        }
    }
}

/// A chained `Name(expr)` modifier after a resource body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAttribute {
    pub kind: AttributeKind,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    DependsOn,
    Condition,
    DeletionPolicy,
    UpdateReplacePolicy,
    CreationPolicy,
    UpdatePolicy,
    Metadata,
    Version,
}

impl AttributeKind {
    /// Emission order used by the decompiler.
    pub const ALL: [AttributeKind; 8] = [
        AttributeKind::DependsOn,
        AttributeKind::Condition,
        AttributeKind::DeletionPolicy,
        AttributeKind::UpdateReplacePolicy,
        AttributeKind::CreationPolicy,
        AttributeKind::UpdatePolicy,
        AttributeKind::Metadata,
        AttributeKind::Version,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        AttributeKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Both the modifier spelling and the resource field it fills.
    pub fn name(self) -> &'static str {
        match self {
            AttributeKind::DependsOn => "DependsOn",
            AttributeKind::Condition => "Condition",
            AttributeKind::DeletionPolicy => "DeletionPolicy",
            AttributeKind::UpdateReplacePolicy => "UpdateReplacePolicy",
            AttributeKind::CreationPolicy => "CreationPolicy",
            AttributeKind::UpdatePolicy => "UpdatePolicy",
            AttributeKind::Metadata => "Metadata",
            AttributeKind::Version => "Version",
        }
    }

    /// Attachment fields that take bare declared names instead of references.
    pub fn takes_names(self) -> bool {
        matches!(self, AttributeKind::DependsOn | AttributeKind::Condition)
    }
}
