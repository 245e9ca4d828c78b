use crate::ast::Expr;

/// Top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Binds a declaration to a name
    ///
    /// # Example
    /// ```text
    /// Env = Parameter { Type: "String" }
    /// "1Bucket" = Resource AWS::S3::Bucket
    /// ```
    Assignment(Assignment),

    /// Unnamed document-wide section
    ///
    /// # Example
    /// ```text
    /// Description "Example stack"
    /// ```
    Section(Section),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
    /// Source line of the name, for render errors.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub value: Expr,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    FormatVersion,
    Description,
    Transform,
    Metadata,
    Globals,
}

impl SectionKind {
    /// Decompile order.
    pub const ALL: [SectionKind; 5] = [
        SectionKind::FormatVersion,
        SectionKind::Description,
        SectionKind::Transform,
        SectionKind::Metadata,
        SectionKind::Globals,
    ];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        SectionKind::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }

    /// The source keyword, which is also the document key.
    pub fn keyword(self) -> &'static str {
        match self {
            SectionKind::FormatVersion => "AWSTemplateFormatVersion",
            SectionKind::Description => "Description",
            SectionKind::Transform => "Transform",
            SectionKind::Metadata => "Metadata",
            SectionKind::Globals => "Globals",
        }
    }
}

/// Document root: the ordered top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub statements: Vec<Statement>,
}
