//! Lossless syntax model for the C# subset the contract refactorings operate on.

pub(crate) mod ast;
pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod tree;

pub(crate) use tree::{GreenElement, GreenNode, GreenToken, SyntaxElement, SyntaxNode, SyntaxToken};

use thiserror::Error;

/// Token and node kinds of the syntax tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) enum SyntaxKind {
    // tokens
    Ident,
    NumericLiteral,
    StringLiteral,
    CharLiteral,
    Punct,
    Eof,

    // declarations
    CompilationUnit,
    ExternAlias,
    UsingDirective,
    NamespaceDecl,
    FileScopedNamespaceDecl,
    TypeDecl,
    EnumDecl,
    DelegateDecl,
    AttributeList,
    TypeParameterList,
    TypeParameter,
    ConstraintClause,
    BaseList,
    MethodDecl,
    ConstructorDecl,
    ConstructorInitializer,
    DestructorDecl,
    OperatorDecl,
    PropertyDecl,
    IndexerDecl,
    EventDecl,
    FieldDecl,
    UnknownMember,
    ParameterList,
    BracketedParameterList,
    Parameter,
    EqualsValue,
    ArrowExpression,
    AccessorList,
    Accessor,

    // types
    PredefinedType,
    IdentifierName,
    GenericName,
    TypeArgumentList,
    QualifiedName,
    NullableType,
    ArrayType,
    ArrayRankSpecifier,
    PointerType,
    TupleType,
    TupleElement,

    // statements
    Block,
    ExpressionStatement,
    ReturnStatement,
    ThrowStatement,
    IfStatement,
    ElseClause,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForEachStatement,
    LocalDeclaration,
    VariableDeclarator,
    BreakStatement,
    ContinueStatement,
    EmptyStatement,
    TryStatement,
    CatchClause,
    FinallyClause,
    UsingStatement,
    LockStatement,
    YieldStatement,
    SwitchStatement,
    UnknownStatement,

    // expressions
    Literal,
    MemberAccess,
    Invocation,
    ArgumentList,
    Argument,
    ElementAccess,
    BracketedArgumentList,
    Binary,
    Unary,
    Postfix,
    Parenthesized,
    Cast,
    Conditional,
    Assignment,
    Lambda,
    ObjectCreation,
    ArrayCreation,
    Initializer,
    ThisExpression,
    BaseExpression,
    TypeOf,
    DefaultExpression,
    IsPattern,
    AsExpression,
    ThrowExpression,
    TupleExpression,
    SwitchExpression,
    DeclarationExpression,
}

impl SyntaxKind {
    /// Declarations that own a parameter list and a statement body.
    pub(crate) fn is_function_like(self) -> bool {
        matches!(
            self,
            SyntaxKind::MethodDecl
                | SyntaxKind::ConstructorDecl
                | SyntaxKind::DestructorDecl
                | SyntaxKind::OperatorDecl
                | SyntaxKind::IndexerDecl
                | SyntaxKind::Accessor
        )
    }
}

/// Error raised when source text cannot be turned into a syntax tree.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{message} at line {line}, column {column}")]
pub(crate) struct SyntaxError {
    pub(crate) message: String,
    pub(crate) offset: usize,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl SyntaxError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}

/// One-based line and column of a byte offset.
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|index| index + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Byte offset of a one-based line and column, or `None` when the position
/// lies outside the text. The column may point just past the line end.
pub(crate) fn offset_of(source: &str, line: usize, column: usize) -> Option<usize> {
    let line_start = if line == 1 {
        0
    } else {
        source.match_indices('\n').nth(line.checked_sub(2)?)?.0 + 1
    };
    let rest = &source[line_start..];
    let text = rest.split('\n').next().unwrap_or(rest);
    let column = column.checked_sub(1)?;
    if column == text.chars().count() {
        return Some(line_start + text.len());
    }
    text.char_indices()
        .nth(column)
        .map(|(index, _)| line_start + index)
}

/// Reserved C# keywords that can never be used as plain identifiers.
pub(crate) fn is_reserved_keyword(text: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
        "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
        "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
        "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
        "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
        "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
        "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
        "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
        "void", "volatile", "while",
    ];
    KEYWORDS.contains(&text)
}

/// Keywords naming built-in types.
pub(crate) fn is_predefined_type(text: &str) -> bool {
    matches!(
        text,
        "bool"
            | "byte"
            | "sbyte"
            | "char"
            | "decimal"
            | "double"
            | "float"
            | "int"
            | "uint"
            | "long"
            | "ulong"
            | "short"
            | "ushort"
            | "object"
            | "string"
            | "void"
    )
}
