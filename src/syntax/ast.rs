//! Typed views over syntax nodes.

use super::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

pub(crate) trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

macro_rules! ast_node {
    ($name:ident, $($kind:ident)|+) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub(crate) struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$kind)|+)
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                Self::can_cast(node.kind()).then(|| Self(node))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(CompilationUnit, CompilationUnit);
ast_node!(UsingDirective, UsingDirective);
ast_node!(NamespaceDecl, NamespaceDecl | FileScopedNamespaceDecl);
ast_node!(TypeDecl, TypeDecl | EnumDecl | DelegateDecl);
ast_node!(MethodDecl, MethodDecl);
ast_node!(ConstructorDecl, ConstructorDecl);
ast_node!(PropertyDecl, PropertyDecl);
ast_node!(IndexerDecl, IndexerDecl);
ast_node!(Accessor, Accessor);
ast_node!(Parameter, Parameter);
ast_node!(Block, Block);
ast_node!(ExpressionStatement, ExpressionStatement);
ast_node!(Invocation, Invocation);
ast_node!(Argument, Argument);
ast_node!(MemberAccess, MemberAccess);
ast_node!(GenericName, GenericName);
ast_node!(IdentifierName, IdentifierName);
ast_node!(Binary, Binary);

/// Node kinds that denote a type in a type context.
pub(crate) fn is_type_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::PredefinedType
            | SyntaxKind::IdentifierName
            | SyntaxKind::GenericName
            | SyntaxKind::QualifiedName
            | SyntaxKind::NullableType
            | SyntaxKind::ArrayType
            | SyntaxKind::PointerType
            | SyntaxKind::TupleType
    )
}

/// Identifier text without the verbatim `@` prefix.
pub(crate) fn identifier_text(token: &SyntaxToken) -> &str {
    token.text().strip_prefix('@').unwrap_or(token.text())
}

/// Source text of a node with all trivia removed, e.g. `System . Text` -> `System.Text`.
pub(crate) fn compact_text(node: &SyntaxNode) -> String {
    let mut tokens = Vec::new();
    collect_tokens(node, &mut tokens);
    tokens.iter().map(SyntaxToken::text).collect()
}

pub(crate) fn collect_tokens(node: &SyntaxNode, out: &mut Vec<SyntaxToken>) {
    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Token(token) => out.push(token),
            SyntaxElement::Node(child) => collect_tokens(&child, out),
        }
    }
}

pub(crate) fn has_modifier(node: &SyntaxNode, modifier: &str) -> bool {
    node.children_with_tokens()
        .into_iter()
        .take_while(|element| match element {
            SyntaxElement::Token(_) => true,
            SyntaxElement::Node(child) => child.kind() == SyntaxKind::AttributeList,
        })
        .filter_map(SyntaxElement::into_token)
        .any(|token| token.is_keyword(modifier))
}

/// The declared name: the last identifier before the declaration's
/// parameter, accessor or body part.
fn declared_name(node: &SyntaxNode) -> Option<SyntaxToken> {
    let mut name = None;
    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Token(token) if token.kind() == SyntaxKind::Ident => name = Some(token),
            SyntaxElement::Token(token) if token.is_punct(".") => {}
            SyntaxElement::Token(_) => return name,
            SyntaxElement::Node(child) => {
                let stops = matches!(
                    child.kind(),
                    SyntaxKind::TypeParameterList
                        | SyntaxKind::ParameterList
                        | SyntaxKind::BracketedParameterList
                        | SyntaxKind::AccessorList
                        | SyntaxKind::ArrowExpression
                        | SyntaxKind::EqualsValue
                        | SyntaxKind::BaseList
                        | SyntaxKind::ConstraintClause
                        | SyntaxKind::Block
                );
                if stops {
                    return name;
                }
            }
        }
    }
    name
}

fn type_child(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.children().find(|child| is_type_kind(child.kind()))
}

impl CompilationUnit {
    /// Every using directive of the file, at any nesting level.
    pub(crate) fn all_usings(&self) -> impl Iterator<Item = UsingDirective> + use<> {
        self.0.descendants().filter_map(UsingDirective::cast)
    }
}

impl UsingDirective {
    pub(crate) fn is_static(&self) -> bool {
        self.0.child_tokens().any(|token| token.is_keyword("static"))
    }

    pub(crate) fn alias(&self) -> Option<String> {
        let tokens: Vec<SyntaxToken> = self.0.child_tokens().collect();
        tokens
            .windows(2)
            .find(|pair| pair[1].is_punct("="))
            .map(|pair| identifier_text(&pair[0]).to_string())
    }

    pub(crate) fn target(&self) -> Option<SyntaxNode> {
        type_child(&self.0)
    }

    /// Dotted name of the imported namespace or aliased type.
    pub(crate) fn target_text(&self) -> Option<String> {
        self.target().map(|target| compact_text(&target))
    }
}

impl NamespaceDecl {
    pub(crate) fn name(&self) -> Option<String> {
        type_child(&self.0).map(|name| compact_text(&name))
    }
}

impl TypeDecl {
    pub(crate) fn name(&self) -> Option<String> {
        declared_name(&self.0).map(|token| identifier_text(&token).to_string())
    }

    pub(crate) fn keyword(&self) -> Option<SyntaxToken> {
        self.0.child_tokens().find(|token| {
            ["class", "struct", "interface", "record", "enum", "delegate"]
                .iter()
                .any(|keyword| token.is_keyword(keyword))
        })
    }

    pub(crate) fn is_value_type(&self) -> bool {
        self.0.kind() == SyntaxKind::EnumDecl
            || self.0.child_tokens().any(|token| token.is_keyword("struct"))
    }

    pub(crate) fn type_parameters(&self) -> Vec<String> {
        type_parameter_names(&self.0)
    }

    pub(crate) fn is_public_or_protected(&self) -> bool {
        has_modifier(&self.0, "public") || has_modifier(&self.0, "protected")
    }
}

pub(crate) fn type_parameter_names(node: &SyntaxNode) -> Vec<String> {
    node.first_child_of(SyntaxKind::TypeParameterList)
        .map(|list| {
            list.children()
                .filter_map(|parameter| parameter.child_tokens().last())
                .map(|token| identifier_text(&token).to_string())
                .collect()
        })
        .unwrap_or_default()
}

impl MethodDecl {
    pub(crate) fn name(&self) -> Option<String> {
        declared_name(&self.0).map(|token| identifier_text(&token).to_string())
    }

    pub(crate) fn return_type(&self) -> Option<SyntaxNode> {
        type_child(&self.0)
    }

    pub(crate) fn parameters(&self) -> Vec<Parameter> {
        parameters_of(&self.0, SyntaxKind::ParameterList)
    }

    pub(crate) fn body(&self) -> Option<Block> {
        self.0.children().find_map(Block::cast)
    }
}

impl ConstructorDecl {
    pub(crate) fn name(&self) -> Option<String> {
        declared_name(&self.0).map(|token| identifier_text(&token).to_string())
    }

    pub(crate) fn parameters(&self) -> Vec<Parameter> {
        parameters_of(&self.0, SyntaxKind::ParameterList)
    }

    pub(crate) fn body(&self) -> Option<Block> {
        self.0.children().find_map(Block::cast)
    }
}

impl PropertyDecl {
    pub(crate) fn name(&self) -> Option<String> {
        declared_name(&self.0).map(|token| identifier_text(&token).to_string())
    }

    pub(crate) fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.0)
    }
}

impl IndexerDecl {
    pub(crate) fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.0)
    }

    pub(crate) fn parameters(&self) -> Vec<Parameter> {
        parameters_of(&self.0, SyntaxKind::BracketedParameterList)
    }

    pub(crate) fn accessors(&self) -> Vec<Accessor> {
        accessors_of(&self.0)
    }
}

fn parameters_of(node: &SyntaxNode, list: SyntaxKind) -> Vec<Parameter> {
    node.first_child_of(list)
        .map(|list| list.children().filter_map(Parameter::cast).collect())
        .unwrap_or_default()
}

fn accessors_of(node: &SyntaxNode) -> Vec<Accessor> {
    node.first_child_of(SyntaxKind::AccessorList)
        .map(|list| list.children().filter_map(Accessor::cast).collect())
        .unwrap_or_default()
}

impl Accessor {
    pub(crate) fn keyword(&self) -> Option<SyntaxToken> {
        self.0.child_tokens().find(|token| {
            ["get", "set", "init", "add", "remove"]
                .iter()
                .any(|keyword| token.is_keyword(keyword))
        })
    }

    /// `set` and `init` accessors receive the implicit `value` parameter.
    pub(crate) fn is_setter(&self) -> bool {
        self.keyword()
            .is_some_and(|token| token.is_keyword("set") || token.is_keyword("init"))
    }

    pub(crate) fn body(&self) -> Option<Block> {
        self.0.children().find_map(Block::cast)
    }

    /// The property or indexer declaring this accessor.
    pub(crate) fn owner(&self) -> Option<SyntaxNode> {
        self.0.parent().and_then(|list| list.parent())
    }
}

impl Parameter {
    pub(crate) fn name(&self) -> Option<String> {
        self.0
            .child_tokens()
            .filter(|token| token.kind() == SyntaxKind::Ident)
            .last()
            .map(|token| identifier_text(&token).to_string())
    }

    pub(crate) fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.0)
    }

    pub(crate) fn default_value(&self) -> Option<SyntaxNode> {
        self.0
            .first_child_of(SyntaxKind::EqualsValue)
            .and_then(|equals| equals.children().next())
    }

    /// The method, constructor, indexer or lambda owning the parameter list.
    pub(crate) fn owner(&self) -> Option<SyntaxNode> {
        self.0.parent().and_then(|list| list.parent())
    }
}

impl Block {
    pub(crate) fn statements(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.0.children()
    }

    pub(crate) fn open_brace(&self) -> Option<SyntaxToken> {
        self.0.child_tokens().find(|token| token.is_punct("{"))
    }

    pub(crate) fn close_brace(&self) -> Option<SyntaxToken> {
        self.0.child_tokens().filter(|token| token.is_punct("}")).last()
    }
}

impl ExpressionStatement {
    pub(crate) fn expression(&self) -> Option<SyntaxNode> {
        self.0.children().next()
    }
}

impl Invocation {
    pub(crate) fn expression(&self) -> Option<SyntaxNode> {
        self.0.children().next()
    }

    pub(crate) fn arguments(&self) -> Vec<Argument> {
        self.0
            .first_child_of(SyntaxKind::ArgumentList)
            .map(|list| list.children().filter_map(Argument::cast).collect())
            .unwrap_or_default()
    }
}

impl Argument {
    pub(crate) fn expression(&self) -> Option<SyntaxNode> {
        self.0.children().last()
    }
}

impl MemberAccess {
    pub(crate) fn receiver(&self) -> Option<SyntaxNode> {
        self.0.children().next()
    }

    /// The accessed member, an identifier or a generic name.
    pub(crate) fn name(&self) -> Option<SyntaxNode> {
        self.0.children().nth(1)
    }
}

impl GenericName {
    pub(crate) fn identifier(&self) -> Option<String> {
        self.0
            .child_tokens()
            .next()
            .map(|token| identifier_text(&token).to_string())
    }

    pub(crate) fn type_arguments(&self) -> Vec<SyntaxNode> {
        self.0
            .first_child_of(SyntaxKind::TypeArgumentList)
            .map(|list| list.children().collect())
            .unwrap_or_default()
    }
}

impl IdentifierName {
    pub(crate) fn text(&self) -> String {
        self.0
            .child_tokens()
            .next()
            .map(|token| identifier_text(&token).to_string())
            .unwrap_or_default()
    }
}

impl Binary {
    pub(crate) fn left(&self) -> Option<SyntaxNode> {
        self.0.children().next()
    }

    pub(crate) fn right(&self) -> Option<SyntaxNode> {
        self.0.children().nth(1)
    }

    pub(crate) fn operator(&self) -> String {
        self.0.child_tokens().map(|token| token.text().to_string()).collect()
    }
}

/// Strips any number of enclosing parentheses.
pub(crate) fn skip_parentheses(node: &SyntaxNode) -> SyntaxNode {
    let mut current = node.clone();
    while current.kind() == SyntaxKind::Parenthesized {
        match current.children().next() {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

pub(crate) fn is_null_literal(node: &SyntaxNode) -> bool {
    node.kind() == SyntaxKind::Literal && node.child_tokens().any(|token| token.is_keyword("null"))
}
