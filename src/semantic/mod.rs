//! Resolution of type syntax and identifier expressions.
//!
//! The model knows the types declared in the document and a fixed catalog
//! of framework types. Anything else is unresolved, which callers treat as
//! "not nullable" and "no match".

pub(crate) mod catalog;
pub(crate) mod symbols;

pub(crate) use symbols::{ParameterSymbol, TypeKind, TypeParameterKind, TypeSymbol};

use crate::syntax::ast::{
    Accessor, AstNode, GenericName, IdentifierName, NamespaceDecl, Parameter, TypeDecl,
    UsingDirective, compact_text, identifier_text, type_parameter_names,
};
use crate::syntax::{SyntaxElement, SyntaxKind, SyntaxNode};

const CONTRACT_CLASS: &str = "System.Diagnostics.Contracts.Contract";

#[derive(Clone, Debug)]
struct DeclaredType {
    container: String,
    name: String,
    arity: usize,
    kind: TypeKind,
}

/// How far resolution may go: constraint checks resolve shallowly so that
/// `where T : IComparable<T>` does not recurse.
#[derive(Clone, Copy)]
struct Mode {
    aliases: bool,
    deep: bool,
}

const FULL: Mode = Mode {
    aliases: true,
    deep: true,
};

#[derive(Debug)]
pub(crate) struct SemanticModel {
    declared: Vec<DeclaredType>,
}

impl SemanticModel {
    pub(crate) fn new(root: &SyntaxNode) -> Self {
        let declared = root
            .descendants()
            .filter_map(TypeDecl::cast)
            .filter_map(|declaration| {
                let name = declaration.name()?;
                let kind = declared_kind(&declaration)?;
                Some(DeclaredType {
                    container: container_path(declaration.syntax()),
                    arity: declaration.type_parameters().len(),
                    name,
                    kind,
                })
            })
            .collect();
        Self { declared }
    }

    /// Resolves a type syntax node. `None` means the type is unknown.
    pub(crate) fn resolve_type(&self, ty: &SyntaxNode) -> Option<TypeSymbol> {
        self.resolve_with(ty, FULL)
    }

    fn resolve_with(&self, ty: &SyntaxNode, mode: Mode) -> Option<TypeSymbol> {
        match ty.kind() {
            SyntaxKind::PredefinedType => {
                let keyword = ty.first_token()?;
                predefined_symbol(keyword.text())
            }
            SyntaxKind::IdentifierName => {
                let name = IdentifierName::cast(ty.clone())?.text();
                match name.as_str() {
                    "dynamic" => Some(TypeSymbol::Dynamic),
                    "var" => None,
                    "nint" | "nuint" => predefined_symbol(&name),
                    _ => self.lookup(ty, &name, Vec::new(), mode),
                }
            }
            SyntaxKind::GenericName => {
                let generic = GenericName::cast(ty.clone())?;
                let name = generic.identifier()?;
                let arguments = self.type_arguments(&generic, mode);
                self.lookup(ty, &name, arguments, mode)
            }
            SyntaxKind::QualifiedName => self.resolve_qualified(ty, mode),
            SyntaxKind::NullableType => {
                let inner = self.resolve_with(&ty.children().next()?, mode)?;
                if inner.is_value_type() && !inner.is_nullable_value_type() {
                    Some(TypeSymbol::named("System", "Nullable", TypeKind::Struct, vec![Some(inner)]))
                } else {
                    Some(inner)
                }
            }
            SyntaxKind::ArrayType => {
                let element = ty.children().next().and_then(|element| self.resolve_with(&element, mode));
                Some(TypeSymbol::Array(element.map(Box::new)))
            }
            SyntaxKind::PointerType => {
                let element = ty.children().next().and_then(|element| self.resolve_with(&element, mode));
                Some(TypeSymbol::Pointer(element.map(Box::new)))
            }
            SyntaxKind::TupleType => {
                let elements = ty
                    .children()
                    .filter_map(|element| element.children().next())
                    .map(|element| self.resolve_with(&element, mode))
                    .collect();
                Some(TypeSymbol::named("System", "ValueTuple", TypeKind::Struct, elements))
            }
            _ => None,
        }
    }

    fn type_arguments(&self, generic: &GenericName, mode: Mode) -> Vec<Option<TypeSymbol>> {
        generic
            .type_arguments()
            .iter()
            .map(|argument| if mode.deep { self.resolve_with(argument, mode) } else { None })
            .collect()
    }

    fn lookup(
        &self,
        context: &SyntaxNode,
        name: &str,
        type_arguments: Vec<Option<TypeSymbol>>,
        mode: Mode,
    ) -> Option<TypeSymbol> {
        let arity = type_arguments.len();
        if arity == 0 {
            if let Some(declaration) = type_parameter_owner(context, name) {
                let kind = if mode.deep {
                    self.constraint_kind(&declaration, name)
                } else {
                    TypeParameterKind::Unconstrained
                };
                return Some(TypeSymbol::TypeParameter {
                    name: name.to_string(),
                    kind,
                });
            }
            if mode.aliases {
                if let Some(target) = alias_target(context, name) {
                    return self.resolve_with(&target, Mode { aliases: false, ..mode });
                }
            }
        }
        if let Some(declared) = self
            .declared
            .iter()
            .find(|declared| declared.name == name && declared.arity == arity)
        {
            return Some(TypeSymbol::named(&declared.container, name, declared.kind, type_arguments));
        }
        namespaces_in_scope(context).into_iter().find_map(|namespace| {
            catalog::find(&namespace, name, arity)
                .map(|kind| TypeSymbol::named(&namespace, name, kind, type_arguments.clone()))
        })
    }

    fn resolve_qualified(&self, ty: &SyntaxNode, mode: Mode) -> Option<TypeSymbol> {
        let mut segments = Vec::new();
        flatten_qualified(ty, &mut segments);
        let last = segments.pop()?;
        let mut prefix: Vec<String> = segments
            .iter()
            .map(|segment| simple_name(segment).unwrap_or_default())
            .collect();
        if prefix.first().is_some_and(|first| first == "global") {
            prefix.remove(0);
        } else if let Some(target) = prefix.first().and_then(|first| alias_target(ty, first)) {
            let mut expanded: Vec<String> = compact_text(&target).split('.').map(str::to_string).collect();
            expanded.extend(prefix.drain(1..));
            prefix = expanded;
        }
        let prefix = prefix.join(".");
        let (name, arguments) = match GenericName::cast(last.clone()) {
            Some(generic) => (generic.identifier()?, self.type_arguments(&generic, mode)),
            None => (simple_name(&last)?, Vec::new()),
        };
        let arity = arguments.len();
        if let Some(kind) = catalog::find(&prefix, &name, arity) {
            return Some(TypeSymbol::named(&prefix, &name, kind, arguments));
        }
        for namespace in enclosing_namespaces(ty) {
            let candidate = format!("{namespace}.{prefix}");
            if let Some(kind) = catalog::find(&candidate, &name, arity) {
                return Some(TypeSymbol::named(&candidate, &name, kind, arguments));
            }
        }
        let suffix = format!(".{prefix}");
        self.declared
            .iter()
            .find(|declared| {
                declared.name == name
                    && declared.arity == arity
                    && (declared.container == prefix || declared.container.ends_with(&suffix))
            })
            .map(|declared| TypeSymbol::named(&declared.container, &name, declared.kind, arguments))
    }

    fn constraint_kind(&self, declaration: &SyntaxNode, name: &str) -> TypeParameterKind {
        let clauses = declaration
            .children()
            .filter(|child| child.kind() == SyntaxKind::ConstraintClause)
            .filter(|clause| {
                clause
                    .child_tokens()
                    .nth(1)
                    .is_some_and(|token| identifier_text(&token) == name)
            });
        for clause in clauses {
            for element in clause.children_with_tokens() {
                match element {
                    SyntaxElement::Token(token) if token.is_keyword("class") => {
                        return TypeParameterKind::ReferenceType;
                    }
                    SyntaxElement::Token(token) if token.is_keyword("struct") => {
                        return TypeParameterKind::ValueType;
                    }
                    SyntaxElement::Node(constraint) => {
                        if compact_text(&constraint) == "unmanaged" {
                            return TypeParameterKind::ValueType;
                        }
                        let shallow = Mode {
                            aliases: true,
                            deep: false,
                        };
                        let class_constraint = self
                            .resolve_with(&constraint, shallow)
                            .is_some_and(|symbol| {
                                matches!(&symbol, TypeSymbol::Named(named) if named.kind == TypeKind::Class)
                            });
                        if class_constraint {
                            return TypeParameterKind::ReferenceType;
                        }
                    }
                    SyntaxElement::Token(_) => {}
                }
            }
        }
        TypeParameterKind::Unconstrained
    }

    /// Resolves an identifier expression to the parameter it names.
    pub(crate) fn resolve_parameter(&self, identifier: &SyntaxNode) -> Option<ParameterSymbol> {
        let name = IdentifierName::cast(identifier.clone())?.text();
        if !is_expression_position(identifier) {
            return None;
        }
        for ancestor in identifier.ancestors().skip(1) {
            match ancestor.kind() {
                SyntaxKind::Lambda => {
                    if lambda_declares(&ancestor, &name) {
                        return None;
                    }
                }
                SyntaxKind::Accessor => {
                    let accessor = Accessor::cast(ancestor)?;
                    if name == "value" && accessor.is_setter() {
                        return Some(ParameterSymbol::SetterValue(accessor));
                    }
                }
                SyntaxKind::IndexerDecl
                | SyntaxKind::MethodDecl
                | SyntaxKind::ConstructorDecl
                | SyntaxKind::OperatorDecl => {
                    return declared_parameters(&ancestor)
                        .into_iter()
                        .find(|parameter| parameter.name().as_deref() == Some(name.as_str()))
                        .map(ParameterSymbol::Declared);
                }
                SyntaxKind::PropertyDecl
                | SyntaxKind::FieldDecl
                | SyntaxKind::EventDecl
                | SyntaxKind::DestructorDecl
                | SyntaxKind::TypeDecl => return None,
                _ => {}
            }
        }
        None
    }

    /// True when `receiver` denotes `System.Diagnostics.Contracts.Contract`.
    /// A bare `Contract` that resolves to nothing else counts as well.
    pub(crate) fn is_contract_class(&self, receiver: &SyntaxNode) -> bool {
        match receiver.kind() {
            SyntaxKind::IdentifierName => {
                let Some(name) = IdentifierName::cast(receiver.clone()).map(|n| n.text()) else {
                    return false;
                };
                if name != "Contract" || self.resolve_parameter(receiver).is_some() {
                    return false;
                }
                if let Some(target) = alias_target(receiver, &name) {
                    return strip_global(&compact_text(&target)) == CONTRACT_CLASS;
                }
                !self.declared.iter().any(|declared| {
                    declared.name == "Contract"
                        && declared.arity == 0
                        && declared.container != "System.Diagnostics.Contracts"
                })
            }
            SyntaxKind::MemberAccess => strip_global(&compact_text(receiver)) == CONTRACT_CLASS,
            _ => false,
        }
    }
}

/// The method, type or delegate declaring a type parameter visible at `context`.
fn type_parameter_owner(context: &SyntaxNode, name: &str) -> Option<SyntaxNode> {
    context
        .ancestors()
        .filter(|ancestor| {
            matches!(
                ancestor.kind(),
                SyntaxKind::MethodDecl | SyntaxKind::TypeDecl | SyntaxKind::DelegateDecl
            )
        })
        .find(|declaration| type_parameter_names(declaration).iter().any(|p| p == name))
}

fn strip_global(text: &str) -> &str {
    text.strip_prefix("global::").unwrap_or(text)
}

fn predefined_symbol(keyword: &str) -> Option<TypeSymbol> {
    let (name, kind) = catalog::predefined(keyword)?;
    Some(TypeSymbol::named("System", name, kind, Vec::new()))
}

fn declared_kind(declaration: &TypeDecl) -> Option<TypeKind> {
    let keyword = declaration.keyword()?;
    let kind = match keyword.text() {
        "class" | "record" => {
            if declaration.is_value_type() {
                TypeKind::Struct
            } else {
                TypeKind::Class
            }
        }
        "struct" => TypeKind::Struct,
        "interface" => TypeKind::Interface,
        "enum" => TypeKind::Enum,
        "delegate" => TypeKind::Delegate,
        _ => return None,
    };
    Some(kind)
}

/// Dotted path of the namespaces and types enclosing a declaration.
fn container_path(declaration: &SyntaxNode) -> String {
    let mut parts: Vec<String> = declaration
        .ancestors()
        .skip(1)
        .filter_map(|ancestor| {
            NamespaceDecl::cast(ancestor.clone())
                .and_then(|namespace| namespace.name())
                .or_else(|| TypeDecl::cast(ancestor).and_then(|ty| ty.name()))
        })
        .collect();
    parts.reverse();
    parts.join(".")
}

/// Namespaces enclosing `node`, innermost first, each with its prefixes.
fn enclosing_namespaces(node: &SyntaxNode) -> Vec<String> {
    let mut names = Vec::new();
    for namespace in node.ancestors().filter_map(NamespaceDecl::cast) {
        let Some(name) = namespace.name() else { continue };
        let mut current = name.as_str();
        loop {
            names.push(current.to_string());
            match current.rfind('.') {
                Some(index) => current = &current[..index],
                None => break,
            }
        }
    }
    names
}

fn usings_in_scope(node: &SyntaxNode) -> Vec<UsingDirective> {
    node.ancestors()
        .filter(|ancestor| {
            matches!(
                ancestor.kind(),
                SyntaxKind::CompilationUnit
                    | SyntaxKind::NamespaceDecl
                    | SyntaxKind::FileScopedNamespaceDecl
            )
        })
        .flat_map(|scope| scope.children().filter_map(UsingDirective::cast))
        .collect()
}

fn namespaces_in_scope(node: &SyntaxNode) -> Vec<String> {
    let mut namespaces = enclosing_namespaces(node);
    namespaces.extend(
        usings_in_scope(node)
            .into_iter()
            .filter(|using| !using.is_static() && using.alias().is_none())
            .filter_map(|using| using.target_text())
            .map(|target| strip_global(&target).to_string()),
    );
    namespaces
}

fn alias_target(node: &SyntaxNode, name: &str) -> Option<SyntaxNode> {
    usings_in_scope(node)
        .into_iter()
        .find(|using| using.alias().as_deref() == Some(name))
        .and_then(|using| using.target())
}

fn flatten_qualified(node: &SyntaxNode, out: &mut Vec<SyntaxNode>) {
    if node.kind() == SyntaxKind::QualifiedName {
        for child in node.children() {
            flatten_qualified(&child, out);
        }
    } else {
        out.push(node.clone());
    }
}

fn simple_name(node: &SyntaxNode) -> Option<String> {
    IdentifierName::cast(node.clone())
        .map(|name| name.text())
        .or_else(|| GenericName::cast(node.clone()).and_then(|name| name.identifier()))
}

fn declared_parameters(declaration: &SyntaxNode) -> Vec<Parameter> {
    declaration
        .children()
        .find(|child| {
            matches!(
                child.kind(),
                SyntaxKind::ParameterList | SyntaxKind::BracketedParameterList
            )
        })
        .map(|list| list.children().filter_map(Parameter::cast).collect())
        .unwrap_or_default()
}

fn lambda_declares(lambda: &SyntaxNode, name: &str) -> bool {
    lambda
        .children()
        .flat_map(|child| match child.kind() {
            SyntaxKind::Parameter => vec![child],
            SyntaxKind::ParameterList => child.children().collect(),
            _ => Vec::new(),
        })
        .filter_map(Parameter::cast)
        .any(|parameter| parameter.name().as_deref() == Some(name))
}

/// Whether an identifier name is used as an expression rather than as part
/// of a type or declaration.
fn is_expression_position(node: &SyntaxNode) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let is_first = parent.children().next().as_ref() == Some(node);
    match parent.kind() {
        SyntaxKind::MemberAccess | SyntaxKind::AsExpression | SyntaxKind::IsPattern => is_first,
        SyntaxKind::LocalDeclaration
        | SyntaxKind::Cast
        | SyntaxKind::ObjectCreation
        | SyntaxKind::ArrayCreation
        | SyntaxKind::ForEachStatement => !is_first,
        SyntaxKind::QualifiedName
        | SyntaxKind::TypeArgumentList
        | SyntaxKind::NullableType
        | SyntaxKind::ArrayType
        | SyntaxKind::PointerType
        | SyntaxKind::TupleType
        | SyntaxKind::TupleElement
        | SyntaxKind::Parameter
        | SyntaxKind::BaseList
        | SyntaxKind::ConstraintClause
        | SyntaxKind::UsingDirective
        | SyntaxKind::NamespaceDecl
        | SyntaxKind::FileScopedNamespaceDecl
        | SyntaxKind::DeclarationExpression
        | SyntaxKind::CatchClause
        | SyntaxKind::MethodDecl
        | SyntaxKind::PropertyDecl
        | SyntaxKind::IndexerDecl
        | SyntaxKind::FieldDecl
        | SyntaxKind::DelegateDecl
        | SyntaxKind::OperatorDecl => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::{MethodDecl, Parameter};
    use crate::syntax::parser::parse_compilation_unit;

    fn root(source: &str) -> SyntaxNode {
        SyntaxNode::new_root(parse_compilation_unit(source).expect("parse"))
    }

    fn parameter_types(source: &str) -> Vec<Option<TypeSymbol>> {
        let root = root(source);
        let model = SemanticModel::new(&root);
        root.descendants()
            .filter_map(Parameter::cast)
            .map(|parameter| parameter.ty().and_then(|ty| model.resolve_type(&ty)))
            .collect()
    }

    #[test]
    fn resolves_framework_types_through_usings() {
        let types = parameter_types(
            "using System.Collections.Generic;\nclass C { void M(List<int> a, Dictionary<string, Missing> b, Missing c) { } }",
        );
        assert_eq!(
            types[0].as_ref().map(ToString::to_string).as_deref(),
            Some("System.Collections.Generic.List<System.Int32>")
        );
        assert!(types[1].as_ref().is_some_and(TypeSymbol::is_reference_type));
        assert_eq!(types[2], None);
    }

    #[test]
    fn framework_types_need_their_namespace() {
        let types = parameter_types("class C { void M(List<int> a, System.Text.StringBuilder b) { } }");
        assert_eq!(types[0], None);
        assert!(types[1].as_ref().is_some_and(TypeSymbol::is_reference_type));
    }

    #[test]
    fn nullable_annotations_wrap_value_types_only() {
        let types = parameter_types("class C { void M(int? a, string? b, int c) { } }");
        assert!(types[0].as_ref().is_some_and(TypeSymbol::is_nullable_value_type));
        assert!(types[1].as_ref().is_some_and(TypeSymbol::is_reference_type));
        assert!(types[2].as_ref().is_some_and(|t| !t.is_reference_type() && !t.is_nullable_value_type()));
    }

    #[test]
    fn type_parameter_constraints_decide_reference_kind() {
        let types = parameter_types(
            "struct Option<T> where T : class { void M(T a) { } }\nclass D<U, V> where V : struct { void N(U u, V v) { } }",
        );
        assert_eq!(
            types[0],
            Some(TypeSymbol::TypeParameter {
                name: "T".to_string(),
                kind: TypeParameterKind::ReferenceType
            })
        );
        assert!(types[1].as_ref().is_some_and(|t| !t.is_reference_type()));
        assert!(types[2].as_ref().is_some_and(TypeSymbol::is_value_type));
    }

    #[test]
    fn declared_types_and_aliases_resolve() {
        let types = parameter_types(
            "using Builder = System.Text.StringBuilder;\nnamespace N { struct Point { } class C { void M(Point p, Builder b, C c) { } } }",
        );
        assert!(types[0].as_ref().is_some_and(TypeSymbol::is_value_type));
        assert!(types[1].as_ref().is_some_and(TypeSymbol::is_reference_type));
        assert_eq!(types[2].as_ref().map(ToString::to_string).as_deref(), Some("N.C"));
    }

    #[test]
    fn identifiers_resolve_to_parameters_with_lambda_shadowing() {
        let root = root("class C { void M(string s) { Use(s); Run(s => s.Length); Use(x.s); } }");
        let model = SemanticModel::new(&root);
        let method = root.descendants().find_map(MethodDecl::cast).expect("method");
        let resolved: Vec<bool> = method
            .syntax()
            .descendants()
            .filter_map(IdentifierName::cast)
            .filter(|name| name.text() == "s")
            .map(|name| model.resolve_parameter(name.syntax()).is_some())
            .collect();
        assert_eq!(resolved, vec![true, false, false]);
    }

    #[test]
    fn setter_value_resolves_to_the_implicit_parameter() {
        let root = root("class C { string P { get { return value; } set { _p = value; } } }");
        let model = SemanticModel::new(&root);
        let values: Vec<Option<ParameterSymbol>> = root
            .descendants()
            .filter_map(IdentifierName::cast)
            .filter(|name| name.text() == "value")
            .map(|name| model.resolve_parameter(name.syntax()))
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].is_none());
        assert!(matches!(values[1], Some(ParameterSymbol::SetterValue(_))));
    }

    #[test]
    fn contract_receiver_detection() {
        let root = root(
            "class C { void M(object Contract) { Contract.Requires(true); } void N() { Contract.Requires(true); System.Diagnostics.Contracts.Contract.Requires(true); } }",
        );
        let model = SemanticModel::new(&root);
        let receivers: Vec<bool> = root
            .descendants()
            .filter(|node| node.kind() == SyntaxKind::MemberAccess)
            .filter(|node| node.parent().is_some_and(|p| p.kind() == SyntaxKind::Invocation))
            .filter_map(|node| node.children().next())
            .map(|receiver| model.is_contract_class(&receiver))
            .collect();
        assert_eq!(receivers, vec![false, true, true]);
    }

    #[test]
    fn user_declared_contract_type_is_not_the_contract_class() {
        let root = root("class Contract { } class C { void M() { Contract.Requires(true); } }");
        let model = SemanticModel::new(&root);
        let receiver = root
            .descendants()
            .filter(|node| node.kind() == SyntaxKind::MemberAccess)
            .find_map(|node| node.children().next())
            .expect("receiver");
        assert!(!model.is_contract_class(&receiver));
    }
}
