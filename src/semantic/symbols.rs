use std::fmt;

use crate::syntax::SyntaxNode;
use crate::syntax::ast::{Accessor, AstNode, IndexerDecl, Parameter, PropertyDecl};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// What a type parameter's constraints say about its instantiations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TypeParameterKind {
    ReferenceType,
    ValueType,
    Unconstrained,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NamedType {
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    /// Arguments of a constructed type; `None` marks one that did not resolve.
    pub(crate) type_arguments: Vec<Option<TypeSymbol>>,
}

/// A resolved type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TypeSymbol {
    Named(NamedType),
    TypeParameter { name: String, kind: TypeParameterKind },
    Array(Option<Box<TypeSymbol>>),
    Pointer(Option<Box<TypeSymbol>>),
    Dynamic,
}

impl TypeSymbol {
    pub(crate) fn named(namespace: &str, name: &str, kind: TypeKind, type_arguments: Vec<Option<TypeSymbol>>) -> Self {
        TypeSymbol::Named(NamedType {
            namespace: namespace.to_string(),
            name: name.to_string(),
            kind,
            type_arguments,
        })
    }

    pub(crate) fn is_reference_type(&self) -> bool {
        match self {
            TypeSymbol::Named(named) => matches!(
                named.kind,
                TypeKind::Class | TypeKind::Interface | TypeKind::Delegate
            ),
            TypeSymbol::TypeParameter { kind, .. } => *kind == TypeParameterKind::ReferenceType,
            TypeSymbol::Array(_) | TypeSymbol::Dynamic => true,
            TypeSymbol::Pointer(_) => false,
        }
    }

    pub(crate) fn is_value_type(&self) -> bool {
        match self {
            TypeSymbol::Named(named) => matches!(named.kind, TypeKind::Struct | TypeKind::Enum),
            TypeSymbol::TypeParameter { kind, .. } => *kind == TypeParameterKind::ValueType,
            _ => false,
        }
    }

    pub(crate) fn is_pointer(&self) -> bool {
        matches!(self, TypeSymbol::Pointer(_))
    }

    /// True for constructions of `System.Nullable<T>`.
    pub(crate) fn is_nullable_value_type(&self) -> bool {
        matches!(
            self,
            TypeSymbol::Named(named)
                if named.namespace == "System" && named.name == "Nullable" && named.type_arguments.len() == 1
        )
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSymbol::Named(named) => {
                if !named.namespace.is_empty() {
                    write!(f, "{}.", named.namespace)?;
                }
                write!(f, "{}", named.name)?;
                if !named.type_arguments.is_empty() {
                    let arguments: Vec<String> = named
                        .type_arguments
                        .iter()
                        .map(|argument| match argument {
                            Some(symbol) => symbol.to_string(),
                            None => "?".to_string(),
                        })
                        .collect();
                    write!(f, "<{}>", arguments.join(", "))?;
                }
                Ok(())
            }
            TypeSymbol::TypeParameter { name, .. } => write!(f, "{name}"),
            TypeSymbol::Array(element) => match element {
                Some(element) => write!(f, "{element}[]"),
                None => write!(f, "?[]"),
            },
            TypeSymbol::Pointer(element) => match element {
                Some(element) => write!(f, "{element}*"),
                None => write!(f, "?*"),
            },
            TypeSymbol::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// A parameter of a function-like member: declared in a parameter list,
/// or the implicit `value` of a setter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ParameterSymbol {
    Declared(Parameter),
    SetterValue(Accessor),
}

impl ParameterSymbol {
    pub(crate) fn name(&self) -> Option<String> {
        match self {
            ParameterSymbol::Declared(parameter) => parameter.name(),
            ParameterSymbol::SetterValue(_) => Some("value".to_string()),
        }
    }

    /// Declared type syntax; for `value` the type of the property or indexer.
    pub(crate) fn type_syntax(&self) -> Option<SyntaxNode> {
        match self {
            ParameterSymbol::Declared(parameter) => parameter.ty(),
            ParameterSymbol::SetterValue(accessor) => {
                let owner = accessor.owner()?;
                PropertyDecl::cast(owner.clone())
                    .and_then(|property| property.ty())
                    .or_else(|| IndexerDecl::cast(owner).and_then(|indexer| indexer.ty()))
            }
        }
    }

    pub(crate) fn default_value(&self) -> Option<SyntaxNode> {
        match self {
            ParameterSymbol::Declared(parameter) => parameter.default_value(),
            ParameterSymbol::SetterValue(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        let string = TypeSymbol::named("System", "String", TypeKind::Class, Vec::new());
        let int = TypeSymbol::named("System", "Int32", TypeKind::Struct, Vec::new());
        let nullable_int = TypeSymbol::named("System", "Nullable", TypeKind::Struct, vec![Some(int.clone())]);
        assert!(string.is_reference_type());
        assert!(!int.is_reference_type());
        assert!(int.is_value_type());
        assert!(nullable_int.is_nullable_value_type());
        assert!(TypeSymbol::Array(None).is_reference_type());
        assert!(TypeSymbol::Pointer(Some(Box::new(int))).is_pointer());
    }

    #[test]
    fn display_uses_qualified_names() {
        let list = TypeSymbol::named(
            "System.Collections.Generic",
            "List",
            TypeKind::Class,
            vec![Some(TypeSymbol::TypeParameter {
                name: "T".to_string(),
                kind: TypeParameterKind::Unconstrained,
            })],
        );
        assert_eq!(list.to_string(), "System.Collections.Generic.List<T>");
    }
}
