use crate::semantic::{ParameterSymbol, SemanticModel};
use crate::syntax::SyntaxNode;
use crate::syntax::ast::{is_null_literal, skip_parentheses};

/// True when a value of the type may be `null`: reference types, pointers
/// and `System.Nullable<T>`. Types that do not resolve are never nullable.
pub(crate) fn is_nullable(type_syntax: &SyntaxNode, model: &SemanticModel) -> bool {
    match model.resolve_type(type_syntax) {
        Some(symbol) => {
            symbol.is_reference_type() || symbol.is_pointer() || symbol.is_nullable_value_type()
        }
        None => false,
    }
}

/// True when the parameter's default value is the `null` literal.
pub(crate) fn is_defaulted_to_null(parameter: &ParameterSymbol) -> bool {
    parameter
        .default_value()
        .is_some_and(|value| is_null_literal(&skip_parentheses(&value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::syntax::ast::{AstNode, Parameter};

    fn parameter(source: &str, name: &str) -> (Document, ParameterSymbol) {
        let document = Document::parse("Sample.cs", source).expect("parse");
        let parameter = document
            .root()
            .descendants()
            .filter_map(Parameter::cast)
            .find(|parameter| parameter.name().as_deref() == Some(name))
            .expect("parameter");
        (document, ParameterSymbol::Declared(parameter))
    }

    fn nullable(source: &str) -> bool {
        let (document, parameter) = parameter(source, "str");
        let ty = parameter.type_syntax().expect("type");
        is_nullable(&ty, document.semantic_model())
    }

    fn defaulted(source: &str) -> bool {
        let (_, parameter) = parameter(source, "str");
        is_defaulted_to_null(&parameter)
    }

    #[test]
    fn reference_nullable_and_pointer_types_are_nullable() {
        assert!(nullable("class C { public static void Foo(string str) {} }"));
        assert!(nullable("class C { public static void Foo(int? str) {} }"));
        assert!(nullable(
            "using System; class C { public static void Foo(Nullable<int> str) {} }"
        ));
        assert!(nullable("class C { unsafe static void Foo(int * str) {} }"));
        assert!(nullable("class Booo {} class C { public static void Foo(Booo str) {} }"));
        assert!(nullable(
            "class C { public void EnabledOnParamsArguments(params object[] str) {} }"
        ));
    }

    #[test]
    fn value_types_are_not_nullable() {
        assert!(!nullable("class C { public static void Foo(int str) {} }"));
        assert!(!nullable("struct Booo {} class C { public static void Foo(Booo str) {} }"));
        assert!(!nullable(
            "using System; class C { public static void Foo(DateTime str) {} }"
        ));
    }

    #[test]
    fn unresolved_types_are_not_nullable() {
        assert!(!nullable("class C { public static void Foo(stirng str) {} }"));
    }

    #[test]
    fn generic_parameters_follow_their_constraints() {
        assert!(nullable(
            "struct Option<T> where T : class { public Option(T str) {} }"
        ));
        assert!(!nullable(
            "struct Option<T> where T : struct { public Option(T str) {} }"
        ));
        assert!(!nullable("struct Option<T> { public Option(T str) {} }"));
    }

    #[test]
    fn null_defaults_are_detected() {
        assert!(defaulted("class C { public static void Foo(string str = null) {} }"));
        assert!(!defaulted("class C { public static void Foo(string str = \"\") {} }"));
        assert!(defaulted("class C { public static void Foo(int? str = null) {} }"));
        assert!(!defaulted("class C { public static void Foo(int? str = 42) {} }"));
        assert!(!defaulted("class C { public static void Foo(int str = 42) {} }"));
        assert!(defaulted("class C { unsafe static void Foo(int * str = null) {} }"));
        assert!(!defaulted("class C { public static void Foo(string str) {} }"));
    }
}
