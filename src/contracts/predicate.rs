use crate::semantic::{ParameterSymbol, SemanticModel};
use crate::syntax::ast::{
    AstNode, Binary, GenericName, Invocation, MemberAccess, is_null_literal, skip_parentheses,
};
use crate::syntax::{SyntaxKind, SyntaxNode};

/// A reference to a parameter inside an assertion condition.
#[derive(Clone, Debug)]
pub(crate) struct ParameterReference {
    pub(crate) parameter: ParameterSymbol,
    pub(crate) node: SyntaxNode,
}

/// A `Contract.Result<T>()` call inside an assertion condition.
#[derive(Clone, Debug)]
pub(crate) struct ResultReference {
    pub(crate) node: SyntaxNode,
}

/// The parts of an assertion condition that matter for not-null checks.
#[derive(Clone, Debug, Default)]
pub(crate) struct PredicateExpression {
    parameters: Vec<ParameterReference>,
    results: Vec<ResultReference>,
}

impl PredicateExpression {
    pub(crate) fn create(expression: &SyntaxNode, model: &SemanticModel) -> Self {
        let mut predicate = Self::default();
        for node in expression.descendants() {
            match node.kind() {
                SyntaxKind::IdentifierName => {
                    if let Some(parameter) = model.resolve_parameter(&node) {
                        predicate.parameters.push(ParameterReference { parameter, node });
                    }
                }
                SyntaxKind::Invocation => {
                    if is_contract_result(&node, model) {
                        predicate.results.push(ResultReference { node });
                    }
                }
                _ => {}
            }
        }
        predicate
    }

    pub(crate) fn contains(&self, parameter: &ParameterSymbol) -> bool {
        self.parameters
            .iter()
            .any(|reference| &reference.parameter == parameter)
    }

    /// True when some reference to `parameter` is compared with `!= null`.
    pub(crate) fn has_not_null_check(&self, parameter: &ParameterSymbol) -> bool {
        self.parameters
            .iter()
            .filter(|reference| &reference.parameter == parameter)
            .any(|reference| is_compared_not_null(&reference.node))
    }

    /// True when some `Contract.Result<T>()` is compared with `!= null`.
    pub(crate) fn has_result_not_null_check(&self) -> bool {
        self.results
            .iter()
            .any(|reference| is_compared_not_null(&reference.node))
    }
}

/// `x != null` or `null != x`, with parentheses around either side.
fn is_compared_not_null(operand: &SyntaxNode) -> bool {
    let mut current = operand.clone();
    let Some(mut parent) = current.parent() else {
        return false;
    };
    while parent.kind() == SyntaxKind::Parenthesized {
        current = parent;
        parent = match current.parent() {
            Some(parent) => parent,
            None => return false,
        };
    }
    let Some(binary) = Binary::cast(parent) else {
        return false;
    };
    if binary.operator() != "!=" {
        return false;
    }
    let other = if binary.left().as_ref() == Some(&current) {
        binary.right()
    } else {
        binary.left()
    };
    other.is_some_and(|other| is_null_literal(&skip_parentheses(&other)))
}

/// `Contract.Result<T>()` with exactly one type argument.
fn is_contract_result(invocation: &SyntaxNode, model: &SemanticModel) -> bool {
    let Some(invocation) = Invocation::cast(invocation.clone()) else {
        return false;
    };
    if !invocation.arguments().is_empty() {
        return false;
    }
    let Some(access) = invocation.expression().and_then(MemberAccess::cast) else {
        return false;
    };
    if !access.receiver().is_some_and(|receiver| model.is_contract_class(&receiver)) {
        return false;
    }
    access
        .name()
        .and_then(GenericName::cast)
        .is_some_and(|name| name.identifier().as_deref() == Some("Result") && name.type_arguments().len() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::syntax::ast::{ExpressionStatement, Parameter};

    struct Fixture {
        document: Document,
    }

    impl Fixture {
        fn new(body: &str) -> Self {
            let source = format!(
                "using System.Diagnostics.Contracts;\nclass C\n{{\n    string Foo(string s1, string s2)\n    {{\n        {body}\n    }}\n}}\n"
            );
            Self {
                document: Document::parse("C.cs", &source).expect("parse"),
            }
        }

        fn predicate(&self) -> PredicateExpression {
            let statement = self
                .document
                .root()
                .descendants()
                .find_map(ExpressionStatement::cast)
                .expect("statement");
            let invocation = Invocation::cast(statement.expression().expect("expression")).expect("invocation");
            let argument = invocation.arguments()[0].expression().expect("argument");
            PredicateExpression::create(&argument, self.document.semantic_model())
        }

        fn parameter(&self, name: &str) -> ParameterSymbol {
            let parameter = self
                .document
                .root()
                .descendants()
                .filter_map(Parameter::cast)
                .find(|parameter| parameter.name().as_deref() == Some(name))
                .expect("parameter");
            ParameterSymbol::Declared(parameter)
        }
    }

    #[test]
    fn not_null_comparison_is_symmetric() {
        let fixture = Fixture::new("Contract.Requires(s1 != null);");
        assert!(fixture.predicate().has_not_null_check(&fixture.parameter("s1")));
        let fixture = Fixture::new("Contract.Requires(null != s1);");
        assert!(fixture.predicate().has_not_null_check(&fixture.parameter("s1")));
        let fixture = Fixture::new("Contract.Requires(((s1)) != (null));");
        assert!(fixture.predicate().has_not_null_check(&fixture.parameter("s1")));
    }

    #[test]
    fn equality_and_member_comparisons_are_not_checks() {
        let fixture = Fixture::new("Contract.Requires(s1 == null);");
        let predicate = fixture.predicate();
        assert!(!predicate.has_not_null_check(&fixture.parameter("s1")));
        assert!(predicate.contains(&fixture.parameter("s1")));

        let fixture = Fixture::new("Contract.Requires(s1.Length == null);");
        assert!(!fixture.predicate().has_not_null_check(&fixture.parameter("s1")));

        let fixture = Fixture::new("Contract.Requires(!string.IsNullOrEmpty(s1));");
        assert!(!fixture.predicate().has_not_null_check(&fixture.parameter("s1")));
    }

    #[test]
    fn checks_inside_compound_conditions_count() {
        let fixture = Fixture::new("Contract.Requires((s1 != null || s1.Length == 0) && s2 != null);");
        let predicate = fixture.predicate();
        assert!(predicate.has_not_null_check(&fixture.parameter("s2")));
        assert!(predicate.has_not_null_check(&fixture.parameter("s1")));
        assert_eq!(predicate.parameters.len(), 3);
    }

    #[test]
    fn references_are_per_parameter() {
        let fixture = Fixture::new("Contract.Requires(s1 != null);");
        let predicate = fixture.predicate();
        assert!(!predicate.has_not_null_check(&fixture.parameter("s2")));
        assert!(!predicate.contains(&fixture.parameter("s2")));
    }

    #[test]
    fn result_references_are_recognized() {
        let fixture = Fixture::new("Contract.Ensures(Contract.Result<string>() != null);");
        let predicate = fixture.predicate();
        assert!(predicate.has_result_not_null_check());
        assert_eq!(predicate.results.len(), 1);
        assert_eq!(predicate.results[0].node.trimmed_text(), "Contract.Result<string>()");

        let fixture = Fixture::new("Contract.Ensures(Contract.Result<string>().Length != 0);");
        assert!(!fixture.predicate().has_result_not_null_check());

        let fixture = Fixture::new(
            "Contract.Ensures(Contract.Result<string>() != null || Contract.Result<string>().Length != 0);",
        );
        assert!(fixture.predicate().has_result_not_null_check());
    }

    #[test]
    fn shadowing_lambda_parameters_are_not_references() {
        let fixture = Fixture::new("Contract.Requires(Check(s1 => s1 != null));");
        assert!(!fixture.predicate().contains(&fixture.parameter("s1")));
    }
}
