use crate::semantic::ParameterSymbol;
use crate::syntax::SyntaxNode;

use super::block::ContractBlock;

/// Where a new assertion goes inside a body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// First statement of the body.
    Start,
    /// Right after the given statement.
    After(SyntaxNode),
}

/// Anchor for a not-null precondition of `target`.
///
/// The new statement follows the preconditions of the nearest preceding
/// parameter that already has one, so that preconditions keep parameter
/// order. `parameters` is the full parameter list of the declaration in
/// declaration order; for a setter `value` comes last.
pub(crate) fn precondition_anchor(
    target: &ParameterSymbol,
    contract: &ContractBlock,
    parameters: &[ParameterSymbol],
) -> Anchor {
    let position = parameters
        .iter()
        .position(|parameter| parameter == target)
        .unwrap_or(parameters.len());
    parameters[..position]
        .iter()
        .rev()
        .find_map(|preceding| {
            contract
                .preconditions()
                .iter()
                .rev()
                .find(|assertion| assertion.uses(preceding))
        })
        .map(|assertion| Anchor::After(assertion.statement.clone()))
        .unwrap_or(Anchor::Start)
}

/// Anchor for a not-null postcondition: after the last precondition.
pub(crate) fn postcondition_anchor(contract: &ContractBlock) -> Anchor {
    contract
        .preconditions()
        .last()
        .map(|assertion| Anchor::After(assertion.statement.clone()))
        .unwrap_or(Anchor::Start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::syntax::ast::{AstNode, MethodDecl};

    fn setup(body: &str) -> (Document, MethodDecl) {
        let source = format!(
            "using System.Diagnostics.Contracts;\nclass C\n{{\n    string Foo(string a, string b, string c)\n    {{\n{body}\n    }}\n}}\n"
        );
        let document = Document::parse("C.cs", &source).expect("parse");
        let method = document
            .root()
            .descendants()
            .find_map(MethodDecl::cast)
            .expect("method");
        (document, method)
    }

    fn parameters(method: &MethodDecl) -> Vec<ParameterSymbol> {
        method
            .parameters()
            .into_iter()
            .map(ParameterSymbol::Declared)
            .collect()
    }

    fn anchor_text(anchor: &Anchor) -> String {
        match anchor {
            Anchor::Start => "<start>".to_string(),
            Anchor::After(statement) => statement.trimmed_text(),
        }
    }

    #[test]
    fn first_precondition_goes_to_the_start() {
        let (document, method) = setup("        return a;");
        let parameters = parameters(&method);
        let contract = ContractBlock::for_declaration(method.syntax(), document.semantic_model());
        assert_eq!(precondition_anchor(&parameters[1], &contract, &parameters), Anchor::Start);
    }

    #[test]
    fn precondition_follows_the_nearest_preceding_parameter() {
        let (document, method) = setup(
            "        Contract.Requires(a != null);\n        Contract.Requires(a.Length > 0);\n        Contract.Requires(c != null);\n        return a;",
        );
        let parameters = parameters(&method);
        let contract = ContractBlock::for_declaration(method.syntax(), document.semantic_model());
        let anchor = precondition_anchor(&parameters[1], &contract, &parameters);
        assert_eq!(anchor_text(&anchor), "Contract.Requires(a.Length > 0);");
    }

    #[test]
    fn precondition_before_later_parameters_goes_to_the_start() {
        let (document, method) = setup("        Contract.Requires(c != null);\n        return a;");
        let parameters = parameters(&method);
        let contract = ContractBlock::for_declaration(method.syntax(), document.semantic_model());
        assert_eq!(precondition_anchor(&parameters[0], &contract, &parameters), Anchor::Start);
    }

    #[test]
    fn postcondition_follows_the_last_precondition() {
        let (document, method) = setup(
            "        Contract.Requires(a != null);\n        Contract.Requires(b != null);\n        return a;",
        );
        let contract = ContractBlock::for_declaration(method.syntax(), document.semantic_model());
        assert_eq!(
            anchor_text(&postcondition_anchor(&contract)),
            "Contract.Requires(b != null);"
        );

        let (document, method) = setup("        return a;");
        let contract = ContractBlock::for_declaration(method.syntax(), document.semantic_model());
        assert_eq!(postcondition_anchor(&contract), Anchor::Start);
    }
}
