use anyhow::Result;
use serde_sarif::sarif::Result as SarifResult;

use crate::document::Document;
use crate::engine::AnalysisContext;
use crate::refactorings::{AddNotNullEnsures, CodeContractRefactoring};
use crate::rules::{Rule, RuleMetadata, is_public_or_protected, node_location, result_message};
use crate::syntax::ast::{AstNode, MethodDecl};

/// Rule that reports methods returning a nullable type without a not-null
/// postcondition on the result.
#[derive(Default)]
pub(crate) struct ResultNotNullRule;

crate::register_rule!(ResultNotNullRule);

impl Rule for ResultNotNullRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: "CC002",
            name: "Result not-null analyzer",
            description: "Methods returning a nullable type should state Contract.Ensures(Contract.Result<T>() != null)",
        }
    }

    fn run(&self, context: &AnalysisContext) -> Result<Vec<SarifResult>> {
        let public_only = context.config().public_only;
        context.flat_map_documents(|document| {
            Ok(missing_postconditions(document, public_only)
                .iter()
                .filter_map(|method| report(document, method))
                .collect())
        })
    }
}

/// Methods for which "add not-null postcondition" is available, in
/// document order.
pub(crate) fn missing_postconditions(document: &Document, public_only: bool) -> Vec<MethodDecl> {
    document
        .root()
        .descendants()
        .filter_map(MethodDecl::cast)
        .filter(|method| !public_only || is_public_or_protected(method.syntax()))
        .filter(|method| AddNotNullEnsures::for_method(document, method.clone()).is_available())
        .collect()
}

fn report(document: &Document, method: &MethodDecl) -> Option<SarifResult> {
    let return_type = method.return_type()?;
    let message = result_message(format!(
        "Lack of not-null ensures for nullable return type '{}'.",
        return_type.trimmed_text()
    ));
    Some(
        SarifResult::builder()
            .message(message)
            .locations(vec![node_location(document, &return_type)])
            .build(),
    )
}
