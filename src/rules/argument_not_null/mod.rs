use anyhow::Result;
use serde_sarif::sarif::Result as SarifResult;

use crate::contracts::MethodLike;
use crate::document::Document;
use crate::engine::AnalysisContext;
use crate::refactorings::{AddNotNullRequires, CodeContractRefactoring};
use crate::rules::{Rule, RuleMetadata, is_public_or_protected, node_location, result_message};
use crate::semantic::ParameterSymbol;
use crate::syntax::ast::{AstNode, Parameter};

/// Rule that reports nullable parameters without a not-null precondition.
#[derive(Default)]
pub(crate) struct ArgumentNotNullRule;

crate::register_rule!(ArgumentNotNullRule);

impl Rule for ArgumentNotNullRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: "CC001",
            name: "Argument not-null analyzer",
            description: "Nullable parameters of methods, constructors and indexers should be guarded by Contract.Requires(x != null)",
        }
    }

    fn run(&self, context: &AnalysisContext) -> Result<Vec<SarifResult>> {
        let public_only = context.config().public_only;
        context.flat_map_documents(|document| {
            Ok(missing_preconditions(document, public_only)
                .iter()
                .map(|parameter| report(document, parameter))
                .collect())
        })
    }
}

/// Parameters for which "add not-null precondition" is available, in
/// document order.
pub(crate) fn missing_preconditions(document: &Document, public_only: bool) -> Vec<Parameter> {
    document
        .root()
        .descendants()
        .filter_map(Parameter::cast)
        .filter(|parameter| {
            let symbol = ParameterSymbol::Declared(parameter.clone());
            let Some(method_like) = MethodLike::for_parameter(&symbol) else {
                return false;
            };
            if public_only && !is_public_or_protected(method_like.syntax()) {
                return false;
            }
            AddNotNullRequires::for_parameter(document, symbol).is_available()
        })
        .collect()
}

fn report(document: &Document, parameter: &Parameter) -> SarifResult {
    let name = parameter.name().unwrap_or_default();
    let message = result_message(format!(
        "Lack of argument validation for nullable parameter '{name}'."
    ));
    SarifResult::builder()
        .message(message)
        .locations(vec![node_location(document, parameter.syntax())])
        .build()
}

#[cfg(test)]
mod tests {
    use crate::test_harness::{ContractTestHarness, SourceFile};

    fn messages(sources: &[SourceFile]) -> Vec<String> {
        let harness = ContractTestHarness::new();
        let output = harness.analyze(sources).expect("run harness analysis");
        output
            .results
            .iter()
            .filter(|result| result.rule_id.as_deref() == Some("CC001"))
            .filter_map(|result| result.message.text.clone())
            .collect()
    }

    fn source(contents: &str) -> Vec<SourceFile> {
        vec![SourceFile {
            path: "Sample.cs".to_string(),
            contents: contents.to_string(),
        }]
    }

    #[test]
    fn reports_unchecked_nullable_parameters() {
        let messages = messages(&source(
            r#"
using System.Diagnostics.Contracts;
public class Sample
{
    public Sample(string name, int count)
    {
    }

    public void Foo(string checkedArg, object other, int? maybe)
    {
        Contract.Requires(checkedArg != null);
    }
}
"#,
        ));
        assert_eq!(
            messages,
            vec![
                "Lack of argument validation for nullable parameter 'name'.".to_string(),
                "Lack of argument validation for nullable parameter 'other'.".to_string(),
                "Lack of argument validation for nullable parameter 'maybe'.".to_string(),
            ]
        );
    }

    #[test]
    fn ignores_abstract_defaulted_and_lambda_parameters() {
        let messages = messages(&source(
            r#"
using System;
public abstract class Sample
{
    public abstract void Abstract(string text);

    public void Defaulted(string text = null)
    {
        Func<string, int> length = (string value) => value.Length;
    }
}
"#,
        ));
        assert!(messages.is_empty(), "unexpected reports: {messages:?}");
    }

    #[test]
    fn indexer_parameters_need_checks_in_every_accessor() {
        let messages = messages(&source(
            r#"
public class Sample
{
    public object this[string key]
    {
        get
        {
            Contract.Requires(key != null);
            return null;
        }
        set
        {
        }
    }
}
"#,
        ));
        assert_eq!(
            messages,
            vec!["Lack of argument validation for nullable parameter 'key'.".to_string()]
        );
    }

    #[test]
    fn public_only_skips_internal_members() {
        let harness = ContractTestHarness::new().public_only(true);
        let output = harness
            .analyze(&source(
                r#"
public class Sample
{
    public void Visible(string a) { }
    internal void Hidden(string b) { }
}
internal class Internal
{
    public void AlsoHidden(string c) { }
}
"#,
            ))
            .expect("run harness analysis");
        let messages: Vec<_> = output
            .results
            .iter()
            .filter_map(|result| result.message.text.clone())
            .filter(|text| text.contains("parameter"))
            .collect();
        assert_eq!(
            messages,
            vec!["Lack of argument validation for nullable parameter 'a'.".to_string()]
        );
    }
}
