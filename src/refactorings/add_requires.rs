use tracing::debug;

use crate::contracts::MethodLike;
use crate::contracts::nullability::{is_defaulted_to_null, is_nullable};
use crate::document::Document;
use crate::semantic::ParameterSymbol;
use crate::syntax::SyntaxKind;
use crate::syntax::ast::{Accessor, AstNode, Parameter};

use super::{CancellationToken, CodeContractRefactoring, RefactoringError, rewrite};

/// Adds `Contract.Requires(parameter != null);` to the member declaring
/// the selected parameter.
#[derive(Debug)]
pub(crate) struct AddNotNullRequires<'a> {
    document: &'a Document,
    parameter: Option<ParameterSymbol>,
}

impl<'a> AddNotNullRequires<'a> {
    /// Refactoring for the caret at `offset`: inside a parameter
    /// declaration, on an identifier naming a parameter, or on the `set`
    /// or `init` keyword of an accessor.
    pub(crate) fn at(document: &'a Document, offset: usize) -> Self {
        Self {
            document,
            parameter: select_parameter(document, offset),
        }
    }

    pub(crate) fn for_parameter(document: &'a Document, parameter: ParameterSymbol) -> Self {
        Self {
            document,
            parameter: Some(parameter),
        }
    }

    fn target(&self) -> Option<(&ParameterSymbol, MethodLike)> {
        let parameter = self.parameter.as_ref()?;
        let model = self.document.semantic_model();
        let type_syntax = parameter.type_syntax()?;
        if !is_nullable(&type_syntax, model) || is_defaulted_to_null(parameter) {
            return None;
        }
        let method_like = MethodLike::for_parameter(parameter)?;
        if method_like.is_abstract() || method_like.checked_in_contract(parameter, model) {
            return None;
        }
        Some((parameter, method_like))
    }
}

impl CodeContractRefactoring for AddNotNullRequires<'_> {
    fn is_available(&self) -> bool {
        self.target().is_some()
    }

    fn apply(&self, cancel: &CancellationToken) -> Result<Document, RefactoringError> {
        let (parameter, method_like) = self.target().ok_or(RefactoringError::NotAvailable)?;
        cancel.check()?;
        let edits = method_like.add_requires(parameter, self.document.semantic_model())?;
        debug!(
            parameter = parameter.name().unwrap_or_default(),
            "adding not-null precondition"
        );
        rewrite(self.document, &edits, cancel)
    }
}

fn select_parameter(document: &Document, offset: usize) -> Option<ParameterSymbol> {
    let covering = document.covering_node(offset);
    if covering.kind() == SyntaxKind::IdentifierName {
        if let Some(parameter) = document.semantic_model().resolve_parameter(&covering) {
            return Some(parameter);
        }
    }
    if let Some(accessor) = Accessor::cast(covering.clone()) {
        let on_keyword = accessor
            .keyword()
            .is_some_and(|keyword| keyword.text_range().contains(&offset));
        if on_keyword && accessor.is_setter() {
            return Some(ParameterSymbol::SetterValue(accessor));
        }
    }
    covering
        .ancestors()
        .take_while(|node| !node.kind().is_function_like())
        .find_map(Parameter::cast)
        .filter(|parameter| {
            parameter.owner().is_some_and(|owner| {
                matches!(
                    owner.kind(),
                    SyntaxKind::MethodDecl | SyntaxKind::ConstructorDecl | SyntaxKind::IndexerDecl
                )
            })
        })
        .map(ParameterSymbol::Declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::CaretSource;

    fn at(source: &CaretSource) -> AddNotNullRequires<'_> {
        AddNotNullRequires::at(&source.document, source.offset)
    }

    fn applied(source: &CaretSource) -> String {
        at(source)
            .apply(&CancellationToken::new())
            .expect("apply precondition")
            .text()
            .to_string()
    }

    #[test]
    fn adds_precondition_and_import_to_an_empty_body() {
        let source = CaretSource::parse("class A { void Foo(string {caret}str) { } }");
        assert!(at(&source).is_available());
        assert_eq!(
            applied(&source),
            "using System.Diagnostics.Contracts;\nclass A { void Foo(string str) { Contract.Requires(str != null); } }"
        );
    }

    #[test]
    fn adds_precondition_to_constructor() {
        let source = CaretSource::from_member(
            "    private SampleClass(string {caret}str)\n    {\n    }",
        );
        assert_eq!(
            applied(&source),
            "using System.Diagnostics.Contracts;\ninternal class SampleClass\n{\n    private SampleClass(string str)\n    {\n        Contract.Requires(str != null);\n    }\n}"
        );
    }

    #[test]
    fn keeps_parameter_order_among_preconditions() {
        let source = CaretSource::from_member(
            "    public void Foo(string a, string {caret}b, string c)\n    {\n        Contract.Requires(a != null);\n        Contract.Requires(c != null);\n    }",
        );
        assert_eq!(
            applied(&source),
            "using System.Diagnostics.Contracts;\ninternal class SampleClass\n{\n    public void Foo(string a, string b, string c)\n    {\n        Contract.Requires(a != null);\n        Contract.Requires(b != null);\n        Contract.Requires(c != null);\n    }\n}"
        );
    }

    #[test]
    fn first_parameter_goes_before_existing_preconditions() {
        let source = CaretSource::from_member(
            "    public void Foo(string {caret}a, string b)\n    {\n        Contract.Requires(b != null);\n    }",
        );
        assert!(applied(&source).contains(
            "    {\n        Contract.Requires(a != null);\n        Contract.Requires(b != null);\n    }"
        ));
    }

    #[test]
    fn second_application_is_unavailable() {
        let source = CaretSource::from_member("    public void Foo(string {caret}str)\n    {\n    }");
        let document = at(&source)
            .apply(&CancellationToken::new())
            .expect("apply precondition");
        let parameter = document
            .root()
            .descendants()
            .find_map(Parameter::cast)
            .expect("parameter");
        let again = AddNotNullRequires::for_parameter(&document, ParameterSymbol::Declared(parameter));
        assert!(!again.is_available());
    }

    #[test]
    fn compound_precondition_counts_as_a_check() {
        let source = CaretSource::from_member(
            "    public void Foo(string {caret}str)\n    {\n        Contract.Requires(str != null && str.Length > 0);\n    }",
        );
        assert!(!at(&source).is_available());
    }

    #[test]
    fn identifier_in_body_selects_the_parameter() {
        let source = CaretSource::from_member(
            "    public int Foo(string str)\n    {\n        return {caret}str.Length;\n    }",
        );
        assert!(applied(&source).contains("    {\n        Contract.Requires(str != null);\n        return str.Length;"));
    }

    #[test]
    fn setter_keyword_selects_value() {
        let source = CaretSource::from_member(
            "    public string Name\n    {\n        get { return null; }\n        {caret}set\n        {\n        }\n    }",
        );
        assert_eq!(
            applied(&source),
            "using System.Diagnostics.Contracts;\ninternal class SampleClass\n{\n    public string Name\n    {\n        get { return null; }\n        set\n        {\n            Contract.Requires(value != null);\n        }\n    }\n}"
        );
    }

    #[test]
    fn indexer_parameter_is_checked_in_each_accessor() {
        let source = CaretSource::from_member(
            "    public object this[string {caret}index]\n    {\n        get\n        {\n            return null;\n        }\n        set\n        {\n        }\n    }",
        );
        let text = applied(&source);
        assert_eq!(text.matches("Contract.Requires(index != null);").count(), 2);
    }

    fn for_named<'a>(document: &'a Document, name: &str) -> AddNotNullRequires<'a> {
        let parameter = document
            .root()
            .descendants()
            .filter_map(Parameter::cast)
            .find(|parameter| parameter.name().as_deref() == Some(name))
            .expect("named parameter");
        AddNotNullRequires::for_parameter(document, ParameterSymbol::Declared(parameter))
    }

    #[test]
    fn indexer_precondition_is_unavailable_once_every_accessor_checks_it() {
        let source = CaretSource::from_member(
            "    public object this[string {caret}k, string j]\n    {\n        get\n        {\n            return null;\n        }\n        set\n        {\n        }\n    }",
        );
        let document = at(&source)
            .apply(&CancellationToken::new())
            .expect("apply precondition");
        assert_eq!(document.text().matches("Contract.Requires(k != null);").count(), 2);
        assert!(!for_named(&document, "k").is_available());
        assert!(for_named(&document, "j").is_available());
    }

    #[test]
    fn sequential_applications_keep_parameter_order() {
        let source = CaretSource::from_member(
            "    public void Foo(string a, string b, string {caret}c)\n    {\n        Contract.Requires(a != null);\n    }",
        );
        let cancel = CancellationToken::new();
        let with_c = at(&source).apply(&cancel).expect("apply precondition for c");
        let with_b = for_named(&with_c, "b")
            .apply(&cancel)
            .expect("apply precondition for b");
        assert!(with_b.text().contains(
            "    {\n        Contract.Requires(a != null);\n        Contract.Requires(b != null);\n        Contract.Requires(c != null);\n    }"
        ));
    }

    #[test]
    fn generic_and_collection_parameters() {
        let source = CaretSource::parse(
            "using System.Collections.Generic;\nstruct Holder<T> where T : class\n{\n    public void Add(T {caret}item) { }\n}",
        );
        assert!(at(&source).is_available());

        let source = CaretSource::parse(
            "using System.Collections.Generic;\nclass A\n{\n    public void Foo(IReadOnlyList<int> {caret}items) { }\n}",
        );
        assert!(at(&source).is_available());

        let source = CaretSource::parse("class A\n{\n    public void Foo(params string[] {caret}items) { }\n}");
        assert!(at(&source).is_available());

        let source = CaretSource::parse("struct Holder<T>\n{\n    public void Add(T {caret}item) { }\n}");
        assert!(!at(&source).is_available(), "unconstrained type parameter");
    }

    #[test]
    fn unavailable_cases() {
        for member in [
            "    public void Foo(int {caret}count) { }",
            "    public void Foo(string {caret}str = null) { }",
            "    public void Foo(Unknown {caret}str) { }",
            "    public string Foo(string {caret}str) => str;",
        ] {
            let source = CaretSource::from_member(member);
            assert!(!at(&source).is_available(), "{member}");
        }
        let source = CaretSource::parse("abstract class A { public abstract void Foo(string {caret}str); }");
        assert!(!at(&source).is_available());
        let source = CaretSource::parse(
            "using System;\nclass A { void Foo() { Func<string, int> f = (string {caret}text) => text.Length; } }",
        );
        assert!(!at(&source).is_available());
    }

    #[test]
    fn apply_when_unavailable_is_an_error() {
        let source = CaretSource::from_member("    public void Foo(int {caret}count) { }");
        assert!(matches!(
            at(&source).apply(&CancellationToken::new()),
            Err(RefactoringError::NotAvailable)
        ));
    }

    #[test]
    fn cancelled_apply_produces_nothing() {
        let source = CaretSource::from_member("    public void Foo(string {caret}str) { }");
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            at(&source).apply(&cancel),
            Err(RefactoringError::Cancelled)
        ));
    }
}
