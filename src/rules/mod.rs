use anyhow::Result;
use serde_sarif::sarif::{
    ArtifactLocation, Location, LogicalLocation, Message, PhysicalLocation, Region,
    Result as SarifResult,
};

use crate::document::Document;
use crate::engine::AnalysisContext;
use crate::syntax::ast::{AstNode, NamespaceDecl, TypeDecl, has_modifier};
use crate::syntax::{SyntaxKind, SyntaxNode};

// Rule modules are auto-discovered by build.rs; do not edit manually.
include!(concat!(env!("OUT_DIR"), "/rule_modules.rs"));

/// Metadata describing an analysis rule.
#[derive(Clone, Debug)]
pub(crate) struct RuleMetadata {
    pub(crate) id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
}

/// Rule interface for analysis execution.
pub(crate) trait Rule {
    fn metadata(&self) -> RuleMetadata;
    fn run(&self, context: &AnalysisContext) -> Result<Vec<SarifResult>>;
}

/// Wrapper struct for rule factory functions to enable inventory collection.
pub(crate) struct RuleFactory(pub fn() -> Box<dyn Rule + Send + Sync>);

inventory::collect!(RuleFactory);

/// Macro to register a rule implementation.
///
/// Usage: `register_rule!(RuleName);`
/// This macro creates a factory function and registers it with inventory.
#[macro_export]
macro_rules! register_rule {
    ($rule_type:ty) => {
        inventory::submit! {
            $crate::rules::RuleFactory(|| Box::new(<$rule_type>::default()))
        }
    };
}

/// Returns all registered rules as boxed trait objects.
pub(crate) fn all_rules() -> Vec<Box<dyn Rule + Send + Sync>> {
    inventory::iter::<RuleFactory>
        .into_iter()
        .map(|factory| (factory.0)())
        .collect()
}

/// Location of a node: file region plus the `Type.Member` it belongs to.
pub(crate) fn node_location(document: &Document, node: &SyntaxNode) -> Location {
    let range = node.text_range();
    let (start_line, start_column) = document.line_column(range.start);
    let (end_line, end_column) = document.line_column(range.end);
    let region = Region::builder()
        .start_line(start_line as i64)
        .start_column(start_column as i64)
        .end_line(end_line as i64)
        .end_column(end_column as i64)
        .build();
    let artifact_location = ArtifactLocation::builder()
        .uri(document.name().to_string())
        .build();
    let physical = PhysicalLocation::builder()
        .artifact_location(artifact_location)
        .region(region)
        .build();
    match member_logical_location(node) {
        Some(logical) => Location::builder()
            .logical_locations(vec![logical])
            .physical_location(physical)
            .build(),
        None => Location::builder().physical_location(physical).build(),
    }
}

pub(crate) fn member_logical_location(node: &SyntaxNode) -> Option<LogicalLocation> {
    let member = node.ancestors().find(|ancestor| {
        matches!(
            ancestor.kind(),
            SyntaxKind::MethodDecl
                | SyntaxKind::ConstructorDecl
                | SyntaxKind::IndexerDecl
                | SyntaxKind::PropertyDecl
        )
    })?;
    let type_name = qualified_type_name(&member)?;
    let member_name = member_name(&member)?;
    Some(
        LogicalLocation::builder()
            .name(format!("{type_name}.{member_name}"))
            .kind("function")
            .build(),
    )
}

fn member_name(member: &SyntaxNode) -> Option<String> {
    use crate::syntax::ast::{ConstructorDecl, MethodDecl, PropertyDecl};
    match member.kind() {
        SyntaxKind::MethodDecl => MethodDecl::cast(member.clone())?.name(),
        SyntaxKind::ConstructorDecl => ConstructorDecl::cast(member.clone())?.name(),
        SyntaxKind::PropertyDecl => PropertyDecl::cast(member.clone())?.name(),
        SyntaxKind::IndexerDecl => Some("this[]".to_string()),
        _ => None,
    }
}

/// `Namespace.Outer.Inner` for the type declaring `member`.
fn qualified_type_name(member: &SyntaxNode) -> Option<String> {
    let mut segments = Vec::new();
    for ancestor in member.ancestors().skip(1) {
        if let Some(declaration) = TypeDecl::cast(ancestor.clone()) {
            segments.push(declaration.name()?);
        } else if let Some(namespace) = NamespaceDecl::cast(ancestor) {
            segments.extend(namespace.name());
        }
    }
    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join("."))
}

/// A member is visible outside its assembly when it and every enclosing
/// type are `public` or `protected`.
pub(crate) fn is_public_or_protected(member: &SyntaxNode) -> bool {
    let member_visible = has_modifier(member, "public") || has_modifier(member, "protected");
    member_visible
        && member
            .ancestors()
            .skip(1)
            .filter_map(TypeDecl::cast)
            .all(|declaration| declaration.is_public_or_protected())
}

pub(crate) fn result_message(text: impl Into<String>) -> Message {
    Message::builder().text(text.into()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::MethodDecl;

    #[test]
    fn all_rules_have_unique_ids() {
        let rules = all_rules();
        assert!(!rules.is_empty(), "At least one rule must be registered");

        let mut ids: Vec<_> = rules.iter().map(|r| r.metadata().id).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total, "Rule IDs must be unique");
    }

    #[test]
    fn all_rules_have_non_empty_metadata() {
        for rule in all_rules() {
            let meta = rule.metadata();
            assert!(!meta.id.is_empty(), "Rule ID must not be empty");
            assert!(!meta.name.is_empty(), "Rule name must not be empty");
            assert!(
                !meta.description.is_empty(),
                "Rule description must not be empty"
            );
        }
    }

    fn method(document: &Document, name: &str) -> MethodDecl {
        document
            .root()
            .descendants()
            .filter_map(MethodDecl::cast)
            .find(|method| method.name().as_deref() == Some(name))
            .expect("method")
    }

    #[test]
    fn location_has_region_and_member() {
        let source = "namespace App.Core\n{\n    public class Outer\n    {\n        public class Inner\n        {\n            public string Find(string key) { return key; }\n        }\n    }\n}\n";
        let document = Document::parse("file:///src/Inner.cs", source).expect("parse");
        let method = method(&document, "Find");
        let ty = method.return_type().expect("return type");
        let location = node_location(&document, &ty);

        let value = serde_json::to_value(&location).expect("serialize location");
        assert_eq!(value["physicalLocation"]["region"]["startLine"], 7);
        assert_eq!(value["physicalLocation"]["region"]["startColumn"], 20);
        assert_eq!(value["physicalLocation"]["region"]["endColumn"], 26);
        assert_eq!(
            value["physicalLocation"]["artifactLocation"]["uri"],
            "file:///src/Inner.cs"
        );
        assert_eq!(
            value["logicalLocations"][0]["name"],
            "App.Core.Outer.Inner.Find"
        );
    }

    #[test]
    fn visibility_includes_enclosing_types() {
        let source = "public class A\n{\n    public void Visible(string s) { }\n    protected void Derived(string s) { }\n    internal void Hidden(string s) { }\n    private class B { public void Nested(string s) { } }\n}\n";
        let document = Document::parse("A.cs", source).expect("parse");
        assert!(is_public_or_protected(method(&document, "Visible").syntax()));
        assert!(is_public_or_protected(method(&document, "Derived").syntax()));
        assert!(!is_public_or_protected(method(&document, "Hidden").syntax()));
        assert!(!is_public_or_protected(method(&document, "Nested").syntax()));
    }
}
