//! Builders for new assertion statements and their placement in a body.

use crate::semantic::{SemanticModel, TypeSymbol};
use crate::syntax::ast::{AstNode, Block, GenericName};
use crate::syntax::parser::parse_statement;
use crate::syntax::{GreenNode, SyntaxError, SyntaxKind, SyntaxNode, SyntaxToken, is_reserved_keyword};

use super::anchor::Anchor;

const TASKS_NAMESPACE: &str = "System.Threading.Tasks";

/// `Contract.Requires(<name> != null);`
pub(crate) fn not_null_precondition(parameter_name: &str) -> Result<GreenNode, SyntaxError> {
    let name = if is_reserved_keyword(parameter_name) {
        format!("@{parameter_name}")
    } else {
        parameter_name.to_string()
    };
    parse_statement(&format!("Contract.Requires({name} != null);"))
}

/// `Contract.Ensures(Contract.Result<T>() != null);` for an already
/// unwrapped result type.
pub(crate) fn not_null_postcondition(result_type: &SyntaxNode) -> Result<GreenNode, SyntaxError> {
    let ty = result_type.trimmed_text();
    parse_statement(&format!("Contract.Ensures(Contract.Result<{ty}>() != null);"))
}

/// The type a postcondition talks about: `T` for
/// `System.Threading.Tasks.Task<T>`, the declared type otherwise. `None` for
/// the non-generic `Task`, which has no result.
pub(crate) fn unwrap_return_type(return_type: &SyntaxNode, model: &SemanticModel) -> Option<SyntaxNode> {
    let task_arity = match model.resolve_type(return_type) {
        Some(TypeSymbol::Named(named)) if named.namespace == TASKS_NAMESPACE && named.name == "Task" => {
            named.type_arguments.len()
        }
        _ => return Some(return_type.clone()),
    };
    if task_arity == 0 {
        return None;
    }
    let simple = match return_type.kind() {
        SyntaxKind::QualifiedName => return_type.children().last()?,
        _ => return_type.clone(),
    };
    // An alias naming `Task<T>` has no argument syntax to copy.
    let mut arguments = GenericName::cast(simple)?.type_arguments();
    if arguments.len() == 1 { arguments.pop() } else { None }
}

/// Inserts `statement` into `body` at `anchor`, formatted to match the
/// surrounding code, and returns the new body.
pub(crate) fn insert_statement(body: &Block, anchor: &Anchor, statement: GreenNode) -> GreenNode {
    let node = body.syntax();
    let (index, previous) = match anchor {
        Anchor::After(statement) if statement.parent().as_ref() == Some(node) => {
            (statement.index() + 1, statement.last_token())
        }
        _ => {
            let open = body.open_brace();
            (open.as_ref().map(|token| token.index() + 1).unwrap_or(0), open)
        }
    };
    let previous_trailing = previous
        .as_ref()
        .map(|token| token.green().trailing().to_string())
        .unwrap_or_default();

    let statement = if let Some(newline) = line_break(&previous_trailing) {
        let indent = following_statement(node, index)
            .and_then(|next| indentation(&next))
            .or_else(|| match anchor {
                Anchor::After(statement) => indentation(statement),
                Anchor::Start => None,
            })
            .unwrap_or_else(|| nested_indentation(body));
        statement
            .with_leading_trivia(&indent)
            .with_trailing_trivia(newline)
    } else {
        let leading = if previous_trailing.is_empty() { " " } else { "" };
        statement.with_leading_trivia(leading).with_trailing_trivia(" ")
    };
    node.green().insert_child(index, statement.into())
}

/// `"\r\n"` or `"\n"` when the trivia ends a line.
fn line_break(trivia: &str) -> Option<&'static str> {
    if trivia.ends_with("\r\n") {
        Some("\r\n")
    } else if trivia.ends_with('\n') || trivia.ends_with('\r') {
        Some("\n")
    } else {
        None
    }
}

fn following_statement(body: &SyntaxNode, index: usize) -> Option<SyntaxNode> {
    body.children().find(|child| child.index() >= index)
}

/// Leading whitespace of the line a statement starts on.
fn indentation(statement: &SyntaxNode) -> Option<String> {
    let token = statement.first_token()?;
    line_indent(token.green().leading())
}

fn line_indent(leading: &str) -> Option<String> {
    let last_line = leading.rsplit(['\n', '\r']).next().unwrap_or(leading);
    last_line
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then(|| last_line.to_string())
}

/// Indentation for the first statement of an empty multi-line body: the
/// closing brace's indentation plus one level.
fn nested_indentation(body: &Block) -> String {
    let close = body
        .close_brace()
        .and_then(|token| line_indent(token.green().leading()))
        .unwrap_or_default();
    let unit = indent_unit(body, &close);
    format!("{close}{unit}")
}

/// One level of indentation, measured against the enclosing brace.
fn indent_unit(body: &Block, close: &str) -> String {
    let outer = body
        .syntax()
        .ancestors()
        .skip(1)
        .filter_map(|ancestor| closing_brace(&ancestor))
        .find_map(|token| line_indent(token.green().leading()));
    if let Some(outer) = outer {
        if let Some(unit) = close.strip_prefix(outer.as_str()) {
            if !unit.is_empty() {
                return unit.to_string();
            }
        }
    }
    if close.contains('\t') {
        "\t".to_string()
    } else {
        "    ".to_string()
    }
}

fn closing_brace(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.child_tokens().filter(|token| token.is_punct("}")).last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::syntax::ast::MethodDecl;

    fn method(source: &str) -> (Document, MethodDecl) {
        let document = Document::parse("C.cs", source).expect("parse");
        let method = document
            .root()
            .descendants()
            .find_map(MethodDecl::cast)
            .expect("method");
        (document, method)
    }

    fn insert_at_start(source: &str) -> String {
        let (_, decl) = method(source);
        let body = decl.body().expect("body");
        let statement = not_null_precondition("str").expect("statement");
        insert_statement(&body, &Anchor::Start, statement).trimmed_text()
    }

    #[test]
    fn builds_statements() {
        assert_eq!(
            not_null_precondition("str").expect("statement").text(),
            "Contract.Requires(str != null);"
        );
        assert_eq!(
            not_null_precondition("class").expect("statement").text(),
            "Contract.Requires(@class != null);"
        );
        let (_, decl) = method("class C { List<T> GetList() { return null; } }");
        let ty = decl.return_type().expect("type");
        assert_eq!(
            not_null_postcondition(&ty).expect("statement").text(),
            "Contract.Ensures(Contract.Result<List<T>>() != null);"
        );
    }

    fn unwrapped(source: &str) -> Option<String> {
        let (document, decl) = method(source);
        let return_type = decl.return_type().expect("type");
        unwrap_return_type(&return_type, document.semantic_model()).map(|ty| ty.trimmed_text())
    }

    #[test]
    fn unwraps_task_results() {
        assert_eq!(
            unwrapped("using System.Threading.Tasks;\nclass C { async Task<string> Get() { return null; } }"),
            Some("string".to_string())
        );
        assert_eq!(
            unwrapped("class C { System.Threading.Tasks.Task<int?> Get() { return null; } }"),
            Some("int?".to_string())
        );
        assert_eq!(unwrapped("using System.Threading.Tasks;\nclass C { async Task Run() { } }"), None);
        assert_eq!(
            unwrapped("using System.Threading.Tasks;\nclass C { ValueTask<string> Get() { return default; } }"),
            Some("ValueTask<string>".to_string())
        );
    }

    #[test]
    fn user_types_named_task_are_not_unwrapped() {
        assert_eq!(
            unwrapped("class Task<T> { }\nclass C { Task<int> Get() { return null; } }"),
            Some("Task<int>".to_string())
        );
        assert_eq!(
            unwrapped("class Task { }\nclass C { Task Get() { return null; } }"),
            Some("Task".to_string())
        );
        assert_eq!(
            unwrapped("namespace N { class Task { } class C { Task Get() { return null; } } }"),
            Some("Task".to_string())
        );
    }

    #[test]
    fn aliased_task_has_no_result_syntax() {
        assert_eq!(
            unwrapped("using Work = System.Threading.Tasks.Task<string>;\nclass C { Work Get() { return null; } }"),
            None
        );
        assert_eq!(
            unwrapped("using Work = System.Threading.Tasks.Task;\nclass C { Work Get() { return null; } }"),
            None
        );
    }

    #[test]
    fn inline_empty_body() {
        assert_eq!(
            insert_at_start("class C { void Foo(string str) { } }"),
            "{ Contract.Requires(str != null); }"
        );
        assert_eq!(
            insert_at_start("class C { void Foo(string str) {} }"),
            "{ Contract.Requires(str != null); }"
        );
    }

    #[test]
    fn multi_line_body_copies_statement_indentation() {
        let source = "class C\n{\n    void Foo(string str)\n    {\n        Console.WriteLine(str);\n    }\n}\n";
        assert_eq!(
            insert_at_start(source),
            "{\n        Contract.Requires(str != null);\n        Console.WriteLine(str);\n    }"
        );
    }

    #[test]
    fn empty_multi_line_body_indents_one_level() {
        let source = "class C\n{\n  void Foo(string str)\n  {\n  }\n}\n";
        assert_eq!(
            insert_at_start(source),
            "{\n    Contract.Requires(str != null);\n  }"
        );
        let source = "class C\n{\r\n\tvoid Foo(string str)\r\n\t{\r\n\t}\r\n}\r\n";
        assert_eq!(
            insert_at_start(source),
            "{\r\n\t\tContract.Requires(str != null);\r\n\t}"
        );
    }

    #[test]
    fn insertion_after_an_anchor_keeps_the_newline_style() {
        let source = "class C\r\n{\r\n    void Foo(string a, string str)\r\n    {\r\n        Contract.Requires(a != null);\r\n        Console.WriteLine(str);\r\n    }\r\n}\r\n";
        let (_, decl) = method(source);
        let body = decl.body().expect("body");
        let anchor = Anchor::After(body.statements().next().expect("statement"));
        let statement = not_null_precondition("str").expect("statement");
        assert_eq!(
            insert_statement(&body, &anchor, statement).trimmed_text(),
            "{\r\n        Contract.Requires(a != null);\r\n        Contract.Requires(str != null);\r\n        Console.WriteLine(str);\r\n    }"
        );
    }
}
