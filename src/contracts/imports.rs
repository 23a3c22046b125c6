use crate::syntax::ast::{AstNode, CompilationUnit, UsingDirective};
use crate::syntax::parser::parse_compilation_unit;
use crate::syntax::{GreenElement, GreenNode, SyntaxError, SyntaxKind, SyntaxNode};

use super::CONTRACTS_NAMESPACE;

/// Makes sure the file imports `System.Diagnostics.Contracts`.
///
/// A plain import at any level counts. Otherwise one directive is appended
/// after the last top-level `using` (or extern alias), or put first in the
/// file with any file header kept above it.
pub(crate) fn ensure_contracts_imported(root: &SyntaxNode) -> Result<GreenNode, SyntaxError> {
    let Some(unit) = CompilationUnit::cast(root.clone()) else {
        return Ok(root.green().clone());
    };
    if unit.all_usings().any(|using| imports_contracts(&using)) {
        return Ok(root.green().clone());
    }
    let newline = newline_style(&root.text());
    let directive = contracts_directive()?;

    let last_import = root
        .children()
        .filter(|child| matches!(child.kind(), SyntaxKind::UsingDirective | SyntaxKind::ExternAlias))
        .last();
    let green = match last_import {
        Some(last) => {
            let ends_line = last
                .last_token()
                .is_some_and(|token| token.green().trailing().ends_with('\n'));
            let leading = if ends_line { "" } else { newline };
            let directive = directive.with_leading_trivia(leading).with_trailing_trivia(newline);
            root.green().insert_child(last.index() + 1, directive.into())
        }
        None => {
            let Some(first) = root.green().first_token() else {
                return Ok(root.green().clone());
            };
            let (header, rest) = split_file_header(first.leading());
            let directive = directive.with_leading_trivia(header).with_trailing_trivia(newline);
            let rest = rest.to_string();
            let stripped = root.green().with_leading_trivia(&rest);
            let mut children: Vec<GreenElement> = vec![directive.into()];
            children.extend(stripped.children().iter().cloned());
            GreenNode::new(SyntaxKind::CompilationUnit, children)
        }
    };
    Ok(green)
}

fn imports_contracts(using: &UsingDirective) -> bool {
    if using.is_static() || using.alias().is_some() {
        return false;
    }
    using.target_text().is_some_and(|target| {
        target.strip_prefix("global::").unwrap_or(&target) == CONTRACTS_NAMESPACE
    })
}

fn contracts_directive() -> Result<GreenNode, SyntaxError> {
    let unit = parse_compilation_unit(&format!("using {CONTRACTS_NAMESPACE};"))?;
    let directive = unit.children().iter().find_map(|child| match child {
        GreenElement::Node(node) if node.kind() == SyntaxKind::UsingDirective => Some(node.clone()),
        _ => None,
    });
    directive.ok_or_else(|| SyntaxError::at("", 0, "using directive expected"))
}

/// `"\r\n"` when the file uses it, `"\n"` otherwise.
pub(crate) fn newline_style(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Splits the leading trivia of the first token into a file header and
/// the trivia belonging to the first declaration. The header is the leading
/// run of blank lines and plain `//` comments, cut after its last blank line
/// when it has one. Doc comments always stay with the declaration.
fn split_file_header(leading: &str) -> (&str, &str) {
    let mut run = 0;
    let mut after_blank = None;
    for line in leading.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if line.ends_with('\n') {
                after_blank = Some(run + line.len());
            }
        } else if !trimmed.starts_with("//") || is_doc_comment(trimmed) {
            break;
        }
        run += line.len();
    }
    leading.split_at(after_blank.unwrap_or(run))
}

fn is_doc_comment(comment: &str) -> bool {
    comment.starts_with("///") && !comment.starts_with("////")
}
