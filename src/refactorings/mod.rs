//! "Add not-null precondition" and "add not-null postcondition".
//!
//! A refactoring is created for a caret position (or directly for a
//! parameter or method), reports whether it applies, and when it does
//! produces a new document snapshot. Applying an unavailable refactoring
//! is an error, never a silent no-op.

pub(crate) mod add_ensures;
pub(crate) mod add_requires;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::debug;

use crate::contracts::imports::ensure_contracts_imported;
use crate::contracts::method_like::BodyEdit;
use crate::document::Document;
use crate::syntax::SyntaxError;

pub(crate) use add_ensures::AddNotNullEnsures;
pub(crate) use add_requires::AddNotNullRequires;

#[derive(Debug, Error)]
pub(crate) enum RefactoringError {
    #[error("refactoring is not available at the selection")]
    NotAvailable,
    #[error("unsupported declaration: {0}")]
    UnsupportedDeclaration(String),
    #[error("refactoring was cancelled")]
    Cancelled,
    #[error("generated code does not parse: {0}")]
    Syntax(#[from] SyntaxError),
}

/// The refactoring a caret request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum RefactoringKind {
    /// Add `Contract.Requires(parameter != null)`.
    Requires,
    /// Add `Contract.Ensures(Contract.Result<T>() != null)`.
    Ensures,
}

impl fmt::Display for RefactoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requires => f.write_str("not-null precondition"),
            Self::Ensures => f.write_str("not-null postcondition"),
        }
    }
}

/// Runs the `kind` refactoring for the caret at `offset`.
pub(crate) fn apply_at(
    document: &Document,
    offset: usize,
    kind: RefactoringKind,
    cancel: &CancellationToken,
) -> Result<Document, RefactoringError> {
    let refactoring: Box<dyn CodeContractRefactoring + '_> = match kind {
        RefactoringKind::Requires => Box::new(AddNotNullRequires::at(document, offset)),
        RefactoringKind::Ensures => Box::new(AddNotNullEnsures::at(document, offset)),
    };
    refactoring.apply(cancel)
}

/// Common interface of both refactorings.
pub(crate) trait CodeContractRefactoring {
    fn is_available(&self) -> bool;
    fn apply(&self, cancel: &CancellationToken) -> Result<Document, RefactoringError>;
}

/// Advisory cancellation flag shared between a host and running refactorings.
#[derive(Clone, Debug, Default)]
pub(crate) struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<(), RefactoringError> {
        if self.is_cancelled() {
            return Err(RefactoringError::Cancelled);
        }
        Ok(())
    }
}

/// Swaps the edited bodies into a new tree and normalizes the imports.
fn rewrite(
    document: &Document,
    edits: &[BodyEdit],
    cancel: &CancellationToken,
) -> Result<Document, RefactoringError> {
    cancel.check()?;
    let edited = document.with_root(document.root().replace_descendants(edits));
    cancel.check()?;
    let imported = ensure_contracts_imported(edited.root())?;
    debug!(document = document.name(), edits = edits.len(), "applied contract edits");
    Ok(edited.with_root(imported))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(RefactoringError::Cancelled)));
    }

    #[test]
    fn caret_requests_pick_the_refactoring() {
        let source = "class C\n{\n    string M(string s)\n    {\n        return s;\n    }\n}\n";
        let document = Document::parse("C.cs", source).expect("parse");
        let cancel = CancellationToken::new();

        let on_parameter = source.find("s)").expect("offset");
        let requires =
            apply_at(&document, on_parameter, RefactoringKind::Requires, &cancel).expect("requires");
        assert!(requires.text().contains("Contract.Requires(s != null);"));
        assert!(!requires.text().contains("Contract.Ensures"));

        let ensures =
            apply_at(&document, on_parameter, RefactoringKind::Ensures, &cancel).expect("ensures");
        assert!(ensures.text().contains("Contract.Ensures(Contract.Result<string>() != null);"));

        let on_class = source.find("class").expect("offset");
        assert!(matches!(
            apply_at(&document, on_class, RefactoringKind::Requires, &cancel),
            Err(RefactoringError::NotAvailable)
        ));
    }

    #[test]
    fn cancelled_requests_do_not_rewrite() {
        let source = "class C { void M(string s) { } }";
        let document = Document::parse("C.cs", source).expect("parse");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let offset = source.find("s)").expect("offset");
        assert!(matches!(
            apply_at(&document, offset, RefactoringKind::Requires, &cancel),
            Err(RefactoringError::Cancelled)
        ));
    }
}
