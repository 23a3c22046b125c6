use tracing::debug;

use crate::contracts::method_like::Declaration;
use crate::contracts::nullability::is_nullable;
use crate::contracts::synth::unwrap_return_type;
use crate::contracts::{ContractBlock, MethodLike};
use crate::document::Document;
use crate::syntax::ast::{AstNode, MethodDecl};

use super::{CancellationToken, CodeContractRefactoring, RefactoringError, rewrite};

/// Adds `Contract.Ensures(Contract.Result<T>() != null);` to a method.
#[derive(Debug)]
pub(crate) struct AddNotNullEnsures<'a> {
    document: &'a Document,
    method: Option<MethodDecl>,
}

impl<'a> AddNotNullEnsures<'a> {
    /// Refactoring for the method enclosing the caret at `offset`.
    pub(crate) fn at(document: &'a Document, offset: usize) -> Self {
        let method = document
            .covering_node(offset)
            .ancestors()
            .find_map(MethodDecl::cast);
        Self { document, method }
    }

    pub(crate) fn for_method(document: &'a Document, method: MethodDecl) -> Self {
        Self {
            document,
            method: Some(method),
        }
    }

    fn target(&self) -> Option<&MethodDecl> {
        let method = self.method.as_ref()?;
        let model = self.document.semantic_model();
        let return_type = method.return_type()?;
        let result_type = unwrap_return_type(&return_type, model)?;
        if !is_nullable(&result_type, model) {
            return None;
        }
        method.body()?;
        if ContractBlock::for_declaration(method.syntax(), model).ensures_result_not_null() {
            return None;
        }
        Some(method)
    }
}

impl CodeContractRefactoring for AddNotNullEnsures<'_> {
    fn is_available(&self) -> bool {
        self.target().is_some()
    }

    fn apply(&self, cancel: &CancellationToken) -> Result<Document, RefactoringError> {
        let method = self.target().ok_or(RefactoringError::NotAvailable)?;
        cancel.check()?;
        let method_like = MethodLike::Declaration(Declaration::Method(method.clone()));
        let edits = method_like.add_ensures(self.document.semantic_model())?;
        debug!(
            method = method.name().unwrap_or_default(),
            "adding not-null postcondition"
        );
        rewrite(self.document, &edits, cancel)
    }
}
