use crate::semantic::{ParameterSymbol, SemanticModel};
use crate::syntax::ast::{AstNode, Block};
use crate::syntax::{SyntaxKind, SyntaxNode};

use super::assertion::{Assertion, ContractKind};

/// The `Contract.Requires` and `Contract.Ensures` statements of one body,
/// in body order.
///
/// Only statements directly inside the body count; assertions nested in
/// `if` blocks or other statements are not part of the contract.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContractBlock {
    preconditions: Vec<Assertion>,
    postconditions: Vec<Assertion>,
}

impl ContractBlock {
    pub(crate) fn for_body(body: &Block, model: &SemanticModel) -> Self {
        let mut block = Self::default();
        for statement in body.statements() {
            if statement.kind() != SyntaxKind::ExpressionStatement {
                continue;
            }
            let Some(assertion) = Assertion::from_statement(&statement, model) else {
                continue;
            };
            match assertion.kind {
                ContractKind::Precondition => block.preconditions.push(assertion),
                ContractKind::Postcondition => block.postconditions.push(assertion),
            }
        }
        block
    }

    /// Contract block of a method, constructor or accessor. Declarations
    /// without a block body have an empty contract.
    pub(crate) fn for_declaration(declaration: &SyntaxNode, model: &SemanticModel) -> Self {
        body_of(declaration)
            .map(|body| Self::for_body(&body, model))
            .unwrap_or_default()
    }

    pub(crate) fn preconditions(&self) -> &[Assertion] {
        &self.preconditions
    }

    pub(crate) fn checks_not_null(&self, parameter: &ParameterSymbol) -> bool {
        self.preconditions
            .iter()
            .any(|assertion| assertion.checks_not_null(parameter))
    }

    pub(crate) fn ensures_result_not_null(&self) -> bool {
        self.postconditions
            .iter()
            .any(Assertion::checks_result_not_null)
    }
}

/// The block body of a function-like declaration.
pub(crate) fn body_of(declaration: &SyntaxNode) -> Option<Block> {
    match declaration.kind() {
        SyntaxKind::MethodDecl
        | SyntaxKind::ConstructorDecl
        | SyntaxKind::OperatorDecl
        | SyntaxKind::DestructorDecl
        | SyntaxKind::Accessor => declaration.children().find_map(Block::cast),
        _ => None,
    }
}
