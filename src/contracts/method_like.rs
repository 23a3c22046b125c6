use crate::refactorings::RefactoringError;
use crate::semantic::{ParameterSymbol, SemanticModel};
use crate::syntax::ast::{Accessor, AstNode, Block, ConstructorDecl, IndexerDecl, MethodDecl};
use crate::syntax::{GreenNode, SyntaxKind, SyntaxNode};

use super::anchor::{postcondition_anchor, precondition_anchor};
use super::block::ContractBlock;
use super::synth::{insert_statement, not_null_postcondition, not_null_precondition, unwrap_return_type};

/// A body replacement produced by a rewrite: the old block and its new green.
pub(crate) type BodyEdit = (SyntaxNode, GreenNode);

/// A single function-like declaration with its own body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Declaration {
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Accessor(Accessor),
}

impl Declaration {
    pub(crate) fn syntax(&self) -> &SyntaxNode {
        match self {
            Declaration::Method(method) => method.syntax(),
            Declaration::Constructor(constructor) => constructor.syntax(),
            Declaration::Accessor(accessor) => accessor.syntax(),
        }
    }

    pub(crate) fn body(&self) -> Option<Block> {
        match self {
            Declaration::Method(method) => method.body(),
            Declaration::Constructor(constructor) => constructor.body(),
            Declaration::Accessor(accessor) => accessor.body(),
        }
    }

    /// Parameters in declaration order. Accessors see the indexer's
    /// parameters, and setters end with `value`.
    pub(crate) fn parameters(&self) -> Vec<ParameterSymbol> {
        match self {
            Declaration::Method(method) => declared(method.parameters()),
            Declaration::Constructor(constructor) => declared(constructor.parameters()),
            Declaration::Accessor(accessor) => accessor_parameters(accessor),
        }
    }
}

/// Methods, constructors and accessors on one side; indexers, whose
/// parameters belong to every accessor, on the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MethodLike {
    Declaration(Declaration),
    AccessorPair(IndexerDecl),
}

impl MethodLike {
    /// The member a parameter belongs to. Lambda, operator and delegate
    /// parameters have none.
    pub(crate) fn for_parameter(parameter: &ParameterSymbol) -> Option<Self> {
        match parameter {
            ParameterSymbol::SetterValue(accessor) => {
                Some(MethodLike::Declaration(Declaration::Accessor(accessor.clone())))
            }
            ParameterSymbol::Declared(parameter) => {
                let owner = parameter.owner()?;
                match owner.kind() {
                    SyntaxKind::MethodDecl => MethodDecl::cast(owner)
                        .map(|method| MethodLike::Declaration(Declaration::Method(method))),
                    SyntaxKind::ConstructorDecl => ConstructorDecl::cast(owner)
                        .map(|constructor| MethodLike::Declaration(Declaration::Constructor(constructor))),
                    SyntaxKind::IndexerDecl => IndexerDecl::cast(owner).map(MethodLike::AccessorPair),
                    _ => None,
                }
            }
        }
    }

    pub(crate) fn syntax(&self) -> &SyntaxNode {
        match self {
            MethodLike::Declaration(declaration) => declaration.syntax(),
            MethodLike::AccessorPair(indexer) => indexer.syntax(),
        }
    }

    /// No block body to put contracts in.
    pub(crate) fn is_abstract(&self) -> bool {
        match self {
            MethodLike::Declaration(declaration) => declaration.body().is_none(),
            MethodLike::AccessorPair(indexer) => indexer
                .accessors()
                .first()
                .is_none_or(|accessor| accessor.body().is_none()),
        }
    }

    /// Whether a not-null precondition for `parameter` already exists. An
    /// indexer needs one in every accessor that has a body.
    pub(crate) fn checked_in_contract(&self, parameter: &ParameterSymbol, model: &SemanticModel) -> bool {
        match self {
            MethodLike::Declaration(declaration) => declaration
                .body()
                .is_some_and(|body| ContractBlock::for_body(&body, model).checks_not_null(parameter)),
            MethodLike::AccessorPair(indexer) => indexer
                .accessors()
                .iter()
                .filter_map(Accessor::body)
                .all(|body| ContractBlock::for_body(&body, model).checks_not_null(parameter)),
        }
    }

    /// Body edits adding `Contract.Requires(parameter != null)`. For an
    /// indexer only the accessors that lack the check are touched.
    pub(crate) fn add_requires(
        &self,
        parameter: &ParameterSymbol,
        model: &SemanticModel,
    ) -> Result<Vec<BodyEdit>, RefactoringError> {
        let name = parameter
            .name()
            .ok_or_else(|| RefactoringError::UnsupportedDeclaration("parameter without a name".to_string()))?;
        match self {
            MethodLike::Declaration(declaration) => {
                let body = declaration
                    .body()
                    .ok_or_else(|| unsupported(declaration.syntax(), "no block body"))?;
                let edit = requires_edit(&body, parameter, &declaration.parameters(), &name, model)?;
                Ok(vec![edit])
            }
            MethodLike::AccessorPair(indexer) => {
                let mut edits = Vec::new();
                for accessor in indexer.accessors() {
                    let Some(body) = accessor.body() else {
                        continue;
                    };
                    if ContractBlock::for_body(&body, model).checks_not_null(parameter) {
                        continue;
                    }
                    let parameters = accessor_parameters(&accessor);
                    edits.push(requires_edit(&body, parameter, &parameters, &name, model)?);
                }
                if edits.is_empty() {
                    return Err(unsupported(indexer.syntax(), "no accessor body to check"));
                }
                Ok(edits)
            }
        }
    }

    /// Body edit adding `Contract.Ensures(Contract.Result<T>() != null)`.
    pub(crate) fn add_ensures(&self, model: &SemanticModel) -> Result<Vec<BodyEdit>, RefactoringError> {
        let MethodLike::Declaration(Declaration::Method(method)) = self else {
            return Err(unsupported(self.syntax(), "postconditions need a method"));
        };
        let return_type = method
            .return_type()
            .ok_or_else(|| unsupported(method.syntax(), "no return type"))?;
        let result_type =
            unwrap_return_type(&return_type, model).ok_or_else(|| unsupported(method.syntax(), "no result value"))?;
        let body = method
            .body()
            .ok_or_else(|| unsupported(method.syntax(), "no block body"))?;
        let contract = ContractBlock::for_body(&body, model);
        let statement = not_null_postcondition(&result_type)?;
        let anchor = postcondition_anchor(&contract);
        Ok(vec![(body.syntax().clone(), insert_statement(&body, &anchor, statement))])
    }
}

fn requires_edit(
    body: &Block,
    parameter: &ParameterSymbol,
    parameters: &[ParameterSymbol],
    name: &str,
    model: &SemanticModel,
) -> Result<BodyEdit, RefactoringError> {
    let contract = ContractBlock::for_body(body, model);
    let anchor = precondition_anchor(parameter, &contract, parameters);
    let statement = not_null_precondition(name)?;
    Ok((body.syntax().clone(), insert_statement(body, &anchor, statement)))
}

fn declared(parameters: Vec<crate::syntax::ast::Parameter>) -> Vec<ParameterSymbol> {
    parameters.into_iter().map(ParameterSymbol::Declared).collect()
}

fn accessor_parameters(accessor: &Accessor) -> Vec<ParameterSymbol> {
    let mut parameters = accessor
        .owner()
        .and_then(IndexerDecl::cast)
        .map(|indexer| declared(indexer.parameters()))
        .unwrap_or_default();
    if accessor.is_setter() {
        parameters.push(ParameterSymbol::SetterValue(accessor.clone()));
    }
    parameters
}

fn unsupported(node: &SyntaxNode, reason: &str) -> RefactoringError {
    RefactoringError::UnsupportedDeclaration(format!("{:?}: {reason}", node.kind()))
}
