use crate::semantic::{ParameterSymbol, SemanticModel};
use crate::syntax::ast::{
    AstNode, ExpressionStatement, GenericName, IdentifierName, Invocation, MemberAccess,
};
use crate::syntax::{SyntaxKind, SyntaxNode};

use super::predicate::PredicateExpression;

/// Static methods of `Contract` that state a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AssertionKind {
    Requires,
    Ensures,
    Invariant,
    Assert,
    Assume,
}

impl AssertionKind {
    fn from_method_name(name: &str) -> Option<Self> {
        match name {
            "Requires" => Some(Self::Requires),
            "Ensures" => Some(Self::Ensures),
            "Invariant" => Some(Self::Invariant),
            "Assert" => Some(Self::Assert),
            "Assume" => Some(Self::Assume),
            _ => None,
        }
    }

    fn contract_kind(self) -> Option<ContractKind> {
        match self {
            Self::Requires => Some(ContractKind::Precondition),
            Self::Ensures => Some(ContractKind::Postcondition),
            Self::Invariant | Self::Assert | Self::Assume => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContractKind {
    Precondition,
    Postcondition,
}

/// The optional user message of an assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Message {
    None,
    Literal(String),
    Identifier(String),
    Call(String),
}

impl Message {
    fn from_argument(expression: Option<&SyntaxNode>) -> Self {
        let Some(expression) = expression else {
            return Self::None;
        };
        let text = expression.trimmed_text();
        match expression.kind() {
            SyntaxKind::Literal => Self::Literal(text),
            SyntaxKind::IdentifierName | SyntaxKind::MemberAccess => Self::Identifier(text),
            SyntaxKind::Invocation => Self::Call(text),
            _ => Self::None,
        }
    }
}

/// A `Contract.Requires` or `Contract.Ensures` statement.
#[derive(Clone, Debug)]
pub(crate) struct Assertion {
    pub(crate) kind: ContractKind,
    pub(crate) predicate: PredicateExpression,
    pub(crate) message: Message,
    pub(crate) statement: SyntaxNode,
    /// `TException` of `Contract.Requires<TException>(...)`.
    pub(crate) exception_type: Option<SyntaxNode>,
}

impl Assertion {
    /// Reads an assertion from an expression statement. Calls of other
    /// `Contract` methods and of anything that is not `Contract` yield `None`.
    pub(crate) fn from_statement(statement: &SyntaxNode, model: &SemanticModel) -> Option<Self> {
        let call = ContractCall::from_statement(statement, model)?;
        let kind = call.kind.contract_kind()?;
        let arguments = call.invocation.arguments();
        let condition = arguments.first()?.expression()?;
        let message = arguments.get(1).and_then(|argument| argument.expression());
        Some(Self {
            kind,
            predicate: PredicateExpression::create(&condition, model),
            message: Message::from_argument(message.as_ref()),
            statement: statement.clone(),
            exception_type: call.exception_type,
        })
    }

    pub(crate) fn checks_not_null(&self, parameter: &ParameterSymbol) -> bool {
        self.kind == ContractKind::Precondition && self.predicate.has_not_null_check(parameter)
    }

    pub(crate) fn checks_result_not_null(&self) -> bool {
        self.kind == ContractKind::Postcondition && self.predicate.has_result_not_null_check()
    }

    pub(crate) fn uses(&self, parameter: &ParameterSymbol) -> bool {
        self.predicate.contains(parameter)
    }
}

struct ContractCall {
    kind: AssertionKind,
    invocation: Invocation,
    exception_type: Option<SyntaxNode>,
}

impl ContractCall {
    fn from_statement(statement: &SyntaxNode, model: &SemanticModel) -> Option<Self> {
        let statement = ExpressionStatement::cast(statement.clone())?;
        let invocation = Invocation::cast(statement.expression()?)?;
        let access = MemberAccess::cast(invocation.expression()?)?;
        let is_dot = access
            .syntax()
            .child_tokens()
            .next()
            .is_some_and(|token| token.is_punct("."));
        if !is_dot || !model.is_contract_class(&access.receiver()?) {
            return None;
        }
        let member = access.name()?;
        let (name, exception_type) = match member.kind() {
            SyntaxKind::IdentifierName => (IdentifierName::cast(member)?.text(), None),
            SyntaxKind::GenericName => {
                let generic = GenericName::cast(member)?;
                let mut arguments = generic.type_arguments();
                let exception = (arguments.len() == 1).then(|| arguments.pop()).flatten();
                (generic.identifier()?, exception)
            }
            _ => return None,
        };
        let kind = AssertionKind::from_method_name(&name)?;
        // Only the generic form of `Requires` names an exception.
        let exception_type = if kind == AssertionKind::Requires {
            exception_type
        } else {
            None
        };
        Some(Self {
            kind,
            invocation,
            exception_type,
        })
    }
}
