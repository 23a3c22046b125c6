use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::document::Document;
use crate::refactorings::{
    AddNotNullEnsures, AddNotNullRequires, CancellationToken, CodeContractRefactoring,
    RefactoringError,
};
use crate::rules::argument_not_null::missing_preconditions;
use crate::rules::result_not_null::missing_postconditions;
use crate::semantic::ParameterSymbol;

const PRECONDITION_RULE: &str = "CC001";
const POSTCONDITION_RULE: &str = "CC002";

/// A document after every available contract refactoring was applied.
pub(crate) struct FixOutcome {
    pub(crate) document: Document,
    pub(crate) applied: usize,
}

/// Applies available refactorings until none remain: all preconditions in
/// document order first, then postconditions. Each step re-reads the new
/// snapshot, since an edit shifts every position after it.
pub(crate) fn fix_document(
    document: Document,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<FixOutcome, RefactoringError> {
    let limit = document.root().descendants().count();
    let mut current = document;
    let mut applied = 0;
    while applied <= limit {
        cancel.check()?;
        let Some(next) = next_fix(&current, config, cancel)? else {
            debug!(document = current.name(), applied, "no fixes left");
            return Ok(FixOutcome {
                document: current,
                applied,
            });
        };
        current = next;
        applied += 1;
    }
    warn!(document = current.name(), applied, "fixes did not converge");
    Ok(FixOutcome {
        document: current,
        applied,
    })
}

fn next_fix(
    document: &Document,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<Option<Document>, RefactoringError> {
    if !config.is_disabled(PRECONDITION_RULE) {
        if let Some(parameter) = missing_preconditions(document, config.public_only).into_iter().next() {
            let refactoring =
                AddNotNullRequires::for_parameter(document, ParameterSymbol::Declared(parameter));
            return refactoring.apply(cancel).map(Some);
        }
    }
    if !config.is_disabled(POSTCONDITION_RULE) {
        if let Some(method) = missing_postconditions(document, config.public_only).into_iter().next() {
            return AddNotNullEnsures::for_method(document, method).apply(cancel).map(Some);
        }
    }
    Ok(None)
}
