use std::sync::Arc;

use anyhow::{Context, Result};
use opentelemetry::{Context as OtelContext, KeyValue};
use rayon::prelude::*;
use serde_sarif::sarif::{MultiformatMessageString, ReportingDescriptor, Result as SarifResult};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::document::Document;
use crate::rules::{Rule, RuleMetadata, all_rules};
use crate::telemetry::{Telemetry, with_child_span, with_span};

/// Inputs shared by analysis rules.
pub(crate) struct AnalysisContext {
    documents: Vec<Document>,
    config: AnalysisConfig,
    telemetry: Option<Arc<Telemetry>>,
}

impl AnalysisContext {
    pub(crate) fn new(
        documents: Vec<Document>,
        config: AnalysisConfig,
        telemetry: Option<Arc<Telemetry>>,
    ) -> Self {
        Self {
            documents,
            config,
            telemetry,
        }
    }

    pub(crate) fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub(crate) fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub(crate) fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_deref()
    }

    /// Runs `f` for every document in parallel and concatenates the results
    /// in document order. Each call gets its own span under the caller's.
    pub(crate) fn flat_map_documents<F>(&self, f: F) -> Result<Vec<SarifResult>>
    where
        F: Fn(&Document) -> Result<Vec<SarifResult>> + Send + Sync,
    {
        let parent = OtelContext::current();
        let per_document = self
            .documents
            .par_iter()
            .map(|document| {
                let attributes =
                    [KeyValue::new("contractor.document", document.name().to_string())];
                with_child_span(self.telemetry(), "document", &attributes, &parent, || f(document))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(per_document.into_iter().flatten().collect())
    }
}

/// Analysis engine that executes the registered rules.
pub(crate) struct Engine {
    rules: Vec<Box<dyn Rule + Send + Sync>>,
}

impl Engine {
    /// Registered rules sorted by id, minus those the configuration disables.
    pub(crate) fn new(config: &AnalysisConfig) -> Self {
        let mut rules: Vec<_> = all_rules()
            .into_iter()
            .filter(|rule| !config.is_disabled(rule.metadata().id))
            .collect();
        rules.sort_by(|a, b| a.metadata().id.cmp(b.metadata().id));
        Self { rules }
    }

    pub(crate) fn analyze(&self, context: &AnalysisContext) -> Result<EngineOutput> {
        let mut rules = Vec::new();
        let mut results = Vec::new();
        debug!(documents = context.documents().len(), rules = self.rules.len(), "starting analysis");

        for rule in &self.rules {
            let metadata = rule.metadata();
            rules.push(rule_descriptor(&metadata));
            let rule_span_attributes = [KeyValue::new("contractor.rule_id", metadata.id)];
            let mut rule_results = with_span(
                context.telemetry(),
                &format!("rule:{}", metadata.id),
                &rule_span_attributes,
                || rule.run(context),
            )
            .with_context(|| format!("rule {} failed", metadata.id))?;
            debug!(rule = metadata.id, results = rule_results.len(), "rule finished");
            for result in &mut rule_results {
                if result.rule_id.is_none() {
                    result.rule_id = Some(metadata.id.to_string());
                }
            }
            results.extend(rule_results);
        }

        results.sort_by_cached_key(result_sort_key);

        Ok(EngineOutput { rules, results })
    }
}

/// Aggregated SARIF payload from rule execution.
pub(crate) struct EngineOutput {
    pub(crate) rules: Vec<ReportingDescriptor>,
    pub(crate) results: Vec<SarifResult>,
}

fn rule_descriptor(metadata: &RuleMetadata) -> ReportingDescriptor {
    ReportingDescriptor::builder()
        .id(metadata.id)
        .name(metadata.name)
        .short_description(
            MultiformatMessageString::builder()
                .text(metadata.description)
                .build(),
        )
        .build()
}

/// Rule id, file, line, column, then message.
fn result_sort_key(result: &SarifResult) -> (String, String, i64, i64, String) {
    let physical = result
        .locations
        .as_ref()
        .and_then(|locations| locations.first())
        .and_then(|location| location.physical_location.as_ref());
    let uri = physical
        .and_then(|physical| physical.artifact_location.as_ref())
        .and_then(|artifact| artifact.uri.clone())
        .unwrap_or_default();
    let region = physical.and_then(|physical| physical.region.as_ref());
    let line = region.and_then(|region| region.start_line).unwrap_or(0);
    let column = region.and_then(|region| region.start_column).unwrap_or(0);
    (
        result.rule_id.clone().unwrap_or_default(),
        uri,
        line,
        column,
        result.message.text.clone().unwrap_or_default(),
    )
}
