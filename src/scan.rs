use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use opentelemetry::{Context as OtelContext, KeyValue};
use rayon::prelude::*;
use serde_json::{Value, json};
use serde_sarif::sarif::{
    Artifact, ArtifactLocation, ArtifactRoles, Location, Message, Notification, PhysicalLocation,
    Region,
};
use tracing::warn;

use crate::document::Document;
use crate::syntax::SyntaxError;
use crate::telemetry::{Telemetry, with_child_span};

const UTF8_BOM: &str = "\u{feff}";

/// Snapshot of the parsed sources.
pub(crate) struct ScanOutput {
    pub(crate) files: Vec<ScannedFile>,
}

impl ScanOutput {
    /// SARIF artifacts describing the files as they currently are, so they
    /// stay accurate after `--fix` rewrote them.
    pub(crate) fn artifacts(&self) -> Result<Vec<Artifact>> {
        let roles = vec![
            serde_json::to_value(ArtifactRoles::AnalysisTarget).context("serialize artifact role")?,
        ];
        Ok(self
            .files
            .iter()
            .map(|file| artifact(file, roles.clone()))
            .collect())
    }

    /// One warning notification per member the parser had to skip.
    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.files
            .iter()
            .flat_map(|file| {
                file.document
                    .skipped_members()
                    .iter()
                    .map(|error| skipped_member_notification(file.document.name(), error))
            })
            .collect()
    }

    pub(crate) fn into_documents(self) -> Vec<Document> {
        self.files.into_iter().map(|file| file.document).collect()
    }
}

/// One parsed source file.
pub(crate) struct ScannedFile {
    pub(crate) path: PathBuf,
    pub(crate) document: Document,
    /// The file started with a UTF-8 byte order mark, which is not part of
    /// the document text.
    pub(crate) bom: bool,
}

impl ScannedFile {
    /// Writes the document text back to the file, keeping the byte order mark.
    pub(crate) fn write(&self) -> Result<()> {
        let bom = if self.bom { UTF8_BOM } else { "" };
        fs::write(&self.path, format!("{bom}{}", self.document.text()))
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Parses a rewritten document again so skipped member positions refer
    /// to its current text.
    pub(crate) fn reparsed(self) -> Result<Self> {
        let document = Document::parse(self.document.name(), self.document.text())
            .with_context(|| format!("failed to reparse {}", self.path.display()))?;
        Ok(Self { document, ..self })
    }
}

/// Parses `input`, a `.cs` file or a directory searched recursively. Files
/// are visited in sorted path order and parsed in parallel.
pub(crate) fn scan_inputs(input: &Path, telemetry: Option<&Telemetry>) -> Result<ScanOutput> {
    let paths = if input.is_dir() {
        let mut paths = Vec::new();
        collect_sources(input, &mut paths)?;
        paths
    } else if is_source_path(input) {
        vec![input.to_path_buf()]
    } else {
        anyhow::bail!("unsupported input file: {}", input.display())
    };

    let parent = OtelContext::current();
    let files = paths
        .par_iter()
        .map(|path| {
            let attributes = [KeyValue::new(
                "contractor.source_path",
                path.display().to_string(),
            )];
            with_child_span(telemetry, "source.scan", &attributes, &parent, || parse_source(path))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ScanOutput { files })
}

fn collect_sources(path: &Path, sources: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?
    {
        let entry =
            entry.with_context(|| format!("failed to read entry under {}", path.display()))?;
        entries.push(entry.path());
    }

    entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in entries {
        if entry.is_dir() {
            collect_sources(&entry, sources)?;
        } else if is_source_path(&entry) {
            sources.push(entry);
        }
    }
    Ok(())
}

fn parse_source(path: &Path) -> Result<ScannedFile> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let (bom, text) = match content.strip_prefix(UTF8_BOM) {
        Some(text) => (true, text),
        None => (false, content.as_str()),
    };
    let document = Document::parse(path_to_uri(path), text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    for error in document.skipped_members() {
        warn!(
            path = %path.display(),
            line = error.line,
            column = error.column,
            "skipped unparsable member: {}",
            error.message
        );
    }
    Ok(ScannedFile {
        path: path.to_path_buf(),
        document,
        bom,
    })
}

fn artifact(file: &ScannedFile, roles: Vec<Value>) -> Artifact {
    let location = ArtifactLocation::builder()
        .uri(file.document.name().to_string())
        .build();
    let length = file.document.text().len() + if file.bom { UTF8_BOM.len() } else { 0 };
    Artifact::builder()
        .location(location)
        .length(length as i64)
        .roles(roles)
        .build()
}

fn skipped_member_notification(uri: &str, error: &SyntaxError) -> Notification {
    let region = Region::builder()
        .start_line(error.line as i64)
        .start_column(error.column as i64)
        .build();
    let physical = PhysicalLocation::builder()
        .artifact_location(ArtifactLocation::builder().uri(uri.to_string()).build())
        .region(region)
        .build();
    Notification::builder()
        .message(
            Message::builder()
                .text(format!("Member skipped, not analyzed: {}.", error.message))
                .build(),
        )
        .level(json!("warning"))
        .locations(vec![Location::builder().physical_location(physical).build()])
        .build()
}

fn is_source_path(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("cs"))
}

fn path_to_uri(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("file://{}", absolute.to_string_lossy())
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
