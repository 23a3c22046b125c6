mod config;
mod contracts;
mod document;
mod engine;
mod fix;
mod refactorings;
mod rules;
mod scan;
mod semantic;
mod syntax;
mod telemetry;
#[cfg(test)]
mod test_harness;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use opentelemetry::KeyValue;
use serde_json::json;
use rayon::prelude::*;
use serde_sarif::sarif::{
    Artifact, Invocation, Notification, PropertyBag, ReportingDescriptor, Result as SarifResult, Run,
    SCHEMA_URL, Sarif, Tool, ToolComponent,
};
use tracing::{info, warn};

use crate::config::{AnalysisConfig, load_config};
use crate::engine::{AnalysisContext, Engine};
use crate::fix::fix_document;
use crate::refactorings::{CancellationToken, RefactoringError, RefactoringKind, apply_at};
use crate::scan::{ScanOutput, ScannedFile, scan_inputs};
use crate::telemetry::{Telemetry, current_trace_id, init_logging, with_span};

/// CLI arguments for contractor execution.
#[derive(Parser, Debug)]
#[command(
    name = "contractor",
    about = "Reports and adds missing not-null Code Contracts in C# sources, with SARIF output.",
    version
)]
struct Cli {
    /// A .cs file or a directory searched recursively.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// SARIF destination; `-` or nothing for stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Only report members visible outside the assembly.
    #[arg(long)]
    public_only: bool,
    /// Write the contracts into the sources and report what remains.
    #[arg(long, conflicts_with = "at")]
    fix: bool,
    /// Caret position for `--refactoring`; the input must be one .cs file.
    #[arg(long, value_name = "LINE:COLUMN", requires = "refactoring")]
    at: Option<Caret>,
    /// Refactoring to apply at `--at` before the analysis.
    #[arg(long, value_enum, requires = "at")]
    refactoring: Option<RefactoringKind>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
    /// OTLP HTTP endpoint for trace export.
    #[arg(long, value_name = "URL")]
    otel: Option<String>,
}

/// One-based caret position, as editors show it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Caret {
    line: usize,
    column: usize,
}

impl FromStr for Caret {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (line, column) = value
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COLUMN, got `{value}`"))?;
        let line = line
            .parse()
            .map_err(|err| format!("invalid line `{line}`: {err}"))?;
        let column = column
            .parse()
            .map_err(|err| format!("invalid column `{column}`: {err}"))?;
        if line == 0 || column == 0 {
            return Err(format!("lines and columns start at 1, got `{value}`"));
        }
        Ok(Self { line, column })
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let telemetry = match cli.otel.clone() {
        Some(endpoint) => Some(Arc::new(Telemetry::new(endpoint)?)),
        None => None,
    };
    let outcome = with_span(
        telemetry.as_deref(),
        "contractor",
        &[KeyValue::new("contractor.input", cli.input.display().to_string())],
        || {
            if let Some(trace_id) = current_trace_id() {
                info!(trace_id = %trace_id, "exporting traces");
            }
            run(&cli, telemetry.clone())
        },
    );
    if let Some(telemetry) = telemetry {
        if let Err(err) = telemetry.shutdown() {
            warn!("{err:#}");
        }
    }
    outcome
}

fn run(cli: &Cli, telemetry: Option<Arc<Telemetry>>) -> Result<()> {
    if !cli.input.exists() {
        anyhow::bail!("input not found: {}", cli.input.display());
    }
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    config.public_only |= cli.public_only;

    let started_at = Instant::now();
    let scan_started_at = Instant::now();
    let scan = with_span(
        telemetry.as_deref(),
        "scan",
        &[KeyValue::new("contractor.phase", "scan")],
        || scan_inputs(&cli.input, telemetry.as_deref()),
    )?;
    let scan_duration_ms = scan_started_at.elapsed().as_millis();

    let fix_started_at = Instant::now();
    let (scan, fix_count) = match (cli.at, cli.refactoring) {
        (Some(caret), Some(kind)) => with_span(
            telemetry.as_deref(),
            "refactor",
            &[KeyValue::new("contractor.phase", "refactor")],
            || refactor_at(scan, caret, kind),
        )?,
        _ if cli.fix => with_span(
            telemetry.as_deref(),
            "fix",
            &[KeyValue::new("contractor.phase", "fix")],
            || fix_sources(scan, &config),
        )?,
        _ => (scan, 0),
    };
    let fix_duration_ms = fix_started_at.elapsed().as_millis();

    let file_count = scan.files.len();
    let artifacts = scan.artifacts()?;
    let notifications = scan.notifications();
    let analysis_started_at = Instant::now();
    let context = AnalysisContext::new(scan.into_documents(), config.clone(), telemetry.clone());
    let engine = Engine::new(&config);
    let output = with_span(
        telemetry.as_deref(),
        "analysis",
        &[KeyValue::new("contractor.phase", "analysis")],
        || engine.analyze(&context),
    )?;
    let analysis_duration_ms = analysis_started_at.elapsed().as_millis();

    let invocation = build_invocation(
        &InvocationStats {
            scan_duration_ms,
            analysis_duration_ms,
            file_count,
            fix_count,
        },
        notifications,
    );
    let result_count = output.results.len();
    let sarif = build_sarif(artifacts, invocation, output.rules, output.results);

    let mut writer = output_writer(cli.output.as_deref())?;
    serde_json::to_writer_pretty(&mut writer, &sarif)
        .context("failed to serialize SARIF output")?;
    writer
        .write_all(b"\n")
        .context("failed to write SARIF output")?;

    if !cli.quiet {
        info!(files = file_count, results = result_count, fixes = fix_count, "analysis complete");
    }
    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} scan_ms={} fix_ms={} analysis_ms={} files={}",
            started_at.elapsed().as_millis(),
            scan_duration_ms,
            fix_duration_ms,
            analysis_duration_ms,
            file_count
        );
    }

    Ok(())
}

/// Fixes the scanned files in parallel and writes the changed ones back.
/// The first failure cancels the files still being fixed.
fn fix_sources(scan: ScanOutput, config: &AnalysisConfig) -> Result<(ScanOutput, usize)> {
    let cancel = CancellationToken::new();
    let outcomes = scan
        .files
        .into_par_iter()
        .map(|file| {
            let outcome = fix_file(file, config, &cancel);
            if outcome.is_err() {
                cancel.cancel();
            }
            outcome
        })
        .collect::<Vec<_>>();

    let mut files = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    let mut total = 0;
    for outcome in outcomes {
        match outcome {
            Ok((file, applied)) => {
                total += applied;
                files.push(file);
            }
            Err(err) => errors.push(err),
        }
    }
    let cause = errors
        .iter()
        .position(|err| !is_cancellation(err))
        .map(|index| errors.swap_remove(index))
        .or_else(|| errors.pop());
    match cause {
        Some(err) => Err(err),
        None => Ok((ScanOutput { files }, total)),
    }
}

fn fix_file(
    file: ScannedFile,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<(ScannedFile, usize)> {
    let ScannedFile { path, document, bom } = file;
    let outcome = fix_document(document, config, cancel)
        .with_context(|| format!("failed to fix {}", path.display()))?;
    let file = ScannedFile {
        path,
        document: outcome.document,
        bom,
    };
    if outcome.applied == 0 {
        return Ok((file, 0));
    }
    let file = file.reparsed()?;
    file.write()?;
    info!(path = %file.path.display(), fixes = outcome.applied, "wrote contracts");
    Ok((file, outcome.applied))
}

fn is_cancellation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<RefactoringError>(),
        Some(RefactoringError::Cancelled)
    )
}

/// Applies one refactoring at a caret of the single scanned file and
/// writes the result back.
fn refactor_at(mut scan: ScanOutput, caret: Caret, kind: RefactoringKind) -> Result<(ScanOutput, usize)> {
    if scan.files.len() != 1 {
        anyhow::bail!("--at needs a single .cs input, found {} files", scan.files.len());
    }
    let file = scan.files.remove(0);
    let offset = file
        .document
        .offset_at(caret.line, caret.column)
        .with_context(|| {
            format!("{}:{} is outside {}", caret.line, caret.column, file.path.display())
        })?;
    let document = apply_at(&file.document, offset, kind, &CancellationToken::new())
        .with_context(|| {
            format!(
                "cannot add a {kind} at {}:{}:{}",
                file.path.display(),
                caret.line,
                caret.column
            )
        })?;
    let file = ScannedFile { document, ..file }.reparsed()?;
    file.write()?;
    info!(path = %file.path.display(), refactoring = %kind, "wrote contract");
    scan.files.push(file);
    Ok((scan, 1))
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}

/// Metadata captured for SARIF invocation properties.
struct InvocationStats {
    scan_duration_ms: u128,
    analysis_duration_ms: u128,
    file_count: usize,
    fix_count: usize,
}

fn build_invocation(stats: &InvocationStats, notifications: Vec<Notification>) -> Invocation {
    let arguments: Vec<String> = std::env::args().collect();
    let command_line = arguments.join(" ");
    let mut properties = BTreeMap::new();
    properties.insert("contractor.scan_ms".to_string(), json!(stats.scan_duration_ms));
    properties.insert(
        "contractor.analysis_ms".to_string(),
        json!(stats.analysis_duration_ms),
    );
    properties.insert("contractor.file_count".to_string(), json!(stats.file_count));
    properties.insert("contractor.fix_count".to_string(), json!(stats.fix_count));

    let properties = PropertyBag::builder().additional_properties(properties).build();
    if notifications.is_empty() {
        Invocation::builder()
            .execution_successful(true)
            .arguments(arguments)
            .command_line(command_line)
            .properties(properties)
            .build()
    } else {
        Invocation::builder()
            .execution_successful(true)
            .arguments(arguments)
            .command_line(command_line)
            .properties(properties)
            .tool_execution_notifications(notifications)
            .build()
    }
}

fn build_sarif(
    artifacts: Vec<Artifact>,
    invocation: Invocation,
    rules: Vec<ReportingDescriptor>,
    results: Vec<SarifResult>,
) -> Sarif {
    let driver = if rules.is_empty() {
        ToolComponent::builder()
            .name("contractor")
            .version(env!("CARGO_PKG_VERSION"))
            .build()
    } else {
        ToolComponent::builder()
            .name("contractor")
            .version(env!("CARGO_PKG_VERSION"))
            .rules(rules)
            .build()
    };
    let tool = Tool {
        driver,
        extensions: None,
        properties: None,
    };
    let run = if artifacts.is_empty() {
        Run::builder()
            .tool(tool)
            .invocations(vec![invocation])
            .results(results)
            .build()
    } else {
        Run::builder()
            .tool(tool)
            .invocations(vec![invocation])
            .results(results)
            .artifacts(artifacts)
            .build()
    };

    Sarif::builder()
        .schema(SCHEMA_URL)
        .runs(vec![run])
        .version(json!("2.1.0"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn stats() -> InvocationStats {
        InvocationStats {
            scan_duration_ms: 0,
            analysis_duration_ms: 0,
            file_count: 0,
            fix_count: 0,
        }
    }

    #[test]
    fn sarif_is_minimal_and_valid_shape() {
        let sarif = build_sarif(Vec::new(), build_invocation(&stats(), Vec::new()), Vec::new(), Vec::new());
        let value = serde_json::to_value(&sarif).expect("serialize SARIF");

        assert_eq!(value["version"], "2.1.0");
        assert_eq!(value["$schema"], SCHEMA_URL);
        assert_eq!(value["runs"][0]["tool"]["driver"]["name"], "contractor");
        assert!(
            value["runs"][0]["results"]
                .as_array()
                .expect("results array")
                .is_empty()
        );
        assert_eq!(value["runs"][0]["invocations"][0]["executionSuccessful"], true);
        assert_eq!(
            value["runs"][0]["invocations"][0]["properties"]["contractor.fix_count"],
            0
        );
    }

    #[test]
    fn sarif_for_a_scanned_directory() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp_dir.path().join("Sample.cs"),
            "public class Sample\n{\n    public string Echo(string text) { return text; }\n}\n",
        )
        .expect("write Sample.cs");

        let scan = scan_inputs(temp_dir.path(), None).expect("scan sources");
        let artifacts = scan.artifacts().expect("artifacts");
        let config = AnalysisConfig::default();
        let context = AnalysisContext::new(scan.into_documents(), config.clone(), None);
        let output = Engine::new(&config).analyze(&context).expect("analyze");
        let sarif = build_sarif(artifacts, build_invocation(&stats(), Vec::new()), output.rules, output.results);
        let value = serde_json::to_value(&sarif).expect("serialize SARIF");

        let run = &value["runs"][0];
        assert_eq!(run["tool"]["driver"]["rules"][0]["id"], "CC001");
        assert_eq!(run["tool"]["driver"]["rules"][1]["id"], "CC002");
        assert_eq!(run["artifacts"].as_array().expect("artifacts").len(), 1);
        let results = run["results"].as_array().expect("results");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["ruleId"], "CC001");
        assert_eq!(results[0]["locations"][0]["physicalLocation"]["region"]["startLine"], 3);
        assert_eq!(results[1]["ruleId"], "CC002");
    }

    #[test]
    fn fix_writes_sources_and_clears_results() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("Sample.cs");
        fs::write(
            &path,
            "public class Sample\n{\n    public string Echo(string text)\n    {\n        return text;\n    }\n}\n",
        )
        .expect("write Sample.cs");

        let config = AnalysisConfig::default();
        let scan = scan_inputs(temp_dir.path(), None).expect("scan sources");
        let (scan, fixes) = fix_sources(scan, &config).expect("fix sources");
        assert_eq!(fixes, 2);
        assert_eq!(
            fs::read_to_string(&path).expect("read fixed source"),
            "using System.Diagnostics.Contracts;\npublic class Sample\n{\n    public string Echo(string text)\n    {\n        Contract.Requires(text != null);\n        Contract.Ensures(Contract.Result<string>() != null);\n        return text;\n    }\n}\n"
        );

        let context = AnalysisContext::new(scan.into_documents(), config.clone(), None);
        let output = Engine::new(&config).analyze(&context).expect("analyze");
        assert!(output.results.is_empty());
    }

    #[test]
    fn carets_parse_as_one_based_positions() {
        assert_eq!("3:17".parse::<Caret>(), Ok(Caret { line: 3, column: 17 }));
        assert!("3".parse::<Caret>().is_err());
        assert!("0:1".parse::<Caret>().is_err());
        assert!("a:1".parse::<Caret>().is_err());
    }

    #[test]
    fn caret_refactoring_rewrites_the_file() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("Sample.cs");
        fs::write(
            &path,
            "\u{feff}class Sample\n{\n    void Run(string name)\n    {\n    }\n}\n",
        )
        .expect("write Sample.cs");

        let scan = scan_inputs(&path, None).expect("scan sources");
        let caret = Caret { line: 3, column: 21 };
        let (scan, applied) =
            refactor_at(scan, caret, RefactoringKind::Requires).expect("refactor");
        assert_eq!(applied, 1);
        assert_eq!(
            fs::read_to_string(&path).expect("read source"),
            "\u{feff}using System.Diagnostics.Contracts;\nclass Sample\n{\n    void Run(string name)\n    {\n        Contract.Requires(name != null);\n    }\n}\n"
        );
        assert_eq!(scan.files.len(), 1);
        assert!(scan.files[0].bom);
    }

    #[test]
    fn unavailable_caret_refactoring_leaves_the_file_alone() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("Sample.cs");
        let source = "class Sample\n{\n    void Run(int count) { }\n}\n";
        fs::write(&path, source).expect("write Sample.cs");

        let scan = scan_inputs(&path, None).expect("scan sources");
        let caret = Caret { line: 3, column: 18 };
        let err = refactor_at(scan, caret, RefactoringKind::Requires)
            .err()
            .expect("int parameters are not nullable");
        assert!(format!("{err:#}").contains("not available"), "{err:#}");
        assert_eq!(fs::read_to_string(&path).expect("read source"), source);

        let scan = scan_inputs(&path, None).expect("scan sources");
        let err = refactor_at(scan, Caret { line: 9, column: 1 }, RefactoringKind::Ensures)
            .err()
            .expect("caret outside the file");
        assert!(format!("{err:#}").contains("is outside"), "{err:#}");
    }

    #[test]
    fn skipped_members_are_reported_on_the_invocation() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp_dir.path().join("Broken.cs"),
            "class Broken\n{\n    void Run(object unchecked) { }\n    string Echo(string text) { return text; }\n}\n",
        )
        .expect("write Broken.cs");

        let scan = scan_inputs(temp_dir.path(), None).expect("scan sources");
        let invocation = build_invocation(&stats(), scan.notifications());
        let value = serde_json::to_value(&invocation).expect("serialize invocation");
        let notifications = value["toolExecutionNotifications"]
            .as_array()
            .expect("notifications");
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0]["level"], "warning");
        assert_eq!(
            notifications[0]["locations"][0]["physicalLocation"]["region"]["startLine"],
            3
        );

        let clean = build_invocation(&stats(), Vec::new());
        let value = serde_json::to_value(&clean).expect("serialize invocation");
        assert!(value.get("toolExecutionNotifications").is_none());
    }

    #[test]
    fn fix_reports_artifacts_of_the_rewritten_files() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        for name in ["A.cs", "B.cs"] {
            fs::write(
                temp_dir.path().join(name),
                "class Sample\n{\n    void Run(string name) { }\n}\n",
            )
            .expect("write source");
        }

        let scan = scan_inputs(temp_dir.path(), None).expect("scan sources");
        let before = scan.artifacts().expect("artifacts");
        let (scan, fixes) = fix_sources(scan, &AnalysisConfig::default()).expect("fix sources");
        assert_eq!(fixes, 2);
        let after = scan.artifacts().expect("artifacts");
        let paths: Vec<_> = scan
            .files
            .iter()
            .map(|file| file.path.file_name().expect("file name").to_owned())
            .collect();
        assert_eq!(paths, ["A.cs", "B.cs"]);
        let length = |artifact: &Artifact| {
            serde_json::to_value(artifact).expect("serialize artifact")["length"].clone()
        };
        assert_ne!(length(&before[0]), length(&after[0]));
        assert_eq!(
            length(&after[0]),
            json!(fs::read(temp_dir.path().join("A.cs")).expect("read A.cs").len())
        );
    }
}
