use std::fs;

use anyhow::{Context, Result};

use crate::config::AnalysisConfig;
use crate::document::Document;
use crate::engine::{AnalysisContext, Engine, EngineOutput};
use crate::scan::scan_inputs;

const CARET: &str = "{caret}";

/// Source file written into the harness workspace.
pub(crate) struct SourceFile {
    pub(crate) path: String,
    pub(crate) contents: String,
}

/// Test harness that writes C# sources to disk and runs the full analysis.
pub(crate) struct ContractTestHarness {
    config: AnalysisConfig,
}

impl ContractTestHarness {
    pub(crate) fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    pub(crate) fn public_only(mut self, public_only: bool) -> Self {
        self.config.public_only = public_only;
        self
    }

    pub(crate) fn analyze(&self, sources: &[SourceFile]) -> Result<EngineOutput> {
        let temp_dir = tempfile::tempdir().context("create temp dir")?;
        let src_dir = temp_dir.path().join("src");
        fs::create_dir_all(&src_dir).context("create src dir")?;
        for source in sources {
            let path = src_dir.join(&source.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("create source parent dir")?;
            }
            fs::write(&path, source.contents.as_bytes()).context("write source file")?;
        }

        let scan = scan_inputs(&src_dir, None).context("scan sources")?;
        let context = AnalysisContext::new(scan.into_documents(), self.config.clone(), None);
        Engine::new(&self.config)
            .analyze(&context)
            .context("run analysis")
    }
}

/// A document with a caret position, written as `{caret}` in the source.
pub(crate) struct CaretSource {
    pub(crate) document: Document,
    pub(crate) offset: usize,
}

impl CaretSource {
    pub(crate) fn parse(template: &str) -> Self {
        let offset = template.find(CARET).expect("template has a {caret} marker");
        let text = template.replacen(CARET, "", 1);
        let document = Document::parse("Sample.cs", &text).expect("parse template");
        Self { document, offset }
    }

    /// Wraps `member` in `internal class SampleClass`.
    pub(crate) fn from_member(member: &str) -> Self {
        Self::parse(&format!("internal class SampleClass\n{{\n{member}\n}}"))
    }
}
