use std::fs;
use std::process::Command;

fn contractor() -> Command {
    let binary = std::env::var("CARGO_BIN_EXE_contractor").unwrap_or_else(|_| {
        let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        path.push("contractor");
        if cfg!(windows) {
            path.set_extension("exe");
        }
        path.to_string_lossy().to_string()
    });
    Command::new(binary)
}

#[test]
fn contractor_exits_non_zero_on_missing_input() {
    let output = contractor()
        .arg("--input")
        .arg("missing.cs")
        .output()
        .expect("run contractor");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input not found"), "{stderr}");
}

#[test]
fn contractor_exits_non_zero_on_invalid_config() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let source = temp_dir.path().join("Sample.cs");
    fs::write(&source, "class Sample { }").expect("write source");
    let config = temp_dir.path().join("contractor.json");
    fs::write(&config, r#"{ "public_only": "yes" }"#).expect("write config");

    let output = contractor()
        .arg("--input")
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run contractor");

    assert!(!output.status.success());
}

#[test]
fn contractor_succeeds_and_writes_sarif() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let source = temp_dir.path().join("Sample.cs");
    fs::write(&source, "public class Sample { public void Run(string name) { } }")
        .expect("write source");
    let sarif = temp_dir.path().join("out.sarif");

    let output = contractor()
        .arg("--input")
        .arg(temp_dir.path())
        .arg("--output")
        .arg(&sarif)
        .arg("--quiet")
        .output()
        .expect("run contractor");

    assert!(output.status.success());
    let report = fs::read_to_string(&sarif).expect("read SARIF");
    assert!(report.contains("\"ruleId\": \"CC001\""), "{report}");
}

#[test]
fn contractor_applies_a_refactoring_at_a_caret() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let source = temp_dir.path().join("Sample.cs");
    fs::write(
        &source,
        "public class Sample\n{\n    public void Run(string name)\n    {\n    }\n}\n",
    )
    .expect("write source");
    let sarif = temp_dir.path().join("out.sarif");

    let output = contractor()
        .arg("--input")
        .arg(&source)
        .arg("--at")
        .arg("3:28")
        .arg("--refactoring")
        .arg("requires")
        .arg("--output")
        .arg(&sarif)
        .arg("--quiet")
        .output()
        .expect("run contractor");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let rewritten = fs::read_to_string(&source).expect("read source");
    assert!(rewritten.contains("Contract.Requires(name != null);"), "{rewritten}");
    let report = fs::read_to_string(&sarif).expect("read SARIF");
    assert!(!report.contains("\"ruleId\": \"CC001\""), "{report}");
}

#[test]
fn contractor_rejects_a_caret_without_a_refactoring() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let source = temp_dir.path().join("Sample.cs");
    fs::write(&source, "class Sample { }").expect("write source");

    let output = contractor()
        .arg("--input")
        .arg(&source)
        .arg("--at")
        .arg("1:1")
        .output()
        .expect("run contractor");

    assert!(!output.status.success());
}

#[test]
fn contractor_fails_when_the_refactoring_is_unavailable() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let source = temp_dir.path().join("Sample.cs");
    let text = "public class Sample\n{\n    public void Run(int count)\n    {\n    }\n}\n";
    fs::write(&source, text).expect("write source");

    let output = contractor()
        .arg("--input")
        .arg(&source)
        .arg("--at")
        .arg("3:25")
        .arg("--refactoring")
        .arg("requires")
        .output()
        .expect("run contractor");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not available"), "{stderr}");
    assert_eq!(fs::read_to_string(&source).expect("read source"), text);
}
