use std::fs;
use std::path::Path;

// Every `src/rules/<name>/mod.rs` becomes `crate::rules::<name>`; the rule
// registers itself with `register_rule!`.
fn main() {
    println!("cargo:rerun-if-changed=src/rules/");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let rules_dir = Path::new(&manifest_dir).join("src/rules");

    let mut modules: Vec<String> = fs::read_dir(&rules_dir)
        .expect("src/rules/ directory not found")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join("mod.rs").is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    modules.sort();

    let content: String = modules
        .iter()
        .map(|module| {
            let rule_path = rules_dir.join(module).join("mod.rs");
            println!("cargo:rerun-if-changed={}", rule_path.display());
            format!("#[path = {rule_path:?}]\npub(crate) mod {module};\n")
        })
        .collect();

    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let dest = Path::new(&out_dir).join("rule_modules.rs");
    fs::write(dest, content).expect("write rule_modules.rs");
}
