use serde::{Deserialize, Serialize};

/// Simulated repository listing. Real file listing is an external
/// collaborator to be supplied once repository ingestion exists.
pub const SIMULATED_FILES: [&str; 4] = [
    "package.json",
    "src/index.ts",
    "README.md",
    ".github/workflows/test.yml",
];

const REQUIRED_MANIFEST: &str = "package.json";
const REQUIRED_README: &str = "README.md";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

/// Checks presence of the required marker files, manifest first. Pure and
/// deterministic: the same list always produces the same report.
pub fn validate_structure(files: &[&str]) -> StructureValidation {
    let mut issues = Vec::new();
    if !files.contains(&REQUIRED_MANIFEST) {
        issues.push(format!("Missing {}", REQUIRED_MANIFEST));
    }
    if !files.contains(&REQUIRED_README) {
        issues.push(format!("Missing {}", REQUIRED_README));
    }

    StructureValidation {
        is_valid: issues.is_empty(),
        issues,
    }
}

/// Placeholder for a real manifest parser: the input is ignored and a fixed,
/// alphabetically sorted dependency list is returned. Callers depend on the
/// shape of this API, not its contents, until repository ingestion lands.
pub fn extract_dependencies(_content: &str) -> Vec<String> {
    let mut deps = vec!["react", "typescript", "express", "tailwindcss"];
    deps.sort_unstable();
    deps.into_iter().map(String::from).collect()
}
