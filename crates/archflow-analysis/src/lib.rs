pub mod report;
pub mod structural;

pub use report::{
    analyze_repository, AnalysisReport, DeterministicFindings, RISK_SCORE_INVALID,
    RISK_SCORE_VALID,
};
pub use structural::{extract_dependencies, validate_structure, StructureValidation};
