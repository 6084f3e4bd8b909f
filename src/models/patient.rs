use serde::{Deserialize, Serialize};

/// Name/age/weight triple describing the subject of the prescription.
///
/// Age and weight stay string-encoded exactly as typed. Nothing parses
/// or range-checks them before export; the input widgets are the only
/// gatekeepers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub age: String,
    pub weight: String,
}

/// Names one field of `PatientRecord` for a single-field overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientField {
    Name,
    Age,
    Weight,
}
