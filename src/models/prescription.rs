use serde::{Deserialize, Serialize};

use super::medicine::MedicineEntry;
use super::patient::PatientRecord;

/// Immutable copy of all form state taken at the moment of export.
///
/// The exporter only ever sees one of these, so the live form can keep
/// mutating while a document is being generated without aliasing into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionSnapshot {
    pub patient: PatientRecord,
    pub medicines: Vec<MedicineEntry>,
    pub instructions: String,
}
