//! Form session state — the single owner of the in-progress prescription.
//!
//! One clinician, one session: patient details, the ordered medicine
//! list, and the free-text instructions live here and are mutated only
//! through this surface. Nothing is persisted; closing the session
//! discards everything.

use crate::models::{
    MedicineEntry, MedicineField, PatientField, PatientRecord, PrescriptionSnapshot,
};

// ═══════════════════════════════════════════════════════════
// FormSession — state container and mutation surface
// ═══════════════════════════════════════════════════════════

/// In-memory state for one prescription form session.
///
/// The session is the sole writer. Observers (the presentation layer)
/// watch the revision counter returned by every mutation: a changed
/// revision means the form must be re-read and re-rendered. All
/// mutations run to completion synchronously inside one edit event.
#[derive(Debug, Clone)]
pub struct FormSession {
    patient: PatientRecord,
    medicines: Vec<MedicineEntry>,
    instructions: String,
    revision: u64,
}

impl FormSession {
    /// Fresh session: empty patient, one blank medicine row, no
    /// instructions.
    pub fn new() -> Self {
        Self {
            patient: PatientRecord::default(),
            medicines: vec![MedicineEntry::default()],
            instructions: String::new(),
            revision: 0,
        }
    }

    // ── Read surface ────────────────────────────────────────

    pub fn patient(&self) -> &PatientRecord {
        &self.patient
    }

    pub fn medicines(&self) -> &[MedicineEntry] {
        &self.medicines
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Monotonically increasing change counter. Bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Value copy of the whole form, handed to the exporter.
    ///
    /// Later mutations never alias into a snapshot already taken.
    pub fn snapshot(&self) -> PrescriptionSnapshot {
        PrescriptionSnapshot {
            patient: self.patient.clone(),
            medicines: self.medicines.clone(),
            instructions: self.instructions.clone(),
        }
    }

    // ── Mutation surface ────────────────────────────────────

    /// Overwrites one patient field. Always succeeds; the value is kept
    /// as typed, unparsed.
    pub fn set_patient_field(&mut self, field: PatientField, value: String) -> u64 {
        match field {
            PatientField::Name => self.patient.name = value,
            PatientField::Age => self.patient.age = value,
            PatientField::Weight => self.patient.weight = value,
        }
        self.bump()
    }

    /// Overwrites one field of the medicine entry at `index`.
    ///
    /// Panics if `index` is out of bounds. The presentation layer is
    /// the only caller and supplies indices it obtained from this
    /// session, so a bad index is a caller bug, not user input.
    pub fn set_medicine_field(&mut self, index: usize, field: MedicineField) -> u64 {
        assert!(
            index < self.medicines.len(),
            "medicine index {index} out of bounds (len {})",
            self.medicines.len()
        );
        let entry = &mut self.medicines[index];
        match field {
            MedicineField::Name(name) => entry.name = name,
            MedicineField::Timing(timing) => entry.timing = timing,
            MedicineField::Food(food) => entry.food = food,
        }
        self.bump()
    }

    /// Appends a blank medicine row. No upper bound on the row count.
    pub fn add_medicine(&mut self) -> u64 {
        self.medicines.push(MedicineEntry::default());
        self.bump()
    }

    /// Removes the entry at `index`, shifting later entries up.
    ///
    /// Removing the last remaining entry is allowed and leaves an empty
    /// list; the exporter renders an empty Medicines section for it.
    /// Panics on an out-of-bounds index (caller bug, as above).
    pub fn remove_medicine(&mut self, index: usize) -> u64 {
        assert!(
            index < self.medicines.len(),
            "medicine index {index} out of bounds (len {})",
            self.medicines.len()
        );
        self.medicines.remove(index);
        self.bump()
    }

    /// Replaces the instruction text wholesale.
    pub fn set_instructions(&mut self, text: String) -> u64 {
        self.instructions = text;
        self.bump()
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
