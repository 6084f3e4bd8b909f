use serde::{Deserialize, Serialize};

use super::enums::{FoodInstruction, Timing};

/// One row of the medicine table.
///
/// `None` for timing/food means the clinician has not picked a value
/// from that dropdown yet; such rows print with an empty slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineEntry {
    pub name: String,
    pub timing: Option<Timing>,
    pub food: Option<FoodInstruction>,
}

/// Typed payload for a single-field overwrite of a `MedicineEntry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicineField {
    Name(String),
    Timing(Option<Timing>),
    Food(Option<FoodInstruction>),
}
