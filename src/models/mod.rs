pub mod enums;
pub mod medicine;
pub mod patient;
pub mod prescription;

pub use enums::*;
pub use medicine::*;
pub use patient::*;
pub use prescription::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
