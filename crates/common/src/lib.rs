//! Wire types and errors shared by the MedVault crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
