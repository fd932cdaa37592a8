//! Domain models for the dentio core.

mod appointment;
mod catalog;
mod doctor;
mod patient;
mod prescription;
mod procedure;

pub use appointment::*;
pub use catalog::*;
pub use doctor::*;
pub use patient::*;
pub use prescription::*;
pub use procedure::*;
