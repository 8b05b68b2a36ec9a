//! Envira core library - users, sensor readings, chat records, validation and
//! statistics.

pub mod chat;
pub mod identity;
pub mod reading;
pub mod stats;
pub mod validation;

pub use chat::ChatRecord;
pub use identity::User;
pub use reading::{Metric, NewReading, SensorReading};
pub use validation::ValidationErrors;
