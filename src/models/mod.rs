//! Domain models: journals and their classification.

mod category;
mod entity;
mod journal;

pub use category::{Area, Category};
pub use entity::{Entity, Identifiable};
pub use journal::Journal;
