//! Category store schema migrations.

mod m001_classification_schema;

pub use m001_classification_schema::M001ClassificationSchema;

use crate::migrations::traits::{DbMigration, Register};

/// Create the database migrations register.
pub fn create_register() -> Register<dyn DbMigration> {
    Register::<dyn DbMigration>::new().register(M001ClassificationSchema)
}
