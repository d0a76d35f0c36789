pub mod error;
pub mod property;
pub mod value;

pub use error::{DbError, Result};
pub use property::{Document, EntityCollection, PropertyValue};
pub use value::{DataType, Value};
