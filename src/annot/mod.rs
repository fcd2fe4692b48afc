pub mod columns;
pub mod fields;
pub mod reader;

pub use columns::{ColumnMap, field};
pub use fields::{AnnotationMode, MISSING_SAMPLE, split_samples};
pub use reader::TableReader;
