pub mod annot;
pub mod import;
pub mod query;
pub mod store;
