pub mod types;

pub use types::{RowRejection, ScoredSupplier, Supplier};
