pub mod inspect_use_case;

pub use inspect_use_case::{inspect_table, TableSummary};
