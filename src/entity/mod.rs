//! SeaORM entity definitions.

pub mod report;
pub mod scan;
