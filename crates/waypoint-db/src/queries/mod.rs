//! Query functions, one module per table.

pub mod places;
pub mod planners;
pub mod sessions;
