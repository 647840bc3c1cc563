pub mod extract;
pub mod predict;
pub mod trend;
