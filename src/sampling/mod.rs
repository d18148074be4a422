pub mod grid;
pub mod range;

pub use grid::{GridLayout, ZMatrix};
pub use range::{PointsSpacing, RangeSampler};
