pub mod ground_floor;
pub mod units;
