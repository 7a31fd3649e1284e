pub mod analysis;
pub mod chart;
pub mod filter;
pub mod period;
pub mod settings;
pub mod transaction;
