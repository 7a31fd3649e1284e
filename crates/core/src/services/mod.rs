pub mod analysis_service;
pub mod period_service;
