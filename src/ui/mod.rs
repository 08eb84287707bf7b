pub mod metrics;
pub mod panels;
