pub mod pricing;
pub mod workflow;
