pub mod batch;
pub mod pickup;
pub mod resources;
