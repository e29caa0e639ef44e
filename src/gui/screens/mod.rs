pub mod active;
pub mod completed;
pub mod setup;
