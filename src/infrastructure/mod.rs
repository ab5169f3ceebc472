pub mod adapters;
pub mod persistence;
