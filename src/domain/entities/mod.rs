pub mod portfolio;
pub mod quote;
