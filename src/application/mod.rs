pub mod actors;
pub mod services;

#[cfg(test)]
mod ordering_tests;
