pub mod portfolio_actor;
