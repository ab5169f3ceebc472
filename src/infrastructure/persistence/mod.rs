pub mod query_store;
