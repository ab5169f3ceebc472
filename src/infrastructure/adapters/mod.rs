pub mod acquisition_publisher;
pub mod quote_feed;
