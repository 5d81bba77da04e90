pub mod client;
pub mod query;
pub mod response;
