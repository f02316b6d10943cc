pub mod config;
pub mod export;
pub mod http_client;
pub mod identity;
pub mod pipeline;
pub mod round;
pub mod season;
pub mod source;
pub mod store;
pub mod table;
