pub mod cache;
pub mod clubs;
pub mod config;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod html_table;
pub mod http_client;
pub mod logging;
pub mod memo;
pub mod preview;
pub mod season;
pub mod snapshot;
pub mod state;
pub mod table;
pub mod transform;
