pub mod bus;
pub mod config;
pub mod error;
pub mod geo;
pub mod http;
pub mod output;
pub mod parser;
pub mod proximity;
pub mod routing;
pub mod stations;
pub mod summary;
pub mod taxi;
