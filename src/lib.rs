pub mod config;
pub mod forecast;
pub mod match_state;
pub mod odds;
pub mod session;
