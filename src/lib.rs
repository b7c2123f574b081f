pub mod cli;
pub mod config;
pub mod output;
pub mod remote;
pub mod resolve;
pub mod tail;
pub mod window;
