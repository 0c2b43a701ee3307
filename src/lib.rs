pub mod config;
pub mod criteria;
pub mod data;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod scanner;
pub mod store;
pub mod window;
