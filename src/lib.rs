pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod observer;
pub mod output;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod variates;
