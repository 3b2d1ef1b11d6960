pub mod config;
pub mod error;
pub mod model;
pub mod view;

// Control surface and output ports
pub mod controller;

// Sync engine
pub mod dispatch;
pub mod logs;
pub mod scheduler;

// HTTP transport (reqwest)
#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
mod testing;
