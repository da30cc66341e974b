pub mod category;
pub mod config;
pub mod sessions;
pub mod stats;
pub mod timer;
