pub mod api;
pub mod audio;
pub mod config;
pub mod export;
pub mod output;
