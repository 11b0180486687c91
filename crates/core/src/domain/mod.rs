pub mod error;
pub mod events;
pub mod form;
pub mod report;
pub mod session;
pub mod settings;
pub mod types;
pub mod wire;
