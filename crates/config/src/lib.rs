// User settings for the acctsync CLI

pub mod settings;

pub use settings::{LogLevel, Settings};
