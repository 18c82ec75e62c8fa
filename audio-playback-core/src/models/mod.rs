pub mod audio_models;
pub mod config;
pub mod error;
pub mod playback_report;
pub mod state;
