pub mod control_channel;
pub mod playback_delegate;
pub mod playback_provider;
pub mod sample_source;
