pub mod wav_sink;
pub mod wav_source;
