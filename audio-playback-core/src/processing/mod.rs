pub mod hw_constraints;
pub mod period_buffer;
pub mod synth;
pub mod wav_format;
