pub mod negotiator;
pub mod playback_session;
pub mod streaming_loop;

#[cfg(test)]
pub(crate) mod test_support;
