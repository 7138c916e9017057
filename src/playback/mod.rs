/// Timer-driven playback state machine.
pub mod engine;
/// Random-access frame sources.
pub mod store;
