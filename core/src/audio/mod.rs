// Audio buffers and the codec plumbing the engines rely on

pub mod buffer;
pub mod wav;

pub use buffer::{validate_audio, AudioBuffer};

// Tool discovery and external decoding
pub mod utils;
