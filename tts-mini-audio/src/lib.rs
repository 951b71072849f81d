// Audio artifact writers: turn a synthesized buffer into files

// Shared path helpers
pub(crate) mod utils;

pub mod lossless;

pub use lossless::write_lossless;

pub mod lossy;

pub use lossy::{write_lossy, LossyEncoder};

pub mod plot;

pub use plot::{duration_secs, plot_waveform, time_axis};
