//! Logging utilities for output and progress tracking
//!
//! Run log helpers and the extract progress bar.

pub mod log;
pub mod progress;

pub use log::{
    log_extract_tagged, log_extract_warning, log_frame_read, log_outputs_written, log_read_start,
};
pub use progress::{create_main_progress_bar, finish_progress_bar};
