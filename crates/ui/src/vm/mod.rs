mod annotate_vm;
mod time_fmt;

pub use annotate_vm::{AnnotateIntent, AnnotateVm, DraftSnapshot};
pub use time_fmt::format_clock_time;
