mod annotate;
mod entry;
mod state;

#[cfg(test)]
pub mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use annotate::AnnotateView;
pub use entry::EntryView;
pub use state::{ViewError, ViewState, view_state_from_resource};
