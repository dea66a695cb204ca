pub mod progress;

pub use progress::{AuditUi, ProgressTicker};
