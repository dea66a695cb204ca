//! CLI command implementations.
//!
//! | Module        | Commands handled          |
//! |---------------|---------------------------|
//! | `audit`       | `Audit`                   |
//! | `maintenance` | `Verify`, `Cache`         |

pub mod audit;
pub mod maintenance;

pub use audit::cmd_audit;
pub use maintenance::{cmd_cache_clear, cmd_cache_stats, cmd_verify};
