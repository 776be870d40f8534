//! CLI command implementations.

mod config;
mod doctor;
mod enrich;
mod extract;
mod rank;
pub mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use enrich::run_enrich;
pub use extract::run_extract;
pub use rank::run_rank;
pub use serve::run_serve;
