/*
[INPUT]:  Public API exports for ton-proof-server crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod routes;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use routes::{AppState, router};
