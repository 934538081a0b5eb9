/// Project-specific extraction rules, loadable from TOML
pub mod config;
/// Error definitions
pub mod error;
/// Writing the guide dataset and, with the `icons` feature, icon images
pub mod export;
/// The end-to-end extraction pipeline
pub mod extract;
/// The guide's data model and the passes that link, group and sort it
pub mod guide;
/// Generic wrapper for values that may or may not match a known variant.
pub mod recognized;
/// Utilities for reading a Lex Talionis project's `game_data` files
pub mod resources;

pub use extract::extract_guide;
pub use guide::types::Guide;
