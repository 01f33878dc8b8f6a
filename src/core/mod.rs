/*!
 * Core Module
 * Fundamental simulator types and error handling
 */

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
