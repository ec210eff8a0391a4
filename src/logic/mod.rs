/// Three-valued logic errors
pub mod errors;
/// Three-valued logic type
pub mod tribool;

/// Prelude of the logic types
pub mod prelude {
    pub use super::errors::*;
    pub use super::tribool::*;
}
