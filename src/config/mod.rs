// Re-export all configuration structures
pub use self::base::*;
pub use self::rules::*;
pub use self::validation::*;

// Sub-modules
pub mod base;
pub mod rules;
pub mod validation;
