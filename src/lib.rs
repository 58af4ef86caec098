pub mod array;
pub mod config;
pub mod error;
pub mod fields;

pub use array::FieldArray;
pub use error::{FieldError, FieldResult};
pub use fields::{
    ContainerOptions, DerivedFieldRecipe, FieldContainer, FieldEntry, FieldKind, FieldMapping, FieldRecipe,
    KeyFilter, LookupOptions, RecipeArgs, RecipeDefaults, RecipeParams, RecipeTarget, Resolved,
};

// Test-only printing helper: expands to eprintln! during tests and debug builds.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
