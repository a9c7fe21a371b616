//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Several domain enums (HTTP methods, refresh encodings, storage backends)
//! travel through configuration files and environment variables as plain
//! strings. This macro provides a single implementation of both `Display` and
//! `FromStr` so the string form stays consistent in both directions.
//!
//! # Example
//!
//! ```rust
//! use authpipe_domain::impl_str_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Backend {
//!     Memory,
//!     File,
//! }
//!
//! impl_str_conversions!(Backend {
//!     Memory => "memory",
//!     File => "file",
//! });
//!
//! assert_eq!(Backend::File.to_string(), "file");
//! assert_eq!("MEMORY".parse::<Backend>(), Ok(Backend::Memory));
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// This macro generates:
/// - Display trait: writes the declared string for each variant
/// - FromStr trait: parses case-insensitively back into the variant
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
#[macro_export]
macro_rules! impl_str_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
