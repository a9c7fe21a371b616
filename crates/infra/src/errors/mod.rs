//! Infrastructure error handling
//!
//! External library errors (`reqwest`, `keyring`) are converted into the
//! domain error types at this boundary so nothing above `infra` sees them.

mod conversions;

pub use conversions::InfraError;
pub(crate) use conversions::{IntoStoreError, IntoTransportError};
