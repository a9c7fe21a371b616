//! Pipeline data types
//!
//! Plain data shared by the pipeline core and its collaborators. Nothing in
//! here performs I/O.

pub mod credential;
pub mod headers;
pub mod request;
pub mod response;
pub mod session;

pub use credential::Credential;
pub use headers::Headers;
pub use request::{Attempt, Method, RequestDescriptor, TransportRequest};
pub use response::Response;
pub use session::SessionEvent;
