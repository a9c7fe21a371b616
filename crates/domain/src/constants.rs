//! Pipeline constants
//!
//! Centralized location for header names, default timeouts and environment
//! variable names shared by the pipeline crates.

// Header names (stored lowercase, compared case-insensitively)
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const ACCEPT_HEADER: &str = "accept";
pub const BEARER_PREFIX: &str = "Bearer ";

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Authorization-failure statuses
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_FORBIDDEN: u16 = 403;
pub const DEFAULT_AUTH_FAILURE_STATUSES: [u16; 2] = [STATUS_UNAUTHORIZED, STATUS_FORBIDDEN];

// Timeouts
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 15_000;

// Credential storage defaults
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "authpipe";
pub const DEFAULT_KEYCHAIN_ACCOUNT: &str = "default";

// Environment variables read by the configuration loader
pub const ENV_BASE_URL: &str = "AUTHPIPE_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "AUTHPIPE_REQUEST_TIMEOUT_MS";
pub const ENV_AUTH_FAILURE_STATUSES: &str = "AUTHPIPE_AUTH_FAILURE_STATUSES";
pub const ENV_REFRESH_URL: &str = "AUTHPIPE_REFRESH_URL";
pub const ENV_REFRESH_FORMAT: &str = "AUTHPIPE_REFRESH_FORMAT";
pub const ENV_REFRESH_CLIENT_ID: &str = "AUTHPIPE_REFRESH_CLIENT_ID";
pub const ENV_REFRESH_TIMEOUT_MS: &str = "AUTHPIPE_REFRESH_TIMEOUT_MS";
pub const ENV_STORAGE_BACKEND: &str = "AUTHPIPE_STORAGE_BACKEND";
pub const ENV_KEYCHAIN_SERVICE: &str = "AUTHPIPE_KEYCHAIN_SERVICE";
pub const ENV_KEYCHAIN_ACCOUNT: &str = "AUTHPIPE_KEYCHAIN_ACCOUNT";
pub const ENV_CREDENTIAL_FILE: &str = "AUTHPIPE_CREDENTIAL_FILE";
