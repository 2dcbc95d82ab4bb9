//! Error type definitions for the client core.
//!
//! Layered error enums: fetch errors for anything crossing the network,
//! resolve errors for the catalog extraction pipeline, and a top-level
//! application error that aggregates both.

use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Network or remote endpoint failures
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Catalog resolution failures
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Login rejected
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors crossing the HTTP fetch boundary.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connect, timeout)
    #[error("Request failed: {url} - {message}")]
    Request { url: String, message: String },

    /// Non-success HTTP status
    #[error("HTTP error: {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded as the expected shape
    #[error("Decode error: {url} - {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn request<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Request {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn decode<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Catalog resolution failures: any missing page element or fragment along
/// the two-hop extraction yields one of these, surfaced to the caller as
/// "video unavailable". The pipeline never panics on malformed pages.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Listing page fetch failed
    #[error("Fetch failed during resolution: {0}")]
    Fetch(#[from] FetchError),

    /// Listing page contains no inline frame
    #[error("No iframe found in listing page")]
    MissingIframe,

    /// Embed page contains no inline script
    #[error("No script found in embed page")]
    MissingScript,

    /// Inline script carries no recognizable video state object
    #[error("No video object found in embed script")]
    MissingVideoObject,

    /// Inline script carries no params block
    #[error("No params block found in embed script")]
    MissingParams,

    /// A located fragment could not be decoded as structured data
    #[error("Fragment decode failed: {message}")]
    FragmentDecode { message: String },
}

impl ResolveError {
    pub fn fragment<M: Into<String>>(message: M) -> Self {
        Self::FragmentDecode {
            message: message.into(),
        }
    }
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
