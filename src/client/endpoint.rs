//! Server endpoint URLs
//!
//! Session and user ids are opaque strings. Each one is appended as a single
//! percent-encoded path segment.

use reqwest::Url;

use crate::client::error::ClientError;

/// Parse the configured server URL
pub fn parse_base(base: &str) -> Result<Url, ClientError> {
    let url = Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base, e)))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl(base.to_string()));
    }
    Ok(url)
}

/// `base` followed by `segments`, each encoded on its own
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
