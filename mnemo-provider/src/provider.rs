//! The `Provider` trait: the out-of-scope boundary to the actual
//! language-model client. Content generation, streaming, and
//! generation-side token counting all live on the other side of it.

use std::future::Future;
use thiserror::Error;

use crate::types::{ProviderRequest, ProviderResponse};

/// Errors from the language-model client.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request failed at the transport layer.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The provider rejected the request (rate limit, auth, etc).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The language-model client boundary.
///
/// Uses RPITIT and is intentionally not object-safe — the processor
/// is generic over `P: Provider`, not a trait object, since there is
/// exactly one provider per processor instance.
pub trait Provider: Send + Sync {
    /// Send one completion request and take `choices[0]`.
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display() {
        assert_eq!(
            ProviderError::RequestFailed("timeout".into()).to_string(),
            "request failed: timeout"
        );
        assert_eq!(
            ProviderError::Rejected("rate limited".into()).to_string(),
            "rejected: rate limited"
        );
    }
}
