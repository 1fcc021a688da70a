#![deny(missing_docs)]
//! The language-model client boundary: the `Provider` trait and its
//! wire types. The client itself (generation, streaming) is out of
//! scope — this crate only defines the seam.

pub mod provider;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use provider::{Provider, ProviderError};
pub use types::{ContentPart, ProviderMessage, ProviderRequest, ProviderResponse, Role, StopReason, ToolSchema};
