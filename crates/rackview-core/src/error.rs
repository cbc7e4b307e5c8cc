// ── Error taxonomy ──
//
// No variant here is fatal to the engine: local validation keeps the
// user in edit mode, dispatch failures surface as retryable UI state,
// and missing reference data is a degraded-but-valid condition.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A save was blocked before submission; the section stays in edit
    /// mode and nothing reaches the node service.
    #[error("validation failed: {0}")]
    LocalValidation(String),

    /// Asynchronous failure reported by the node service for an update
    /// or action. The optimistic guard exit stands; the detail is kept
    /// for display.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// Reference data not yet loaded. Surfaced as a blocking condition
    /// on specific actions rather than a hard failure.
    #[error("reference data unavailable: {0}")]
    DataUnavailable(&'static str),

    /// The requested node does not exist on the node service.
    #[error("no node with system id {0}")]
    NotFound(String),

    /// No node is active for this view.
    #[error("no active node")]
    NoActiveNode,

    /// The view was torn down while an operation was in flight.
    #[error("view cancelled")]
    Cancelled,
}
