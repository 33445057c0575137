//! Structured error types for xlgrid.
//!
//! Layout operations never fail; these cover the crate's boundaries:
//! configuration and scenario input, file I/O and the JavaScript bridge.

/// All errors that can occur at xlgrid's boundaries.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Malformed configuration or scenario JSON.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Scenario describes something the engine cannot replay.
    #[error("Invalid scenario: {0}")]
    Scenario(String),

    /// Value passed in from JavaScript could not be converted.
    #[error("Invalid JS value: {0}")]
    JsValue(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<serde_wasm_bindgen::Error> for GridError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Self::JsValue(e.to_string())
    }
}

impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
