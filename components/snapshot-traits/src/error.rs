/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Error taxonomy (spec §7). Each enum corresponds to one of the "kinds,
//! not type names" the spec calls out; callers match on kind, not on a
//! flat bag of variants.

use thiserror::Error;

/// Transport/command-level failures from the CDP Session Abstraction
/// (spec §4.1, §7).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cdp session closed or detached")]
    SessionClosed,
    #[error("cdp command {method} failed: {message}")]
    CommandFailed { method: String, message: String },
    #[error("cdp command {method} timed out after {elapsed_ms}ms")]
    Timeout { method: String, elapsed_ms: u64 },
    #[error("unknown transport error: {0}")]
    Unknown(String),
}

/// Failures from the Snapshot Compiler and the extractors it drives
/// (spec §4.4 "Failure semantics").
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cdp session error during capture: {0}")]
    Session(#[from] SessionError),
    #[error("dom extraction failed: {0}")]
    DomExtractionFailed(String),
    #[error("accessibility tree extraction failed: {0}")]
    AxExtractionFailed(String),
    #[error("capture exceeded its deadline")]
    DeadlineExceeded,
}

/// Agent-facing element-reference failures (spec §4.2, §7 "Stale ref").
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("element not found: stale reference, page has navigated")]
    ElementNotFound,
    #[error("element reference could not be parsed: {0}")]
    InvalidRef(String),
}

/// Agent input failures at the tool boundary (spec §7 "Schema / validation").
#[derive(Debug, Error)]
#[error("invalid input for field `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Query Engine failures (spec §4.7).
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no snapshot available to query")]
    NoSnapshot,
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
