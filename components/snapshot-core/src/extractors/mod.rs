/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Pure extractors over CDP responses (spec §4.3). Each extractor takes a
//! response (or, for per-node calls, an `ExtractorContext`) and returns
//! data; none mutate session-wide state.

pub mod ax;
pub mod dom;
pub mod grouping;
pub mod label;
pub mod layout;
pub mod locator;
pub mod region;

use std::sync::Arc;

use crate::config::Config;
use crate::session::CdpSession;

/// Shared handle extractors thread through instead of taking the session
/// and config as separate parameters everywhere (spec §4.3 "a shared
/// `ExtractorContext`").
#[derive(Clone)]
pub struct ExtractorContext {
    pub session: Arc<CdpSession>,
    pub config: Config,
}

impl ExtractorContext {
    pub fn new(session: Arc<CdpSession>, config: Config) -> Self {
        Self { session, config }
    }
}
