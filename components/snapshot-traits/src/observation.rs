/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `DOMObservation` and its signals (spec §3, §4.8).

use serde::{Deserialize, Serialize};

use crate::ids::Eid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationType {
    Appeared,
    Disappeared,
}

/// Signals that make a mutation notable enough to record (spec §3, §4.8).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObservationSignals {
    #[serde(default)]
    pub is_alert_or_live: bool,
    #[serde(default)]
    pub is_dialog: bool,
    #[serde(default)]
    pub is_fixed_or_sticky: bool,
    #[serde(default)]
    pub is_high_z_index: bool,
    #[serde(default)]
    pub viewport_coverage_pct: f64,
    #[serde(default)]
    pub is_body_child: bool,
    #[serde(default)]
    pub has_interactives: bool,
    #[serde(default)]
    pub appeared_after_delay: bool,
    #[serde(default)]
    pub short_lived: bool,
}

/// Text and structural summary of the mutated element, hygienically
/// extracted (spec §3, §8 "Observer text hygiene": never includes text
/// originating inside `<style>`, `<script>`, `<noscript>`, `<template>`,
/// or `<svg>`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObservationContent {
    pub tag: String,
    pub role: Option<String>,
    pub text: String,
    pub has_interactives: bool,
}

/// A recorded, scored DOM mutation occurring during an action or between
/// reports (spec §3, GLOSSARY "Observation").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomObservation {
    pub r#type: ObservationType,
    /// 0..10, derived from `signals`.
    pub significance: u8,
    pub signals: ObservationSignals,
    pub content: ObservationContent,
    /// Milliseconds since the UNIX epoch, as captured in-page.
    pub timestamp: u64,
    pub reported: bool,
    /// Populated for `since_previous` entries (spec §4.8 `getObservations`).
    pub age_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    pub eid: Option<Eid>,
}

impl DomObservation {
    pub fn meets_threshold(&self, min: u8) -> bool {
        self.significance >= min
    }
}

/// Output of a single `getObservations` drain (spec §4.8).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObservationBatch {
    pub during_action: Vec<DomObservation>,
    pub since_previous: Vec<DomObservation>,
}
