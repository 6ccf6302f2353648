/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Observation Accumulator (spec §4.8): injects a MutationObserver into the
//! page, drains its buffers into `DomObservation`s, and bounds a
//! per-trigger dependency tracker.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{json, Value};
use snapshot_traits::observation::{DomObservation, ObservationBatch, ObservationContent, ObservationSignals, ObservationType};
use snapshot_traits::SessionError;

use crate::session::CdpSession;

/// The browser-side script (spec §9 "single source asset plus a stable
/// handshake"). `SENTINEL` names the global the core checks for liveness.
const INSTALL_SCRIPT: &str = include_str!("../assets/mutation_observer.js");
const SENTINEL: &str = "window.__snapshotObserverInstalled";

const MAX_RETAINED: usize = 500;

/// Per-page MutationObserver lifecycle plus drained-observation buffers.
pub struct ObservationAccumulator {
    state: Mutex<AccumulatorState>,
}

#[derive(Default)]
struct AccumulatorState {
    since_previous: VecDeque<DomObservation>,
    dependency_tracker: DependencyTracker,
}

impl ObservationAccumulator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AccumulatorState::default()),
        }
    }

    /// Evaluates the install script. Idempotent by construction (the script
    /// itself no-ops if the sentinel is already set), but callers should
    /// prefer [`Self::ensure_injected`] to avoid an unconditional round trip.
    pub async fn inject(&self, session: &CdpSession) -> Result<(), SessionError> {
        let _: Value = session
            .send(
                "Runtime.evaluate",
                json!({ "expression": INSTALL_SCRIPT, "returnByValue": true }),
            )
            .await?;
        Ok(())
    }

    /// Asks the page whether the observer sentinel is still set; re-injects
    /// if the check returns false or fails outright (spec §4.8
    /// `ensureInjected`).
    pub async fn ensure_injected(&self, session: &CdpSession) -> Result<(), SessionError> {
        let still_live = self.check_sentinel(session).await.unwrap_or(false);
        if !still_live {
            self.inject(session).await?;
        }
        Ok(())
    }

    async fn check_sentinel(&self, session: &CdpSession) -> Result<bool, SessionError> {
        let response: Value = session
            .send(
                "Runtime.evaluate",
                json!({ "expression": format!("!!{SENTINEL}"), "returnByValue": true }),
            )
            .await?;
        Ok(response
            .get("result")
            .and_then(|r| r.get("value"))
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Drains both page-side buffers and folds the `since_previous` entries
    /// into this accumulator's retained history (bounded to `MAX_RETAINED`,
    /// dropping the oldest), recording each into the dependency tracker
    /// under `trigger` (spec §4.8 `getObservations`, §5).
    pub async fn get_observations(
        &self,
        session: &CdpSession,
        action_start_ts: u64,
        trigger: &str,
    ) -> Result<ObservationBatch, SessionError> {
        let since_previous_raw: Value = session
            .send(
                "Runtime.evaluate",
                json!({ "expression": "window.__snapshotObserverDrainSincePrevious()", "returnByValue": true }),
            )
            .await?;
        let during_action_raw: Value = session
            .send(
                "Runtime.evaluate",
                json!({
                    "expression": format!("window.__snapshotObserverDrainDuringAction({action_start_ts})"),
                    "returnByValue": true,
                }),
            )
            .await?;

        let now_ms = action_start_ts;
        let since_previous: Vec<DomObservation> = extract_array(&since_previous_raw)
            .iter()
            .filter_map(|raw| parse_observation(raw, now_ms))
            .collect();
        let during_action: Vec<DomObservation> = extract_array(&during_action_raw)
            .iter()
            .filter_map(|raw| parse_observation(raw, now_ms))
            .collect();

        let mut state = self.state.lock().unwrap();
        for obs in &since_previous {
            state.since_previous.push_back(obs.clone());
            if state.since_previous.len() > MAX_RETAINED {
                state.since_previous.pop_front();
            }
            state.dependency_tracker.record(trigger, obs.content.clone());
        }
        for obs in &during_action {
            state.dependency_tracker.record(trigger, obs.content.clone());
        }

        Ok(ObservationBatch {
            during_action,
            since_previous,
        })
    }

    /// Clears retained observations and the dependency tracker for a fresh
    /// page load (spec §5 "prunes on page clear").
    pub fn clear_page(&self) {
        let mut state = self.state.lock().unwrap();
        state.since_previous.clear();
        state.dependency_tracker.clear();
    }
}

impl Default for ObservationAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Only renders observations at or above `min` (spec §4.8
/// `filterBySignificance`, default 4); the low-significance tail stays in
/// the accumulator's own buffers for debugging.
pub fn filter_by_significance(batch: &ObservationBatch, min: u8) -> ObservationBatch {
    ObservationBatch {
        during_action: batch.during_action.iter().filter(|o| o.meets_threshold(min)).cloned().collect(),
        since_previous: batch.since_previous.iter().filter(|o| o.meets_threshold(min)).cloned().collect(),
    }
}

fn extract_array(response: &Value) -> Vec<Value> {
    response
        .get("result")
        .and_then(|r| r.get("value"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn parse_observation(raw: &Value, now_ms: u64) -> Option<DomObservation> {
    let r#type = match raw.get("type").and_then(Value::as_str)? {
        "appeared" => ObservationType::Appeared,
        "disappeared" => ObservationType::Disappeared,
        _ => return None,
    };
    let timestamp = raw.get("timestamp").and_then(Value::as_u64).unwrap_or(now_ms);
    let significance = raw.get("significance").and_then(Value::as_u64).unwrap_or(0).min(10) as u8;

    let signals_raw = raw.get("signals").cloned().unwrap_or(Value::Null);
    let signals = ObservationSignals {
        is_alert_or_live: bool_field(&signals_raw, "isAlertOrLive"),
        is_dialog: bool_field(&signals_raw, "isDialog"),
        is_fixed_or_sticky: bool_field(&signals_raw, "isFixedOrSticky"),
        is_high_z_index: bool_field(&signals_raw, "isHighZIndex"),
        viewport_coverage_pct: signals_raw.get("viewportCoveragePct").and_then(Value::as_f64).unwrap_or(0.0),
        is_body_child: bool_field(&signals_raw, "isBodyChild"),
        has_interactives: bool_field(&signals_raw, "hasInteractives"),
        appeared_after_delay: bool_field(&signals_raw, "appearedAfterDelay"),
        short_lived: bool_field(&signals_raw, "shortLived"),
    };

    let content_raw = raw.get("content").cloned().unwrap_or(Value::Null);
    let content = ObservationContent {
        tag: content_raw.get("tag").and_then(Value::as_str).unwrap_or_default().to_string(),
        role: content_raw.get("role").and_then(Value::as_str).map(str::to_string),
        text: content_raw.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
        has_interactives: bool_field(&content_raw, "hasInteractives"),
    };

    let age_ms = Some(now_ms.saturating_sub(timestamp));

    Some(DomObservation {
        r#type,
        significance,
        signals,
        content,
        timestamp,
        reported: false,
        age_ms,
        duration_ms: None,
        eid: None,
    })
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Bounds observations per trigger at 10 entries, FIFO (spec §5 "the
/// dependency tracker bounds per-trigger observations at 10 and prunes on
/// page clear"). A "trigger" is the action or event name that produced the
/// observation (e.g. an EID the agent just clicked).
#[derive(Default)]
pub struct DependencyTracker {
    per_trigger: HashMap<String, VecDeque<ObservationContent>>,
}

const MAX_PER_TRIGGER: usize = 10;

impl DependencyTracker {
    pub fn record(&mut self, trigger: &str, content: ObservationContent) {
        let bucket = self.per_trigger.entry(trigger.to_string()).or_default();
        bucket.push_back(content);
        if bucket.len() > MAX_PER_TRIGGER {
            bucket.pop_front();
        }
    }

    pub fn for_trigger(&self, trigger: &str) -> Vec<ObservationContent> {
        self.per_trigger
            .get(trigger)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.per_trigger.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_constant_matches_install_script_handshake() {
        assert!(INSTALL_SCRIPT.contains("__snapshotObserverInstalled"));
    }

    #[test]
    fn parse_observation_rejects_unknown_type() {
        let raw = json!({ "type": "moved", "timestamp": 0, "significance": 5 });
        assert!(parse_observation(&raw, 0).is_none());
    }

    #[test]
    fn parse_observation_clamps_significance_to_ten() {
        let raw = json!({
            "type": "appeared",
            "timestamp": 100,
            "significance": 99,
            "signals": {},
            "content": { "tag": "div", "text": "", "hasInteractives": false },
        });
        let obs = parse_observation(&raw, 200).unwrap();
        assert_eq!(obs.significance, 10);
        assert_eq!(obs.age_ms, Some(100));
    }

    #[test]
    fn dependency_tracker_bounds_entries_per_trigger() {
        let mut tracker = DependencyTracker::default();
        for i in 0..15 {
            tracker.record(
                "click:submit",
                ObservationContent {
                    tag: "div".to_string(),
                    role: None,
                    text: format!("entry {i}"),
                    has_interactives: false,
                },
            );
        }
        let entries = tracker.for_trigger("click:submit");
        assert_eq!(entries.len(), MAX_PER_TRIGGER);
        assert_eq!(entries[0].text, "entry 5");
    }

    #[test]
    fn clear_page_empties_dependency_tracker() {
        let mut tracker = DependencyTracker::default();
        tracker.record(
            "click:submit",
            ObservationContent {
                tag: "div".to_string(),
                role: None,
                text: "x".to_string(),
                has_interactives: false,
            },
        );
        tracker.clear();
        assert!(tracker.for_trigger("click:submit").is_empty());
    }

    #[test]
    fn filter_by_significance_drops_low_scoring_entries() {
        let batch = ObservationBatch {
            during_action: vec![],
            since_previous: vec![
                DomObservation {
                    r#type: ObservationType::Appeared,
                    significance: 2,
                    signals: ObservationSignals::default(),
                    content: ObservationContent::default(),
                    timestamp: 0,
                    reported: false,
                    age_ms: None,
                    duration_ms: None,
                    eid: None,
                },
                DomObservation {
                    r#type: ObservationType::Appeared,
                    significance: 7,
                    signals: ObservationSignals::default(),
                    content: ObservationContent::default(),
                    timestamp: 0,
                    reported: false,
                    age_ms: None,
                    duration_ms: None,
                    eid: None,
                },
            ],
        };
        let filtered = filter_by_significance(&batch, 4);
        assert_eq!(filtered.since_previous.len(), 1);
        assert_eq!(filtered.since_previous[0].significance, 7);
    }
}
