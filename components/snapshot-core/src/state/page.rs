/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! `PageState`: per-page ownership of the latest snapshot, FactPack, frame
//! tracker, and observation accumulator (spec §2 "State Manager", §5
//! "per-page state").

use std::sync::{Arc, Mutex};

use snapshot_traits::factpack::FactPack;
use snapshot_traits::{BaseSnapshot, CaptureError, ElementError, Eid, FrameId, LoaderId, QueryError, ScopedElementRef, SessionError};

use crate::config::Config;
use crate::extractors::ExtractorContext;
use crate::frame_tracker::FrameTracker;
use crate::observation::{filter_by_significance, ObservationAccumulator};
use crate::query::{self, Query};
use crate::render::Budget;
use crate::session::CdpSession;
use crate::{compiler, factpack};

use super::response;

/// Coarse per-page health, standing in for the "health" half of spec §2's
/// "snapshot+diff+observations+health" wrapping: whether a snapshot exists
/// yet and whether the last capture was partial.
#[derive(Clone, Debug, Default)]
pub struct PageHealth {
    pub has_snapshot: bool,
    pub partial: bool,
    pub node_count: usize,
    pub interactive_count: usize,
    pub warnings: Vec<String>,
}

/// Owns everything the response builder needs for one logical page: the
/// CDP session, the Frame Tracker, the Observation Accumulator, and the
/// most recently compiled snapshot/FactPack pair.
pub struct PageState {
    pub page_id: String,
    session: Arc<CdpSession>,
    frame_tracker: Arc<FrameTracker>,
    observations: ObservationAccumulator,
    config: Config,
    snapshot: Mutex<Option<BaseSnapshot>>,
    fact_pack: Mutex<Option<FactPack>>,
}

impl PageState {
    pub fn new(page_id: impl Into<String>, session: Arc<CdpSession>, config: Config) -> Self {
        let frame_tracker = FrameTracker::new(session.clone(), &config);
        Self {
            page_id: page_id.into(),
            session,
            frame_tracker,
            observations: ObservationAccumulator::new(),
            config,
            snapshot: Mutex::new(None),
            fact_pack: Mutex::new(None),
        }
    }

    /// Fetches the frame tree and injects the mutation observer (spec §4.2
    /// `initialize`, §4.8 `ensureInjected`). Must run before the first
    /// `report`.
    pub async fn init(&self) -> Result<(), SessionError> {
        self.frame_tracker.init().await?;
        self.observations.ensure_injected(&self.session).await
    }

    /// Captures a fresh snapshot, diffs it against whatever was captured
    /// last, drains observations recorded since, and renders the `<state>`
    /// block the agent reads after a navigation or mutation (spec §2 data
    /// flow, §6 "Agent-facing XML surface"). Replaces the stored
    /// snapshot/FactPack with the freshly captured ones.
    pub async fn report(
        &self,
        frame_id: FrameId,
        loader_id: LoaderId,
        action_start_ts: u64,
        trigger: &str,
        budget: Budget,
    ) -> Result<String, CaptureError> {
        let ctx = ExtractorContext::new(self.session.clone(), self.config.clone());
        let next = compiler::capture(&ctx, frame_id, loader_id).await?;
        let pack = factpack::build(&next, &self.config);

        let previous = self.snapshot.lock().unwrap().clone();
        let delta = previous.as_ref().map(|prev| crate::diff(prev, &next));

        let raw_observations = self
            .observations
            .get_observations(&self.session, action_start_ts, trigger)
            .await?;
        let observations = filter_by_significance(&raw_observations, self.config.min_observation_significance);

        let xml = response::render_state(&next, delta.as_ref(), &observations, &pack, budget);

        *self.snapshot.lock().unwrap() = Some(next);
        *self.fact_pack.lock().unwrap() = Some(pack);

        Ok(xml)
    }

    pub fn latest_snapshot(&self) -> Option<BaseSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn health(&self) -> PageHealth {
        match self.snapshot.lock().unwrap().as_ref() {
            Some(snap) => PageHealth {
                has_snapshot: true,
                partial: snap.meta.partial,
                node_count: snap.meta.node_count,
                interactive_count: snap.meta.interactive_count,
                warnings: snap.meta.warnings.clone(),
            },
            None => PageHealth::default(),
        }
    }

    /// `<result type="find_elements">` (spec §4.7, §6).
    pub fn find_elements(&self, query: &Query) -> Result<String, QueryError> {
        let guard = self.snapshot.lock().unwrap();
        let snapshot = guard.as_ref().ok_or(QueryError::NoSnapshot)?;
        let results = query::run(snapshot, query);
        Ok(response::render_find_elements(&results))
    }

    /// `<result type="get_element_details">` (spec §6).
    pub fn get_element_details(&self, eid: &Eid) -> Result<String, QueryError> {
        let guard = self.snapshot.lock().unwrap();
        let snapshot = guard.as_ref().ok_or(QueryError::NoSnapshot)?;
        let node = snapshot
            .find_by_eid(eid)
            .ok_or_else(|| QueryError::InvalidQuery(format!("no element with eid {}", eid.0)))?;
        Ok(response::render_element_details(node))
    }

    /// Resolves an agent-supplied serialized ref, surfacing spec §7's
    /// "Stale ref" kind (`ElementNotFound`) when the loader no longer
    /// matches.
    pub fn resolve_ref(&self, raw: &str) -> Result<ScopedElementRef, ElementError> {
        self.frame_tracker.parse_ref(raw).ok_or(ElementError::ElementNotFound)
    }

    pub fn frame_tracker(&self) -> &Arc<FrameTracker> {
        &self.frame_tracker
    }

    /// Clears per-page state on a fresh load (spec §5 "prunes on page
    /// clear").
    pub fn clear(&self) {
        *self.snapshot.lock().unwrap() = None;
        *self.fact_pack.lock().unwrap() = None;
        self.observations.clear_page();
        self.frame_tracker.clear_all_refs();
    }

    pub fn close(&self) -> String {
        self.session.close();
        response::render_close_page(&self.page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use snapshot_traits::{CdpEvent, CdpTransport};

    struct ScriptedTransport;

    #[async_trait]
    impl CdpTransport for ScriptedTransport {
        async fn send(&self, _session_id: Option<&str>, method: &str, _params: Value) -> Result<Value, SessionError> {
            let value = match method {
                "Page.getFrameTree" => json!({
                    "frameTree": { "frame": { "id": "main", "loaderId": "loader-1" }, "childFrames": [] }
                }),
                "DOM.getDocument" => json!({
                    "root": {
                        "backendNodeId": 1, "nodeId": 1, "nodeName": "BODY", "nodeType": 1, "attributes": [],
                        "children": [
                            { "backendNodeId": 2, "nodeId": 2, "nodeName": "BUTTON", "nodeType": 1, "attributes": [],
                              "children": [
                                  { "backendNodeId": 3, "nodeId": 3, "nodeName": "#text", "nodeType": 3,
                                    "nodeValue": "Checkout" }
                              ] }
                        ]
                    }
                }),
                "Accessibility.getFullAXTree" => json!({
                    "nodes": [
                        { "nodeId": "1", "backendDOMNodeId": 2, "role": { "value": "button" }, "name": { "value": "Checkout" } }
                    ]
                }),
                "Runtime.evaluate" => json!({
                    "result": { "value": {
                        "url": "https://shop.test/cart", "title": "Cart",
                        "viewportW": 1280.0, "viewportH": 800.0,
                        "scrollX": 0.0, "scrollY": 0.0,
                        "loadingSpinnerCount": 0, "validationErrorCount": 0, "toastCount": 0,
                    } }
                }),
                "DOM.getBoxModel" => json!({
                    "model": { "content": [10.0, 10.0, 110.0, 10.0, 110.0, 50.0, 10.0, 50.0] }
                }),
                "CSS.getComputedStyleForNode" => json!({ "computedStyle": [] }),
                _ => Value::Object(Default::default()),
            };
            Ok(value)
        }

        async fn next_event(&self) -> Option<CdpEvent> {
            None
        }

        fn is_active(&self) -> bool {
            true
        }
    }

    fn page() -> PageState {
        let session = Arc::new(CdpSession::new(Arc::new(ScriptedTransport), None, Config::default()));
        PageState::new("page-1", session, Config::default())
    }

    #[tokio::test]
    async fn report_then_find_elements_round_trips_the_captured_button() {
        let state = page();
        state.init().await.unwrap();

        let xml = state
            .report(FrameId("main".to_string()), LoaderId("loader-1".to_string()), 0, "navigate", Budget::Standard)
            .await
            .unwrap();
        assert!(xml.starts_with("<state>"));
        assert!(xml.contains("<diff/>"));

        let health = state.health();
        assert!(health.has_snapshot);
        assert_eq!(health.interactive_count, 1);

        let found = state.find_elements(&Query::default()).unwrap();
        assert!(found.contains("label=\"Checkout\""));
    }

    #[tokio::test]
    async fn get_element_details_rejects_unknown_eid() {
        let state = page();
        state.init().await.unwrap();
        state
            .report(FrameId("main".to_string()), LoaderId("loader-1".to_string()), 0, "navigate", Budget::Standard)
            .await
            .unwrap();

        let err = state.get_element_details(&Eid("does-not-exist".to_string())).unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery(_)));
    }

    #[test]
    fn find_elements_before_any_report_fails_with_no_snapshot() {
        let state = page();
        let err = state.find_elements(&Query::default()).unwrap_err();
        assert!(matches!(err, QueryError::NoSnapshot));
    }

    #[test]
    fn resolve_ref_rejects_unparseable_refs() {
        let state = page();
        let err = state.resolve_ref("garbage").unwrap_err();
        assert!(matches!(err, ElementError::ElementNotFound));
    }
}
