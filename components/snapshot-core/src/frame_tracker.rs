/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Frame lifecycle and element reference bookkeeping (spec §4.2).
//!
//! Shaped like `CdpSession`: a value type holding a `Mutex`-guarded state
//! struct plus handlers registered against that session, rather than the
//! teacher's actor-registry/message-passing style — there is no second
//! party to address here, so a plain struct with explicit methods is the
//! more direct idiom (same "explicit register/drop" spirit as
//! [`crate::handler_registry::HandlerRegistry`]).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::Value;
use snapshot_traits::{BackendNodeId, FrameId, LoaderId, ScopedElementRef, SessionError};
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::session::CdpSession;

#[derive(Clone, Debug)]
struct FrameInfo {
    loader_id: LoaderId,
    parent_frame_id: Option<FrameId>,
}

type CompositeKey = (FrameId, BackendNodeId);

#[derive(Default)]
struct TrackerState {
    frames: HashMap<FrameId, FrameInfo>,
    main_frame_id: Option<FrameId>,
    issued_refs: HashMap<CompositeKey, ScopedElementRef>,
    issued_order: VecDeque<CompositeKey>,
    pending_invalidations: Vec<ScopedElementRef>,
}

/// Tracks which frames currently exist and which element references issued
/// against them are still live.
pub struct FrameTracker {
    session: Arc<CdpSession>,
    state: Mutex<TrackerState>,
    init: OnceCell<()>,
    max_issued_refs: usize,
    ref_eviction_batch: usize,
}

impl FrameTracker {
    pub fn new(session: Arc<CdpSession>, config: &Config) -> Arc<Self> {
        Arc::new(Self {
            session,
            state: Mutex::new(TrackerState::default()),
            init: OnceCell::new(),
            max_issued_refs: config.max_issued_refs,
            ref_eviction_batch: config.ref_eviction_batch,
        })
    }

    /// Enables the Page domain, snapshots the current frame tree, and
    /// subscribes to `frameNavigated`/`frameDetached`. Idempotent: a second
    /// call while the first is still in flight awaits the same result
    /// rather than re-running the handshake.
    pub async fn init(self: &Arc<Self>) -> Result<(), SessionError> {
        self.init
            .get_or_try_init(|| async {
                let tree: FrameTreeResponse = self.session.send("Page.getFrameTree", Value::Null).await?;
                {
                    let mut state = self.state.lock().unwrap();
                    insert_frame_tree(&mut state, &tree.frame_tree, None);
                }

                let weak_navigated = Arc::clone(self);
                self.session.on("Page.frameNavigated", move |params| {
                    weak_navigated.handle_frame_navigated(params);
                });
                let weak_detached = Arc::clone(self);
                self.session.on("Page.frameDetached", move |params| {
                    weak_detached.handle_frame_detached(params);
                });

                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Returns `None` if `frame_id` does not exist or [`FrameTracker::init`]
    /// has not completed. Evicts the oldest batch of issued refs first if
    /// the bound has been reached.
    pub fn create_ref(&self, backend_node_id: BackendNodeId, frame_id: FrameId) -> Option<ScopedElementRef> {
        let mut state = self.state.lock().unwrap();
        let loader_id = state.frames.get(&frame_id)?.loader_id.clone();
        let key = (frame_id.clone(), backend_node_id);

        if !state.issued_refs.contains_key(&key) && state.issued_refs.len() >= self.max_issued_refs {
            let batch = self.ref_eviction_batch;
            for _ in 0..batch {
                let Some(oldest) = state.issued_order.pop_front() else {
                    break;
                };
                state.issued_refs.remove(&oldest);
            }
        }

        let scoped = ScopedElementRef::new(backend_node_id, frame_id, loader_id);
        if !state.issued_refs.contains_key(&key) {
            state.issued_order.push_back(key.clone());
        }
        state.issued_refs.insert(key, scoped.clone());
        Some(scoped)
    }

    pub fn is_valid(&self, scoped: &ScopedElementRef) -> bool {
        let state = self.state.lock().unwrap();
        state
            .frames
            .get(&scoped.frame_id)
            .is_some_and(|info| info.loader_id == scoped.loader_id)
    }

    pub fn serialize_ref(&self, scoped: &ScopedElementRef) -> String {
        let state = self.state.lock().unwrap();
        if state.main_frame_id.as_ref() == Some(&scoped.frame_id) {
            format!("{}:{}", scoped.loader_id, scoped.backend_node_id)
        } else {
            format!(
                "{}:{}:{}",
                scoped.frame_id, scoped.loader_id, scoped.backend_node_id
            )
        }
    }

    /// Returns `None` for malformed input or a ref whose `loader_id` no
    /// longer matches the frame's current load (a stale ref from a
    /// previous navigation).
    pub fn parse_ref(&self, raw: &str) -> Option<ScopedElementRef> {
        let parts: Vec<&str> = raw.split(':').collect();
        let (frame_id, loader_id, backend_node_id) = match parts.as_slice() {
            [loader_id, backend_node_id] => {
                let state = self.state.lock().unwrap();
                (state.main_frame_id.clone()?, loader_id.to_string(), *backend_node_id)
            }
            [frame_id, loader_id, backend_node_id] => (
                FrameId(frame_id.to_string()),
                loader_id.to_string(),
                *backend_node_id,
            ),
            _ => return None,
        };
        let backend_node_id = BackendNodeId(backend_node_id.parse().ok()?);
        let loader_id = LoaderId(loader_id);

        let state = self.state.lock().unwrap();
        let current = state.frames.get(&frame_id)?;
        if current.loader_id != loader_id {
            return None;
        }
        Some(ScopedElementRef::new(backend_node_id, frame_id, loader_id))
    }

    /// Moves queued invalid refs to the caller, clearing the queue. Called
    /// by the diff engine immediately before computing a delta.
    pub fn drain_invalidations(&self) -> Vec<ScopedElementRef> {
        std::mem::take(&mut self.state.lock().unwrap().pending_invalidations)
    }

    pub fn prune_refs(&self, refs: &[ScopedElementRef]) {
        let mut state = self.state.lock().unwrap();
        for scoped in refs {
            let key = (scoped.frame_id.clone(), scoped.backend_node_id);
            state.issued_refs.remove(&key);
        }
    }

    pub fn clear_all_refs(&self) {
        let mut state = self.state.lock().unwrap();
        state.issued_refs.clear();
        state.issued_order.clear();
        state.pending_invalidations.clear();
    }

    fn handle_frame_navigated(&self, params: &Value) {
        let Some(info) = params
            .get("frame")
            .and_then(|f| serde_json::from_value::<FrameInfoWire>(f.clone()).ok())
        else {
            return;
        };

        let mut state = self.state.lock().unwrap();
        if let Some(previous) = state.frames.get(&info.id).cloned() {
            if previous.loader_id != info.loader_id {
                let stale: Vec<CompositeKey> = state
                    .issued_order
                    .iter()
                    .filter(|(frame_id, _)| frame_id == &info.id)
                    .cloned()
                    .collect();
                for key in stale {
                    if let Some(scoped) = state.issued_refs.remove(&key) {
                        if scoped.loader_id == previous.loader_id {
                            state.pending_invalidations.push(scoped);
                        } else {
                            state.issued_refs.insert(key, scoped);
                        }
                    }
                }
            }
        }

        let is_main = info.parent_id.is_none();
        state.frames.insert(
            info.id.clone(),
            FrameInfo {
                loader_id: info.loader_id,
                parent_frame_id: info.parent_id,
            },
        );
        if is_main {
            state.main_frame_id = Some(info.id);
        }
    }

    fn handle_frame_detached(&self, params: &Value) {
        let Some(frame_id) = params
            .get("frameId")
            .and_then(Value::as_str)
            .map(|s| FrameId(s.to_string()))
        else {
            return;
        };

        let mut state = self.state.lock().unwrap();
        let stale: Vec<CompositeKey> = state
            .issued_order
            .iter()
            .filter(|(fid, _)| fid == &frame_id)
            .cloned()
            .collect();
        for key in stale {
            if let Some(scoped) = state.issued_refs.remove(&key) {
                state.pending_invalidations.push(scoped);
            }
        }
        state.frames.remove(&frame_id);
        if state.main_frame_id.as_ref() == Some(&frame_id) {
            state.main_frame_id = None;
        }
    }

    #[cfg(test)]
    fn parent_of(&self, frame_id: &FrameId) -> Option<FrameId> {
        self.state
            .lock()
            .unwrap()
            .frames
            .get(frame_id)?
            .parent_frame_id
            .clone()
    }
}

#[derive(Deserialize)]
struct FrameTreeResponse {
    #[serde(rename = "frameTree")]
    frame_tree: FrameTreeNode,
}

#[derive(Deserialize)]
struct FrameTreeNode {
    frame: FrameInfoWire,
    #[serde(rename = "childFrames", default)]
    child_frames: Vec<FrameTreeNode>,
}

#[derive(Clone, Deserialize)]
struct FrameInfoWire {
    id: FrameId,
    #[serde(rename = "loaderId")]
    loader_id: LoaderId,
    #[serde(rename = "parentId")]
    parent_id: Option<FrameId>,
}

fn insert_frame_tree(state: &mut TrackerState, node: &FrameTreeNode, parent: Option<FrameId>) {
    let is_main = parent.is_none();
    state.frames.insert(
        node.frame.id.clone(),
        FrameInfo {
            loader_id: node.frame.loader_id.clone(),
            parent_frame_id: parent,
        },
    );
    if is_main {
        state.main_frame_id = Some(node.frame.id.clone());
    }
    for child in &node.child_frames {
        insert_frame_tree(state, child, Some(node.frame.id.clone()));
    }
}
