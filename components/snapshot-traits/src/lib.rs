/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Shared data model and external-transport trait for the page perception
//! pipeline. This crate has no I/O and no knowledge of CDP wire framing
//! beyond the tagged-variant boundary in [`cdp`]; `snapshot-core` does the
//! actual extraction, compilation, diffing, and rendering.

pub mod cdp;
pub mod diff;
pub mod error;
pub mod factpack;
pub mod ids;
pub mod node;
pub mod observation;
pub mod snapshot;

pub use cdp::{CdpEvent, CdpTransport};
pub use diff::{Diff, DiffResponse};
pub use error::{CaptureError, ElementError, QueryError, SessionError, ValidationError};
pub use factpack::FactPack;
pub use ids::{BackendNodeId, Eid, FrameId, LoaderId, NodeId, ScopedElementRef, SnapshotId};
pub use node::{NodeKind, ReadableNode, Region};
pub use observation::{DomObservation, ObservationBatch};
pub use snapshot::{BaseSnapshot, PageAtoms, Viewport};
