/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Capture, compilation, diffing, and rendering engine for the page
//! perception pipeline. `snapshot_traits` defines the data model and the
//! `CdpTransport` seam; this crate does the actual CDP round-tripping and
//! turns raw DOM/AX trees into `ReadableNode`s, `FactPack`s, and XML.

pub mod compiler;
pub mod config;
pub mod diff_engine;
pub mod extractors;
pub mod factpack;
pub mod frame_tracker;
pub mod handler_registry;
pub mod identity;
pub mod observation;
pub mod query;
pub mod render;
pub mod session;
pub mod state;

pub use compiler::capture;
pub use config::Config;
pub use diff_engine::diff;
pub use frame_tracker::FrameTracker;
pub use observation::ObservationAccumulator;
pub use query::{Query, StateFilter};
pub use render::{apply_budget, render_sections, Budget};
pub use session::CdpSession;
pub use state::{PageHealth, PageState};
