/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Tunable defaults collected in one place (SPEC_FULL.md §2), mirroring how
//! the pack's CDP adapters (`other_examples/.../cdp-adapter/src/config.rs`)
//! centralize their numeric knobs instead of scattering named constants
//! through the modules that use them.

use std::time::Duration;

/// Tunables for the Snapshot Compiler, FactPack extractors, and Observation
/// Accumulator. Construct with [`Config::default`] and override only the
/// fields that differ; every default below is named in spec.md.
#[derive(Clone, Debug)]
pub struct Config {
    /// Spec §4.4 step 3: stop adding candidate nodes once this many have
    /// been accepted into a snapshot.
    pub max_nodes: usize,
    /// Spec §4.1: default CDP command timeout.
    pub command_timeout: Duration,
    /// Spec §4.4 "Failure semantics" / §5 "Cancellation and timeouts":
    /// overall snapshot capture deadline.
    pub capture_timeout: Duration,
    /// Spec §4.3 Accessibility extractor: bound on concurrent per-frame
    /// `Accessibility.getFullAXTree` fan-out.
    pub ax_fanout_limit: usize,
    /// Spec §4.2: FrameTracker.issuedRefs eviction threshold.
    pub max_issued_refs: usize,
    /// Spec §4.2: number of oldest entries evicted once `max_issued_refs`
    /// is reached.
    pub ref_eviction_batch: usize,
    /// Spec §4.6 Action selector: drop scored actions below this.
    pub min_action_score: f64,
    /// Spec §4.6 Action selector: keep at most this many actions.
    pub max_actions: usize,
    /// Spec §4.8: only surface observations at or above this significance.
    pub min_observation_significance: u8,
    /// Spec §4.8: bound on total retained observation entries per page.
    pub max_retained_observations: usize,
    /// Spec §5: per-trigger observation bound for the dependency tracker.
    pub max_observations_per_trigger: usize,
    /// Spec §4.8: re-injection staleness window — how long an injected
    /// accumulator is trusted without a liveness check.
    pub observer_appear_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_nodes: 2_000,
            command_timeout: Duration::from_secs(30),
            capture_timeout: Duration::from_secs(30),
            ax_fanout_limit: 8,
            max_issued_refs: 10_000,
            ref_eviction_batch: 1_000,
            min_action_score: 0.2,
            max_actions: 12,
            min_observation_significance: 4,
            max_retained_observations: 500,
            max_observations_per_trigger: 10,
            observer_appear_delay: Duration::from_millis(250),
        }
    }
}
