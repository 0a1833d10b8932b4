//! MIDI-note histogram and contiguous clustering
//!
//! Every voiced frame adds one count and its RMS energy to the bin of its
//! nearest MIDI note. Sparse bins (at most 1% of voiced frames) are dropped,
//! the rest are grouped into runs whose neighbours are at most 3 semitones
//! apart, and the run with the largest total count is taken as the voice.
//! Isolated notes from other instruments end up in small runs and are
//! discarded.

use std::collections::BTreeMap;

/// Fraction of voiced frames a bin must exceed to be kept
pub const MIN_BIN_FRACTION: f64 = 0.01;

/// Largest semitone gap between neighbours of one cluster
pub const MAX_CLUSTER_GAP: i32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Bin {
    count: u32,
    energy: f64,
}

/// Count and energy per MIDI note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MidiHistogram {
    bins: BTreeMap<i32, Bin>,
    total: usize,
}

/// A contiguous run of MIDI bins
#[derive(Debug, Clone, PartialEq)]
pub struct MidiCluster {
    /// (midi, count, energy) per member, ascending
    pub members: Vec<(i32, u32, f64)>,
}

impl MidiCluster {
    /// Sum of member counts
    pub fn total_count(&self) -> u64 {
        self.members.iter().map(|&(_, c, _)| c as u64).sum()
    }

    /// Lowest member
    pub fn low(&self) -> Option<i32> {
        self.members.first().map(|&(m, _, _)| m)
    }

    /// Highest member
    pub fn high(&self) -> Option<i32> {
        self.members.last().map(|&(m, _, _)| m)
    }

    /// Count-weighted mean MIDI
    pub fn tessitura(&self) -> Option<f64> {
        let total = self.total_count();
        if total == 0 {
            return None;
        }
        let weighted: f64 = self.members.iter().map(|&(m, c, _)| m as f64 * c as f64).sum();
        Some(weighted / total as f64)
    }

    /// Lowest and highest member after dropping low-energy tails
    ///
    /// Members at either edge whose energy is below `ratio` times the largest
    /// member energy are skipped. A ratio of zero keeps the full extent.
    pub fn trimmed_extent(&self, ratio: f64) -> Option<(i32, i32)> {
        let (low, high) = (self.low()?, self.high()?);
        if ratio <= 0.0 {
            return Some((low, high));
        }
        let peak = self.members.iter().map(|&(_, _, e)| e).fold(0.0f64, f64::max);
        let floor = peak * ratio;
        let strong = |&&(_, _, e): &&(i32, u32, f64)| e >= floor;

        let first = self.members.iter().find(strong).map(|&(m, _, _)| m)?;
        let last = self.members.iter().rev().find(strong).map(|&(m, _, _)| m)?;
        Some((first, last))
    }
}

impl MidiHistogram {
    /// Empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one voiced frame
    pub fn add(&mut self, midi: i32, energy: f32) {
        let bin = self.bins.entry(midi).or_default();
        bin.count += 1;
        bin.energy += energy as f64;
        self.total += 1;
    }

    /// Number of voiced frames recorded
    pub fn voiced_frames(&self) -> usize {
        self.total
    }

    /// Count of a single note
    pub fn count(&self, midi: i32) -> u32 {
        self.bins.get(&midi).map_or(0, |b| b.count)
    }

    /// Contiguous clusters of the bins above the noise floor, ascending by pitch
    pub fn clusters(&self) -> Vec<MidiCluster> {
        let floor = self.total as f64 * MIN_BIN_FRACTION;
        let mut clusters: Vec<MidiCluster> = Vec::new();
        let mut previous: Option<i32> = None;

        for (&midi, bin) in self.bins.iter().filter(|(_, b)| b.count as f64 > floor) {
            let member = (midi, bin.count, bin.energy);
            match (previous, clusters.last_mut()) {
                (Some(p), Some(current)) if midi - p <= MAX_CLUSTER_GAP => current.members.push(member),
                _ => clusters.push(MidiCluster { members: vec![member] }),
            }
            previous = Some(midi);
        }
        clusters
    }

    /// Cluster with the largest total count (the lowest one on ties)
    pub fn dominant_cluster(&self) -> Option<MidiCluster> {
        let mut best: Option<MidiCluster> = None;
        for cluster in self.clusters() {
            let better = best
                .as_ref()
                .map_or(true, |b| cluster.total_count() > b.total_count());
            if better {
                best = Some(cluster);
            }
        }
        best
    }

    /// Forget all observations
    pub fn reset(&mut self) {
        self.bins.clear();
        self.total = 0;
    }
}
