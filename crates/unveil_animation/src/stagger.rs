//! Staggered reveal timing for sibling lists
//!
//! Siblings revealed together get increasing delays so they cascade in
//! declaration order: child `i` waits `base + i * interval`.

use crate::reveal::{RevealAnimator, RevealConfig};
use unveil_core::{ElementId, StageHandle};

/// Delays for `child_count` siblings, in declaration order
///
/// Returns `[base, base + interval, ..., base + (n - 1) * interval]`,
/// saturating instead of overflowing.
pub fn compute_delays(child_count: usize, base_delay_ms: u64, interval_ms: u64) -> Vec<u64> {
    StaggerGroup::new(base_delay_ms, interval_ms).delays(child_count)
}

/// Direction for stagger ordering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StaggerDirection {
    /// First child first
    #[default]
    Forward,
    /// Last child first
    Reverse,
    /// Middle child first, spreading outward
    FromCenter,
}

/// Delay schedule for a group of sibling reveals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaggerGroup {
    pub base_delay_ms: u64,
    pub interval_ms: u64,
    pub direction: StaggerDirection,
    /// Cap the step index so long lists stop cascading after N items
    pub limit: Option<usize>,
}

impl StaggerGroup {
    pub fn new(base_delay_ms: u64, interval_ms: u64) -> Self {
        Self {
            base_delay_ms,
            interval_ms,
            direction: StaggerDirection::Forward,
            limit: None,
        }
    }

    pub fn reverse(mut self) -> Self {
        self.direction = StaggerDirection::Reverse;
        self
    }

    pub fn from_center(mut self) -> Self {
        self.direction = StaggerDirection::FromCenter;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Delay for the child at `index` in a group of `total`
    pub fn delay_for_index(&self, index: usize, total: usize) -> u64 {
        let step = match self.direction {
            StaggerDirection::Forward => index,
            StaggerDirection::Reverse => total.saturating_sub(1).saturating_sub(index),
            StaggerDirection::FromCenter => index.abs_diff(total / 2),
        };
        let step = self.limit.map_or(step, |limit| step.min(limit));

        let step = u64::try_from(step).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_add(self.interval_ms.saturating_mul(step))
    }

    pub fn delays(&self, count: usize) -> Vec<u64> {
        (0..count).map(|i| self.delay_for_index(i, count)).collect()
    }

    /// Wrap each target in a reveal animator with its staggered delay
    ///
    /// Every other setting comes from `config`; its own delay is replaced.
    pub fn reveal_children(
        &self,
        stage: &StageHandle,
        targets: &[Option<ElementId>],
        config: RevealConfig,
    ) -> Vec<RevealAnimator> {
        let delays = self.delays(targets.len());
        tracing::trace!(count = targets.len(), ?delays, "staggering reveals");

        targets
            .iter()
            .zip(delays)
            .map(|(target, delay)| RevealAnimator::with_config(stage, *target, config.delay(delay)))
            .collect()
    }
}
