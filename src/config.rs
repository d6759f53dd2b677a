//! Controller configuration.

use std::time::Duration;

use chrono::Datelike;

use crate::session::{EARLIEST_EVENT_YEAR, YearBounds};
use crate::types::FlowchartKey;

/// Policy knobs for the reconciliation controller.
///
/// Defaults mirror the deployed behavior: a 1000 ms debounce for
/// whole-graph saves, 500 ms for in-place draft autosave, event years from
/// 1878 up to the current year, and no flush on teardown (an editor who
/// navigates away inside the debounce window loses that last edit unless
/// `flush_on_teardown` is opted into).
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Document identifier the gateway and live channel are scoped to.
    pub key: FlowchartKey,
    /// Quiet period before a whole-graph save fires.
    pub graph_debounce: Duration,
    /// Quiet period before an in-progress draft auto-commits and saves.
    pub label_debounce: Duration,
    /// Inclusive lower bound for event years.
    pub year_min: i32,
    /// Inclusive upper bound for event years.
    pub year_max: i32,
    /// Save a dirty editor document once during shutdown.
    pub flush_on_teardown: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            key: FlowchartKey::default(),
            graph_debounce: Duration::from_millis(1000),
            label_debounce: Duration::from_millis(500),
            year_min: EARLIEST_EVENT_YEAR,
            year_max: chrono::Utc::now().year(),
            flush_on_teardown: false,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn new(key: FlowchartKey) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_graph_debounce(mut self, window: Duration) -> Self {
        self.graph_debounce = window;
        self
    }

    #[must_use]
    pub fn with_label_debounce(mut self, window: Duration) -> Self {
        self.label_debounce = window;
        self
    }

    #[must_use]
    pub fn with_year_max(mut self, year_max: i32) -> Self {
        self.year_max = year_max;
        self
    }

    #[must_use]
    pub fn with_flush_on_teardown(mut self, flush: bool) -> Self {
        self.flush_on_teardown = flush;
        self
    }

    #[must_use]
    pub fn year_bounds(&self) -> YearBounds {
        YearBounds::new(self.year_min, self.year_max)
    }
}
