//! Per-frame aggregation of shape displacement bounds.
//!
//! Any number of shape contributors report how far they may push the surface
//! this frame. Totals reset the first time a report carries a new frame token,
//! so no explicit "begin frame" call is needed and report order is irrelevant.
//!
//! The scale controller reads the totals when it runs, before most
//! contributors of the current frame have reported, so it sees the previous
//! frame's settled bound.

use crate::frame::FrameId;

/// Sum of the displacement bounds reported for one frame.
#[derive(Clone, Debug, Default)]
pub struct DisplacementAggregator {
    frame: Option<FrameId>,
    horizontal: f32,
    vertical: f32,
    reports: u32,
}

impl DisplacementAggregator {
    /// Create an empty aggregator with no frame seen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contributor's worst-case displacement for `frame`.
    ///
    /// Negative or NaN inputs count as zero.
    pub fn report(&mut self, horizontal: f32, vertical: f32, frame: FrameId) {
        if self.frame != Some(frame) {
            self.frame = Some(frame);
            self.horizontal = 0.0;
            self.vertical = 0.0;
            self.reports = 0;
        }
        self.horizontal += sanitize(horizontal);
        self.vertical += sanitize(vertical);
        self.reports += 1;
    }

    /// Running horizontal total.
    pub fn current_horizontal(&self) -> f32 {
        self.horizontal
    }

    /// Running vertical total.
    pub fn current_vertical(&self) -> f32 {
        self.vertical
    }

    /// Frame the running totals belong to.
    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Number of reports folded into the running totals.
    pub fn report_count(&self) -> u32 {
        self.reports
    }
}

fn sanitize(value: f32) -> f32 {
    // `max` returns the non-NaN operand.
    value.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_in_same_frame_accumulate() {
        let mut agg = DisplacementAggregator::new();
        agg.report(3.0, 4.0, FrameId(1));
        agg.report(1.0, 2.0, FrameId(1));
        assert_eq!(agg.current_horizontal(), 4.0);
        assert_eq!(agg.current_vertical(), 6.0);
        assert_eq!(agg.report_count(), 2);
    }

    #[test]
    fn test_new_frame_resets_before_adding() {
        let mut agg = DisplacementAggregator::new();
        agg.report(3.0, 4.0, FrameId(1));
        agg.report(1.0, 2.0, FrameId(1));
        agg.report(0.5, 0.25, FrameId(2));
        assert_eq!(agg.current_horizontal(), 0.5);
        assert_eq!(agg.current_vertical(), 0.25);
        assert_eq!(agg.frame(), Some(FrameId(2)));
    }

    #[test]
    fn test_any_token_change_resets() {
        // Going "backwards" is still a different token.
        let mut agg = DisplacementAggregator::new();
        agg.report(5.0, 5.0, FrameId(7));
        agg.report(1.0, 1.0, FrameId(3));
        assert_eq!(agg.current_horizontal(), 1.0);
    }

    #[test]
    fn test_order_within_frame_does_not_matter() {
        let reports = [(1.0, 0.5), (2.5, 3.0), (0.0, 1.25), (4.0, 0.0)];

        let mut forward = DisplacementAggregator::new();
        for &(h, v) in &reports {
            forward.report(h, v, FrameId(9));
        }
        let mut backward = DisplacementAggregator::new();
        for &(h, v) in reports.iter().rev() {
            backward.report(h, v, FrameId(9));
        }

        assert_eq!(forward.current_horizontal(), backward.current_horizontal());
        assert_eq!(forward.current_vertical(), backward.current_vertical());
    }

    #[test]
    fn test_negative_and_nan_clamped_to_zero() {
        let mut agg = DisplacementAggregator::new();
        agg.report(-10.0, f32::NAN, FrameId(1));
        agg.report(2.0, 3.0, FrameId(1));
        assert_eq!(agg.current_horizontal(), 2.0);
        assert_eq!(agg.current_vertical(), 3.0);
    }

    #[test]
    fn test_totals_never_decrease_within_frame() {
        let mut agg = DisplacementAggregator::new();
        let mut last = 0.0;
        for i in 0..50 {
            let v = if i % 3 == 0 { -1.0 } else { i as f32 * 0.1 };
            agg.report(0.0, v, FrameId(4));
            assert!(agg.current_vertical() >= last);
            last = agg.current_vertical();
        }
    }

    #[test]
    fn test_empty_aggregator_reads_zero() {
        let agg = DisplacementAggregator::new();
        assert_eq!(agg.current_horizontal(), 0.0);
        assert_eq!(agg.current_vertical(), 0.0);
        assert_eq!(agg.frame(), None);
    }
}
