//! Scan of symmetric and asymmetric di-object trigger thresholds
//!
//! Given the leading and subleading values of some energy-like observable,
//! the scan counts which candidate di-object thresholds the event would have
//! passed. Two maps are filled:
//!
//! - The symmetric map has one bin per threshold T, counting events where
//!   both objects are above T.
//! - The asymmetric map has one bin per (leading threshold, subleading
//!   threshold) pair with leading >= subleading, counting events where each
//!   object is above its own threshold. Its x axis is the leading threshold
//!   and its y axis the subleading one. The diagonal is included.

use crate::{
    histogram::{LabeledHistogram, LabeledHistogram2D},
    numeric::{Float, MEV_PER_GEV},
};

/// Regularly spaced thresholds, in MeV
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdGrid {
    pub minimum: Float,
    pub step: Float,
    pub step_count: usize,
}
//
impl ThresholdGrid {
    /// Value of the i-th threshold
    pub fn threshold(&self, i: usize) -> Float {
        self.minimum + self.step * i as Float
    }

    /// Integer GeV label of the i-th threshold
    pub fn label_gev(&self, i: usize) -> i64 {
        (self.threshold(i) / MEV_PER_GEV) as i64
    }
}

/// Threshold scan accumulator
#[derive(Clone, Debug)]
pub struct ThresholdScan {
    grid: ThresholdGrid,
    symmetric: LabeledHistogram,
    asymmetric: LabeledHistogram2D,
}
//
impl ThresholdScan {
    /// Book the maps of a scan
    ///
    /// `prefix` names the histograms (`<prefix>_symmetric` and
    /// `<prefix>_asymmetric`), `object` is the label stem of one threshold,
    /// e.g. "TAU" gives the labels "2TAU12" and "TAU12".
    ///
    pub fn new(prefix: &str, object: &str, grid: ThresholdGrid) -> Self {
        let single_labels: Vec<String> = (0..grid.step_count)
            .map(|i| format!("{object}{}", grid.label_gev(i)))
            .collect();
        let symmetric_labels = single_labels.iter().map(|label| format!("2{label}")).collect();
        Self {
            grid,
            symmetric: LabeledHistogram::new(format!("{prefix}_symmetric"), symmetric_labels),
            asymmetric: LabeledHistogram2D::new(
                format!("{prefix}_asymmetric"),
                single_labels.clone(),
                single_labels,
            ),
        }
    }

    /// Integrate one event
    pub fn scan(&mut self, leading: Float, subleading: Float) {
        let grid = &self.grid;
        for i in 0..grid.step_count {
            let thresh_sublead = grid.threshold(i);
            if leading >= thresh_sublead && subleading >= thresh_sublead {
                self.symmetric.fill_index(i, 1.);
            }
            // The leading threshold is never below the subleading one
            for j in i..grid.step_count {
                let thresh_lead = grid.threshold(j);
                if subleading >= thresh_sublead && leading >= thresh_lead {
                    self.asymmetric.fill_index(j, i, 1.);
                }
            }
        }
    }

    /// Symmetric map
    pub fn symmetric(&self) -> &LabeledHistogram {
        &self.symmetric
    }

    /// Asymmetric map (x: leading threshold, y: subleading threshold)
    pub fn asymmetric(&self) -> &LabeledHistogram2D {
        &self.asymmetric
    }

    /// Sum the maps of another scan over the same grid
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.grid, other.grid, "Cannot merge scans of different grids");
        self.symmetric.merge(&other.symmetric);
        self.asymmetric.merge(&other.asymmetric);
    }
}
