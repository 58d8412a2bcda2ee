//! Named-bin and regular-bin counters filled by the analysis
//!
//! All histograms can be merged by per-bin summation, which is what allows
//! the event loop to be split into independently processed batches.

use crate::numeric::Float;
use nalgebra::DMatrix;
use serde::{ser::SerializeStruct, Serialize, Serializer};

/// One-dimensional histogram with one named bin per label
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabeledHistogram {
    name: String,
    labels: Vec<String>,
    counts: Vec<f64>,
}
//
impl LabeledHistogram {
    /// Book a histogram with the given bin labels, in order
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        let counts = vec![0.; labels.len()];
        Self {
            name: name.into(),
            labels,
            counts,
        }
    }

    /// Name of the histogram
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bin labels, in declaration order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Bin contents, in declaration order
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Content of the bin with a given label, if it exists
    pub fn count(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| self.counts[idx])
    }

    /// Add a weight to the bin at a given position
    pub fn fill_index(&mut self, idx: usize, weight: f64) {
        self.counts[idx] += weight;
    }

    /// Sum the contents of another histogram with the same binning
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.labels, other.labels, "Cannot merge different binnings");
        for (acc, &count) in self.counts.iter_mut().zip(&other.counts) {
            *acc += count;
        }
    }
}

/// Two-dimensional histogram with named bins on both axes
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledHistogram2D {
    name: String,
    x_labels: Vec<String>,
    y_labels: Vec<String>,
    /// Rows are x bins, columns are y bins
    counts: DMatrix<f64>,
}
//
impl LabeledHistogram2D {
    /// Book a histogram with the given axis labels
    pub fn new(name: impl Into<String>, x_labels: Vec<String>, y_labels: Vec<String>) -> Self {
        let counts = DMatrix::zeros(x_labels.len(), y_labels.len());
        Self {
            name: name.into(),
            x_labels,
            y_labels,
            counts,
        }
    }

    /// Name of the histogram
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content of the bin at the given labels, if it exists
    pub fn count(&self, x_label: &str, y_label: &str) -> Option<f64> {
        let x = self.x_labels.iter().position(|l| l == x_label)?;
        let y = self.y_labels.iter().position(|l| l == y_label)?;
        Some(self.counts[(x, y)])
    }

    /// Content of the bin at the given positions
    pub fn count_at(&self, x: usize, y: usize) -> f64 {
        self.counts[(x, y)]
    }

    /// Add a weight to the bin at the given positions
    pub fn fill_index(&mut self, x: usize, y: usize, weight: f64) {
        self.counts[(x, y)] += weight;
    }

    /// Number of bins with a non-zero content
    pub fn populated_bins(&self) -> usize {
        self.counts.iter().filter(|&&count| count != 0.).count()
    }

    /// Sum the contents of another histogram with the same binning
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.x_labels, other.x_labels, "Cannot merge different binnings");
        assert_eq!(self.y_labels, other.y_labels, "Cannot merge different binnings");
        self.counts += &other.counts;
    }
}
//
impl Serialize for LabeledHistogram2D {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LabeledHistogram2D", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("x_labels", &self.x_labels)?;
        state.serialize_field("y_labels", &self.y_labels)?;
        state.serialize_field("counts", &matrix_rows(&self.counts))?;
        state.end()
    }
}

/// Binning of a regular histogram axis, with underflow and overflow bins
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Axis {
    /// Bin edges, in increasing order
    edges: Vec<Float>,
}
//
impl Axis {
    /// Axis with `num_bins` bins of equal width between `low` and `high`
    pub fn uniform(num_bins: usize, low: Float, high: Float) -> Self {
        assert!(num_bins > 0 && high > low, "Invalid axis binning");
        let width = (high - low) / num_bins as Float;
        let edges = (0..=num_bins).map(|i| low + width * i as Float).collect();
        Self { edges }
    }

    /// Axis with arbitrary bin edges
    pub fn with_edges(edges: &[Float]) -> Self {
        assert!(
            edges.len() > 1 && edges.windows(2).all(|w| w[0] < w[1]),
            "Bin edges must be increasing"
        );
        Self {
            edges: edges.to_vec(),
        }
    }

    /// Number of bins, excluding underflow and overflow
    pub fn num_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Storage index of a value: 0 is underflow, num_bins() + 1 is overflow
    ///
    /// Bins include their lower edge. NaN lands in the underflow bin.
    ///
    pub fn index(&self, x: Float) -> usize {
        self.edges.partition_point(|&edge| edge <= x)
    }
}

/// One-dimensional histogram with regular bins
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram1D {
    name: String,
    axis: Axis,
    /// Includes underflow (first) and overflow (last) bins
    counts: Vec<f64>,
}
//
impl Histogram1D {
    /// Book a histogram along an axis
    pub fn new(name: impl Into<String>, axis: Axis) -> Self {
        let counts = vec![0.; axis.num_bins() + 2];
        Self {
            name: name.into(),
            axis,
            counts,
        }
    }

    /// Name of the histogram
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a weight at some value
    pub fn fill(&mut self, x: Float, weight: f64) {
        let idx = self.axis.index(x);
        self.counts[idx] += weight;
    }

    /// Contents of all bins, including underflow and overflow
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Sum of the contents of all bins, including underflow and overflow
    pub fn entries(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Sum the contents of another histogram with the same binning
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.axis, other.axis, "Cannot merge different binnings");
        for (acc, &count) in self.counts.iter_mut().zip(&other.counts) {
            *acc += count;
        }
    }
}

/// Two-dimensional histogram with regular bins
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram2D {
    name: String,
    x_axis: Axis,
    y_axis: Axis,
    /// Includes underflow and overflow bins along both axes
    counts: DMatrix<f64>,
}
//
impl Histogram2D {
    /// Book a histogram along two axes
    pub fn new(name: impl Into<String>, x_axis: Axis, y_axis: Axis) -> Self {
        let counts = DMatrix::zeros(x_axis.num_bins() + 2, y_axis.num_bins() + 2);
        Self {
            name: name.into(),
            x_axis,
            y_axis,
            counts,
        }
    }

    /// Name of the histogram
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a weight at some coordinates
    pub fn fill(&mut self, x: Float, y: Float, weight: f64) {
        let idx = (self.x_axis.index(x), self.y_axis.index(y));
        self.counts[idx] += weight;
    }

    /// Content of the bin containing some coordinates
    pub fn count_at(&self, x: Float, y: Float) -> f64 {
        self.counts[(self.x_axis.index(x), self.y_axis.index(y))]
    }

    /// Sum of the contents of all bins, including underflow and overflow
    pub fn entries(&self) -> f64 {
        self.counts.sum()
    }

    /// Sum the contents of another histogram with the same binning
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.x_axis, other.x_axis, "Cannot merge different binnings");
        assert_eq!(self.y_axis, other.y_axis, "Cannot merge different binnings");
        self.counts += &other.counts;
    }
}
//
impl Serialize for Histogram2D {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Histogram2D", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("x_axis", &self.x_axis)?;
        state.serialize_field("y_axis", &self.y_axis)?;
        state.serialize_field("counts", &matrix_rows(&self.counts))?;
        state.end()
    }
}

/// Nested row vectors, for serialization
fn matrix_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}
