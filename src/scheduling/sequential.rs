//! Sequential back-end of the analysis

use crate::{results::AnalysisResults, scheduling, store::EventRecord};

/// Analyze events in sequential mode
///
/// We use batched logic even in sequential mode, in order to achieve
/// reproducibility with respect to multi-threaded runs.
///
pub fn run_analysis_impl(
    events: &[EventRecord],
    analyze_batch: impl Fn(usize, &[EventRecord]) -> eyre::Result<AnalysisResults>,
) -> eyre::Result<AnalysisResults> {
    let mut batches = scheduling::batches(events);

    // Initialize the accumulator with the first batch of events
    let Some((first_entry, first_batch)) = batches.next() else {
        unreachable!("There is always at least one batch");
    };
    let mut accumulator = analyze_batch(first_entry, first_batch)?;

    // Integrate the other batches, stopping at the first failure
    for (first_entry, batch) in batches {
        accumulator.merge(analyze_batch(first_entry, batch)?);
    }
    Ok(accumulator)
}
