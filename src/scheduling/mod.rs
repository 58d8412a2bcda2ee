//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads

#[cfg(not(feature = "multi-threading"))] mod sequential;
#[cfg(feature = "multi-threading")] mod multi_threading;

use crate::{results::AnalysisResults, store::EventRecord};


/// Size of the analyzed event batches
///
/// Events are grouped in batches of a certain size, and the results of each
/// batch are merged in batch order. This makes sequential and parallel runs
/// produce identical results, including the order of reported disagreements.
///
const EVENT_BATCH_SIZE: usize = 1_000;


/// Split a run into batches of consecutive events
///
/// Yields the entry number of the first event of each batch along with the
/// batch itself. There is always at least one batch, which may be empty.
///
fn batches(events: &[EventRecord]) -> impl Iterator<Item = (usize, &[EventRecord])> {
    let empty_run = events.is_empty().then_some((0, events));
    events
        .chunks(EVENT_BATCH_SIZE)
        .enumerate()
        .map(|(batch_id, batch)| (batch_id * EVENT_BATCH_SIZE, batch))
        .chain(empty_run)
}


/// Run the analysis in the manner that was configured at build time.
///
/// Takes as parameters the events of the run, and an analysis kernel that
/// turns a batch of events into results given the entry number of its first
/// event.
///
/// Returns the results of the whole run, or the first error in entry order.
///
pub fn run_analysis(
    events: &[EventRecord],
    analyze_batch: impl Send
                        + Sync
                        + Fn(usize, &[EventRecord]) -> eyre::Result<AnalysisResults>,
) -> eyre::Result<AnalysisResults> {
    // ...in sequential mode
    #[cfg(not(feature = "multi-threading"))]
    { sequential::run_analysis_impl(events, analyze_batch) }

    // ...in multi-threaded mode
    #[cfg(feature = "multi-threading")]
    { multi_threading::run_analysis_impl(events, analyze_batch) }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    /// Kernel which only counts the events that it sees
    fn count_events(first_entry: usize, batch: &[EventRecord]) -> eyre::Result<AnalysisResults> {
        assert_eq!(first_entry % EVENT_BATCH_SIZE, 0);
        let mut results = AnalysisResults::new(&Configuration::default());
        results.events = batch.len();
        Ok(results)
    }

    #[test]
    fn batches_cover_every_event() {
        let events = vec![EventRecord::default(); 2 * EVENT_BATCH_SIZE + 3];
        let sizes: Vec<(usize, usize)> = batches(&events)
            .map(|(first, batch)| (first, batch.len()))
            .collect();
        assert_eq!(
            sizes,
            [
                (0, EVENT_BATCH_SIZE),
                (EVENT_BATCH_SIZE, EVENT_BATCH_SIZE),
                (2 * EVENT_BATCH_SIZE, 3)
            ]
        );
        assert_eq!(run_analysis(&events, count_events).unwrap().events, events.len());
    }

    #[test]
    fn empty_runs_still_produce_results() {
        assert_eq!(batches(&[]).count(), 1);
        assert_eq!(run_analysis(&[], count_events).unwrap().events, 0);
    }

    #[test]
    fn first_failing_batch_is_reported() {
        let events = vec![EventRecord::default(); 3 * EVENT_BATCH_SIZE];
        let err = run_analysis(&events, |first_entry, batch| {
            eyre::ensure!(first_entry == 0, "Batch at entry {first_entry} failed");
            count_events(first_entry, batch)
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Batch at entry {EVENT_BATCH_SIZE} failed")
        );
    }
}
