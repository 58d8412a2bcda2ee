//! Multi-threaded back-end of the analysis

use crate::{results::AnalysisResults, scheduling, store::EventRecord};
use eyre::eyre;
use std::sync::Mutex;

/// Analyze events in multi-threaded mode
///
/// Every batch is analyzed by its own task, but results are merged in batch
/// order, so the output does not depend on the order in which tasks finish.
///
pub fn run_analysis_impl(
    events: &[EventRecord],
    analyze_batch: impl Send + Sync + Fn(usize, &[EventRecord]) -> eyre::Result<AnalysisResults>,
) -> eyre::Result<AnalysisResults> {
    let batches: Vec<_> = scheduling::batches(events).collect();
    let accumulator = ReproducibleAccumulator::new(batches.len());

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        for (batch_id, &(first_entry, batch)) in batches.iter().enumerate() {
            let accumulator_ref = &accumulator;
            let analyze_batch_ref = &analyze_batch;
            scope.spawn(move |_| {
                let result = analyze_batch_ref(first_entry, batch);
                accumulator_ref.set_task_result(batch_id, result);
            });
        }
    });

    accumulator.get_merged_result()
}

/// Reproducibility-optimized results accumulation mechanism
struct ReproducibleAccumulator {
    /// Storage for the intermediary results of parallel tasks
    results: Box<[Mutex<Option<eyre::Result<AnalysisResults>>>]>,
}
//
impl ReproducibleAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Record the results of the n-th analysis task
    fn set_task_result(&self, task_id: usize, result: eyre::Result<AnalysisResults>) {
        // A poisoned slot can only come from a task which panicked, and the
        // panic is propagated by the enclosing scope anyway
        let mut lock = self.results[task_id]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Aggregate the results in batch order, stopping at the first failure
    fn get_merged_result(self) -> eyre::Result<AnalysisResults> {
        let mut results_iter = self.results.into_vec().into_iter().map(|entry| {
            entry
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .ok_or_else(|| eyre!("An analysis task did not report its results"))?
        });

        // Initialize results storage with the result of the first task
        let first_result = results_iter
            .next()
            .ok_or_else(|| eyre!("There should be at least one task"))??;

        // Merge the results of the other tasks
        results_iter.try_fold(first_result, |mut r1, r2| {
            r1.merge(r2?);
            Ok::<_, eyre::Report>(r1)
        })
    }
}
