//! This module allows integrating analysis results across processed events

use crate::{
    agreement::TriggerAgreementTracker,
    book::{EfficiencyCurves, HistogramsBook},
    config::Configuration,
    cutflow::{CutStage, Cutflow},
    histogram::{Axis, Histogram2D},
    threshold::ThresholdScan,
};

/// Accumulated results of a batch of events
///
/// Nothing in here depends on the order in which events were processed,
/// except for the list of disagreements, so results of consecutive batches
/// can be merged in batch order to get the results of the whole run.
///
#[derive(Clone, Debug)]
pub struct AnalysisResults {
    /// Number of processed events
    pub events: usize,

    /// Number of events compared by the agreement stage
    pub agreement_events: usize,

    /// Survivors of each acceptance cut
    pub cutflow: Cutflow,

    /// Level-1 tau cluster energy threshold scan
    pub l1_scan: ThresholdScan,

    /// Offline tau pt threshold scan
    pub off_scan: ThresholdScan,

    /// Leading vs subleading Level-1 tau cluster energy
    pub map_l1taus: Histogram2D,

    /// Kinematics of accepted events
    pub book: HistogramsBook,

    /// Trigger efficiency curves on accepted events
    pub efficiencies: Vec<EfficiencyCurves>,

    /// Recorded vs emulated trigger decisions
    pub agreement: TriggerAgreementTracker,
}
//
impl AnalysisResults {
    /// Prepare for results integration
    pub fn new(cfg: &Configuration) -> Self {
        let l1_energy = || Axis::uniform(100, 0., 100000.);
        Self {
            events: 0,
            agreement_events: 0,
            cutflow: Cutflow::new(|stage| match stage {
                CutStage::TruthMatching => cfg.stages.truth_matching,
                CutStage::DetaJets => cfg.stages.vbf_selection,
                _ => true,
            }),
            l1_scan: ThresholdScan::new("l1", "TAU", cfg.l1_grid),
            off_scan: ThresholdScan::new("off", "tau", cfg.off_grid),
            map_l1taus: Histogram2D::new("map_l1taus", l1_energy(), l1_energy()),
            book: HistogramsBook::new(),
            efficiencies: cfg
                .agreement
                .efficiency_chains
                .iter()
                .map(|chain| EfficiencyCurves::new(chain))
                .collect(),
            agreement: TriggerAgreementTracker::new(&cfg.agreement.chains),
        }
    }

    /// Merge these results with those of a later batch of events
    pub fn merge(&mut self, other: Self) {
        self.events += other.events;
        self.agreement_events += other.agreement_events;
        self.cutflow.merge(&other.cutflow);
        self.l1_scan.merge(&other.l1_scan);
        self.off_scan.merge(&other.off_scan);
        self.map_l1taus.merge(&other.map_l1taus);
        self.book.merge(&other.book);
        assert_eq!(
            self.efficiencies.len(),
            other.efficiencies.len(),
            "Cannot merge results of different configurations"
        );
        for (curves, other_curves) in self.efficiencies.iter_mut().zip(&other.efficiencies) {
            curves.merge(other_curves);
        }
        self.agreement.merge(&other.agreement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_follows_the_configuration() {
        let mut cfg = Configuration::default();
        cfg.stages.truth_matching = false;
        cfg.stages.vbf_selection = true;
        cfg.agreement.chains = vec!["L1_TAU12".to_owned()];
        cfg.agreement.efficiency_chains = vec!["L1_TAU12".to_owned(), "L1_TAU60".to_owned()];
        let results = AnalysisResults::new(&cfg);
        assert!(!results.cutflow.is_active(CutStage::TruthMatching));
        assert!(results.cutflow.is_active(CutStage::DetaJets));
        assert_eq!(results.efficiencies.len(), 2);
        assert_eq!(results.agreement.chains().len(), 1);
        assert_eq!(
            results.l1_scan.symmetric().labels().len(),
            cfg.l1_grid.step_count
        );
    }

    #[test]
    fn merge_sums_counters() {
        let cfg = Configuration::default();
        let mut first = AnalysisResults::new(&cfg);
        first.events = 3;
        first.cutflow.begin_event();
        first.map_l1taus.fill(30000., 20000., 1.);
        let mut second = AnalysisResults::new(&cfg);
        second.events = 2;
        second.cutflow.begin_event();
        second.cutflow.pass(CutStage::Taus);
        first.merge(second);
        assert_eq!(first.events, 5);
        assert_eq!(first.cutflow.count(CutStage::Init), Some(2.));
        assert_eq!(first.cutflow.count(CutStage::Taus), Some(1.));
        assert_eq!(first.map_l1taus.entries(), 1.);
    }
}
