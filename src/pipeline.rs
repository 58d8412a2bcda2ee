//! Per-event orchestration of selection, cuts and result accumulation
//!
//! Each event goes through the same sequence of states. Every gate that an
//! event passes is counted in the cutflow, and the first gate that it fails
//! ends its processing without touching any other accumulator:
//!
//! ```text
//! AwaitingInputs -> ObjectsSelected -> PrimaryPairChosen
//!     -> GeometricallyConsistent -> [TruthMatched] -> JetsSelected
//!     -> ThresholdsScanned -> Done
//! ```
//!
//! Any state may instead lead to `Rejected`. The agreement stage, when
//! active, compares trigger decisions before the acceptance stage runs and
//! is not affected by its cuts.

use crate::{
    agreement,
    config::Configuration,
    cutflow::CutStage,
    error::AnalysisError,
    objects::{
        EmTauRoI, EnergySumRoI, EventInfo, Jet, JetRoI, Kinematics, MuonRoI, TauJet, TruthTau,
    },
    results::AnalysisResults,
    selection::{self, JetSelection, TauSelection},
    store::EventRecord,
    trigger::{DecisionOracle, EmulationInputs, TrigEmulator},
    truth::TruthMatcher,
};
use eyre::WrapErr;

/// Events between two progress messages
const PROGRESS_PERIOD: usize = 200;

/// Processing state of an event
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PipelineState {
    AwaitingInputs,
    ObjectsSelected,
    PrimaryPairChosen,
    GeometricallyConsistent,
    TruthMatched,
    JetsSelected,
    ThresholdsScanned,
}

/// How the processing of an event ended
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Every active stage ran to completion
    Done,
    /// The event failed the gate of this cutflow stage
    Rejected(CutStage),
}

/// Per-event analysis, built once with every tool that it needs
pub struct EventPipeline<'tools> {
    cfg: &'tools Configuration,
    oracle: &'tools dyn DecisionOracle,
    emulator: Option<&'tools TrigEmulator>,
    tau_selection: TauSelection,
    jet_selection: JetSelection,
    truth_matcher: TruthMatcher,
    /// Total number of events of the run, for progress reports
    num_events: usize,
}
//
impl<'tools> EventPipeline<'tools> {
    /// Set up the pipeline. An emulator is needed by the agreement stage.
    pub fn new(
        cfg: &'tools Configuration,
        oracle: &'tools dyn DecisionOracle,
        emulator: Option<&'tools TrigEmulator>,
        num_events: usize,
    ) -> Self {
        assert_eq!(
            cfg.stages.agreement,
            emulator.is_some(),
            "The agreement stage needs an emulator, and only it does"
        );
        Self {
            cfg,
            oracle,
            emulator,
            tau_selection: TauSelection::default(),
            jet_selection: JetSelection::new(cfg.cuts.jet_eta),
            truth_matcher: TruthMatcher::default(),
            num_events,
        }
    }

    /// Process a batch of consecutive events, the first of which has the
    /// given entry number, into a fresh set of results
    pub fn process_batch(
        &self,
        first_entry: usize,
        events: &[EventRecord],
    ) -> eyre::Result<AnalysisResults> {
        let mut results = AnalysisResults::new(self.cfg);
        for (offset, event) in events.iter().enumerate() {
            let entry = first_entry + offset;
            if entry % PROGRESS_PERIOD == 0 {
                log::info!("Read event number {entry} / {}", self.num_events);
            }
            self.process(entry, event, &mut results)
                .wrap_err_with(|| format!("Failed to process event entry {entry}"))?;
        }
        Ok(results)
    }

    /// Process one event
    pub fn process(
        &self,
        entry: usize,
        event: &EventRecord,
        results: &mut AnalysisResults,
    ) -> Result<Outcome, AnalysisError> {
        transition(entry, PipelineState::AwaitingInputs);
        results.events += 1;
        if self.cfg.stages.agreement {
            self.compare_decisions(entry, event, results)?;
        }
        let outcome = if self.cfg.stages.acceptance {
            self.select_and_scan(entry, event, results)?
        } else {
            Outcome::Done
        };
        match outcome {
            Outcome::Done => log::debug!("Entry {entry}: done"),
            Outcome::Rejected(stage) => {
                log::debug!("Entry {entry}: rejected by the {} cut", stage.label())
            }
        }
        Ok(outcome)
    }

    /// Compare the recorded and emulated decisions of every configured chain
    fn compare_decisions(
        &self,
        entry: usize,
        event: &EventRecord,
        results: &mut AnalysisResults,
    ) -> Result<(), AnalysisError> {
        let Some(emulator) = self.emulator else {
            return Ok(());
        };
        let settings = &self.cfg.agreement;
        let condition = settings.decision_condition;
        if let Some(reference) = &settings.reference_chain {
            if self.oracle.is_passed(event, reference, condition) != Some(true) {
                log::debug!("Entry {entry}: reference chain {reference} did not fire");
                return Ok(());
            }
        }

        let keys = &self.cfg.keys;
        let info = event.retrieve::<EventInfo>(&keys.event_info)?;
        let hlt_taus: &[TauJet] = if emulator.needs_hlt_taus() {
            event.retrieve::<Vec<TauJet>>(&keys.hlt_taus)?.as_slice()
        } else {
            &[]
        };
        let inputs = EmulationInputs {
            l1_taus: event.retrieve::<Vec<EmTauRoI>>(&keys.l1_taus)?,
            l1_jets: event.retrieve::<Vec<JetRoI>>(&keys.l1_jets)?,
            l1_muons: event.retrieve::<Vec<MuonRoI>>(&keys.l1_muons)?,
            l1_energy: event.retrieve::<EnergySumRoI>(&keys.l1_energy)?,
            hlt_taus,
        };
        let decisions = emulator.calculate(&inputs);

        let tracker = &mut results.agreement;
        let first_new = tracker.disagreements().len();
        for chain in &settings.chains {
            let decision = self.oracle.is_passed(event, chain, condition);
            tracker.record(info, chain, decision, decisions.decision(chain));
        }
        results.agreement_events += 1;
        agreement::log_disagreements(info, &tracker.disagreements()[first_new..]);
        Ok(())
    }

    /// Apply the acceptance cuts and, if they all pass, fill the scans
    fn select_and_scan(
        &self,
        entry: usize,
        event: &EventRecord,
        results: &mut AnalysisResults,
    ) -> Result<Outcome, AnalysisError> {
        let keys = &self.cfg.keys;
        let cuts = &self.cfg.cuts;
        let taus = event.retrieve::<Vec<TauJet>>(&keys.taus)?;
        let jets = event.retrieve::<Vec<Jet>>(&keys.jets)?;
        let l1_taus = event.retrieve::<Vec<EmTauRoI>>(&keys.l1_taus)?;
        let truth_taus = if self.cfg.stages.truth_matching {
            Some(event.retrieve::<Vec<TruthTau>>(&keys.truth_taus)?)
        } else {
            None
        };
        results.cutflow.begin_event();

        // At least two selected taus
        let selected_taus = self.tau_selection.select(taus);
        let Some((tau1, tau2)) = selection::leading_pair(&selected_taus) else {
            return Ok(Outcome::Rejected(CutStage::Taus));
        };
        results.cutflow.pass(CutStage::Taus);
        transition(entry, PipelineState::ObjectsSelected);

        if tau1.pt < cuts.tau1_pt || tau2.pt < cuts.tau2_pt {
            return Ok(Outcome::Rejected(CutStage::TausPt));
        }
        results.cutflow.pass(CutStage::TausPt);
        transition(entry, PipelineState::PrimaryPairChosen);

        let dr_tautau = tau1.delta_r(tau2);
        if dr_tautau < cuts.min_dr_tautau || dr_tautau > cuts.max_dr_tautau {
            return Ok(Outcome::Rejected(CutStage::DrTauTau));
        }
        results.cutflow.pass(CutStage::DrTauTau);
        transition(entry, PipelineState::GeometricallyConsistent);

        let (truth1, truth2) = match truth_taus {
            Some(truth_taus) => {
                let truth1 = self.truth_matcher.get_truth(tau1, truth_taus);
                let truth2 = self.truth_matcher.get_truth(tau2, truth_taus);
                if truth1.is_none() || truth2.is_none() {
                    return Ok(Outcome::Rejected(CutStage::TruthMatching));
                }
                results.cutflow.pass(CutStage::TruthMatching);
                transition(entry, PipelineState::TruthMatched);
                (truth1, truth2)
            }
            None => (None, None),
        };

        let selected_jets = self.jet_selection.select(jets, tau1, tau2);
        if selected_jets.len() < cuts.n_jets {
            return Ok(Outcome::Rejected(CutStage::Jets));
        }
        results.cutflow.pass(CutStage::Jets);

        // Jet cuts only apply to the jets that exist
        let jet1 = selected_jets.first();
        let jet2 = selected_jets.get(1);
        if jet1.map_or(false, |jet| jet.pt < cuts.jet1_pt)
            || jet2.map_or(false, |jet| jet.pt < cuts.jet2_pt)
        {
            return Ok(Outcome::Rejected(CutStage::JetsPt));
        }
        results.cutflow.pass(CutStage::JetsPt);

        if results.cutflow.is_active(CutStage::DetaJets) {
            if let (Some(jet1), Some(jet2)) = (jet1, jet2) {
                if (jet1.eta - jet2.eta).abs() < cuts.delta_eta_jj {
                    return Ok(Outcome::Rejected(CutStage::DetaJets));
                }
            }
            results.cutflow.pass(CutStage::DetaJets);
        }
        transition(entry, PipelineState::JetsSelected);

        let selected_l1_taus = selection::select_l1_taus(l1_taus);
        let Some((l1_tau1, l1_tau2)) = selection::leading_pair(&selected_l1_taus) else {
            return Ok(Outcome::Rejected(CutStage::L1Taus));
        };
        results.cutflow.pass(CutStage::L1Taus);

        results.l1_scan.scan(l1_tau1.tau_clus, l1_tau2.tau_clus);
        results.off_scan.scan(tau1.pt, tau2.pt);
        transition(entry, PipelineState::ThresholdsScanned);

        results.map_l1taus.fill(l1_tau1.tau_clus, l1_tau2.tau_clus, 1.);
        results.book.fill_tau(tau1, tau2, 1.);
        results.book.fill_jet(jet1, jet2, 1.);
        results.book.fill_truth(truth1, truth2, 1.);
        let condition = self.cfg.agreement.decision_condition;
        for curves in &mut results.efficiencies {
            let pass = self
                .oracle
                .is_passed(event, curves.chain(), condition)
                .unwrap_or(false);
            curves.fill_hadhad(pass, tau1, tau2, jet1);
        }
        Ok(Outcome::Done)
    }
}

fn transition(entry: usize, state: PipelineState) {
    log::debug!("Entry {entry}: {state:?}");
}
