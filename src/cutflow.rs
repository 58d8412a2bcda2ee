//! Sequential cut bookkeeping

use crate::histogram::LabeledHistogram;

/// Selection stages, in the order in which they are applied
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum CutStage {
    Init,
    Taus,
    TausPt,
    DrTauTau,
    TruthMatching,
    Jets,
    JetsPt,
    DetaJets,
    L1Taus,
}
//
impl CutStage {
    /// Every stage, in application order
    pub const ALL: [CutStage; 9] = [
        CutStage::Init,
        CutStage::Taus,
        CutStage::TausPt,
        CutStage::DrTauTau,
        CutStage::TruthMatching,
        CutStage::Jets,
        CutStage::JetsPt,
        CutStage::DetaJets,
        CutStage::L1Taus,
    ];

    /// Bin label of the stage
    pub fn label(self) -> &'static str {
        match self {
            CutStage::Init => "init",
            CutStage::Taus => "taus",
            CutStage::TausPt => "taus_pt",
            CutStage::DrTauTau => "dr_tau_tau",
            CutStage::TruthMatching => "truth_matching",
            CutStage::Jets => "jets",
            CutStage::JetsPt => "jets_pt",
            CutStage::DetaJets => "deta_jets",
            CutStage::L1Taus => "l1taus",
        }
    }
}

/// Number of events surviving each selection stage
///
/// Each stage is counted at most once per event, and only after every
/// previously declared stage was counted for the same event, so counts never
/// increase along the declared sequence.
///
#[derive(Clone, Debug)]
pub struct Cutflow {
    stages: Vec<CutStage>,
    hist: LabeledHistogram,
    /// Position of the last stage passed by the current event
    cursor: Option<usize>,
}
//
impl Cutflow {
    /// Declare the active stages. Init is always the first one.
    pub fn new(active: impl Fn(CutStage) -> bool) -> Self {
        let stages: Vec<_> = CutStage::ALL
            .into_iter()
            .filter(|&stage| stage == CutStage::Init || active(stage))
            .collect();
        let labels = stages.iter().map(|stage| stage.label().to_owned()).collect();
        Self {
            stages,
            hist: LabeledHistogram::new("cutflow", labels),
            cursor: None,
        }
    }

    /// Start a new event, counting it in the init bin
    pub fn begin_event(&mut self) {
        self.cursor = None;
        self.pass(CutStage::Init);
    }

    /// Count the current event as surviving a stage
    pub fn pass(&mut self, stage: CutStage) {
        let position = self
            .stages
            .iter()
            .position(|&s| s == stage)
            .unwrap_or_else(|| panic!("Stage {stage:?} is not part of the cutflow"));
        let expected = self.cursor.map_or(0, |cursor| cursor + 1);
        assert_eq!(
            position, expected,
            "Stage {stage:?} was passed out of order"
        );
        self.hist.fill_index(position, 1.);
        self.cursor = Some(position);
    }

    /// Truth that a stage is part of the declared sequence
    pub fn is_active(&self, stage: CutStage) -> bool {
        self.stages.contains(&stage)
    }

    /// Number of events which survived a stage
    pub fn count(&self, stage: CutStage) -> Option<f64> {
        self.hist.count(stage.label())
    }

    /// Underlying histogram
    pub fn histogram(&self) -> &LabeledHistogram {
        &self.hist
    }

    /// Sum the counts of another cutflow with the same stages
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.stages, other.stages, "Cannot merge different cutflows");
        self.hist.merge(&other.hist);
    }
}
