//! Kinematic distributions and trigger efficiency curves of selected events

use crate::{
    histogram::{Axis, Histogram1D},
    numeric::{floats::consts::PI, Float, MEV_PER_GEV},
    objects::{Jet, Kinematics, TauJet, TruthTau},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Kinematic distributions of the objects of selected events
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistogramsBook {
    hists: BTreeMap<&'static str, Histogram1D>,
}
//
impl HistogramsBook {
    /// Book every distribution
    pub fn new() -> Self {
        let pt = || Axis::uniform(40, 0., 200.);
        let eta = || Axis::uniform(50, -2.5, 2.5);
        let jet_eta = || Axis::uniform(50, -5., 5.);
        let phi = || Axis::uniform(64, -PI, PI);
        let ntracks = || Axis::uniform(6, 0., 6.);
        let hists = [
            ("tau1_pt", pt()),
            ("tau2_pt", pt()),
            ("tau1_eta", eta()),
            ("tau2_eta", eta()),
            ("tau1_phi", phi()),
            ("tau2_phi", phi()),
            ("tau1_ntracks", ntracks()),
            ("tau2_ntracks", ntracks()),
            ("tau_tau_dr", Axis::uniform(40, 0., 4.)),
            ("jet1_pt", Axis::uniform(40, 0., 400.)),
            ("jet2_pt", Axis::uniform(40, 0., 400.)),
            ("jet1_eta", jet_eta()),
            ("jet2_eta", jet_eta()),
            ("jets_delta_eta", Axis::uniform(50, 0., 10.)),
            ("truth_tau1_pt", pt()),
            ("truth_tau2_pt", pt()),
            ("truth_tau1_eta", eta()),
            ("truth_tau2_eta", eta()),
        ]
        .into_iter()
        .map(|(name, axis)| (name, Histogram1D::new(name, axis)))
        .collect();
        Self { hists }
    }

    /// Look up a distribution by name
    pub fn get(&self, name: &str) -> Option<&Histogram1D> {
        self.hists.get(name)
    }

    /// Fill the distributions of the leading tau pair
    pub fn fill_tau(&mut self, tau1: &TauJet, tau2: &TauJet, weight: f64) {
        self.fill("tau1_pt", tau1.pt / MEV_PER_GEV, weight);
        self.fill("tau2_pt", tau2.pt / MEV_PER_GEV, weight);
        self.fill("tau1_eta", tau1.eta, weight);
        self.fill("tau2_eta", tau2.eta, weight);
        self.fill("tau1_phi", tau1.phi, weight);
        self.fill("tau2_phi", tau2.phi, weight);
        self.fill("tau1_ntracks", tau1.n_tracks as Float, weight);
        self.fill("tau2_ntracks", tau2.n_tracks as Float, weight);
        self.fill("tau_tau_dr", tau1.delta_r(tau2), weight);
    }

    /// Fill the distributions of the leading jets, when they exist
    pub fn fill_jet(&mut self, jet1: Option<&Jet>, jet2: Option<&Jet>, weight: f64) {
        if let Some(jet1) = jet1 {
            self.fill("jet1_pt", jet1.pt / MEV_PER_GEV, weight);
            self.fill("jet1_eta", jet1.eta, weight);
        }
        if let Some(jet2) = jet2 {
            self.fill("jet2_pt", jet2.pt / MEV_PER_GEV, weight);
            self.fill("jet2_eta", jet2.eta, weight);
        }
        if let (Some(jet1), Some(jet2)) = (jet1, jet2) {
            self.fill("jets_delta_eta", (jet1.eta - jet2.eta).abs(), weight);
        }
    }

    /// Fill the distributions of the truth taus matched to the leading pair
    pub fn fill_truth(&mut self, truth1: Option<&TruthTau>, truth2: Option<&TruthTau>, weight: f64) {
        for (truth, pt, eta) in [
            (truth1, "truth_tau1_pt", "truth_tau1_eta"),
            (truth2, "truth_tau2_pt", "truth_tau2_eta"),
        ] {
            if let Some(truth) = truth {
                self.fill(pt, truth.pt_vis / MEV_PER_GEV, weight);
                self.fill(eta, truth.eta_vis, weight);
            }
        }
    }

    /// Sum the distributions of another book
    pub fn merge(&mut self, other: &Self) {
        for (name, hist) in &mut self.hists {
            hist.merge(&other.hists[name]);
        }
    }

    fn fill(&mut self, name: &str, x: Float, weight: f64) {
        if let Some(hist) = self.hists.get_mut(name) {
            hist.fill(x, weight);
        }
    }
}
//
impl Default for HistogramsBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Passed and total distributions of an efficiency measurement
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Efficiency {
    passed: Histogram1D,
    total: Histogram1D,
}
//
impl Efficiency {
    fn new(name: String, axis: Axis) -> Self {
        Self {
            passed: Histogram1D::new(format!("{name}_passed"), axis.clone()),
            total: Histogram1D::new(format!("{name}_total"), axis),
        }
    }

    /// Record one event
    pub fn fill(&mut self, pass: bool, x: Float) {
        self.total.fill(x, 1.);
        if pass {
            self.passed.fill(x, 1.);
        }
    }

    /// Events which passed the trigger
    pub fn passed(&self) -> &Histogram1D {
        &self.passed
    }

    /// All recorded events
    pub fn total(&self) -> &Histogram1D {
        &self.total
    }

    fn merge(&mut self, other: &Self) {
        self.passed.merge(&other.passed);
        self.total.merge(&other.total);
    }
}

/// Efficiency curves of one trigger chain versus the kinematics of the
/// selected objects
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EfficiencyCurves {
    chain: String,
    curves: BTreeMap<&'static str, Efficiency>,
}
//
impl EfficiencyCurves {
    /// Book the curves of a chain
    pub fn new(chain: &str) -> Self {
        let lead_eta_edges = [-2.4, -1.52, -1.37, -0.6, 0., 0.6, 1.37, 1.52, 2.4];
        let curves = [
            ("lead_tau_pt", Axis::uniform(16, 20., 100.)),
            ("sublead_tau_pt", Axis::uniform(16, 20., 100.)),
            ("lead_tau_ntracks", Axis::uniform(5, 0., 5.)),
            ("sublead_tau_ntracks", Axis::uniform(5, 0., 5.)),
            ("lead_tau_eta", Axis::with_edges(&lead_eta_edges)),
            ("sublead_tau_eta", Axis::uniform(20, -5., 5.)),
            ("jet_pt", Axis::uniform(8, 20., 100.)),
            ("jet_eta", Axis::uniform(10, -5., 5.)),
            ("delta_r", Axis::uniform(8, 0., 3.2)),
        ]
        .into_iter()
        .map(|(name, axis)| (name, Efficiency::new(format!("{name}_{chain}"), axis)))
        .collect();
        Self {
            chain: chain.to_owned(),
            curves,
        }
    }

    /// Chain which the curves are about
    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// Look up a curve by variable name
    pub fn get(&self, variable: &str) -> Option<&Efficiency> {
        self.curves.get(variable)
    }

    /// Record an event with two selected taus and, possibly, a leading jet
    pub fn fill_hadhad(&mut self, pass: bool, tau1: &TauJet, tau2: &TauJet, jet1: Option<&Jet>) {
        self.fill("lead_tau_pt", pass, tau1.pt / MEV_PER_GEV);
        self.fill("lead_tau_eta", pass, tau1.eta);
        self.fill("lead_tau_ntracks", pass, tau1.n_tracks as Float);
        self.fill("sublead_tau_pt", pass, tau2.pt / MEV_PER_GEV);
        self.fill("sublead_tau_eta", pass, tau2.eta);
        self.fill("sublead_tau_ntracks", pass, tau2.n_tracks as Float);
        if let Some(jet1) = jet1 {
            self.fill("jet_pt", pass, jet1.pt / MEV_PER_GEV);
            self.fill("jet_eta", pass, jet1.eta);
        }
        self.fill("delta_r", pass, tau1.delta_r(tau2));
    }

    /// Sum the curves of another set for the same chain
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.chain, other.chain, "Cannot merge curves of different chains");
        for (name, curve) in &mut self.curves {
            curve.merge(&other.curves[name]);
        }
    }

    fn fill(&mut self, variable: &str, pass: bool, x: Float) {
        if let Some(curve) = self.curves.get_mut(variable) {
            curve.fill(pass, x);
        }
    }
}
