//! Mechanism for loading and sharing the analysis configuration
//!
//! The configuration file holds one `key = value` knob per line. Everything
//! after a `#` is a comment, and blank lines are ignored. Every knob has a
//! default value, so a file only needs to list what it changes.

use crate::{
    numeric::{Float, MEV_PER_GEV},
    threshold::ThresholdGrid,
    trigger::DecisionCondition,
};
use eyre::{bail, ensure, eyre, Result, WrapErr};
use std::{collections::HashSet, fmt::Display, fs, path::Path, str::FromStr};

/// Which parts of the analysis run
#[derive(Clone, Debug, PartialEq)]
pub struct Stages {
    /// Cutflow and threshold scans
    pub acceptance: bool,
    /// Comparison of the recorded trigger decision with its emulation
    pub agreement: bool,
    /// Require both leading taus to come from a generator-level tau
    pub truth_matching: bool,
    /// Require a large pseudorapidity gap between the leading jets
    pub vbf_selection: bool,
}

/// Keys of the event containers which the analysis reads
#[derive(Clone, Debug, PartialEq)]
pub struct InputKeys {
    pub event_info: String,
    pub taus: String,
    pub jets: String,
    pub truth_taus: String,
    pub l1_taus: String,
    pub l1_jets: String,
    pub l1_muons: String,
    pub l1_energy: String,
    pub hlt_taus: String,
}

/// Event-level cuts of the acceptance stage (energies in MeV)
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptanceCuts {
    pub tau1_pt: Float,
    pub tau2_pt: Float,
    pub min_dr_tautau: Float,
    pub max_dr_tautau: Float,
    pub n_jets: usize,
    pub jet1_pt: Float,
    pub jet2_pt: Float,
    /// Maximal jet |eta|
    pub jet_eta: Float,
    /// Minimal |eta(j1) - eta(j2)|, only used by the VBF selection
    pub delta_eta_jj: Float,
}

/// Settings of the agreement stage
#[derive(Clone, Debug, PartialEq)]
pub struct AgreementSettings {
    /// Chains to be compared, in report order
    pub chains: Vec<String>,
    /// Which recorded decision bit is compared
    pub decision_condition: DecisionCondition,
    /// Only compare events in which this chain fired
    pub reference_chain: Option<String>,
    /// Chains whose efficiency is measured on accepted events
    pub efficiency_chains: Vec<String>,
}

/// Analysis configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub stages: Stages,
    pub keys: InputKeys,
    pub cuts: AcceptanceCuts,
    /// Level-1 tau cluster energy thresholds
    pub l1_grid: ThresholdGrid,
    /// Offline tau pt thresholds
    pub off_grid: ThresholdGrid,
    pub agreement: AgreementSettings,
}
//
impl Default for Configuration {
    fn default() -> Self {
        let cuts = AcceptanceCuts {
            tau1_pt: 35000.,
            tau2_pt: 25000.,
            min_dr_tautau: 0.8,
            max_dr_tautau: 2.4,
            n_jets: 0,
            jet1_pt: 30000.,
            jet2_pt: 30000.,
            jet_eta: 3.2,
            delta_eta_jj: 3.,
        };
        Self {
            stages: Stages {
                acceptance: true,
                agreement: false,
                truth_matching: true,
                vbf_selection: false,
            },
            keys: InputKeys {
                event_info: "EventInfo".to_owned(),
                taus: "TauJets".to_owned(),
                jets: "AntiKt4LCTopoJets".to_owned(),
                truth_taus: "TruthTaus".to_owned(),
                l1_taus: "LVL1EmTauRoIs".to_owned(),
                l1_jets: "LVL1JetRoIs".to_owned(),
                l1_muons: "LVL1MuonRoIs".to_owned(),
                l1_energy: "LVL1EnergySumRoI".to_owned(),
                hlt_taus: "TrigTauRecMerged".to_owned(),
            },
            l1_grid: ThresholdGrid {
                minimum: 12000.,
                step: 1000.,
                step_count: 30,
            },
            off_grid: ThresholdGrid {
                minimum: cuts.tau2_pt,
                step: 1000.,
                step_count: 30,
            },
            cuts,
            agreement: AgreementSettings {
                chains: Vec::new(),
                decision_condition: DecisionCondition::BeforePrescale,
                reference_chain: None,
                efficiency_chains: Vec::new(),
            },
        }
    }
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and log it
    pub fn load(file_name: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read {}", file_name.display()))?;
        let config = Self::parse(&config_str)?;
        config.log_summary();
        Ok(config)
    }

    /// Decode and check the contents of a configuration file
    pub fn parse(config_str: &str) -> Result<Self> {
        let mut config = Self::default();
        // Unless set explicitly, the offline grid starts at the subleading cut
        let mut off_min = None;
        let mut seen = HashSet::new();

        for (line_idx, line) in config_str.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let (name, data) = line.split_once('=').ok_or_else(|| {
                eyre!(
                    "Line {} of the configuration is not a \"key = value\" pair",
                    line_idx + 1
                )
            })?;
            let item = ConfigItem::new(name.trim(), data.trim());
            ensure!(
                seen.insert(item.name),
                "Configuration of {} appears twice",
                item.name
            );

            let cfg = &mut config;
            match item.name {
                "acceptance" => cfg.stages.acceptance = item.parse_bool()?,
                "agreement" => cfg.stages.agreement = item.parse_bool()?,
                "truth_matching" => cfg.stages.truth_matching = item.parse_bool()?,
                "vbf_selection" => cfg.stages.vbf_selection = item.parse_bool()?,

                "event_info_key" => cfg.keys.event_info = item.parse_key()?,
                "tau_key" => cfg.keys.taus = item.parse_key()?,
                "jet_key" => cfg.keys.jets = item.parse_key()?,
                "truth_tau_key" => cfg.keys.truth_taus = item.parse_key()?,
                "l1_tau_key" => cfg.keys.l1_taus = item.parse_key()?,
                "l1_jet_key" => cfg.keys.l1_jets = item.parse_key()?,
                "l1_muon_key" => cfg.keys.l1_muons = item.parse_key()?,
                "l1_energy_key" => cfg.keys.l1_energy = item.parse_key()?,
                "hlt_tau_key" => cfg.keys.hlt_taus = item.parse_key()?,

                "tau1_pt" => cfg.cuts.tau1_pt = item.parse()?,
                "tau2_pt" => cfg.cuts.tau2_pt = item.parse()?,
                "min_dr_tautau" => cfg.cuts.min_dr_tautau = item.parse()?,
                "max_dr_tautau" => cfg.cuts.max_dr_tautau = item.parse()?,
                "n_jets" => cfg.cuts.n_jets = item.parse()?,
                "jet1_pt" => cfg.cuts.jet1_pt = item.parse()?,
                "jet2_pt" => cfg.cuts.jet2_pt = item.parse()?,
                "jet_eta" => cfg.cuts.jet_eta = item.parse()?,
                "delta_eta_jj" => cfg.cuts.delta_eta_jj = item.parse()?,

                "l1_min" => cfg.l1_grid.minimum = item.parse()?,
                "l1_step" => cfg.l1_grid.step = item.parse()?,
                "l1_nsteps" => cfg.l1_grid.step_count = item.parse()?,
                "off_min" => off_min = Some(item.parse::<Float>()?),
                "off_step" => cfg.off_grid.step = item.parse()?,
                "off_nsteps" => cfg.off_grid.step_count = item.parse()?,

                "chains" => cfg.agreement.chains = item.parse_list(),
                "decision_condition" => cfg.agreement.decision_condition = item.parse()?,
                "reference_chain" => {
                    cfg.agreement.reference_chain =
                        Some(item.data.to_owned()).filter(|chain| !chain.is_empty())
                }
                "efficiency_chains" => cfg.agreement.efficiency_chains = item.parse_list(),

                unknown => bail!("Unknown configuration key {unknown}"),
            }
        }
        config.off_grid.minimum = off_min.unwrap_or(config.cuts.tau2_pt);

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration makes sense
    fn validate(&self) -> Result<()> {
        ensure!(
            self.stages.acceptance || self.stages.agreement,
            "Please enable at least one of the acceptance and agreement stages"
        );
        for (name, grid) in [("l1", &self.l1_grid), ("off", &self.off_grid)] {
            ensure!(
                grid.step > 0. && grid.step_count > 0,
                "The {name} threshold grid needs a positive step and step count"
            );
            // Bins are labeled in integer GeV
            for (knob, value) in [("min", grid.minimum), ("step", grid.step)] {
                ensure!(
                    value % MEV_PER_GEV == 0.,
                    "{name}_{knob} ({value} MeV) is not a whole number of GeV"
                );
            }
        }
        ensure!(
            self.cuts.min_dr_tautau <= self.cuts.max_dr_tautau,
            "min_dr_tautau ({}) is above max_dr_tautau ({})",
            self.cuts.min_dr_tautau,
            self.cuts.max_dr_tautau
        );
        ensure!(
            !self.stages.agreement || !self.agreement.chains.is_empty(),
            "The agreement stage needs at least one chain"
        );
        for (knob, chains) in [
            ("chains", &self.agreement.chains),
            ("efficiency_chains", &self.agreement.efficiency_chains),
        ] {
            let mut seen = HashSet::new();
            for chain in chains {
                ensure!(
                    seen.insert(chain.as_str()),
                    "Chain {chain} appears twice in {knob}"
                );
            }
        }
        Ok(())
    }

    /// Log the configuration, one knob per line
    pub fn log_summary(&self) {
        let Self {
            stages,
            keys,
            cuts,
            l1_grid,
            off_grid,
            agreement,
        } = self;
        let knob = |name: &str, value: &dyn Display| log::info!("{name:<20}: {value}");
        knob("acceptance", &stages.acceptance);
        knob("agreement", &stages.agreement);
        knob("truth_matching", &stages.truth_matching);
        knob("vbf_selection", &stages.vbf_selection);
        knob("tau_key", &keys.taus);
        knob("jet_key", &keys.jets);
        knob("l1_tau_key", &keys.l1_taus);
        knob("tau1_pt", &cuts.tau1_pt);
        knob("tau2_pt", &cuts.tau2_pt);
        knob("min_dr_tautau", &cuts.min_dr_tautau);
        knob("max_dr_tautau", &cuts.max_dr_tautau);
        knob("n_jets", &cuts.n_jets);
        knob("jet1_pt", &cuts.jet1_pt);
        knob("jet2_pt", &cuts.jet2_pt);
        knob("jet_eta", &cuts.jet_eta);
        if stages.vbf_selection {
            knob("delta_eta_jj", &cuts.delta_eta_jj);
        }
        for (prefix, grid) in [("l1", l1_grid), ("off", off_grid)] {
            log::info!(
                "{:<20}: {} steps of {} from {}",
                format!("{prefix}_grid"),
                grid.step_count,
                grid.step,
                grid.minimum
            );
        }
        if stages.agreement {
            knob("chains", &agreement.chains.join(", "));
            knob("decision_condition", &format!("{:?}", agreement.decision_condition));
            if let Some(reference) = &agreement.reference_chain {
                knob("reference_chain", reference);
            }
        }
        if !agreement.efficiency_chains.is_empty() {
            knob("efficiency_chains", &agreement.efficiency_chains.join(", "));
        }
    }
}

/// A value from the configuration file, tagged with the knob which it is
/// supposed to set for error reporting purposes.
struct ConfigItem<'data> {
    name: &'data str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    fn new(name: &'data str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(&self) -> Result<T>
    where
        <T as FromStr>::Err: Display,
    {
        self.data.parse::<T>().map_err(|e| {
            eyre!(
                "Could not parse configuration of {} from \"{}\": {e}",
                self.name,
                self.data
            )
        })
    }

    /// Parse a boolean, also accepting yes and no
    fn parse_bool(&self) -> Result<bool> {
        match self.data.to_lowercase().as_str() {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => self.parse::<bool>(),
        }
    }

    /// Container keys cannot be empty
    fn parse_key(&self) -> Result<String> {
        ensure!(!self.data.is_empty(), "Configuration of {} is empty", self.name);
        Ok(self.data.to_owned())
    }

    /// Comma-separated list, without empty entries
    fn parse_list(&self) -> Vec<String> {
        self.data
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
