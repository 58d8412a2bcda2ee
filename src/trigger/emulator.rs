//! Offline re-computation of trigger chain decisions

use super::{hlt::HltChain, l1::L1Item};
use crate::{
    error::AnalysisError,
    objects::{EmTauRoI, EnergySumRoI, JetRoI, MuonRoI, TauJet},
};
use std::collections::HashMap;

/// Event data that the emulation runs on
#[derive(Clone, Copy, Debug)]
pub struct EmulationInputs<'event> {
    pub l1_taus: &'event [EmTauRoI],
    pub l1_jets: &'event [JetRoI],
    pub l1_muons: &'event [MuonRoI],
    pub l1_energy: &'event EnergySumRoI,
    /// Only used by HLT chains, may be empty otherwise
    pub hlt_taus: &'event [TauJet],
}

/// Emulated chain, Level-1 or HLT
#[derive(Clone, Debug)]
enum EmulatedChain {
    Level1(L1Item),
    Hlt(HltChain),
}

/// Trigger emulation tool
///
/// Chains are parsed once, when the tool is built, so that a chain which
/// cannot be emulated aborts the job before any event is processed. The tool
/// itself is immutable afterwards and may be shared between threads.
///
#[derive(Clone, Debug)]
pub struct TrigEmulator {
    chains: Vec<(String, EmulatedChain)>,
    index: HashMap<String, usize>,
}
//
impl TrigEmulator {
    /// Set up the emulation of a list of chains
    pub fn new<S: AsRef<str>>(chain_names: &[S]) -> Result<Self, AnalysisError> {
        let mut chains = Vec::with_capacity(chain_names.len());
        let mut index = HashMap::with_capacity(chain_names.len());
        for name in chain_names {
            let name = name.as_ref().trim();
            let chain = if name.starts_with("HLT_") {
                EmulatedChain::Hlt(HltChain::parse(name)?)
            } else {
                EmulatedChain::Level1(L1Item::parse(name)?)
            };
            index.insert(name.to_owned(), chains.len());
            chains.push((name.to_owned(), chain));
        }
        Ok(Self { chains, index })
    }

    /// Truth that HLT candidates must be provided to `calculate`
    pub fn needs_hlt_taus(&self) -> bool {
        self.chains
            .iter()
            .any(|(_, chain)| matches!(chain, EmulatedChain::Hlt(_)))
    }

    /// Emulate every configured chain on one event
    pub fn calculate(&self, inputs: &EmulationInputs) -> EmulationDecisions<'_> {
        let passed = self
            .chains
            .iter()
            .map(|(_, chain)| match chain {
                EmulatedChain::Level1(item) => item.passes(inputs),
                EmulatedChain::Hlt(chain) => chain.passes(inputs),
            })
            .collect();
        EmulationDecisions {
            emulator: self,
            passed,
        }
    }
}

/// Emulated decisions of one event
pub struct EmulationDecisions<'tool> {
    emulator: &'tool TrigEmulator,
    passed: Vec<bool>,
}
//
impl EmulationDecisions<'_> {
    /// Emulated decision of a chain. Chains that are not emulated never pass.
    pub fn decision(&self, chain: &str) -> bool {
        self.emulator
            .index
            .get(chain.trim())
            .map_or(false, |&idx| self.passed[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{RoiType, TauId};

    #[test]
    fn emulate_mixed_chain_list() {
        let emulator = TrigEmulator::new(&[
            "L1_TAU12",
            "L1_TAU20_2TAU12",
            "HLT_tau25_medium1_tracktwo_L1TAU12",
        ])
        .unwrap();
        assert!(emulator.needs_hlt_taus());

        let roi = |tau_clus| EmTauRoI {
            roi_type: RoiType::TauRoIWord,
            tau_clus,
            em_clus: 0.,
            em_isol: 0.,
            eta: 0.,
            phi: 0.,
        };
        let l1_taus = [roi(30000.), roi(10000.)];
        let hlt_taus = [TauJet {
            pt: 28000.,
            eta: 0.,
            phi: 0.,
            n_tracks: 3,
            id: TauId::Medium,
        }];
        let energy = EnergySumRoI::default();
        let inputs = EmulationInputs {
            l1_taus: &l1_taus,
            l1_jets: &[],
            l1_muons: &[],
            l1_energy: &energy,
            hlt_taus: &hlt_taus,
        };
        let decisions = emulator.calculate(&inputs);
        assert!(decisions.decision("L1_TAU12"));
        assert!(!decisions.decision("L1_TAU20_2TAU12"));
        assert!(decisions.decision("HLT_tau25_medium1_tracktwo_L1TAU12"));
        assert!(!decisions.decision("L1_TAU60"));
    }

    #[test]
    fn unsupported_chains_fail_initialization() {
        let err = TrigEmulator::new(&["L1_TAU12", "L1_DR-TAU20ITAU12I"]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnsupportedChain { chain, .. } if chain == "L1_DR-TAU20ITAU12I"
        ));
    }

    #[test]
    fn level1_only_lists_need_no_hlt_input() {
        let emulator = TrigEmulator::new(&["L1_TAU12", "L1_J25"]).unwrap();
        assert!(!emulator.needs_hlt_taus());
    }
}
