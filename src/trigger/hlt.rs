//! Emulation of HLT tau chains from the HLT tau candidates of an event

use super::{emulator::EmulationInputs, l1::L1Item};
use crate::{
    error::AnalysisError,
    numeric::{Float, MEV_PER_GEV},
    objects::{TauId, TauJet},
};

/// Requirements on one HLT tau of a chain
#[derive(Clone, Debug, PartialEq)]
struct TauLeg {
    /// Threshold in MeV
    threshold: Float,
    id: TauId,
    /// Whether the track-based preselection (1 to 3 core tracks) applies
    track_preselection: bool,
}
//
impl TauLeg {
    fn accepts(&self, tau: &TauJet) -> bool {
        tau.pt > self.threshold
            && tau.is_tau(self.id)
            && (!self.track_preselection || (1..=3).contains(&tau.n_tracks))
    }
}

/// An HLT chain: every leg needs its own tau, and the Level-1 seed must fire
#[derive(Clone, Debug, PartialEq)]
pub struct HltChain {
    legs: Vec<TauLeg>,
    seed: Option<L1Item>,
}
//
impl HltChain {
    /// Parse a chain name such as
    /// "HLT_tau35_medium1_tracktwo_tau25_medium1_tracktwo_L1TAU20IM_2TAU12IM"
    pub fn parse(name: &str) -> Result<Self, AnalysisError> {
        let unsupported = |reason: String| AnalysisError::UnsupportedChain {
            chain: name.to_owned(),
            reason,
        };
        let body = name
            .strip_prefix("HLT_")
            .ok_or_else(|| unsupported("HLT chains must start with \"HLT_\"".to_owned()))?;

        // An explicit Level-1 seed closes the chain name
        let (body, seed) = match body.split_once("_L1") {
            Some((legs, seed)) => (legs, Some(L1Item::parse(&format!("L1_{seed}"))?)),
            None => (body, None),
        };

        let mut legs = Vec::new();
        // Legs being built: a "2tau25" token opens two of them at once
        let mut current: Vec<TauLeg> = Vec::new();
        for token in body.split('_') {
            if let Some((multiplicity, threshold)) = Self::parse_leg_opener(token) {
                legs.append(&mut current);
                let leg = TauLeg {
                    threshold: threshold as Float * MEV_PER_GEV,
                    id: TauId::None,
                    track_preselection: false,
                };
                current = vec![leg; multiplicity];
                continue;
            }
            if current.is_empty() {
                return Err(unsupported(format!(
                    "\"{token}\" does not follow a tau leg"
                )));
            }
            match token {
                "perf" | "idperf" => {}
                "loose1" => current.iter_mut().for_each(|leg| leg.id = TauId::Loose),
                "medium1" => current.iter_mut().for_each(|leg| leg.id = TauId::Medium),
                "tight1" => current.iter_mut().for_each(|leg| leg.id = TauId::Tight),
                "tracktwo" | "track" => current
                    .iter_mut()
                    .for_each(|leg| leg.track_preselection = true),
                "ptonly" => {}
                other => return Err(unsupported(format!("unknown chain token \"{other}\""))),
            }
        }
        legs.append(&mut current);
        if legs.is_empty() {
            return Err(unsupported("no tau leg found".to_owned()));
        }

        Ok(Self { legs, seed })
    }

    /// Recognize "tau25" or "2tau25", returning (multiplicity, threshold)
    fn parse_leg_opener(token: &str) -> Option<(usize, u32)> {
        let (multiplicity, threshold) = token.split_once("tau")?;
        let multiplicity = match multiplicity {
            "" => 1,
            digits => digits.parse::<usize>().ok().filter(|&n| n > 0)?,
        };
        Some((multiplicity, threshold.parse::<u32>().ok()?))
    }

    /// Emulated decision of the chain
    pub fn passes(&self, inputs: &EmulationInputs) -> bool {
        if let Some(seed) = &self.seed {
            if !seed.passes(inputs) {
                return false;
            }
        }
        let mut used = vec![false; inputs.hlt_taus.len()];
        Self::assign_legs(&self.legs, inputs.hlt_taus, &mut used)
    }

    /// Find distinct taus for all remaining legs, backtracking on failure
    fn assign_legs(legs: &[TauLeg], taus: &[TauJet], used: &mut [bool]) -> bool {
        let Some((leg, other_legs)) = legs.split_first() else {
            return true;
        };
        for (idx, tau) in taus.iter().enumerate() {
            if used[idx] || !leg.accepts(tau) {
                continue;
            }
            used[idx] = true;
            if Self::assign_legs(other_legs, taus, used) {
                return true;
            }
            used[idx] = false;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{EmTauRoI, EnergySumRoI, RoiType};

    fn hlt_tau(pt: Float, n_tracks: u32, id: TauId) -> TauJet {
        TauJet {
            pt,
            eta: 0.,
            phi: 0.,
            n_tracks,
            id,
        }
    }

    fn inputs<'a>(
        l1_taus: &'a [EmTauRoI],
        hlt_taus: &'a [TauJet],
        energy: &'a EnergySumRoI,
    ) -> EmulationInputs<'a> {
        EmulationInputs {
            l1_taus,
            l1_jets: &[],
            l1_muons: &[],
            l1_energy: energy,
            hlt_taus,
        }
    }

    #[test]
    fn parse_di_tau_chain() {
        let chain =
            HltChain::parse("HLT_tau35_medium1_tracktwo_tau25_medium1_tracktwo_L1TAU20IM_2TAU12IM")
                .unwrap();
        assert_eq!(chain.legs.len(), 2);
        assert_eq!(chain.legs[0].threshold, 35000.);
        assert_eq!(chain.legs[1].id, TauId::Medium);
        assert!(chain.legs[1].track_preselection);
        assert!(chain.seed.is_some());

        let perf = HltChain::parse("HLT_tau25_perf_ptonly").unwrap();
        assert_eq!(perf.legs[0].id, TauId::None);
        assert!(!perf.legs[0].track_preselection);
        assert!(perf.seed.is_none());

        let multi = HltChain::parse("HLT_2tau25_loose1_tracktwo").unwrap();
        assert_eq!(multi.legs.len(), 2);
        assert!(multi.legs.iter().all(|leg| leg.id == TauId::Loose));
    }

    #[test]
    fn reject_unknown_tokens() {
        for name in [
            "HLT_tau25_medium1_mvonly",
            "HLT_medium1_tau25",
            "HLT_",
            "L1_TAU12",
            "HLT_tau25_medium1_tracktwo_L1DR-TAU20ITAU12I",
        ] {
            assert!(HltChain::parse(name).is_err(), "{name} should not be accepted");
        }
    }

    #[test]
    fn legs_need_distinct_taus() {
        let chain = HltChain::parse("HLT_tau35_medium1_tracktwo_tau25_medium1_tracktwo").unwrap();
        let energy = EnergySumRoI::default();
        let one = [hlt_tau(50000., 1, TauId::Medium)];
        assert!(!chain.passes(&inputs(&[], &one, &energy)));
        let two = [
            hlt_tau(30000., 3, TauId::Medium),
            hlt_tau(50000., 1, TauId::Tight),
        ];
        assert!(chain.passes(&inputs(&[], &two, &energy)));
        let bad_tracks = [
            hlt_tau(50000., 4, TauId::Medium),
            hlt_tau(30000., 1, TauId::Medium),
        ];
        assert!(!chain.passes(&inputs(&[], &bad_tracks, &energy)));
    }

    #[test]
    fn assignment_backtracks() {
        // The greedy choice (first tau for the loose leg) would starve the
        // tight leg
        let chain = HltChain::parse("HLT_tau25_loose1_ptonly_tau25_tight1_ptonly").unwrap();
        let energy = EnergySumRoI::default();
        let taus = [
            hlt_tau(40000., 1, TauId::Tight),
            hlt_tau(40000., 1, TauId::Loose),
        ];
        assert!(chain.passes(&inputs(&[], &taus, &energy)));
    }

    #[test]
    fn level1_seed_is_required() {
        let chain = HltChain::parse("HLT_tau25_perf_ptonly_L1TAU12").unwrap();
        let energy = EnergySumRoI::default();
        let taus = [hlt_tau(40000., 1, TauId::None)];
        assert!(!chain.passes(&inputs(&[], &taus, &energy)));
        let l1 = [EmTauRoI {
            roi_type: RoiType::TauRoIWord,
            tau_clus: 20000.,
            em_clus: 0.,
            em_isol: 0.,
            eta: 0.,
            phi: 0.,
        }];
        assert!(chain.passes(&inputs(&l1, &taus, &energy)));
    }
}
