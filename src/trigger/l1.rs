//! Emulation of Level-1 items from the Level-1 candidates of an event

use super::emulator::EmulationInputs;
use crate::{
    error::AnalysisError,
    numeric::{Float, MEV_PER_GEV},
    objects::{EmTauRoI, RoiType},
};

/// Tau isolation is only applied below this cluster energy (MeV)
const ISOLATION_MAX_CLUS: Float = 60000.;

/// Isolation slope: the allowed isolation energy grows as tau_clus / slope
const ISOLATION_SLOPE: Float = 10.;

/// Kind of Level-1 object a multiplicity term counts
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum L1Kind {
    Tau,
    Em,
    Jet,
    Muon,
    MissingEt,
}

/// Tau isolation requirement
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Isolation {
    None,
    Loose,
    Medium,
    Tight,
}
//
impl Isolation {
    /// Offset of the isolation requirement (MeV)
    fn offset(self) -> Option<Float> {
        match self {
            Isolation::None => None,
            Isolation::Loose => Some(4000.),
            Isolation::Medium => Some(2000.),
            Isolation::Tight => Some(1500.),
        }
    }

    /// Truth that a tau candidate passes this isolation requirement
    fn accepts(self, roi: &EmTauRoI) -> bool {
        match self.offset() {
            None => true,
            Some(_) if roi.tau_clus >= ISOLATION_MAX_CLUS => true,
            Some(offset) => roi.em_isol <= offset + roi.tau_clus / ISOLATION_SLOPE,
        }
    }
}

/// "At least N objects of some kind above a threshold"
#[derive(Clone, Debug, PartialEq)]
struct L1Term {
    multiplicity: usize,
    kind: L1Kind,
    /// Threshold in MeV
    threshold: Float,
    isolation: Isolation,
}
//
impl L1Term {
    /// Parse a term such as "TAU20IM", "2TAU12" or "XE35"
    fn parse(item: &str, term: &str) -> Result<Self, AnalysisError> {
        let unsupported = |reason: String| AnalysisError::UnsupportedChain {
            chain: item.to_owned(),
            reason,
        };
        if term.contains('-') {
            return Err(unsupported(format!(
                "topological term \"{term}\" is not emulated"
            )));
        }

        // Optional multiplicity prefix
        let digits = term.chars().take_while(char::is_ascii_digit).count();
        let multiplicity = if digits == 0 {
            1
        } else {
            term[..digits]
                .parse::<usize>()
                .map_err(|e| unsupported(format!("bad multiplicity in \"{term}\": {e}")))?
        };
        let rest = &term[digits..];

        // Object kind. TAU must be tried before the single-letter kinds.
        const KINDS: [(&str, L1Kind); 5] = [
            ("TAU", L1Kind::Tau),
            ("EM", L1Kind::Em),
            ("MU", L1Kind::Muon),
            ("XE", L1Kind::MissingEt),
            ("J", L1Kind::Jet),
        ];
        let (kind, rest) = KINDS
            .iter()
            .find_map(|&(prefix, kind)| rest.strip_prefix(prefix).map(|rest| (kind, rest)))
            .ok_or_else(|| unsupported(format!("unknown object kind in \"{term}\"")))?;

        // Threshold in GeV, then an optional isolation suffix
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let threshold = rest[..digits]
            .parse::<u32>()
            .map_err(|_| unsupported(format!("missing threshold in \"{term}\"")))?;
        let isolation = match (kind, &rest[digits..]) {
            (_, "") => Isolation::None,
            (L1Kind::Tau, "I" | "IM") => Isolation::Medium,
            (L1Kind::Tau, "IL") => Isolation::Loose,
            (L1Kind::Tau, "IT") => Isolation::Tight,
            (_, suffix) => {
                return Err(unsupported(format!(
                    "isolation suffix \"{suffix}\" of \"{term}\" is not emulated"
                )))
            }
        };
        if kind == L1Kind::MissingEt && multiplicity != 1 {
            return Err(unsupported(format!(
                "energy sum term \"{term}\" cannot have a multiplicity"
            )));
        }

        Ok(Self {
            multiplicity,
            kind,
            threshold: threshold as Float * MEV_PER_GEV,
            isolation,
        })
    }

    /// Truth that the event's Level-1 candidates satisfy this term
    fn passes(&self, inputs: &EmulationInputs) -> bool {
        let count = match self.kind {
            L1Kind::Tau => inputs
                .l1_taus
                .iter()
                .filter(|roi| roi.roi_type == RoiType::TauRoIWord)
                .filter(|roi| roi.tau_clus > self.threshold && self.isolation.accepts(roi))
                .count(),
            L1Kind::Em => inputs
                .l1_taus
                .iter()
                .filter(|roi| roi.roi_type == RoiType::EMRoIWord && roi.em_clus > self.threshold)
                .count(),
            L1Kind::Jet => inputs
                .l1_jets
                .iter()
                .filter(|jet| jet.et8x8 > self.threshold)
                .count(),
            L1Kind::Muon => inputs
                .l1_muons
                .iter()
                .filter(|muon| muon.thr_value >= self.threshold)
                .count(),
            L1Kind::MissingEt => usize::from(inputs.l1_energy.met() > self.threshold),
        };
        count >= self.multiplicity
    }
}

/// A Level-1 item: all of its terms must be satisfied
#[derive(Clone, Debug, PartialEq)]
pub struct L1Item {
    terms: Vec<L1Term>,
}
//
impl L1Item {
    /// Parse an item name such as "L1_TAU20IM_2TAU12IM_J25"
    pub fn parse(name: &str) -> Result<Self, AnalysisError> {
        let body = name
            .strip_prefix("L1_")
            .ok_or_else(|| AnalysisError::UnsupportedChain {
                chain: name.to_owned(),
                reason: "Level-1 items must start with \"L1_\"".to_owned(),
            })?;
        let terms = body
            .split('_')
            .map(|term| L1Term::parse(name, term))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { terms })
    }

    /// Emulated decision of the item
    pub fn passes(&self, inputs: &EmulationInputs) -> bool {
        self.terms.iter().all(|term| term.passes(inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{EnergySumRoI, JetRoI, MuonRoI};

    fn tau_roi(tau_clus: Float, em_isol: Float) -> EmTauRoI {
        EmTauRoI {
            roi_type: RoiType::TauRoIWord,
            tau_clus,
            em_clus: 0.,
            em_isol,
            eta: 0.,
            phi: 0.,
        }
    }

    fn inputs<'a>(
        l1_taus: &'a [EmTauRoI],
        l1_jets: &'a [JetRoI],
        l1_energy: &'a EnergySumRoI,
    ) -> EmulationInputs<'a> {
        EmulationInputs {
            l1_taus,
            l1_jets,
            l1_muons: &[],
            l1_energy,
            hlt_taus: &[],
        }
    }

    #[test]
    fn parse_multiplicity_items() {
        let item = L1Item::parse("L1_TAU20IM_2TAU12IM_J25").unwrap();
        assert_eq!(item.terms.len(), 3);
        assert_eq!(item.terms[1].multiplicity, 2);
        assert_eq!(item.terms[1].kind, L1Kind::Tau);
        assert_eq!(item.terms[1].isolation, Isolation::Medium);
        assert_eq!(item.terms[2].kind, L1Kind::Jet);
        assert_eq!(item.terms[2].threshold, 25000.);
    }

    #[test]
    fn reject_what_cannot_be_emulated() {
        for name in [
            "L1_DR-TAU20ITAU12I",
            "L1_EM15HI",
            "L1_2XE35",
            "HLT_tau25_perf_tracktwo",
            "L1_TAU",
            "L1_FOO12",
        ] {
            assert!(
                matches!(
                    L1Item::parse(name),
                    Err(AnalysisError::UnsupportedChain { .. })
                ),
                "{name} should not be accepted"
            );
        }
    }

    #[test]
    fn terms_count_independently() {
        let item = L1Item::parse("L1_TAU20_2TAU12").unwrap();
        let energy = EnergySumRoI::default();
        let one_high_one_low = [tau_roi(25000., 0.), tau_roi(15000., 0.)];
        assert!(item.passes(&inputs(&one_high_one_low, &[], &energy)));
        let only_one = [tau_roi(25000., 0.)];
        assert!(!item.passes(&inputs(&only_one, &[], &energy)));
        // Thresholds are exclusive
        let at_threshold = [tau_roi(20000., 0.), tau_roi(12000., 0.)];
        assert!(!item.passes(&inputs(&at_threshold, &[], &energy)));
    }

    #[test]
    fn em_candidates_do_not_count_as_taus() {
        let item = L1Item::parse("L1_TAU12").unwrap();
        let energy = EnergySumRoI::default();
        let mut roi = tau_roi(30000., 0.);
        roi.roi_type = RoiType::EMRoIWord;
        assert!(!item.passes(&inputs(&[roi], &[], &energy)));
    }

    #[test]
    fn tau_isolation() {
        let item = L1Item::parse("L1_TAU12IM").unwrap();
        let energy = EnergySumRoI::default();
        // 2 GeV + 20 GeV / 10 = 4 GeV allowed
        assert!(item.passes(&inputs(&[tau_roi(20000., 4000.)], &[], &energy)));
        assert!(!item.passes(&inputs(&[tau_roi(20000., 4500.)], &[], &energy)));
        // No isolation requirement for energetic candidates
        assert!(item.passes(&inputs(&[tau_roi(70000., 50000.)], &[], &energy)));
    }

    #[test]
    fn jets_muons_and_energy_sums() {
        let energy = EnergySumRoI {
            ex_miss: 30000.,
            ey_miss: 40000.,
        };
        let jets = [JetRoI {
            et8x8: 26000.,
            eta: 0.,
            phi: 0.,
        }];
        let taus = [tau_roi(25000., 0.)];
        assert!(L1Item::parse("L1_TAU20_J25_XE45")
            .unwrap()
            .passes(&inputs(&taus, &jets, &energy)));
        assert!(!L1Item::parse("L1_XE50")
            .unwrap()
            .passes(&inputs(&taus, &jets, &energy)));

        let muons = [MuonRoI {
            thr_value: 10000.,
            eta: 0.,
            phi: 0.,
        }];
        let with_muon = EmulationInputs {
            l1_muons: &muons,
            ..inputs(&taus, &jets, &energy)
        };
        assert!(L1Item::parse("L1_MU10_TAU12").unwrap().passes(&with_muon));
    }
}
