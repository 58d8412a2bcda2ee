//! Read-only snapshots of the detector objects consumed by the analysis
//!
//! All energy-like quantities are stored in MeV, as they are recorded.

use crate::numeric::{self, Float};
use serde::Deserialize;

/// Anything which has a direction and a transverse momentum
pub trait Kinematics {
    /// Transverse momentum (or transverse energy for trigger candidates)
    fn pt(&self) -> Float;

    /// Pseudorapidity
    fn eta(&self) -> Float;

    /// Azimuthal angle
    fn phi(&self) -> Float;

    /// Angular separation from another object
    fn delta_r(&self, other: &dyn Kinematics) -> Float {
        numeric::delta_r(self.eta(), self.phi(), other.eta(), other.phi())
    }
}

/// Implement Kinematics for a type with plain `pt`, `eta` and `phi` fields
macro_rules! plain_kinematics {
    ($($ty:ty),*) => {$(
        impl Kinematics for $ty {
            fn pt(&self) -> Float {
                self.pt
            }
            fn eta(&self) -> Float {
                self.eta
            }
            fn phi(&self) -> Float {
                self.phi
            }
        }
    )*};
}

/// Identification working points of tau candidates, from loosest to tightest
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum TauId {
    #[default]
    None,
    Loose,
    Medium,
    Tight,
}

/// Reconstructed (offline or HLT) hadronic tau candidate
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TauJet {
    pub pt: Float,
    pub eta: Float,
    pub phi: Float,
    /// Number of associated core tracks
    pub n_tracks: u32,
    /// Tightest identification working point that this candidate passes
    #[serde(default)]
    pub id: TauId,
}
//
impl TauJet {
    /// Truth that the candidate passes a given identification working point
    pub fn is_tau(&self, working_point: TauId) -> bool {
        self.id >= working_point
    }
}

/// Reconstructed hadronic jet
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Jet {
    pub pt: Float,
    pub eta: Float,
    pub phi: Float,
}

plain_kinematics!(TauJet, Jet);

/// Kind of Level-1 calorimeter region of interest
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub enum RoiType {
    EMRoIWord,
    TauRoIWord,
}

/// Level-1 electromagnetic or tau candidate
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EmTauRoI {
    pub roi_type: RoiType,
    /// Tau cluster transverse energy
    pub tau_clus: Float,
    /// Electromagnetic cluster transverse energy
    #[serde(default)]
    pub em_clus: Float,
    /// Electromagnetic isolation energy
    #[serde(default)]
    pub em_isol: Float,
    pub eta: Float,
    pub phi: Float,
}
//
impl Kinematics for EmTauRoI {
    fn pt(&self) -> Float {
        self.tau_clus
    }
    fn eta(&self) -> Float {
        self.eta
    }
    fn phi(&self) -> Float {
        self.phi
    }
}

/// Level-1 jet candidate
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JetRoI {
    /// Transverse energy in an 8x8 trigger tower window
    pub et8x8: Float,
    pub eta: Float,
    pub phi: Float,
}

/// Level-1 muon candidate
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MuonRoI {
    /// Value of the highest threshold passed by the candidate
    pub thr_value: Float,
    pub eta: Float,
    pub phi: Float,
}

/// Level-1 energy sums
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct EnergySumRoI {
    pub ex_miss: Float,
    pub ey_miss: Float,
}
//
impl EnergySumRoI {
    /// Missing transverse energy
    pub fn met(&self) -> Float {
        self.ex_miss.hypot(self.ey_miss)
    }
}

/// Visible part of a generator-level hadronic tau decay
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TruthTau {
    pub pt_vis: Float,
    pub eta_vis: Float,
    pub phi_vis: Float,
}
//
impl Kinematics for TruthTau {
    fn pt(&self) -> Float {
        self.pt_vis
    }
    fn eta(&self) -> Float {
        self.eta_vis
    }
    fn phi(&self) -> Float {
        self.phi_vis
    }
}

/// Event identification
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct EventInfo {
    pub run_number: u32,
    pub event_number: u64,
    pub lumi_block: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn id_levels_are_ordered() {
        let tau = TauJet {
            pt: 30000.,
            eta: 0.,
            phi: 0.,
            n_tracks: 1,
            id: TauId::Medium,
        };
        assert!(tau.is_tau(TauId::Loose));
        assert!(tau.is_tau(TauId::Medium));
        assert!(!tau.is_tau(TauId::Tight));
    }

    #[test]
    fn missing_transverse_energy() {
        let xe = EnergySumRoI {
            ex_miss: 30000.,
            ey_miss: 40000.,
        };
        assert_relative_eq!(xe.met(), 50000.);
    }

    #[test]
    fn deserialize_l1_candidate() {
        let roi: EmTauRoI = serde_json::from_str(
            r#"{"roi_type": "TauRoIWord", "tau_clus": 25000, "eta": 0.1, "phi": -1.0}"#,
        )
        .unwrap();
        assert_eq!(roi.roi_type, RoiType::TauRoIWord);
        assert_relative_eq!(roi.pt(), 25000.);
        assert_relative_eq!(roi.em_isol, 0.);
    }
}
