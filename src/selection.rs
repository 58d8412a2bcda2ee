//! Object selection: reduce raw event collections to sorted, selected copies
//!
//! Selectors never fail: when nothing passes, they return an empty
//! collection, and callers check its size before looking at its elements.
//! Every selected collection is sorted by decreasing ordering key (pt, or
//! tau cluster energy for Level-1 candidates).

use crate::{
    numeric::Float,
    objects::{EmTauRoI, Jet, RoiType, TauId, TauJet},
    overlap::{self, JET_TAU_MIN_DR},
};

/// Cuts applied to offline tau candidates
#[derive(Clone, Debug, PartialEq)]
pub struct TauSelection {
    /// Minimal transverse momentum (MeV)
    pub min_pt: Float,
    pub max_abs_eta: Float,
    /// Calorimeter transition region, excluded bounds
    pub crack: (Float, Float),
    pub allowed_tracks: Vec<u32>,
    pub id: TauId,
}
//
impl Default for TauSelection {
    fn default() -> Self {
        Self {
            min_pt: 20000.,
            max_abs_eta: 2.5,
            crack: (1.37, 1.52),
            allowed_tracks: vec![1, 3],
            id: TauId::Medium,
        }
    }
}
//
impl TauSelection {
    /// Name of the first cut which rejects a tau candidate, if any
    fn rejection(&self, tau: &TauJet) -> Option<&'static str> {
        let abs_eta = tau.eta.abs();
        if tau.pt < self.min_pt {
            Some("pt")
        } else if abs_eta > self.max_abs_eta {
            Some("eta")
        } else if abs_eta > self.crack.0 && abs_eta < self.crack.1 {
            Some("transition region")
        } else if !self.allowed_tracks.contains(&tau.n_tracks) {
            Some("nTracks")
        } else if !tau.is_tau(self.id) {
            Some("id")
        } else {
            None
        }
    }

    /// Select tau candidates, sorted by decreasing pt
    pub fn select(&self, taus: &[TauJet]) -> Vec<TauJet> {
        let mut selected: Vec<TauJet> = taus
            .iter()
            .enumerate()
            .filter(|(idx, tau)| match self.rejection(tau) {
                Some(cut) => {
                    log::trace!(
                        "Reject tau {idx} on {cut} (pt = {}, eta = {}, nTracks = {}, id = {:?})",
                        tau.pt,
                        tau.eta,
                        tau.n_tracks,
                        tau.id
                    );
                    false
                }
                None => true,
            })
            .map(|(_, tau)| tau.clone())
            .collect();
        sort_descending(&mut selected, |tau| tau.pt);
        selected
    }
}

/// Cuts applied to offline jets
#[derive(Clone, Debug, PartialEq)]
pub struct JetSelection {
    /// Minimal transverse momentum (MeV)
    pub min_pt: Float,
    pub max_abs_eta: Float,
}
//
impl JetSelection {
    /// Jet selection with the standard pt cut and a configurable eta range
    pub fn new(max_abs_eta: Float) -> Self {
        Self {
            min_pt: 30000.,
            max_abs_eta,
        }
    }

    /// Select jets which do not overlap with either of the two chosen taus,
    /// sorted by decreasing pt
    pub fn select(&self, jets: &[Jet], tau1: &TauJet, tau2: &TauJet) -> Vec<Jet> {
        let kinematic: Vec<Jet> = jets
            .iter()
            .filter(|jet| jet.pt >= self.min_pt && jet.eta.abs() <= self.max_abs_eta)
            .cloned()
            .collect();
        let mut selected = overlap::remove_overlap(&kinematic, &[tau1, tau2], JET_TAU_MIN_DR);
        log::trace!(
            "Kept {} of {} jets ({} after kinematic cuts)",
            selected.len(),
            jets.len(),
            kinematic.len()
        );
        sort_descending(&mut selected, |jet| jet.pt);
        selected
    }
}

/// Select genuine Level-1 tau candidates, sorted by decreasing cluster energy
pub fn select_l1_taus(l1_taus: &[EmTauRoI]) -> Vec<EmTauRoI> {
    let mut selected: Vec<EmTauRoI> = l1_taus
        .iter()
        .filter(|roi| roi.roi_type == RoiType::TauRoIWord)
        .cloned()
        .collect();
    sort_descending(&mut selected, |roi| roi.tau_clus);
    selected
}

/// Stable sort by decreasing key, with NaNs last
fn sort_descending<T>(objects: &mut [T], key: impl Fn(&T) -> Float) {
    objects.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or_else(|| key(a).is_nan().cmp(&key(b).is_nan()))
    });
}

/// Leading and subleading element of a selected collection
pub fn leading_pair<T>(selected: &[T]) -> Option<(&T, &T)> {
    match selected {
        [first, second, ..] => Some((first, second)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tau(pt: Float, eta: Float, n_tracks: u32, id: TauId) -> TauJet {
        TauJet {
            pt,
            eta,
            phi: 0.,
            n_tracks,
            id,
        }
    }

    #[test]
    fn track_count_must_be_one_or_three() {
        let selection = TauSelection::default();
        for n_tracks in 0..8 {
            let selected = selection.select(&[tau(50000., 0.1, n_tracks, TauId::Tight)]);
            assert_eq!(selected.len(), usize::from(n_tracks == 1 || n_tracks == 3));
        }
    }

    #[test]
    fn transition_region_is_excluded() {
        let selection = TauSelection::default();
        for eta in [1.371, 1.4, 1.45, 1.5, 1.519] {
            for sign in [1., -1.] {
                let candidate = tau(50000., sign * eta, 1, TauId::Tight);
                assert!(selection.select(&[candidate]).is_empty());
            }
        }
        // The bounds themselves are accepted
        assert_eq!(selection.select(&[tau(50000., 1.37, 1, TauId::Medium)]).len(), 1);
        assert_eq!(selection.select(&[tau(50000., -1.52, 3, TauId::Medium)]).len(), 1);
    }

    #[test]
    fn kinematic_and_id_cuts() {
        let selection = TauSelection::default();
        let taus = [
            tau(19999., 0., 1, TauId::Medium),
            tau(20000., 2.5, 1, TauId::Medium),
            tau(30000., 2.51, 1, TauId::Medium),
            tau(30000., 0., 3, TauId::Loose),
        ];
        let selected = selection.select(&taus);
        assert_eq!(selected, vec![taus[1].clone()]);
    }

    #[test]
    fn rejections_name_the_first_failing_cut() {
        let selection = TauSelection::default();
        let reason = |candidate: TauJet| selection.rejection(&candidate);
        assert_eq!(reason(tau(10000., 3., 2, TauId::Loose)), Some("pt"));
        assert_eq!(reason(tau(30000., -2.7, 2, TauId::Loose)), Some("eta"));
        assert_eq!(reason(tau(30000., 1.4, 1, TauId::Tight)), Some("transition region"));
        assert_eq!(reason(tau(30000., 0., 2, TauId::Loose)), Some("nTracks"));
        assert_eq!(reason(tau(30000., 0., 1, TauId::Loose)), Some("id"));
        assert_eq!(reason(tau(30000., 0., 1, TauId::Medium)), None);
    }

    #[test]
    fn selected_taus_are_sorted() {
        let selection = TauSelection::default();
        let taus = [
            tau(25000., 0., 1, TauId::Medium),
            tau(60000., 0.5, 3, TauId::Medium),
            tau(40000., -0.5, 1, TauId::Tight),
        ];
        let pts: Vec<Float> = selection.select(&taus).iter().map(|tau| tau.pt).collect();
        assert_eq!(pts, vec![60000., 40000., 25000.]);
        // The input is left untouched
        assert_eq!(taus[0].pt, 25000.);
    }

    #[test]
    fn jets_are_cleaned_against_both_taus() {
        let tau1 = TauJet {
            phi: 1.,
            ..tau(45000., 0.3, 1, TauId::Medium)
        };
        let tau2 = TauJet {
            phi: -1.,
            ..tau(32000., -0.8, 3, TauId::Medium)
        };
        let jet = |pt, eta, phi| Jet { pt, eta, phi };
        let jets = [
            jet(40000., 0.3, 1.1),
            jet(35000., -0.8, -1.2),
            jet(29000., 2., 2.),
            jet(80000., 3.5, 2.),
            jet(50000., 2., 2.),
            jet(90000., -2., 3.),
        ];
        let selected = JetSelection::new(3.2).select(&jets, &tau1, &tau2);
        assert_eq!(selected, vec![jets[5].clone(), jets[4].clone()]);
    }

    #[test]
    fn only_tau_rois_are_kept() {
        let roi = |roi_type, tau_clus| EmTauRoI {
            roi_type,
            tau_clus,
            em_clus: 0.,
            em_isol: 0.,
            eta: 0.,
            phi: 0.,
        };
        let rois = [
            roi(RoiType::TauRoIWord, 15000.),
            roi(RoiType::EMRoIWord, 80000.),
            roi(RoiType::TauRoIWord, 30000.),
        ];
        let selected = select_l1_taus(&rois);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].tau_clus, 30000.);
        assert_eq!(selected[1].tau_clus, 15000.);
    }

    #[test]
    fn leading_pair_needs_two_objects() {
        assert_eq!(leading_pair::<u8>(&[]), None);
        assert_eq!(leading_pair(&[1]), None);
        assert_eq!(leading_pair(&[3, 2, 1]), Some((&3, &2)));
    }
}
