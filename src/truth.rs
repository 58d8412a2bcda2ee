//! Matching of reconstructed taus to generator-level taus

use crate::{
    numeric::Float,
    objects::{Kinematics, TruthTau},
};

/// Finds the visible truth tau, if any, that a reconstructed object comes from
#[derive(Clone, Debug, PartialEq)]
pub struct TruthMatcher {
    max_dr: Float,
}
//
impl Default for TruthMatcher {
    fn default() -> Self {
        Self { max_dr: 0.2 }
    }
}
//
impl TruthMatcher {
    /// Closest truth tau strictly within the matching cone
    pub fn get_truth<'truth>(
        &self,
        object: &dyn Kinematics,
        truth_taus: &'truth [TruthTau],
    ) -> Option<&'truth TruthTau> {
        truth_taus
            .iter()
            .map(|truth| (truth, object.delta_r(truth)))
            .filter(|&(_, dr)| dr < self.max_dr)
            .min_by(|(_, dr1), (_, dr2)| dr1.total_cmp(dr2))
            .map(|(truth, _)| truth)
    }
}
