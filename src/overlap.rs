//! Geometric overlap between physics objects

use crate::{numeric::Float, objects::Kinematics};

/// Jets closer than this to a selected tau are removed
pub const JET_TAU_MIN_DR: Float = 0.4;

/// Truth that an object lies within `min_dr` of any of the reference objects
pub fn overlaps<T: Kinematics + ?Sized>(
    object: &T,
    references: &[&dyn Kinematics],
    min_dr: Float,
) -> bool {
    references
        .iter()
        .any(|&reference| object.delta_r(reference) < min_dr)
}

/// Keep the objects which do not overlap with any of the reference objects
///
/// Input order is preserved.
///
pub fn remove_overlap<T: Kinematics + Clone>(
    objects: &[T],
    references: &[&dyn Kinematics],
    min_dr: Float,
) -> Vec<T> {
    objects
        .iter()
        .filter(|object| !overlaps(*object, references, min_dr))
        .cloned()
        .collect()
}
