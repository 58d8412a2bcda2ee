//! Basic numerical concepts used throughout the program

// Floating-point precision is configured here
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f32")]
pub use std::f32 as floats;
#[cfg(not(feature = "f32"))]
pub type Float = f64;
#[cfg(not(feature = "f32"))]
pub use std::f64 as floats;

/// Energies are stored in MeV, but thresholds are labeled in GeV
pub const MEV_PER_GEV: Float = 1000.;

/// Azimuthal angle difference, folded back into [-π, π)
pub fn delta_phi(phi1: Float, phi2: Float) -> Float {
    use floats::consts::PI;
    (phi1 - phi2 + PI).rem_euclid(2. * PI) - PI
}

/// Angular separation in the (pseudorapidity, azimuthal angle) plane
pub fn delta_r(eta1: Float, phi1: Float, eta2: Float, phi2: Float) -> Float {
    (eta1 - eta2).hypot(delta_phi(phi1, phi2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use floats::consts::PI;

    #[test]
    fn delta_phi_wraps_around() {
        assert_relative_eq!(delta_phi(3.0, -3.0), 6.0 - 2. * PI, epsilon = 1e-6);
        assert_relative_eq!(delta_phi(-3.0, 3.0), 2. * PI - 6.0, epsilon = 1e-6);
        assert_relative_eq!(delta_phi(0.5, 0.2), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn delta_r_is_euclidean() {
        assert_relative_eq!(delta_r(0.0, 0.0, 0.3, 0.4), 0.5, epsilon = 1e-6);
        assert_relative_eq!(delta_r(1.0, PI - 0.1, 1.0, -PI + 0.1), 0.2, epsilon = 1e-5);
    }
}
