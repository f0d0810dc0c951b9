//! Rigid-body drop test through an external simulator.

use std::panic::{catch_unwind, AssertUnwindSafe};

use mesh_types::IndexedMesh;
use tracing::warn;

use crate::error::SimulationError;

/// A rigid-body simulator that drops the hand onto the fixed object and
/// reports how far the object moved.
pub trait Simulator: Send + Sync {
    /// Simulate with `hand` dynamic and `object` fixed.
    ///
    /// # Errors
    ///
    /// Any failure of the simulator itself.
    fn simulate(&self, hand: &IndexedMesh, object: &IndexedMesh) -> Result<f64, SimulationError>;
}

/// A simulator that always fails, so every record carries the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSimulator;

impl Simulator for DisabledSimulator {
    fn simulate(&self, _: &IndexedMesh, _: &IndexedMesh) -> Result<f64, SimulationError> {
        Err(SimulationError::Disabled)
    }
}

/// Simulated displacement, possibly substituted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    /// Displacement in metres.
    pub value: f64,
    /// Whether `value` is the fallback.
    pub fallback: bool,
}

/// Runs a [`Simulator`] and never lets it fail the caller.
///
/// Errors, panics and non-finite results all become the fallback value with
/// a warning.
#[derive(Clone, Copy)]
pub struct PhysicalValidator<'s> {
    simulator: &'s dyn Simulator,
    fallback: f64,
}

impl<'s> PhysicalValidator<'s> {
    /// Wrap a simulator with the displacement to use when it fails.
    #[must_use]
    pub fn new(simulator: &'s dyn Simulator, fallback: f64) -> Self {
        Self { simulator, fallback }
    }

    /// Measure the displacement of `hand` against `object`.
    pub fn measure(&self, hand: &IndexedMesh, object: &IndexedMesh) -> Displacement {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.simulator.simulate(hand, object)));
        let error = match outcome {
            Ok(Ok(value)) if value.is_finite() => {
                return Displacement {
                    value,
                    fallback: false,
                };
            }
            Ok(Ok(value)) => SimulationError::NonFinite(value).to_string(),
            Ok(Err(err)) => err.to_string(),
            Err(panic) => panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .map_or_else(|| "simulator panicked".to_string(), |msg| format!("simulator panicked: {msg}")),
        };
        warn!(%error, fallback = self.fallback, "simulation failed; using fallback displacement");
        Displacement {
            value: self.fallback,
            fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;

    struct Fixed(f64);

    impl Simulator for Fixed {
        fn simulate(&self, _: &IndexedMesh, _: &IndexedMesh) -> Result<f64, SimulationError> {
            Ok(self.0)
        }
    }

    struct Panicking;

    impl Simulator for Panicking {
        fn simulate(&self, _: &IndexedMesh, _: &IndexedMesh) -> Result<f64, SimulationError> {
            panic!("physics engine crashed")
        }
    }

    #[test]
    fn passes_through_finite_results() {
        let sim = Fixed(0.012);
        let d = PhysicalValidator::new(&sim, 1e-4).measure(&unit_cube(), &unit_cube());
        assert_eq!(d, Displacement { value: 0.012, fallback: false });
    }

    #[test]
    fn failures_become_fallback() {
        let cube = unit_cube();
        for sim in [&DisabledSimulator as &dyn Simulator, &Fixed(f64::NAN), &Panicking] {
            let d = PhysicalValidator::new(sim, 1e-4).measure(&cube, &cube);
            assert_eq!(d, Displacement { value: 1e-4, fallback: true });
        }
    }
}
