//! TransientModel trait for pluggable dynamic systems.

/// A system `x' = f(t, x)` that an [`Integrator`](crate::Integrator) can advance.
///
/// The state type only needs vector-space arithmetic: add two states and
/// scale one by a scalar.
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Compute state derivative dxdt = f(t, x).
    fn rhs(&self, t: f64, x: &Self::State) -> Self::State;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
