use thiserror::Error;

/// Case data that cannot be solved.
///
/// These are rejected by [`crate::LoadFlow::new`] before any iteration is
/// run. Numerical stalls and non-convergence are reported in the result
/// instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("system should have at least two buses, found {count}")]
    TooFewBuses { count: usize },

    #[error("no slack bus")]
    NoSlack,

    #[error("more than one slack bus: {buses:?}")]
    MultipleSlack { buses: Vec<usize> },

    #[error("bus number {number} appears more than once")]
    DuplicateBusNumber { number: usize },

    #[error("bus number {number} is outside 1..={count}")]
    BusNumberOutOfRange { number: usize, count: usize },

    #[error("line {line} references unknown bus {bus}")]
    UnknownBus { line: usize, bus: usize },

    #[error("{kind} {number}: {what} cannot be negative ({value})")]
    NegativeParameter {
        kind: &'static str,
        number: usize,
        what: &'static str,
        value: f64,
    },

    #[error("{kind} {number}: {what} is not finite")]
    NonFinite {
        kind: &'static str,
        number: usize,
        what: &'static str,
    },

    #[error("line {line} has zero series impedance")]
    ZeroImpedance { line: usize },

    #[error("line {line} has a zero tap ratio")]
    ZeroTap { line: usize },

    #[error("admittance matrix is {rows}x{cols}, expected {expected}x{expected}")]
    YBusShape {
        rows: usize,
        cols: usize,
        expected: usize,
    },

    #[error("maximum iterations must be at least 1 (got {max_it})")]
    InvalidMaxIter { max_it: usize },

    #[error("unknown bus type {0:?}")]
    UnknownBusType(String),
}
