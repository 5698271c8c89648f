use crate::bus::BusType;

/// Solved state of one bus, in per-unit and radians.
#[derive(Debug, Clone, PartialEq)]
pub struct BusResult {
    pub number: usize,
    /// Type after any limit-driven switching.
    pub bus_type: BusType,
    /// Type given by the caller.
    pub original_type: BusType,
    pub p: f64,
    pub q: f64,
    pub qmin: f64,
    pub qmax: f64,
    pub qd: f64,
    pub vm: f64,
    pub va: f64,
}

impl BusResult {
    pub fn angle_deg(&self) -> f64 {
        self.va.to_degrees()
    }

    /// Real generation given the bus's real load.
    pub fn pg(&self, pd: f64) -> f64 {
        self.p + pd
    }

    /// Reactive generation.
    pub fn qg(&self) -> f64 {
        self.q + self.qd
    }

    pub fn switched(&self) -> bool {
        self.bus_type != self.original_type
    }
}

/// Flows on one line at the solved state.
///
/// `p_from`/`q_from` are measured at the "from" terminal towards the "to"
/// bus and `p_to`/`q_to` at the "to" terminal towards the "from" bus.
/// The averages are positive for flow from the lower numbered bus to the
/// higher numbered one, whichever way round the line was entered.
#[derive(Debug, Clone, PartialEq)]
pub struct LineResult {
    pub number: usize,
    pub from_bus: usize,
    pub to_bus: usize,
    pub p_from: f64,
    pub q_from: f64,
    pub p_to: f64,
    pub q_to: f64,
    /// Mean of the sending and the negated receiving real power, seen
    /// from the lower numbered terminal.
    pub p_avg: f64,
    /// Sending minus receiving reactive power, seen from the lower
    /// numbered terminal.
    pub q_avg: f64,
    /// `|p_from + p_to|`, never negative.
    pub p_loss: f64,
    /// `q_from + q_to`, negative when line charging dominates.
    pub q_loss: f64,
}

/// Result of a load flow solve.
///
/// Buses are in the caller's order and lines in the order given.
#[derive(Debug, Clone, Default)]
pub struct LFResult {
    pub(crate) iterations: usize,
    pub(crate) stalls: usize,
    pub(crate) converged: bool,
    pub(crate) max_mismatch: f64,
    pub(crate) bus: Vec<BusResult>,
    pub(crate) line: Vec<LineResult>,
}

impl LFResult {
    /// Iterations counted, including the final convergence check.
    /// Equal to the iteration limit when the solve did not converge.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Iterations in which the correction was skipped because the
    /// Jacobian was near-singular. A non-zero count marks the answer as
    /// suspect even if it converged.
    pub fn stalls(&self) -> usize {
        self.stalls
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Converged without stalling.
    pub fn success(&self) -> bool {
        self.converged && self.stalls == 0
    }

    /// Largest P/Q mismatch at the last evaluated iterate.
    pub fn max_mismatch(&self) -> f64 {
        self.max_mismatch
    }

    pub fn bus(&self) -> &[BusResult] {
        &self.bus
    }

    pub fn line(&self) -> &[LineResult] {
        &self.line
    }

    /// Looks up a bus by its number.
    pub fn bus_by_number(&self, number: usize) -> Option<&BusResult> {
        self.bus.iter().find(|b| b.number == number)
    }

    pub fn total_p_loss(&self) -> f64 {
        self.line.iter().map(|l| l.p_loss).sum()
    }

    pub fn total_q_loss(&self) -> f64 {
        self.line.iter().map(|l| l.q_loss).sum()
    }
}
