/// Load flow options.
#[derive(Debug, Clone)]
pub struct LFOpt {
    // Maximum number of Newton iterations. Default value is 20.
    pub max_it: usize,

    // Clamp |V| to [Vmin, Vmax], converting the bus to PV.
    pub enforce_v_limits: bool,
    // Clamp Q + Qd to [Qmin, Qmax], converting the bus to PQ.
    pub enforce_q_limits: bool,

    // Termination tolerance on per unit P & Q mismatch. Default value is 1e-6.
    pub tolerance: f64,

    // Jacobians with |det| at or below this are not used for a correction.
    pub singular_det: f64,

    // Limit pairs narrower than this are not enforced.
    pub limit_band: f64,

    // Start PQ buses at 1.0 pu and all angles at zero.
    pub flat_start: bool,
}

impl Default for LFOpt {
    fn default() -> Self {
        Self {
            max_it: 20,
            enforce_v_limits: true,
            enforce_q_limits: true,
            tolerance: 1e-6,
            singular_det: 1e-3,
            limit_band: 1e-10,
            flat_start: true,
        }
    }
}

impl LFOpt {
    pub fn with_max_it(mut self, max_it: usize) -> Self {
        self.max_it = max_it;
        self
    }

    pub fn with_limits(mut self, enforce_v_limits: bool, enforce_q_limits: bool) -> Self {
        self.enforce_v_limits = enforce_v_limits;
        self.enforce_q_limits = enforce_q_limits;
        self
    }

    pub fn with_flat_start(mut self, flat_start: bool) -> Self {
        self.flat_start = flat_start;
        self
    }
}
