use crate::error::ConfigError;
use clap::ValueEnum;
use num_complex::Complex64;
use std::fmt;
use std::str::FromStr;

/// Bus classification.
///
/// The declaration order is the partition order: PQ buses first, then PV
/// buses, then the single slack bus.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, ValueEnum)]
pub enum BusType {
    /// Load bus with specified P and Q.
    PQ,
    /// Generator bus with specified P and |V|.
    PV,
    /// Swing bus with specified |V| and angle.
    Slack,
}

impl FromStr for BusType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <BusType as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| ConfigError::UnknownBusType(s.to_string()))
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusType::PQ => write!(f, "PQ"),
            BusType::PV => write!(f, "PV"),
            BusType::Slack => write!(f, "Slack"),
        }
    }
}

/// Bus specification in per-unit.
///
/// `p` and `q` are net injections (generation minus load). The reactive
/// limits `qmin`/`qmax` apply to `q + qd`, i.e. to the generator output.
/// A limit pair with `max - min` of (almost) zero is not enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    /// External bus number, 1-based.
    pub number: usize,
    pub bus_type: BusType,

    pub p: f64,
    pub q: f64,
    pub qmin: f64,
    pub qmax: f64,
    /// Reactive load at the bus.
    pub qd: f64,

    pub vm: f64,
    pub vmin: f64,
    pub vmax: f64,
    /// Voltage angle (radians).
    pub va: f64,

    /// Shunt susceptance feed, added to the admittance diagonal.
    pub shunt: f64,
}

impl Bus {
    pub fn new(number: usize, bus_type: BusType) -> Self {
        Self {
            number,
            bus_type,
            p: 0.0,
            q: 0.0,
            qmin: 0.0,
            qmax: 0.0,
            qd: 0.0,
            vm: 1.0,
            vmin: 0.0,
            vmax: 0.0,
            va: 0.0,
            shunt: 0.0,
        }
    }

    /// Builds a bus from its generation and load.
    ///
    /// The net injections are `pg - pd` and `qg - qd`; `qd` is kept so that
    /// reactive limits are checked against the generator output.
    pub fn from_generation(
        number: usize,
        bus_type: BusType,
        pg: f64,
        pd: f64,
        qg: f64,
        qd: f64,
    ) -> Self {
        let mut bus = Self::new(number, bus_type);
        bus.p = pg - pd;
        bus.q = qg - qd;
        bus.qd = qd;
        bus
    }

    pub fn with_injection(mut self, p: f64, q: f64) -> Self {
        self.p = p;
        self.q = q;
        self
    }

    pub fn with_q_limits(mut self, qmin: f64, qmax: f64) -> Self {
        self.qmin = qmin;
        self.qmax = qmax;
        self
    }

    pub fn with_qd(mut self, qd: f64) -> Self {
        self.qd = qd;
        self
    }

    pub fn with_voltage(mut self, vm: f64) -> Self {
        self.vm = vm;
        self
    }

    pub fn with_v_limits(mut self, vmin: f64, vmax: f64) -> Self {
        self.vmin = vmin;
        self.vmax = vmax;
        self
    }

    pub fn with_angle(mut self, va: f64) -> Self {
        self.va = va;
        self
    }

    pub fn with_shunt(mut self, shunt: f64) -> Self {
        self.shunt = shunt;
        self
    }

    pub fn is_slack(&self) -> bool {
        self.bus_type == BusType::Slack
    }
}

/// Transmission line (pi model) between two bus numbers.
///
/// Line numbers need not be unique: parallel circuits may share a number
/// and are still handled as separate lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub from_bus: usize,
    pub to_bus: usize,
    pub r: f64,
    pub x: f64,
    /// Half of the total line charging susceptance.
    pub b_half: f64,
    /// Off-nominal tap ratio at the "from" end.
    pub tap: f64,
}

impl Line {
    pub fn new(number: usize, from_bus: usize, to_bus: usize, r: f64, x: f64, b_half: f64) -> Self {
        Self {
            number,
            from_bus,
            to_bus,
            r,
            x,
            b_half,
            tap: 1.0,
        }
    }

    pub fn with_tap(mut self, tap: f64) -> Self {
        self.tap = tap;
        self
    }

    /// Series admittance.
    pub fn y_s(&self) -> Complex64 {
        Complex64::new(self.r, self.x).inv()
    }

    /// Shunt admittance at each end.
    pub fn y_sh(&self) -> Complex64 {
        Complex64::new(0.0, self.b_half)
    }
}
