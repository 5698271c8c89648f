use crate::bus::{Bus, BusType, Line};
use crate::debug::format_polar_vec;
use crate::error::ConfigError;
use crate::lfopt::LFOpt;
use crate::newton::{newtonpf, ProgressMonitor};
use crate::partition::BusOrder;
use crate::pfresult::{BusResult, LFResult};
use crate::pfsoln::pfsoln;
use crate::state::{Network, State};

use anyhow::Result;
use itertools::Itertools;
use nalgebra::DMatrix;
use num_complex::Complex64;

/// A validated load flow case.
///
/// Holds its own copy of the bus and line data and of the admittance
/// matrix; solving never modifies them, so a case can be solved
/// repeatedly.
pub struct LoadFlow {
    bus: Vec<Bus>,
    line: Vec<Line>,
    net: Network,
    opt: LFOpt,
}

impl LoadFlow {
    /// Checks the case and copies it.
    ///
    /// `y_bus` is addressed by bus number - 1 (see [`crate::make_ybus`]).
    /// Buses may be listed in any order; results use the same order.
    pub fn new(bus: &[Bus], y_bus: &DMatrix<Complex64>, line: &[Line], opt: LFOpt) -> Result<Self> {
        check_case(bus, y_bus, line, &opt)?;

        Ok(Self {
            bus: bus.to_vec(),
            line: line.to_vec(),
            net: Network::new(y_bus.clone(), bus),
            opt,
        })
    }

    pub fn opt(&self) -> &LFOpt {
        &self.opt
    }

    pub fn solve(&self) -> Result<LFResult> {
        self.solve_with_progress(None)
    }

    /// Runs the Newton iterations then computes slack injections and line
    /// flows at the final iterate, converged or not.
    pub fn solve_with_progress(&self, progress: Option<&dyn ProgressMonitor>) -> Result<LFResult> {
        let mut st = State::new(&self.bus, self.opt.flat_start);
        log::debug!("V0: {}", format_polar_vec(&st.vm, &st.va));

        let out = newtonpf(&self.net, &self.bus, &mut st, &self.opt, progress)?;
        let line = pfsoln(&self.net, &self.line, &mut st)?;

        let bus = self
            .bus
            .iter()
            .enumerate()
            .map(|(i, b)| BusResult {
                number: b.number,
                bus_type: st.bus_type[i],
                original_type: b.bus_type,
                p: st.p[i],
                q: st.q[i],
                qmin: b.qmin,
                qmax: b.qmax,
                qd: b.qd,
                vm: st.vm[i],
                va: st.va[i],
            })
            .collect();

        Ok(LFResult {
            iterations: out.iterations,
            stalls: out.stalls,
            converged: out.converged,
            max_mismatch: out.norm_f,
            bus,
            line,
        })
    }
}

/// Validates and solves a load flow case.
pub fn runpf(bus: &[Bus], y_bus: &DMatrix<Complex64>, line: &[Line], opt: LFOpt) -> Result<LFResult> {
    LoadFlow::new(bus, y_bus, line, opt)?.solve()
}

fn check_case(bus: &[Bus], y_bus: &DMatrix<Complex64>, line: &[Line], opt: &LFOpt) -> Result<()> {
    let nb = bus.len();
    if nb < 2 {
        return Err(ConfigError::TooFewBuses { count: nb }.into());
    }
    if opt.max_it == 0 {
        return Err(ConfigError::InvalidMaxIter { max_it: 0 }.into());
    }

    // bus numbers must be a permutation of 1..=nb
    if let Some(b) = bus.iter().find(|b| b.number == 0 || b.number > nb) {
        return Err(ConfigError::BusNumberOutOfRange {
            number: b.number,
            count: nb,
        }
        .into());
    }
    if let Some(number) = bus.iter().map(|b| b.number).duplicates().next() {
        return Err(ConfigError::DuplicateBusNumber { number }.into());
    }

    let bus_type: Vec<BusType> = bus.iter().map(|b| b.bus_type).collect();
    BusOrder::new(&bus_type)?;

    if y_bus.shape() != (nb, nb) {
        return Err(ConfigError::YBusShape {
            rows: y_bus.nrows(),
            cols: y_bus.ncols(),
            expected: nb,
        }
        .into());
    }
    if let Some(((r, _), _)) = y_bus
        .iter()
        .enumerate()
        .map(|(k, y)| ((k % nb, k / nb), y))
        .find(|(_, y)| !(y.re.is_finite() && y.im.is_finite()))
    {
        return Err(ConfigError::NonFinite {
            kind: "Ybus row",
            number: r + 1,
            what: "admittance",
        }
        .into());
    }

    for b in bus {
        let values = [
            ("P", b.p),
            ("Q", b.q),
            ("Qmin", b.qmin),
            ("Qmax", b.qmax),
            ("Qd", b.qd),
            ("V", b.vm),
            ("Vmin", b.vmin),
            ("Vmax", b.vmax),
            ("angle", b.va),
            ("shunt", b.shunt),
        ];
        check_values("bus", b.number, &values, &["V", "Vmin", "Vmax"])?;
    }

    for br in line {
        for number in [br.from_bus, br.to_bus] {
            if number == 0 || number > nb {
                return Err(ConfigError::UnknownBus {
                    line: br.number,
                    bus: number,
                }
                .into());
            }
        }
        let values = [("R", br.r), ("X", br.x), ("B/2", br.b_half), ("T", br.tap)];
        check_values("line", br.number, &values, &["R", "X", "B/2", "T"])?;

        if br.tap == 0.0 {
            return Err(ConfigError::ZeroTap { line: br.number }.into());
        }
        if br.r == 0.0 && br.x == 0.0 {
            return Err(ConfigError::ZeroImpedance { line: br.number }.into());
        }
    }

    Ok(())
}

/// Rejects non-finite values, and negative ones among `non_negative`.
fn check_values(
    kind: &'static str,
    number: usize,
    values: &[(&'static str, f64)],
    non_negative: &[&str],
) -> Result<()> {
    for &(what, value) in values {
        if !value.is_finite() {
            return Err(ConfigError::NonFinite { kind, number, what }.into());
        }
        if value < 0.0 && non_negative.contains(&what) {
            return Err(ConfigError::NegativeParameter {
                kind,
                number,
                what,
                value,
            }
            .into());
        }
    }
    Ok(())
}
