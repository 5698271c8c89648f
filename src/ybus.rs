use crate::bus::{Bus, Line};
use crate::error::ConfigError;

use anyhow::Result;
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Builds the bus admittance matrix.
///
/// Rows and columns are addressed by bus number - 1. For each line with
/// series admittance `y`, charging `b = j*B/2` and tap ratio `T`:
///
/// ```text
/// Y(f,f) += (y + b) / T^2
/// Y(f,t) -= y / T
/// Y(t,f) -= y / T
/// Y(t,t) += y + b
/// ```
///
/// Parallel lines each add their own terms. Bus shunt feeds are added to
/// the diagonal.
pub fn make_ybus(bus: &[Bus], line: &[Line]) -> Result<DMatrix<Complex64>> {
    let nb = bus.len();

    for b in bus {
        if b.number == 0 || b.number > nb {
            return Err(ConfigError::BusNumberOutOfRange {
                number: b.number,
                count: nb,
            }
            .into());
        }
    }
    let row = |line_no: usize, number: usize| -> Result<usize> {
        if bus.iter().any(|b| b.number == number) {
            Ok(number - 1)
        } else {
            Err(ConfigError::UnknownBus {
                line: line_no,
                bus: number,
            }
            .into())
        }
    };

    let mut y_bus = DMatrix::from_element(nb, nb, Complex64::new(0.0, 0.0));

    for br in line {
        if br.r == 0.0 && br.x == 0.0 {
            return Err(ConfigError::ZeroImpedance { line: br.number }.into());
        }
        if br.tap == 0.0 {
            return Err(ConfigError::ZeroTap { line: br.number }.into());
        }
        let (f, t) = (row(br.number, br.from_bus)?, row(br.number, br.to_bus)?);

        let y_s = br.y_s(); // series admittance
        let a = 1.0 / br.tap;
        let y_tt = y_s + br.y_sh();

        y_bus[(f, f)] += y_tt * (a * a);
        y_bus[(f, t)] -= y_s * a;
        y_bus[(t, f)] -= y_s * a;
        y_bus[(t, t)] += y_tt;
    }

    for b in bus {
        let i = b.number - 1;
        y_bus[(i, i)] += Complex64::new(0.0, b.shunt);
    }

    log::trace!("Ybus:\n{}", y_bus);

    Ok(y_bus)
}
