use crate::bus::{Bus, BusType};

use nalgebra::DMatrix;
use num_complex::Complex64;

/// Admittance matrix addressed through bus numbers.
///
/// Buses are referred to by their canonical index (position in the
/// caller's bus list). `row` maps that index to the admittance row of its
/// bus number, so lookups stay valid under any partition ordering.
pub(crate) struct Network {
    y_bus: DMatrix<Complex64>,
    row: Vec<usize>,
    pos: Vec<usize>,
}

impl Network {
    /// Expects bus numbers to be a permutation of 1..=N.
    pub(crate) fn new(y_bus: DMatrix<Complex64>, bus: &[Bus]) -> Self {
        let row: Vec<usize> = bus.iter().map(|b| b.number - 1).collect();
        let mut pos = vec![0; bus.len()];
        for (i, &r) in row.iter().enumerate() {
            pos[r] = i;
        }
        Self { y_bus, row, pos }
    }

    /// Admittance between canonical buses `i` and `j`.
    pub(crate) fn y(&self, i: usize, j: usize) -> Complex64 {
        self.y_bus[(self.row[i], self.row[j])]
    }

    /// Canonical index of a bus number.
    pub(crate) fn index_of(&self, number: usize) -> Option<usize> {
        match number {
            0 => None,
            n => self.pos.get(n - 1).copied(),
        }
    }
}

/// Working values of one solve, in canonical order.
#[derive(Debug, Clone)]
pub(crate) struct State {
    pub p: Vec<f64>,
    pub q: Vec<f64>,
    pub vm: Vec<f64>,
    pub va: Vec<f64>,
    pub bus_type: Vec<BusType>,
}

impl State {
    pub(crate) fn new(bus: &[Bus], flat_start: bool) -> Self {
        let mut st = Self {
            p: bus.iter().map(|b| b.p).collect(),
            q: bus.iter().map(|b| b.q).collect(),
            vm: bus.iter().map(|b| b.vm).collect(),
            va: bus.iter().map(|b| b.va).collect(),
            bus_type: bus.iter().map(|b| b.bus_type).collect(),
        };
        if flat_start {
            for (vm, bt) in st.vm.iter_mut().zip(&st.bus_type) {
                if *bt == BusType::PQ {
                    *vm = 1.0;
                }
            }
            st.va.iter_mut().for_each(|va| *va = 0.0);
        }
        st
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_follows_bus_numbers() {
        let bus = vec![
            Bus::new(3, BusType::PQ),
            Bus::new(1, BusType::Slack),
            Bus::new(2, BusType::PV),
        ];
        let y = DMatrix::from_fn(3, 3, |r, c| Complex64::new((10 * r + c) as f64, 0.0));
        let net = Network::new(y, &bus);

        // canonical 0 is bus 3 (row 2), canonical 1 is bus 1 (row 0)
        assert_eq!(net.y(0, 1), Complex64::new(20.0, 0.0));
        assert_eq!(net.y(2, 0), Complex64::new(12.0, 0.0));
        assert_eq!(net.index_of(3), Some(0));
        assert_eq!(net.index_of(1), Some(1));
        assert_eq!(net.index_of(0), None);
        assert_eq!(net.index_of(4), None);
    }

    #[test]
    fn flat_start_resets_pq_only() {
        let bus = vec![
            Bus::new(1, BusType::Slack).with_voltage(1.06).with_angle(0.1),
            Bus::new(2, BusType::PV).with_voltage(1.02).with_angle(0.2),
            Bus::new(3, BusType::PQ).with_voltage(0.95).with_angle(0.3),
        ];
        let st = State::new(&bus, true);
        assert_eq!(st.vm, vec![1.06, 1.02, 1.0]);
        assert_eq!(st.va, vec![0.0; 3]);

        let st = State::new(&bus, false);
        assert_eq!(st.vm, vec![1.06, 1.02, 0.95]);
        assert_eq!(st.va, vec![0.1, 0.2, 0.3]);
    }
}
