use crate::injection::row_sums;
use crate::partition::BusOrder;
use crate::state::{Network, State};

use nalgebra::DMatrix;

/// Builds the power flow Jacobian in partition order.
///
/// Unknowns are ordered `[V(pq); D(pq, pv)]` and equations
/// `[P(pq, pv); Q(pq)]`, giving the block layout
///
/// ```text
/// | J1 = dP/dV   J3 = dP/dD |
/// | J2 = dQ/dV   J4 = dQ/dD |
/// ```
///
/// The slack bus has no row or column.
pub(crate) fn jacobian(net: &Network, order: &BusOrder, st: &State) -> DMatrix<f64> {
    let n = order.len();
    let npq = order.npq();
    let ns = n - 1; // non-slack buses
    let bus = order.perm();

    let mut jac = DMatrix::<f64>::zeros(npq + ns, npq + ns);

    // |Y(k,m)| and angle(Y(k,m)) - D(k) + D(m) in partition positions.
    let polar = |k: usize, m: usize| -> (f64, f64) {
        let (i, j) = (bus[k], bus[m]);
        let y = net.y(i, j);
        (y.norm(), y.arg() - st.va[i] + st.va[j])
    };
    let vm = |k: usize| st.vm[bus[k]];

    for k in 0..ns {
        let (s_cos, s_sin) = row_sums(net, order, st, k);
        let vk = vm(k);

        // J1: P rows x PQ magnitudes
        for m in 0..npq {
            let (y, t) = polar(k, m);
            jac[(k, m)] = vk * y * t.cos();
        }
        // J3: P rows x angles
        for m in 0..ns {
            let (y, t) = polar(k, m);
            jac[(k, npq + m)] = -vk * vm(m) * y * t.sin();
        }
        jac[(k, npq + k)] += vk * s_sin;

        if k < npq {
            jac[(k, k)] += s_cos;

            let r = ns + k;
            // J2: Q rows x PQ magnitudes
            for m in 0..npq {
                let (y, t) = polar(k, m);
                jac[(r, m)] = -vk * y * t.sin();
            }
            jac[(r, k)] -= s_sin;

            // J4: Q rows x angles
            for m in 0..ns {
                let (y, t) = polar(k, m);
                jac[(r, npq + m)] = -vk * vm(m) * y * t.cos();
            }
            jac[(r, npq + k)] += vk * s_cos;
        }
    }

    jac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Bus, BusType, Line};
    use crate::injection::injection;
    use crate::make_ybus;

    /// Calculated [P(non-slack); Q(pq)] at the current state.
    fn f(net: &Network, order: &BusOrder, st: &State) -> Vec<f64> {
        let ns = order.len() - 1;
        let s: Vec<(f64, f64)> = (0..ns).map(|k| injection(net, order, st, k)).collect();
        s.iter()
            .map(|s| s.0)
            .chain(s[..order.npq()].iter().map(|s| s.1))
            .collect()
    }

    #[test]
    fn matches_finite_differences() {
        let bus = vec![
            Bus::new(1, BusType::Slack).with_voltage(1.06),
            Bus::new(2, BusType::PV).with_voltage(1.04).with_angle(-0.04),
            Bus::new(3, BusType::PQ).with_voltage(0.98).with_angle(-0.08),
            Bus::new(4, BusType::PQ).with_voltage(1.01).with_angle(-0.09),
        ];
        let line = vec![
            Line::new(1, 1, 2, 0.02, 0.06, 0.03),
            Line::new(2, 1, 3, 0.08, 0.24, 0.025),
            Line::new(3, 2, 3, 0.06, 0.18, 0.02),
            Line::new(4, 2, 4, 0.06, 0.18, 0.02).with_tap(0.98),
            Line::new(5, 3, 4, 0.01, 0.03, 0.01),
        ];
        let net = Network::new(make_ybus(&bus, &line).unwrap(), &bus);
        let st = State::new(&bus, false);
        let order = BusOrder::new(&st.bus_type).unwrap();
        let jac = jacobian(&net, &order, &st);

        let npq = order.npq();
        let dim = order.dim();
        assert_eq!(jac.shape(), (dim, dim));

        let h = 1e-6;
        let shifted = |c: usize, dx: f64| -> Vec<f64> {
            let mut sh = st.clone();
            if c < npq {
                sh.vm[order.pq()[c]] += dx;
            } else {
                sh.va[order.non_slack()[c - npq]] += dx;
            }
            f(&net, &order, &sh)
        };
        for c in 0..dim {
            let (f1, f0) = (shifted(c, h), shifted(c, -h));
            for r in 0..dim {
                let fd = (f1[r] - f0[r]) / (2.0 * h);
                assert!(
                    (jac[(r, c)] - fd).abs() < 1e-5,
                    "J({}, {}) = {} but finite difference gives {}",
                    r,
                    c,
                    jac[(r, c)],
                    fd
                );
            }
        }
    }

    #[test]
    fn pv_only_system_has_angle_block_only() {
        let bus = vec![
            Bus::new(1, BusType::PV).with_voltage(1.02),
            Bus::new(2, BusType::Slack),
        ];
        let line = vec![Line::new(1, 1, 2, 0.0, 0.1, 0.0)];
        let net = Network::new(make_ybus(&bus, &line).unwrap(), &bus);
        let st = State::new(&bus, true);
        let order = BusOrder::new(&st.bus_type).unwrap();
        let jac = jacobian(&net, &order, &st);

        // dP1/dD1 = V1 V2 |Y12| at zero angle difference
        assert_eq!(jac.shape(), (1, 1));
        assert!((jac[(0, 0)] - 1.02 * 10.0).abs() < 1e-9);
    }
}
