use super::{jacobian, ProgressMonitor};
use crate::bus::Bus;
use crate::debug::{format_f64_vec, format_polar_vec};
use crate::injection::{injection, q_calc};
use crate::lfopt::LFOpt;
use crate::limits::enforce_limits;
use crate::partition::BusOrder;
use crate::state::{Network, State};

use anyhow::Result;
use nalgebra::{DMatrix, DVector};

/// How the Newton iterations ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NewtonOutcome {
    pub iterations: usize,
    /// Iterations in which the Jacobian was too close to singular to use.
    pub stalls: usize,
    pub converged: bool,
    /// Largest mismatch at the last evaluated state.
    pub norm_f: f64,
}

/// Evaluates `[P - P(x) (pq, pv); Q - Q(x) (pq)]` in partition order.
pub(crate) fn mismatch(net: &Network, order: &BusOrder, st: &State) -> Vec<f64> {
    let ns = order.len() - 1;
    let npq = order.npq();
    let mut f = vec![0.0; order.dim()];
    for (k, &i) in order.non_slack().iter().enumerate() {
        let (p, q) = injection(net, order, st, k);
        f[k] = st.p[i] - p;
        if k < npq {
            f[ns + k] = st.q[i] - q;
        }
    }
    f
}

/// Largest absolute entry, or NaN if any entry is NaN.
pub(crate) fn norm_inf(f: &[f64]) -> f64 {
    f.iter()
        .try_fold(0.0_f64, |m, x| (!x.is_nan()).then(|| m.max(x.abs())))
        .unwrap_or(f64::NAN)
}

/// Solves `J dx = f`.
///
/// Returns `None` if `|det(J)|` does not exceed `singular_det` (or is NaN)
/// or the factorization cannot be solved.
pub(crate) fn correction(jac: DMatrix<f64>, f: &[f64], singular_det: f64) -> Option<DVector<f64>> {
    let lu = jac.lu();
    let det = lu.determinant();
    if det.is_nan() || det.abs() <= singular_det {
        log::debug!("det(J) = {:e}", det);
        return None;
    }
    lu.solve(&DVector::from_column_slice(f))
}

/// Solves the load flow with Newton's method (power balance, polar).
///
/// `st` holds the initial iterate and is updated in place. Each iteration
/// rebuilds the bus partition, evaluates the mismatch and stops if it is
/// below tolerance. Otherwise the correction is applied to PQ magnitudes
/// and non-slack angles, PV reactive injections are recomputed and the
/// bus limits are enforced, which may change bus types for the next
/// iteration. A near-singular Jacobian skips the correction but still
/// uses up the iteration, and is counted as a stall.
pub(crate) fn newtonpf(
    net: &Network,
    bus: &[Bus],
    st: &mut State,
    opt: &LFOpt,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<NewtonOutcome> {
    let tol = opt.tolerance;
    let max_it = opt.max_it;

    let mut converged = false;
    let mut i = 0;
    let mut stalls = 0;
    let mut norm_f = f64::INFINITY;

    while !converged && i < max_it {
        // update iteration counter
        i = i + 1;

        let order = BusOrder::new(&st.bus_type)?;
        let (npq, ns) = (order.npq(), order.len() - 1);

        // evaluate F(x)
        let f = mismatch(net, &order, st);
        norm_f = norm_inf(&f);
        if let Some(pm) = progress {
            pm.update(i, norm_f);
        }
        log::debug!("norm_f{}: {}", i, norm_f);

        if norm_f < tol {
            converged = true;
            log::info!(
                "Newton's method load flow converged in {} iterations.",
                i
            );
            continue;
        }

        // evaluate Jacobian
        let jac = jacobian(net, &order, st);
        log::trace!("J_{}:\n{}", i, jac);

        // compute update step
        let dx = match correction(jac, &f, opt.singular_det) {
            Some(dx) => dx,
            None => {
                stalls += 1;
                log::warn!("iteration {}: singular Jacobian, correction skipped", i);
                continue;
            }
        };
        log::trace!("dx: {}", format_f64_vec(dx.as_slice()));

        // update voltage
        for (k, &b) in order.pq().iter().enumerate() {
            st.vm[b] += dx[k];
        }
        for (k, &b) in order.non_slack().iter().enumerate() {
            st.va[b] += dx[npq + k];
        }

        // reactive injection of PV buses at the new state
        for k in npq..ns {
            let q = q_calc(net, &order, st, k);
            st.q[order.perm()[k]] = q;
        }

        enforce_limits(bus, st, opt);
        log::debug!("V_{}: {}", i, format_polar_vec(&st.vm, &st.va));
    }

    if !converged {
        log::info!(
            "Newton's method load flow did not converge in {} iterations ({} stalled).",
            i,
            stalls
        );
    }

    Ok(NewtonOutcome {
        iterations: i,
        stalls,
        converged,
        norm_f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusType, Line};
    use crate::make_ybus;

    use num_complex::Complex64;
    use std::cell::RefCell;

    struct Record(RefCell<Vec<(usize, f64)>>);

    impl ProgressMonitor for Record {
        fn update(&self, i: usize, norm_f: f64) {
            self.0.borrow_mut().push((i, norm_f));
        }
    }

    fn two_bus(p: f64, q: f64) -> (Network, Vec<Bus>) {
        let bus = vec![
            Bus::new(1, BusType::Slack),
            Bus::new(2, BusType::PQ).with_injection(p, q),
        ];
        let line = vec![Line::new(1, 1, 2, 0.01, 0.1, 0.0)];
        (Network::new(make_ybus(&bus, &line).unwrap(), &bus), bus)
    }

    #[test]
    fn quadratic_convergence() {
        let (net, bus) = two_bus(-0.5, -0.2);
        let mut st = State::new(&bus, true);
        let rec = Record(RefCell::new(Vec::new()));

        let out = newtonpf(&net, &bus, &mut st, &LFOpt::default(), Some(&rec)).unwrap();

        assert!(out.converged);
        assert_eq!(out.stalls, 0);
        assert!(out.norm_f < 1e-6);

        let norms = rec.0.into_inner();
        assert_eq!(norms.len(), out.iterations);
        assert_eq!(norms.len(), 4);
        assert_eq!(norms[0].0, 1);
        assert!((norms[0].1 - 0.5).abs() < 1e-12);
        for w in norms.windows(2) {
            assert!(w[1].1 < w[0].1);
        }
    }

    #[test]
    fn singular_jacobian_stalls() {
        let bus = vec![
            Bus::new(1, BusType::Slack),
            Bus::new(2, BusType::PQ).with_injection(-0.5, -0.2),
        ];
        let y_bus = DMatrix::from_element(2, 2, Complex64::new(0.0, 0.0));
        let net = Network::new(y_bus, &bus);
        let mut st = State::new(&bus, true);
        let opt = LFOpt::default().with_max_it(5);

        let out = newtonpf(&net, &bus, &mut st, &opt, None).unwrap();

        assert!(!out.converged);
        assert_eq!(out.iterations, 5);
        assert_eq!(out.stalls, 5);
        assert_eq!(st.vm, vec![1.0, 1.0]);
        assert_eq!(st.va, vec![0.0, 0.0]);
    }

    #[test]
    fn iteration_limit_reached() {
        let (net, bus) = two_bus(-0.5, -0.2);
        let mut st = State::new(&bus, true);
        let opt = LFOpt::default().with_max_it(1);

        let out = newtonpf(&net, &bus, &mut st, &opt, None).unwrap();

        assert!(!out.converged);
        assert_eq!(out.iterations, 1);
        assert_eq!(out.stalls, 0);
    }

    #[test]
    fn nan_mismatch_is_never_within_tolerance() {
        let tol = LFOpt::default().tolerance;
        assert!(!(norm_inf(&[f64::NAN, 0.0]) < tol));
        assert!(!(norm_inf(&[0.0, f64::NAN]) < tol));
        assert!(norm_inf(&[f64::NAN, f64::NAN]).is_nan());
        assert_eq!(norm_inf(&[-0.25, 0.5, f64::INFINITY]), f64::INFINITY);
        assert_eq!(norm_inf(&[-0.75, 0.5]), 0.75);
        assert_eq!(norm_inf(&[]), 0.0);
    }

    #[test]
    fn nan_injection_does_not_converge() {
        let (net, mut bus) = two_bus(-0.5, -0.2);
        bus[1].p = f64::NAN;
        let mut st = State::new(&bus, true);
        let opt = LFOpt::default().with_max_it(3);

        let out = newtonpf(&net, &bus, &mut st, &opt, None).unwrap();

        assert!(!out.converged);
        assert_eq!(out.iterations, 3);
        assert!(out.norm_f.is_nan());
    }

    #[test]
    fn correction_rejects_small_determinant() {
        let jac = DMatrix::from_row_slice(2, 2, &[0.005, 0.0, 0.0, 0.1]);
        assert!(correction(jac, &[1.0, 1.0], 1e-3).is_none());

        let jac = DMatrix::from_row_slice(2, 2, &[f64::NAN, 0.0, 0.0, 1.0]);
        assert!(correction(jac, &[1.0, 1.0], 1e-3).is_none());

        let jac = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
        let dx = correction(jac, &[1.0, 1.0], 1e-3).unwrap();
        assert!((dx[0] - 0.5).abs() < 1e-15);
        assert!((dx[1] - 0.25).abs() < 1e-15);
    }
}
