use crate::partition::BusOrder;
use crate::state::{Network, State};

/// Admittance-weighted voltage sums for the bus in partition position `k`.
///
/// Returns `(sum_j V(j)|Y(k,j)|cos(t), sum_j V(j)|Y(k,j)|sin(t))` with
/// `t = angle(Y(k,j)) - D(k) + D(j)`, summed over all buses.
pub(crate) fn row_sums(net: &Network, order: &BusOrder, st: &State, k: usize) -> (f64, f64) {
    let perm = order.perm();
    let i = perm[k];
    let (mut s_cos, mut s_sin) = (0.0, 0.0);
    for &j in perm {
        let y = net.y(i, j);
        let t = y.arg() - st.va[i] + st.va[j];
        s_cos += st.vm[j] * y.norm() * t.cos();
        s_sin += st.vm[j] * y.norm() * t.sin();
    }
    (s_cos, s_sin)
}

/// Real and reactive power injected at the bus in partition position `k`.
pub(crate) fn injection(net: &Network, order: &BusOrder, st: &State, k: usize) -> (f64, f64) {
    let vm = st.vm[order.perm()[k]];
    let (s_cos, s_sin) = row_sums(net, order, st, k);
    (vm * s_cos, -vm * s_sin)
}

pub(crate) fn q_calc(net: &Network, order: &BusOrder, st: &State, k: usize) -> f64 {
    injection(net, order, st, k).1
}
