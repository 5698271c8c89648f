use crate::bus::Line;
use crate::error::ConfigError;
use crate::injection::injection;
use crate::partition::BusOrder;
use crate::pfresult::LineResult;
use crate::state::{Network, State};

use anyhow::Result;
use num_complex::Complex64;

/// Completes the solution at the final iterate.
///
/// Sets the slack bus injections from the network and computes the flow
/// and losses of every line.
pub(crate) fn pfsoln(net: &Network, line: &[Line], st: &mut State) -> Result<Vec<LineResult>> {
    // Update P and Q for the slack bus.
    let order = BusOrder::new(&st.bus_type)?;
    let (p, q) = injection(net, &order, st, order.len() - 1);
    st.p[order.slack()] = p;
    st.q[order.slack()] = q;

    line.iter().map(|br| line_flow(net, br, st)).collect()
}

/// Complex power leaving bus `i` into a pi-model line towards bus `j`.
///
/// ```text
/// S_ij = V_i^2 (y_sh + y_s)* - V_i V_j (y_s e^{j(D_j - D_i)})*
/// ```
fn branch_flow(vi: f64, di: f64, vj: f64, dj: f64, y_s: Complex64, y_sh: Complex64) -> Complex64 {
    let own = (y_sh + y_s) * (vi * vi);
    let mutual = y_s * Complex64::from_polar(vi * vj, dj - di);
    (own - mutual).conj()
}

/// Flows and losses of one line. Terminals are located by bus number.
pub(crate) fn line_flow(net: &Network, br: &Line, st: &State) -> Result<LineResult> {
    let terminal = |number: usize| {
        net.index_of(number).ok_or(ConfigError::UnknownBus {
            line: br.number,
            bus: number,
        })
    };
    let (i, j) = (terminal(br.from_bus)?, terminal(br.to_bus)?);

    let (y_s, y_sh) = (br.y_s(), br.y_sh());
    let s_f = branch_flow(st.vm[i], st.va[i], st.vm[j], st.va[j], y_s, y_sh);
    let s_t = branch_flow(st.vm[j], st.va[j], st.vm[i], st.va[i], y_s, y_sh);

    // averages are positive from the lower numbered terminal
    let (s_lo, s_hi) = if br.from_bus <= br.to_bus {
        (s_f, s_t)
    } else {
        (s_t, s_f)
    };

    Ok(LineResult {
        number: br.number,
        from_bus: br.from_bus,
        to_bus: br.to_bus,
        p_from: s_f.re,
        q_from: s_f.im,
        p_to: s_t.re,
        q_to: s_t.im,
        p_avg: (s_lo.re - s_hi.re) / 2.0,
        q_avg: s_lo.im - s_hi.im,
        p_loss: (s_f.re + s_t.re).abs(),
        q_loss: s_f.im + s_t.im,
    })
}
