use crate::bus::{Bus, BusType};
use crate::lfopt::LFOpt;
use crate::state::State;

/// Clamps reactive generation and voltage magnitude to their limits.
///
/// Each bus is checked for Q first and then for V. A Q violation pins
/// `q = limit - qd` and makes the bus PQ; a V violation pins `vm` to the
/// limit and makes the bus PV. When both fire in the same pass the V
/// check runs last, so the bus ends up PV. Limit pairs narrower than
/// `opt.limit_band` are ignored, as is the slack bus.
///
/// Returns the number of buses whose type changed.
pub(crate) fn enforce_limits(bus: &[Bus], st: &mut State, opt: &LFOpt) -> usize {
    let mut switched = 0;

    for (i, b) in bus.iter().enumerate() {
        if b.is_slack() {
            continue;
        }
        let before = st.bus_type[i];

        if opt.enforce_q_limits && (b.qmax - b.qmin).abs() > opt.limit_band {
            let qg = st.q[i] + b.qd;
            if qg < b.qmin {
                log::warn!("bus {}: Qg {:.6} below Qmin {:.6}", b.number, qg, b.qmin);
                st.q[i] = b.qmin - b.qd;
                st.bus_type[i] = BusType::PQ;
            } else if qg > b.qmax {
                log::warn!("bus {}: Qg {:.6} above Qmax {:.6}", b.number, qg, b.qmax);
                st.q[i] = b.qmax - b.qd;
                st.bus_type[i] = BusType::PQ;
            }
        }

        if opt.enforce_v_limits && (b.vmax - b.vmin).abs() > opt.limit_band {
            let vm = st.vm[i];
            if vm < b.vmin {
                log::warn!("bus {}: V {:.6} below Vmin {:.6}", b.number, vm, b.vmin);
                st.vm[i] = b.vmin;
                st.bus_type[i] = BusType::PV;
            } else if vm > b.vmax {
                log::warn!("bus {}: V {:.6} above Vmax {:.6}", b.number, vm, b.vmax);
                st.vm[i] = b.vmax;
                st.bus_type[i] = BusType::PV;
            }
        }

        if st.bus_type[i] != before {
            log::info!("bus {}: {} -> {}", b.number, before, st.bus_type[i]);
            switched += 1;
        }
    }

    switched
}
