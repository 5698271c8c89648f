use crate::bus::BusType;
use crate::error::ConfigError;

use anyhow::Result;
use itertools::Itertools;

/// Index permutation grouping buses as PQ, then PV, then the slack bus.
///
/// `perm()[k]` is the canonical (caller order) index of the bus in
/// partition position `k`. Within each group buses keep their canonical
/// order. It must be rebuilt whenever a bus type changes.
#[derive(Debug, Clone, PartialEq)]
pub struct BusOrder {
    perm: Vec<usize>,
    npq: usize,
    npv: usize,
}

impl BusOrder {
    /// Builds the partition of `bus_type`, which must hold exactly one
    /// slack bus.
    pub fn new(bus_type: &[BusType]) -> Result<Self> {
        let slack: Vec<usize> = bus_type
            .iter()
            .positions(|&bt| bt == BusType::Slack)
            .collect();
        match slack.len() {
            0 => return Err(ConfigError::NoSlack.into()),
            1 => {}
            _ => return Err(ConfigError::MultipleSlack { buses: slack }.into()),
        }

        let perm: Vec<usize> = (0..bus_type.len())
            .sorted_by_key(|&i| bus_type[i])
            .collect();
        let npq = bus_type.iter().filter(|&&bt| bt == BusType::PQ).count();
        let npv = bus_type.len() - npq - 1;

        Ok(Self { perm, npq, npv })
    }

    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    pub fn npq(&self) -> usize {
        self.npq
    }

    pub fn npv(&self) -> usize {
        self.npv
    }

    pub fn pq(&self) -> &[usize] {
        &self.perm[..self.npq]
    }

    pub fn pv(&self) -> &[usize] {
        &self.perm[self.npq..self.npq + self.npv]
    }

    /// PQ and PV buses, in partition order.
    pub fn non_slack(&self) -> &[usize] {
        &self.perm[..self.perm.len() - 1]
    }

    pub fn slack(&self) -> usize {
        self.perm[self.perm.len() - 1]
    }

    /// Number of unknowns: every non-slack angle plus PQ magnitudes.
    pub fn dim(&self) -> usize {
        self.npq + self.len() - 1
    }
}
