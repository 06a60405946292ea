use crate::UpfId;
use crate::pool::pool::Pool;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;

/// consolidation regime applied right after a session ends on some
/// instance. the six cases differ along three axes: whether the
/// survivors migrate at all, whether the emptied source is
/// quarantined from further placements within the same termination
/// step, and whether retirement waits for the scale-in threshold
/// or fires as soon as the instance drains.
///
/// an instance still carrying sessions is never retired, so every
/// predicate below also requires the source to be drained. the
/// retired instance is always the one whose last session just
/// terminated or migrated away, never an arbitrary idle one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Migration {
    /// case 1: no migration, retire when free slots hit the threshold
    Threshold,
    /// case 2: no migration, retire as soon as the source drains
    Immediate,
    /// case 3: consolidate survivors, threshold-gated retirement
    Consolidate,
    /// case 4: consolidate survivors, retire as soon as the source drains
    Drain,
    /// case 5: consolidate with the source quarantined for the step
    Quarantine,
    /// case 6: quarantined consolidation, drain-gated retirement
    QuarantineDrain,
}

impl Migration {
    /// do survivors leave the source instance at all
    pub fn migrates(&self) -> bool {
        matches!(
            self,
            Self::Consolidate | Self::Drain | Self::Quarantine | Self::QuarantineDrain
        )
    }

    /// is the source marked after a successful move. the mark only
    /// lives for the rest of the termination step, which makes its
    /// observable effect nil; it is kept because the controller
    /// contract spells it out.
    pub fn quarantines(&self) -> bool {
        matches!(self, Self::Quarantine | Self::QuarantineDrain)
    }

    /// pick the migration target for the survivors of `source`:
    /// the most occupied peer that can absorb all of them within
    /// the slot capacity. ties resolve by launch order so repeated
    /// runs stay stable.
    pub fn target(&self, pool: &Pool, source: UpfId, quarantined: &BTreeSet<UpfId>) -> Option<UpfId> {
        let survivors = pool.get(source)?.count();
        let mut peers = pool.iter().filter(|u| u.id() != source).collect::<Vec<_>>();
        peers.sort_by_key(|u| std::cmp::Reverse(u.count()));
        peers
            .iter()
            .filter(|u| !quarantined.contains(&u.id()))
            .find(|u| u.count() + survivors <= pool.capacity())
            .map(|u| u.id())
    }

    /// scale-in predicate, evaluated once the step's migration (if
    /// any) has settled
    pub fn retires(&self, pool: &Pool, source: UpfId, floor: usize, threshold: usize) -> bool {
        let drained = pool.get(source).map(|u| !u.is_busy()).unwrap_or(false);
        let spare = pool.len() >= floor + 1;
        match self {
            Self::Threshold | Self::Consolidate | Self::Quarantine => {
                drained && spare && pool.free_slots() == threshold
            }
            Self::Immediate | Self::Drain | Self::QuarantineDrain => drained && spare,
        }
    }
}

impl TryFrom<u8> for Migration {
    type Error = anyhow::Error;
    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::Threshold),
            2 => Ok(Self::Immediate),
            3 => Ok(Self::Consolidate),
            4 => Ok(Self::Drain),
            5 => Ok(Self::Quarantine),
            6 => Ok(Self::QuarantineDrain),
            _ => Err(anyhow::anyhow!("migration case must be between 1 and 6")),
        }
    }
}

impl std::fmt::Display for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Threshold => "threshold",
                Self::Immediate => "immediate",
                Self::Consolidate => "consolidate",
                Self::Drain => "drain",
                Self::Quarantine => "quarantine",
                Self::QuarantineDrain => "quarantine-drain",
            }
        )
    }
}
