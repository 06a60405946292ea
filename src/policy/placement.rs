use crate::Load;
use crate::UpfId;
use crate::pool::pool::Pool;
use crate::traffic::sampler::Sampler;
use serde::Deserialize;
use serde::Serialize;

/// admission rule for an incoming session. candidates are the
/// instances with a free slot (and throughput headroom when the
/// variant is active); the loaded rules break ties among equally
/// occupied candidates uniformly at random, which is where the
/// sampler comes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// first instance in launch order with a free slot
    FirstFit,
    /// spread load: uniformly among the least occupied candidates
    LeastLoaded,
    /// concentrate load: uniformly among the most occupied candidates
    MostLoaded,
}

impl Placement {
    pub fn select(&self, pool: &Pool, demand: Option<Load>, sampler: &mut Sampler) -> Option<UpfId> {
        let candidates = pool.vacancies(demand);
        match self {
            Self::FirstFit => candidates.first().map(|u| u.id()),
            Self::LeastLoaded => {
                let low = candidates.iter().map(|u| u.count()).min()?;
                let ties = candidates
                    .iter()
                    .filter(|u| u.count() == low)
                    .map(|u| u.id())
                    .collect::<Vec<UpfId>>();
                Some(*sampler.choice(&ties))
            }
            Self::MostLoaded => {
                let high = candidates.iter().map(|u| u.count()).max()?;
                let ties = candidates
                    .iter()
                    .filter(|u| u.count() == high)
                    .map(|u| u.id())
                    .collect::<Vec<UpfId>>();
                Some(*sampler.choice(&ties))
            }
        }
    }
}

impl TryFrom<u8> for Placement {
    type Error = anyhow::Error;
    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::FirstFit),
            2 => Ok(Self::LeastLoaded),
            3 => Ok(Self::MostLoaded),
            _ => Err(anyhow::anyhow!("upf case must be 1, 2, or 3")),
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::FirstFit => "first-fit",
                Self::LeastLoaded => "least-loaded",
                Self::MostLoaded => "most-loaded",
            }
        )
    }
}
