// AD x DBD cross enumeration for one unordered fragment pair. Either
// fragment may supply either half; both orientations feed one running
// maximum, and a shared landing site excludes the combination outright.

use crate::lines::{FragmentTable, SplitHalf};
use crate::scoring::ScoreTable;
use log::{debug, error};
use std::fmt;

/// One candidate cross, always ordered AD then DBD.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cross {
    pub ad: String,
    pub dbd: String,
    pub score: i64,
}

impl Cross {
    pub fn alias(&self) -> String {
        format!("{}-x-{}", self.ad, self.dbd)
    }
}

/// Result of enumerating one fragment pair: the best-scoring cross, and
/// (when requested) every eligible combination in discovery order.
#[derive(Clone, Debug, Default)]
pub struct Candidates {
    pub best: Option<Cross>,
    pub all: Vec<Cross>,
}

/// Which half (or both) kept a pair from crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingHalf {
    Ad,
    Dbd,
    Both,
}

impl fmt::Display for MissingHalf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MissingHalf::Ad => write!(f, "AD"),
            MissingHalf::Dbd => write!(f, "DBD"),
            MissingHalf::Both => write!(f, "AD and DBD"),
        }
    }
}

/// Enumerate both orientations for a fragment pair. Ties keep the first
/// candidate seen (strictly-greater comparison over the sorted variant
/// lists), so the result is deterministic for a given table.
pub fn generate(
    table: &FragmentTable,
    scores: &mut ScoreTable,
    frag1: &str,
    frag2: &str,
    collect_all: bool,
) -> Candidates {
    debug!("Attempting cross {frag1}-x-{frag2}");
    let mut candidates = Candidates::default();
    // frag1 supplies the AD, then the DBD
    for (ad_source, dbd_source) in [(frag1, frag2), (frag2, frag1)] {
        for ad in table.variants(ad_source) {
            if !ad.is_eligible(SplitHalf::Ad) {
                continue;
            }
            let ad_score = scores.score(&ad.line);
            for dbd in table.variants(dbd_source) {
                if !dbd.is_eligible(SplitHalf::Dbd) {
                    continue;
                }
                if ad.landing_site() == dbd.landing_site() {
                    error!("Same landing site for {} and {}", ad.line, dbd.line);
                    continue;
                }
                let score = ad_score + scores.score(&dbd.line);
                debug!("Score {}-x-{} = {score}", ad.line, dbd.line);
                let cross = Cross {
                    ad: ad.line.clone(),
                    dbd: dbd.line.clone(),
                    score,
                };
                if candidates.best.as_ref().map(|b| b.score).unwrap_or(-1) < score {
                    candidates.best = Some(cross.clone());
                }
                if collect_all {
                    candidates.all.push(cross);
                }
            }
        }
    }
    candidates
}

/// Classify a pair that produced no cross: report which half was never
/// available with the required driver across either fragment.
pub fn missing_half(table: &FragmentTable, frag1: &str, frag2: &str) -> MissingHalf {
    let has = |half: SplitHalf| {
        table
            .variants(frag1)
            .iter()
            .chain(table.variants(frag2))
            .any(|v| v.is_eligible(half))
    };
    match (has(SplitHalf::Ad), has(SplitHalf::Dbd)) {
        (false, false) => MissingHalf::Both,
        (false, true) => MissingHalf::Ad,
        (true, false) => MissingHalf::Dbd,
        // Both halves exist but every pairing was excluded.
        (true, true) => MissingHalf::Both,
    }
}
