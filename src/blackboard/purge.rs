//! Selection of the results that survive a cache purge.

use crate::archive::{NavigationLimits, NondominatedResults};
use crate::evaluation::{TargetFunction, ValuedResult};
use crate::record::{Record, RecordSet};
use crate::rule::RuleSet;
use rand::seq::{index, IndexedRandom};
use rand::Rng;

/// Records compared between rule sets when clustering.
const SAMPLE_SIZE: usize = 100;

/// Picks about `count_to_keep` members of `front`.
///
/// The best member within the limits for each target always survives.
/// The rest is filled with one random member per cluster of rule sets that
/// decide alike on a record sample, preferring members within the limits.
pub(crate) fn rules_to_keep<R: Rng>(
    front: &NondominatedResults<RuleSet>,
    limits: &NavigationLimits,
    count_to_keep: usize,
    targets: &[TargetFunction],
    records: &RecordSet,
    rng: &mut R,
) -> Vec<ValuedResult<RuleSet>> {
    let in_limits = limits.filter(front);
    let mut kept = Vec::new();
    for target in targets {
        if let Some(best) = in_limits.best_item(rng, target) {
            push_unique(&mut kept, best);
        }
    }
    if kept.len() >= count_to_keep {
        return kept;
    }

    let in_limit_items = in_limits.items();
    let spread = if in_limit_items.len() <= count_to_keep {
        for item in in_limit_items {
            push_unique(&mut kept, item);
        }
        let remaining = count_to_keep.saturating_sub(kept.len());
        one_per_cluster(remaining, front.items(), records, rng)
    } else {
        one_per_cluster(count_to_keep - kept.len(), in_limit_items, records, rng)
    };
    for item in spread {
        push_unique(&mut kept, item);
    }
    kept
}

fn push_unique(kept: &mut Vec<ValuedResult<RuleSet>>, item: ValuedResult<RuleSet>) {
    if !kept.iter().any(|k| k.item == item.item) {
        kept.push(item);
    }
}

fn one_per_cluster<R: Rng>(
    count: usize,
    items: Vec<ValuedResult<RuleSet>>,
    records: &RecordSet,
    rng: &mut R,
) -> Vec<ValuedResult<RuleSet>> {
    if count == 0 || items.is_empty() {
        return Vec::new();
    }
    if items.len() <= count {
        return items;
    }
    if count == 1 {
        return items.choose(rng).cloned().into_iter().collect();
    }
    let sample: Vec<&Record> = index::sample(rng, records.len(), SAMPLE_SIZE.min(records.len()))
        .into_iter()
        .map(|i| &records.records()[i])
        .collect();
    let signatures: Vec<Vec<bool>> = items
        .iter()
        .map(|r| sample.iter().map(|record| r.item.skips(record)).collect())
        .collect();
    average_linkage(&signatures, count)
        .into_iter()
        .filter_map(|members| members.choose(rng).map(|&i| items[i].clone()))
        .collect()
}

/// Agglomerative clustering by average Hamming distance, merging until
/// `count` clusters remain.
fn average_linkage(signatures: &[Vec<bool>], count: usize) -> Vec<Vec<usize>> {
    let n = signatures.len();
    let mut clusters: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();
    let mut distance = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = hamming(&signatures[i], &signatures[j]) as f64;
            distance[i][j] = d;
            distance[j][i] = d;
        }
    }

    let mut alive = n;
    while alive > count {
        let mut closest: Option<(usize, usize)> = None;
        for i in (0..n).filter(|&i| clusters[i].is_some()) {
            for j in ((i + 1)..n).filter(|&j| clusters[j].is_some()) {
                if closest.map_or(true, |(a, b)| distance[i][j] < distance[a][b]) {
                    closest = Some((i, j));
                }
            }
        }
        let Some((i, j)) = closest else {
            break;
        };
        let merged = clusters[j].take().unwrap_or_default();
        let size_i = clusters[i].as_ref().map_or(0, Vec::len) as f64;
        let size_j = merged.len() as f64;
        for k in 0..n {
            if k != i && clusters[k].is_some() {
                let d = (size_i * distance[i][k] + size_j * distance[j][k]) / (size_i + size_j);
                distance[i][k] = d;
                distance[k][i] = d;
            }
        }
        if let Some(cluster) = clusters[i].as_mut() {
            cluster.extend(merged);
        }
        alive -= 1;
    }
    clusters.into_iter().flatten().collect()
}

fn hamming(a: &[bool], b: &[bool]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}
