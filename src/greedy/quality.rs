//! Heuristic quality of a candidate conjunction.

use rand::Rng;
use std::cmp::Ordering;

/// Confusion counts of the records a candidate covers.
///
/// `no` records are the ones the candidate should cover, `must` records the
/// ones it should not. Exclusions are induced on a swapped subset, so the
/// same counts work for both sides of a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleQuality {
    pub must: usize,
    pub no: usize,
}

impl RuleQuality {
    pub fn new(must: usize, no: usize) -> Self {
        Self { must, no }
    }

    pub fn size(&self) -> usize {
        self.must + self.no
    }

    /// Covers at least as many records it should not cover as records it
    /// should.
    pub fn is_pro_must(&self) -> bool {
        self.must >= self.no
    }
}

/// Scoring functions from the rule-learning literature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityFunction {
    /// `no / size`, zero for an empty cover.
    Precision,
    /// `(no + 1) / (size + 2)`.
    Laplace,
    /// m-estimate with the class prior of the training set.
    MEstimate(f64),
    /// Weighted difference of true and false positive rates.
    RelativeCost(f64),
}

impl QualityFunction {
    /// Scores `q`; `totals` are the counts of the whole training subset.
    pub fn score(&self, q: RuleQuality, totals: RuleQuality) -> f64 {
        let size = q.size() as f64;
        let no = q.no as f64;
        match *self {
            QualityFunction::Precision => {
                if q.size() == 0 {
                    0.0
                } else {
                    no / size
                }
            }
            QualityFunction::Laplace => (no + 1.0) / (size + 2.0),
            QualityFunction::MEstimate(m) => {
                let prior = ratio(q.no, totals.size());
                (no + m * prior) / (size + m)
            }
            QualityFunction::RelativeCost(cr) => {
                cr * ratio(q.no, totals.no) - (1.0 - cr) * ratio(q.must, totals.must)
            }
        }
    }

    /// Orders by score, then by covered record count. `Greater` means `a`
    /// is the better candidate.
    pub fn compare(&self, a: RuleQuality, b: RuleQuality, totals: RuleQuality) -> Ordering {
        self.score(a, totals)
            .total_cmp(&self.score(b, totals))
            .then(a.size().cmp(&b.size()))
    }

    /// One of the four functions with random parameters.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        match rng.random_range(0..4) {
            0 => QualityFunction::Precision,
            1 => QualityFunction::Laplace,
            2 => QualityFunction::RelativeCost(rng.random::<f64>() * 0.8),
            _ => QualityFunction::MEstimate(rng.random_range(1..=100) as f64),
        }
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// How a greedy run picks its quality function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualitySelection {
    /// The same function for every conjunction.
    Fixed(QualityFunction),
    /// A fresh random function per conjunction.
    Randomized,
}

impl Default for QualitySelection {
    fn default() -> Self {
        QualitySelection::Fixed(QualityFunction::Laplace)
    }
}

impl QualitySelection {
    pub fn pick<R: Rng>(&self, rng: &mut R) -> QualityFunction {
        match self {
            QualitySelection::Fixed(f) => *f,
            QualitySelection::Randomized => QualityFunction::random(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOTALS: RuleQuality = RuleQuality { must: 10, no: 30 };

    #[test]
    fn test_precision_and_laplace() {
        let q = RuleQuality::new(1, 3);
        assert!((QualityFunction::Precision.score(q, TOTALS) - 0.75).abs() < 1e-12);
        assert!((QualityFunction::Laplace.score(q, TOTALS) - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(QualityFunction::Precision.score(RuleQuality::default(), TOTALS), 0.0);
        assert!((QualityFunction::Laplace.score(RuleQuality::default(), TOTALS) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_m_estimate_and_relative_cost() {
        let q = RuleQuality::new(2, 6);
        let m = QualityFunction::MEstimate(4.0).score(q, TOTALS);
        assert!((m - (6.0 + 4.0 * 6.0 / 40.0) / 12.0).abs() < 1e-12);
        let c = QualityFunction::RelativeCost(0.25).score(q, TOTALS);
        assert!((c - (0.25 * 0.2 - 0.75 * 0.2)).abs() < 1e-12);
        let empty = RuleQuality::default();
        assert_eq!(QualityFunction::RelativeCost(0.5).score(q, empty), 0.0);
    }

    #[test]
    fn test_compare_breaks_ties_by_size() {
        let f = QualityFunction::Precision;
        let small = RuleQuality::new(0, 1);
        let large = RuleQuality::new(0, 3);
        assert_eq!(f.compare(large, small, TOTALS), Ordering::Greater);
        assert_eq!(f.compare(small, small, TOTALS), Ordering::Equal);
        assert_eq!(f.compare(RuleQuality::new(1, 1), small, TOTALS), Ordering::Less);
    }

    #[test]
    fn test_pro_must() {
        assert!(RuleQuality::new(2, 2).is_pro_must());
        assert!(!RuleQuality::new(1, 2).is_pro_must());
    }

    #[test]
    fn test_randomized_parameters_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            match QualitySelection::Randomized.pick(&mut rng) {
                QualityFunction::RelativeCost(cr) => assert!((0.0..0.8).contains(&cr)),
                QualityFunction::MEstimate(m) => assert!((1.0..=100.0).contains(&m)),
                _ => {}
            }
        }
        let fixed = QualitySelection::default().pick(&mut rng);
        assert_eq!(fixed, QualityFunction::Laplace);
    }
}
