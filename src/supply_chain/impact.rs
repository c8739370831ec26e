//! Supply-line impact aggregation.

use super::model::SupplyLineMatch;

/// Upper bound of every impact score.
pub const MAX_IMPACT_SCORE: f64 = 100.0;

/// Reduces the supply lines behind one edge to a single impact.
///
/// Implementations return a value in `[0, MAX_IMPACT_SCORE]`, or
/// `f64::NEG_INFINITY` when there is nothing to aggregate. Callers normalize
/// non-finite results to 0 before display.
pub trait ImpactAggregator {
	/// Impact of the lines behind one edge.
	fn aggregate(&self, matches: &[SupplyLineMatch]) -> f64;
}

impl<F> ImpactAggregator for F
where
	F: Fn(&[SupplyLineMatch]) -> f64,
{
	fn aggregate(&self, matches: &[SupplyLineMatch]) -> f64 {
		self(matches)
	}
}

/// Combines overlapping supply lines as independent failure chances, so two
/// moderate lines weigh more than either one alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct CombinedImpact;

impl ImpactAggregator for CombinedImpact {
	fn aggregate(&self, matches: &[SupplyLineMatch]) -> f64 {
		if matches.is_empty() {
			return f64::NEG_INFINITY;
		}
		let unaffected: f64 = matches
			.iter()
			.map(|m| {
				let share = if m.score.is_finite() {
					(m.score / MAX_IMPACT_SCORE).clamp(0.0, 1.0)
				} else {
					0.0
				};
				1.0 - share
			})
			.product();
		MAX_IMPACT_SCORE * (1.0 - unaffected)
	}
}
