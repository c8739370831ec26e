//! Impact → color mapping over a fixed diverging ramp.

use std::sync::OnceLock;

/// Number of entries in the ramp.
pub const RAMP_STEPS: usize = 101;

const HIGH_RISK: Rgb = Rgb(0xdc, 0x14, 0x3c); // crimson
const NEUTRAL: Rgb = Rgb(0x80, 0x80, 0x80); // gray
const LOW_RISK: Rgb = Rgb(0x22, 0x8b, 0x22); // forest green

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl Rgb {
	fn lerp(self, other: Rgb, t: f64) -> Rgb {
		let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
		Rgb(
			channel(self.0, other.0),
			channel(self.1, other.1),
			channel(self.2, other.2),
		)
	}

	fn hex(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
	}
}

/// The 101-step ramp: index 0 is the high-risk end, index 100 the low-risk end.
#[derive(Clone, Debug)]
pub struct ImpactRamp {
	colors: Vec<String>,
}

impl ImpactRamp {
	/// Build the ramp.
	pub fn new() -> Self {
		let half = (RAMP_STEPS - 1) as f64 / 2.0;
		let colors = (0..RAMP_STEPS)
			.map(|i| {
				let i = i as f64;
				let rgb = if i <= half {
					HIGH_RISK.lerp(NEUTRAL, i / half)
				} else {
					NEUTRAL.lerp(LOW_RISK, (i - half) / half)
				};
				rgb.hex()
			})
			.collect();
		Self { colors }
	}

	/// Process-wide ramp, built on first use.
	pub fn shared() -> &'static ImpactRamp {
		static RAMP: OnceLock<ImpactRamp> = OnceLock::new();
		RAMP.get_or_init(ImpactRamp::new)
	}

	/// All ramp colors as `#rrggbb`.
	pub fn colors(&self) -> &[String] {
		&self.colors
	}

	/// Ramp index for an impact fraction in `[0, 1]`. `NaN` counts as 0.
	pub fn index_for(fraction: f64) -> usize {
		let fraction = if fraction.is_nan() { 0.0 } else { fraction };
		let raw = ((1.0 - fraction) * RAMP_STEPS as f64).floor();
		raw.clamp(0.0, (RAMP_STEPS - 1) as f64) as usize
	}

	/// Color for an impact fraction, 1 being the highest risk.
	pub fn color_for_impact_fraction(&self, fraction: f64) -> &str {
		&self.colors[Self::index_for(fraction)]
	}
}

impl Default for ImpactRamp {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ramp_ends_and_midpoint() {
		let ramp = ImpactRamp::new();
		assert_eq!(ramp.colors().len(), RAMP_STEPS);
		assert_eq!(ramp.colors()[0], "#dc143c");
		assert_eq!(ramp.colors()[50], "#808080");
		assert_eq!(ramp.colors()[100], "#228b22");
	}

	#[test]
	fn full_impact_is_high_risk_and_none_is_low_risk() {
		let ramp = ImpactRamp::shared();
		assert_eq!(ramp.color_for_impact_fraction(1.0), "#dc143c");
		assert_eq!(ramp.color_for_impact_fraction(0.0), "#228b22");
	}

	#[test]
	fn index_is_clamped_and_monotonic() {
		assert_eq!(ImpactRamp::index_for(-0.5), 100);
		assert_eq!(ImpactRamp::index_for(2.0), 0);
		let mut previous = usize::MAX;
		for step in 0..=20 {
			let idx = ImpactRamp::index_for(step as f64 / 20.0);
			assert!(idx <= previous);
			previous = idx;
		}
	}

	#[test]
	fn undefined_fraction_maps_to_low_risk() {
		assert_eq!(ImpactRamp::index_for(f64::NAN), 100);
	}
}
