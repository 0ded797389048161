//! Named scenario presets.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::what_if::{NamedScenario, Scenario};

/// A built-in scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScenarioPreset {
    /// Display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// The shock.
    pub scenario: Scenario,
}

impl ScenarioPreset {
    const fn iv(name: &'static str, description: &'static str, iv_change_pct: Decimal) -> Self {
        Self {
            name,
            description,
            scenario: Scenario::new(Decimal::ZERO, iv_change_pct, 0),
        }
    }

    /// Convert to a named scenario.
    #[must_use]
    pub fn to_named(&self) -> NamedScenario {
        NamedScenario::new(self.name, self.scenario)
    }
}

/// Implied-volatility shocks, spot and time unchanged.
pub const IV_SHOCKS: [ScenarioPreset; 6] = [
    ScenarioPreset::iv("Mild Shock", "+10% IV increase", dec!(10)),
    ScenarioPreset::iv("Moderate Shock", "+25% IV increase", dec!(25)),
    ScenarioPreset::iv("Severe Shock", "+50% IV increase", dec!(50)),
    ScenarioPreset::iv("Extreme Shock", "+100% IV increase", dec!(100)),
    ScenarioPreset::iv("IV Crush", "-30% IV decrease", dec!(-30)),
    ScenarioPreset::iv("Severe Crush", "-50% IV decrease", dec!(-50)),
];

/// Combined spot/IV/time scenarios.
pub const QUICK_SCENARIOS: [ScenarioPreset; 4] = [
    ScenarioPreset {
        name: "Bull Case",
        description: "Strong upward movement with IV crush",
        scenario: Scenario::new(dec!(2.7), dec!(-20), 15),
    },
    ScenarioPreset {
        name: "Bear Case",
        description: "Downward movement with IV spike",
        scenario: Scenario::new(dec!(-2.7), dec!(30), 15),
    },
    ScenarioPreset {
        name: "Sideways",
        description: "Range-bound with time decay",
        scenario: Scenario::new(Decimal::ZERO, dec!(-10), 23),
    },
    ScenarioPreset {
        name: "Volatility Spike",
        description: "High volatility environment",
        scenario: Scenario::new(Decimal::ZERO, dec!(50), 10),
    },
];

/// Every preset as a named scenario, IV shocks first.
#[must_use]
pub fn all_presets() -> Vec<NamedScenario> {
    IV_SHOCKS
        .iter()
        .chain(QUICK_SCENARIOS.iter())
        .map(ScenarioPreset::to_named)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iv_shocks_only_move_iv() {
        for preset in &IV_SHOCKS {
            assert!(preset.scenario.spot_change_pct.is_zero());
            assert_eq!(preset.scenario.time_decay_days, 0);
            assert!(!preset.scenario.is_neutral());
        }
        assert_eq!(IV_SHOCKS[4].name, "IV Crush");
        assert_eq!(IV_SHOCKS[4].scenario.iv_change_pct, dec!(-30));
    }

    #[test]
    fn test_all_presets_are_named_and_unique() {
        let presets = all_presets();
        assert_eq!(presets.len(), 10);
        let mut names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }
}
