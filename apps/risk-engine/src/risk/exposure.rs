//! Portfolio Greeks aggregation and exposure classification.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::config::{GreekLimit, GreekLimits};
use crate::error::{EngineError, EngineResult, LegDefect};
use crate::options::{Greeks, Leg};

/// A leg excluded from aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedLeg {
    /// Position of the leg in the input.
    pub index: usize,
    /// Why it was rejected.
    #[serde(serialize_with = "serialize_display")]
    pub defect: LegDefect,
}

impl RejectedLeg {
    /// The rejection as an engine error.
    #[must_use]
    pub fn to_error(&self) -> EngineError {
        EngineError::InvalidLeg {
            index: Some(self.index),
            defect: self.defect.clone(),
        }
    }
}

fn serialize_display<S: Serializer>(defect: &LegDefect, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(defect)
}

/// Portfolio Greeks plus any legs that could not be included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GreeksAggregation {
    /// Quantity-weighted Greeks over the valid legs.
    pub greeks: Greeks,
    /// Legs skipped because they failed validation.
    pub rejected_legs: Vec<RejectedLeg>,
}

impl GreeksAggregation {
    /// Whether every leg contributed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected_legs.is_empty()
    }
}

/// Sum per-unit leg Greeks scaled by signed quantity.
///
/// Invalid legs are skipped and listed in `rejected_legs`; the remaining
/// legs still produce a portfolio figure.
#[must_use]
pub fn aggregate(legs: &[Leg]) -> GreeksAggregation {
    let mut greeks = Greeks::ZERO;
    let mut rejected_legs = Vec::new();

    for (index, leg) in legs.iter().enumerate() {
        match leg.validate() {
            Ok(()) => greeks = greeks.add(&leg.position_greeks()),
            Err(defect) => {
                warn!(index, %defect, "Leg excluded from Greeks aggregation");
                rejected_legs.push(RejectedLeg { index, defect });
            }
        }
    }

    debug!(
        legs = legs.len(),
        rejected = rejected_legs.len(),
        delta = %greeks.delta,
        vega = %greeks.vega,
        "Aggregated Greeks"
    );

    GreeksAggregation {
        greeks,
        rejected_legs,
    }
}

/// Exposure band for a single Greek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExposureLevel {
    /// `|value| <= safe`.
    Safe,
    /// `safe < |value| <= warning`.
    Caution,
    /// `|value| > warning`.
    Danger,
}

impl std::fmt::Display for ExposureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Caution => write!(f, "CAUTION"),
            Self::Danger => write!(f, "DANGER"),
        }
    }
}

/// Classification of one Greek against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GreekExposure {
    /// Portfolio value.
    pub value: Decimal,
    /// Band.
    pub level: ExposureLevel,
    /// `|value| / max` in percent, capped at 100.
    pub utilization_pct: Decimal,
}

impl GreekExposure {
    fn classify(value: Decimal, limit: &GreekLimit) -> Self {
        let magnitude = value.abs();
        let level = if magnitude <= limit.safe {
            ExposureLevel::Safe
        } else if magnitude <= limit.warning {
            ExposureLevel::Caution
        } else {
            ExposureLevel::Danger
        };
        let utilization_pct =
            (magnitude / limit.max * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED);
        Self {
            value,
            level,
            utilization_pct,
        }
    }
}

/// Classification of all four Greeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GreeksExposure {
    /// Delta exposure.
    pub delta: GreekExposure,
    /// Gamma exposure.
    pub gamma: GreekExposure,
    /// Theta exposure.
    pub theta: GreekExposure,
    /// Vega exposure.
    pub vega: GreekExposure,
}

impl GreeksExposure {
    /// The most severe band across the four Greeks.
    #[must_use]
    pub fn worst(&self) -> ExposureLevel {
        [self.delta, self.gamma, self.theta, self.vega]
            .iter()
            .map(|e| e.level)
            .max()
            .unwrap_or(ExposureLevel::Safe)
    }
}

/// Classify portfolio Greeks against configured limits.
///
/// # Errors
///
/// Returns `Configuration` when the limits are inconsistent.
pub fn classify(greeks: &Greeks, limits: &GreekLimits) -> EngineResult<GreeksExposure> {
    limits.validate()?;
    Ok(GreeksExposure {
        delta: GreekExposure::classify(greeks.delta, &limits.delta),
        gamma: GreekExposure::classify(greeks.gamma, &limits.gamma),
        theta: GreekExposure::classify(greeks.theta, &limits.theta),
        vega: GreekExposure::classify(greeks.vega, &limits.vega),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limits() -> GreekLimits {
        GreekLimits {
            delta: GreekLimit::new(dec!(50), dec!(100), dec!(200)),
            gamma: GreekLimit::new(dec!(1), dec!(2), dec!(4)),
            theta: GreekLimit::new(dec!(500), dec!(1000), dec!(2000)),
            vega: GreekLimit::new(dec!(500), dec!(1000), dec!(2000)),
        }
    }

    #[test]
    fn test_aggregate_scales_by_signed_quantity() {
        let legs = vec![
            Leg::call(dec!(100), -50, dec!(5)).with_greeks(Greeks::new(
                dec!(0.5),
                dec!(0.01),
                dec!(-2),
                dec!(8),
            )),
            Leg::call(dec!(110), 50, dec!(2)).with_greeks(Greeks::new(
                dec!(0.3),
                dec!(0.008),
                dec!(-1.5),
                dec!(6),
            )),
        ];
        let agg = aggregate(&legs);
        assert!(agg.is_complete());
        assert_eq!(agg.greeks.delta, dec!(-10));
        assert_eq!(agg.greeks.gamma, dec!(-0.1));
        assert_eq!(agg.greeks.theta, dec!(25));
        assert_eq!(agg.greeks.vega, dec!(-100));
    }

    #[test]
    fn test_aggregate_skips_and_reports_invalid_legs() {
        let legs = vec![
            Leg::put(dec!(100), 2, dec!(1)).with_greeks(Greeks::new(
                dec!(-0.4),
                dec!(0.02),
                dec!(-1),
                dec!(5),
            )),
            Leg::put(dec!(100), 0, dec!(1)).with_greeks(Greeks::new(
                dec!(-1),
                dec!(1),
                dec!(1),
                dec!(1),
            )),
        ];
        let agg = aggregate(&legs);
        assert_eq!(agg.greeks.delta, dec!(-0.8));
        assert_eq!(agg.rejected_legs.len(), 1);
        assert_eq!(agg.rejected_legs[0].index, 1);
        assert_eq!(
            agg.rejected_legs[0].to_error(),
            EngineError::InvalidLeg {
                index: Some(1),
                defect: LegDefect::ZeroQuantity,
            }
        );
    }

    #[test]
    fn test_aggregate_empty_is_zero() {
        let agg = aggregate(&[]);
        assert_eq!(agg.greeks, Greeks::ZERO);
        assert!(agg.is_complete());
    }

    #[test]
    fn test_classify_bands() {
        let greeks = Greeks::new(dec!(-50), dec!(1.5), dec!(-3000), dec!(0));
        let exposure = classify(&greeks, &limits()).unwrap();
        assert_eq!(exposure.delta.level, ExposureLevel::Safe);
        assert_eq!(exposure.delta.utilization_pct, dec!(25));
        assert_eq!(exposure.gamma.level, ExposureLevel::Caution);
        assert_eq!(exposure.theta.level, ExposureLevel::Danger);
        assert_eq!(exposure.theta.utilization_pct, dec!(100));
        assert_eq!(exposure.vega.level, ExposureLevel::Safe);
        assert_eq!(exposure.worst(), ExposureLevel::Danger);
    }

    #[test]
    fn test_classify_rejects_inconsistent_limits() {
        let mut bad = limits();
        bad.vega = GreekLimit::new(dec!(0), dec!(1), dec!(2));
        assert!(matches!(
            classify(&Greeks::ZERO, &bad),
            Err(EngineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_rejected_leg_serializes_reason() {
        let rejected = RejectedLeg {
            index: 3,
            defect: LegDefect::MissingStrike,
        };
        let json = serde_json::to_string(&rejected).unwrap();
        assert_eq!(json, r#"{"index":3,"defect":"option leg is missing a strike"}"#);
    }
}
