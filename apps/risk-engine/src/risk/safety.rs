//! Pre-trade safety checklist.
//!
//! A fixed set of rules over one strategy. Warnings that need a human
//! decision carry `requires_ack`; the checklist is complete once every one
//! of them has been acknowledged.
//!
//! A short call is naked when short call units exceed long call units plus
//! long stock units. A short put is naked when short put units exceed long
//! put units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SafetyConfig;
use crate::error::EngineResult;
use crate::options::{ControlLimit, InstrumentType, Strategy};

/// Checklist rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    /// Short options without offsetting long exposure.
    UnhedgedLegs,
    /// Neither stop loss nor take profit is enabled.
    #[serde(rename = "no_sl_tp")]
    NoRiskControls,
    /// Margin usage above the configured bound.
    HighMargin,
    /// Take profit too small relative to stop loss.
    #[serde(rename = "poor_rr")]
    PoorRiskReward,
    /// Implied volatility above the configured level.
    HighIv,
    /// Expiry too close or too far away.
    #[serde(rename = "time_warning")]
    TimeToExpiry,
    /// Stop loss is enabled.
    #[serde(rename = "sl_configured")]
    StopLossConfigured,
    /// Take profit is enabled.
    #[serde(rename = "tp_configured")]
    TakeProfitConfigured,
}

/// How the item should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Blocking problem.
    Error,
    /// Needs attention.
    Warning,
    /// Informational.
    Info,
    /// Passed check.
    Success,
}

/// Severity of a checklist item, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSeverity {
    /// Must be fixed or explicitly accepted.
    Critical,
    /// High.
    High,
    /// Medium.
    Medium,
    /// Low.
    Low,
    /// Passed check.
    None,
}

/// One checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Rule that produced the item.
    pub id: CheckId,
    /// Presentation kind.
    pub kind: CheckKind,
    /// Severity.
    pub severity: CheckSeverity,
    /// Short title.
    pub title: String,
    /// One-line description.
    pub description: String,
    /// Whether a user must acknowledge the item before deploying.
    pub requires_ack: bool,
}

/// Checklist for one strategy, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyChecklist {
    /// Strategy the checklist was built for.
    pub strategy_id: String,
    /// Items in rule order.
    pub items: Vec<ChecklistItem>,
}

impl SafetyChecklist {
    /// Items that need acknowledgment.
    pub fn requiring_ack(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(|item| item.requires_ack)
    }

    /// Items still waiting for acknowledgment.
    #[must_use]
    pub fn pending(&self, acknowledged: &[CheckId]) -> Vec<&ChecklistItem> {
        self.requiring_ack()
            .filter(|item| !acknowledged.contains(&item.id))
            .collect()
    }

    /// Whether every item that needs acknowledgment has it.
    #[must_use]
    pub fn is_complete(&self, acknowledged: &[CheckId]) -> bool {
        self.pending(acknowledged).is_empty()
    }

    /// Whether a rule fired.
    #[must_use]
    pub fn contains(&self, id: CheckId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }
}

/// Build the safety checklist for `strategy`.
///
/// # Errors
///
/// Returns `InvalidLeg` for a malformed leg and `Configuration` for invalid
/// thresholds.
pub fn safety_checklist(
    strategy: &Strategy,
    config: &SafetyConfig,
) -> EngineResult<SafetyChecklist> {
    config.validate()?;
    strategy.ensure_valid_legs()?;

    let mut items = Vec::new();

    let naked = naked_legs(strategy);
    if !naked.is_empty() {
        items.push(warning(
            CheckId::UnhedgedLegs,
            CheckKind::Warning,
            CheckSeverity::High,
            "Unhedged Legs Detected",
            format!("{} legs may be unhedged: {}", naked.len(), naked.join(", ")),
        ));
    }

    let controls = strategy.risk_controls.as_ref();
    let stop_loss = enabled(controls.and_then(|c| c.stop_loss.as_ref()));
    let take_profit = enabled(controls.and_then(|c| c.take_profit.as_ref()));
    if stop_loss.is_none() && take_profit.is_none() {
        items.push(warning(
            CheckId::NoRiskControls,
            CheckKind::Error,
            CheckSeverity::Critical,
            "No Stop Loss or Take Profit",
            "Strategy has no risk controls configured".to_string(),
        ));
    }

    let margin_pct = strategy.margin_used_pct();
    if margin_pct > config.max_margin_pct {
        items.push(warning(
            CheckId::HighMargin,
            CheckKind::Warning,
            CheckSeverity::Medium,
            "High Margin Usage",
            format!(
                "Margin usage at {}% of available capital",
                margin_pct.round_dp(1)
            ),
        ));
    }

    let margin = strategy.total_margin();
    let risk_reward = risk_reward(
        stop_loss.and_then(|c| c.threshold(margin)),
        take_profit.and_then(|c| c.threshold(margin)),
    );
    if risk_reward < config.min_risk_reward {
        items.push(warning(
            CheckId::PoorRiskReward,
            CheckKind::Warning,
            CheckSeverity::Medium,
            "Poor Risk:Reward Ratio",
            format!(
                "Current R:R is 1:{}, consider adjusting targets",
                risk_reward.round_dp(2)
            ),
        ));
    }

    if strategy.implied_volatility > config.high_iv {
        items.push(ChecklistItem {
            id: CheckId::HighIv,
            kind: CheckKind::Info,
            severity: CheckSeverity::Low,
            title: "High IV Environment".to_string(),
            description: format!(
                "IV of {}% is elevated, consider impact on strategy performance",
                strategy.implied_volatility
            ),
            requires_ack: false,
        });
    }

    let days = strategy.days_to_expiry;
    if days < config.near_expiry_days {
        items.push(warning(
            CheckId::TimeToExpiry,
            CheckKind::Warning,
            CheckSeverity::Medium,
            "Near Expiry Warning",
            format!("Only {days} days to expiry, theta decay will accelerate"),
        ));
    } else if days > config.long_expiry_days {
        items.push(warning(
            CheckId::TimeToExpiry,
            CheckKind::Warning,
            CheckSeverity::Medium,
            "Long Time to Expiry",
            format!("{days} days to expiry, consider shorter-term alternatives"),
        ));
    }

    if let Some(control) = stop_loss {
        items.push(passed(
            CheckId::StopLossConfigured,
            "Stop Loss Configured",
            format!("SL set at {}", describe(control)),
        ));
    }
    if let Some(control) = take_profit {
        items.push(passed(
            CheckId::TakeProfitConfigured,
            "Take Profit Configured",
            format!("TP set at {}", describe(control)),
        ));
    }

    debug!(
        strategy_id = %strategy.id,
        items = items.len(),
        needs_ack = items.iter().filter(|i| i.requires_ack).count(),
        "Built safety checklist"
    );

    Ok(SafetyChecklist {
        strategy_id: strategy.id.clone(),
        items,
    })
}

fn naked_legs(strategy: &Strategy) -> Vec<&'static str> {
    let units = |kind: InstrumentType, long: bool| -> Decimal {
        strategy
            .legs
            .iter()
            .filter(|l| l.instrument_type == kind && l.is_long() == long)
            .map(|l| l.units())
            .sum()
    };

    let mut naked = Vec::new();
    let call_cover = units(InstrumentType::Call, true) + units(InstrumentType::Stock, true);
    if units(InstrumentType::Call, false) > call_cover {
        naked.push("Naked Call");
    }
    if units(InstrumentType::Put, false) > units(InstrumentType::Put, true) {
        naked.push("Naked Put");
    }
    naked
}

fn enabled(control: Option<&ControlLimit>) -> Option<&ControlLimit> {
    control.filter(|c| c.enabled)
}

/// `take_profit / stop_loss`, zero when either is missing or the stop is zero.
fn risk_reward(stop_loss: Option<Decimal>, take_profit: Option<Decimal>) -> Decimal {
    match (stop_loss, take_profit) {
        (Some(sl), Some(tp)) => tp.checked_div(sl).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

fn describe(control: &ControlLimit) -> String {
    if control.is_fixed_amount {
        control.fixed_amount.abs().to_string()
    } else {
        format!("{}% of margin", control.percentage)
    }
}

fn warning(
    id: CheckId,
    kind: CheckKind,
    severity: CheckSeverity,
    title: &str,
    description: String,
) -> ChecklistItem {
    ChecklistItem {
        id,
        kind,
        severity,
        title: title.to_string(),
        description,
        requires_ack: true,
    }
}

fn passed(id: CheckId, title: &str, description: String) -> ChecklistItem {
    ChecklistItem {
        id,
        kind: CheckKind::Success,
        severity: CheckSeverity::None,
        title: title.to_string(),
        description,
        requires_ack: false,
    }
}
