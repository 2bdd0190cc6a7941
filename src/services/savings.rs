//! Closed-form savings estimate shown on the pricing page

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::types::Violations;

/// Savings rate with no connected devices
pub const BASE_RATE: f64 = 0.15;
/// Extra rate per connected device
pub const DEVICE_BONUS: f64 = 0.02;
/// Rate ceiling
pub const MAX_RATE: f64 = 0.40;
/// Kilograms of CO2 avoided per dollar saved
pub const CO2_KG_PER_DOLLAR: f64 = 0.85;
/// Most devices the calculator accepts
pub const MAX_DEVICES: u32 = 50;

/// Body of `POST /api/calculator/savings`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SavingsRequest {
    /// Current monthly energy bill in dollars
    pub monthly_bill: f64,
    /// Connected devices
    #[serde(default)]
    pub devices: u32,
}

/// Estimated savings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SavingsEstimate {
    /// Fraction of the bill saved
    pub savings_rate: f64,
    /// Dollars saved per month
    pub monthly_savings: f64,
    /// Dollars saved per year
    pub annual_savings: f64,
    /// Kilograms of CO2 avoided per year
    pub co2_reduction_kg: f64,
}

/// `rate = min(BASE_RATE + DEVICE_BONUS * devices, MAX_RATE)`
pub fn savings_rate(devices: u32) -> f64 {
    (BASE_RATE + DEVICE_BONUS * f64::from(devices)).min(MAX_RATE)
}

/// Estimate savings for a bill and device count
pub fn estimate(req: SavingsRequest) -> Result<SavingsEstimate> {
    Violations::new()
        .check(
            req.monthly_bill.is_finite() && req.monthly_bill > 0.0,
            "monthly_bill",
            "must be greater than 0",
        )
        .check(
            req.devices <= MAX_DEVICES,
            "devices",
            format!("must be between 0 and {}", MAX_DEVICES),
        )
        .finish()?;

    let rate = savings_rate(req.devices);
    let monthly = req.monthly_bill * rate;
    let annual = monthly * 12.0;

    Ok(SavingsEstimate {
        savings_rate: rate,
        monthly_savings: round2(monthly),
        annual_savings: round2(annual),
        co2_reduction_kg: round2(annual * CO2_KG_PER_DOLLAR),
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
