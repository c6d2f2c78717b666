use serde::Serialize;

pub const BUSINESS_DAYS_PER_YEAR: u32 = 252;

const FALLBACK_POLICY_RATE: f64 = 10.75;
const FALLBACK_INTERBANK_RATE: f64 = 10.9;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateSource {
    Published,
    Fallback,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRates {
    pub policy_rate: f64,
    pub interbank_rate: f64,
    pub source: RateSource,
}

/// Supplies default rates to the boundary layer. The projection engine never
/// sees this; callers resolve a rate first and pass it in as plain input.
pub trait ReferenceRateProvider: Send + Sync {
    fn reference_rates(&self) -> ReferenceRates;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct FallbackRates;

impl ReferenceRateProvider for FallbackRates {
    fn reference_rates(&self) -> ReferenceRates {
        ReferenceRates {
            policy_rate: FALLBACK_POLICY_RATE,
            interbank_rate: FALLBACK_INTERBANK_RATE,
            source: RateSource::Fallback,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct PublishedRates {
    pub policy_rate: f64,
    pub daily_interbank_rate: f64,
}

impl ReferenceRateProvider for PublishedRates {
    fn reference_rates(&self) -> ReferenceRates {
        let fallback = FallbackRates.reference_rates();
        let interbank = annualize_daily_rate(self.daily_interbank_rate, BUSINESS_DAYS_PER_YEAR);
        if !self.policy_rate.is_finite() || !interbank.is_finite() {
            return ReferenceRates {
                policy_rate: if self.policy_rate.is_finite() {
                    self.policy_rate
                } else {
                    fallback.policy_rate
                },
                interbank_rate: if interbank.is_finite() {
                    interbank
                } else {
                    fallback.interbank_rate
                },
                source: RateSource::Fallback,
            };
        }
        ReferenceRates {
            policy_rate: self.policy_rate,
            interbank_rate: interbank,
            source: RateSource::Published,
        }
    }
}

/// `((1 + d/100)^days - 1) * 100` for a daily rate `d` in percent.
pub fn annualize_daily_rate(daily_pct: f64, business_days: u32) -> f64 {
    ((1.0 + daily_pct / 100.0).powi(business_days as i32) - 1.0) * 100.0
}
