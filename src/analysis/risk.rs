use crate::models::insight::{
    CategoryRecommendation, RecommendationCategory, RiskAssessmentResult, RiskFactor, RiskLevel,
    StrengthInputMode,
};
use crate::models::profile::ProfileSnapshot;
use chrono::{DateTime, Utc};

const QUAD_MIN_PERCENT: f64 = 80.0; // of bodyweight
const HAMSTRING_MIN_PERCENT: f64 = 50.0; // of bodyweight
const LSI_MIN_PERCENT: f64 = 90.0;
const RETURN_TO_SPORT_MONTHS: f64 = 6.0;

const MAX_RISK_SCORE: u32 = 100;
const HIGH_RISK_SCORE: u32 = 70;
const MODERATE_RISK_SCORE: u32 = 40;

const MILLIS_PER_MONTH: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Derived percentages for one profile.
#[derive(Debug, Clone, Copy)]
struct RiskMetrics {
    quad_percent: f64,
    hamstring_percent: f64,
    quad_lsi: f64,
    hamstring_lsi: f64,
    average_lsi: f64,
    months_since_surgery: Option<f64>,
}

impl RiskMetrics {
    fn from_profile(profile: &ProfileSnapshot, mode: StrengthInputMode, now: DateTime<Utc>) -> Self {
        let (quad, hamstring) = match mode {
            StrengthInputMode::Legacy => (profile.quad_strength, profile.hamstring_strength),
            StrengthInputMode::InjuredLimb => {
                (profile.injured_quad_strength, profile.injured_hamstring_strength)
            }
        };

        let quad_lsi = percent_of(profile.injured_quad_strength, profile.non_injured_quad_strength);
        let hamstring_lsi = percent_of(
            profile.injured_hamstring_strength,
            profile.non_injured_hamstring_strength,
        );

        Self {
            quad_percent: percent_of(quad, profile.bodyweight),
            hamstring_percent: percent_of(hamstring, profile.bodyweight),
            quad_lsi,
            hamstring_lsi,
            average_lsi: (quad_lsi + hamstring_lsi) / 2.0,
            months_since_surgery: profile
                .surgery_date
                .map(|date| (now - date).num_milliseconds() as f64 / MILLIS_PER_MONTH),
        }
    }
}

/// A factor with a high band and a moderate band just above it.
struct BandRule {
    factor: &'static str,
    metric: fn(&RiskMetrics) -> Option<f64>,
    describe: fn(f64) -> String,
    high_below: f64,
    high_weight: u32,
    high_threshold: &'static str,
    moderate_below: f64,
    moderate_weight: u32,
    moderate_threshold: &'static str,
}

const RULES: [BandRule; 4] = [
    BandRule {
        factor: "Quad Strength",
        metric: quad_percent,
        describe: percent_of_bodyweight,
        high_below: QUAD_MIN_PERCENT,
        high_weight: 30,
        high_threshold: "80%",
        moderate_below: QUAD_MIN_PERCENT + 10.0,
        moderate_weight: 15,
        moderate_threshold: "80%",
    },
    BandRule {
        factor: "Hamstring Strength",
        metric: hamstring_percent,
        describe: percent_of_bodyweight,
        high_below: HAMSTRING_MIN_PERCENT,
        high_weight: 25,
        high_threshold: "50%",
        moderate_below: HAMSTRING_MIN_PERCENT + 10.0,
        moderate_weight: 12,
        moderate_threshold: "50%",
    },
    BandRule {
        factor: "Limb Symmetry Index",
        metric: average_lsi,
        describe: plain_percent,
        high_below: LSI_MIN_PERCENT,
        high_weight: 25,
        high_threshold: "90%",
        moderate_below: LSI_MIN_PERCENT + 5.0,
        moderate_weight: 12,
        moderate_threshold: "90%",
    },
    BandRule {
        factor: "Time Since Surgery",
        metric: months_since_surgery,
        describe: months,
        high_below: RETURN_TO_SPORT_MONTHS,
        high_weight: 20,
        high_threshold: "6 months",
        moderate_below: 9.0,
        moderate_weight: 10,
        moderate_threshold: "9 months",
    },
];

fn quad_percent(m: &RiskMetrics) -> Option<f64> {
    Some(m.quad_percent)
}

fn hamstring_percent(m: &RiskMetrics) -> Option<f64> {
    Some(m.hamstring_percent)
}

fn average_lsi(m: &RiskMetrics) -> Option<f64> {
    Some(m.average_lsi)
}

fn months_since_surgery(m: &RiskMetrics) -> Option<f64> {
    m.months_since_surgery
}

fn percent_of_bodyweight(value: f64) -> String {
    format!("{value:.1}% of bodyweight")
}

fn plain_percent(value: f64) -> String {
    format!("{value:.1}%")
}

fn months(value: f64) -> String {
    format!("{value:.1} months")
}

impl BandRule {
    fn evaluate(&self, metrics: &RiskMetrics) -> Option<(u32, RiskFactor)> {
        let value = (self.metric)(metrics)?;

        let (weight, threshold, risk) = if value < self.high_below {
            (self.high_weight, self.high_threshold, RiskLevel::High)
        } else if value < self.moderate_below {
            (self.moderate_weight, self.moderate_threshold, RiskLevel::Moderate)
        } else {
            return None;
        };

        Some((
            weight,
            RiskFactor {
                factor: self.factor.to_string(),
                value: (self.describe)(value),
                threshold: threshold.to_string(),
                risk,
            },
        ))
    }
}

/// Score a profile snapshot. Pure: the same inputs always give the same result.
pub fn assess_risk(
    profile: &ProfileSnapshot,
    mode: StrengthInputMode,
    now: DateTime<Utc>,
) -> RiskAssessmentResult {
    let metrics = RiskMetrics::from_profile(profile, mode, now);

    let mut total = 0;
    let mut factors = Vec::new();
    for rule in &RULES {
        if let Some((weight, factor)) = rule.evaluate(&metrics) {
            total += weight;
            factors.push(factor);
        }
    }

    let risk_score = total.min(MAX_RISK_SCORE);

    RiskAssessmentResult {
        risk_score,
        risk_level: risk_level(risk_score),
        factors,
        recommendations: recommendations(&metrics),
    }
}

pub fn risk_level(risk_score: u32) -> RiskLevel {
    if risk_score >= HIGH_RISK_SCORE {
        RiskLevel::High
    } else if risk_score >= MODERATE_RISK_SCORE {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// `numerator / denominator * 100`, or 0 when either side is missing or zero.
pub fn percent_of(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    match (numerator, denominator) {
        (Some(n), Some(d)) if n != 0.0 && d != 0.0 && n.is_finite() && d.is_finite() => n / d * 100.0,
        _ => 0.0,
    }
}

// Only high-band conditions produce advice; the symmetry check looks at each
// limb ratio rather than the average.
fn recommendations(metrics: &RiskMetrics) -> Vec<CategoryRecommendation> {
    let mut out = Vec::new();

    if metrics.quad_percent < QUAD_MIN_PERCENT {
        out.push(high_priority(
            RecommendationCategory::Strength,
            "Focus on quad strengthening exercises. Consider increasing resistance in leg press and squat variations.",
        ));
    }

    if metrics.hamstring_percent < HAMSTRING_MIN_PERCENT {
        out.push(high_priority(
            RecommendationCategory::Strength,
            "Prioritize hamstring strengthening. Include Nordic curls and hamstring curls in your routine.",
        ));
    }

    if metrics.quad_lsi < LSI_MIN_PERCENT || metrics.hamstring_lsi < LSI_MIN_PERCENT {
        out.push(high_priority(
            RecommendationCategory::Symmetry,
            "Focus on single-leg exercises to improve limb symmetry. Consider reducing load on the non-injured leg.",
        ));
    }

    if metrics
        .months_since_surgery
        .is_some_and(|months| months < RETURN_TO_SPORT_MONTHS)
    {
        out.push(high_priority(
            RecommendationCategory::Timing,
            "Avoid high-impact activities and focus on controlled strengthening exercises.",
        ));
    }

    out
}

fn high_priority(category: RecommendationCategory, text: &str) -> CategoryRecommendation {
    CategoryRecommendation {
        priority: RiskLevel::High,
        category,
        recommendation: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn post_op_profile() -> ProfileSnapshot {
        ProfileSnapshot {
            surgery_date: Some(now() - Duration::days(120)),
            bodyweight: Some(150.0),
            quad_strength: None,
            hamstring_strength: None,
            injured_quad_strength: Some(100.0),
            non_injured_quad_strength: Some(130.0),
            injured_hamstring_strength: Some(60.0),
            non_injured_hamstring_strength: Some(80.0),
            quad_lsi: None,
        }
    }

    fn factor<'a>(result: &'a RiskAssessmentResult, name: &str) -> Option<&'a RiskFactor> {
        result.factors.iter().find(|f| f.factor == name)
    }

    #[test]
    fn zero_denominators_yield_zero_percent() {
        assert_eq!(percent_of(Some(120.0), Some(0.0)), 0.0);
        assert_eq!(percent_of(Some(120.0), None), 0.0);
        assert_eq!(percent_of(None, Some(150.0)), 0.0);
        assert_eq!(percent_of(Some(0.0), Some(150.0)), 0.0);
    }

    #[test]
    fn zero_bodyweight_registers_high_strength_risk() {
        let profile = ProfileSnapshot {
            bodyweight: Some(0.0),
            quad_strength: Some(140.0),
            hamstring_strength: Some(90.0),
            ..post_op_profile()
        };

        for mode in [StrengthInputMode::Legacy, StrengthInputMode::InjuredLimb] {
            let result = assess_risk(&profile, mode, now());
            let quad = factor(&result, "Quad Strength").expect("quad factor");
            assert_eq!(quad.value, "0.0% of bodyweight");
            assert_eq!(quad.risk, RiskLevel::High);
            let hamstring = factor(&result, "Hamstring Strength").expect("hamstring factor");
            assert_eq!(hamstring.value, "0.0% of bodyweight");
            assert_eq!(hamstring.risk, RiskLevel::High);
        }
    }

    #[test]
    fn all_high_factors_sum_exactly_to_the_cap() {
        let result = assess_risk(&post_op_profile(), StrengthInputMode::Legacy, now());
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.factors.len(), 4);
        assert!(result.factors.iter().all(|f| f.risk == RiskLevel::High));
    }

    #[test]
    fn risk_level_bands_are_inclusive_at_the_lower_bound() {
        assert_eq!(risk_level(69), RiskLevel::Moderate);
        assert_eq!(risk_level(70), RiskLevel::High);
        assert_eq!(risk_level(39), RiskLevel::Low);
        assert_eq!(risk_level(40), RiskLevel::Moderate);
        assert_eq!(risk_level(0), RiskLevel::Low);
    }

    #[test]
    fn post_op_profile_in_legacy_mode() {
        let result = assess_risk(&post_op_profile(), StrengthInputMode::Legacy, now());

        let lsi = factor(&result, "Limb Symmetry Index").expect("lsi factor");
        assert_eq!(lsi.value, "76.0%");
        assert_eq!(lsi.risk, RiskLevel::High);

        let timing = factor(&result, "Time Since Surgery").expect("timing factor");
        assert_eq!(timing.value, "4.0 months");
        assert_eq!(timing.threshold, "6 months");

        // Flat strength fields are absent, so both strength checks read 0%.
        assert_eq!(
            factor(&result, "Quad Strength").map(|f| f.value.as_str()),
            Some("0.0% of bodyweight")
        );
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn post_op_profile_in_injured_limb_mode() {
        let result = assess_risk(&post_op_profile(), StrengthInputMode::InjuredLimb, now());

        assert_eq!(
            factor(&result, "Quad Strength").map(|f| f.value.as_str()),
            Some("66.7% of bodyweight")
        );
        assert_eq!(
            factor(&result, "Hamstring Strength").map(|f| f.value.as_str()),
            Some("40.0% of bodyweight")
        );
        assert_eq!(result.risk_score, 100);
    }

    #[test]
    fn modes_diverge_for_a_strong_late_profile() {
        let profile = ProfileSnapshot {
            surgery_date: Some(now() - Duration::days(365)),
            bodyweight: Some(150.0),
            quad_strength: None,
            hamstring_strength: None,
            injured_quad_strength: Some(140.0),
            non_injured_quad_strength: Some(145.0),
            injured_hamstring_strength: Some(95.0),
            non_injured_hamstring_strength: Some(97.0),
            quad_lsi: None,
        };

        let legacy = assess_risk(&profile, StrengthInputMode::Legacy, now());
        assert_eq!(legacy.risk_score, 55);
        assert_eq!(legacy.risk_level, RiskLevel::Moderate);
        assert_eq!(legacy.recommendations.len(), 2);

        let corrected = assess_risk(&profile, StrengthInputMode::InjuredLimb, now());
        assert_eq!(corrected.risk_score, 0);
        assert_eq!(corrected.risk_level, RiskLevel::Low);
        assert!(corrected.factors.is_empty());
        assert!(corrected.recommendations.is_empty());
    }

    #[test]
    fn moderate_bands_carry_lower_weights() {
        let profile = ProfileSnapshot {
            surgery_date: Some(now() - Duration::days(210)),
            bodyweight: Some(100.0),
            quad_strength: Some(85.0),
            hamstring_strength: Some(55.0),
            injured_quad_strength: Some(92.0),
            non_injured_quad_strength: Some(100.0),
            injured_hamstring_strength: Some(93.0),
            non_injured_hamstring_strength: Some(100.0),
            quad_lsi: None,
        };

        let result = assess_risk(&profile, StrengthInputMode::Legacy, now());

        assert_eq!(result.risk_score, 15 + 12 + 12 + 10);
        assert_eq!(result.risk_level, RiskLevel::Moderate);
        assert!(result.factors.iter().all(|f| f.risk == RiskLevel::Moderate));
        assert_eq!(
            factor(&result, "Time Since Surgery").map(|f| f.threshold.as_str()),
            Some("9 months")
        );
        // Moderate bands never produce advice.
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn symmetry_advice_checks_each_limb_ratio() {
        let profile = ProfileSnapshot {
            surgery_date: Some(now() - Duration::days(400)),
            bodyweight: Some(100.0),
            quad_strength: Some(120.0),
            hamstring_strength: Some(80.0),
            injured_quad_strength: Some(85.0),
            non_injured_quad_strength: Some(100.0),
            injured_hamstring_strength: Some(100.0),
            non_injured_hamstring_strength: Some(100.0),
            quad_lsi: None,
        };

        let result = assess_risk(&profile, StrengthInputMode::Legacy, now());

        // Average LSI 92.5% is only a moderate factor...
        assert_eq!(
            factor(&result, "Limb Symmetry Index").map(|f| f.risk),
            Some(RiskLevel::Moderate)
        );
        // ...but the quad ratio alone is below 90%.
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].category, RecommendationCategory::Symmetry);
        assert_eq!(result.recommendations[0].priority, RiskLevel::High);
    }

    #[test]
    fn missing_surgery_date_skips_timing() {
        let profile = ProfileSnapshot {
            surgery_date: None,
            ..post_op_profile()
        };
        let result = assess_risk(&profile, StrengthInputMode::Legacy, now());
        assert!(factor(&result, "Time Since Surgery").is_none());
        assert!(!result
            .recommendations
            .iter()
            .any(|r| r.category == RecommendationCategory::Timing));
        assert_eq!(result.risk_score, 80);
    }
}
