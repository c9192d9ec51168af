//! Verdict calibration.
//!
//! Deterministic arithmetic that turns the model's raw 0–100 score, the
//! red-flag count, and the category into the final reported probability.
//! The constants are hand-tuned for behavioral compatibility with the
//! deployed system; they live in [`CalibrationWeights`] so they can be
//! revisited without touching the blending structure.

use crate::verdict::{FinalLabel, ScamCategory, Verdict};

/// Tunable constants for the calibration blend.
#[derive(Debug, Clone)]
pub struct CalibrationWeights {
    /// Weight of the model's raw probability in the first blend.
    pub raw_weight: f64,
    /// Weight of the flag-derived score in the first blend.
    pub flag_weight: f64,
    /// Additive bonus per red flag, rewarding explicit evidence.
    pub flag_bonus: f64,
    /// Flag count at which the flag score saturates.
    pub flag_saturation: usize,
    /// Hard ceiling for `normal message` verdicts, a safety rail against a
    /// model being confidently wrong about innocuous text.
    pub normal_message_cap: f64,
    /// Weight of the calibrated probability when blending in a local
    /// classifier score.
    pub llm_blend_weight: f64,
    /// Weight of the local classifier score in that blend.
    pub local_blend_weight: f64,
}

impl Default for CalibrationWeights {
    fn default() -> Self {
        Self {
            raw_weight: 0.70,
            flag_weight: 0.30,
            flag_bonus: 4.0,
            flag_saturation: 5,
            normal_message_cap: 15.0,
            llm_blend_weight: 0.60,
            local_blend_weight: 0.40,
        }
    }
}

impl CalibrationWeights {
    /// Per-category risk multiplier. Unknown categories cannot occur here
    /// (the parser coerces into the closed set), so every variant is listed.
    pub fn category_weight(&self, category: ScamCategory) -> f64 {
        match category {
            ScamCategory::BankScam => 1.10,
            ScamCategory::Phishing => 1.08,
            ScamCategory::LotteryScam => 1.05,
            ScamCategory::JobScam => 1.03,
            ScamCategory::CourierScam => 1.02,
            ScamCategory::NormalMessage => 0.85,
        }
    }

    /// Calibrate a raw model score into the final probability in [0, 1].
    ///
    /// Steps, in order: linear flag score saturating at
    /// `flag_saturation` flags, 70/30 blend favoring the model's own
    /// judgment, multiplicative category weight plus additive flag bonus,
    /// the normal-message cap, then clamp/round/scale. Reordering any step
    /// changes the output.
    pub fn calibrate(
        &self,
        raw_probability: f64,
        category: ScamCategory,
        flag_count: usize,
    ) -> f64 {
        let flag_score = (flag_count as f64 / self.flag_saturation as f64 * 100.0).min(100.0);
        let blended = self.raw_weight * raw_probability + self.flag_weight * flag_score;
        let mut calibrated =
            blended * self.category_weight(category) + flag_count as f64 * self.flag_bonus;

        if category == ScamCategory::NormalMessage {
            calibrated = calibrated.min(self.normal_message_cap);
        }

        calibrated.clamp(0.0, 100.0).round() / 100.0
    }

    /// Calibrate directly from a parsed verdict.
    pub fn calibrate_verdict(&self, verdict: &Verdict) -> f64 {
        self.calibrate(
            verdict.probability,
            verdict.category,
            verdict.red_flags.len(),
        )
    }

    /// Blend a local classifier score into an already-calibrated
    /// probability. Skipped entirely by callers when no local score exists;
    /// no substitute value is ever invented.
    pub fn blend_local(&self, calibrated: f64, local_score: f64) -> f64 {
        self.llm_blend_weight * calibrated + self.local_blend_weight * local_score
    }
}

/// Derive the stored ground-truth label from the calibrated verdict.
///
/// The [0.35, 0.55) dead zone deliberately stays `uncertain` instead of
/// forcing a binary choice.
pub fn derive_label(category: ScamCategory, probability: f64) -> FinalLabel {
    if category == ScamCategory::NormalMessage || probability < 0.35 {
        FinalLabel::Safe
    } else if probability >= 0.55 {
        FinalLabel::Scam
    } else {
        FinalLabel::Uncertain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> CalibrationWeights {
        CalibrationWeights::default()
    }

    #[test]
    fn test_worked_example_bank_scam() {
        // raw=80, bank scam, 3 flags: flag_score=60, blended=74,
        // calibrated=74*1.10+12=93.4 -> 0.93
        let p = weights().calibrate(80.0, ScamCategory::BankScam, 3);
        assert_eq!(p, 0.93);
    }

    #[test]
    fn test_worked_example_normal_message_capped() {
        // raw=40, normal message, 0 flags: blended=28, calibrated=23.8,
        // capped at 15.0 -> 0.15
        let p = weights().calibrate(40.0, ScamCategory::NormalMessage, 0);
        assert_eq!(p, 0.15);
    }

    #[test]
    fn test_normal_message_cap_holds_at_extremes() {
        let w = weights();
        for raw in [0.0, 50.0, 100.0, 500.0] {
            for flags in 0..=10 {
                let p = w.calibrate(raw, ScamCategory::NormalMessage, flags);
                assert!(p <= 0.15, "raw={} flags={} gave {}", raw, flags, p);
            }
        }
    }

    #[test]
    fn test_output_closed_under_clamping() {
        let w = weights();
        let categories = [
            ScamCategory::BankScam,
            ScamCategory::JobScam,
            ScamCategory::CourierScam,
            ScamCategory::LotteryScam,
            ScamCategory::Phishing,
            ScamCategory::NormalMessage,
        ];
        for &cat in &categories {
            for raw in [-50.0, 0.0, 25.0, 99.0, 100.0, 1000.0] {
                for flags in [0, 1, 5, 8, 100] {
                    let p = w.calibrate(raw, cat, flags);
                    assert!((0.0..=1.0).contains(&p), "{:?} raw={} flags={}", cat, raw, flags);
                }
            }
        }
    }

    #[test]
    fn test_calibration_is_deterministic() {
        let w = weights();
        let a = w.calibrate(63.0, ScamCategory::Phishing, 2);
        let b = w.calibrate(63.0, ScamCategory::Phishing, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_flag_score_saturates_at_five_flags() {
        let w = weights();
        // Beyond 5 flags the flag_score contribution stays flat; only the
        // additive bonus keeps growing.
        let five = w.calibrate(50.0, ScamCategory::Phishing, 5);
        let six = w.calibrate(50.0, ScamCategory::Phishing, 6);
        assert!((six - five - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_blend_local() {
        let w = weights();
        let blended = w.blend_local(0.93, 0.50);
        assert!((blended - (0.6 * 0.93 + 0.4 * 0.50)).abs() < 1e-12);
    }

    #[test]
    fn test_derive_label_thresholds() {
        assert_eq!(derive_label(ScamCategory::BankScam, 0.10), FinalLabel::Safe);
        assert_eq!(derive_label(ScamCategory::BankScam, 0.34), FinalLabel::Safe);
        assert_eq!(
            derive_label(ScamCategory::BankScam, 0.35),
            FinalLabel::Uncertain
        );
        assert_eq!(
            derive_label(ScamCategory::BankScam, 0.54),
            FinalLabel::Uncertain
        );
        assert_eq!(derive_label(ScamCategory::BankScam, 0.55), FinalLabel::Scam);
        assert_eq!(derive_label(ScamCategory::Phishing, 0.99), FinalLabel::Scam);
    }

    #[test]
    fn test_derive_label_normal_message_always_safe() {
        // Category trumps the probability thresholds for benign messages.
        assert_eq!(
            derive_label(ScamCategory::NormalMessage, 0.90),
            FinalLabel::Safe
        );
    }
}
