//! Confidence heuristic for typing predictions

/// Weight of the "how many predictions came back" signal
pub const RETURNED_WEIGHT: f32 = 0.3;
/// Weight of the partial-input length signal
pub const PARTIAL_LENGTH_WEIGHT: f32 = 0.3;
/// Weight of the average predicted-prompt length signal
pub const PREDICTION_LENGTH_WEIGHT: f32 = 0.4;

/// Partial input at or beyond this many characters scores full length credit
pub const PARTIAL_LENGTH_SATURATION: f32 = 20.0;
/// Predictions averaging this many characters score full length credit
pub const PREDICTION_LENGTH_SATURATION: f32 = 50.0;

/// Scores how likely a set of completions matches the user's intent.
///
/// Weighted sum of three capped signals: fraction of requested predictions
/// returned (0.3), partial-input length (0.3) and average predicted length
/// (0.4). Always within [0, 1]; non-decreasing in `partial` length when the
/// predictions are held fixed.
pub fn prediction_confidence(partial: &str, predictions: &[String], requested: usize) -> f32 {
    if predictions.is_empty() || requested == 0 {
        return 0.0;
    }

    let returned = (predictions.len() as f32 / requested as f32).min(1.0);

    let partial_len = partial.trim().chars().count() as f32;
    let partial_signal = (partial_len / PARTIAL_LENGTH_SATURATION).min(1.0);

    let avg_len = predictions
        .iter()
        .map(|p| p.chars().count() as f32)
        .sum::<f32>()
        / predictions.len() as f32;
    let length_signal = (avg_len / PREDICTION_LENGTH_SATURATION).min(1.0);

    let score = returned * RETURNED_WEIGHT
        + partial_signal * PARTIAL_LENGTH_WEIGHT
        + length_signal * PREDICTION_LENGTH_WEIGHT;

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preds(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_predictions_score_zero() {
        assert_eq!(prediction_confidence("a cat", &[], 3), 0.0);
    }

    #[test]
    fn test_score_is_bounded() {
        let long = "x".repeat(500);
        let predictions = preds(&[&long, &long, &long, &long]);
        let score = prediction_confidence(&long, &predictions, 3);
        assert!((score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_weights_combine() {
        // 3/3 returned → 0.3; 10 chars / 20 → 0.15; 25 chars / 50 → 0.2
        let p = "a".repeat(25);
        let predictions = preds(&[&p, &p, &p]);
        let score = prediction_confidence(&"b".repeat(10), &predictions, 3);
        assert!((score - 0.65).abs() < 1e-5, "score was {}", score);
    }

    #[test]
    fn test_monotonic_in_partial_length() {
        let predictions = preds(&["a lion wearing sunglasses", "a lion in a suit"]);
        let mut previous = 0.0;

        for len in 0..40 {
            let partial = "l".repeat(len);
            let score = prediction_confidence(&partial, &predictions, 3);
            assert!(score >= previous, "len {} dropped from {} to {}", len, previous, score);
            previous = score;
        }
    }

    #[test]
    fn test_fewer_predictions_lower_score() {
        let full = prediction_confidence("a lion", &preds(&["a lion", "a lion", "a lion"]), 3);
        let partial = prediction_confidence("a lion", &preds(&["a lion"]), 3);
        assert!(full > partial);
    }
}
