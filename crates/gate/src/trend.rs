use common::Bar;

/// Mean of the consecutive-difference series, i.e. the average step from
/// one value to the next. `None` for fewer than two values.
pub fn avg_consecutive_diff(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let steps = values.windows(2).map(|w| w[1] - w[0]);
    Some(steps.sum::<f64>() / (values.len() - 1) as f64)
}

/// Short-term drift of `bars` (oldest first): the average of the mean high
/// step and the mean low step, rounded to 4 decimal places.
pub fn trend_from_bars(bars: &[Bar]) -> Option<f64> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let drift = (avg_consecutive_diff(&highs)? + avg_consecutive_diff(&lows)?) / 2.0;
    Some(round4(drift))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
