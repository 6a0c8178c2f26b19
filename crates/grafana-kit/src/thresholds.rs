// Numan Thabit 2025
//! Color threshold ramps in absolute mode.
//!
//! The named factories take cut points in increasing order and do not check
//! them. Use [`Thresholds::custom`] when the ramp comes from somewhere that
//! needs checking, and [`Thresholds::validate`] to audit a finished set.

use serde::{Deserialize, Serialize};

use crate::{error::ThresholdError, schema::serialize_opt_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdsMode {
    Absolute,
    Percentage,
}

/// One band of a ramp. `value: None` means "from negative infinity".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStep {
    #[serde(serialize_with = "serialize_opt_number")]
    pub value: Option<f64>,
    pub color: String,
}

impl ThresholdStep {
    pub fn base(color: impl Into<String>) -> Self {
        Self {
            value: None,
            color: color.into(),
        }
    }

    pub fn at(value: f64, color: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub mode: ThresholdsMode,
    pub steps: Vec<ThresholdStep>,
}

impl Thresholds {
    fn absolute(steps: Vec<ThresholdStep>) -> Self {
        Self {
            mode: ThresholdsMode::Absolute,
            steps,
        }
    }

    /// Ramp starting at `base_color`, switching at each `(value, color)` cut point.
    pub fn custom(base_color: &str, cuts: &[(f64, &str)]) -> Result<Self, ThresholdError> {
        let mut steps = Vec::with_capacity(cuts.len() + 1);
        steps.push(ThresholdStep::base(base_color));
        steps.extend(cuts.iter().map(|&(value, color)| ThresholdStep::at(value, color)));
        let thresholds = Self::absolute(steps);
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check that the set is non-empty, only the first step is unbounded and
    /// boundaries strictly increase.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let (first, rest) = self.steps.split_first().ok_or(ThresholdError::Empty)?;
        if first.value.is_some() {
            return Err(ThresholdError::MissingBaseStep);
        }
        let mut previous: Option<f64> = None;
        for (index, step) in rest.iter().enumerate() {
            let index = index + 1;
            let value = step
                .value
                .ok_or(ThresholdError::UnboundedStepNotFirst { index })?;
            if !value.is_finite() {
                return Err(ThresholdError::NonFinite { index });
            }
            if let Some(prev) = previous {
                if value <= prev {
                    return Err(ThresholdError::NotIncreasing {
                        index,
                        previous: prev,
                        value,
                    });
                }
            }
            previous = Some(value);
        }
        Ok(())
    }

    pub fn colors(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.color.as_str())
    }
}

pub fn green_yellow(yellow: f64) -> Thresholds {
    Thresholds::absolute(vec![
        ThresholdStep::base("green"),
        ThresholdStep::at(yellow, "yellow"),
    ])
}

pub fn green_red(red: f64) -> Thresholds {
    Thresholds::absolute(vec![
        ThresholdStep::base("green"),
        ThresholdStep::at(red, "red"),
    ])
}

/// Inverted ramp for "higher is better" values such as success rates.
pub fn red_yellow_green(yellow: f64, green: f64) -> Thresholds {
    Thresholds::absolute(vec![
        ThresholdStep::base("red"),
        ThresholdStep::at(yellow, "yellow"),
        ThresholdStep::at(green, "green"),
    ])
}

pub fn green_yellow_orange(yellow: f64, orange: f64) -> Thresholds {
    Thresholds::absolute(vec![
        ThresholdStep::base("green"),
        ThresholdStep::at(yellow, "yellow"),
        ThresholdStep::at(orange, "orange"),
    ])
}

pub fn green_yellow_red(yellow: f64, red: f64) -> Thresholds {
    Thresholds::absolute(vec![
        ThresholdStep::base("green"),
        ThresholdStep::at(yellow, "yellow"),
        ThresholdStep::at(red, "red"),
    ])
}

pub fn green_yellow_orange_red(yellow: f64, orange: f64, red: f64) -> Thresholds {
    Thresholds::absolute(vec![
        ThresholdStep::base("green"),
        ThresholdStep::at(yellow, "yellow"),
        ThresholdStep::at(orange, "orange"),
        ThresholdStep::at(red, "red"),
    ])
}

pub fn single_color(color: &str) -> Thresholds {
    Thresholds::absolute(vec![ThresholdStep::base(color)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(thresholds: &Thresholds) -> Vec<(Option<f64>, &str)> {
        thresholds
            .steps
            .iter()
            .map(|step| (step.value, step.color.as_str()))
            .collect()
    }

    #[test]
    fn green_yellow_red_reads_back() {
        let t = green_yellow_red(10.0, 100.0);
        assert_eq!(t.mode, ThresholdsMode::Absolute);
        assert_eq!(
            pairs(&t),
            vec![(None, "green"), (Some(10.0), "yellow"), (Some(100.0), "red")]
        );
    }

    #[test]
    fn single_color_has_one_unbounded_step() {
        let t = single_color("blue");
        assert_eq!(pairs(&t), vec![(None, "blue")]);
        t.validate().unwrap();
    }

    #[test]
    fn every_factory_starts_unbounded_and_increases() {
        let all = [
            green_yellow(1.0),
            green_red(1.0),
            red_yellow_green(90.0, 98.0),
            green_yellow_orange(10.0, 50.0),
            green_yellow_red(0.5, 2.0),
            green_yellow_orange_red(1.0, 5.0, 10.0),
            single_color("green"),
        ];
        for t in &all {
            assert_eq!(t.steps[0].value, None);
            t.validate().unwrap();
        }
    }

    #[test]
    fn factory_color_order() {
        assert_eq!(green_yellow(1.0).colors().collect::<Vec<_>>(), ["green", "yellow"]);
        assert_eq!(green_red(1.0).colors().collect::<Vec<_>>(), ["green", "red"]);
        assert_eq!(
            red_yellow_green(80.0, 95.0).colors().collect::<Vec<_>>(),
            ["red", "yellow", "green"]
        );
        assert_eq!(
            green_yellow_orange(1.0, 10.0).colors().collect::<Vec<_>>(),
            ["green", "yellow", "orange"]
        );
        assert_eq!(
            green_yellow_orange_red(1.0, 5.0, 10.0)
                .colors()
                .collect::<Vec<_>>(),
            ["green", "yellow", "orange", "red"]
        );
    }

    #[test]
    fn factories_do_not_check_ordering() {
        let t = green_yellow_red(100.0, 10.0);
        assert_eq!(t.steps.len(), 3);
        assert!(matches!(
            t.validate(),
            Err(ThresholdError::NotIncreasing { index: 2, .. })
        ));
    }

    #[test]
    fn identical_calls_are_equal_but_independent() {
        let first = green_yellow_red(1.0, 5.0);
        let mut second = green_yellow_red(1.0, 5.0);
        assert_eq!(first, second);
        second.steps[1].color = "purple".into();
        assert_eq!(first.steps[1].color, "yellow");
        assert_ne!(first, second);
    }

    #[test]
    fn custom_validates() {
        let t = Thresholds::custom("blue", &[(20.0, "yellow"), (100.0, "red")]).unwrap();
        assert_eq!(
            pairs(&t),
            vec![(None, "blue"), (Some(20.0), "yellow"), (Some(100.0), "red")]
        );

        let err = Thresholds::custom("blue", &[(20.0, "yellow"), (20.0, "red")]).unwrap_err();
        assert!(matches!(err, ThresholdError::NotIncreasing { index: 2, .. }));

        let err = Thresholds::custom("blue", &[(f64::NAN, "red")]).unwrap_err();
        assert!(matches!(err, ThresholdError::NonFinite { index: 1 }));
    }

    #[test]
    fn validate_rejects_misplaced_sentinels() {
        let empty = Thresholds {
            mode: ThresholdsMode::Absolute,
            steps: Vec::new(),
        };
        assert!(matches!(empty.validate(), Err(ThresholdError::Empty)));

        let no_base = Thresholds {
            mode: ThresholdsMode::Absolute,
            steps: vec![ThresholdStep::at(1.0, "green")],
        };
        assert!(matches!(no_base.validate(), Err(ThresholdError::MissingBaseStep)));

        let two_bases = Thresholds {
            mode: ThresholdsMode::Absolute,
            steps: vec![ThresholdStep::base("green"), ThresholdStep::base("red")],
        };
        assert!(matches!(
            two_bases.validate(),
            Err(ThresholdError::UnboundedStepNotFirst { index: 1 })
        ));
    }

    #[test]
    fn serializes_with_null_base_and_integer_cuts() {
        let value = serde_json::to_value(green_yellow_red(0.5, 2.0)).unwrap();
        assert_eq!(
            value,
            json!({
                "mode": "absolute",
                "steps": [
                    { "value": null, "color": "green" },
                    { "value": 0.5, "color": "yellow" },
                    { "value": 2, "color": "red" }
                ]
            })
        );
    }
}
