//! Held-out evaluation of a trained classifier

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 plus accuracy
///
/// Undefined ratios (no predictions or no support for a class) count as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub support: usize,
}

impl ClassificationReport {
    pub fn compute(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Self {
        debug_assert_eq!(y_true.len(), y_pred.len(), "label and prediction counts differ");

        let classes = (0..n_classes)
            .map(|class| {
                let tp = count(y_true, y_pred, |t, p| t == class && p == class);
                let fp = count(y_true, y_pred, |t, p| t != class && p == class);
                let fn_ = count(y_true, y_pred, |t, p| t == class && p != class);

                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support: tp + fn_,
                }
            })
            .collect();

        let correct = count(y_true, y_pred, |t, p| t == p);
        Self {
            classes,
            accuracy: ratio(correct, y_true.len()),
            support: y_true.len(),
        }
    }

    #[must_use]
    pub fn macro_f1(&self) -> f64 {
        if self.classes.is_empty() {
            return 0.0;
        }
        self.classes.iter().map(|c| c.f1).sum::<f64>() / self.classes.len() as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>8} {:>10} {:>10} {:>10} {:>10}",
            "class", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>8} {:>10.3} {:>10.3} {:>10.3} {:>10}",
                c.class, c.precision, c.recall, c.f1, c.support
            )?;
        }
        write!(
            f,
            "{:>8} {:>32.3} {:>10}",
            "accuracy", self.accuracy, self.support
        )
    }
}

fn count(y_true: &[usize], y_pred: &[usize], pred: impl Fn(usize, usize) -> bool) -> usize {
    y_true.iter().zip(y_pred).filter(|&(&t, &p)| pred(t, p)).count()
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report() {
        let y_true = [1, 1, 1, 0, 0];
        let y_pred = [1, 1, 0, 0, 1];
        let report = ClassificationReport::compute(&y_true, &y_pred, 2);

        assert_eq!(report.support, 5);
        assert!((report.accuracy - 0.6).abs() < 1e-12);

        let pos = &report.classes[1];
        assert!((pos.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((pos.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(pos.support, 3);

        let neg = &report.classes[0];
        assert!((neg.precision - 0.5).abs() < 1e-12);
        assert!((neg.recall - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_predictions_for_class() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 0], 2);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert!(report.to_string().contains("accuracy"));
    }
}
