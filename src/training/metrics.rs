//! Training metrics

use std::fmt;

/// Metrics for a single full-batch epoch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochMetrics {
    /// Binary cross-entropy over the batch
    pub loss: f64,
    /// Fraction of examples on the correct side of the threshold
    pub accuracy: f64,
}

impl fmt::Display for EpochMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loss: {:.4} | Acc: {:.2}%", self.loss, self.accuracy * 100.0)
    }
}

/// Record of one training run
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    /// Number of examples in the batch
    pub examples: usize,
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingReport {
    pub fn new(examples: usize) -> Self {
        TrainingReport {
            examples,
            epochs: Vec::new(),
        }
    }

    pub fn record_epoch(&mut self, loss: f32, accuracy: f32) {
        self.epochs.push(EpochMetrics {
            loss: loss as f64,
            accuracy: accuracy as f64,
        });
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs.len()
    }

    pub fn initial(&self) -> Option<EpochMetrics> {
        self.epochs.first().copied()
    }

    pub fn last(&self) -> Option<EpochMetrics> {
        self.epochs.last().copied()
    }

    /// Loss reduction between the first and last epoch
    pub fn improvement(&self) -> Option<f64> {
        match (self.initial(), self.last()) {
            (Some(first), Some(last)) if self.epochs.len() > 1 => Some(first.loss - last.loss),
            _ => None,
        }
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last() {
            Some(last) => write!(
                f,
                "{} examples, {} epochs | {}",
                self.examples,
                self.epochs_run(),
                last
            ),
            None => write!(f, "{} examples, not trained", self.examples),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement() {
        let mut report = TrainingReport::new(4);
        assert_eq!(report.improvement(), None);

        report.record_epoch(0.75, 0.5);
        assert_eq!(report.improvement(), None);

        report.record_epoch(0.5, 1.0);
        assert_eq!(report.improvement(), Some(0.25));
        assert_eq!(report.epochs_run(), 2);
        assert_eq!(report.last().unwrap().accuracy, 1.0);
    }

    #[test]
    fn test_display_untrained() {
        let report = TrainingReport::new(0);
        assert_eq!(report.to_string(), "0 examples, not trained");
    }
}
