use std::fmt::{Display, Formatter};

/// Running tally of rotation-prediction trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub iterations: u64,
    pub correct: u64,
    pub incorrect: u64,
}

impl Stats {
    pub fn record(&mut self, correct: bool) {
        self.iterations += 1;
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    /// `correct / iterations`, or 0 before the first trial.
    pub fn accuracy(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.correct as f64 / self.iterations as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "it: {} | correct: {} | incorrect: {} | acc: {:.1}%",
            self.iterations,
            self.correct,
            self.incorrect,
            self.accuracy() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn accuracy_is_zero_before_any_trial() {
        assert_eq!(Stats::default().accuracy(), 0.0);
    }

    #[test]
    fn accuracy_is_correct_over_iterations() {
        let mut stats = Stats::default();
        for outcome in [true, false, true, true, false, true, true] {
            stats.record(outcome);
        }
        assert_eq!(stats.iterations, 7);
        assert_eq!(stats.correct + stats.incorrect, stats.iterations);
        assert_relative_eq!(stats.accuracy(), 5.0 / 7.0);
        assert_eq!(
            stats.to_string(),
            "it: 7 | correct: 5 | incorrect: 2 | acc: 71.4%"
        );
    }

    #[test]
    fn reset_zeroes_every_counter() {
        let mut stats = Stats::default();
        stats.record(true);
        stats.record(false);
        stats.reset();
        assert_eq!(stats, Stats::default());
    }
}
