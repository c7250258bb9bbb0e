use std::fmt;
use std::time::Duration;

/// Result of one suite: how many of its trials came out right, and how long
/// the whole thing took.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteReport {
    pub name: &'static str,
    pub trials: usize,
    pub passed: usize,
    pub elapsed: Duration,
    /// Smallest final value seen in a failing trial, if any failed with a value.
    pub worst: Option<u64>,
}

impl SuiteReport {
    /// Percentage of trials that passed. A suite with no trials reports 0.0
    /// rather than NaN.
    pub fn success_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.passed as f64 * 100.0 / self.trials as f64
    }

    pub fn failed(&self) -> usize {
        self.trials - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.trials > 0 && self.passed == self.trials
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] passed rate: {:.1}%, elapse: {} ms",
            self.name,
            self.success_rate(),
            self.elapsed.as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(trials: usize, passed: usize) -> SuiteReport {
        SuiteReport {
            name: "t",
            trials,
            passed,
            elapsed: Duration::from_millis(42),
            worst: None,
        }
    }

    #[test]
    fn rates() {
        assert_eq!(report(100, 100).success_rate(), 100.0);
        assert_eq!(report(100, 37).success_rate(), 37.0);
        assert_eq!(report(3, 1).failed(), 2);
        assert!((report(3, 1).success_rate() - 33.333).abs() < 0.01);
    }

    #[test]
    fn empty_suite_is_zero() {
        let r = report(0, 0);
        assert_eq!(r.success_rate(), 0.0);
        assert!(!r.all_passed());
    }

    #[test]
    fn line_format() {
        assert_eq!(
            report(8, 7).to_string(),
            "[t] passed rate: 87.5%, elapse: 42 ms"
        );
    }
}
