use crate::common::*;

/// Measures the rate of events over a time interval.
#[derive(Debug)]
pub struct RateCounter {
    count: f64,
    instant: Instant,
    interval: Duration,
}

impl RateCounter {
    pub fn new(interval: Duration) -> Self {
        Self {
            count: 0.0,
            instant: Instant::now(),
            interval,
        }
    }

    pub fn with_second_interval() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn add(&mut self, addition: f64) {
        self.count += addition;
    }

    /// Returns the rate per second once the interval has elapsed, and
    /// starts a new interval.
    pub fn rate(&mut self) -> Option<f64> {
        let elapsed = self.instant.elapsed();
        if elapsed >= self.interval {
            let rate = self.count / elapsed.as_secs_f64();
            self.count = 0.0;
            self.instant = Instant::now();
            Some(rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_after_interval() {
        let mut counter = RateCounter::new(Duration::from_millis(20));
        counter.add(4.0);
        std::thread::sleep(Duration::from_millis(25));
        counter.add(1.0);
        let rate = counter.rate().unwrap();
        assert!(rate > 0.0);
        assert!(counter.rate().is_none());
    }
}
