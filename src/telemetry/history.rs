//! # Yaw History
//!
//! Rolling window of the most recent raw yaw readings, used to compute the
//! zero offset as an average instead of a single noisy snapshot.

/// Number of yaw samples kept for averaging
pub const YAW_HISTORY_LENGTH: usize = 10;

/// Fixed-capacity circular buffer of raw yaw samples
///
/// Slots start at zero and the average always divides by the full capacity,
/// so an average taken before the buffer has filled is biased toward 0.
///
/// # Examples
///
/// ```
/// use nav6_telemetry::telemetry::history::{YawHistory, YAW_HISTORY_LENGTH};
///
/// let mut history = YawHistory::new();
/// for _ in 0..YAW_HISTORY_LENGTH {
///     history.append(30.0);
/// }
/// assert!((history.average() - 30.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawHistory {
    samples: [f32; YAW_HISTORY_LENGTH],
    next: usize,
}

impl Default for YawHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl YawHistory {
    /// Creates a zero-filled history
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: [0.0; YAW_HISTORY_LENGTH],
            next: 0,
        }
    }

    /// Overwrites the oldest slot with `yaw`
    pub fn append(&mut self, yaw: f32) {
        self.samples[self.next] = yaw;
        self.next = (self.next + 1) % YAW_HISTORY_LENGTH;
    }

    /// Mean over every slot, written or not
    #[must_use]
    pub fn average(&self) -> f32 {
        let sum: f64 = self.samples.iter().map(|&yaw| f64::from(yaw)).sum();
        (sum / YAW_HISTORY_LENGTH as f64) as f32
    }

    /// Zeroes every slot and rewinds the cursor
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Raw slot contents in storage order (not write order)
    #[must_use]
    pub fn samples(&self) -> &[f32; YAW_HISTORY_LENGTH] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_zero() {
        let history = YawHistory::new();
        assert_eq!(history.samples(), &[0.0; YAW_HISTORY_LENGTH]);
        assert_eq!(history.average(), 0.0);
    }

    #[test]
    fn test_cold_start_average_is_biased_toward_zero() {
        let mut history = YawHistory::new();
        history.append(50.0);
        history.append(50.0);

        // 2 of 10 slots written
        assert!((history.average() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_append_wraps_and_overwrites_oldest() {
        let mut history = YawHistory::new();
        for i in 0..YAW_HISTORY_LENGTH {
            history.append(i as f32);
        }
        history.append(100.0);

        assert_eq!(history.samples()[0], 100.0);
        assert_eq!(history.samples()[1], 1.0);
    }

    #[test]
    fn test_average_holds_last_capacity_writes() {
        let mut history = YawHistory::new();
        for _ in 0..25 {
            history.append(-90.0);
        }
        for _ in 0..YAW_HISTORY_LENGTH {
            history.append(20.0);
        }
        assert!((history.average() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_clear_resets_history() {
        let mut history = YawHistory::new();
        history.append(12.0);
        history.append(13.0);
        history.clear();

        assert_eq!(history, YawHistory::new());
        history.append(5.0);
        assert_eq!(history.samples()[0], 5.0);
    }
}
