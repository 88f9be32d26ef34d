use serde::{Deserialize, Serialize};

/// Live speed sample taken on a countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WpmSample {
    /// Whole seconds since the test started
    pub second: u32,
    pub wpm: u32,
    pub net_wpm: u32,
}

impl WpmSample {
    pub fn new(second: u32, wpm: u32, net_wpm: u32) -> Self {
        Self {
            second,
            wpm,
            net_wpm,
        }
    }
}

/// Peak WPM seen over a history, zero when empty
pub fn peak_wpm(history: &[WpmSample]) -> u32 {
    history.iter().map(|s| s.wpm).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_of_history() {
        let history = [
            WpmSample::new(1, 20, 18),
            WpmSample::new(2, 55, 50),
            WpmSample::new(3, 41, 41),
        ];
        assert_eq!(peak_wpm(&history), 55);
        assert_eq!(peak_wpm(&[]), 0);
    }
}
