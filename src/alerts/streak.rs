use std::collections::VecDeque;

/// Fixed-length window of per-session pass/fail outcomes, oldest first.
#[derive(Clone, Debug)]
pub struct StreakWindow {
    len: usize,
    outcomes: VecDeque<bool>,
}

impl StreakWindow {
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        Self {
            len,
            outcomes: VecDeque::with_capacity(len),
        }
    }

    pub fn record(&mut self, passed: bool) {
        if self.outcomes.len() == self.len {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(passed);
    }

    /// Only a full window of passes counts as a streak.
    pub fn is_satisfied(&self) -> bool {
        self.outcomes.len() == self.len && self.outcomes.iter().all(|p| *p)
    }
}
