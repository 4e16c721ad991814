use serde::Serialize;

/// Position of the current question, counted from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Completion percentage in `0.0..=100.0`; zero for an empty catalog.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.current.min(self.total) as f64 / self.total as f64) * 100.0
    }

    pub fn label(&self) -> String {
        format!("Question {} of {}", self.current, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_tracks_position() {
        assert_eq!(Progress::new(1, 4).percentage(), 25.0);
        assert_eq!(Progress::new(4, 4).percentage(), 100.0);
        assert_eq!(Progress::new(1, 0).percentage(), 0.0);
    }

    #[test]
    fn label_is_human_readable() {
        assert_eq!(Progress::new(2, 5).label(), "Question 2 of 5");
    }
}
