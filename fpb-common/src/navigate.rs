//! Navigator: circular cursor over the active result set
//!
//! Owns the result set of one query and a single cursor into it. The
//! cursor always satisfies `0 <= cursor < len` while the set is
//! non-empty; installing a new set resets it to 0.

use crate::table::PhotoRecord;

#[derive(Debug, Default)]
pub struct Navigator {
    results: Vec<PhotoRecord>,
    cursor: usize,
}

impl Navigator {
    /// Replace the result set wholesale; the cursor resets to 0
    pub fn install(&mut self, results: Vec<PhotoRecord>) {
        self.results = results;
        self.cursor = 0;
    }

    /// Step the cursor circularly: past the end wraps to 0, before the
    /// start wraps to the last index. A no-op on an empty set.
    pub fn step(&mut self, direction: i64) -> usize {
        let total = self.results.len();
        if total == 0 {
            return self.cursor;
        }

        let next = self.cursor as i64 + direction;
        self.cursor = if next >= total as i64 {
            0
        } else if next < 0 {
            total - 1
        } else {
            next as usize
        };
        self.cursor
    }

    pub fn reset(&mut self) -> usize {
        self.cursor = 0;
        0
    }

    pub fn current(&self) -> Option<&PhotoRecord> {
        self.results.get(self.cursor)
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[PhotoRecord] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(n: usize) -> Vec<PhotoRecord> {
        (0..n)
            .map(|i| PhotoRecord {
                description: String::new(),
                year: String::new(),
                characters: Vec::new(),
                filename: format!("{}.jpg", i),
                folder: "F".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_step_forward_wraps() {
        let mut nav = Navigator::default();
        nav.install(results(3));

        assert_eq!(nav.step(1), 1);
        assert_eq!(nav.step(1), 2);
        assert_eq!(nav.step(1), 0);
    }

    #[test]
    fn test_step_backward_wraps() {
        let mut nav = Navigator::default();
        nav.install(results(3));

        assert_eq!(nav.step(-1), 2);
        assert_eq!(nav.step(-1), 1);
    }

    #[test]
    fn test_step_on_empty_set_is_noop() {
        let mut nav = Navigator::default();
        nav.install(results(0));

        assert_eq!(nav.step(1), 0);
        assert_eq!(nav.step(-1), 0);
        assert!(nav.current().is_none());
    }

    #[test]
    fn test_install_resets_cursor() {
        let mut nav = Navigator::default();
        nav.install(results(3));
        nav.step(1);
        nav.step(1);

        nav.install(results(5));
        assert_eq!(nav.index(), 0);
        assert_eq!(nav.total(), 5);
    }

    #[test]
    fn test_reset() {
        let mut nav = Navigator::default();
        nav.install(results(4));
        nav.step(1);

        assert_eq!(nav.reset(), 0);
        assert_eq!(nav.current().unwrap().filename, "0.jpg");
    }
}
