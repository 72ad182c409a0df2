/// Page cursor for the open document. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    page_count: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_count: 1,
        }
    }
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// A new document was picked. The count is unknown until it loads.
    pub fn select_file(&mut self) {
        self.current_page = 1;
        self.page_count = 1;
    }

    pub fn on_loaded(&mut self, page_count: usize) {
        self.page_count = page_count.max(1);
        self.current_page = self.current_page.clamp(1, self.page_count);
    }

    /// Returns true if the page changed.
    pub fn next(&mut self) -> bool {
        if self.current_page < self.page_count {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Returns true if the page changed.
    pub fn previous(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(count: usize) -> Pagination {
        let mut p = Pagination::new();
        p.select_file();
        p.on_loaded(count);
        p
    }

    #[test]
    fn defaults_to_single_page() {
        let p = Pagination::new();
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.page_count(), 1);
    }

    #[test]
    fn next_stops_at_last_page() {
        let mut p = loaded(3);
        assert!(p.next());
        assert!(p.next());
        assert_eq!(p.current_page(), 3);
        assert!(!p.next());
        assert_eq!(p.current_page(), 3);
    }

    #[test]
    fn previous_stops_at_first_page() {
        let mut p = loaded(3);
        assert!(!p.previous());
        assert_eq!(p.current_page(), 1);
        p.next();
        assert!(p.previous());
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn navigation_before_load_is_a_no_op() {
        let mut p = Pagination::new();
        assert!(!p.next());
        assert!(!p.previous());
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn select_file_resets_to_first_page() {
        let mut p = loaded(10);
        for _ in 0..7 {
            p.next();
        }
        assert_eq!(p.current_page(), 8);

        p.select_file();
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.page_count(), 1);
    }

    #[test]
    fn on_loaded_clamps_current_page() {
        let mut p = loaded(10);
        for _ in 0..9 {
            p.next();
        }
        p.on_loaded(4);
        assert_eq!(p.current_page(), 4);
    }

    #[test]
    fn zero_page_count_is_treated_as_one() {
        let p = loaded(0);
        assert_eq!(p.page_count(), 1);
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn random_walk_stays_in_bounds() {
        // Deterministic LCG so the walk is reproducible.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for count in [1usize, 2, 3, 7, 50] {
            let mut p = loaded(count);
            for _ in 0..500 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                if seed >> 63 == 0 {
                    p.next();
                } else {
                    p.previous();
                }
                assert!(p.current_page() >= 1);
                assert!(p.current_page() <= p.page_count());
            }
        }
    }
}
