//! Ordered, re-rankable list of VIN prefixes.

/// The prefixes a bot tries for each sequence number, in the order it tries
/// them.
///
/// Neighbouring sequence numbers tend to come from the same batch, so the
/// prefix that hit last is promoted to the front for the next item. The
/// order is a plain value owned by the search loop and passed from one item
/// to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixOrder(Vec<String>);

impl PrefixOrder {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self(prefixes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Move the prefix at `index` to the front, keeping the relative order of
    /// the rest. Out-of-range indexes leave the order unchanged.
    pub fn promote(mut self, index: usize) -> Self {
        if index < self.0.len() {
            let prefix = self.0.remove(index);
            self.0.insert(0, prefix);
        }
        self
    }
}

impl From<Vec<String>> for PrefixOrder {
    fn from(prefixes: Vec<String>) -> Self {
        Self::new(prefixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(prefixes: &[&str]) -> PrefixOrder {
        PrefixOrder::new(prefixes.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn promote_moves_hit_to_front() {
        assert_eq!(order(&["A", "B", "C"]).promote(2), order(&["C", "A", "B"]));
        assert_eq!(order(&["A", "B", "C"]).promote(1), order(&["B", "A", "C"]));
    }

    #[test]
    fn promote_front_is_a_no_op() {
        assert_eq!(order(&["A", "B", "C"]).promote(0), order(&["A", "B", "C"]));
    }

    #[test]
    fn promote_out_of_range_is_a_no_op() {
        assert_eq!(order(&["A", "B"]).promote(5), order(&["A", "B"]));
        assert_eq!(order(&[]).promote(0), order(&[]));
    }

    #[test]
    fn repeated_promotions_track_latest_hit() {
        let prefixes = order(&["A", "B", "C", "D"]).promote(3).promote(2);
        assert_eq!(prefixes, order(&["B", "D", "A", "C"]));
        assert_eq!(prefixes.get(0), Some("B"));
        assert_eq!(prefixes.len(), 4);
    }
}
