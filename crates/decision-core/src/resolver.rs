//! Majority vote over the history buffer.
//!
//! # Tie-break
//!
//! When several labels share the highest count, the label whose first
//! occurrence is oldest wins. Tallies are kept in first-occurrence order
//! and only a strictly greater count replaces the leader, so the scan
//! order alone decides ties.

use stepsort_model::Label;

use crate::history::HistoryBuffer;

/// Most frequent label in `window` (oldest first), or `None` if empty.
pub fn resolve_window<'a, I>(window: I) -> Option<&'a Label>
where
    I: IntoIterator<Item = &'a Label>,
{
    // The label set is small, so a linear tally beats hashing here.
    let mut tally: Vec<(&'a Label, usize)> = Vec::new();
    for label in window {
        match tally.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => tally.push((label, 1)),
        }
    }

    let mut leader: Option<(&'a Label, usize)> = None;
    for (label, count) in tally {
        match leader {
            Some((_, best)) if count <= best => {}
            _ => leader = Some((label, count)),
        }
    }
    leader.map(|(label, _)| label)
}

/// Stateless majority resolver.
///
/// Recomputes from scratch on every call; nothing is cached between cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityResolver;

impl MajorityResolver {
    /// Resolve the buffer's majority label.
    ///
    /// Only defined on a full buffer; returns `None` while it is still warming up.
    pub fn resolve<'a>(&self, buffer: &'a HistoryBuffer) -> Option<&'a Label> {
        if !buffer.is_full() {
            return None;
        }
        resolve_window(buffer.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(names: &[&str]) -> Vec<Label> {
        names.iter().map(|n| Label::new(*n)).collect()
    }

    #[test]
    fn test_clear_majority() {
        let w = window(&["a", "b", "b", "c", "b"]);
        assert_eq!(resolve_window(&w), Some(&Label::new("b")));
    }

    #[test]
    fn test_tie_goes_to_earliest_first_occurrence() {
        let w = window(&["a", "b", "a", "b"]);
        assert_eq!(resolve_window(&w), Some(&Label::new("a")));

        let w = window(&["b", "a", "a", "b"]);
        assert_eq!(resolve_window(&w), Some(&Label::new("b")));
    }

    #[test]
    fn test_tie_ignores_lower_counts_seen_first() {
        let w = window(&["c", "a", "b", "a", "b"]);
        assert_eq!(resolve_window(&w), Some(&Label::new("a")));
    }

    #[test]
    fn test_empty_window() {
        assert_eq!(resolve_window(&Vec::<Label>::new()), None);
    }

    #[test]
    fn test_resolver_waits_for_full_buffer() {
        let mut buffer = HistoryBuffer::new(3);
        buffer.push(Label::new("a"));
        buffer.push(Label::new("a"));
        assert_eq!(MajorityResolver.resolve(&buffer), None);

        buffer.push(Label::new("b"));
        assert_eq!(MajorityResolver.resolve(&buffer), Some(&Label::new("a")));
    }

    #[test]
    fn test_resolver_uses_ring_order_after_wrap() {
        // Contents after wrap are [b, a, b, a] oldest first, so "b" wins the tie.
        let mut buffer = HistoryBuffer::new(4);
        for name in ["x", "x", "b", "a", "b", "a"] {
            buffer.push(Label::new(name));
        }
        assert_eq!(buffer.snapshot(), window(&["b", "a", "b", "a"]));
        assert_eq!(MajorityResolver.resolve(&buffer), Some(&Label::new("b")));
    }
}
