//! Distinctness
//!
//! A one-slot comparator: it remembers the last item it admitted and refuses
//! the next one if the comparison says they are equal. Both distinctness
//! filters of the pipeline are this state machine with a different
//! comparison plugged in.

/// Remembers the last admitted item and rejects consecutive duplicates.
pub struct DistinctUntilChanged<K, F> {
    last: Option<K>,
    same: F,
}

impl<K, F> DistinctUntilChanged<K, F>
where
    K: Clone,
    F: FnMut(&K, &K) -> bool,
{
    /// Create a filter using `same` as the equality check.
    pub fn with(same: F) -> Self {
        Self { last: None, same }
    }

    /// Returns `true` if `item` differs from the previously admitted item.
    ///
    /// Admitted items replace the remembered one.
    pub fn admit(&mut self, item: &K) -> bool {
        if let Some(last) = &self.last {
            if (self.same)(last, item) {
                return false;
            }
        }
        self.last = Some(item.clone());
        true
    }
}

impl<K> DistinctUntilChanged<K, fn(&K, &K) -> bool>
where
    K: Clone + PartialEq,
{
    /// A filter using `PartialEq`.
    pub fn new() -> Self {
        Self::with(|a, b| a == b)
    }
}

impl<K> Default for DistinctUntilChanged<K, fn(&K, &K) -> bool>
where
    K: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppresses_consecutive_duplicates_only() {
        let mut distinct = DistinctUntilChanged::new();
        let admitted: Vec<i32> = [1, 1, 2, 2, 1, 3, 3]
            .into_iter()
            .filter(|v| distinct.admit(v))
            .collect();
        assert_eq!(admitted, vec![1, 2, 1, 3]);
    }

    #[test]
    fn custom_comparison() {
        let mut distinct = DistinctUntilChanged::with(|a: &String, b: &String| {
            a.eq_ignore_ascii_case(b)
        });
        assert!(distinct.admit(&"a".to_string()));
        assert!(!distinct.admit(&"A".to_string()));
        assert!(distinct.admit(&"b".to_string()));
    }
}
