//! In-memory inverted index over file tags.
//!
//! Two maps kept in lockstep, the in-memory analogue of a forward tree and
//! a reverse tree:
//! - `forward`: file path -> its `name -> value` tag map
//! - `postings`: tag name -> value -> set of file paths carrying that pair
//!
//! AND queries intersect posting lists, smallest list first, so the cost is
//! bounded by the rarest predicate. The index is derived state: it owns no
//! lifecycle of its own and simply mirrors whatever the catalog feeds it.

use std::collections::{HashMap, HashSet};

/// Inverted mapping from `(name, value)` pairs to the files carrying them
#[derive(Debug, Default)]
pub struct TagIndex {
    forward: HashMap<String, HashMap<String, String>>,
    postings: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl TagIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed files
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.forward.contains_key(path)
    }

    /// Tag map recorded for a file
    #[must_use]
    pub fn tags_of(&self, path: &str) -> Option<&HashMap<String, String>> {
        self.forward.get(path)
    }

    /// All indexed files, sorted
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.forward.keys().cloned().collect();
        files.sort();
        files
    }

    /// Record a file's tag map, adding the file to every pair's posting
    /// list. A file that was already indexed is re-indexed: stale postings
    /// from its previous tag map are dropped first.
    pub fn add_file(&mut self, path: &str, tags: &HashMap<String, String>) {
        if self.forward.contains_key(path) {
            self.remove_file(path);
        }
        for (name, value) in tags {
            self.postings
                .entry(name.clone())
                .or_default()
                .entry(value.clone())
                .or_default()
                .insert(path.to_string());
        }
        self.forward.insert(path.to_string(), tags.clone());
    }

    /// Remove a file and its postings; empty posting lists are pruned.
    /// Returns true when the file was indexed.
    pub fn remove_file(&mut self, path: &str) -> bool {
        let Some(tags) = self.forward.remove(path) else {
            return false;
        };
        for (name, value) in &tags {
            if let Some(values) = self.postings.get_mut(name) {
                if let Some(files) = values.get_mut(value) {
                    files.remove(path);
                    if files.is_empty() {
                        values.remove(value);
                    }
                }
                if values.is_empty() {
                    self.postings.remove(name);
                }
            }
        }
        true
    }

    /// Files satisfying every `(name, value)` predicate.
    ///
    /// An empty predicate list returns every indexed file. Predicates are
    /// ANDed; supplying the same name twice with different values therefore
    /// always yields the empty set, since a file carries one value per tag
    /// name.
    #[must_use]
    pub fn query(&self, predicates: &[(&str, &str)]) -> HashSet<String> {
        if predicates.is_empty() {
            return self.forward.keys().cloned().collect();
        }

        let mut lists: Vec<&HashSet<String>> = Vec::with_capacity(predicates.len());
        for (name, value) in predicates {
            match self.postings.get(*name).and_then(|values| values.get(*value)) {
                Some(files) => lists.push(files),
                None => return HashSet::new(),
            }
        }

        // Intersect the rarest pair first to keep comparisons low
        lists.sort_by_key(|files| files.len());
        let Some((first, rest)) = lists.split_first() else {
            return HashSet::new();
        };
        first
            .iter()
            .filter(|path| rest.iter().all(|files| files.contains(*path)))
            .cloned()
            .collect()
    }

    /// Distinct values of `name` among files satisfying `predicates`,
    /// sorted. Facet queries ("what sessions exist for sub-01?") build on
    /// this.
    #[must_use]
    pub fn tag_values(&self, name: &str, predicates: &[(&str, &str)]) -> Vec<String> {
        let matches = self.query(predicates);
        let mut values: Vec<String> = matches
            .iter()
            .filter_map(|path| self.forward.get(path))
            .filter_map(|tags| tags.get(name))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        values.sort();
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn set(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn sample() -> TagIndex {
        let mut index = TagIndex::new();
        index.add_file("A", &tags(&[("subject", "01"), ("task", "rest")]));
        index.add_file("B", &tags(&[("subject", "01"), ("task", "nback")]));
        index
    }

    #[test]
    fn test_single_predicate() {
        let index = sample();
        assert_eq!(index.query(&[("subject", "01")]), set(&["A", "B"]));
        assert_eq!(index.query(&[("task", "rest")]), set(&["A"]));
    }

    #[test]
    fn test_and_across_names() {
        let index = sample();
        assert_eq!(
            index.query(&[("subject", "01"), ("task", "rest")]),
            set(&["A"])
        );
    }

    #[test]
    fn test_same_name_two_values_is_empty() {
        let index = sample();
        assert!(index.query(&[("task", "rest"), ("task", "nback")]).is_empty());
    }

    #[test]
    fn test_empty_predicates_return_all_files() {
        let index = sample();
        assert_eq!(index.query(&[]), set(&["A", "B"]));
    }

    #[test]
    fn test_unknown_pair_short_circuits() {
        let index = sample();
        assert!(index.query(&[("subject", "99")]).is_empty());
        assert!(index.query(&[("nope", "01")]).is_empty());
        assert!(
            index
                .query(&[("subject", "01"), ("session", "01")])
                .is_empty()
        );
    }

    #[test]
    fn test_query_matches_manual_intersection() {
        let mut index = sample();
        index.add_file("C", &tags(&[("subject", "02"), ("task", "rest")]));

        let by_subject = index.query(&[("subject", "01")]);
        let by_task = index.query(&[("task", "rest")]);
        let manual: HashSet<String> = by_subject.intersection(&by_task).cloned().collect();
        assert_eq!(index.query(&[("subject", "01"), ("task", "rest")]), manual);
    }

    #[test]
    fn test_reindex_drops_stale_postings() {
        let mut index = sample();
        index.add_file("A", &tags(&[("subject", "02")]));

        assert_eq!(index.query(&[("subject", "01")]), set(&["B"]));
        assert_eq!(index.query(&[("subject", "02")]), set(&["A"]));
        // The old task pair is gone along with the stale posting.
        assert!(index.query(&[("task", "rest")]).is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_remove_prunes_empty_posting_lists() {
        let mut index = sample();
        assert!(index.remove_file("A"));
        assert!(!index.remove_file("A"));

        assert!(index.query(&[("task", "rest")]).is_empty());
        assert_eq!(index.query(&[("subject", "01")]), set(&["B"]));
        assert!(!index.contains("A"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_tag_values_facets() {
        let mut index = sample();
        index.add_file("C", &tags(&[("subject", "02"), ("task", "rest")]));

        assert_eq!(index.tag_values("task", &[]), vec!["nback", "rest"]);
        assert_eq!(
            index.tag_values("task", &[("subject", "01")]),
            vec!["nback", "rest"]
        );
        assert_eq!(index.tag_values("task", &[("subject", "02")]), vec!["rest"]);
        assert!(index.tag_values("session", &[]).is_empty());
    }

    #[test]
    fn test_tags_of() {
        let index = sample();
        assert_eq!(index.tags_of("A").unwrap()["task"], "rest");
        assert!(index.tags_of("Z").is_none());
    }

    #[test]
    fn test_files_are_sorted() {
        let index = sample();
        assert_eq!(index.files(), vec!["A", "B"]);
    }
}
