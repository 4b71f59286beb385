use indexmap::IndexMap;
use std::collections::HashSet;

/// 搜尋路徑與其啟用狀態。 / A search path together with its activation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: String,
    pub active: bool,
}

impl PathEntry {
    /// 建立路徑項目。 / Creates an entry for `path`.
    pub fn new(path: impl Into<String>, active: bool) -> Self {
        Self {
            path: path.into(),
            active,
        }
    }
}

/// 依優先順序排列的路徑對應表。 / Ordered `path -> active` mapping; position encodes precedence.
///
/// Keys are unique and the first insertion of a key wins: later
/// insertions of the same path neither move it nor change its flag.
/// Equality is order-sensitive.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceMap {
    entries: IndexMap<String, bool>,
}

impl PrecedenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `path` unless it is already present. Returns whether it was inserted.
    pub fn insert(&mut self, path: impl Into<String>, active: bool) -> bool {
        let path = path.into();
        if self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, active);
        true
    }

    /// 查詢路徑的啟用狀態。 / Activation flag of `path`, if present.
    pub fn get(&self, path: &str) -> Option<bool> {
        self.entries.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 依優先順序走訪。 / Iterates over `(path, active)` pairs in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(path, active)| (path.as_str(), *active))
    }

    /// All keys in precedence order.
    pub fn paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Keys mapped to `false`, in precedence order.
    pub fn inactive_paths(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, active)| !active)
            .map(|(path, _)| path.to_string())
            .collect()
    }

    /// Keys mapped to `true`, in precedence order.
    pub fn active_paths(&self) -> Vec<String> {
        active_paths(self)
    }

    /// 轉為路徑項目清單。 / Entries in precedence order.
    pub fn entries(&self) -> Vec<PathEntry> {
        self.iter()
            .map(|(path, active)| PathEntry::new(path, active))
            .collect()
    }
}

impl PartialEq for PrecedenceMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for PrecedenceMap {}

impl<S: Into<String>> FromIterator<(S, bool)> for PrecedenceMap {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        let mut map = PrecedenceMap::new();
        for (path, active) in iter {
            map.insert(path, active);
        }
        map
    }
}

impl FromIterator<PathEntry> for PrecedenceMap {
    fn from_iter<T: IntoIterator<Item = PathEntry>>(iter: T) -> Self {
        iter.into_iter()
            .map(|entry| (entry.path, entry.active))
            .collect()
    }
}

/// 建立優先順序對應表。 / Builds the precedence map.
///
/// Project paths come first and are always active, then the user paths,
/// active unless listed in `inactive`.
pub fn compute_map<'a, I>(project_paths: &[String], user_paths: &[String], inactive: I) -> PrecedenceMap
where
    I: IntoIterator<Item = &'a String>,
{
    let inactive: HashSet<&str> = inactive.into_iter().map(String::as_str).collect();
    let mut map = PrecedenceMap::new();
    // Project paths go first so modules developed in a project are not
    // shadowed by the ones found in other locations.
    for path in project_paths {
        map.insert(path.as_str(), true);
    }
    for path in user_paths {
        map.insert(path.as_str(), !inactive.contains(path.as_str()));
    }
    map
}

/// 對應表中啟用的路徑。 / Keys of `map` whose flag is `true`, in map order.
pub fn active_paths(map: &PrecedenceMap) -> Vec<String> {
    map.iter()
        .filter(|(_, active)| *active)
        .map(|(path, _)| path.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn project_paths_take_precedence_and_duplicates_collapse() {
        let map = compute_map(&strings(&["A"]), &strings(&["B", "A", "C"]), &Vec::new());
        assert_eq!(map.paths(), strings(&["A", "B", "C"]));
        assert_eq!(map.get("A"), Some(true));
    }

    #[test]
    fn inactive_user_paths_are_flagged() {
        let inactive = strings(&["B"]);
        let map = compute_map(&[], &strings(&["A", "B"]), &inactive);
        assert_eq!(map.entries(), vec![PathEntry::new("A", true), PathEntry::new("B", false)]);
        assert_eq!(map.inactive_paths(), strings(&["B"]));
    }

    #[test]
    fn project_path_stays_active_even_when_listed_inactive() {
        let inactive = strings(&["A"]);
        let map = compute_map(&strings(&["A"]), &strings(&["A"]), &inactive);
        assert_eq!(map.get("A"), Some(true));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn active_paths_keeps_map_order() {
        let map: PrecedenceMap = vec![("/z", true), ("/y", false), ("/x", true)]
            .into_iter()
            .collect();
        assert_eq!(active_paths(&map), strings(&["/z", "/x"]));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let first: PrecedenceMap = vec![("/a", true), ("/b", true)].into_iter().collect();
        let swapped: PrecedenceMap = vec![("/b", true), ("/a", true)].into_iter().collect();
        let toggled: PrecedenceMap = vec![("/a", true), ("/b", false)].into_iter().collect();

        assert_ne!(first, swapped);
        assert_ne!(first, toggled);
        assert_eq!(first, first.clone());
    }

    #[test]
    fn first_insertion_wins() {
        let mut map = PrecedenceMap::new();
        assert!(map.insert("/a", false));
        assert!(!map.insert("/a", true));
        assert_eq!(map.get("/a"), Some(false));
    }
}
