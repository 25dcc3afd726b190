use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a file differs from the chosen baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// New to the repository (staged add or untracked); every line is new.
    Added,
    /// Modified with the change recorded in the index or in history.
    ModifiedTracked,
    /// Modified in the working tree only.
    ModifiedUntracked,
    /// A status the backend did not recognize; treated as "all lines changed".
    Unknown,
}

impl ChangeStatus {
    /// True when the changed lines have to be looked up line by line.
    ///
    /// Every other status means the whole file counts as changed.
    pub fn is_in_place_modification(self) -> bool {
        matches!(
            self,
            ChangeStatus::ModifiedTracked | ChangeStatus::ModifiedUntracked
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeStatus::Added => "added",
            ChangeStatus::ModifiedTracked => "modified_tracked",
            ChangeStatus::ModifiedUntracked => "modified_untracked",
            ChangeStatus::Unknown => "unknown",
        }
    }
}

/// Absolute path -> change status, produced once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    files: BTreeMap<Utf8PathBuf, ChangeStatus>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `status` for `path`, replacing any earlier status.
    ///
    /// Later sources (working tree) override earlier ones (history).
    pub fn insert(&mut self, path: Utf8PathBuf, status: ChangeStatus) {
        self.files.insert(path, status);
    }

    /// Forgets `path`, returning its status if it had one.
    pub fn remove(&mut self, path: &Utf8Path) -> Option<ChangeStatus> {
        self.files.remove(path)
    }

    pub fn get(&self, path: &Utf8Path) -> Option<ChangeStatus> {
        self.files.get(path).copied()
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Utf8PathBuf, ChangeStatus)> {
        self.files.iter().map(|(p, s)| (p, *s))
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Utf8Path, ChangeStatus) -> bool) {
        self.files.retain(|p, s| keep(p, *s));
    }
}

impl FromIterator<(Utf8PathBuf, ChangeStatus)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (Utf8PathBuf, ChangeStatus)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Utf8PathBuf, ChangeStatus)> for ChangeSet {
    fn extend<I: IntoIterator<Item = (Utf8PathBuf, ChangeStatus)>>(&mut self, iter: I) {
        self.files.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_modifications_need_line_lookup() {
        assert!(ChangeStatus::ModifiedTracked.is_in_place_modification());
        assert!(ChangeStatus::ModifiedUntracked.is_in_place_modification());
        assert!(!ChangeStatus::Added.is_in_place_modification());
        assert!(!ChangeStatus::Unknown.is_in_place_modification());
    }

    #[test]
    fn later_insert_overrides_earlier_status() {
        let mut set = ChangeSet::new();
        set.insert("/repo/a.py".into(), ChangeStatus::Added);
        set.insert("/repo/a.py".into(), ChangeStatus::ModifiedUntracked);
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(Utf8Path::new("/repo/a.py")),
            Some(ChangeStatus::ModifiedUntracked)
        );
    }

    #[test]
    fn remove_forgets_the_path() {
        let mut set = ChangeSet::new();
        set.insert("/repo/a.py".into(), ChangeStatus::ModifiedTracked);
        assert_eq!(
            set.remove(Utf8Path::new("/repo/a.py")),
            Some(ChangeStatus::ModifiedTracked)
        );
        assert!(set.is_empty());
        assert_eq!(set.remove(Utf8Path::new("/repo/a.py")), None);
    }

    #[test]
    fn iterates_in_path_order() {
        let set: ChangeSet = [
            (Utf8PathBuf::from("/repo/z.py"), ChangeStatus::Added),
            (Utf8PathBuf::from("/repo/a.py"), ChangeStatus::Unknown),
        ]
        .into_iter()
        .collect();
        let paths: Vec<&str> = set.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/repo/a.py", "/repo/z.py"]);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ChangeStatus::ModifiedTracked).unwrap();
        assert_eq!(json, "\"modified_tracked\"");
        assert_eq!(ChangeStatus::ModifiedTracked.as_str(), "modified_tracked");
    }
}
