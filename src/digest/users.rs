use std::collections::BTreeSet;
use std::fmt;

/// Actor login, always stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(login: &str) -> Self {
        Self(login.to_lowercase())
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dedup set of usernames discovered so far.
///
/// One instance is threaded through the whole run by `&mut`. It holds no lock:
/// the pipeline digests one file at a time on a single thread, and anything
/// that changes that must add its own synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsernameSet {
    members: BTreeSet<Username>,
}

impl UsernameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the username was not already present.
    pub fn add(&mut self, username: Username) -> bool {
        self.members.insert(username)
    }

    #[cfg(test)]
    pub fn contains(&self, username: &Username) -> bool {
        self.members.contains(username)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Username> {
        self.members.iter()
    }

    /// Members of `self` that are absent from `other`.
    pub fn difference(&self, other: &UsernameSet) -> UsernameSet {
        UsernameSet {
            members: self.members.difference(&other.members).cloned().collect(),
        }
    }
}

impl FromIterator<Username> for UsernameSet {
    fn from_iter<I: IntoIterator<Item = Username>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
