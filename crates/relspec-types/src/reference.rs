//! References to external identifiers and the log that accumulates them.

use crate::error::ReferenceError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A caller-defined identifier for an external value.
///
/// Any totally ordered, displayable type qualifies.
pub trait ReferenceId: Ord + Clone + fmt::Debug + fmt::Display + 'static {}

impl<T: Ord + Clone + fmt::Debug + fmt::Display + 'static> ReferenceId for T {}

/// What an evaluation learned about one identifier.
#[derive(Clone)]
pub struct Reference<R> {
    pub id: R,
    /// The value behind `id` contributed to the result.
    pub used: bool,
    /// The identifier was looked up successfully (possibly with an error).
    pub resolved: bool,
    pub error: Option<ReferenceError>,
}

impl<R: ReferenceId> Reference<R> {
    /// A used reference that could not be resolved.
    pub fn observed(id: R) -> Self {
        Self {
            id,
            used: true,
            resolved: false,
            error: None,
        }
    }

    /// A used, successfully resolved reference.
    pub fn ok(id: R) -> Self {
        Self {
            id,
            used: true,
            resolved: true,
            error: None,
        }
    }

    /// A used reference whose resolution failed with `error`.
    pub fn errored<E>(id: R, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::errored_with(id, Arc::new(error))
    }

    /// Like [`Reference::errored`] for an already shared error.
    pub fn errored_with(id: R, error: ReferenceError) -> Self {
        Self {
            id,
            used: true,
            resolved: true,
            error: Some(error),
        }
    }

    /// The same reference with `used` cleared.
    pub fn unused(mut self) -> Self {
        self.used = false;
        self
    }

    /// Resolved and error-free.
    pub fn is_ok(&self) -> bool {
        self.resolved && self.error.is_none()
    }

    /// Combine with another observation of the same identifier.
    pub fn merge(&mut self, other: &Reference<R>) {
        self.used |= other.used;
        self.resolved |= other.resolved;
        if self.error.is_none() {
            self.error = other.error.clone();
        }
    }
}

impl<R: ReferenceId> fmt::Debug for Reference<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("id", &self.id)
            .field("used", &self.used)
            .field("resolved", &self.resolved)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

impl<R: ReferenceId> PartialEq for Reference<R> {
    /// Errors compare by message.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.used == other.used
            && self.resolved == other.resolved
            && self.error.as_ref().map(|e| e.to_string())
                == other.error.as_ref().map(|e| e.to_string())
    }
}

impl<R: ReferenceId> fmt::Display for Reference<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(err) if self.used => write!(f, "! {}: {}", self.id, err),
            _ if self.used && self.resolved => write!(f, "* {}", self.id),
            _ => write!(f, "? {}", self.id),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// ReferenceLog
// ══════════════════════════════════════════════════════════════════════════════

/// The references observed by an evaluation, keyed and ordered by identifier.
#[derive(Clone, PartialEq)]
pub struct ReferenceLog<R: ReferenceId> {
    refs: BTreeMap<R, Reference<R>>,
}

impl<R: ReferenceId> Default for ReferenceLog<R> {
    fn default() -> Self {
        Self {
            refs: BTreeMap::new(),
        }
    }
}

impl<R: ReferenceId> ReferenceLog<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference, merging with any existing entry for its id.
    pub fn set(&mut self, reference: Reference<R>) {
        match self.refs.get_mut(&reference.id) {
            Some(existing) => existing.merge(&reference),
            None => {
                self.refs.insert(reference.id.clone(), reference);
            }
        }
    }

    /// Merge every entry of `other` into this log.
    pub fn merge(&mut self, other: &ReferenceLog<R>) {
        for reference in other.refs.values() {
            self.set(reference.clone());
        }
    }

    /// Merge every entry of `other` with `used` cleared.
    pub fn merge_unused(&mut self, other: &ReferenceLog<R>) {
        for reference in other.refs.values() {
            self.set(reference.clone().unused());
        }
    }

    /// Owned variant of [`ReferenceLog::merge`].
    pub fn merged(mut self, other: &ReferenceLog<R>) -> Self {
        self.merge(other);
        self
    }

    /// Set `used` on every entry.
    pub fn set_used(&mut self, used: bool) {
        for reference in self.refs.values_mut() {
            reference.used = used;
        }
    }

    /// Every used reference is resolved.
    pub fn resolved(&self) -> bool {
        self.refs.values().filter(|r| r.used).all(|r| r.resolved)
    }

    /// Every used reference is resolved and error-free.
    pub fn ok(&self) -> bool {
        self.refs.values().filter(|r| r.used).all(Reference::is_ok)
    }

    /// At least one reference is used.
    pub fn used(&self) -> bool {
        self.refs.values().any(|r| r.used)
    }

    pub fn get(&self, id: &R) -> Option<&Reference<R>> {
        self.refs.get(id)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// References in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Reference<R>> {
        self.refs.values()
    }

    /// A new log containing the entries that satisfy `pred`.
    pub fn filter(&self, mut pred: impl FnMut(&Reference<R>) -> bool) -> Self {
        Self {
            refs: self
                .refs
                .iter()
                .filter(|(_, r)| pred(r))
                .map(|(id, r)| (id.clone(), r.clone()))
                .collect(),
        }
    }
}

impl<R: ReferenceId> FromIterator<Reference<R>> for ReferenceLog<R> {
    fn from_iter<I: IntoIterator<Item = Reference<R>>>(iter: I) -> Self {
        let mut log = Self::new();
        log.extend(iter);
        log
    }
}

impl<R: ReferenceId> Extend<Reference<R>> for ReferenceLog<R> {
    fn extend<I: IntoIterator<Item = Reference<R>>>(&mut self, iter: I) {
        for reference in iter {
            self.set(reference);
        }
    }
}

impl<R: ReferenceId> IntoIterator for ReferenceLog<R> {
    type Item = Reference<R>;
    type IntoIter = std::collections::btree_map::IntoValues<R, Reference<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.refs.into_values()
    }
}

impl<R: ReferenceId> fmt::Debug for ReferenceLog<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.refs.values()).finish()
    }
}

impl<R: ReferenceId> fmt::Display for ReferenceLog<R> {
    /// One line per reference: `*` resolved ok, `!` errored, `?` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reference in self.refs.values() {
            writeln!(f, "{reference}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NotFound;

    impl fmt::Display for NotFound {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "not found")
        }
    }

    impl std::error::Error for NotFound {}

    #[test]
    fn test_merge_rule() {
        let mut r = Reference::observed("a".to_string()).unused();
        r.merge(&Reference::errored("a".to_string(), NotFound));
        assert!(r.used && r.resolved);
        assert_eq!(r.error.as_ref().unwrap().to_string(), "not found");
        r.merge(&Reference::ok("a".to_string()));
        assert!(r.error.is_some(), "first error wins");
    }

    #[test]
    fn test_log_predicates() {
        let mut log: ReferenceLog<String> = ReferenceLog::new();
        assert!(log.ok() && log.resolved() && !log.used());
        log.set(Reference::ok("a".into()));
        assert!(log.ok() && log.used());
        log.set(Reference::observed("b".into()).unused());
        assert!(log.ok(), "unused references do not count");
        log.set(Reference::errored("c".into(), NotFound));
        assert!(log.resolved());
        assert!(!log.ok());
        log.set(Reference::observed("d".into()));
        assert!(!log.resolved());
    }

    #[test]
    fn test_set_used_is_uniform() {
        let mut log: ReferenceLog<String> =
            [Reference::ok("a".into()), Reference::observed("b".into())]
                .into_iter()
                .collect();
        log.set_used(false);
        assert!(log.iter().all(|r| !r.used));
        assert!(!log.used());
    }

    #[test]
    fn test_display_order_and_prefixes() {
        let log: ReferenceLog<String> = [
            Reference::observed("zeta".into()),
            Reference::errored("beta".into(), NotFound),
            Reference::ok("alpha".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(log.to_string(), "* alpha\n! beta: not found\n? zeta\n");
    }

    #[test]
    fn test_filter() {
        let log: ReferenceLog<String> = [Reference::ok("a".into()), Reference::observed("b".into())]
            .into_iter()
            .collect();
        let unresolved = log.filter(|r| !r.resolved);
        assert_eq!(unresolved.len(), 1);
        assert!(unresolved.get(&"b".to_string()).is_some());
    }
}
