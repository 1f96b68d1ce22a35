//! The branch lineage: a child → parent forest over local branches.
//!
//! Roots are the main branch and perennial branches. `ancestors` walks
//! root-first so sync programs absorb the trunk before closer parents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::branch::LocalBranchName;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lineage {
    entries: BTreeMap<LocalBranchName, LocalBranchName>,
}

impl Lineage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn parent(&self, branch: &LocalBranchName) -> Option<&LocalBranchName> {
        self.entries.get(branch)
    }

    pub fn has_parent(&self, branch: &LocalBranchName) -> bool {
        self.entries.contains_key(branch)
    }

    pub fn set_parent(&mut self, child: LocalBranchName, parent: LocalBranchName) {
        self.entries.insert(child, parent);
    }

    /// All ancestors of `branch`, root first, excluding `branch` itself.
    ///
    /// Stops when a branch has no recorded parent or when the walk would
    /// revisit a branch (defanging a corrupt, cyclic lineage).
    pub fn ancestors(&self, branch: &LocalBranchName) -> Vec<LocalBranchName> {
        let mut chain = Vec::new();
        let mut current = branch;
        while let Some(parent) = self.entries.get(current) {
            if chain.contains(parent) || parent == branch {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Direct children of `branch`, sorted by name.
    pub fn children(&self, branch: &LocalBranchName) -> Vec<LocalBranchName> {
        self.entries
            .iter()
            .filter(|(_, parent)| *parent == branch)
            .map(|(child, _)| child.clone())
            .collect()
    }

    /// Drop `branch` from the lineage. Its children are re-parented to the
    /// removed branch's parent, or detached if that parent is unknown.
    pub fn remove(&mut self, branch: &LocalBranchName) {
        let new_parent = self.entries.remove(branch);
        for child in self.children(branch) {
            match &new_parent {
                Some(parent) => self.set_parent(child, parent.clone()),
                None => {
                    self.entries.remove(&child);
                }
            }
        }
    }

    /// Branches that appear as parents but have no parent themselves.
    pub fn roots(&self) -> Vec<LocalBranchName> {
        let mut roots: Vec<LocalBranchName> = self
            .entries
            .values()
            .filter(|parent| !self.entries.contains_key(*parent))
            .cloned()
            .collect();
        roots.sort();
        roots.dedup();
        roots
    }

    /// All branches mentioned in the lineage (children and parents), sorted.
    pub fn branch_names(&self) -> Vec<LocalBranchName> {
        let mut names: Vec<LocalBranchName> = self.entries.keys().cloned().collect();
        names.extend(self.entries.values().cloned());
        names.sort();
        names.dedup();
        names
    }

    /// `branch` plus all its ancestors, root first.
    pub fn branch_and_ancestors(&self, branch: &LocalBranchName) -> Vec<LocalBranchName> {
        let mut result = self.ancestors(branch);
        result.push(branch.clone());
        result
    }

    /// All lineage branches ordered so that every parent precedes its
    /// children. Used by `sync --all`.
    pub fn order_hierarchically(&self) -> Vec<LocalBranchName> {
        let mut ordered = Vec::new();
        for name in self.branch_names() {
            for link in self.branch_and_ancestors(&name) {
                if !ordered.contains(&link) {
                    ordered.push(link);
                }
            }
        }
        ordered
    }

    pub fn entries(&self) -> impl Iterator<Item = (&LocalBranchName, &LocalBranchName)> {
        self.entries.iter()
    }

    /// Semantic invariants: no cycles, every non-root reachable to a root.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for child in self.entries.keys() {
            let mut seen = vec![child.clone()];
            let mut current = child;
            while let Some(parent) = self.entries.get(current) {
                if seen.contains(parent) {
                    errors.push(format!("lineage cycle involving branch {child}"));
                    break;
                }
                seen.push(parent.clone());
                current = parent;
            }
        }
        errors
    }
}
