//! The tree of root-level operators.

use indexmap::IndexMap;

use super::OpKey;
use crate::Path;

/// A tree whose leaves are operators and whose branches are plain keys.
///
/// The op tree mirrors where root operators sit in the data tree; operators
/// nested under another operator are reached through their parent instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpTree {
    Op(OpKey),
    Branch(IndexMap<String, OpTree>),
}

impl Default for OpTree {
    fn default() -> Self {
        OpTree::Branch(IndexMap::new())
    }
}

impl From<OpKey> for OpTree {
    fn from(key: OpKey) -> Self {
        OpTree::Op(key)
    }
}

impl OpTree {
    pub fn branch() -> Self {
        Self::default()
    }

    /// Add a child under `key`. Replaces a leaf with a branch if needed.
    ///
    /// ```
    /// use alma::{Model, OpTree};
    /// use alma::operators::Counter;
    ///
    /// let mut model = Model::new();
    /// let counter = model.insert_op(Counter::new());
    /// let tree = OpTree::branch().with("foo", OpTree::branch().with("counter", counter));
    /// assert_eq!(tree.leaves(), vec![(vec!["foo".to_string(), "counter".to_string()], counter)]);
    /// ```
    pub fn with(mut self, key: impl Into<String>, child: impl Into<OpTree>) -> Self {
        if !matches!(self, OpTree::Branch(_)) {
            self = OpTree::branch();
        }
        if let OpTree::Branch(map) = &mut self {
            map.insert(key.into(), child.into());
        }
        self
    }

    pub fn as_op(&self) -> Option<OpKey> {
        match self {
            OpTree::Op(key) => Some(*key),
            OpTree::Branch(_) => None,
        }
    }

    pub fn get(&self, path: &[String]) -> Option<&OpTree> {
        let mut current = self;
        for step in path {
            match current {
                OpTree::Branch(map) => current = map.get(step)?,
                OpTree::Op(_) => return None,
            }
        }
        Some(current)
    }

    /// Every operator leaf with its path, in insertion order.
    pub fn leaves(&self) -> Vec<(Path, OpKey)> {
        let mut out = Vec::new();
        collect_leaves(self, &mut Vec::new(), &mut out);
        out
    }

    pub(crate) fn insert(&mut self, path: &[String], key: OpKey) {
        let mut current = self;
        for step in path {
            if !matches!(current, OpTree::Branch(_)) {
                *current = OpTree::branch();
            }
            current = match current {
                OpTree::Branch(map) => map.entry(step.clone()).or_default(),
                OpTree::Op(_) => return,
            };
        }
        *current = OpTree::Op(key);
    }

    /// Remove the leaf at `path` if it holds `key`.
    pub(crate) fn remove(&mut self, path: &[String], key: OpKey) -> bool {
        let Some((last, parents)) = path.split_last() else {
            if *self == OpTree::Op(key) {
                *self = OpTree::branch();
                return true;
            }
            return false;
        };
        let mut current = self;
        for step in parents {
            current = match current {
                OpTree::Branch(map) => match map.get_mut(step) {
                    Some(child) => child,
                    None => return false,
                },
                OpTree::Op(_) => return false,
            };
        }
        match current {
            OpTree::Branch(map) if map.get(last) == Some(&OpTree::Op(key)) => {
                map.shift_remove(last);
                true
            }
            _ => false,
        }
    }
}

fn collect_leaves(tree: &OpTree, path: &mut Path, out: &mut Vec<(Path, OpKey)>) {
    match tree {
        OpTree::Op(key) => out.push((path.clone(), *key)),
        OpTree::Branch(map) => {
            for (step, child) in map {
                path.push(step.clone());
                collect_leaves(child, path, out);
                path.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arena::OpArena;
    use crate::operators::Noop;
    use alma_path::to_path;

    fn keys(n: usize) -> Vec<OpKey> {
        let mut arena = OpArena::default();
        (0..n).map(|_| arena.insert(Box::new(Noop))).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let k = keys(2);
        let mut tree = OpTree::branch();
        tree.insert(&to_path(["a", "b"]), k[0]);
        tree.insert(&to_path(["c"]), k[1]);
        assert_eq!(tree.get(&to_path(["a", "b"])).and_then(OpTree::as_op), Some(k[0]));
        assert_eq!(tree.get(&to_path(["c"])).and_then(OpTree::as_op), Some(k[1]));
        assert!(tree.get(&to_path(["c", "d"])).is_none());
    }

    #[test]
    fn test_leaves_in_insertion_order() {
        let k = keys(3);
        let tree = OpTree::branch()
            .with("z", k[0])
            .with("a", OpTree::branch().with("x", k[1]))
            .with("m", k[2]);
        let leaves: Vec<OpKey> = tree.leaves().into_iter().map(|(_, key)| key).collect();
        assert_eq!(leaves, k);
    }

    #[test]
    fn test_remove_only_matching_leaf() {
        let k = keys(2);
        let mut tree = OpTree::branch().with("a", k[0]);
        assert!(!tree.remove(&to_path(["a"]), k[1]));
        assert!(tree.remove(&to_path(["a"]), k[0]));
        assert!(tree.leaves().is_empty());
    }

    #[test]
    fn test_root_leaf() {
        let k = keys(1);
        let mut tree = OpTree::branch();
        tree.insert(&[], k[0]);
        assert_eq!(tree.as_op(), Some(k[0]));
        assert!(tree.remove(&[], k[0]));
        assert_eq!(tree, OpTree::branch());
    }
}
