use std::collections::HashMap;

use super::NodeIdx;

/// Identifier → node lookup for one forest.
///
/// Writes always win: registering an identifier twice leaves only the second node
/// reachable. There is no removal; entries live as long as the forest.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: HashMap<String, NodeIdx>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` under `id`, returning the entry it replaced.
    pub fn register(&mut self, id: impl Into<String>, node: NodeIdx) -> Option<NodeIdx> {
        let id = id.into();
        let prev = self.entries.insert(id.clone(), node);
        if let Some(prev) = prev {
            log::trace!("registry: {id:?} now {node:?} (was {prev:?})");
        }
        prev
    }

    #[inline]
    pub fn lookup(&self, id: &str) -> Option<NodeIdx> {
        self.entries.get(id).copied()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
