//! Disjoint-set forest (union-find) over arbitrary hashable ids.
//!
//! Used by the net builder to merge provisional nets that share a `NET`
//! label, and by the junction merger to follow wires that have been absorbed
//! into another wire during a sweep.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct DisjointSet<K> {
    index: HashMap<K, usize>,
    keys: Vec<K>,
    parent: Vec<usize>,
}

impl<K: Hash + Eq + Clone> DisjointSet<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            keys: Vec::new(),
            parent: Vec::new(),
        }
    }

    /// Register `key` as a singleton set if it is not known yet.
    pub fn insert(&mut self, key: K) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.keys.len();
        self.index.insert(key.clone(), i);
        self.keys.push(key);
        self.parent.push(i);
        i
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn find_index(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // path compression
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Representative of `key`'s set. Unknown keys are inserted first.
    pub fn find(&mut self, key: &K) -> K {
        let i = self.insert(key.clone());
        let root = self.find_index(i);
        self.keys[root].clone()
    }

    /// Merge the sets of `a` and `b`; `a`'s root is attached under `b`'s.
    /// Returns false when they were already joined.
    pub fn union(&mut self, a: &K, b: &K) -> bool {
        let ia = self.insert(a.clone());
        let ib = self.insert(b.clone());
        let ra = self.find_index(ia);
        let rb = self.find_index(ib);
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }

    pub fn same_set(&mut self, a: &K, b: &K) -> bool {
        self.find(a) == self.find(b)
    }

    /// All sets, each as the list of its members in insertion order.
    pub fn groups(&mut self) -> Vec<Vec<K>> {
        let mut by_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<K>> = Vec::new();
        for i in 0..self.keys.len() {
            let root = self.find_index(i);
            let slot = *by_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(self.keys[i].clone());
        }
        groups
    }
}

impl<K: Hash + Eq + Clone> Default for DisjointSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
