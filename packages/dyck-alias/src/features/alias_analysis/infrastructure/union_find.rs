//! Union-Find over vertex indices
//!
//! The alias graph decides which vertex survives a merge (by degree), so
//! unlike a rank-balanced union this structure takes the survivor as an
//! argument. Path compression keeps chains short.
//!
//! # References
//! - Tarjan, R. E. "Efficiency of a Good But Not Linear Set Union Algorithm" (1975)

/// Disjoint sets over dense `u32` elements, grown one singleton at a time
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    /// Parent pointers (self-loop = root)
    parent: Vec<u32>,
}

impl UnionFind {
    /// Append a fresh singleton and return it
    pub fn push(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    /// Find the representative of `x`, compressing the path behind it
    #[inline]
    pub fn find(&mut self, x: u32) -> u32 {
        let root = self.find_readonly(x);

        let mut current = x;
        while current != root {
            let next = self.parent[current as usize];
            self.parent[current as usize] = root;
            current = next;
        }
        root
    }

    /// Find without path compression (for read-only queries)
    #[inline]
    pub fn find_readonly(&self, x: u32) -> u32 {
        let mut current = x;
        while self.parent[current as usize] != current {
            current = self.parent[current as usize];
        }
        current
    }

    /// Attach the set of `absorbed` under the root of `survivor`
    ///
    /// Returns the surviving root.
    pub fn union_into(&mut self, absorbed: u32, survivor: u32) -> u32 {
        let from = self.find(absorbed);
        let to = self.find(survivor);
        if from != to {
            self.parent[from as usize] = to;
        }
        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singletons(n: usize) -> UnionFind {
        let mut uf = UnionFind::default();
        for _ in 0..n {
            uf.push();
        }
        uf
    }

    #[test]
    fn test_union_into_keeps_survivor() {
        let mut uf = singletons(4);

        assert_eq!(uf.union_into(0, 3), 3);
        assert_eq!(uf.find(0), 3);

        // absorbing into a non-root lands on that root
        assert_eq!(uf.union_into(1, 0), 3);
        assert_eq!(uf.find_readonly(1), 3);
        assert_ne!(uf.find_readonly(2), uf.find_readonly(3));
    }

    #[test]
    fn test_union_same_set_is_noop() {
        let mut uf = singletons(2);
        uf.union_into(0, 1);
        assert_eq!(uf.union_into(1, 0), 1);
        assert_eq!(uf.find(0), 1);
    }

    #[test]
    fn test_path_compression() {
        let mut uf = singletons(100);

        // long chain 0 → 1 → ... → 99
        for i in 0..99 {
            uf.union_into(i, i + 1);
        }

        assert_eq!(uf.find(0), 99);
        // after compression every element points straight at the root
        for i in 0..99 {
            assert_eq!(uf.parent[i as usize], 99);
        }
    }

    #[test]
    fn test_push_grows_dynamically() {
        let mut uf = UnionFind::default();
        let a = uf.push();
        let b = uf.push();
        assert_eq!((a, b), (0, 1));

        uf.union_into(a, b);
        assert_eq!(uf.find_readonly(a), uf.find_readonly(b));
    }
}
