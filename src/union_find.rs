//! Disjoint sets with a payload per class.
//!
//! Each class carries one payload value, held by its representative. Joining two classes
//! merges their payloads through a caller-supplied combinator, which may refuse the merge.

/// Outcome of [`UnionFind::union`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Union {
    /// Both elements were already in the same class.
    AlreadyJoined,
    /// The two classes were merged.
    Joined,
    /// The combinator refused to merge the payloads; nothing changed.
    Conflict,
}

/// Union-find with path compression and union by rank.
#[derive(Debug, Clone, Default)]
pub struct UnionFind<T> {
    parent: Vec<usize>,
    rank: Vec<u8>,
    /// `Some` exactly for representatives.
    payload: Vec<Option<T>>,
}

impl<T> UnionFind<T> {
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            rank: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Adds a singleton class and returns its element.
    pub fn add(&mut self, payload: T) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        self.payload.push(Some(payload));
        id
    }

    /// Representative of the class of `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x` was never added.
    pub fn find(&mut self, x: usize) -> usize {
        assert!(x < self.parent.len(), "Element {} is not registered", x);

        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Payload of the class of `x`.
    pub fn payload(&mut self, x: usize) -> &T {
        let root = self.find(x);
        match &self.payload[root] {
            Some(p) => p,
            None => unreachable!("Representative {} has no payload", root),
        }
    }

    pub fn same_class(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Joins the classes of `a` and `b` if `merge` accepts their payloads.
    pub fn union<F>(&mut self, a: usize, b: usize, merge: F) -> Union
    where
        F: FnOnce(&T, &T) -> Option<T>,
    {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return Union::AlreadyJoined;
        }

        let merged = match (&self.payload[ra], &self.payload[rb]) {
            (Some(pa), Some(pb)) => merge(pa, pb),
            _ => unreachable!("Representatives always carry a payload"),
        };
        let Some(merged) = merged else {
            return Union::Conflict;
        };

        let (root, child) = if self.rank[ra] < self.rank[rb] {
            (rb, ra)
        } else {
            (ra, rb)
        };
        if self.rank[ra] == self.rank[rb] {
            self.rank[root] += 1;
        }
        self.parent[child] = root;
        self.payload[child] = None;
        self.payload[root] = Some(merged);
        Union::Joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_flag(a: &bool, b: &bool) -> Option<bool> {
        (a == b).then_some(*a)
    }

    #[test]
    fn test_union_and_find() {
        let mut uf = UnionFind::new();
        let a = uf.add(1);
        let b = uf.add(2);
        let c = uf.add(3);
        assert!(!uf.same_class(a, b));

        assert_eq!(uf.union(a, b, |x, y| Some(x + y)), Union::Joined);
        assert!(uf.same_class(a, b));
        assert_eq!(*uf.payload(b), 3);

        assert_eq!(uf.union(b, a, |x, y| Some(x + y)), Union::AlreadyJoined);
        assert_eq!(uf.union(c, a, |x, y| Some(x + y)), Union::Joined);
        assert_eq!(*uf.payload(a), 6);
        assert_eq!(uf.len(), 3);
    }

    #[test]
    fn test_conflict_leaves_classes_apart() {
        let mut uf = UnionFind::new();
        let yes = uf.add(true);
        let no = uf.add(false);
        let yes2 = uf.add(true);

        assert_eq!(uf.union(yes, no, same_flag), Union::Conflict);
        assert!(!uf.same_class(yes, no));
        assert_eq!(uf.union(yes, yes2, same_flag), Union::Joined);
        assert_eq!(uf.union(yes2, no, same_flag), Union::Conflict);
    }

    #[test]
    fn test_long_chains_compress() {
        let mut uf = UnionFind::new();
        let elems: Vec<usize> = (0..100).map(|_| uf.add(())).collect();
        for w in elems.windows(2) {
            uf.union(w[0], w[1], |_, _| Some(()));
        }
        let root = uf.find(elems[99]);
        for &e in &elems {
            assert_eq!(uf.find(e), root);
        }
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_unknown_element_panics() {
        let mut uf: UnionFind<()> = UnionFind::new();
        uf.find(0);
    }
}
