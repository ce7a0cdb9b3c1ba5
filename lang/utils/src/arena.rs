use std::{
    collections::HashMap,
    hash::Hash,
    ops::{Index, IndexMut},
};

/* ---------------------------------- Index --------------------------------- */

pub use crate::new_key_type;

/// Ids handed out by an arena allocator.
///
/// # Safety
/// `index` must return the slot the id was created with; arenas index their
/// storage with it without further checks.
pub unsafe trait IndexLike: Clone + Copy + Eq + Hash {
    type Meta;
    fn new(meta: Self::Meta, idx: usize) -> Self;
    fn index(&self) -> usize;
}

/* -------------------------------- Allocator ------------------------------- */

#[derive(Debug, Clone)]
pub struct IndexAlloc<Meta>(Meta, usize);

impl IndexAlloc<()> {
    pub fn new() -> Self {
        IndexAlloc((), 0)
    }
}

impl Default for IndexAlloc<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Meta: Copy> Iterator for IndexAlloc<Meta> {
    type Item = (Meta, usize);
    fn next(&mut self) -> Option<Self::Item> {
        let IndexAlloc(meta, idx) = self;
        let old = *idx;
        *idx += 1;
        Some((*meta, old))
    }
}

/* ---------------------------------- Arena --------------------------------- */

pub trait ArenaAccess<Id, T>: Index<Id, Output = T> + IndexMut<Id, Output = T> {
    fn get(&self, id: Id) -> Option<&T>;
    fn get_mut(&mut self, id: Id) -> Option<&mut T>;
}

/// An append-only arena; ids are handed out in allocation order.
#[derive(Debug, Clone)]
pub struct ArenaDense<Id, T, Meta = ()> {
    allocator: IndexAlloc<Meta>,
    vec: Vec<T>,
    _marker: std::marker::PhantomData<Id>,
}

/// Side table keyed by ids of some other arena.
#[derive(Debug, Clone)]
pub struct ArenaAssoc<Id, T> {
    map: HashMap<Id, T>,
}

mod impls {
    use super::*;

    /* ------------------------------- ArenaDense ------------------------------- */

    impl<Id, T> Default for ArenaDense<Id, T, ()>
    where
        Id: IndexLike<Meta = ()>,
    {
        fn default() -> Self {
            Self {
                allocator: IndexAlloc((), 0),
                vec: Default::default(),
                _marker: Default::default(),
            }
        }
    }

    impl<Id, T, Meta> Index<&Id> for ArenaDense<Id, T, Meta>
    where
        Meta: Copy,
        Id: IndexLike<Meta = Meta>,
    {
        type Output = T;
        fn index(&self, id: &Id) -> &Self::Output {
            self.get(id).expect("id from a foreign arena")
        }
    }
    impl<Id, T, Meta> IndexMut<&Id> for ArenaDense<Id, T, Meta>
    where
        Meta: Copy,
        Id: IndexLike<Meta = Meta>,
    {
        fn index_mut(&mut self, id: &Id) -> &mut Self::Output {
            self.get_mut(id).expect("id from a foreign arena")
        }
    }

    impl<Id, T, Meta> ArenaDense<Id, T, Meta>
    where
        Meta: Copy,
        Id: IndexLike<Meta = Meta>,
    {
        pub fn new(allocator: IndexAlloc<Meta>) -> Self {
            ArenaDense { allocator, vec: Vec::new(), _marker: std::marker::PhantomData }
        }
        pub fn alloc(&mut self, val: T) -> Id {
            let (meta, idx) = self.allocator.next().expect("allocator is infinite");
            self.vec.push(val);
            IndexLike::new(meta, idx)
        }
        pub fn len(&self) -> usize {
            self.vec.len()
        }
        pub fn is_empty(&self) -> bool {
            self.vec.is_empty()
        }
        pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> + '_ {
            let meta = self.allocator.0;
            self.vec.iter().enumerate().map(move |(idx, val)| (Id::new(meta, idx), val))
        }
    }

    impl<Id, T, Meta> ArenaAccess<&Id, T> for ArenaDense<Id, T, Meta>
    where
        Meta: Copy,
        Id: IndexLike<Meta = Meta>,
    {
        fn get(&self, id: &Id) -> Option<&T> {
            self.vec.get(id.index())
        }
        fn get_mut(&mut self, id: &Id) -> Option<&mut T> {
            self.vec.get_mut(id.index())
        }
    }

    /* ------------------------------- ArenaAssoc ------------------------------- */

    impl<Id, T> ArenaAssoc<Id, T> {
        pub fn new() -> Self {
            ArenaAssoc { map: HashMap::new() }
        }
    }

    impl<Id, T> Default for ArenaAssoc<Id, T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<Id, T> ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
    {
        pub fn insert(&mut self, id: Id, val: T) {
            self.map.insert(id, val);
        }
        pub fn get(&self, id: &Id) -> Option<&T> {
            self.map.get(id)
        }
        pub fn contains(&self, id: &Id) -> bool {
            self.map.contains_key(id)
        }
        pub fn len(&self) -> usize {
            self.map.len()
        }
        pub fn is_empty(&self) -> bool {
            self.map.is_empty()
        }
    }

    impl<Id, T> Index<&Id> for ArenaAssoc<Id, T>
    where
        Id: Eq + Hash,
    {
        type Output = T;
        fn index(&self, id: &Id) -> &Self::Output {
            self.get(id).expect("id missing from side table")
        }
    }
}

#[macro_export]
macro_rules! new_key_type {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident < $meta:ty > ; $($rest:tt)* ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
        $vis struct $name($meta, usize);

        unsafe impl $crate::arena::IndexLike for $name {
            type Meta = $meta;
            fn new(meta: Self::Meta, idx: usize) -> Self {
                Self(meta, idx)
            }
            fn index(&self) -> usize {
                self.1
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.1)
            }
        }

        impl $name {
            pub fn concise(&self) -> String {
                format!("#{}", self.1)
            }
        }

        $crate::new_key_type!($($rest)*);
    };

    ( $(#[$outer:meta])* $vis:vis struct $name:ident ; $($rest:tt)* ) => {
        $crate::new_key_type!( $(#[$outer])* $vis struct $name<()> ; $($rest)* );
    };

    () => {}
}

#[cfg(test)]
mod tests {
    use super::*;

    new_key_type! {
        struct NodeId;
    }

    #[test]
    fn dense_ids_follow_allocation_order() {
        let mut arena: ArenaDense<NodeId, &str> = ArenaDense::default();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena[&b], "b");
        let all: Vec<_> = arena.iter().map(|(id, v)| (id.index(), *v)).collect();
        pretty_assertions::assert_eq!(all, vec![(0, "a"), (1, "b")]);
    }

    #[test]
    fn assoc_is_a_side_table() {
        let mut arena: ArenaDense<NodeId, ()> = ArenaDense::default();
        let a = arena.alloc(());
        let mut side = ArenaAssoc::new();
        side.insert(a, 42);
        assert_eq!(side[&a], 42);
        assert!(!side.contains(&arena.alloc(())));
    }
}
