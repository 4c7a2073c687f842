use core::{
    borrow::Borrow,
    fmt::Debug,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
};

use hashbrown::raw::{RawIter, RawIterHash, RawTable};

/// A collection of key-value pairs - similar to a HashMap - which allows for duplicate keys.
///
/// The name is inspired by Erlang's ETS bag table type which also allows duplicate records.
/// Entire key-value pairs may be duplicated. Conceptually this is a lot like
/// `HashMap<K, Vec<V>>`. In other languages like C++ this is called a [multimap].
/// Multimaps are usually preferred over `HashMap<K, Vec<V>>` in cases where there are few
/// duplicates since the overhead of the Vec is unnecessary in most lookups.
///
/// This is the backing storage of the word list. Word-list files may define a stem multiple
/// times with different sets of flags. Naively merging those definitions is not correct: the
/// flags in one set might forbid compounding while another set provides an affix which supports
/// it. So repeated keys stay repeated.
///
/// Internally this is built on Hashbrown's "raw" API - a set of tools for building [Swiss
/// Tables].
///
/// [multimap]: https://en.cppreference.com/w/cpp/container/multimap
/// [Swiss Tables]: https://abseil.io/blog/20180927-swisstables
pub struct HashBag<K, V, S> {
    table: RawTable<(K, V)>,
    build_hasher: S,
}

impl<K, V, S: BuildHasher + Default> HashBag<K, V, S> {
    pub fn new() -> Self {
        Self {
            table: RawTable::new(),
            build_hasher: S::default(),
        }
    }
}

impl<K, V, S: BuildHasher + Default> Default for HashBag<K, V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashBag<K, V, S> {
    pub fn iter(&self) -> Iter<'_, K, V> {
        // Here we tie the lifetime of self to the iter.
        Iter {
            inner: unsafe { self.table.iter() },
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

impl<K, V, S> HashBag<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: S) -> Self {
        Self {
            table: RawTable::with_capacity(capacity),
            build_hasher,
        }
    }

    pub fn insert(&mut self, k: K, v: V) {
        let hash = make_hash(&self.build_hasher, &k);
        let hasher = make_hasher(&self.build_hasher);
        self.table.reserve(1, make_hasher(&self.build_hasher));
        // Insert without attempting to find an existing entry with this key.
        self.table.insert(hash, (k, v), hasher);
    }

    /// Returns an iterator over all values inserted under key `k`.
    pub fn get_all<'bag, 'key, Q>(&'bag self, k: &'key Q) -> GetAllIter<'bag, 'key, Q, K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.build_hasher, k);

        GetAllIter {
            // Here we tie the lifetime of self to the iter.
            inner: unsafe { self.table.iter_hash(hash) },
            key: k,
            marker: PhantomData,
        }
    }

    /// Returns a mutable reference to the first value under key `k` for which `pred` holds.
    pub fn get_mut_where<Q, F>(&mut self, k: &Q, mut pred: F) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnMut(&V) -> bool,
    {
        let hash = make_hash(&self.build_hasher, k);
        let mut iter = unsafe { self.table.iter_hash(hash) };
        while let Some(bucket) = iter.next() {
            // SAFETY: the iterator does not outlive the table and the table is not resized
            // while it runs; the returned reference borrows `self` mutably.
            let (key, value) = unsafe { bucket.as_mut() };
            if (*key).borrow() == k && pred(value) {
                return Some(value);
            }
        }
        None
    }
}

impl<K, V, S> Debug for HashBag<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// `make_hash`, `make_hasher` and `Iter` are pulled from Hashbrown's `map` module.

fn make_hash<Q, S>(hash_builder: &S, val: &Q) -> u64
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    use core::hash::Hasher;
    let mut state = hash_builder.build_hasher();
    val.hash(&mut state);
    state.finish()
}

fn make_hasher<Q, V, S>(hash_builder: &S) -> impl Fn(&(Q, V)) -> u64 + '_
where
    Q: Hash,
    S: BuildHasher,
{
    move |val| make_hash::<Q, S>(hash_builder, &val.0)
}

pub struct Iter<'a, K, V> {
    inner: RawIter<(K, V)>,
    marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        // Avoid `Option::map` because it bloats LLVM IR.
        match self.inner.next() {
            Some(x) => unsafe {
                let r = x.as_ref();
                Some((&r.0, &r.1))
            },
            None => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

pub struct GetAllIter<'bag, 'key, Q: ?Sized, K, V>
where
    K: Borrow<Q>,
    Q: Hash + Eq,
{
    inner: RawIterHash<(K, V)>,
    key: &'key Q,
    marker: PhantomData<(&'bag K, &'bag V)>,
}

impl<'bag, 'key, Q: ?Sized, K, V> Iterator for GetAllIter<'bag, 'key, Q, K, V>
where
    K: Borrow<Q>,
    Q: Hash + Eq,
{
    type Item = &'bag V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next() {
                Some(bucket) => {
                    // SAFETY: the creator of the iterator (`get_all`) ensures that the reference
                    // to the value outlives the RawTable. It also prevents concurrent
                    // modifications to the table.
                    let element = unsafe { bucket.as_ref() };
                    if self.key.eq(element.0.borrow()) {
                        return Some(&element.1);
                    }
                    continue;
                }
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_and_get_duplicate_keys() {
        let mut bag: HashBag<u32, u32, ahash::RandomState> = HashBag::new();
        bag.insert(1, 1);
        bag.insert(5, 5);
        assert!(bag.len() == 2);
        bag.insert(1, 2);
        assert!(bag.len() == 3);

        let mut vals: Vec<_> = bag.get_all(&1).copied().collect();
        vals.sort_unstable();
        assert_eq!(&[1, 2], vals.as_slice());
    }

    #[test]
    fn string_keys() {
        let mut bag: HashBag<String, &str, ahash::RandomState> = HashBag::new();
        bag.insert("hello".to_string(), "bob");
        bag.insert("hello".to_string(), "world");
        bag.insert("bye".to_string(), "bob");

        let mut hellos: Vec<_> = bag.get_all("hello").copied().collect();
        hellos.sort_unstable();
        assert_eq!(&["bob", "world"], hellos.as_slice());

        assert_eq!(bag.get_all("bye").count(), 1);
        assert_eq!(bag.get_all("missing").count(), 0);
    }

    #[test]
    fn get_mut_where_picks_matching_value() {
        let mut bag: HashBag<String, u32, ahash::RandomState> = HashBag::new();
        bag.insert("key".to_string(), 1);
        bag.insert("key".to_string(), 2);

        assert!(bag.get_mut_where("key", |v| *v > 10).is_none());
        if let Some(v) = bag.get_mut_where("key", |v| *v == 2) {
            *v = 20;
        }
        let mut vals: Vec<_> = bag.get_all("key").copied().collect();
        vals.sort_unstable();
        assert_eq!(&[1, 20], vals.as_slice());
    }
}
