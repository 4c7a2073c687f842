//! The word list parsed from `.dic` files.

pub(crate) mod parser;

use std::hash::BuildHasher;

use hashbrown::hash_map::DefaultHashBuilder;

use crate::{hash_bag::HashBag, FlagSet, HIDDEN_HOMONYM_FLAG};

/// The casing shape of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    /// All lowercase, or no cased letters at all: "table", "1234".
    AllLower,
    /// Uppercase letters only: "UNESCO".
    AllCapital,
    /// An uppercase first letter with lowercase after it: "Amsterdam", "McDonald".
    Pascal,
    /// A lowercase first letter with uppercase after it: "iPod".
    Camel,
    /// Both cases present but the first character is caseless: "1stPlace".
    Mixed,
}

/// Classifies the casing shape of `word` under Unicode simple case
/// predicates.
pub fn classify_casing(word: &str) -> Casing {
    let mut upper = 0;
    let mut lower = 0;
    for ch in word.chars() {
        if ch.is_uppercase() {
            upper += 1;
        } else if ch.is_lowercase() {
            lower += 1;
        }
    }

    if upper == 0 {
        return Casing::AllLower;
    }
    if lower == 0 {
        return Casing::AllCapital;
    }
    match word.chars().next() {
        Some(first) if first.is_uppercase() => Casing::Pascal,
        Some(first) if first.is_lowercase() => Casing::Camel,
        _ => Casing::Mixed,
    }
}

/// The word list: a multimap from stem to flag set.
///
/// A stem may be defined several times with different flag sets; those
/// definitions stay separate (see [`HashBag`]'s docs for why merging them
/// would be wrong). Inserting classifies the stem's casing and may add one
/// extra entry: a mixed-case stem also registers its uppercase form tagged
/// with [`HIDDEN_HOMONYM_FLAG`] so that all-caps input can be recognized
/// without accepting arbitrary case variants, and an all-caps stem from the
/// file replaces such a hidden entry rather than shadowing it.
pub struct WordList<S: BuildHasher = DefaultHashBuilder> {
    inner: HashBag<String, FlagSet, S>,
}

impl<S: BuildHasher + Default> WordList<S> {
    pub fn new() -> Self {
        Self {
            inner: HashBag::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: HashBag::with_capacity_and_hasher(capacity, S::default()),
        }
    }
}

impl<S: BuildHasher + Default> Default for WordList<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BuildHasher> WordList<S> {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// All flag sets stored for `stem`, one per homonym.
    pub fn homonyms<'a>(&'a self, stem: &'a str) -> impl Iterator<Item = &'a FlagSet> {
        self.inner.get_all(stem)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagSet)> {
        self.inner.iter().map(|(stem, flags)| (stem.as_str(), flags))
    }

    /// Inserts a stem under the casing discipline.
    pub fn insert(&mut self, stem: String, flags: FlagSet) {
        match classify_casing(&stem) {
            Casing::AllCapital => {
                // An all-caps stem from the file replaces the flags of a previously installed
                // hidden homonym for the same key.
                match self
                    .inner
                    .get_mut_where(stem.as_str(), |existing| {
                        existing.contains(HIDDEN_HOMONYM_FLAG)
                    }) {
                    Some(existing) => *existing = flags,
                    None => self.inner.insert(stem, flags),
                }
            }
            Casing::Pascal | Casing::Camel => {
                let upper = stem.to_uppercase();
                self.inner.insert(stem, flags.clone());

                // Add the hidden homonym directly in uppercase, unless one is already there.
                let already_hidden = self
                    .inner
                    .get_all(upper.as_str())
                    .any(|existing| existing.contains(HIDDEN_HOMONYM_FLAG));
                if !already_hidden {
                    let mut hidden = flags;
                    hidden.insert(HIDDEN_HOMONYM_FLAG);
                    self.inner.insert(upper, hidden);
                }
            }
            _ => self.inner.insert(stem, flags),
        }
    }
}

impl<S: BuildHasher> std::fmt::Debug for WordList<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &format!("{} entries", self.len()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flagset;

    #[test]
    fn classify_casing_shapes() {
        assert_eq!(classify_casing(""), Casing::AllLower);
        assert_eq!(classify_casing("1234"), Casing::AllLower);
        assert_eq!(classify_casing("drink"), Casing::AllLower);
        assert_eq!(classify_casing("UNESCO"), Casing::AllCapital);
        assert_eq!(classify_casing("Amsterdam"), Casing::Pascal);
        assert_eq!(classify_casing("McDonald"), Casing::Pascal);
        assert_eq!(classify_casing("iPod"), Casing::Camel);
        assert_eq!(classify_casing("1stPlace"), Casing::Mixed);

        // Non-ASCII casing goes through Unicode predicates.
        assert_eq!(classify_casing("ёлка"), Casing::AllLower);
        assert_eq!(classify_casing("ЁЛКА"), Casing::AllCapital);
        assert_eq!(classify_casing("Ёлка"), Casing::Pascal);
    }

    fn flag_sets<'a>(
        words: &'a WordList<ahash::RandomState>,
        stem: &'a str,
    ) -> Vec<&'a FlagSet> {
        let mut sets: Vec<_> = words.homonyms(stem).collect();
        sets.sort();
        sets
    }

    #[test]
    fn pascal_stem_installs_hidden_homonym() {
        let mut words = WordList::<ahash::RandomState>::new();
        words.insert("Ab".to_string(), flagset!['X']);

        assert_eq!(flag_sets(&words, "Ab"), [&flagset!['X']]);
        assert_eq!(
            flag_sets(&words, "AB"),
            [&flagset!['X' as u16, HIDDEN_HOMONYM_FLAG.get()]]
        );
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn camel_stem_installs_hidden_homonym() {
        let mut words = WordList::<ahash::RandomState>::new();
        words.insert("iPod".to_string(), flagset!['X']);

        assert!(words
            .homonyms("IPOD")
            .any(|flags| flags.contains(HIDDEN_HOMONYM_FLAG)));
    }

    #[test]
    fn hidden_homonym_is_not_duplicated() {
        let mut words = WordList::<ahash::RandomState>::new();
        words.insert("Ab".to_string(), flagset!['X']);
        words.insert("aB".to_string(), flagset!['Y']);

        // Both variants are stored but only one hidden homonym exists.
        assert_eq!(words.homonyms("AB").count(), 1);
        assert_eq!(words.len(), 3);
    }

    #[test]
    fn all_capital_replaces_hidden_homonym() {
        let mut words = WordList::<ahash::RandomState>::new();
        words.insert("Ab".to_string(), flagset!['X']);
        words.insert("AB".to_string(), flagset!['Y']);

        // The real all-caps definition replaces the hidden entry in place.
        assert_eq!(flag_sets(&words, "AB"), [&flagset!['Y']]);
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn all_capital_plain_insert_without_hidden_homonym() {
        let mut words = WordList::<ahash::RandomState>::new();
        words.insert("NASA".to_string(), flagset!['N']);
        words.insert("NASA".to_string(), flagset!['M']);

        assert_eq!(words.homonyms("NASA").count(), 2);
    }

    #[test]
    fn lowercase_stems_are_plain_inserts() {
        let mut words = WordList::<ahash::RandomState>::new();
        words.insert("drink".to_string(), flagset!['D']);

        assert_eq!(flag_sets(&words, "drink"), [&flagset!['D']]);
        assert_eq!(words.homonyms("DRINK").count(), 0);
        assert_eq!(words.len(), 1);
    }
}
