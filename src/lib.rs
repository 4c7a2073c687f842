//! Parsing and data structures for Hunspell-compatible dictionaries.
//!
//! A dictionary is distributed as two files: an affix file (`.aff`) holding
//! the language's configuration — prefix/suffix rules, compounding options,
//! conversion tables, suggestion hints — and a word-list file (`.dic`)
//! holding stems annotated with flags. This crate parses both into the
//! lookup structures a checker needs: flag sets with set-algebra semantics,
//! prefix/suffix indexes keyed by the appended surface text, a longest-match
//! substring replacer, a break-pattern table and the word list itself.
//!
//! The checking and suggestion algorithms that consume these structures live
//! downstream; [`AffData`] is the hand-off point. A fully parsed `AffData`
//! is never mutated again, so sharing it between readers is safe.
//!
//! ```no_run
//! use std::{fs::File, io::BufReader};
//! use grimoire::AffData;
//!
//! let mut data = AffData::new();
//! data.parse_aff(&mut BufReader::new(File::open("en_US.aff")?))?;
//! data.parse_dic(&mut BufReader::new(File::open("en_US.dic")?))?;
//! assert!(data.words.homonyms("drink").next().is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aff;
pub mod dic;
pub mod encoding;
mod hash_bag;
mod macros;

pub use aff::parser::{
    ConditionError, ParseCompoundRuleError, ParseDictionaryError, ParseDictionaryErrorKind,
    ParseDictionaryErrorSource, ParseFlagError, UnknownFlagTypeError,
};
pub use aff::{AffData, AffOptions, BreakTable, FlagType, Prefix, Suffix, SubstrReplacer};
pub use dic::{classify_casing, Casing, WordList};
pub use encoding::Encoding;

/// The internal representation of a flag.
///
/// Flags are opaque 16-bit tags: their meaning comes only from the commands
/// that register them (`COMPOUNDFLAG`, `NOSUGGEST`, ...). Zero is reserved
/// as "no flag" which makes `Option<Flag>` a free niche optimization.
pub type Flag = core::num::NonZeroU16;

/// A sentinel flag marking the hidden homonym of a mixed-case stem.
///
/// When the word list gains a `Pascal`- or `Camel`-cased stem, an extra
/// upper-cased entry carrying this flag is inserted so that all-caps input
/// can be matched without accepting arbitrary case variants. The flag never
/// appears in a dictionary file; `u16::MAX` is outside every flag encoding
/// scheme's range of meaningful values.
pub const HIDDEN_HOMONYM_FLAG: Flag = unsafe { Flag::new_unchecked(u16::MAX) };

/// The set of all flags on a stem or affix.
///
/// Internally a sorted, duplicate-free sequence. Construction from an
/// arbitrary sequence sorts and de-duplicates; every query is a binary
/// search or a linear merge walk. Two flag sets are equal iff their
/// sequences are identical.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlagSet(Vec<Flag>);

impl FlagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn as_slice(&self) -> &[Flag] {
        &self.0
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Flag> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn contains(&self, flag: Flag) -> bool {
        self.0.binary_search(&flag).is_ok()
    }

    /// Inserts `flag`, keeping the sequence sorted. No-op if already present.
    pub fn insert(&mut self, flag: Flag) {
        if let Err(idx) = self.0.binary_search(&flag) {
            self.0.insert(idx, flag);
        }
    }

    /// Removes one flag. Returns whether the flag was present.
    pub fn erase(&mut self, flag: Flag) -> bool {
        match self.0.binary_search(&flag) {
            Ok(idx) => {
                self.0.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    pub fn union(&self, other: &FlagSet) -> FlagSet {
        use core::cmp::Ordering;

        let mut merged = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                Ordering::Less => {
                    merged.push(self.0[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(other.0[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    merged.push(self.0[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.0[i..]);
        merged.extend_from_slice(&other.0[j..]);
        FlagSet(merged)
    }

    /// Whether any flag is shared between `self` and `other`.
    pub fn has_intersection(&self, other: &FlagSet) -> bool {
        use core::cmp::Ordering;

        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// Whether every flag of `other` is contained in `self`.
    pub fn is_superset(&self, other: &FlagSet) -> bool {
        let mut i = 0;
        for &flag in other.iter() {
            while i < self.0.len() && self.0[i] < flag {
                i += 1;
            }
            if i == self.0.len() || self.0[i] != flag {
                return false;
            }
            i += 1;
        }
        true
    }
}

impl From<Vec<Flag>> for FlagSet {
    fn from(mut flags: Vec<Flag>) -> Self {
        flags.sort_unstable();
        flags.dedup();
        Self(flags)
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a Flag;
    type IntoIter = core::slice::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl core::fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set()
            .entries(self.0.iter().map(|flag| flag.get()))
            .finish()
    }
}
