//! Data parsed from a `.aff` affix file.
//!
//! The structures here are designed for reading and searching during
//! spell checking, not for dynamic updates. The parser collects entries
//! into plain intermediate vectors and moves them into these indexed
//! structures once, at end of stream.

pub mod parser;

use std::{borrow::Cow, hash::BuildHasher, io::BufRead, marker::PhantomData, num::NonZeroU16, str::Chars};

use hashbrown::hash_map::DefaultHashBuilder;

use crate::{
    dic::WordList, encoding::Encoding, Flag, FlagSet,
};

use parser::{ConditionError, ParseDictionaryError};

/// The representation of a flag in a `.dic` or `.aff` file.
///
/// This representation also decides how we encode flags into `Flag`. This is controlled by the
/// `FLAG` directive in a `.aff` file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FlagType {
    /// A single ascii character.
    ///
    /// This is the default representation if a `.aff` file does not specify another.
    #[default]
    Short,
    /// Two adjacent ascii characters.
    ///
    /// The french dictionary uses this. For example for some proper nouns like `Asimov/L'D'Q'`:
    /// `L'` is a flag, `D'` another, `Q'` another.
    Long,
    /// A number in the range `1..=65000`.
    ///
    /// We will approximate this to `2^16`. Numeric flags are separated by commas.
    /// For example `actionfilm/70,7,252,976` from the Danish dictionary.
    Numeric,
    /// One UTF-8 character in the basic multilingual plane.
    Utf8,
}

/// The condition pattern of an affix entry.
///
/// Conditions are a tiny regex subset: literals, the `.` wildcard and
/// positive/negative character classes. A prefix condition is matched
/// against the start of the stem, a suffix condition against its end, so
/// the anchoring the original spells with `^`/`$` is implicit here.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Condition {
    /// The input pattern.
    ///
    /// The condition string is not transformed or compiled into a different input. We'll iterate
    /// over it directly to attempt to match the pattern.
    ///
    /// This string is non-empty.
    pattern: String,
    /// The number of `char`s that the pattern describes.
    ///
    /// `Condition` is such a small subset of regex that we can tell only from a linear scan of
    /// the input how many characters we will attempt to match.
    chars: usize,
}

impl Condition {
    pub fn matches(&self, input: &str) -> bool {
        let mut input = input.chars().peekable();
        let mut pattern = self.pattern.chars().peekable();

        loop {
            match (pattern.next(), input.next()) {
                // If we're at the end of both inputs or the pattern is shorter, this is a match.
                (None, _) => return true,
                (Some(_), None) => return false,
                // Wildcard: skip the input character.
                (Some('.'), Some(_)) => (),
                // Character classes
                (Some('['), Some(input_ch)) => {
                    let mut found = false;
                    let negative = pattern.next_if_eq(&'^').is_some();

                    for ch in pattern.by_ref() {
                        if ch == ']' {
                            break;
                        }

                        if ch == input_ch {
                            found = true;
                        }
                    }

                    // If it's a positive character class and the character isn't a member,
                    // this is not a match.
                    if !negative && !found {
                        return false;
                    }
                    // If it's a negative character class and the character _is_ a member,
                    // this is not a match.
                    if negative && found {
                        return false;
                    }
                }
                // Literals: the pattern character must equal the input character.
                (Some(pattern_ch), Some(input_ch)) => {
                    if pattern_ch != input_ch {
                        return false;
                    }
                }
            }
        }
    }
}

/// Internal container type for a prefix or suffix.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Affix<K> {
    /// The flag that words may use to reference this affix.
    pub flag: Flag,
    /// Whether the affix is compatible with the opposite affix. For example a word that has both
    /// a prefix and a suffix, both the prefix and suffix should have `crossproduct: true`.
    pub crossproduct: bool,
    /// What is stripped from the stem when the affix is applied.
    strip: Option<String>,
    /// What should be added when the affix is applied.
    pub add: String,
    /// Condition that the stem should be checked against to query if the affix is relevant.
    ///
    /// This is optional. Hunspell and Nuspell represent what we say is `None` as `"."`. It's a
    /// pattern that always matches the input since the input to `condition_matches` is never
    /// empty.
    condition: Option<Condition>,
    /// Continuation flags.
    ///
    /// These are included with the `add` in `.aff` files (separated by `/`) and apply to the
    /// derived form, enabling chained affixation.
    pub flags: FlagSet,
    /// Trailing morphological fields of the entry, stored verbatim.
    pub morph_fields: Vec<String>,
    phantom_data: PhantomData<K>,
}

impl<K: AffixKind> Affix<K> {
    pub fn new(
        flag: Flag,
        crossproduct: bool,
        strip: Option<&str>,
        add: &str,
        condition: Option<&str>,
        flags: FlagSet,
        morph_fields: Vec<String>,
    ) -> Result<Self, ConditionError> {
        let condition = condition.map(str::parse).transpose()?;

        Ok(Self {
            flag,
            crossproduct,
            strip: strip.map(|str| str.to_string()),
            add: add.to_string(),
            flags,
            condition,
            morph_fields,
            phantom_data: PhantomData,
        })
    }

    pub fn appending(&self) -> K::Chars<'_> {
        K::chars(&self.add)
    }

    /// The text this affix removes before appending, if any.
    pub fn strip(&self) -> Option<&str> {
        self.strip.as_deref()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Pfx;
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Sfx;

/// Rules for replacing characters at the beginning of a stem.
pub type Prefix = Affix<Pfx>;
/// Rules for replacing characters at the end of a stem.
pub type Suffix = Affix<Sfx>;

/// A helper trait that, together with `Pfx` and `Sfx`, allows generically reading either
/// characters of a `&str` forwards or backwards.
///
/// This is a textbook ["lending iterator"] which uses a generic associated type to express that
/// the lifetime of the iterator is bound only to the input word.
///
/// ["lending iterator"]: https://rust-lang.github.io/generic-associated-types-initiative/design_patterns/iterable.html
pub trait AffixKind {
    type Chars<'a>: Iterator<Item = char>
    where
        Self: 'a;

    fn chars(word: &str) -> Self::Chars<'_>;
}

impl AffixKind for Pfx {
    type Chars<'a> = Chars<'a>;

    fn chars(word: &str) -> Self::Chars<'_> {
        word.chars()
    }
}

impl AffixKind for Sfx {
    type Chars<'a> = core::iter::Rev<Chars<'a>>;

    fn chars(word: &str) -> Self::Chars<'_> {
        word.chars().rev()
    }
}

impl Prefix {
    /// Converts a word which starts with this `Prefix` to the word's stem.
    ///
    /// The prefix's `add` is removed from the beginning and replaced with the `strip`.
    ///
    /// Nuspell calls this `to_root`.
    ///
    /// # Panics
    ///
    /// This function `expect`s that the `Prefix`'s `add` is a prefix of the input `word`.
    pub fn to_stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        let stripped = word
            .strip_prefix(&self.add)
            .expect("to_stem should only be called when the `add` is a prefix of the word");

        match &self.strip {
            Some(strip) => {
                let mut stem = strip.to_string();
                stem.push_str(stripped);
                Cow::Owned(stem)
            }
            None => Cow::Borrowed(stripped),
        }
    }

    /// Converts a stem into a word starting with this `Prefix`.
    ///
    /// This prefix's `strip` is removed from the beginning and replaced with the `add`. This is
    /// the inverse of `Prefix::to_stem`.
    ///
    /// Nuspell calls this `to_derived.`
    ///
    /// # Panics
    ///
    /// This function `expect`s that the given `word` starts with this `Prefix`'s `strip`, if this
    /// prefix has a `strip`.
    pub fn to_derived(&self, word: &str) -> String {
        let stripped = match &self.strip {
            Some(strip) => word
                .strip_prefix(strip)
                .expect("to_derived should only be called when `strip` is a prefix of the word"),
            None => word,
        };
        let mut stem = self.add.clone();
        stem.push_str(stripped);
        stem
    }

    pub fn condition_matches(&self, word: &str) -> bool {
        let condition = match self.condition.as_ref() {
            Some(condition) => condition,
            None => return true,
        };

        // Length in bytes is greater than or equal to length in chars.
        if word.len() < condition.chars {
            return false;
        }

        condition.matches(word)
    }
}

impl Suffix {
    /// Converts a word which ends with this `Suffix` to the word's stem.
    ///
    /// This suffix's `add` is removed from the end and replaced with the `strip`.
    ///
    /// Nuspell calls this `to_root`.
    ///
    /// # Panics
    ///
    /// This function `expect`s that the `Suffix`'s `add` is a suffix of the input `word`.
    pub fn to_stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        let stripped = word
            .strip_suffix(&self.add)
            .expect("to_stem should only be called when the `add` is a suffix of the word");

        match self.strip.as_deref() {
            Some(strip) => {
                let mut stem = stripped.to_string();
                stem.push_str(strip);
                Cow::Owned(stem)
            }
            None => Cow::Borrowed(stripped),
        }
    }

    /// Converts a stem into a word ending with this `Suffix`.
    ///
    /// This suffix's `strip` is removed from the end and replaced with the `add`. This is
    /// the inverse of `Suffix::to_stem`.
    ///
    /// # Panics
    ///
    /// This function `expect`s that the given `word` ends with this `Suffix`'s `strip`, if this
    /// suffix has a `strip`.
    pub fn to_derived(&self, word: &str) -> String {
        let mut stem = match &self.strip {
            Some(strip) => word
                .strip_suffix(strip)
                .expect("to_derived should only be called when `strip` is a suffix of the word"),
            None => word,
        }
        .to_string();
        stem.push_str(&self.add);
        stem
    }

    pub fn condition_matches(&self, word: &str) -> bool {
        let condition = match self.condition.as_ref() {
            Some(condition) => condition,
            None => return true,
        };

        // Length in bytes is greater than or equal to length in chars.
        let len_bytes = word.len();
        if len_bytes < condition.chars {
            return false;
        }

        let (chars, bytes) = word
            .char_indices()
            .rev()
            .take(condition.chars)
            .fold((0, 0), |(chars, _bytes), (byte_index, _ch)| {
                (chars + 1, len_bytes - byte_index)
            });

        if chars < condition.chars {
            return false;
        }
        condition.matches(&word[word.len() - bytes..])
    }
}

pub type PrefixIndex = AffixIndex<Pfx>;
pub type SuffixIndex = AffixIndex<Sfx>;

/// A data structure for looking up any affixes which might match a given word.
///
/// The `AffixIndex` is one of two central data structures, along with the `WordList`. It
/// functions very similarly to a [radix tree], allowing efficient lookup of prefix or suffix
/// rules.
///
/// For example a prefix from `en_US.aff` for "re":
///
/// ```text
/// PFX A Y 1
/// PFX A   0     re         .
/// ```
///
/// That prefix strips nothing (`0`) from the beginning and adds "re" to the beginning of any
/// words it is applied to.
///
/// For prefixes, `affixes_of` returns an iterator over all of the `Prefix`es in the table which
/// have an `add` field which is a prefix of the search word.
///
/// This structure also searches from the end of the word when looking up suffixes. A suffix from
/// `en_US.aff`:
///
/// ```text
/// SFX D Y 4
/// SFX D   0     d          e
/// SFX D   y     ied        [^aeiou]y
/// SFX D   0     ed         [^ey]
/// SFX D   0     ed         [aeiou]y
/// ```
///
/// Any word in the word list with the "D" flag can try to apply these suffixes. For a word like
/// "aced," `affixes_of` would return the first, third and fourth suffixes, as `d`, `ed` and `ed`
/// are suffixes of "aced," but not the second (`ied`).
///
/// Internally this type is implemented using a sorted `Vec` of affixes - one table for prefixes
/// and one for suffixes. Iterating with `affixes_of` first emits all affixes with empty `add`
/// text. Then we look at the first character in the search string. We can constrain our search
/// to only the elements in the table that start with that character using a precomputed index
/// of characters to indices within the table. After considering the first character, we use
/// linear searches of the remaining table slice to constrain the search for each next character
/// in the search key.
///
/// [radix tree]: https://en.wikipedia.org/wiki/Radix_tree
#[derive(Debug)]
pub struct AffixIndex<C> {
    table: Vec<Affix<C>>,
    first_char: Vec<char>,
    prefix_idx_with_first_char: Vec<usize>,
}

impl<C: AffixKind> Default for AffixIndex<C> {
    fn default() -> Self {
        Vec::new().into()
    }
}

impl<C: AffixKind> FromIterator<Affix<C>> for AffixIndex<C> {
    fn from_iter<T: IntoIterator<Item = Affix<C>>>(iter: T) -> Self {
        let table: Vec<_> = iter.into_iter().collect();
        table.into()
    }
}

impl<C: AffixKind> From<Vec<Affix<C>>> for AffixIndex<C> {
    fn from(mut table: Vec<Affix<C>>) -> Self {
        // Sort the table lexiographically by key. We will use this lexiographical ordering to
        // efficiently search in AffixesIter.
        table.sort_unstable_by(|a, b| a.appending().cmp(b.appending()));

        let mut first_char = Vec::new();
        let mut prefix_idx_with_first_char = Vec::new();

        // Seek through the sorted table to the first element where the key is non-empty.
        let mut first_char_idx = table.partition_point(|affix| affix.appending().next().is_none());
        while first_char_idx < table.len() {
            let ch = table[first_char_idx]
                .appending()
                .next()
                .expect("vec is sorted so empty keys are before the partition point");

            // Save the first character of the key and the index of the affix in the table that
            // starts off this character. We can use this while reading the AffixIndex to jump
            // ahead efficiently in the table.
            first_char.push(ch);
            prefix_idx_with_first_char.push(first_char_idx);

            match table[first_char_idx..].iter().position(|affix| {
                affix
                    .appending()
                    .next()
                    .expect("vec is sorted so empty keys are before the partition point")
                    > ch
            }) {
                Some(next_char_index) => first_char_idx += next_char_index,
                None => break,
            }
        }
        // Add an extra element to the end so that `prefix_idx_with_first_char` is always one
        // element longer than `first_char`.
        prefix_idx_with_first_char.push(table.len());

        Self {
            table,
            first_char,
            prefix_idx_with_first_char,
        }
    }
}

impl<C: AffixKind> AffixIndex<C> {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// An iterator over every entry in the table, in key order.
    pub fn iter(&self) -> core::slice::Iter<'_, Affix<C>> {
        self.table.iter()
    }

    /// Enumerates the entries whose `add` text is a prefix (for prefixes) or suffix (for
    /// suffixes) of the search word, in O(|word| + matches).
    pub fn affixes_of<'index, 'word>(
        &'index self,
        word: &'word str,
    ) -> AffixesIter<'index, 'word, C> {
        AffixesIter {
            table: &self.table,
            first_char: &self.first_char,
            prefix_idx_with_first_char: &self.prefix_idx_with_first_char,
            chars: C::chars(word),
            chars_matched: 0,
        }
    }
}

/// An iterator over the affixes whose `add` text matches a search word.
pub struct AffixesIter<'index, 'word, C: AffixKind + 'word> {
    table: &'index [Affix<C>],
    first_char: &'index [char],
    prefix_idx_with_first_char: &'index [usize],
    chars: C::Chars<'word>,
    chars_matched: usize,
}

impl<'index, 'word, C: AffixKind> Iterator for AffixesIter<'index, 'word, C> {
    type Item = &'index Affix<C>;

    fn next(&mut self) -> Option<Self::Item> {
        // Return all affixes that append nothing first.
        if self.chars_matched == 0 {
            if self.table.is_empty() {
                return None;
            }

            let item = &self.table[0];
            if item.appending().next().is_some() {
                // The empty portion of the table is done.
                // Scan ahead to where the first character is.
                let ch = self.chars.next()?;
                let first_char_idx = self.first_char.iter().position(|c| *c == ch)?;

                // NOTE: `prefix_idx_with_first_char` always has at least one element and is
                // always one element longer than `first_char`, so we can safely index at `0`
                // and at whatever index we get from `first_char` plus one.
                let empty_offset = self.prefix_idx_with_first_char[0];
                // Constrain the bounds of the search to affixes that share the first letter
                // of the key. Offset by the number of affixes with empty `add` that we emitted
                // previously.
                let start = self.prefix_idx_with_first_char[first_char_idx] - empty_offset;
                let end = self.prefix_idx_with_first_char[first_char_idx + 1] - empty_offset;
                self.table = &self.table[start..end];
                self.chars_matched = 1;
            } else {
                self.table = &self.table[1..];
                return Some(item);
            }
        }

        loop {
            if self.table.is_empty() {
                return None;
            }

            // If the search key is exactly matched so far (up to the number of characters we've
            // seen), emit the item.
            let item = &self.table[0];
            if item.appending().count() == self.chars_matched {
                self.table = &self.table[1..];
                return Some(item);
            }

            // Look at the next character in the search key. Limit the search to the slice of
            // the table where the nth character for each affix matches this character of the
            // search key.
            let ch = self.chars.next()?;

            // Move `start` up to the index of the first affix that has this character in its
            // nth position.
            let char_beginning_idx = self
                .table
                .iter()
                .position(|affix| affix.appending().nth(self.chars_matched) == Some(ch))?;
            self.table = &self.table[char_beginning_idx..];

            // Move the `end` back so that the last element in the search slice is the last
            // affix that shares this character in its nth position.
            let char_end_idx = self
                .table
                .partition_point(|affix| affix.appending().nth(self.chars_matched) == Some(ch));
            self.table = &self.table[..char_end_idx];

            self.chars_matched += 1;
        }
    }
}

/// An ordered table of substring replacements with longest-match semantics.
///
/// This backs the `ICONV` and `OCONV` conversion tables. Not many dictionaries use these rules.
/// en_US and a few others use them to replace magic apostrophes "’" with regular ones. Others
/// like french have quite a few rules to normalize similar looking and meaning unicode
/// representations of letters, like "à" becoming "à".
///
/// The table is sorted by pattern, duplicate patterns are collapsed (keeping the first) and the
/// empty pattern is dropped. `replace` scans the input left to right, at each position splicing
/// in the replacement of the longest pattern that matches there. Replaced text is never
/// re-matched.
#[derive(Debug, Clone, Default)]
pub struct SubstrReplacer {
    table: Vec<(Box<str>, Box<str>)>,
}

impl From<Vec<(String, String)>> for SubstrReplacer {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut table: Vec<(Box<str>, Box<str>)> = pairs
            .into_iter()
            .map(|(from, to)| (from.into_boxed_str(), to.into_boxed_str()))
            .collect();
        // A stable sort so that the first of any equal keys survives the dedup.
        table.sort_by(|a, b| a.0.cmp(&b.0));
        table.dedup_by(|a, b| a.0 == b.0);
        if table.first().is_some_and(|(key, _)| key.is_empty()) {
            table.remove(0);
        }
        Self { table }
    }
}

impl SubstrReplacer {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Rewrites `word`, replacing every leftmost-longest pattern occurrence.
    pub fn replace<'a>(&self, word: &'a str) -> Cow<'a, str> {
        if self.table.is_empty() {
            return Cow::Borrowed(word);
        }

        let mut output = String::new();
        let mut changed = false;
        let mut rest = word;
        while let Some(ch) = rest.chars().next() {
            match self.find_match(rest) {
                Some((key, replacement)) => {
                    output.push_str(replacement);
                    rest = &rest[key.len()..];
                    changed = true;
                }
                None => {
                    output.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }

        if changed {
            Cow::Owned(output)
        } else {
            Cow::Borrowed(word)
        }
    }

    /// Finds the longest pattern that is a prefix of `rest`.
    ///
    /// This is a binary-search walk: repeatedly take the upper bound of `rest` under a
    /// comparator that compares each key against at most its own length of the input,
    /// remembering the last exact hit as the range narrows. Longer matches sort after their
    /// prefixes, so the last hit is the longest.
    fn find_match(&self, rest: &str) -> Option<(&str, &str)> {
        use core::cmp::Ordering;

        let mut range = self.table.as_slice();
        let mut last_match = None;
        loop {
            let upper =
                range.partition_point(|(key, _)| cmp_prefix_of(key, rest) != Ordering::Greater);
            if upper == 0 {
                break;
            }
            let (key, replacement) = &range[upper - 1];
            if cmp_prefix_of(key, rest) == Ordering::Equal {
                last_match = Some((&**key, &**replacement));
                range = &range[upper..];
            } else {
                break;
            }
        }
        last_match
    }
}

/// Compares `key` against at most `key.len()` bytes of `of`.
///
/// `Equal` means `key` is a prefix of `of`.
fn cmp_prefix_of(key: &str, of: &str) -> core::cmp::Ordering {
    let len = key.len().min(of.len());
    key.as_bytes().cmp(&of.as_bytes()[..len])
}

/// A collection of patterns used to break words into smaller words.
///
/// This is internally represented with a single `table` which is partitioned into three sections:
/// one for patterns that apply at the beginning of words, one for patterns that can apply
/// anywhere in the middle of a word, and one for patterns that must apply to the end of a word.
/// The `^`/`$` anchors are stripped during construction and patterns that end up empty are
/// dropped.
#[derive(Debug, Clone)]
pub struct BreakTable {
    table: Box<[Box<str>]>,
    start_word_breaks_last_idx: usize,
    // Nuspell keeps the entries partitioned in the order "start, end, middle." I've re-arranged
    // this to be "start, middle, end" since I think it's more natural.
    middle_word_breaks_last_idx: usize,
}

impl Default for BreakTable {
    fn default() -> Self {
        Self::new(&["^-", "-", "-$"])
    }
}

impl From<Vec<String>> for BreakTable {
    fn from(breaks: Vec<String>) -> Self {
        let strs: Vec<&str> = breaks.iter().map(AsRef::as_ref).collect();
        Self::new(&strs)
    }
}

impl BreakTable {
    pub fn new(breaks: &[&str]) -> Self {
        let mut start = Vec::new();
        let mut middle = Vec::new();
        let mut end = Vec::new();

        for &b in breaks.iter() {
            if let Some(b) = b.strip_prefix('^') {
                if !b.is_empty() {
                    start.push(b.into());
                }
            } else if let Some(b) = b.strip_suffix('$') {
                if !b.is_empty() {
                    end.push(b.into());
                }
            } else if !b.is_empty() {
                middle.push(b.into());
            }
        }

        let mut table = start;
        let start_word_breaks_last_idx = table.len();
        table.append(&mut middle);
        let middle_word_breaks_last_idx = table.len();
        table.append(&mut end);

        Self {
            table: table.into_boxed_slice(),
            start_word_breaks_last_idx,
            middle_word_breaks_last_idx,
        }
    }

    #[inline]
    pub fn start_word_breaks(&self) -> impl Iterator<Item = &str> {
        self.table[..self.start_word_breaks_last_idx]
            .iter()
            .map(AsRef::as_ref)
    }

    #[inline]
    pub fn middle_word_breaks(&self) -> impl Iterator<Item = &str> {
        self.table[self.start_word_breaks_last_idx..self.middle_word_breaks_last_idx]
            .iter()
            .map(AsRef::as_ref)
    }

    #[inline]
    pub fn end_word_breaks(&self) -> impl Iterator<Item = &str> {
        self.table[self.middle_word_breaks_last_idx..]
            .iter()
            .map(AsRef::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Splits `word` along the break patterns and probes each part.
    ///
    /// Start patterns probe the remainder after the matched head, end patterns the remainder
    /// before the matched tail. Middle patterns try every occurrence strictly inside the word
    /// and require both halves to probe successfully. The first positive probe wins. The probe
    /// is typically a spell check which may itself recurse into this function for nested
    /// breaks.
    pub fn break_and_spell<F: FnMut(&str) -> bool>(&self, word: &str, mut probe: F) -> bool {
        for pattern in self.start_word_breaks() {
            if let Some(rest) = word.strip_prefix(pattern) {
                if probe(rest) {
                    return true;
                }
            }
        }

        for pattern in self.end_word_breaks() {
            if let Some(rest) = word.strip_suffix(pattern) {
                if probe(rest) {
                    return true;
                }
            }
        }

        for pattern in self.middle_word_breaks() {
            for (idx, _) in word.match_indices(pattern) {
                // The occurrence must be strictly inside: both halves non-empty.
                if idx == 0 || idx + pattern.len() >= word.len() {
                    continue;
                }
                let head = &word[..idx];
                let tail = &word[idx + pattern.len()..];
                if probe(head) && probe(tail) {
                    return true;
                }
            }
        }

        false
    }
}

/// Individual tokens of COMPOUNDRULE patterns.
///
/// Compound rules are a very small regex-like language for describing how stems might be joined
/// in a compound. Each element is a flag, a zero-or-one wildcard (`?`) or a zero-or-more
/// wildcard (`*`). Typically dictionaries use these to describe how to compound numbers
/// together.
///
/// Nuspell doesn't special case `*` and `?`: it stores the entire rule as a string of
/// `char16_t` (which is also its flag type), leaving the wildcards in band. That costs only two
/// bytes per element but is ambiguous for numeric flag types (`*` vs. flag 42). We keep the
/// wildcards as explicit variants instead.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompoundRuleElement {
    Flag(Flag),
    ZeroOrOne,
    ZeroOrMore,
}

pub type CompoundRule = Box<[CompoundRuleElement]>;

/// The parsed COMPOUNDRULE table.
#[derive(Debug, Default)]
pub struct CompoundRuleTable {
    rules: Box<[CompoundRule]>,
}

impl From<Vec<CompoundRule>> for CompoundRuleTable {
    fn from(rules: Vec<CompoundRule>) -> Self {
        Self {
            rules: rules.into_boxed_slice(),
        }
    }
}

impl CompoundRuleTable {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, CompoundRule> {
        self.rules.iter()
    }
}

/// Storage for two `String`s within the allocation of one `String`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPair {
    inner: String,
    /// The `.len()` of the first string: the index of the partition between the first and
    /// second string.
    partition: usize,
}

impl StringPair {
    pub fn new(left: &str, right: &str) -> Self {
        let mut inner = left.to_string();
        let partition = inner.len();
        inner.push_str(right);

        Self { inner, partition }
    }

    #[inline]
    pub fn left(&self) -> &str {
        &self.inner[..self.partition]
    }

    #[inline]
    pub fn right(&self) -> &str {
        &self.inner[self.partition..]
    }

    /// Get the partition point of the two strings. This is the same as the `.len()` of the
    /// [`Self::left`] string.
    #[inline]
    pub fn left_len(&self) -> usize {
        self.partition
    }
}

/// One CHECKCOMPOUNDPATTERN entry.
///
/// `begin_end_chars` holds the ending characters required of the first word (left) and the
/// beginning characters required of the second word (right) for the pattern to forbid the
/// compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundPattern {
    pub begin_end_chars: StringPair,
    pub replacement: Option<String>,
    pub first_word_flag: Option<Flag>,
    pub second_word_flag: Option<Flag>,
    pub match_first_only_unaffixed_or_zero_affixed: bool,
}

/// Every option read from a `.aff` file that is a flag, a toggle or a limit.
#[derive(Debug, Clone)]
pub struct AffOptions {
    pub complex_prefixes: bool,
    pub fullstrip: bool,
    pub checksharps: bool,
    pub forbid_warn: bool,
    pub only_in_compound_flag: Option<Flag>,
    pub circumfix_flag: Option<Flag>,
    pub forbidden_word_flag: Option<Flag>,
    pub keep_case_flag: Option<Flag>,
    pub need_affix_flag: Option<Flag>,
    pub warn_flag: Option<Flag>,
    pub substandard_flag: Option<Flag>,
    // compounding options
    pub compound_flag: Option<Flag>,
    pub compound_begin_flag: Option<Flag>,
    pub compound_middle_flag: Option<Flag>,
    pub compound_last_flag: Option<Flag>,
    pub compound_root_flag: Option<Flag>,
    pub compound_permit_flag: Option<Flag>,
    pub compound_forbid_flag: Option<Flag>,
    pub compound_force_uppercase_flag: Option<Flag>,
    // These `Option<NonZeroU16>`s represent counts or sizes and a zero value isn't accepted.
    // Being the same as a flag's representation is coincidence.
    pub compound_min_length: Option<NonZeroU16>,
    pub compound_max_word_count: Option<NonZeroU16>,
    pub compound_syllable_max: Option<NonZeroU16>,
    pub compound_more_suffixes: bool,
    pub compound_check_duplicate: bool,
    pub compound_check_rep: bool,
    pub compound_check_case: bool,
    pub compound_check_triple: bool,
    pub compound_simplified_triple: bool,
    // suggestion options
    pub no_suggest_flag: Option<Flag>,
    pub max_compound_suggestions: u16,
    pub max_ngram_suggestions: u16,
    pub max_diff_factor: u16,
    pub only_max_diff: bool,
    pub no_split_suggestions: bool,
    pub suggest_with_dots: bool,
}

impl Default for AffOptions {
    fn default() -> Self {
        Self {
            complex_prefixes: false,
            fullstrip: false,
            checksharps: false,
            forbid_warn: false,
            only_in_compound_flag: None,
            circumfix_flag: None,
            forbidden_word_flag: None,
            keep_case_flag: None,
            need_affix_flag: None,
            warn_flag: None,
            substandard_flag: None,
            compound_flag: None,
            compound_begin_flag: None,
            compound_middle_flag: None,
            compound_last_flag: None,
            compound_root_flag: None,
            compound_permit_flag: None,
            compound_forbid_flag: None,
            compound_force_uppercase_flag: None,
            compound_min_length: None,
            compound_max_word_count: None,
            compound_syllable_max: None,
            compound_more_suffixes: false,
            compound_check_duplicate: false,
            compound_check_rep: false,
            compound_check_case: false,
            compound_check_triple: false,
            compound_simplified_triple: false,
            no_suggest_flag: None,
            max_compound_suggestions: 3,
            max_ngram_suggestions: 5,
            max_diff_factor: 5,
            only_max_diff: false,
            no_split_suggestions: false,
            suggest_with_dots: false,
        }
    }
}

/// Everything parsed from an affix file and a word-list file.
///
/// `AffData` exclusively owns all tables and indexes. `parse_aff` collects entries into
/// intermediate vectors and installs the final indexed structures exactly once, at end of
/// stream; `parse_dic` then fills the word list, resolving flag aliases against the parsed
/// affix data. A fully parsed `AffData` is not mutated again.
#[derive(Debug)]
pub struct AffData<S: BuildHasher = DefaultHashBuilder> {
    pub words: WordList<S>,
    pub prefixes: PrefixIndex,
    pub suffixes: SuffixIndex,
    pub break_table: BreakTable,
    pub compound_rules: CompoundRuleTable,
    pub compound_patterns: Vec<CompoundPattern>,
    pub compound_syllable_vowels: String,
    pub compound_syllable_num: FlagSet,
    pub input_substr_replacer: SubstrReplacer,
    pub output_substr_replacer: SubstrReplacer,
    pub replacements: Vec<(String, String)>,
    pub phonetic_replacements: Vec<(String, String)>,
    pub map_related_chars: Vec<String>,
    pub ignore_chars: String,
    pub keyboard_closeness: String,
    pub try_chars: String,
    pub wordchars: String,
    pub language: String,
    pub encoding: Encoding,
    pub flag_type: FlagType,
    pub flag_aliases: Vec<FlagSet>,
    // Parsed but referenced by nothing downstream yet; kept private until a consumer needs
    // morphological analysis.
    pub(crate) morph_aliases: Vec<Vec<String>>,
    pub options: AffOptions,
}

impl<S: BuildHasher + Default> Default for AffData<S> {
    fn default() -> Self {
        Self {
            words: WordList::new(),
            prefixes: PrefixIndex::default(),
            suffixes: SuffixIndex::default(),
            break_table: BreakTable::default(),
            compound_rules: CompoundRuleTable::default(),
            compound_patterns: Vec::new(),
            compound_syllable_vowels: String::new(),
            compound_syllable_num: FlagSet::new(),
            input_substr_replacer: SubstrReplacer::default(),
            output_substr_replacer: SubstrReplacer::default(),
            replacements: Vec::new(),
            phonetic_replacements: Vec::new(),
            map_related_chars: Vec::new(),
            ignore_chars: String::new(),
            keyboard_closeness: String::new(),
            try_chars: String::new(),
            wordchars: String::new(),
            language: String::new(),
            encoding: Encoding::default(),
            flag_type: FlagType::default(),
            flag_aliases: Vec::new(),
            morph_aliases: Vec::new(),
            options: AffOptions::default(),
        }
    }
}

impl AffData {
    /// Creates an empty `AffData` with the default hasher.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: BuildHasher + Default> AffData<S> {
    /// Parses an affix file from `reader`, installing the results into `self`.
    ///
    /// Recoverable problems — malformed flags, bad counts, duplicate settings — are logged as
    /// warnings and skipped. `Ok` means end of stream was reached; only a failing read aborts
    /// the parse.
    pub fn parse_aff<R: BufRead>(&mut self, reader: &mut R) -> Result<(), ParseDictionaryError> {
        parser::parse_aff(reader, self)
    }

    /// Parses a word-list file from `reader` into [`Self::words`].
    ///
    /// Must be called after [`Self::parse_aff`]: flag decoding and alias resolution follow the
    /// parsed affix data, and the declared encoding is inherited. Fails on a failing read or
    /// when the first line is not a word count.
    pub fn parse_dic<R: BufRead>(&mut self, reader: &mut R) -> Result<(), ParseDictionaryError> {
        crate::dic::parser::parse_dic(reader, self)
    }
}
