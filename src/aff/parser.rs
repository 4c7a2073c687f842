//! The parser for `.aff` files.
//!
//! This is a line-oriented state machine: each line is decoded under the
//! encoding declared so far, split into whitespace-separated words with
//! trailing comments dropped, and dispatched on its (case-insensitive)
//! command keyword by folding over a const slice of parser functions.
//! Rather than parsing directly into `AffData`, entries are collected into
//! the `AffLineParser` scratch-pad and moved into the final indexed
//! structures once the stream is exhausted. Structures like `AffixIndex`
//! are most efficient to build all-at-once from all elements rather than
//! constructively by inserting each element.
//!
//! Anything recoverable — malformed flags, bad counts, duplicated settings,
//! entries past a declared count — is reported through `log::warn!` and
//! skipped; the grammar has always been lenient and real dictionaries rely
//! on that. Only a failing read aborts parsing.

use std::{
    fmt,
    hash::BuildHasher,
    io::{self, BufRead},
    iter::TakeWhile,
    num::NonZeroU16,
    str::{FromStr, SplitWhitespace},
};

use hashbrown::HashMap;

use thiserror::Error;

use crate::{
    encoding::{decode_line, strip_bom, trim_line_ending, validate_utf8, Encoding},
    Flag, FlagSet,
};

use super::{
    AffData, AffOptions, CompoundPattern, CompoundRule, CompoundRuleElement, Condition, FlagType,
    Prefix, StringPair, Suffix,
};

/// A helper type that means "words on a line split by whitespace with comments
/// dropped." This is a concretion of `impl Iterator<Item = &'a str>`.
type Words<'text> = TakeWhile<SplitWhitespace<'text>, for<'b, 'c> fn(&'b &'c str) -> bool>;

fn words_of(line: &str) -> Words<'_> {
    line.split_whitespace()
        .take_while((|word| !word.starts_with('#')) as for<'b, 'c> fn(&'b &'c str) -> bool)
}

/// Scratch-pad state while parsing a `.aff` file.
#[derive(Default)]
struct AffLineParser {
    options: AffOptions,
    flag_type: FlagType,
    encoding: Encoding,
    language: String,
    ignore_chars: String,
    try_chars: String,
    keyboard_closeness: String,
    wordchars: String,
    compound_syllable_vowels: String,
    compound_syllable_num: FlagSet,
    flag_aliases: Vec<FlagSet>,
    morph_aliases: Vec<Vec<String>>,
    replacements: Vec<(String, String)>,
    phonetic_replacements: Vec<(String, String)>,
    input_conversion: Vec<(String, String)>,
    output_conversion: Vec<(String, String)>,
    map_related_chars: Vec<String>,
    break_patterns: Vec<String>,
    break_exists: bool,
    prefixes: Vec<Prefix>,
    suffixes: Vec<Suffix>,
    compound_rules: Vec<CompoundRule>,
    compound_patterns: Vec<CompoundPattern>,
    /// Remaining-entry budget for each counted command.
    counts: HashMap<&'static str, usize>,
    /// Cross-product bit and remaining-entry budget per `PFX`/`SFX` flag.
    affix_headers: HashMap<(char, Flag), (bool, usize)>,
    line_number: usize,
}

type Parser = for<'line> fn(&mut AffLineParser, &mut Words<'line>);

const AFF_PARSERS: [(&str, Parser); 55] = [
    ("SET", parse_encoding),
    ("FLAG", parse_flag_type),
    ("LANG", parse_language),
    // Flags
    ("FORBIDDENWORD", parse_forbidden_word_flag),
    ("CIRCUMFIX", parse_circumfix_flag),
    ("KEEPCASE", parse_keep_case_flag),
    ("NEEDAFFIX", parse_need_affix_flag),
    ("NOSUGGEST", parse_no_suggest_flag),
    ("SUBSTANDARD", parse_substandard_flag),
    ("WARN", parse_warn_flag),
    ("COMPOUNDFLAG", parse_compound_flag),
    ("COMPOUNDBEGIN", parse_compound_begin_flag),
    ("COMPOUNDMIDDLE", parse_compound_middle_flag),
    ("COMPOUNDLAST", parse_compound_last_flag),
    ("ONLYINCOMPOUND", parse_only_in_compound_flag),
    ("COMPOUNDPERMITFLAG", parse_compound_permit_flag),
    ("COMPOUNDFORBIDFLAG", parse_compound_forbid_flag),
    ("COMPOUNDROOT", parse_compound_root_flag),
    ("FORCEUCASE", parse_compound_force_uppercase_flag),
    // Bools
    ("COMPLEXPREFIXES", parse_complex_prefixes),
    ("FULLSTRIP", parse_fullstrip),
    ("CHECKSHARPS", parse_checksharps),
    ("FORBIDWARN", parse_forbid_warn),
    ("COMPOUNDMORESUFFIXES", parse_compound_more_suffixes),
    ("CHECKCOMPOUNDDUP", parse_compound_check_duplicate),
    ("CHECKCOMPOUNDREP", parse_compound_check_rep),
    ("CHECKCOMPOUNDCASE", parse_compound_check_case),
    ("CHECKCOMPOUNDTRIPLE", parse_compound_check_triple),
    ("SIMPLIFIEDTRIPLE", parse_compound_simplified_triple),
    ("ONLYMAXDIFF", parse_only_max_diff),
    ("NOSPLITSUGS", parse_no_split_suggestions),
    ("SUGSWITHDOTS", parse_suggest_with_dots),
    // "Shorts" as Nuspell calls them (u16s here)
    ("COMPOUNDMIN", parse_compound_min_length),
    ("COMPOUNDWORDMAX", parse_compound_max_word_count),
    ("MAXCPDSUGS", parse_max_compound_suggestions),
    ("MAXNGRAMSUGS", parse_max_ngram_suggestions),
    ("MAXDIFF", parse_max_diff_factor),
    // Strings
    ("IGNORE", parse_ignore_chars),
    ("KEY", parse_keyboard_closeness),
    ("TRY", parse_try_chars),
    ("WORDCHARS", parse_wordchars),
    // Counted vectors
    ("REP", parse_replacements),
    ("PHONE", parse_phonetic_replacements),
    ("ICONV", parse_input_conversion),
    ("OCONV", parse_output_conversion),
    ("MAP", parse_map_related_chars),
    ("BREAK", parse_break_patterns),
    ("AF", parse_flag_aliases),
    ("AM", parse_morph_aliases),
    ("CHECKCOMPOUNDPATTERN", parse_compound_pattern_table),
    ("COMPOUNDRULE", parse_compound_rule_table),
    // Remaining complicated structures
    ("PFX", parse_prefix_table),
    ("SFX", parse_suffix_table),
    ("COMPOUNDSYLLABLE", parse_compound_syllable),
    ("SYLLABLENUM", parse_compound_syllable_num),
];

pub(crate) fn parse_aff<R: BufRead, S: BuildHasher + Default>(
    reader: &mut R,
    data: &mut AffData<S>,
) -> Result<(), ParseDictionaryError> {
    let mut parsers: HashMap<&str, Parser> = HashMap::with_capacity(AFF_PARSERS.len());
    parsers.extend(AFF_PARSERS);
    let mut cx = AffLineParser::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|err| {
            ParseDictionaryError {
                kind: ParseDictionaryErrorKind::Io(err),
                source: ParseDictionaryErrorSource::Aff,
                line_number: Some(cx.line_number + 1),
            }
        })?;
        if read == 0 {
            break;
        }
        cx.line_number += 1;

        let mut bytes = trim_line_ending(&buf);
        if cx.line_number == 1 {
            bytes = strip_bom(bytes);
        }
        if cx.encoding.is_utf8() && !validate_utf8(bytes) {
            // Hungarian will trigger this: its file mixes UTF-8 and latin2. See the note in
            // `decode_flags`.
            log::warn!("invalid UTF-8 in .aff file on line {}", cx.line_number);
        }
        let line = decode_line(bytes, &cx.encoding);

        let mut words = words_of(&line);
        let keyword = match words.next() {
            Some(word) => word.to_ascii_uppercase(),
            // Skip blank lines and comments.
            None => continue,
        };
        if let Some(parse) = parsers.get(keyword.as_str()) {
            parse(&mut cx, &mut words);
        }
    }

    finish(cx, data);
    Ok(())
}

/// Moves the scratch-pad state into the final indexed structures.
///
/// This runs exactly once, at end of stream.
fn finish<S: BuildHasher + Default>(mut cx: AffLineParser, data: &mut AffData<S>) {
    // default BREAK definition
    if !cx.break_exists {
        cx.break_patterns = vec!["-".into(), "^-".into(), "-$".into()];
    }

    data.prefixes = cx.prefixes.into();
    data.suffixes = cx.suffixes.into();
    data.break_table = cx.break_patterns.into();
    data.compound_rules = cx.compound_rules.into();
    data.compound_patterns = cx.compound_patterns;
    data.compound_syllable_vowels = cx.compound_syllable_vowels;
    data.compound_syllable_num = cx.compound_syllable_num;
    data.input_substr_replacer = cx.input_conversion.into();
    data.output_substr_replacer = cx.output_conversion.into();
    data.replacements = cx.replacements;
    data.phonetic_replacements = cx.phonetic_replacements;
    data.map_related_chars = cx.map_related_chars;
    data.ignore_chars = cx.ignore_chars;
    data.keyboard_closeness = cx.keyboard_closeness;
    data.try_chars = cx.try_chars;
    data.wordchars = cx.wordchars;
    data.language = cx.language;
    data.encoding = cx.encoding;
    data.flag_type = cx.flag_type;
    data.flag_aliases = cx.flag_aliases;
    data.morph_aliases = cx.morph_aliases;
    data.options = cx.options;
}

fn parse_encoding(cx: &mut AffLineParser, words: &mut Words) {
    if !cx.encoding.is_empty() {
        log::warn!(
            "setting SET more than once on .aff line {}, ignoring",
            cx.line_number
        );
        return;
    }
    match words.next() {
        Some(token) => cx.encoding = Encoding::new(token),
        None => log::warn!("missing encoding for SET on .aff line {}", cx.line_number),
    }
}

fn parse_flag_type(cx: &mut AffLineParser, words: &mut Words) {
    let Some(token) = words.next() else {
        log::warn!("missing argument for FLAG on .aff line {}", cx.line_number);
        return;
    };
    match token.parse::<FlagType>() {
        Ok(flag_type) => cx.flag_type = flag_type,
        Err(err) => log::warn!("{} on .aff line {}", err, cx.line_number),
    }
}

fn parse_language(cx: &mut AffLineParser, words: &mut Words) {
    set_string_once(cx.line_number, "LANG", words, &mut cx.language);
}

fn parse_ignore_chars(cx: &mut AffLineParser, words: &mut Words) {
    set_string_once(cx.line_number, "IGNORE", words, &mut cx.ignore_chars);
}

fn parse_keyboard_closeness(cx: &mut AffLineParser, words: &mut Words) {
    set_string_once(cx.line_number, "KEY", words, &mut cx.keyboard_closeness);
}

fn parse_try_chars(cx: &mut AffLineParser, words: &mut Words) {
    set_string_once(cx.line_number, "TRY", words, &mut cx.try_chars);
}

fn parse_wordchars(cx: &mut AffLineParser, words: &mut Words) {
    set_string_once(cx.line_number, "WORDCHARS", words, &mut cx.wordchars);
}

fn set_string_once(line_number: usize, command: &str, words: &mut Words, slot: &mut String) {
    if !slot.is_empty() {
        log::warn!(
            "setting {} more than once on .aff line {}, ignoring",
            command,
            line_number
        );
        return;
    }
    match words.next() {
        Some(word) => *slot = word.to_string(),
        None => log::warn!("missing argument for {} on .aff line {}", command, line_number),
    }
}

fn parse_forbidden_word_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "FORBIDDENWORD") {
        cx.options.forbidden_word_flag = Some(flag);
    }
}

fn parse_circumfix_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "CIRCUMFIX") {
        cx.options.circumfix_flag = Some(flag);
    }
}

fn parse_keep_case_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "KEEPCASE") {
        cx.options.keep_case_flag = Some(flag);
    }
}

fn parse_need_affix_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "NEEDAFFIX") {
        cx.options.need_affix_flag = Some(flag);
    }
}

fn parse_no_suggest_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "NOSUGGEST") {
        cx.options.no_suggest_flag = Some(flag);
    }
}

fn parse_substandard_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "SUBSTANDARD") {
        cx.options.substandard_flag = Some(flag);
    }
}

fn parse_warn_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "WARN") {
        cx.options.warn_flag = Some(flag);
    }
}

fn parse_compound_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "COMPOUNDFLAG") {
        cx.options.compound_flag = Some(flag);
    }
}

fn parse_compound_begin_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "COMPOUNDBEGIN") {
        cx.options.compound_begin_flag = Some(flag);
    }
}

fn parse_compound_middle_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "COMPOUNDMIDDLE") {
        cx.options.compound_middle_flag = Some(flag);
    }
}

fn parse_compound_last_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "COMPOUNDLAST") {
        cx.options.compound_last_flag = Some(flag);
    }
}

fn parse_only_in_compound_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "ONLYINCOMPOUND") {
        cx.options.only_in_compound_flag = Some(flag);
    }
}

fn parse_compound_permit_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "COMPOUNDPERMITFLAG") {
        cx.options.compound_permit_flag = Some(flag);
    }
}

fn parse_compound_forbid_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "COMPOUNDFORBIDFLAG") {
        cx.options.compound_forbid_flag = Some(flag);
    }
}

fn parse_compound_root_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "COMPOUNDROOT") {
        cx.options.compound_root_flag = Some(flag);
    }
}

fn parse_compound_force_uppercase_flag(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(flag) = take_flag(cx, words, "FORCEUCASE") {
        cx.options.compound_force_uppercase_flag = Some(flag);
    }
}

fn take_flag(cx: &AffLineParser, words: &mut Words, command: &str) -> Option<Flag> {
    let Some(token) = words.next() else {
        log::warn!(
            "missing flag for {} on .aff line {}",
            command,
            cx.line_number
        );
        return None;
    };
    decode_single_flag(token, cx.flag_type, &cx.encoding, cx.line_number)
}

fn parse_complex_prefixes(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.complex_prefixes = true;
}

fn parse_fullstrip(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.fullstrip = true;
}

fn parse_checksharps(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.checksharps = true;
}

fn parse_forbid_warn(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.forbid_warn = true;
}

fn parse_compound_more_suffixes(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.compound_more_suffixes = true;
}

fn parse_compound_check_duplicate(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.compound_check_duplicate = true;
}

fn parse_compound_check_rep(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.compound_check_rep = true;
}

fn parse_compound_check_case(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.compound_check_case = true;
}

fn parse_compound_check_triple(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.compound_check_triple = true;
}

fn parse_compound_simplified_triple(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.compound_simplified_triple = true;
}

fn parse_only_max_diff(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.only_max_diff = true;
}

fn parse_no_split_suggestions(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.no_split_suggestions = true;
}

fn parse_suggest_with_dots(cx: &mut AffLineParser, _words: &mut Words) {
    cx.options.suggest_with_dots = true;
}

fn parse_compound_min_length(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(short) = take_short(cx, words, "COMPOUNDMIN") {
        cx.options.compound_min_length = NonZeroU16::new(short);
    }
}

fn parse_compound_max_word_count(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(short) = take_short(cx, words, "COMPOUNDWORDMAX") {
        cx.options.compound_max_word_count = NonZeroU16::new(short);
    }
}

fn parse_max_compound_suggestions(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(short) = take_short(cx, words, "MAXCPDSUGS") {
        cx.options.max_compound_suggestions = short;
    }
}

fn parse_max_ngram_suggestions(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(short) = take_short(cx, words, "MAXNGRAMSUGS") {
        cx.options.max_ngram_suggestions = short;
    }
}

fn parse_max_diff_factor(cx: &mut AffLineParser, words: &mut Words) {
    if let Some(short) = take_short(cx, words, "MAXDIFF") {
        cx.options.max_diff_factor = if short > 10 { 5 } else { short };
    }
}

fn take_short(cx: &AffLineParser, words: &mut Words, command: &str) -> Option<u16> {
    let Some(token) = words.next() else {
        log::warn!(
            "missing number for {} on .aff line {}",
            command,
            cx.line_number
        );
        return None;
    };
    match token.parse::<u16>() {
        Ok(short) => Some(short),
        Err(_) => {
            log::warn!(
                "malformed number {:?} for {} on .aff line {}",
                token,
                command,
                cx.line_number
            );
            None
        }
    }
}

fn parse_replacements(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "REP", |cx, words| {
        let (Some(from), Some(to)) = (words.next(), words.next()) else {
            return false;
        };
        cx.replacements.push((from.to_string(), to.to_string()));
        true
    });
}

fn parse_phonetic_replacements(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "PHONE", |cx, words| {
        let (Some(from), Some(to)) = (words.next(), words.next()) else {
            return false;
        };
        cx.phonetic_replacements
            .push((from.to_string(), to.to_string()));
        true
    });
}

fn parse_input_conversion(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "ICONV", |cx, words| {
        let (Some(from), Some(to)) = (words.next(), words.next()) else {
            return false;
        };
        cx.input_conversion.push((from.to_string(), to.to_string()));
        true
    });
}

fn parse_output_conversion(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "OCONV", |cx, words| {
        let (Some(from), Some(to)) = (words.next(), words.next()) else {
            return false;
        };
        cx.output_conversion.push((from.to_string(), to.to_string()));
        true
    });
}

fn parse_map_related_chars(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "MAP", |cx, words| {
        let Some(word) = words.next() else {
            return false;
        };
        cx.map_related_chars.push(word.to_string());
        true
    });
}

fn parse_break_patterns(cx: &mut AffLineParser, words: &mut Words) {
    // Any BREAK line, even `BREAK 0`, suppresses the default break patterns.
    cx.break_exists = true;
    parse_counted(cx, words, "BREAK", |cx, words| {
        let Some(word) = words.next() else {
            return false;
        };
        cx.break_patterns.push(word.to_string());
        true
    });
}

fn parse_flag_aliases(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "AF", |cx, words| {
        let Some(alias) = words.next() else {
            return false;
        };
        let flags = decode_flags(alias, cx.flag_type, &cx.encoding, cx.line_number);
        // Push even a flagless entry: aliases are referenced by their 1-based position.
        cx.flag_aliases.push(FlagSet::from(flags));
        true
    });
}

fn parse_morph_aliases(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "AM", |cx, words| {
        let fields: Vec<String> = words.map(str::to_string).collect();
        cx.morph_aliases.push(fields);
        true
    });
}

fn parse_compound_pattern_table(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "CHECKCOMPOUNDPATTERN", |cx, words| {
        let (Some(first), Some(second)) = (words.next(), words.next()) else {
            return false;
        };
        let replacement = words.next().map(str::to_string);
        let (first_word_end, first_word_flag) = split_flagged(first, cx);
        let (second_word_begin, second_word_flag) = split_flagged(second, cx);
        // Hunspell treats a "0" ending as "the first word may only match unaffixed."
        let match_first_only = first_word_end == "0";
        let first_word_end = if match_first_only { "" } else { first_word_end };
        cx.compound_patterns.push(CompoundPattern {
            begin_end_chars: StringPair::new(first_word_end, second_word_begin),
            replacement,
            first_word_flag,
            second_word_flag,
            match_first_only_unaffixed_or_zero_affixed: match_first_only,
        });
        true
    });
}

fn split_flagged<'a>(token: &'a str, cx: &AffLineParser) -> (&'a str, Option<Flag>) {
    match token.split_once('/') {
        Some((text, flag)) => (
            text,
            decode_single_flag(flag, cx.flag_type, &cx.encoding, cx.line_number),
        ),
        None => (token, None),
    }
}

fn parse_compound_rule_table(cx: &mut AffLineParser, words: &mut Words) {
    parse_counted(cx, words, "COMPOUNDRULE", |cx, words| {
        let Some(word) = words.next() else {
            return false;
        };
        match parse_compound_rule(word, cx.flag_type) {
            Ok(rule) => cx.compound_rules.push(rule),
            Err(err) => log::warn!(
                "compound rule is malformed on .aff line {}: {}",
                cx.line_number,
                err
            ),
        }
        true
    });
}

fn parse_compound_syllable(cx: &mut AffLineParser, words: &mut Words) {
    // Takes the shape COMPOUNDSYLLABLE <compound_syllable_max> <compound_syllable_vowels>
    let (Some(max), Some(vowels)) = (words.next(), words.next()) else {
        log::warn!(
            "COMPOUNDSYLLABLE takes a count and a vowel set on .aff line {}",
            cx.line_number
        );
        return;
    };
    match max.parse::<u16>() {
        Ok(short) => cx.options.compound_syllable_max = NonZeroU16::new(short),
        Err(_) => {
            log::warn!(
                "malformed number {:?} for COMPOUNDSYLLABLE on .aff line {}",
                max,
                cx.line_number
            );
            return;
        }
    }
    cx.compound_syllable_vowels = vowels.to_string();
}

fn parse_compound_syllable_num(cx: &mut AffLineParser, words: &mut Words) {
    let Some(token) = words.next() else {
        log::warn!(
            "missing flags for SYLLABLENUM on .aff line {}",
            cx.line_number
        );
        return;
    };
    cx.compound_syllable_num =
        FlagSet::from(decode_flags(token, cx.flag_type, &cx.encoding, cx.line_number));
}

/// Drives one line of a counted-vector command.
///
/// The first occurrence of `command` reads the entry count; each later
/// occurrence spends one entry of that budget on `parse_entry`. Occurrences
/// need not be contiguous. A malformed count zeroes the budget and entries
/// past the budget are ignored, both with a warning.
fn parse_counted<'line>(
    cx: &mut AffLineParser,
    words: &mut Words<'line>,
    command: &'static str,
    parse_entry: impl FnOnce(&mut AffLineParser, &mut Words<'line>) -> bool,
) {
    match cx.counts.get(command).copied() {
        None => {
            let count = match words.next().and_then(parse_leading_usize) {
                Some(count) => count,
                None => {
                    log::warn!(
                        "{} has no count on .aff line {}, ignoring all of its entries",
                        command,
                        cx.line_number
                    );
                    0
                }
            };
            cx.counts.insert(command, count);
        }
        Some(remaining) if remaining > 0 => {
            cx.counts.insert(command, remaining - 1);
            if !parse_entry(cx, words) {
                log::warn!("invalid {} entry on .aff line {}", command, cx.line_number);
            }
        }
        Some(_) => {
            log::warn!("extra entries of {} on .aff line {}", command, cx.line_number);
        }
    }
}

/// Parses the leading decimal digits of `token`, istream-style: `"123abc"`
/// is 123, no leading digits is `None`.
pub(crate) fn parse_leading_usize(token: &str) -> Option<usize> {
    let digits_end = token
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(token.len());
    token[..digits_end].parse::<usize>().ok()
}

fn parse_prefix_table(cx: &mut AffLineParser, words: &mut Words) {
    parse_affix_table(cx, words, 'P');
}

fn parse_suffix_table(cx: &mut AffLineParser, words: &mut Words) {
    parse_affix_table(cx, words, 'S');
}

/// Parses one `PFX`/`SFX` line: either a header or a body entry.
///
/// Headers take the shape `PFX flag cross_product count`, bodies
/// `PFX flag strip add[/flags] [condition [morph_fields...]]`. The budget is
/// kept per flag, so the tables of different flags may interleave. One flag
/// is tied to one cross-product value: the first header wins and a repeated
/// header only extends the entry budget.
fn parse_affix_table(cx: &mut AffLineParser, words: &mut Words, kind: char) {
    let command = if kind == 'P' { "PFX" } else { "SFX" };
    let Some(flag_token) = words.next() else {
        log::warn!(
            "missing flag for {} on .aff line {}",
            command,
            cx.line_number
        );
        return;
    };
    let Some(flag) = decode_single_flag(flag_token, cx.flag_type, &cx.encoding, cx.line_number)
    else {
        log::warn!(
            "malformed flag {:?} for {} on .aff line {}",
            flag_token,
            command,
            cx.line_number
        );
        return;
    };

    match cx.affix_headers.get(&(kind, flag)).copied() {
        None => {
            let header = parse_affix_header(cx, words, command);
            cx.affix_headers.insert((kind, flag), header);
        }
        Some((crossproduct, remaining)) if remaining > 0 => {
            cx.affix_headers
                .insert((kind, flag), (crossproduct, remaining - 1));
            parse_affix_body(cx, words, kind, flag, crossproduct, command);
        }
        Some((crossproduct, _)) => {
            // A second header for an exhausted flag extends the budget; it cannot flip the
            // cross-product bit.
            match try_affix_header(words) {
                Some((new_crossproduct, count)) => {
                    if new_crossproduct != crossproduct {
                        log::warn!(
                            "{} header for an already registered flag changes the cross product on .aff line {}, keeping the first registration",
                            command,
                            cx.line_number
                        );
                    }
                    cx.affix_headers.insert((kind, flag), (crossproduct, count));
                }
                None => log::warn!(
                    "extra entries of {} on .aff line {}",
                    command,
                    cx.line_number
                ),
            }
        }
    }
}

fn parse_affix_header(cx: &AffLineParser, words: &mut Words, command: &str) -> (bool, usize) {
    let crossproduct = match words.next() {
        Some("Y") => true,
        Some("N") => false,
        _ => {
            log::warn!(
                "a {} header is missing its cross product on .aff line {}",
                command,
                cx.line_number
            );
            return (false, 0);
        }
    };
    let count = match words.next().and_then(parse_leading_usize) {
        Some(count) => count,
        None => {
            log::warn!(
                "a {} header is missing its count on .aff line {}, ignoring its entries",
                command,
                cx.line_number
            );
            0
        }
    };
    (crossproduct, count)
}

fn try_affix_header(words: &mut Words) -> Option<(bool, usize)> {
    let crossproduct = match words.next()? {
        "Y" => true,
        "N" => false,
        _ => return None,
    };
    let count = parse_leading_usize(words.next()?)?;
    Some((crossproduct, count))
}

fn parse_affix_body(
    cx: &mut AffLineParser,
    words: &mut Words,
    kind: char,
    flag: Flag,
    crossproduct: bool,
    command: &str,
) {
    let (Some(strip_token), Some(add_token)) = (words.next(), words.next()) else {
        log::warn!("invalid {} entry on .aff line {}", command, cx.line_number);
        return;
    };
    // A strip or add of "0" stands for the empty string.
    let strip = (strip_token != "0").then_some(strip_token);
    let (add, flags_token) = split_word_and_flagset_naive(add_token);
    let flags = if flags_token.is_empty() {
        FlagSet::new()
    } else {
        decode_flags_possible_alias(
            flags_token,
            cx.flag_type,
            &cx.encoding,
            &cx.flag_aliases,
            cx.line_number,
        )
    };
    let add = if add == "0" { "" } else { add };
    // "." is the empty condition - it always matches. We use an Option for this fast lane
    // instead.
    let condition = words.next().filter(|&condition| condition != ".");
    let morph_fields: Vec<String> = words.map(str::to_string).collect();

    let result = if kind == 'P' {
        Prefix::new(flag, crossproduct, strip, add, condition, flags, morph_fields)
            .map(|prefix| cx.prefixes.push(prefix))
    } else {
        Suffix::new(flag, crossproduct, strip, add, condition, flags, morph_fields)
            .map(|suffix| cx.suffixes.push(suffix))
    };
    if let Err(err) = result {
        log::warn!(
            "condition is malformed for {} on .aff line {}: {}",
            command,
            cx.line_number,
            err
        );
    }
}

/// Decodes a whitespace-delimited flag token into a sequence of flags.
///
/// The sequence keeps the token's order and may contain duplicates; collect
/// it into a [`FlagSet`] where set semantics are wanted. Problems inside the
/// token are warned about and the offending flag is skipped.
pub(crate) fn decode_flags(
    token: &str,
    flag_type: FlagType,
    encoding: &Encoding,
    line_number: usize,
) -> Vec<Flag> {
    let mut flags = Vec::new();
    match flag_type {
        FlagType::Short => {
            if !token.is_ascii() && encoding.is_utf8() {
                // This will be triggered by Hungarian. Hunspell v1 read a single byte even if
                // the stream was UTF-8 and the Hungarian dictionary exploited that, mixing
                // UTF-8 and latin2 in one file. Decoding one flag per byte keeps those
                // dictionaries working.
                log::warn!(
                    "bytes above 127 should not be treated alone as flags on line {}, please update the dictionary to use FLAG UTF-8",
                    line_number
                );
            }
            if token.is_ascii() || encoding.is_utf8() {
                flags.extend(token.bytes().filter_map(|byte| Flag::new(byte as u16)));
            } else {
                // A legacy-encoded line was already decoded char by char.
                for ch in token.chars() {
                    match u16::try_from(ch as u32).ok().and_then(Flag::new) {
                        Some(flag) => flags.push(flag),
                        None => log::warn!("flag out of range on line {}", line_number),
                    }
                }
            }
        }
        FlagType::Long => {
            if !token.is_ascii() && encoding.is_utf8() {
                log::warn!(
                    "bytes above 127 should not be treated alone as flags on line {}, please update the dictionary to use FLAG UTF-8",
                    line_number
                );
            }
            let mut chunks = token.as_bytes().chunks_exact(2);
            for pair in chunks.by_ref() {
                let flag = ((pair[0] as u16) << 8) | pair[1] as u16;
                match Flag::new(flag) {
                    Some(flag) => flags.push(flag),
                    None => log::warn!("flag cannot be zero on line {}", line_number),
                }
            }
            // An odd trailing byte becomes a flag with a zero high byte.
            if let &[trailing] = chunks.remainder() {
                match Flag::new(trailing as u16) {
                    Some(flag) => flags.push(flag),
                    None => log::warn!("flag cannot be zero on line {}", line_number),
                }
            }
        }
        FlagType::Numeric => {
            for piece in token.split(',') {
                match piece.parse::<u16>() {
                    Ok(number) => match Flag::new(number) {
                        Some(flag) => flags.push(flag),
                        None => log::warn!("flag cannot be zero on line {}", line_number),
                    },
                    Err(_) => {
                        log::warn!(
                            "malformed numeric flag {:?} on line {}, ignoring the rest of the token",
                            piece,
                            line_number
                        );
                        break;
                    }
                }
            }
        }
        FlagType::Utf8 => {
            if !encoding.is_utf8() {
                log::warn!(
                    "file encoding is not UTF-8, yet flags are, on line {}",
                    line_number
                );
            }
            for ch in token.chars() {
                match u16::try_from(ch as u32) {
                    Ok(number) => {
                        if let Some(flag) = Flag::new(number) {
                            flags.push(flag);
                        }
                    }
                    Err(_) => log::warn!(
                        "flags must be in the basic multilingual plane, skipping {:?} on line {}",
                        ch,
                        line_number
                    ),
                }
            }
        }
    }
    flags
}

/// The first flag of the token, or `None` when nothing decodes.
pub(crate) fn decode_single_flag(
    token: &str,
    flag_type: FlagType,
    encoding: &Encoding,
    line_number: usize,
) -> Option<Flag> {
    decode_flags(token, flag_type, encoding, line_number)
        .first()
        .copied()
}

/// Decodes a flag set, resolving the token as a flag alias first.
///
/// When aliases exist and the token is a positive integer within the alias
/// table, the aliased set is returned verbatim. Anything else decodes as a
/// plain flag sequence.
pub(crate) fn decode_flags_possible_alias(
    token: &str,
    flag_type: FlagType,
    encoding: &Encoding,
    aliases: &[FlagSet],
    line_number: usize,
) -> FlagSet {
    if !aliases.is_empty() {
        if let Ok(index) = token.parse::<usize>() {
            // NOTE: the aliases are 1-indexed.
            if index >= 1 && index <= aliases.len() {
                return aliases[index - 1].clone();
            }
        }
    }
    FlagSet::from(decode_flags(token, flag_type, encoding, line_number))
}

/// Input is assumed to be a single word, i.e. not containing whitespace.
/// This only splits on the slash, it doesn't handle escaping.
// NOTE: in practice no dictionary uses escaping for affix continuation flags.
pub(crate) fn split_word_and_flagset_naive(input: &str) -> (&str, &str) {
    input.split_once('/').unwrap_or((input, ""))
}

fn try_flag_from_u16(val: u16) -> Result<Flag, ParseFlagError> {
    Flag::new(val).ok_or(ParseFlagError::ZeroFlag)
}

fn try_flag_from_char(ch: char) -> Result<Flag, ParseFlagError> {
    if ch as u32 > u16::MAX as u32 {
        return Err(ParseFlagError::FlagAbove65535);
    }
    try_flag_from_u16(ch as u16)
}

/// Parses one COMPOUNDRULE body.
///
/// The grammar depends on the flag type: `Short` and `Utf8` rules are plain
/// flag sequences with in-band `*`/`?` wildcards; `Long` and `Numeric` rules
/// wrap each flag in `( )` with an optional wildcard after the closing
/// parenthesis.
pub(crate) fn parse_compound_rule(
    input: &str,
    flag_type: FlagType,
) -> Result<CompoundRule, ParseCompoundRuleError> {
    use CompoundRuleElement as Elem;

    let rough_capacity = if matches!(flag_type, FlagType::Long) {
        input.len() / 2
    } else {
        input.len()
    };
    let mut rule = Vec::with_capacity(rough_capacity);

    match flag_type {
        FlagType::Short => {
            for ch in input.chars() {
                if !ch.is_ascii() {
                    return Err(ParseFlagError::NonAscii(ch).into());
                }
                let element = match ch {
                    // Can't start with a wildcard.
                    '*' | '?' if rule.is_empty() => {
                        return Err(ParseCompoundRuleError::InvalidFormat);
                    }
                    '*' => Elem::ZeroOrMore,
                    '?' => Elem::ZeroOrOne,
                    _ => Elem::Flag(try_flag_from_char(ch)?),
                };
                rule.push(element);
            }
        }
        FlagType::Utf8 => {
            for ch in input.chars() {
                let element = match ch {
                    // Can't start with a wildcard.
                    '*' | '?' if rule.is_empty() => {
                        return Err(ParseCompoundRuleError::InvalidFormat);
                    }
                    '*' => Elem::ZeroOrMore,
                    '?' => Elem::ZeroOrOne,
                    _ => Elem::Flag(try_flag_from_char(ch)?),
                };
                rule.push(element);
            }
        }
        FlagType::Long => {
            let mut chars = input.chars().peekable();

            loop {
                match chars.next() {
                    Some('(') => {
                        let c1 = match chars.next() {
                            Some(ch) if !ch.is_ascii() => {
                                return Err(ParseFlagError::NonAscii(ch).into())
                            }
                            Some(ch) if ch != ')' => ch,
                            _ => return Err(ParseCompoundRuleError::InvalidFormat),
                        };
                        let c2 = match chars.next() {
                            Some(ch) if !ch.is_ascii() => {
                                return Err(ParseFlagError::NonAscii(ch).into())
                            }
                            Some(ch) if ch != ')' => ch,
                            _ => return Err(ParseCompoundRuleError::InvalidFormat),
                        };

                        if chars.next() != Some(')') {
                            return Err(ParseCompoundRuleError::InvalidFormat);
                        }

                        let flag = try_flag_from_u16(((c1 as u16) << 8) | c2 as u16)?;
                        rule.push(Elem::Flag(flag));
                    }
                    Some(_) => return Err(ParseCompoundRuleError::InvalidFormat),
                    None => break,
                }

                match chars.peek() {
                    Some('*') => {
                        rule.push(Elem::ZeroOrMore);
                        chars.next();
                    }
                    Some('?') => {
                        rule.push(Elem::ZeroOrOne);
                        chars.next();
                    }
                    _ => (),
                }
            }
        }
        FlagType::Numeric => {
            // Most dictionaries will not exceed 3 digit numeric flags.
            let mut number = String::with_capacity(3);
            let mut chars = input.chars().peekable();

            loop {
                match chars.next() {
                    Some('(') => {
                        loop {
                            match chars.next() {
                                Some(ch) if ch.is_ascii_digit() => number.push(ch),
                                Some(')') if !number.is_empty() => break,
                                _ => return Err(ParseCompoundRuleError::InvalidFormat),
                            }
                        }

                        let n = number
                            .parse::<u16>()
                            .map_err(ParseFlagError::ParseIntError)?;
                        number.clear();

                        let flag = try_flag_from_u16(n)?;
                        rule.push(Elem::Flag(flag));
                    }
                    Some(_) => return Err(ParseCompoundRuleError::InvalidFormat),
                    None => break,
                }

                match chars.peek() {
                    Some('*') => {
                        rule.push(Elem::ZeroOrMore);
                        chars.next();
                    }
                    Some('?') => {
                        rule.push(Elem::ZeroOrOne);
                        chars.next();
                    }
                    _ => (),
                }
            }
        }
    }

    Ok(rule.into_boxed_slice())
}

/// An error from parsing a `.aff` or `.dic` file.
///
/// Only stream failures and a missing word count are errors; every
/// recoverable problem is reported out-of-band as a warning instead.
#[derive(Debug)]
pub struct ParseDictionaryError {
    pub kind: ParseDictionaryErrorKind,
    pub source: ParseDictionaryErrorSource,
    pub line_number: Option<usize>,
}

impl fmt::Display for ParseDictionaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(
                f,
                "failed to parse {} file on line {}: {}",
                self.source, line, self.kind
            ),
            None => write!(f, "failed to parse {} file: {}", self.source, self.kind),
        }
    }
}

impl std::error::Error for ParseDictionaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseDictionaryErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseDictionaryErrorKind {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("the file is empty")]
    Empty,
    #[error("expected the first line to be the approximate word count")]
    MissingWordCount,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ParseDictionaryErrorSource {
    #[error(".dic")]
    Dic,
    #[error(".aff")]
    Aff,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseFlagError {
    #[error("expected an ascii char, found {0}")]
    NonAscii(char),
    #[error("invalid number: {0}")]
    ParseIntError(core::num::ParseIntError),
    #[error("flag cannot be zero")]
    ZeroFlag,
    #[error("flag's binary representation exceeds 65535")]
    FlagAbove65535,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseCompoundRuleError {
    #[error("failed to parse flag: {0}")]
    ParseFlagError(#[from] ParseFlagError),
    #[error("invalid compound rule format")]
    InvalidFormat,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("expected FLAG to be `long`, `num` or `UTF-8` if set, found {0}")]
pub struct UnknownFlagTypeError(String);

impl FromStr for FlagType {
    type Err = UnknownFlagTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The keyword is case-insensitive: `FLAG long` and `FLAG LONG` both occur in the wild.
        match s.to_ascii_uppercase().as_str() {
            "LONG" => Ok(Self::Long),
            "NUM" => Ok(Self::Numeric),
            "UTF-8" => Ok(Self::Utf8),
            _ => Err(UnknownFlagTypeError(s.to_string())),
        }
    }
}

/// An error arising from validating a [`Condition`].
///
/// Conditions are a subset of regular expressions that include positive and negative character
/// classes and the wildcard character. A condition might fail validation if the character classes
/// are open (for example `foo]` or `foo[bar`) or if the condition has an empty character class,
/// which is not valid (`[]`).
#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ConditionError {
    /// The pattern contained an opening `[` character which did not match a closing `]`
    /// character.
    #[error("closing bracket has no matching opening bracket")]
    UnopenedCharacterClass,
    /// The pattern contained a closing `]` character which did not match an opening `[`
    /// character.
    #[error("opening bracket has no matching closing bracket")]
    UnclosedCharacterClass,
    /// The pattern contained the literal `[]` which is not a valid character class.
    #[error("empty bracket expression")]
    EmptyCharacterClass,
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scan = s;
        let mut chars = 0;

        // Loop through the characters. We can't just iterate through the `.chars()` because we'll
        // be jumping ahead with the help of `find`.
        loop {
            // Find a bracket. Brackets signal character classes.
            let bracket_index = match scan.find(['[', ']']) {
                Some(index) => index,
                None => {
                    // If there isn't one, accept the rest of the string.
                    chars += scan.chars().count();
                    break;
                }
            };
            // If there is one, scan ahead to it.
            chars += scan[..bracket_index].chars().count();
            scan = &scan[bracket_index..];
            match scan
                .chars()
                .next()
                .expect("scan can't be empty if the pattern matched")
            {
                ']' => return Err(Self::Err::UnopenedCharacterClass),
                '[' => {
                    scan = &scan[1..];
                    match scan.chars().next() {
                        None => return Err(Self::Err::UnclosedCharacterClass),
                        Some('^') => scan = &scan[1..],
                        _ => (),
                    }

                    match scan.find(']') {
                        None => return Err(Self::Err::UnclosedCharacterClass),
                        Some(0) => return Err(Self::Err::EmptyCharacterClass),
                        Some(bracket_index) => {
                            // Only count the character class as one character.
                            chars += 1;
                            scan = &scan[bracket_index + 1..];
                            continue;
                        }
                    }
                }
                // This is impossible if `find` found `[` or `]`.
                _ => unreachable!(),
            }
        }

        Ok(Self {
            pattern: String::from(s),
            chars,
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::{flag, flagset};

    #[test]
    fn naive_word_flagset_split_test() {
        assert_eq!(
            ("word", "flags"),
            split_word_and_flagset_naive("word/flags")
        );
        assert_eq!(("word", ""), split_word_and_flagset_naive("word"));
        assert_eq!(("", ""), split_word_and_flagset_naive(""));
    }

    fn utf8() -> Encoding {
        Encoding::new("UTF-8")
    }

    #[test]
    fn decode_flags_short() {
        assert_eq!(
            decode_flags("abz", FlagType::Short, &utf8(), 1),
            vec![flag!('a'), flag!('b'), flag!('z')]
        );
        // The sequence keeps order and duplicates.
        assert_eq!(
            decode_flags("zaz", FlagType::Short, &utf8(), 1),
            vec![flag!('z'), flag!('a'), flag!('z')]
        );
    }

    #[test]
    fn decode_flags_short_utf8_is_bytewise() {
        // Bug-compatible behavior: "á" is C3 A1 in UTF-8 and decodes to one flag per byte.
        assert_eq!(
            decode_flags("áb", FlagType::Short, &utf8(), 1),
            vec![flag!(0xC3), flag!(0xA1), flag!('b')]
        );
    }

    #[test]
    fn decode_flags_long() {
        assert_eq!(
            decode_flags("zxcv", FlagType::Long, &utf8(), 1),
            vec![flag!(('z' as u16) << 8 | 'x' as u16), flag!(('c' as u16) << 8 | 'v' as u16)]
        );
        // An odd-length token decodes its trailing byte with a zero high byte.
        assert_eq!(
            decode_flags("abc", FlagType::Long, &utf8(), 1),
            vec![flag!(0x6162), flag!(0x0063)]
        );
    }

    #[test]
    fn decode_flags_numeric() {
        assert_eq!(decode_flags("1", FlagType::Numeric, &utf8(), 1), vec![flag!(1)]);
        assert_eq!(
            decode_flags("70,7,252,976", FlagType::Numeric, &utf8(), 1),
            vec![flag!(70), flag!(7), flag!(252), flag!(976)]
        );
        // A malformed chunk stops the comma chain, keeping what was decoded.
        assert_eq!(
            decode_flags("5,x,6", FlagType::Numeric, &utf8(), 1),
            vec![flag!(5)]
        );
        // Zero is the "no flag" reservation.
        assert_eq!(decode_flags("0", FlagType::Numeric, &utf8(), 1), vec![]);
        // Values must fit in 16 bits.
        assert_eq!(decode_flags("70000", FlagType::Numeric, &utf8(), 1), vec![]);
    }

    #[test]
    fn decode_flags_utf8_skips_non_bmp() {
        assert_eq!(
            decode_flags("a😀ш", FlagType::Utf8, &utf8(), 1),
            vec![flag!('a'), flag!('ш' as u16)]
        );
    }

    #[test]
    fn decode_flagset_alias_test() {
        let aliases = &[flagset![1], flagset![2], flagset![3, 4]];

        // NOTE: 1-indexing.
        assert_eq!(
            flagset![1],
            decode_flags_possible_alias("1", FlagType::default(), &utf8(), aliases, 1)
        );
        assert_eq!(
            flagset![2],
            decode_flags_possible_alias("2", FlagType::default(), &utf8(), aliases, 1)
        );
        assert_eq!(
            flagset![3, 4],
            decode_flags_possible_alias("3", FlagType::default(), &utf8(), aliases, 1)
        );
        assert_eq!(
            flagset!['a' as u16],
            decode_flags_possible_alias("a", FlagType::default(), &utf8(), aliases, 1)
        );
        // Out-of-range indices fall back to a plain decode.
        assert_eq!(
            flagset!['4' as u16],
            decode_flags_possible_alias("4", FlagType::default(), &utf8(), aliases, 1)
        );
        // Aliases take priority for every flag type, numeric included.
        assert_eq!(
            flagset![3, 4],
            decode_flags_possible_alias("3", FlagType::Numeric, &utf8(), aliases, 1)
        );
        // Without aliases the token is a plain flag.
        assert_eq!(
            flagset!['1' as u16],
            decode_flags_possible_alias("1", FlagType::default(), &utf8(), &[], 1)
        );
    }

    #[test]
    fn parse_flag_type_test() {
        assert_eq!("long".parse::<FlagType>(), Ok(FlagType::Long));
        assert_eq!("LONG".parse::<FlagType>(), Ok(FlagType::Long));
        assert_eq!("num".parse::<FlagType>(), Ok(FlagType::Numeric));
        assert_eq!("UTF-8".parse::<FlagType>(), Ok(FlagType::Utf8));
        assert!("bogus".parse::<FlagType>().is_err());
    }

    #[test]
    fn parse_condition_test() {
        assert_eq!(
            Err(ConditionError::EmptyCharacterClass),
            "[]".parse::<Condition>()
        );
        assert_eq!(
            Err(ConditionError::UnclosedCharacterClass),
            "[foo".parse::<Condition>()
        );
        assert_eq!(
            Err(ConditionError::UnopenedCharacterClass),
            "foo]".parse::<Condition>()
        );
        assert_eq!(
            Ok(Condition {
                pattern: "foo".to_string(),
                chars: 3
            }),
            "foo".parse()
        );
        assert_eq!(
            Ok(Condition {
                pattern: "foo[bar]".to_string(),
                chars: 4
            }),
            "foo[bar]".parse()
        );
        assert_eq!(
            Ok(Condition {
                pattern: "[foo]bar".to_string(),
                chars: 4
            }),
            "[foo]bar".parse()
        );
        assert_eq!(
            Ok(Condition {
                pattern: "foo[bar]baz".to_string(),
                chars: 7
            }),
            "foo[bar]baz".parse()
        );
    }

    #[test]
    fn parse_compound_rule_test() {
        use ParseCompoundRuleError as Error;
        use CompoundRuleElement as Elem;

        assert_eq!(
            parse_compound_rule("ab?c*d", FlagType::Short).as_deref(),
            Ok(&[
                Elem::Flag(flag!('a')),
                Elem::Flag(flag!('b')),
                Elem::ZeroOrOne,
                Elem::Flag(flag!('c')),
                Elem::ZeroOrMore,
                Elem::Flag(flag!('d')),
            ][..])
        );

        // Hello, en_GB.aff
        assert_eq!(
            parse_compound_rule("#*0{", FlagType::Utf8).as_deref(),
            Ok(&[
                Elem::Flag(flag!('#')),
                Elem::ZeroOrMore,
                Elem::Flag(flag!('0')),
                Elem::Flag(flag!('{')),
            ][..])
        );

        assert_eq!(
            parse_compound_rule("(5)(6)*(11)?(99)", FlagType::Numeric).as_deref(),
            Ok(&[
                Elem::Flag(flag!(5)),
                Elem::Flag(flag!(6)),
                Elem::ZeroOrMore,
                Elem::Flag(flag!(11)),
                Elem::ZeroOrOne,
                Elem::Flag(flag!(99)),
            ][..])
        );

        assert_eq!(
            parse_compound_rule("(L')(D')*(H')?(BC)", FlagType::Long).as_deref(),
            Ok(&[
                Elem::Flag(flag!(('L' as u16) << 8 | '\'' as u16)),
                Elem::ZeroOrMore,
                Elem::Flag(flag!(('D' as u16) << 8 | '\'' as u16)),
                Elem::ZeroOrOne,
                Elem::Flag(flag!(('H' as u16) << 8 | '\'' as u16)),
                Elem::Flag(flag!(('B' as u16) << 8 | 'C' as u16)),
            ][..])
        );

        // Can't start with a wildcard
        assert_eq!(
            Err(Error::InvalidFormat),
            parse_compound_rule("*", FlagType::Short)
        );
        assert_eq!(
            Err(Error::InvalidFormat),
            parse_compound_rule("?", FlagType::Short)
        );
    }

    fn parse(aff: &str) -> AffData<ahash::RandomState> {
        let mut data = AffData::default();
        data.parse_aff(&mut Cursor::new(aff.as_bytes())).unwrap();
        data
    }

    #[test]
    fn basic_prefix_test() {
        // From `en_GB.aff`.
        let aff = "
        PFX A Y 2
        PFX A 0 re [^e]
        PFX A 0 re- e
        ";

        let data = parse(aff);
        assert_eq!(2, data.prefixes.len());
        assert_eq!(
            Prefix::new(flag!('A'), true, None, "re", Some("[^e]"), flagset![], vec![]).unwrap(),
            data.prefixes.table[0]
        );
        assert_eq!(
            Prefix::new(flag!('A'), true, None, "re-", Some("e"), flagset![], vec![]).unwrap(),
            data.prefixes.table[1]
        );
    }

    #[test]
    fn bom_only_file() {
        let mut data = AffData::<ahash::RandomState>::default();
        data.parse_aff(&mut Cursor::new(&b"\xEF\xBB\xBF"[..])).unwrap();

        assert_eq!(data.flag_type, FlagType::Short);
        assert!(data.encoding.is_empty());
        let mut breaks: Vec<&str> = data
            .break_table
            .start_word_breaks()
            .chain(data.break_table.middle_word_breaks())
            .chain(data.break_table.end_word_breaks())
            .collect();
        breaks.sort_unstable();
        assert_eq!(breaks, ["-", "-", "-"]);
        assert_eq!(data.break_table.start_word_breaks().count(), 1);
        assert_eq!(data.break_table.end_word_breaks().count(), 1);
    }

    #[test]
    fn bom_then_commands() {
        let mut data = AffData::<ahash::RandomState>::default();
        data.parse_aff(&mut Cursor::new(&b"\xEF\xBB\xBFSET UTF-8\n"[..]))
            .unwrap();
        assert!(data.encoding.is_utf8());
    }

    #[test]
    fn missing_break_installs_defaults() {
        let data = parse("SET UTF-8\n");
        assert_eq!(
            data.break_table.start_word_breaks().collect::<Vec<_>>(),
            ["-"]
        );
        assert_eq!(
            data.break_table.middle_word_breaks().collect::<Vec<_>>(),
            ["-"]
        );
        assert_eq!(
            data.break_table.end_word_breaks().collect::<Vec<_>>(),
            ["-"]
        );
    }

    #[test]
    fn break_zero_suppresses_defaults() {
        let data = parse("BREAK 0\n");
        assert!(data.break_table.is_empty());
    }

    #[test]
    fn duplicated_set_keeps_first() {
        let data = parse("SET ISO8859-1\nSET UTF-8\n");
        assert_eq!(data.encoding.name(), "ISO8859-1");
    }

    #[test]
    fn counted_vector_extras_are_ignored() {
        let aff = "
        REP 2
        REP a b
        REP c d
        REP e f
        ";
        let data = parse(aff);
        assert_eq!(
            data.replacements,
            vec![("a".to_string(), "b".to_string()), ("c".to_string(), "d".to_string())]
        );
    }

    #[test]
    fn counted_vector_entries_need_not_be_contiguous() {
        let aff = "
        REP 2
        REP a b
        TRY abc
        REP c d
        ";
        let data = parse(aff);
        assert_eq!(data.replacements.len(), 2);
        assert_eq!(data.try_chars, "abc");
    }

    #[test]
    fn counted_vector_malformed_count_ignores_entries() {
        let aff = "
        REP x
        REP a b
        ";
        let data = parse(aff);
        assert!(data.replacements.is_empty());
    }

    #[test]
    fn commands_are_case_insensitive() {
        let data = parse("set UTF-8\ntry abc\n");
        assert!(data.encoding.is_utf8());
        assert_eq!(data.try_chars, "abc");
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let aff = "
        # a comment
        TRY abc # trailing words are comments too

        IGNORE xyz
        ";
        let data = parse(aff);
        assert_eq!(data.try_chars, "abc");
        assert_eq!(data.ignore_chars, "xyz");
    }

    #[test]
    fn affix_cross_product_first_registration_wins() {
        let aff = "
        SFX T N 1
        SFX T 0 s .
        SFX T Y 1
        SFX T 0 es .
        ";
        let data = parse(aff);
        assert_eq!(data.suffixes.len(), 2);
        assert!(data.suffixes.iter().all(|suffix| !suffix.crossproduct));
    }

    #[test]
    fn affix_continuation_flags() {
        let aff = "
        SFX S Y 1
        SFX S 0 s/AB .
        ";
        let data = parse(aff);
        assert_eq!(data.suffixes.len(), 1);
        assert_eq!(data.suffixes.table[0].flags, flagset!['A', 'B']);
    }

    #[test]
    fn affix_body_strip_and_add_zero_normalization() {
        let aff = "
        SFX Z Y 1
        SFX Z 0 0 .
        ";
        let data = parse(aff);
        assert_eq!(data.suffixes.len(), 1);
        let suffix = &data.suffixes.table[0];
        assert_eq!(suffix.strip(), None);
        assert_eq!(suffix.add, "");
    }

    #[test]
    fn affix_morph_fields_are_stored() {
        let aff = "
        SFX M Y 1
        SFX M 0 s . is:plural
        ";
        let data = parse(aff);
        assert_eq!(data.suffixes.table[0].morph_fields, vec!["is:plural".to_string()]);
    }

    #[test]
    fn malformed_affix_entry_is_skipped() {
        let aff = "
        SFX B Y 2
        SFX B 0 able [foo
        SFX B 0 ible .
        ";
        let data = parse(aff);
        // The first body has an unclosed character class; only the second survives.
        assert_eq!(data.suffixes.len(), 1);
        assert_eq!(data.suffixes.table[0].add, "ible");
    }

    #[test]
    fn flag_aliases_decode_under_flag_type() {
        let aff = "
        FLAG long
        AF 2
        AF zx
        AF cv
        ";
        let data = parse(aff);
        assert_eq!(
            data.flag_aliases,
            vec![
                flagset![('z' as u16) << 8 | 'x' as u16],
                flagset![('c' as u16) << 8 | 'v' as u16]
            ]
        );
    }

    #[test]
    fn compound_syllable_parsing() {
        let data = parse("COMPOUNDSYLLABLE 8 aeiou\n");
        assert_eq!(data.options.compound_syllable_max, NonZeroU16::new(8));
        assert_eq!(data.compound_syllable_vowels, "aeiou");
    }

    #[test]
    fn syllable_num_is_a_flag_sequence() {
        let data = parse("SYLLABLENUM cJ\n");
        assert_eq!(data.compound_syllable_num, flagset!['c', 'J']);
    }

    #[test]
    fn checkcompoundpattern_entries() {
        let aff = "
        CHECKCOMPOUNDPATTERN 2
        CHECKCOMPOUNDPATTERN o/X b/Y z
        CHECKCOMPOUNDPATTERN 0 n
        ";
        let data = parse(aff);
        assert_eq!(data.compound_patterns.len(), 2);

        let pattern = &data.compound_patterns[0];
        assert_eq!(pattern.begin_end_chars.left(), "o");
        assert_eq!(pattern.begin_end_chars.right(), "b");
        assert_eq!(pattern.first_word_flag, Some(flag!('X')));
        assert_eq!(pattern.second_word_flag, Some(flag!('Y')));
        assert_eq!(pattern.replacement.as_deref(), Some("z"));
        assert!(!pattern.match_first_only_unaffixed_or_zero_affixed);

        let pattern = &data.compound_patterns[1];
        assert_eq!(pattern.begin_end_chars.left(), "");
        assert_eq!(pattern.begin_end_chars.right(), "n");
        assert!(pattern.match_first_only_unaffixed_or_zero_affixed);
    }

    #[test]
    fn options_smoke_test() {
        let aff = "
        SET UTF-8
        LANG en_US
        COMPLEXPREFIXES
        FULLSTRIP
        COMPOUNDMIN 1
        COMPOUNDWORDMAX 3
        MAXDIFF 20
        NOSUGGEST !
        FORBIDDENWORD *
        COMPOUNDFLAG c
        ";
        let data = parse(aff);
        assert!(data.encoding.is_utf8());
        assert_eq!(data.language, "en_US");
        assert!(data.options.complex_prefixes);
        assert!(data.options.fullstrip);
        assert_eq!(data.options.compound_min_length, NonZeroU16::new(1));
        assert_eq!(data.options.compound_max_word_count, NonZeroU16::new(3));
        // Out-of-range MAXDIFF clamps to the default.
        assert_eq!(data.options.max_diff_factor, 5);
        assert_eq!(data.options.no_suggest_flag, Some(flag!('!')));
        assert_eq!(data.options.forbidden_word_flag, Some(flag!('*')));
        assert_eq!(data.options.compound_flag, Some(flag!('c')));
    }

    #[test]
    fn legacy_encoding_lines_are_decoded() {
        // "TRY <e-acute>" in ISO8859-1 bytes.
        let mut aff: Vec<u8> = Vec::new();
        aff.extend_from_slice(b"SET ISO8859-1\n");
        aff.extend_from_slice(b"TRY \xE9\n");

        let mut data = AffData::<ahash::RandomState>::default();
        data.parse_aff(&mut Cursor::new(&aff[..])).unwrap();
        assert_eq!(data.try_chars, "é");
    }
}
