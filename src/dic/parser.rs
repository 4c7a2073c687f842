//! The streaming loader for `.dic` word-list files.
//!
//! The grammar is `word[/flags][<tab>morph-fields...]` with `\/` escaping a
//! literal slash inside the word, after a first line holding an approximate
//! word count. The encoding follows the companion affix file's `SET`
//! command, and flags resolve through its `AF` alias table.

use std::{hash::BuildHasher, io::BufRead};

use crate::{
    aff::parser::{
        decode_flags_possible_alias, parse_leading_usize, ParseDictionaryError,
        ParseDictionaryErrorKind, ParseDictionaryErrorSource,
    },
    aff::AffData,
    dic::WordList,
    encoding::{decode_line, strip_bom, trim_line_ending, validate_utf8},
    FlagSet,
};

pub(crate) fn parse_dic<R: BufRead, S: BuildHasher + Default>(
    reader: &mut R,
    data: &mut AffData<S>,
) -> Result<(), ParseDictionaryError> {
    let mut buf = Vec::new();
    let mut line_number = 1usize;

    let read = reader
        .read_until(b'\n', &mut buf)
        .map_err(|err| error(ParseDictionaryErrorKind::Io(err), Some(1)))?;
    if read == 0 {
        return Err(error(ParseDictionaryErrorKind::Empty, None));
    }
    let bytes = strip_bom(trim_line_ending(&buf));
    if data.encoding.is_utf8() && !validate_utf8(bytes) {
        log::warn!("invalid UTF-8 in .dic file on line 1");
    }
    let line = decode_line(bytes, &data.encoding);

    // The first line is the approximate word count; reserving its capacity up front is the only
    // thing it is used for. A first line without a count is the one fatal parse error.
    let approximate_count = line
        .split_whitespace()
        .next()
        .and_then(parse_leading_usize)
        .ok_or_else(|| error(ParseDictionaryErrorKind::MissingWordCount, Some(1)))?;
    data.words = WordList::with_capacity(approximate_count);

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| error(ParseDictionaryErrorKind::Io(err), Some(line_number + 1)))?;
        if read == 0 {
            break;
        }
        line_number += 1;

        let bytes = trim_line_ending(&buf);
        if data.encoding.is_utf8() && !validate_utf8(bytes) {
            log::warn!("invalid UTF-8 in .dic file on line {}", line_number);
        }
        let line = decode_line(bytes, &data.encoding);

        let (word, flags_token) = split_word_and_flags(&line);
        if word.is_empty() {
            continue;
        }
        let flags = match flags_token {
            Some(token) => decode_flags_possible_alias(
                token,
                data.flag_type,
                &data.encoding,
                &data.flag_aliases,
                line_number,
            ),
            None => FlagSet::new(),
        };
        data.words.insert(word, flags);
    }

    Ok(())
}

/// Splits one `.dic` line into the stem and the optional flag token.
///
/// The split point is the earliest unescaped `/`; `\/` sequences become a
/// literal `/` in the stem. Without a slash the stem runs up to a tab, and
/// as a last resort up to the whitespace preceding something shaped like a
/// morphological field. A stem found by the heuristic may contain spaces.
fn split_word_and_flags(line: &str) -> (String, Option<&str>) {
    let bytes = line.as_bytes();
    let mut slash = None;
    let mut from = 0;
    while let Some(position) = bytes[from..].iter().position(|&b| b == b'/').map(|p| p + from) {
        if position == 0 || bytes[position - 1] != b'\\' {
            slash = Some(position);
            break;
        }
        from = position + 1;
    }

    match slash {
        Some(position) => {
            let word = line[..position].replace("\\/", "/");
            let flags = line[position + 1..].split_whitespace().next();
            (word, flags)
        }
        None => match line.find('\t') {
            Some(tab) => (line[..tab].to_string(), None),
            None => {
                let end = find_end_of_word_heuristic(line).unwrap_or(line.len());
                (line[..end].to_string(), None)
            }
        },
    }
}

/// Scans `line` for a morphological field shaped `[a-z][a-z]:` and returns
/// the position of the space run preceding it, if any.
fn find_end_of_word_heuristic(line: &str) -> Option<usize> {
    if line.len() < 4 {
        return None;
    }
    let bytes = line.as_bytes();
    let mut cursor = 0;
    loop {
        let space = bytes[cursor..].iter().position(|&b| b == b' ')? + cursor;
        let field = bytes[space..].iter().position(|&b| b != b' ')? + space;
        if field > line.len() - 3 {
            return None;
        }
        if bytes[field].is_ascii_lowercase()
            && bytes[field + 1].is_ascii_lowercase()
            && bytes[field + 2] == b':'
        {
            return Some(space);
        }
        cursor = field;
    }
}

fn error(kind: ParseDictionaryErrorKind, line_number: Option<usize>) -> ParseDictionaryError {
    ParseDictionaryError {
        kind,
        source: ParseDictionaryErrorSource::Dic,
        line_number,
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::{flagset, FlagSet, HIDDEN_HOMONYM_FLAG};

    #[test]
    fn word_and_flags_split() {
        assert_eq!(
            split_word_and_flags("word/flags"),
            ("word".to_string(), Some("flags"))
        );
        assert_eq!(split_word_and_flags("word"), ("word".to_string(), None));
        // An escaped slash is part of the word; the next slash splits.
        assert_eq!(
            split_word_and_flags("aa\\/bb/AB"),
            ("aa/bb".to_string(), Some("AB"))
        );
        // A leading slash splits immediately, leaving an empty word.
        assert_eq!(split_word_and_flags("/X"), (String::new(), Some("X")));
        // Without flags the word runs to a tab...
        assert_eq!(
            split_word_and_flags("word\tpo:noun"),
            ("word".to_string(), None)
        );
        // ...or to the whitespace before a morphological field.
        assert_eq!(
            split_word_and_flags("hello world po:noun"),
            ("hello world".to_string(), None)
        );
        // No flags, no tab, no morphological field: the whole line is the word.
        assert_eq!(
            split_word_and_flags("hello world"),
            ("hello world".to_string(), None)
        );
    }

    #[test]
    fn morph_field_heuristic() {
        assert_eq!(find_end_of_word_heuristic("word po:noun"), Some(4));
        assert_eq!(find_end_of_word_heuristic("word  po:noun"), Some(4));
        assert_eq!(find_end_of_word_heuristic("word PO:noun"), None);
        assert_eq!(find_end_of_word_heuristic("word"), None);
        assert_eq!(find_end_of_word_heuristic("a b"), None);
    }

    fn parse(aff: &str, dic: &str) -> crate::aff::AffData<ahash::RandomState> {
        let mut data = crate::aff::AffData::default();
        data.parse_aff(&mut Cursor::new(aff.as_bytes())).unwrap();
        data.parse_dic(&mut Cursor::new(dic.as_bytes())).unwrap();
        data
    }

    fn flag_sets<'a, S: std::hash::BuildHasher>(
        data: &'a crate::aff::AffData<S>,
        stem: &'a str,
    ) -> Vec<&'a FlagSet> {
        let mut sets: Vec<_> = data.words.homonyms(stem).collect();
        sets.sort();
        sets
    }

    #[test]
    fn basic_word_list() {
        let dic = "3\nhello/AB\nworld\nnaïve\n";
        let data = parse("SET UTF-8\n", dic);

        assert_eq!(flag_sets(&data, "hello"), [&flagset!['A', 'B']]);
        assert_eq!(flag_sets(&data, "world"), [&FlagSet::new()]);
        assert_eq!(flag_sets(&data, "naïve"), [&FlagSet::new()]);
    }

    #[test]
    fn flag_alias_resolution() {
        let aff = "
        FLAG UTF-8
        AF 2
        AF AB
        AF CD
        ";
        let data = parse(aff, "1\nword/1\n");
        assert_eq!(flag_sets(&data, "word"), [&flagset!['A', 'B']]);

        let data = parse(aff, "1\nword/2\n");
        assert_eq!(flag_sets(&data, "word"), [&flagset!['C', 'D']]);
    }

    #[test]
    fn hidden_homonym_for_mixed_case_stem() {
        let data = parse("SET UTF-8\n", "1\nAb/X\n");

        assert_eq!(flag_sets(&data, "Ab"), [&flagset!['X']]);
        assert_eq!(
            flag_sets(&data, "AB"),
            [&flagset!['X' as u16, HIDDEN_HOMONYM_FLAG.get()]]
        );
    }

    #[test]
    fn empty_words_are_dropped() {
        let data = parse("", "2\n/X\n\n");
        assert!(data.words.is_empty());
    }

    #[test]
    fn word_count_is_approximate() {
        // More and fewer lines than the declared count both load fine, and trailing junk after
        // the digits is tolerated.
        let data = parse("", "1junk\na\nb\nc\n");
        assert_eq!(data.words.len(), 3);
    }

    #[test]
    fn missing_word_count_is_fatal() {
        let mut data = crate::aff::AffData::<ahash::RandomState>::default();
        data.parse_aff(&mut Cursor::new(&b""[..])).unwrap();
        let err = data
            .parse_dic(&mut Cursor::new(&b"not-a-count\nword\n"[..]))
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ParseDictionaryErrorKind::MissingWordCount
        ));
        assert_eq!(err.source, ParseDictionaryErrorSource::Dic);
    }

    #[test]
    fn empty_dic_file_is_fatal() {
        let mut data = crate::aff::AffData::<ahash::RandomState>::default();
        data.parse_aff(&mut Cursor::new(&b""[..])).unwrap();
        let err = data.parse_dic(&mut Cursor::new(&b""[..])).unwrap_err();
        assert!(matches!(err.kind, ParseDictionaryErrorKind::Empty));
    }

    #[test]
    fn bom_before_word_count() {
        let mut data = crate::aff::AffData::<ahash::RandomState>::default();
        data.parse_aff(&mut Cursor::new(&b""[..])).unwrap();
        data.parse_dic(&mut Cursor::new(&b"\xEF\xBB\xBF1\nword\n"[..]))
            .unwrap();
        assert_eq!(data.words.len(), 1);
    }

    #[test]
    fn numeric_flags_in_word_list() {
        let aff = "FLAG num\n";
        let data = parse(aff, "1\nactionfilm/70,7,252\n");
        assert_eq!(
            flag_sets(&data, "actionfilm"),
            [&flagset![7, 70, 252]]
        );
    }

    #[test]
    fn legacy_encoding_word_list() {
        let mut data = crate::aff::AffData::<ahash::RandomState>::default();
        data.parse_aff(&mut Cursor::new(&b"SET ISO8859-1\n"[..]))
            .unwrap();
        data.parse_dic(&mut Cursor::new(&b"1\ncaf\xE9\n"[..])).unwrap();
        assert_eq!(data.words.homonyms("café").count(), 1);
    }
}
