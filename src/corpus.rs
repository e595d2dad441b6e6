use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use thiserror::Error;

use crate::trie::Trie;
use crate::{MAX_WORD_LEN, MIN_WORD_LEN};

#[derive(Error, Debug, PartialEq)]
pub enum CorpusError {
    #[error("Invalid character '{0}' in query pattern")]
    InvalidPattern(char),
    #[error("Unable to open the word list '{0}'")]
    FileOpenError(String),
}

/// Where a word came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSource {
    Test,
    File,
    Custom,
}

/// A single scored corpus entry. Uppercase A-Z only, length 3 to 22;
/// higher scores are better and 0 means unscored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub word: String,
    pub score: i64,
    pub source: WordSource,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.word, self.score)
    }
}

lazy_static! {
    static ref TEST_WORDS: Vec<(&'static str, i64)> = vec![
        ("SKIP", 50),
        ("JUMP", 50),
        ("HELP", 40),
        ("FLOP", 30),
        ("SLOW", 30),
        ("HAND", 40),
        ("SLAP", 20),
        ("LUMP", 20),
        ("LEAP", 40),
        ("CAT", 50),
        ("ART", 40),
        ("TEE", 30),
        ("CAR", 50),
        ("ATE", 40),
        ("RED", 50),
        ("TAR", 30),
        ("ERA", 40),
        ("SEA", 50),
    ];
}

/// An immutable collection of scored words plus the machinery to slice it
/// by length and index it with per-length tries.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    words: Vec<Word>,
    index: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus from `(word, score)` pairs. Letters are uppercased;
    /// entries with non-letter characters or a length outside 3..=22 are
    /// dropped. Feeding the same word twice keeps its first position but
    /// the last score wins.
    pub fn from_pairs<I, S>(pairs: I, source: WordSource) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut corpus = Corpus::default();
        for (word, score) in pairs {
            corpus.push(word.as_ref(), score, source);
        }
        corpus
    }

    /// Load a two-column `word<DELIM>score` list. Blank lines are skipped,
    /// fields are trimmed, and rows whose word is not 3-22 letters are
    /// dropped. A missing or unparseable score counts as 0.
    pub fn from_path(path: &Path, delimiter: char) -> Result<Self, CorpusError> {
        let file = File::open(path)
            .map_err(|_| CorpusError::FileOpenError(path.display().to_string()))?;
        let mut corpus = Corpus::default();
        for line in io::BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (word, score) = match line.split_once(delimiter) {
                Some((word, score)) => (word.trim(), score.trim().parse::<i64>().unwrap_or(0)),
                None => (line, 0),
            };
            corpus.push(word, score, WordSource::File);
        }
        Ok(corpus)
    }

    /// The small built-in list used by unit tests and demos.
    pub fn from_test() -> Self {
        Corpus::from_pairs(TEST_WORDS.iter().cloned(), WordSource::Test)
    }

    fn push(&mut self, word: &str, score: i64, source: WordSource) {
        let len = word.chars().count();
        if !(MIN_WORD_LEN..=MAX_WORD_LEN).contains(&len)
            || !word.chars().all(|c| c.is_ascii_alphabetic())
        {
            debug!("Dropping word list entry '{}'", word);
            return;
        }
        let word = word.to_ascii_uppercase();
        match self.index.get(&word) {
            Some(&i) => self.words[i].score = score,
            None => {
                self.index.insert(word.clone(), self.words.len());
                self.words.push(Word {
                    word,
                    score,
                    source,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(&word.to_ascii_uppercase())
    }

    /// A new corpus holding the words with `n <= len <= m`.
    pub fn subset(&self, n: usize, m: usize) -> Self {
        assert!((MIN_WORD_LEN..=MAX_WORD_LEN).contains(&n));
        assert!((MIN_WORD_LEN..=MAX_WORD_LEN).contains(&m));
        assert!(m >= n);
        Corpus::from_pairs(
            self.words
                .iter()
                .filter(|w| (n..=m).contains(&w.word.len()))
                .map(|w| (w.word.as_str(), w.score)),
            WordSource::Custom,
        )
    }

    /// A new corpus holding only the length-`n` words.
    pub fn to_n_letter(&self, n: usize) -> Self {
        self.subset(n, n)
    }

    /// Per-length prefix indexes for lengths 3..=kmax, indexed by raw word
    /// length when `padded` (slots 0..=2 are `None` placeholders).
    pub fn to_n_tries(&self, kmax: usize, padded: bool) -> Vec<Option<Trie>> {
        assert!(kmax >= MIN_WORD_LEN);
        let mut tries = Vec::with_capacity(kmax + 1);
        if padded {
            tries.extend((0..MIN_WORD_LEN).map(|_| None));
        }
        for k in MIN_WORD_LEN..=kmax {
            let mut trie = Trie::new(k);
            for w in self.words.iter().filter(|w| w.word.len() == k) {
                trie.insert(&w.word);
            }
            tries.push(Some(trie));
        }
        tries
    }

    /// All words matching a masked pattern, best scores first (stable for
    /// ties). `?`, `-`, and ` ` each match any single letter; letters match
    /// themselves case-insensitively; anything else is an error.
    pub fn query(&self, pattern: &str) -> Result<Vec<&Word>, CorpusError> {
        let mut expr = String::with_capacity(pattern.len() + 2);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                'A'..='Z' | 'a'..='z' => expr.push(c.to_ascii_uppercase()),
                '?' | '-' | ' ' => expr.push('.'),
                other => return Err(CorpusError::InvalidPattern(other)),
            }
        }
        expr.push('$');
        let regex = Regex::new(&expr).expect("Unable to build query regex");

        let len = pattern.chars().count();
        let mut matching: Vec<&Word> = self
            .words
            .iter()
            .filter(|w| w.word.len() == len && regex.is_match(&w.word))
            .collect();
        matching.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(matching)
    }

    /// Words of the given length carrying specific letters at fixed
    /// 0-based positions, in corpus order. An out-of-range position
    /// matches nothing.
    pub fn match_at(&self, word_len: usize, letters: &[(usize, char)]) -> Vec<&Word> {
        self.words
            .iter()
            .filter(|w| {
                w.word.len() == word_len
                    && letters
                        .iter()
                        .all(|&(i, c)| w.word.chars().nth(i) == Some(c.to_ascii_uppercase()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Corpus, CorpusError, WordSource};

    fn scored(pairs: &[(&str, i64)]) -> Corpus {
        Corpus::from_pairs(pairs.iter().cloned(), WordSource::Custom)
    }

    #[test]
    fn build_drops_invalid_entries() {
        let corpus = scored(&[
            ("CAT", 1),
            ("at", 1),
            ("C4T", 1),
            ("ABCDEFGHIJKLMNOPQRSTUVW", 1),
            ("dog", 2),
        ]);
        assert_eq!(corpus.len(), 2);
        assert!(corpus.contains("cat"));
        assert!(corpus.contains("DOG"));
    }

    #[test]
    fn duplicate_words_keep_position_and_take_last_score() {
        let corpus = scored(&[("CAT", 1), ("DOG", 5), ("CAT", 9)]);
        assert_eq!(corpus.len(), 2);
        let words: Vec<_> = corpus.iter().map(|w| (w.word.as_str(), w.score)).collect();
        assert_eq!(words, vec![("CAT", 9), ("DOG", 5)]);
    }

    #[test]
    fn subset_filters_by_length() {
        let corpus = Corpus::from_test();
        let threes = corpus.to_n_letter(3);
        assert!(threes.iter().all(|w| w.word.len() == 3));
        assert!(threes.contains("CAT"));
        assert!(!threes.contains("SKIP"));
        // The parent corpus is untouched.
        assert!(corpus.contains("SKIP"));
    }

    #[test]
    fn padded_tries_index_by_raw_length() {
        let corpus = Corpus::from_test();
        let tries = corpus.to_n_tries(5, true);
        assert_eq!(tries.len(), 6);
        assert!(tries[0].is_none());
        assert!(tries[2].is_none());
        assert!(tries[3].as_ref().unwrap().has_exact("CAT"));
        assert!(tries[4].as_ref().unwrap().has_exact("SKIP"));
        assert!(tries[5].as_ref().unwrap().is_empty());

        let unpadded = corpus.to_n_tries(5, false);
        assert_eq!(unpadded.len(), 3);
        assert_eq!(unpadded[0].as_ref().unwrap().word_len(), 3);
    }

    #[test]
    fn query_matches_masked_patterns_in_score_order() {
        let corpus = scored(&[
            ("ACED", 4),
            ("ARID", 8),
            ("WORD", 99),
            ("ACID", 10),
            ("AMID", 6),
        ]);
        let hits: Vec<_> = corpus
            .query("A--D")
            .unwrap()
            .into_iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(hits, vec!["ACID", "ARID", "AMID", "ACED"]);
    }

    #[test]
    fn query_wildcards_are_equivalent_and_case_is_ignored() {
        let corpus = scored(&[("CAT", 1), ("COT", 1), ("CUT", 1), ("DOG", 1)]);
        for pattern in ["C?T", "C-T", "C T", "c?t"] {
            let hits = corpus.query(pattern).unwrap();
            assert_eq!(hits.len(), 3, "pattern {:?}", pattern);
            assert!(hits.iter().all(|w| w.word.starts_with('C')));
        }
    }

    #[test]
    fn query_ties_keep_input_order() {
        let corpus = scored(&[("CAT", 5), ("COT", 5), ("CUT", 7)]);
        let hits: Vec<_> = corpus
            .query("C--")
            .unwrap()
            .into_iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(hits, vec!["CUT", "CAT", "COT"]);
    }

    #[test]
    fn query_rejects_stray_characters() {
        let corpus = Corpus::from_test();
        assert_eq!(
            corpus.query("A.D"),
            Err(CorpusError::InvalidPattern('.'))
        );
        assert_eq!(
            corpus.query("A1D"),
            Err(CorpusError::InvalidPattern('1'))
        );
    }

    #[test]
    fn match_at_pins_letters_by_position() {
        let corpus = Corpus::from_test();
        let hits: Vec<_> = corpus
            .match_at(3, &[(0, 'c'), (2, 'T')])
            .into_iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(hits, vec!["CAT"]);
        assert!(corpus.match_at(3, &[(9, 'A')]).is_empty());
        assert_eq!(corpus.match_at(4, &[]).len(), 9);
    }

    #[test]
    fn query_only_returns_words_of_matching_length() {
        let corpus = Corpus::from_test();
        assert!(corpus
            .query("------")
            .unwrap()
            .is_empty());
        let threes = corpus.query("---").unwrap();
        assert!(threes.iter().all(|w| w.word.len() == 3));
    }
}
