use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word that can be chosen for a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of cells this word occupies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The glyph at the given offset, if the word is long enough to have one.
    #[must_use]
    pub fn glyph_at(&self, offset: usize) -> Option<GlyphId> {
        self.glyphs.get(offset).copied()
    }
}

/// The master word list. Every variable's domain starts out as the full list, regardless of
/// length, and gets narrowed down from there.
///
/// Entries are upper-cased, deduplicated and sorted, so a `WordId` is also the word's rank in
/// alphabetical order. The search relies on this for reproducible tie-breaking.
#[derive(Clone)]
pub struct WordList {
    /// The set of all chars that appear in any entry, sorted. A `GlyphId` is an index into this.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// Every entry, indexed by `WordId`.
    pub words: Vec<Word>,

    word_id_by_string: HashMap<String, WordId>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl WordList {
    /// Build a word list from raw entries. Leading and trailing whitespace is dropped, blank
    /// entries are skipped and everything else is upper-cased.
    pub fn new<I, S>(raw_words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strings: BTreeSet<String> = raw_words
            .into_iter()
            .map(|raw| raw.as_ref().trim().to_uppercase())
            .filter(|word| !word.is_empty())
            .collect();

        let glyphs: SmallVec<[char; MAX_GLYPH_COUNT]> = strings
            .iter()
            .flat_map(|word| word.chars())
            .collect::<BTreeSet<char>>()
            .into_iter()
            .collect();

        let glyph_ids_by_char: HashMap<char, GlyphId> = glyphs
            .iter()
            .enumerate()
            .map(|(glyph_id, &glyph)| (glyph, glyph_id))
            .collect();

        let words: Vec<Word> = strings
            .into_iter()
            .map(|string| Word {
                glyphs: string.chars().map(|c| glyph_ids_by_char[&c]).collect(),
                string,
            })
            .collect();

        let word_id_by_string = words
            .iter()
            .enumerate()
            .map(|(word_id, word)| (word.string.clone(), word_id))
            .collect();

        WordList {
            glyphs,
            words,
            word_id_by_string,
        }
    }

    /// Load a word list with one entry per line.
    pub fn from_dict_file(path: &Path) -> Result<WordList, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(WordList::new(contents.lines()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Find the id of an entry, using the same normalization as `new`.
    #[must_use]
    pub fn word_id(&self, string: &str) -> Option<WordId> {
        self.word_id_by_string
            .get(&string.trim().to_uppercase())
            .copied()
    }
}
