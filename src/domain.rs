//! The domain store: for each variable, the set of words that could still be assigned to it.
//!
//! Domains only ever shrink, except when the search rewinds to a checkpoint. Every change made
//! after a checkpoint first saves the affected variable's previous domain on a trail, so rewinding
//! just pops the trail back to the checkpoint and puts those entries back.

use bit_set::BitSet;
use log::debug;

use crate::crossword::Crossword;
use crate::types::{VariableId, WordId};

#[derive(Debug, Clone)]
pub struct Domains {
    /// Candidate `WordId`s for each variable, indexed by `VariableId`.
    options: Vec<BitSet>,

    /// Previous domain values recorded since the first checkpoint, oldest first.
    trail: Vec<(VariableId, BitSet)>,

    /// Stack of trail lengths, one per open checkpoint.
    checkpoints: Vec<usize>,
}

impl Domains {
    /// Seed every variable's domain with the full word list.
    #[must_use]
    pub fn new(crossword: &Crossword) -> Domains {
        let all_words: BitSet = (0..crossword.word_list.len()).collect();

        Domains {
            options: (0..crossword.variable_count())
                .map(|_| all_words.clone())
                .collect(),
            trail: vec![],
            checkpoints: vec![],
        }
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.options.len()
    }

    /// How many words are left for this variable?
    #[must_use]
    pub fn len(&self, variable_id: VariableId) -> usize {
        self.options[variable_id].len()
    }

    #[must_use]
    pub fn is_empty(&self, variable_id: VariableId) -> bool {
        self.options[variable_id].is_empty()
    }

    #[must_use]
    pub fn contains(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.options[variable_id].contains(word_id)
    }

    /// The remaining words for this variable, in ascending `WordId` order.
    pub fn iter(&self, variable_id: VariableId) -> impl Iterator<Item = WordId> + '_ {
        self.options[variable_id].iter()
    }

    #[must_use]
    pub fn get(&self, variable_id: VariableId) -> &BitSet {
        &self.options[variable_id]
    }

    /// Remove a single word, returning whether it was present.
    pub fn remove(&mut self, variable_id: VariableId, word_id: WordId) -> bool {
        if !self.options[variable_id].contains(word_id) {
            return false;
        }

        self.save(variable_id);
        self.options[variable_id].remove(word_id)
    }

    /// Keep only the words for which `keep` returns true. Returns how many were removed.
    pub fn retain<F>(&mut self, variable_id: VariableId, mut keep: F) -> usize
    where
        F: FnMut(WordId) -> bool,
    {
        let removals: Vec<WordId> = self.options[variable_id]
            .iter()
            .filter(|&word_id| !keep(word_id))
            .collect();

        if !removals.is_empty() {
            self.save(variable_id);
            for &word_id in &removals {
                self.options[variable_id].remove(word_id);
            }
        }

        removals.len()
    }

    /// Narrow a variable's domain down to exactly one word.
    pub fn restrict_to(&mut self, variable_id: VariableId, word_id: WordId) {
        if self.options[variable_id].len() == 1 && self.options[variable_id].contains(word_id) {
            return;
        }

        self.save(variable_id);
        let options = &mut self.options[variable_id];
        options.clear();
        options.insert(word_id);
    }

    /// Open a checkpoint that a later `rewind` will restore.
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(self.trail.len());
    }

    /// Restore every domain changed since the most recent checkpoint and close it. Returns false if
    /// there was no open checkpoint.
    pub fn rewind(&mut self) -> bool {
        let Some(trail_len) = self.checkpoints.pop() else {
            return false;
        };

        while self.trail.len() > trail_len {
            if let Some((variable_id, previous)) = self.trail.pop() {
                self.options[variable_id] = previous;
            }
        }

        true
    }

    /// Record the current domain of a variable on the trail, unless there's no open checkpoint or
    /// it has already been recorded since the latest one.
    fn save(&mut self, variable_id: VariableId) {
        let Some(&trail_start) = self.checkpoints.last() else {
            return;
        };

        if self.trail[trail_start..]
            .iter()
            .any(|&(saved_id, _)| saved_id == variable_id)
        {
            return;
        }

        self.trail
            .push((variable_id, self.options[variable_id].clone()));
    }
}

/// Remove from each variable's domain every word whose length differs from the variable's.
pub fn enforce_node_consistency(crossword: &Crossword, domains: &mut Domains) {
    let mut removed = 0;

    for config in &crossword.variable_configs {
        let length = config.variable.length;
        removed += domains.retain(config.id, |word_id| {
            crossword.word_list.word(word_id).len() == length
        });
    }

    debug!("Node consistency removed {removed} options");
}

#[cfg(test)]
mod tests {
    use crate::crossword::Crossword;
    use crate::domain::{enforce_node_consistency, Domains};
    use crate::word_list::WordList;

    fn crossword() -> Crossword {
        Crossword::from_template_string(
            "
            ____
            #_##
            #_##
            ",
            WordList::new(["cat", "dog", "bird", "fish", "ox", "horse"]),
        )
        .unwrap()
    }

    #[test]
    fn test_domains_start_with_whole_word_list() {
        let crossword = crossword();
        let domains = Domains::new(&crossword);

        for variable_id in 0..crossword.variable_count() {
            assert_eq!(domains.len(variable_id), 6);
        }
    }

    #[test]
    fn test_node_consistency_keeps_matching_lengths_only() {
        let crossword = crossword();
        let mut domains = Domains::new(&crossword);

        enforce_node_consistency(&crossword, &mut domains);

        for (variable_id, variable) in crossword.variables().enumerate() {
            assert!(domains.len(variable_id) > 0);
            for word_id in domains.iter(variable_id) {
                assert_eq!(crossword.word_list.word(word_id).len(), variable.length);
            }
        }

        // 4-letter across entry: BIRD, FISH. 3-letter down entry: CAT, DOG.
        assert_eq!(domains.len(0), 2);
        assert_eq!(domains.len(1), 2);

        let once = domains.clone();
        enforce_node_consistency(&crossword, &mut domains);
        for variable_id in 0..crossword.variable_count() {
            assert_eq!(domains.get(variable_id), once.get(variable_id));
        }
    }

    #[test]
    fn test_rewind_restores_checkpointed_domains() {
        let crossword = crossword();
        let mut domains = Domains::new(&crossword);
        enforce_node_consistency(&crossword, &mut domains);

        let bird = crossword.word_list.word_id("bird").unwrap();
        let cat = crossword.word_list.word_id("cat").unwrap();
        let before = domains.clone();

        domains.checkpoint();
        domains.restrict_to(0, bird);
        domains.checkpoint();
        assert!(domains.remove(1, cat));
        assert!(!domains.remove(1, cat));
        domains.retain(1, |_| false);
        assert!(domains.is_empty(1));

        assert!(domains.rewind());
        assert_eq!(domains.get(1), before.get(1));
        assert_eq!(domains.len(0), 1);
        assert!(domains.contains(0, bird));

        assert!(domains.rewind());
        assert_eq!(domains.get(0), before.get(0));
        assert!(!domains.rewind());
    }

    #[test]
    fn test_changes_without_checkpoint_are_permanent() {
        let crossword = crossword();
        let mut domains = Domains::new(&crossword);

        domains.retain(0, |word_id| word_id == 0);
        assert!(!domains.rewind());
        assert_eq!(domains.len(0), 1);
    }
}
