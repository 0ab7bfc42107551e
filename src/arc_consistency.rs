//! This module contains a crossword-specific implementation of the AC-3 algorithm. For our
//! purposes, a pair of crossing variables is arc-consistent when every word left for the first one
//! puts a letter in the shared cell that at least one word left for the second one also puts there.
//!
//! We keep revising arcs until no more eliminations are possible, or until some variable has no
//! options left, at which point there can't be a solution under the current domains.

use bit_set::BitSet;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

use crate::crossword::Crossword;
use crate::domain::Domains;
use crate::types::{Arc, VariableId};
use crate::CHECK_INVARIANTS;

/// Result from a failed call to `ac3`, naming the variable whose domain was wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub variable_id: VariableId,
}

/// Result from a call to `ac3`.
pub type ArcConsistencyResult = Result<(), ArcConsistencyFailure>;

/// Data structure used in `ac3` to track which arcs we still need to revise. An arc that is
/// already waiting in the queue isn't added a second time, since revising it once later will see
/// the latest domains anyway.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<Arc>,
    queued: HashSet<Arc>,
}

impl ConsistencyQueue {
    fn with_initial_queue<Items>(items: Items) -> ConsistencyQueue
    where
        Items: IntoIterator<Item = Arc>,
    {
        let mut queue = ConsistencyQueue {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Every ordered pair `(x, y)` where `y` crosses `x`.
#[must_use]
pub fn all_arcs(crossword: &Crossword) -> Vec<Arc> {
    crossword
        .variable_configs
        .iter()
        .flat_map(|config| {
            config
                .neighbors
                .iter()
                .map(move |&neighbor_id| (config.id, neighbor_id))
        })
        .collect()
}

/// Remove every word from `x`'s domain that doesn't agree with any word in `y`'s domain on their
/// shared cell. Returns whether anything was removed. If the two variables don't cross, there's
/// no constraint between them and nothing happens.
pub fn revise(crossword: &Crossword, domains: &mut Domains, x: VariableId, y: VariableId) -> bool {
    let Some((x_cell, y_cell)) = crossword.overlap(x, y) else {
        return false;
    };

    let word_list = &crossword.word_list;

    // The glyphs that at least one of `y`'s options places in the shared cell. Checking against
    // this set saves us from comparing every pair of words.
    let supported_glyphs: BitSet = domains
        .iter(y)
        .filter_map(|word_id| word_list.word(word_id).glyph_at(y_cell))
        .collect();

    let removed = domains.retain(x, |word_id| {
        word_list
            .word(word_id)
            .glyph_at(x_cell)
            .map_or(false, |glyph| supported_glyphs.contains(glyph))
    });

    if removed > 0 {
        trace!("Revising {x} against {y} removed {removed} options");
    }

    removed > 0
}

/// Run AC-3 until the queue is empty. If `arcs` is `None`, start from every arc in the grid;
/// otherwise start from just the given arcs (e.g., the arcs pointing at a variable whose domain
/// just changed).
pub fn ac3(
    crossword: &Crossword,
    domains: &mut Domains,
    arcs: Option<Vec<Arc>>,
) -> ArcConsistencyResult {
    let initial_arcs = arcs.unwrap_or_else(|| all_arcs(crossword));
    let mut queue = ConsistencyQueue::with_initial_queue(initial_arcs);

    while let Some((x, y)) = queue.pop_front() {
        if !revise(crossword, domains, x, y) {
            continue;
        }

        if domains.is_empty(x) {
            debug!("Arc consistency failed: {:?} has no options left", crossword.variable(x));
            return Err(ArcConsistencyFailure { variable_id: x });
        }

        // Losing options from `x` may leave words in the variables crossing it unsupported. `y`
        // itself is exempt: the options we just removed had no partner there anyway.
        for &z in crossword.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    if CHECK_INVARIANTS && !is_arc_consistent(crossword, domains) {
        panic!("AC-3 converged on domains that aren't arc-consistent");
    }

    Ok(())
}

/// Check whether every option of every variable has a partner in each crossing variable.
#[must_use]
pub fn is_arc_consistent(crossword: &Crossword, domains: &Domains) -> bool {
    let word_list = &crossword.word_list;

    all_arcs(crossword).into_iter().all(|(x, y)| {
        let Some((x_cell, y_cell)) = crossword.overlap(x, y) else {
            return true;
        };

        domains.iter(x).all(|x_word_id| {
            let glyph = word_list.word(x_word_id).glyph_at(x_cell);
            glyph.is_some()
                && domains
                    .iter(y)
                    .any(|y_word_id| word_list.word(y_word_id).glyph_at(y_cell) == glyph)
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::arc_consistency::{ac3, is_arc_consistent, revise, ArcConsistencyFailure};
    use crate::crossword::Crossword;
    use crate::domain::{enforce_node_consistency, Domains};
    use crate::word_list::WordList;

    fn prepare(template: &str, words: &[&str]) -> (Crossword, Domains) {
        let crossword =
            Crossword::from_template_string(template, WordList::new(words.iter())).unwrap();
        let mut domains = Domains::new(&crossword);
        enforce_node_consistency(&crossword, &mut domains);
        (crossword, domains)
    }

    fn strings(crossword: &Crossword, domains: &Domains, variable_id: usize) -> Vec<String> {
        domains
            .iter(variable_id)
            .map(|word_id| crossword.word_list.word(word_id).string.clone())
            .collect()
    }

    /// ___
    /// #_#
    /// #_#
    const CORNER: &str = "
        ___
        #_#
        #_#
    ";

    #[test]
    fn test_revise_removes_unsupported_options() {
        let (crossword, mut domains) = prepare(CORNER, &["cat", "dog", "ace"]);

        // The across entry's middle letter must start the down entry.
        assert!(revise(&crossword, &mut domains, 0, 1));
        assert_eq!(strings(&crossword, &domains, 0), vec!["ACE", "CAT"]);

        // Nothing more to remove in the same direction.
        assert!(!revise(&crossword, &mut domains, 0, 1));
    }

    #[test]
    fn test_revise_without_overlap_is_a_no_op() {
        let (crossword, mut domains) = prepare(
            "
            ___
            ###
            ___
            ",
            &["cat", "dog"],
        );

        assert_eq!(crossword.overlap(0, 1), None);
        assert!(!revise(&crossword, &mut domains, 0, 1));
        assert!(!revise(&crossword, &mut domains, 0, 0));
        assert_eq!(domains.len(0), 2);
    }

    #[test]
    fn test_ac3_reports_wipeout() {
        let (crossword, mut domains) = prepare(CORNER, &["cat", "dog"]);

        let result = ac3(&crossword, &mut domains, None);

        assert_eq!(result, Err(ArcConsistencyFailure { variable_id: 0 }));
        assert!(domains.is_empty(0));
    }

    /// ___
    /// ##_
    /// ___
    #[test]
    fn test_ac3_is_sound_and_idempotent() {
        let (crossword, mut domains) = prepare(
            "
            ___
            ##_
            ___
            ",
            &["top", "ton", "pad", "nab", "odd", "cab", "zzx"],
        );

        let initial_sizes: Vec<usize> =
            (0..crossword.variable_count()).map(|id| domains.len(id)).collect();

        assert!(ac3(&crossword, &mut domains, None).is_ok());
        assert!(is_arc_consistent(&crossword, &domains));

        for (variable_id, &initial_size) in initial_sizes.iter().enumerate() {
            assert!(domains.len(variable_id) <= initial_size);
        }
        assert!(!strings(&crossword, &domains, 1).contains(&"ZZX".to_string()));

        let once = domains.clone();
        assert!(ac3(&crossword, &mut domains, None).is_ok());
        for variable_id in 0..crossword.variable_count() {
            assert_eq!(domains.get(variable_id), once.get(variable_id));
        }
    }

    /// Restricting the bottom entry has to travel through the down entry to reach the top entry,
    /// even though the queue only starts with the arc between the bottom two.
    #[test]
    fn test_ac3_propagates_beyond_initial_arcs() {
        let (crossword, mut domains) = prepare(
            "
            ___
            ##_
            ___
            ",
            &["top", "ton", "pad", "nab", "odd", "cab"],
        );
        let (top, down, bottom) = (0, 1, 2);
        assert_eq!(crossword.overlap(top, down), Some((2, 0)));
        assert_eq!(crossword.overlap(down, bottom), Some((2, 2)));

        let odd = crossword.word_list.word_id("odd").unwrap();
        domains.restrict_to(bottom, odd);

        assert!(ac3(&crossword, &mut domains, Some(vec![(down, bottom)])).is_ok());

        assert_eq!(strings(&crossword, &domains, down), vec!["ODD", "PAD"]);
        assert_eq!(strings(&crossword, &domains, top), vec!["TOP"]);
    }
}
