//! Recursive backtracking search over partial assignments.
//!
//! At each step we pick the unassigned variable with the fewest remaining options (breaking ties
//! by how many other variables it crosses), try its options starting with whichever rules out the
//! fewest options in crossing variables, and recurse. By default each tentative choice is also
//! propagated through AC-3, so that dead ends show up before we get to them. Whatever that
//! propagation prunes is rewound before the next option is tried.

use instant::{Duration, Instant};
use log::{debug, trace};
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::arc_consistency::{self, ArcConsistencyFailure, ArcConsistencyResult};
use crate::crossword::{Crossword, Variable};
use crate::domain::{self, Domains};
use crate::types::{Arc, VariableId, WordId};
use crate::{CHECK_INVARIANTS, MAX_SLOT_LENGTH};

/// A struct recording a variable assignment made during the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub variable_id: VariableId,
    pub word_id: WordId,
}

/// A partial or complete mapping from variables to words, with at most one word per variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for a puzzle with the given number of variables.
    #[must_use]
    pub fn new(variable_count: usize) -> Assignment {
        Assignment {
            words: vec![None; variable_count],
            assigned_count: 0,
        }
    }

    /// Assign a word to a variable, replacing any previous word.
    pub fn assign(&mut self, variable_id: VariableId, word_id: WordId) {
        if self.words[variable_id].replace(word_id).is_none() {
            self.assigned_count += 1;
        }
    }

    /// Remove a variable's word, returning it if there was one.
    pub fn unassign(&mut self, variable_id: VariableId) -> Option<WordId> {
        let word_id = self.words[variable_id].take();
        if word_id.is_some() {
            self.assigned_count -= 1;
        }
        word_id
    }

    #[must_use]
    pub fn get(&self, variable_id: VariableId) -> Option<WordId> {
        self.words.get(variable_id).copied().flatten()
    }

    #[must_use]
    pub fn contains(&self, variable_id: VariableId) -> bool {
        self.get(variable_id).is_some()
    }

    /// How many variables have a word?
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    /// Every assigned variable with its word, in variable order.
    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(variable_id, word_id)| {
                word_id.map(|word_id| Choice {
                    variable_id,
                    word_id,
                })
            })
            .collect()
    }

    /// The string assigned to a variable, if any.
    #[must_use]
    pub fn word<'a>(&self, crossword: &'a Crossword, variable_id: VariableId) -> Option<&'a str> {
        self.get(variable_id)
            .map(|word_id| crossword.word_list.word(word_id).string.as_str())
    }

    /// Convert to a map keyed by the variables themselves, for handing to a renderer.
    #[must_use]
    pub fn to_map(&self, crossword: &Crossword) -> BTreeMap<Variable, String> {
        self.choices()
            .into_iter()
            .map(|Choice { variable_id, word_id }| {
                (
                    *crossword.variable(variable_id),
                    crossword.word_list.word(word_id).string.clone(),
                )
            })
            .collect()
    }
}

/// A struct tracking statistics about the search.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// How many times `backtrack` picked a variable to branch on.
    pub states: u64,

    /// How many candidate words were tried and then abandoned.
    pub backtracks: u64,

    pub duration: Duration,
}

/// Settings for a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOptions {
    /// Run AC-3 after each tentative assignment to prune the remaining variables' domains.
    pub maintain_arc_consistency: bool,

    /// Give up once the search has been running for this long.
    pub timeout: Option<Duration>,
}

impl Default for FillOptions {
    fn default() -> Self {
        FillOptions {
            maintain_arc_consistency: true,
            timeout: None,
        }
    }
}

impl FillOptions {
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> FillOptions {
        FillOptions {
            timeout: Some(timeout),
            ..self
        }
    }

    #[must_use]
    pub fn with_arc_consistency(self, maintain_arc_consistency: bool) -> FillOptions {
        FillOptions {
            maintain_arc_consistency,
            ..self
        }
    }
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FillFailure {
    #[error("no assignment satisfies every constraint")]
    Unsatisfiable,

    #[error("gave up after reaching the time limit")]
    Timeout,
}

/// The state of a single solve: the puzzle, the domain store that the search narrows down, and
/// bookkeeping. Build a fresh one for each solve.
#[derive(Debug)]
pub struct Solver<'a> {
    crossword: &'a Crossword,
    domains: Domains,
    options: FillOptions,
    statistics: Statistics,
    deadline: Option<Instant>,
}

impl<'a> Solver<'a> {
    #[must_use]
    pub fn new(crossword: &'a Crossword) -> Solver<'a> {
        Solver::with_options(crossword, FillOptions::default())
    }

    #[must_use]
    pub fn with_options(crossword: &'a Crossword, options: FillOptions) -> Solver<'a> {
        Solver {
            crossword,
            domains: Domains::new(crossword),
            options,
            statistics: Statistics::default(),
            deadline: None,
        }
    }

    #[must_use]
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) {
        domain::enforce_node_consistency(self.crossword, &mut self.domains);
    }

    pub fn revise(&mut self, x: VariableId, y: VariableId) -> bool {
        arc_consistency::revise(self.crossword, &mut self.domains, x, y)
    }

    pub fn ac3(&mut self, arcs: Option<Vec<Arc>>) -> ArcConsistencyResult {
        arc_consistency::ac3(self.crossword, &mut self.domains, arcs)
    }

    /// Is every variable assigned?
    #[must_use]
    pub fn assignment_complete(&self, assignment: &Assignment) -> bool {
        assignment.len() == self.domains.variable_count()
    }

    /// Check that every assigned word fits its variable and agrees with every assigned crossing
    /// word. Unassigned variables don't matter.
    #[must_use]
    pub fn consistent(&self, assignment: &Assignment) -> bool {
        let word_list = &self.crossword.word_list;

        self.crossword.variable_configs.iter().all(|config| {
            let Some(word_id) = assignment.get(config.id) else {
                return true;
            };
            let word = word_list.word(word_id);

            word.len() == config.variable.length
                && config
                    .crossings
                    .iter()
                    .enumerate()
                    .all(|(cell_idx, crossing)| {
                        let Some(crossing) = crossing else {
                            return true;
                        };
                        match assignment.get(crossing.other_variable_id) {
                            Some(other_word_id) => {
                                word.glyph_at(cell_idx)
                                    == word_list.word(other_word_id).glyph_at(crossing.other_cell)
                            }
                            None => true,
                        }
                    })
        })
    }

    /// Pick the next variable to fill: fewest remaining options first, then most crossings, then
    /// earliest position in the grid. Returns `None` if everything is assigned.
    #[must_use]
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<VariableId> {
        (0..self.domains.variable_count())
            .filter(|&variable_id| !assignment.contains(variable_id))
            .min_by_key(|&variable_id| {
                (
                    self.domains.len(variable_id),
                    Reverse(self.crossword.degree(variable_id)),
                    *self.crossword.variable(variable_id),
                )
            })
    }

    /// Return the variable's remaining options, ordered by how many options each one would rule
    /// out in the unassigned variables crossing it (fewest first). Ties keep word list order.
    #[must_use]
    pub fn order_domain_values(
        &self,
        variable_id: VariableId,
        assignment: &Assignment,
    ) -> Vec<WordId> {
        let word_list = &self.crossword.word_list;

        // For each cell with an unassigned crossing: the cell index, the number of the crossing
        // variable's options with each glyph in the shared cell, and its total option count.
        let crossing_glyph_counts: SmallVec<[(usize, Vec<usize>, usize); MAX_SLOT_LENGTH]> = self
            .crossword
            .variable_configs[variable_id]
            .crossings
            .iter()
            .enumerate()
            .filter_map(|(cell_idx, crossing)| {
                let crossing = crossing.as_ref()?;
                if assignment.contains(crossing.other_variable_id) {
                    return None;
                }

                let mut glyph_counts = vec![0; word_list.glyphs.len()];
                for word_id in self.domains.iter(crossing.other_variable_id) {
                    if let Some(glyph) = word_list.word(word_id).glyph_at(crossing.other_cell) {
                        glyph_counts[glyph] += 1;
                    }
                }

                Some((
                    cell_idx,
                    glyph_counts,
                    self.domains.len(crossing.other_variable_id),
                ))
            })
            .collect();

        let mut values: Vec<WordId> = self.domains.iter(variable_id).collect();

        values.sort_by_cached_key(|&word_id| {
            let word = word_list.word(word_id);

            crossing_glyph_counts
                .iter()
                .map(|(cell_idx, glyph_counts, total)| {
                    total - word.glyph_at(*cell_idx).map_or(0, |glyph| glyph_counts[glyph])
                })
                .sum::<usize>()
        });

        values
    }

    /// Extend a consistent partial assignment into a complete one, if possible. On success the
    /// assignment is left complete; on failure it's left as it was passed in.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> Result<bool, FillFailure> {
        if self.assignment_complete(assignment) {
            return Ok(true);
        }

        if self.deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            return Err(FillFailure::Timeout);
        }

        self.statistics.states += 1;

        let Some(variable_id) = self.select_unassigned_variable(assignment) else {
            return Ok(false);
        };

        trace!(
            "Filling {:?} ({} options, degree {})",
            self.crossword.variable(variable_id),
            self.domains.len(variable_id),
            self.crossword.degree(variable_id),
        );

        for word_id in self.order_domain_values(variable_id, assignment) {
            assignment.assign(variable_id, word_id);

            if self.consistent(assignment) {
                self.domains.checkpoint();

                if self.infer(variable_id, word_id, assignment) && self.backtrack(assignment)? {
                    return Ok(true);
                }

                self.domains.rewind();
            }

            assignment.unassign(variable_id);
            self.statistics.backtracks += 1;
        }

        Ok(false)
    }

    /// Propagate the consequences of assigning `word_id` to `variable_id` into the domains of the
    /// unassigned crossing variables. Returns false if that leaves one of them with no options.
    fn infer(&mut self, variable_id: VariableId, word_id: WordId, assignment: &Assignment) -> bool {
        if !self.options.maintain_arc_consistency {
            return true;
        }

        self.domains.restrict_to(variable_id, word_id);

        let arcs: Vec<Arc> = self
            .crossword
            .neighbors(variable_id)
            .iter()
            .filter(|&&neighbor_id| !assignment.contains(neighbor_id))
            .map(|&neighbor_id| (neighbor_id, variable_id))
            .collect();

        match self.ac3(Some(arcs)) {
            Ok(()) => true,
            Err(ArcConsistencyFailure { variable_id: emptied }) => {
                trace!(
                    "Choosing {} for {:?} leaves {:?} without options",
                    self.crossword.word_list.word(word_id).string,
                    self.crossword.variable(variable_id),
                    self.crossword.variable(emptied),
                );
                false
            }
        }
    }

    /// Run the whole pipeline: node consistency, global arc consistency, then search.
    pub fn find_fill(mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        self.deadline = self.options.timeout.map(|timeout| start + timeout);

        self.enforce_node_consistency();

        let variable_count = self.domains.variable_count();
        if let Some(empty_id) = (0..variable_count).find(|&id| self.domains.is_empty(id)) {
            debug!(
                "No words fit {:?}; giving up before searching",
                self.crossword.variable(empty_id)
            );
            return Err(FillFailure::Unsatisfiable);
        }

        if self.ac3(None).is_err() {
            return Err(FillFailure::Unsatisfiable);
        }

        let mut assignment = Assignment::new(variable_count);
        let found = self.backtrack(&mut assignment);
        self.statistics.duration = start.elapsed();

        match found {
            Ok(true) => {}
            Ok(false) => {
                debug!("Search exhausted: {:?}", self.statistics);
                return Err(FillFailure::Unsatisfiable);
            }
            Err(failure) => {
                debug!("Search stopped ({failure}): {:?}", self.statistics);
                return Err(failure);
            }
        }

        if CHECK_INVARIANTS && !(assignment.is_complete() && self.consistent(&assignment)) {
            panic!("Search returned an invalid assignment");
        }

        debug!("Found a fill: {:?}", self.statistics);

        Ok(FillSuccess {
            statistics: self.statistics,
            assignment,
        })
    }

    /// Like `find_fill`, but with any failure reported as `None`.
    #[must_use]
    pub fn solve(self) -> Option<Assignment> {
        self.find_fill().ok().map(|success| success.assignment)
    }
}

/// Search for a fill for the given crossword.
pub fn find_fill(crossword: &Crossword, options: FillOptions) -> Result<FillSuccess, FillFailure> {
    Solver::with_options(crossword, options).find_fill()
}

/// Search for a fill with the default options, returning `None` if there isn't one.
#[must_use]
pub fn solve(crossword: &Crossword) -> Option<Assignment> {
    Solver::new(crossword).solve()
}
