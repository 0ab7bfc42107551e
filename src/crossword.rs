//! The puzzle model: which variables (slots) exist in the grid, where they sit, and which pairs of
//! them share a cell. Everything here is immutable once built; the solver only ever reads it.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::types::{GridCoord, VariableId};
use crate::word_list::WordList;
use crate::{MAX_GRID_SIZE, MAX_SLOT_LENGTH};

/// Direction that a variable is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A slot in the grid: the row and column of its first cell, its direction, and its length.
///
/// The derived ordering (row, then column, then direction, then length) is the position order the
/// solver falls back on when its heuristics can't tell two variables apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub i: usize,
    pub j: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    #[must_use]
    pub fn new(i: usize, j: usize, direction: Direction, length: usize) -> Variable {
        Variable {
            i,
            j,
            direction,
            length,
        }
    }

    /// The coords of the cell at the given offset into this variable.
    #[must_use]
    pub fn cell(&self, offset: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.i, self.j + offset),
            Direction::Down => (self.i + offset, self.j),
        }
    }

    /// The coords of this variable's last cell, or `None` if it has no cells or they don't fit in
    /// a `usize` grid.
    #[must_use]
    pub fn last_cell(&self) -> Option<GridCoord> {
        let offset = self.length.checked_sub(1)?;
        match self.direction {
            Direction::Across => Some((self.i, self.j.checked_add(offset)?)),
            Direction::Down => Some((self.i.checked_add(offset)?, self.j)),
        }
    }

    /// Generate the coords for each cell of this variable.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |offset| self.cell(offset))
    }
}

/// A struct representing a crossing between one variable and another, referencing the other
/// variable's id and the location of the intersection within the other variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_variable_id: VariableId,
    pub other_cell: usize,
}

/// A struct representing the aspects of a variable that are static during solving.
#[derive(Debug)]
pub struct VariableConfig {
    pub id: VariableId,
    pub variable: Variable,

    /// One entry per cell, holding the crossing variable for that cell if there is one.
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,

    /// The ids of every variable that crosses this one, in cell order.
    pub neighbors: SmallVec<[VariableId; MAX_SLOT_LENGTH]>,
}

/// A struct representing the aspects of a puzzle that are static during solving.
pub struct Crossword {
    pub height: usize,
    pub width: usize,

    /// `structure[i][j]` is true for open cells.
    structure: Vec<Vec<bool>>,

    pub variable_configs: Vec<VariableConfig>,
    pub word_list: WordList,
}

impl Debug for Crossword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crossword")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("variable_configs", &self.variable_configs)
            .field("word_list", &self.word_list)
            .finish()
    }
}

impl Crossword {
    /// Build a crossword from an explicit list of variables. The grid is sized to fit them and
    /// every covered cell is considered open.
    pub fn from_variables(
        variables: Vec<Variable>,
        word_list: WordList,
    ) -> Result<Crossword, Error> {
        let (mut height, mut width): (usize, usize) = (0, 0);

        for variable in &variables {
            if variable.length == 0 {
                return Err(Error::ZeroLengthVariable {
                    i: variable.i,
                    j: variable.j,
                });
            }

            match variable.last_cell() {
                Some((last_i, last_j)) if last_i < MAX_GRID_SIZE && last_j < MAX_GRID_SIZE => {
                    height = height.max(last_i + 1);
                    width = width.max(last_j + 1);
                }
                _ => {
                    return Err(Error::VariableOutOfBounds {
                        i: variable.i,
                        j: variable.j,
                    });
                }
            }
        }

        let mut structure = vec![vec![false; width]; height];
        for variable in &variables {
            for (i, j) in variable.cells() {
                structure[i][j] = true;
            }
        }

        Crossword::build(structure, variables, word_list)
    }

    /// Generate a crossword from a string template, with `_` or `.` representing open cells and
    /// anything else representing blocks. Rows shorter than the longest one are padded with
    /// blocks.
    pub fn from_template_string(template: &str, word_list: WordList) -> Result<Crossword, Error> {
        let rows: Vec<Vec<char>> = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();

        if rows.is_empty() {
            return Err(Error::EmptyStructure);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let structure: Vec<Vec<bool>> = rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|j| row.get(j).map_or(false, |&c| c == '_' || c == '.'))
                    .collect()
            })
            .collect();

        let variables = find_variables(&structure);

        Crossword::build(structure, variables, word_list)
    }

    /// Load a structure template from disk; see `from_template_string`.
    pub fn from_structure_file(path: &Path, word_list: WordList) -> Result<Crossword, Error> {
        let template = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Crossword::from_template_string(&template, word_list)
    }

    fn build(
        structure: Vec<Vec<bool>>,
        mut variables: Vec<Variable>,
        word_list: WordList,
    ) -> Result<Crossword, Error> {
        variables.sort();
        if let Some(pair) = variables.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(Error::DuplicateVariable(pair[0]));
        }

        // Build a map from cell location to variables involved, which we can then use to
        // calculate crossings.
        let mut cell_by_loc: HashMap<GridCoord, SmallVec<[(VariableId, usize); 2]>> =
            HashMap::new();

        for (variable_id, variable) in variables.iter().enumerate() {
            for (cell_idx, loc) in variable.cells().enumerate() {
                let entries = cell_by_loc.entry(loc).or_default();

                // A cell can only be shared by one across and one down variable.
                if entries.len() >= 2
                    || entries
                        .iter()
                        .any(|&(other_id, _)| variables[other_id].direction == variable.direction)
                {
                    return Err(Error::ConflictingVariables { i: loc.0, j: loc.1 });
                }

                entries.push((variable_id, cell_idx));
            }
        }

        let variable_configs = variables
            .iter()
            .enumerate()
            .map(|(variable_id, &variable)| {
                let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = variable
                    .cells()
                    .map(|loc| {
                        cell_by_loc[&loc]
                            .iter()
                            .find(|&&(other_id, _)| other_id != variable_id)
                            .map(|&(other_variable_id, other_cell)| Crossing {
                                other_variable_id,
                                other_cell,
                            })
                    })
                    .collect();

                let neighbors = crossings
                    .iter()
                    .flatten()
                    .map(|crossing| crossing.other_variable_id)
                    .collect();

                VariableConfig {
                    id: variable_id,
                    variable,
                    crossings,
                    neighbors,
                }
            })
            .collect();

        Ok(Crossword {
            height: structure.len(),
            width: structure.first().map_or(0, Vec::len),
            structure,
            variable_configs,
            word_list,
        })
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.variable_configs.len()
    }

    /// All variables, in id order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variable_configs.iter().map(|config| &config.variable)
    }

    #[must_use]
    pub fn variable(&self, variable_id: VariableId) -> &Variable {
        &self.variable_configs[variable_id].variable
    }

    /// Look up a variable's id. Variables are stored sorted, so this is a binary search.
    #[must_use]
    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variable_configs
            .binary_search_by(|config| config.variable.cmp(variable))
            .ok()
    }

    /// The ids of every variable that shares a cell with this one.
    #[must_use]
    pub fn neighbors(&self, variable_id: VariableId) -> &[VariableId] {
        &self.variable_configs[variable_id].neighbors
    }

    /// The number of variables this one overlaps with.
    #[must_use]
    pub fn degree(&self, variable_id: VariableId) -> usize {
        self.variable_configs[variable_id].neighbors.len()
    }

    /// If `x` and `y` share a cell, return the offset of that cell within `x` and within `y`.
    /// Unrelated pairs, out-of-range ids and a variable paired with itself all yield `None`.
    #[must_use]
    pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<(usize, usize)> {
        if x == y {
            return None;
        }

        self.variable_configs
            .get(x)?
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_variable_id == y => {
                    Some((cell_idx, crossing.other_cell))
                }
                _ => None,
            })
    }

    /// Is the cell at the given coords open (i.e., not a block)? Out-of-bounds cells are not.
    #[must_use]
    pub fn is_open(&self, i: usize, j: usize) -> bool {
        self.structure
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(false)
    }
}

/// Find every maximal run of two or more open cells, across then down.
fn find_variables(structure: &[Vec<bool>]) -> Vec<Variable> {
    let height = structure.len();
    let width = structure.first().map_or(0, Vec::len);
    let mut variables = vec![];

    let mut close_run = |start: Option<GridCoord>, length: usize, direction: Direction| {
        if let Some((i, j)) = start {
            if length > 1 {
                variables.push(Variable::new(i, j, direction, length));
            }
        }
    };

    for i in 0..height {
        let mut start: Option<GridCoord> = None;
        let mut length = 0;
        for j in 0..width {
            if structure[i][j] {
                start.get_or_insert((i, j));
                length += 1;
            } else {
                close_run(start.take(), length, Direction::Across);
                length = 0;
            }
        }
        close_run(start, length, Direction::Across);
    }

    for j in 0..width {
        let mut start: Option<GridCoord> = None;
        let mut length = 0;
        for i in 0..height {
            if structure[i][j] {
                start.get_or_insert((i, j));
                length += 1;
            } else {
                close_run(start.take(), length, Direction::Down);
                length = 0;
            }
        }
        close_run(start, length, Direction::Down);
    }

    variables
}

#[cfg(test)]
mod tests {
    use crate::crossword::{Crossword, Direction, Variable};
    use crate::error::Error;
    use crate::word_list::WordList;
    use crate::MAX_GRID_SIZE;

    fn word_list() -> WordList {
        WordList::new(["cat", "dog"])
    }

    /// ___
    /// #_#
    /// #_#
    #[test]
    fn test_template_produces_variables_and_overlaps() {
        let crossword = Crossword::from_template_string(
            "
            ___
            #_#
            #_#
            ",
            word_list(),
        )
        .unwrap();

        assert_eq!((crossword.height, crossword.width), (3, 3));

        let across = Variable::new(0, 0, Direction::Across, 3);
        let down = Variable::new(0, 1, Direction::Down, 3);
        assert_eq!(crossword.variables().copied().collect::<Vec<_>>(), vec![across, down]);

        let across_id = crossword.variable_id(&across).unwrap();
        let down_id = crossword.variable_id(&down).unwrap();
        assert_eq!(crossword.overlap(across_id, down_id), Some((1, 0)));
        assert_eq!(crossword.overlap(down_id, across_id), Some((0, 1)));
        assert_eq!(crossword.overlap(across_id, across_id), None);
        assert_eq!(crossword.neighbors(across_id), &[down_id]);
        assert_eq!(crossword.degree(down_id), 1);

        assert!(crossword.is_open(2, 1));
        assert!(!crossword.is_open(2, 0));
        assert!(!crossword.is_open(7, 7));
    }

    #[test]
    fn test_single_cells_and_ragged_rows() {
        let crossword = Crossword::from_template_string(
            "
            _#__
            _
            ",
            word_list(),
        )
        .unwrap();

        assert_eq!(crossword.width, 4);
        assert_eq!(
            crossword.variables().copied().collect::<Vec<_>>(),
            vec![
                Variable::new(0, 0, Direction::Down, 2),
                Variable::new(0, 2, Direction::Across, 2),
            ]
        );
        assert_eq!(crossword.overlap(0, 1), None);
        assert!(crossword.neighbors(0).is_empty());
    }

    #[test]
    fn test_from_variables_sizes_grid() {
        let crossword = Crossword::from_variables(
            vec![
                Variable::new(1, 0, Direction::Across, 4),
                Variable::new(0, 2, Direction::Down, 3),
            ],
            word_list(),
        )
        .unwrap();

        assert_eq!((crossword.height, crossword.width), (3, 4));
        // Sorted by position, so the down variable comes first.
        assert_eq!(crossword.variable(0).direction, Direction::Down);
        assert_eq!(crossword.overlap(0, 1), Some((1, 2)));
        assert!(!crossword.is_open(0, 0));
    }

    #[test]
    fn test_from_variables_rejects_bad_geometry() {
        let result = Crossword::from_variables(
            vec![
                Variable::new(0, 0, Direction::Across, 3),
                Variable::new(0, 2, Direction::Across, 3),
            ],
            word_list(),
        );
        assert!(matches!(result, Err(Error::ConflictingVariables { i: 0, j: 2 })));

        let result = Crossword::from_variables(
            vec![
                Variable::new(0, 0, Direction::Across, 3),
                Variable::new(0, 0, Direction::Across, 3),
            ],
            word_list(),
        );
        assert!(matches!(result, Err(Error::DuplicateVariable(_))));

        let result = Crossword::from_variables(
            vec![Variable::new(0, 0, Direction::Down, 0)],
            word_list(),
        );
        assert!(matches!(result, Err(Error::ZeroLengthVariable { i: 0, j: 0 })));
    }

    #[test]
    fn test_from_variables_rejects_oversized_geometry() {
        let result = Crossword::from_variables(
            vec![Variable::new(usize::MAX, 0, Direction::Down, 2)],
            word_list(),
        );
        assert!(matches!(
            result,
            Err(Error::VariableOutOfBounds { i: usize::MAX, j: 0 })
        ));

        let result = Crossword::from_variables(
            vec![Variable::new(0, 1, Direction::Across, usize::MAX)],
            word_list(),
        );
        assert!(matches!(result, Err(Error::VariableOutOfBounds { i: 0, j: 1 })));

        let result = Crossword::from_variables(
            vec![Variable::new(3, 0, Direction::Across, MAX_GRID_SIZE + 1)],
            word_list(),
        );
        assert!(matches!(result, Err(Error::VariableOutOfBounds { i: 3, j: 0 })));

        let edge = Variable::new(0, MAX_GRID_SIZE - 2, Direction::Across, 2);
        assert_eq!(edge.last_cell(), Some((0, MAX_GRID_SIZE - 1)));
        let crossword = Crossword::from_variables(vec![edge], word_list()).unwrap();
        assert_eq!((crossword.height, crossword.width), (1, MAX_GRID_SIZE));
    }

    #[test]
    fn test_empty_template_is_an_error() {
        let result = Crossword::from_template_string("\n   \n", word_list());
        assert!(matches!(result, Err(Error::EmptyStructure)));
    }
}
