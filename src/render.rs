use crate::backtracking_search::{Assignment, Choice};
use crate::crossword::Crossword;

/// The character used for blocked cells in rendered output.
pub const BLOCK: char = '█';

/// Lay out the assigned words on the grid. Cells that no assigned word covers are `None`.
#[must_use]
pub fn letter_grid(crossword: &Crossword, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; crossword.width]; crossword.height];

    for Choice {
        variable_id,
        word_id,
    } in assignment.choices()
    {
        let variable = crossword.variable(variable_id);
        let word = &crossword.word_list.word(word_id).string;

        for ((i, j), letter) in variable.cells().zip(word.chars()) {
            letters[i][j] = Some(letter);
        }
    }

    letters
}

/// Turn the given crossword and assignment into a rendered string, one line per row, with blocks
/// for blocked cells and spaces for open cells that haven't been filled.
#[must_use]
pub fn render_grid(crossword: &Crossword, assignment: &Assignment) -> String {
    letter_grid(crossword, assignment)
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, letter)| {
                    if crossword.is_open(i, j) {
                        letter.unwrap_or(' ')
                    } else {
                        BLOCK
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
