//! Fill a crossword grid by treating each slot as a variable in a constraint satisfaction problem:
//! prune each slot's candidate words by length, propagate crossing constraints with AC-3, then run
//! a heuristic backtracking search.
//!
//! ```
//! use crossfill::{solve, Crossword, WordList};
//!
//! let crossword = Crossword::from_template_string(
//!     "
//!     ___
//!     #_#
//!     #_#
//!     ",
//!     WordList::new(["cat", "dog", "ace"]),
//! )
//! .unwrap();
//!
//! let assignment = solve(&crossword).expect("Failed to find a fill");
//! assert!(assignment.is_complete());
//! ```

pub mod arc_consistency;
pub mod backtracking_search;
pub mod crossword;
pub mod domain;
mod error;
pub mod render;
pub mod types;
pub mod word_list;

pub use backtracking_search::{
    find_fill, solve, Assignment, Choice, FillFailure, FillOptions, FillSuccess, Solver,
    Statistics,
};
pub use crossword::{Crossword, Direction, Variable};
pub use domain::Domains;
pub use error::Error;
pub use word_list::WordList;

pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum number of distinct characters appearing in a word list.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The largest width or height a crossword built from explicit variables may have.
pub const MAX_GRID_SIZE: usize = 1024;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
