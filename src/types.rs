/// An identifier for a given letter or whatever, based on its index in the `WordList`'s `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given variable (slot), based on its index in the `Crossword`'s
/// `variable_configs` field. The solver's domains and assignments are indexed the same way.
pub type VariableId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// Zero-indexed (row, column) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// An ordered pair of variables whose overlap constraint should be checked from the point of view
/// of the first one.
pub type Arc = (VariableId, VariableId);
