//! Bingo line detection over a flattened square grid of played flags.
//!
//! Cells are addressed in row-major order (`row * grid_size + column`). An absent cell
//! (`None`) counts as not played, so partially built grids can be evaluated without
//! special casing. Completeness is not checked here; see [`crate::state::reconcile`].

/// Return `true` when at least one row, column or diagonal is fully played.
///
/// Works for any positive `grid_size`; a 1x1 grid wins as soon as its single cell is played.
/// Missing trailing cells (a slice shorter than `grid_size²`) are treated as absent.
pub fn has_bingo(cells: &[Option<bool>], grid_size: usize) -> bool {
    if grid_size == 0 {
        return false;
    }

    let played = |row: usize, column: usize| -> bool {
        cells
            .get(row * grid_size + column)
            .copied()
            .flatten()
            .unwrap_or(false)
    };

    if (0..grid_size).any(|row| (0..grid_size).all(|column| played(row, column))) {
        return true;
    }

    if (0..grid_size).any(|column| (0..grid_size).all(|row| played(row, column))) {
        return true;
    }

    let main_diagonal = (0..grid_size).all(|i| played(i, i));
    let anti_diagonal = (0..grid_size).all(|i| played(i, grid_size - 1 - i));

    main_diagonal || anti_diagonal
}
