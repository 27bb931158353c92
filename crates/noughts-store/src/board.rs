//! The 3×3 board and its terminal-state check.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of cells on the board.
pub const CELLS: usize = 9;

/// The eight winning lines: three rows, three columns, two diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A symbol placed on the board. The player in the first seat plays `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// Why a mark could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("position {0} is outside the board")]
    OutOfRange(usize),

    #[error("position {0} is already taken")]
    Occupied(usize),
}

/// Nine cells in row-major order. A filled cell is never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([Option<Mark>; CELLS]);

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Option<Mark>; CELLS]) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Option<Mark>; CELLS] {
        &self.0
    }

    /// The mark at `pos`, or `None` for an empty or out-of-range cell.
    pub fn get(&self, pos: usize) -> Option<Mark> {
        self.0.get(pos).copied().flatten()
    }

    pub fn is_vacant(&self, pos: usize) -> bool {
        matches!(self.0.get(pos), Some(None))
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Writes `mark` into an empty cell.
    ///
    /// # Errors
    /// [`BoardError::OutOfRange`] for `pos >= 9`, [`BoardError::Occupied`]
    /// if the cell already holds a mark. The board is unchanged on error.
    pub fn place(&mut self, pos: usize, mark: Mark) -> Result<(), BoardError> {
        let cell = self.0.get_mut(pos).ok_or(BoardError::OutOfRange(pos))?;
        if cell.is_some() {
            return Err(BoardError::Occupied(pos));
        }
        *cell = Some(mark);
        Ok(())
    }
}

/// Parses nine cells from `X`, `O`, and `.` (or `-`/space for empty).
///
/// ```rust
/// use noughts_store::{evaluate, Board, Mark, Outcome};
///
/// let board: Board = "XXXOO....".parse().unwrap();
/// assert_eq!(evaluate(&board), Outcome::Win(Mark::X));
/// ```
impl FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != CELLS {
            return Err(format!("expected {CELLS} cells, got {}", chars.len()));
        }
        let mut cells = [None; CELLS];
        for (cell, c) in cells.iter_mut().zip(chars) {
            *cell = match c {
                'X' | 'x' => Some(Mark::X),
                'O' | 'o' => Some(Mark::O),
                '.' | '-' | ' ' => None,
                other => return Err(format!("unexpected cell {other:?}")),
            };
        }
        Ok(Self(cells))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.0.iter().enumerate() {
            if i > 0 && i % 3 == 0 {
                f.write_str("/")?;
            }
            match cell {
                Some(mark) => write!(f, "{mark}")?,
                None => f.write_str(".")?,
            }
        }
        Ok(())
    }
}

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Win(Mark),
    Draw,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }
}

/// Checks the eight lines for three equal marks, then for a full board.
///
/// Total over every configuration, including ones no legal game can reach
/// (where both marks hold a line, the first line in row, column, diagonal
/// order decides).
pub fn evaluate(board: &Board) -> Outcome {
    for [a, b, c] in LINES {
        if let Some(mark) = board.0[a] {
            if board.0[b] == Some(mark) && board.0[c] == Some(mark) {
                return Outcome::Win(mark);
            }
        }
    }
    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::Ongoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_evaluate_empty_board_ongoing() {
        assert_eq!(evaluate(&Board::new()), Outcome::Ongoing);
    }

    #[test]
    fn test_evaluate_each_line_wins() {
        for line in LINES {
            let mut cells = [None; CELLS];
            for pos in line {
                cells[pos] = Some(Mark::O);
            }
            assert_eq!(
                evaluate(&Board::from_cells(cells)),
                Outcome::Win(Mark::O),
                "line {line:?}"
            );
        }
    }

    #[test]
    fn test_evaluate_winning_move_scenario() {
        let mut b = board("XX.OO....");
        assert_eq!(evaluate(&b), Outcome::Ongoing);
        b.place(2, Mark::X).unwrap();
        assert_eq!(b, board("XXXOO...."));
        assert_eq!(evaluate(&b), Outcome::Win(Mark::X));
    }

    #[test]
    fn test_evaluate_full_board_without_line_draws() {
        assert_eq!(evaluate(&board("XOXXOOOXX")), Outcome::Draw);
    }

    #[test]
    fn test_evaluate_win_on_last_cell_is_not_draw() {
        assert_eq!(evaluate(&board("XOXOXOOXX")), Outcome::Win(Mark::X));
    }

    #[test]
    fn test_outcome_is_terminal() {
        assert!(!evaluate(&board("XX.OO....")).is_terminal());
        assert!(evaluate(&board("XXXOO....")).is_terminal());
        assert!(evaluate(&board("XOXXOOOXX")).is_terminal());
    }

    /// Every one of the 3^9 configurations, checked against a direct
    /// restatement of the rules.
    #[test]
    fn test_evaluate_total_over_all_configurations() {
        for code in 0..3u32.pow(CELLS as u32) {
            let mut cells = [None; CELLS];
            let mut n = code;
            for cell in cells.iter_mut() {
                *cell = match n % 3 {
                    0 => None,
                    1 => Some(Mark::X),
                    _ => Some(Mark::O),
                };
                n /= 3;
            }
            let b = Board::from_cells(cells);

            let has_line = |m: Mark| {
                LINES
                    .iter()
                    .any(|l| l.iter().all(|&p| cells[p] == Some(m)))
            };
            let full = cells.iter().all(Option::is_some);

            match evaluate(&b) {
                Outcome::Win(m) => assert!(has_line(m), "{b}"),
                Outcome::Draw => {
                    assert!(full && !has_line(Mark::X) && !has_line(Mark::O), "{b}")
                }
                Outcome::Ongoing => {
                    assert!(!full && !has_line(Mark::X) && !has_line(Mark::O), "{b}")
                }
            }
        }
    }

    #[test]
    fn test_place_occupied_leaves_board_unchanged() {
        let mut b = board("X........");
        assert_eq!(b.place(0, Mark::O), Err(BoardError::Occupied(0)));
        assert_eq!(b, board("X........"));
    }

    #[test]
    fn test_place_out_of_range_rejected() {
        let mut b = Board::new();
        assert_eq!(b.place(9, Mark::X), Err(BoardError::OutOfRange(9)));
        assert!(!b.is_vacant(9));
        assert_eq!(b.get(42), None);
    }

    #[test]
    fn test_board_display_rows() {
        assert_eq!(board("XO.......").to_string(), "XO./.../...");
    }

    #[test]
    fn test_board_parse_wrong_length_fails() {
        assert!("XO".parse::<Board>().is_err());
    }
}
