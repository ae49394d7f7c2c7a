//! Match finder: maximal same-icon runs of three or more along rows and columns.

use crate::board::{Board, COLS, Icon, Pos, ROWS};
use std::collections::{BTreeSet, HashSet};

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

/// Contiguous run of same-icon tiles along one row or column, in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub icon: Icon,
    pub axis: Axis,
    pub tiles: Vec<Pos>,
}

impl MatchGroup {
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }
}

/// All maximal runs of at least [`MIN_RUN`] identical icons.
///
/// Rows are scanned left to right, then columns top to bottom. Empty cells
/// break a run. Groups covering exactly the same cells are reported once;
/// overlapping row and column groups are both kept.
pub fn find_matches(board: &Board) -> Vec<MatchGroup> {
    let mut groups = Vec::new();
    for row in 0..ROWS {
        scan_line(board, (0..COLS).map(|col| Pos::new(row, col)), Axis::Row, &mut groups);
    }
    for col in 0..COLS {
        scan_line(board, (0..ROWS).map(|row| Pos::new(row, col)), Axis::Column, &mut groups);
    }

    let mut seen = HashSet::new();
    groups.retain(|group| {
        let mut key = group.tiles.clone();
        key.sort_unstable();
        seen.insert(key)
    });
    groups
}

/// Distinct cells covered by any group; a cell shared by two groups appears once.
pub fn matched_positions(groups: &[MatchGroup]) -> BTreeSet<Pos> {
    groups.iter().flat_map(|g| g.tiles.iter().copied()).collect()
}

fn scan_line(
    board: &Board,
    line: impl Iterator<Item = Pos>,
    axis: Axis,
    out: &mut Vec<MatchGroup>,
) {
    let mut run: Vec<Pos> = Vec::with_capacity(ROWS.max(COLS));
    let mut run_icon: Option<Icon> = None;
    for pos in line {
        let icon = board.icon_at(pos);
        if icon.is_some() && icon == run_icon {
            run.push(pos);
            continue;
        }
        flush_run(&run, run_icon, axis, out);
        run.clear();
        run.push(pos);
        run_icon = icon;
    }
    flush_run(&run, run_icon, axis, out);
}

fn flush_run(run: &[Pos], icon: Option<Icon>, axis: Axis, out: &mut Vec<MatchGroup>) {
    if let Some(icon) = icon {
        if run.len() >= MIN_RUN {
            out.push(MatchGroup {
                icon,
                axis,
                tiles: run.to_vec(),
            });
        }
    }
}
