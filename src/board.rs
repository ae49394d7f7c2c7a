//! Grid state: icons, tiles held in a generational arena, the 6x6 board, collapse and refill.

/// Board height in tiles.
pub const ROWS: usize = 6;
/// Board width in tiles.
pub const COLS: usize = 6;

/// Grid coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance of exactly one.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// Neighbour in the given direction, if it is still on the board.
    pub fn step(self, drow: isize, dcol: isize) -> Option<Self> {
        let row = self.row.checked_add_signed(drow)?;
        let col = self.col.checked_add_signed(dcol)?;
        (row < ROWS && col < COLS).then_some(Self { row, col })
    }

    /// Every board coordinate, row-major.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Self { row, col }))
    }
}

/// Tile symbols, in unlock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Apple,
    Grape,
    Orange,
    Cherry,
    Lemon,
    Melon,
    Gem,
    Star,
}

impl Icon {
    pub const ALL: [Self; 8] = [
        Self::Apple,
        Self::Grape,
        Self::Orange,
        Self::Cherry,
        Self::Lemon,
        Self::Melon,
        Self::Gem,
        Self::Star,
    ];

    /// Emoji shown on the tile (two terminal cells wide).
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Apple => "🍎",
            Self::Grape => "🍇",
            Self::Orange => "🍊",
            Self::Cherry => "🍒",
            Self::Lemon => "🍋",
            Self::Melon => "🍉",
            Self::Gem => "💎",
            Self::Star => "⭐",
        }
    }

    /// Single-letter fallback for terminals without emoji.
    pub fn letter(self) -> char {
        match self {
            Self::Apple => 'A',
            Self::Grape => 'G',
            Self::Orange => 'O',
            Self::Cherry => 'C',
            Self::Lemon => 'L',
            Self::Melon => 'M',
            Self::Gem => 'D',
            Self::Star => 'S',
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[cfg(test)]
    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.letter() == c)
    }
}

/// A tile on the board. `pos` always mirrors the cell that holds its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub pos: Pos,
    pub icon: Icon,
    /// Cosmetic glow; no gameplay effect.
    pub special: bool,
}

/// Handle into the tile arena. A handle goes stale once its tile is removed,
/// even if the slot is reused by a later tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    tile: Option<Tile>,
}

#[derive(Debug, Clone, Default)]
struct TileArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl TileArena {
    fn insert(&mut self, tile: Tile) -> TileId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.tile = Some(tile);
            return TileId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            tile: Some(tile),
        });
        TileId {
            index,
            generation: 0,
        }
    }

    fn remove(&mut self, id: TileId) -> Option<Tile> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let tile = slot.tile.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(tile)
    }

    fn get(&self, id: TileId) -> Option<&Tile> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.tile.as_ref())
    }

    fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.tile.as_mut())
    }
}

/// A tile that changed cell (swap or gravity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileMove {
    pub id: TileId,
    pub from: Pos,
    pub to: Pos,
}

/// A freshly created tile. `above` is how many rows above its cell it enters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    pub id: TileId,
    pub pos: Pos,
    pub above: usize,
}

/// Result of one gravity pass: tiles that fell and tiles created to refill the top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collapse {
    pub falls: Vec<TileMove>,
    pub spawns: Vec<Spawned>,
}

/// The 6x6 grid of tile handles. Cells are only empty between a removal and the next collapse.
#[derive(Debug, Clone, Default)]
pub struct Board {
    cells: [[Option<TileId>; COLS]; ROWS],
    tiles: TileArena,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn id_at(&self, pos: Pos) -> Option<TileId> {
        self.cells.get(pos.row)?.get(pos.col).copied().flatten()
    }

    #[cfg(test)]
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn tile_at(&self, pos: Pos) -> Option<&Tile> {
        self.id_at(pos).and_then(|id| self.tiles.get(id))
    }

    #[inline]
    pub fn icon_at(&self, pos: Pos) -> Option<Icon> {
        self.tile_at(pos).map(|t| t.icon)
    }

    /// Occupied cells with their tiles, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &Tile)> + '_ {
        Pos::all().filter_map(move |pos| {
            let id = self.id_at(pos)?;
            self.tiles.get(id).map(|tile| (id, tile))
        })
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.len() == ROWS * COLS
    }

    /// Create a tile in `pos`, destroying whatever was there.
    pub fn spawn(&mut self, pos: Pos, icon: Icon, special: bool, above: usize) -> Spawned {
        self.remove(pos);
        let id = self.tiles.insert(Tile { pos, icon, special });
        self.cells[pos.row][pos.col] = Some(id);
        Spawned { id, pos, above }
    }

    /// Destroy the tile in `pos`, leaving the cell empty.
    pub fn remove(&mut self, pos: Pos) -> Option<(TileId, Tile)> {
        let id = self.cells.get_mut(pos.row)?.get_mut(pos.col)?.take()?;
        self.tiles.remove(id).map(|tile| (id, tile))
    }

    /// Destroy every tile.
    pub fn clear(&mut self) {
        for pos in Pos::all() {
            self.remove(pos);
        }
    }

    /// Replace the whole board with freshly rolled tiles.
    pub fn fill(&mut self, mut roll: impl FnMut(Pos) -> (Icon, bool)) -> Vec<Spawned> {
        self.clear();
        Pos::all()
            .map(|pos| {
                let (icon, special) = roll(pos);
                self.spawn(pos, icon, special, ROWS)
            })
            .collect()
    }

    /// Exchange the tiles in `a` and `b`, cells and coordinates both.
    /// Adjacency is the caller's rule; both cells must be occupied.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Option<(TileMove, TileMove)> {
        let id_a = self.id_at(a)?;
        let id_b = self.id_at(b)?;
        if a == b {
            return None;
        }
        self.cells[a.row][a.col] = Some(id_b);
        self.cells[b.row][b.col] = Some(id_a);
        if let Some(t) = self.tiles.get_mut(id_a) {
            t.pos = b;
        }
        if let Some(t) = self.tiles.get_mut(id_b) {
            t.pos = a;
        }
        Some((
            TileMove {
                id: id_a,
                from: a,
                to: b,
            },
            TileMove {
                id: id_b,
                from: b,
                to: a,
            },
        ))
    }

    /// Compact each column downwards, keeping the survivors' order, then
    /// refill the empty top cells with rolled tiles.
    pub fn collapse(&mut self, mut roll: impl FnMut(Pos) -> (Icon, bool)) -> Collapse {
        let mut out = Collapse::default();
        for col in 0..COLS {
            let mut write = ROWS;
            for row in (0..ROWS).rev() {
                let Some(id) = self.cells[row][col] else {
                    continue;
                };
                write -= 1;
                if write == row {
                    continue;
                }
                let to = Pos::new(write, col);
                self.cells[write][col] = Some(id);
                self.cells[row][col] = None;
                if let Some(t) = self.tiles.get_mut(id) {
                    t.pos = to;
                }
                out.falls.push(TileMove {
                    id,
                    from: Pos::new(row, col),
                    to,
                });
            }
            // `write` is now the number of empty cells at the top of this column.
            for row in (0..write).rev() {
                let pos = Pos::new(row, col);
                let (icon, special) = roll(pos);
                out.spawns.push(self.spawn(pos, icon, special, write));
            }
        }
        out
    }

    /// Every occupied cell's tile agrees with its coordinates and no handle is shared.
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        for pos in Pos::all() {
            if let Some(id) = self.id_at(pos) {
                match self.tiles.get(id) {
                    Some(tile) if tile.pos == pos => {}
                    _ => return false,
                }
                if !seen.insert(id) {
                    return false;
                }
            }
        }
        seen.len() == self.tiles.live
    }

    /// Build a board from letter rows ('.' for an empty cell).
    #[cfg(test)]
    pub fn from_rows(rows: [&str; ROWS]) -> Self {
        let mut board = Self::new();
        for (row, line) in rows.iter().enumerate() {
            for (col, c) in line.chars().enumerate().take(COLS) {
                if let Some(icon) = Icon::from_letter(c) {
                    board.spawn(Pos::new(row, col), icon, false, 0);
                }
            }
        }
        board
    }

    /// Letters, row by row, for comparing boards in tests.
    #[cfg(test)]
    pub fn to_rows(&self) -> Vec<String> {
        (0..ROWS)
            .map(|row| {
                (0..COLS)
                    .map(|col| {
                        self.icon_at(Pos::new(row, col))
                            .map_or('.', Icon::letter)
                    })
                    .collect()
            })
            .collect()
    }
}
