use crate::logic::board::{Board, Color, Piece, PieceKind};
use crate::logic::geometry::{Coord, DIRECTIONS, LINE_DIRECTIONS};
use crate::logic::player::{Pool, PIECES_PER_KIND};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every way an operation on a game can be refused.
///
/// Each variant maps to a stable reason code through [`RuleError::code`] so that
/// transport layers can forward it to clients verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleError {
    #[error("player is not seated in this game")]
    PlayerNotFound,
    #[error("game is not accepting placements")]
    GameNotPlaying,
    #[error("it is not this player's turn")]
    NotYourTurn,
    #[error("position is off the board")]
    InvalidPosition,
    #[error("cell is already occupied")]
    CellOccupied,
    #[error("no piece of that kind left in the pool")]
    NoPiecesAvailable,
    #[error("no graduation choice is pending")]
    NotSelectingGraduation,
    #[error("the pending graduation belongs to the other player")]
    NotYourGraduation,
    #[error("graduation option index out of range")]
    InvalidOption,
    #[error("both seats are taken")]
    GameFull,
    #[error("identity already holds a seat")]
    AlreadyJoined,
    #[error("reconnection token not recognised")]
    InvalidToken,
}

impl RuleError {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::GameNotPlaying => "GAME_NOT_PLAYING",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::InvalidPosition => "INVALID_POSITION",
            Self::CellOccupied => "CELL_OCCUPIED",
            Self::NoPiecesAvailable => "NO_PIECES_AVAILABLE",
            Self::NotSelectingGraduation => "NOT_SELECTING_GRADUATION",
            Self::NotYourGraduation => "NOT_YOUR_GRADUATION",
            Self::InvalidOption => "INVALID_OPTION",
            Self::GameFull => "GAME_FULL",
            Self::AlreadyJoined => "ALREADY_JOINED",
            Self::InvalidToken => "INVALID_TOKEN",
        }
    }
}

/// A piece displaced by a placement. `to == None` means it fell off the board
/// and went back to its owner's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoopEffect {
    pub from: Coord,
    pub to: Option<Coord>,
    pub piece: Piece,
}

/// A removed-from-board piece during graduation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationEffect {
    pub cell: Coord,
    pub piece: Piece,
}

/// Three cells in a straight line, in line order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationOption {
    pub cells: [Coord; 3],
}

impl GraduationOption {
    /// Order-independent identity of the option.
    #[must_use]
    pub fn key(&self) -> [usize; 3] {
        let mut key = self.cells.map(Coord::index);
        key.sort_unstable();
        key
    }

    #[must_use]
    pub fn contains(&self, cell: Coord) -> bool {
        self.cells.contains(&cell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    ThreeCatsInRow,
    EightCatsOnBoard,
    OpponentLeft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraduationStep {
    None,
    Applied {
        effects: Vec<GraduationEffect>,
        forced: bool,
    },
    /// Two or more options: the acting player has to choose.
    Pending(Vec<GraduationOption>),
}

impl GraduationStep {
    #[must_use]
    pub fn effects(&self) -> &[GraduationEffect] {
        match self {
            Self::Applied { effects, .. } => effects,
            Self::None | Self::Pending(_) => &[],
        }
    }

    #[must_use]
    pub fn cats_earned(&self) -> u8 {
        cats_earned(self.effects())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub boops: Vec<BoopEffect>,
    pub graduation: GraduationStep,
}

pub fn pool_mut(pools: &mut [Pool; 2], color: Color) -> &mut Pool {
    match color {
        Color::Orange => &mut pools[0],
        Color::Gray => &mut pools[1],
    }
}

#[must_use]
pub fn pool_of(pools: &[Pool; 2], color: Color) -> &Pool {
    match color {
        Color::Orange => &pools[0],
        Color::Gray => &pools[1],
    }
}

/// Turns raw caller coordinates into a board cell.
pub fn target_cell(row: i32, col: i32) -> Result<Coord, RuleError> {
    Coord::from_signed(row, col).ok_or(RuleError::InvalidPosition)
}

/// Pushes every neighbour of the freshly placed piece one cell further away.
///
/// Directions are independent: landing cells are two steps out and distinct
/// per direction, so one sequential pass equals evaluating all eight against
/// the post-placement board. Booped pieces never trigger further boops.
pub fn resolve_boops(board: &mut Board, placed_at: Coord, placed: Piece) -> Vec<BoopEffect> {
    let mut effects = Vec::new();
    for dir in DIRECTIONS {
        let Some(neighbor_at) = placed_at.offset(dir, 1) else {
            continue;
        };
        let Some(neighbor) = board.get(neighbor_at) else {
            continue;
        };
        // Kittens cannot move cats.
        if placed.kind == PieceKind::Kitten && neighbor.kind == PieceKind::Cat {
            continue;
        }
        let landing = placed_at.offset(dir, 2);
        if let Some(landing_at) = landing {
            if !board.is_empty(landing_at) {
                continue;
            }
        }
        board.take(neighbor_at);
        if let Some(landing_at) = landing {
            board.place(landing_at, neighbor);
        }
        effects.push(BoopEffect {
            from: neighbor_at,
            to: landing,
            piece: neighbor,
        });
    }
    effects
}

/// Every distinct three-cell window of `color` containing a kitten.
///
/// Runs are found from their first cell along each of the four axes; a run of
/// length `n >= 3` contributes its `n - 2` contiguous windows. Windows are
/// deduplicated by cell set. Order is row-major by run start, then axis, then
/// position along the run, and is the order options are offered in.
#[must_use]
pub fn graduation_options(board: &Board, color: Color) -> Vec<GraduationOption> {
    let owned = |c: Coord| board.get(c).is_some_and(|p| p.color == color);
    let mut options: Vec<GraduationOption> = Vec::new();

    for start in Coord::all() {
        if !owned(start) {
            continue;
        }
        for dir in LINE_DIRECTIONS {
            if start.offset(dir, -1).is_some_and(owned) {
                continue;
            }
            let mut run = vec![start];
            let mut step = 1;
            while let Some(next) = start.offset(dir, step).filter(|&c| owned(c)) {
                run.push(next);
                step += 1;
            }
            for window in run.windows(3) {
                let &[a, b, c] = window else {
                    continue;
                };
                let option = GraduationOption { cells: [a, b, c] };
                let has_kitten = option
                    .cells
                    .iter()
                    .any(|&cell| board.get(cell).is_some_and(|p| p.kind == PieceKind::Kitten));
                if !has_kitten {
                    continue;
                }
                let key = option.key();
                if options.iter().any(|o| o.key() == key) {
                    continue;
                }
                options.push(option);
            }
        }
    }
    options
}

/// With every piece deployed and no line formed, the first kitten in row-major
/// order graduates on its own so that the player is never stuck.
#[must_use]
pub fn forced_graduation_cell(board: &Board, color: Color, pool: &Pool) -> Option<Coord> {
    if board.count_color(color) < PIECES_PER_KIND || pool.total_cats() >= PIECES_PER_KIND {
        return None;
    }
    board
        .pieces()
        .find(|(_, p)| p.color == color && p.kind == PieceKind::Kitten)
        .map(|(cell, _)| cell)
}

/// Lifts the given cells off the board: kittens retire into pool cats, cats
/// simply return to the pool.
pub fn apply_graduation(
    board: &mut Board,
    pools: &mut [Pool; 2],
    cells: &[Coord],
) -> Vec<GraduationEffect> {
    let mut effects = Vec::with_capacity(cells.len());
    for &cell in cells {
        let Some(piece) = board.take(cell) else {
            continue;
        };
        let pool = pool_mut(pools, piece.color);
        match piece.kind {
            PieceKind::Kitten => pool.graduate_kitten(),
            PieceKind::Cat => pool.give_back(PieceKind::Cat),
        }
        effects.push(GraduationEffect { cell, piece });
    }
    effects
}

#[must_use]
pub fn cats_earned(effects: &[GraduationEffect]) -> u8 {
    let n = effects
        .iter()
        .filter(|e| e.piece.kind == PieceKind::Kitten)
        .count();
    u8::try_from(n).unwrap_or(u8::MAX)
}

#[must_use]
pub fn has_cat_line(board: &Board, color: Color) -> bool {
    let cat = Piece::cat(color);
    Coord::all().any(|start| {
        LINE_DIRECTIONS.iter().any(|&dir| {
            (0..3).all(|step| start.offset(dir, step).is_some_and(|c| board.get(c) == Some(cat)))
        })
    })
}

#[must_use]
pub fn win_reason(board: &Board, color: Color) -> Option<WinReason> {
    if has_cat_line(board, color) {
        Some(WinReason::ThreeCatsInRow)
    } else if board.count(color, PieceKind::Cat) >= PIECES_PER_KIND {
        Some(WinReason::EightCatsOnBoard)
    } else {
        None
    }
}

/// Places a piece and resolves boops and graduation.
///
/// Works on copies and commits only on success, so a refused placement leaves
/// `board` and `pools` untouched. `choice` selects among multiple graduation
/// options; without one the options come back as [`GraduationStep::Pending`]
/// and nothing is graduated. Win detection is left to the caller since it is
/// skipped while a choice is pending.
pub fn play_placement(
    board: &mut Board,
    pools: &mut [Pool; 2],
    color: Color,
    at: Coord,
    kind: PieceKind,
    choice: Option<usize>,
) -> Result<Placement, RuleError> {
    if !board.is_empty(at) {
        return Err(RuleError::CellOccupied);
    }
    if !pool_of(pools, color).has(kind) {
        return Err(RuleError::NoPiecesAvailable);
    }

    let mut next_board = *board;
    let mut next_pools = *pools;

    pool_mut(&mut next_pools, color).take(kind);
    let placed = Piece::new(color, kind);
    next_board.place(at, placed);

    let boops = resolve_boops(&mut next_board, at, placed);
    for effect in &boops {
        if effect.to.is_none() {
            pool_mut(&mut next_pools, effect.piece.color).give_back(effect.piece.kind);
        }
    }

    let options = graduation_options(&next_board, color);
    let graduation = match (options.as_slice(), choice) {
        ([], _) => {
            match forced_graduation_cell(&next_board, color, pool_of(&next_pools, color)) {
                Some(cell) => GraduationStep::Applied {
                    effects: apply_graduation(&mut next_board, &mut next_pools, &[cell]),
                    forced: true,
                },
                None => GraduationStep::None,
            }
        }
        ([only], _) => GraduationStep::Applied {
            effects: apply_graduation(&mut next_board, &mut next_pools, &only.cells),
            forced: false,
        },
        (_, Some(index)) => {
            let option = options.get(index).ok_or(RuleError::InvalidOption)?;
            GraduationStep::Applied {
                effects: apply_graduation(&mut next_board, &mut next_pools, &option.cells),
                forced: false,
            }
        }
        (_, None) => GraduationStep::Pending(options),
    };

    *board = next_board;
    *pools = next_pools;
    Ok(Placement { boops, graduation })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(row: usize, col: usize) -> Coord {
        Coord::new(row, col).unwrap()
    }

    fn board(notation: &str) -> Board {
        Board::from_notation(notation).unwrap()
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(RuleError::NotYourTurn.code(), "NOT_YOUR_TURN");
        assert_eq!(RuleError::CellOccupied.code(), "CELL_OCCUPIED");
        assert_eq!(RuleError::InvalidOption.code(), "INVALID_OPTION");
        assert_eq!(target_cell(-1, 2), Err(RuleError::InvalidPosition));
        assert_eq!(target_cell(2, 6), Err(RuleError::InvalidPosition));
        assert_eq!(target_cell(5, 5), Ok(at(5, 5)));
    }

    #[test]
    fn test_boop_pushes_neighbor_away() {
        let mut b = board("6/6/2g3/6/6/6");
        let placed = Piece::kitten(Color::Orange);
        b.place(at(2, 1), placed);
        let effects = resolve_boops(&mut b, at(2, 1), placed);
        assert_eq!(
            effects,
            vec![BoopEffect {
                from: at(2, 2),
                to: Some(at(2, 3)),
                piece: Piece::kitten(Color::Gray),
            }]
        );
        assert!(b.is_empty(at(2, 2)));
        assert_eq!(b.get(at(2, 3)), Some(Piece::kitten(Color::Gray)));
    }

    #[test]
    fn test_boop_blocked_by_occupied_landing() {
        let mut b = board("6/6/2go2/6/6/6");
        let placed = Piece::kitten(Color::Orange);
        b.place(at(2, 1), placed);
        let effects = resolve_boops(&mut b, at(2, 1), placed);
        assert!(effects.is_empty());
        assert_eq!(b.get(at(2, 2)), Some(Piece::kitten(Color::Gray)));
        assert_eq!(b.get(at(2, 3)), Some(Piece::kitten(Color::Orange)));
    }

    #[test]
    fn test_kitten_cannot_boop_cat() {
        let mut b = board("6/6/2G3/6/6/6");
        let placed = Piece::kitten(Color::Orange);
        b.place(at(2, 1), placed);
        assert!(resolve_boops(&mut b, at(2, 1), placed).is_empty());
        assert_eq!(b.get(at(2, 2)), Some(Piece::cat(Color::Gray)));
    }

    #[test]
    fn test_cat_boops_cat_and_kitten() {
        let mut b = board("6/1gG3/6/6/6/6");
        let placed = Piece::cat(Color::Orange);
        b.place(at(2, 2), placed);
        let effects = resolve_boops(&mut b, at(2, 2), placed);
        assert_eq!(effects.len(), 2);
        assert_eq!(b.get(at(0, 0)), Some(Piece::kitten(Color::Gray)));
        assert_eq!(b.get(at(0, 2)), Some(Piece::cat(Color::Gray)));
    }

    #[test]
    fn test_boop_off_board_returns_to_pool() {
        let mut b = board("2g3/6/6/6/6/6");
        let mut pools = [Pool::new(), Pool::new()];
        pools[1].kittens = 7;
        let placement =
            play_placement(&mut b, &mut pools, Color::Orange, at(1, 2), PieceKind::Kitten, None)
                .unwrap();
        assert_eq!(
            placement.boops,
            vec![BoopEffect {
                from: at(0, 2),
                to: None,
                piece: Piece::kitten(Color::Gray),
            }]
        );
        assert!(b.is_empty(at(0, 2)));
        assert_eq!(pools[1].kittens, 8);
        assert_eq!(pools[0].kittens, 7);
    }

    #[test]
    fn test_placement_validation_happens_first() {
        let mut b = board("o5/6/6/6/6/6");
        let mut pools = [Pool::new(), Pool::new()];
        let before = (b, pools);
        assert_eq!(
            play_placement(&mut b, &mut pools, Color::Gray, at(0, 0), PieceKind::Kitten, None),
            Err(RuleError::CellOccupied)
        );
        assert_eq!(
            play_placement(&mut b, &mut pools, Color::Gray, at(1, 1), PieceKind::Cat, None),
            Err(RuleError::NoPiecesAvailable)
        );
        assert_eq!((b, pools), before);
    }

    #[test]
    fn test_line_of_four_yields_two_options() {
        let b = board("6/6/oooo2/6/6/6");
        let options = graduation_options(&b, Color::Orange);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].cells, [at(2, 0), at(2, 1), at(2, 2)]);
        assert_eq!(options[1].cells, [at(2, 1), at(2, 2), at(2, 3)]);
        assert!(graduation_options(&b, Color::Gray).is_empty());
    }

    #[test]
    fn test_options_deduplicated_across_axes() {
        let b = board("o5/1o4/2o3/3o2/6/6");
        let options = graduation_options(&b, Color::Orange);
        assert_eq!(options.len(), 2);
        let mut keys: Vec<[usize; 3]> = options.iter().map(GraduationOption::key).collect();
        keys.dedup();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_pure_cat_line_is_not_an_option() {
        let b = board("6/6/OOO3/6/6/6");
        assert!(graduation_options(&b, Color::Orange).is_empty());
        assert_eq!(win_reason(&b, Color::Orange), Some(WinReason::ThreeCatsInRow));
        assert_eq!(win_reason(&b, Color::Gray), None);
    }

    #[test]
    fn test_mixed_line_is_an_option() {
        let b = board("6/6/6/1O4/1o4/1O4");
        let options = graduation_options(&b, Color::Orange);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].cells, [at(3, 1), at(4, 1), at(5, 1)]);
    }

    #[test]
    fn test_interrupted_line_has_no_option() {
        let b = board("6/6/oogo2/6/6/6");
        assert!(graduation_options(&b, Color::Orange).is_empty());
    }

    #[test]
    fn test_single_option_auto_applied() {
        let mut b = board("6/6/oo4/6/6/6");
        let mut pools = [Pool::new(), Pool::new()];
        pools[0].kittens = 6;
        let placement =
            play_placement(&mut b, &mut pools, Color::Orange, at(2, 2), PieceKind::Kitten, None)
                .unwrap();
        // (2,1) would land on (2,0), which is occupied.
        assert!(placement.boops.is_empty());
        assert_eq!(placement.graduation.cats_earned(), 3);
        assert!(matches!(
            placement.graduation,
            GraduationStep::Applied { forced: false, .. }
        ));
        assert_eq!(b.count_color(Color::Orange), 0);
        assert_eq!(pools[0].kittens, 5);
        assert_eq!(pools[0].cats, 3);
        assert_eq!(pools[0].retired, 3);
    }

    #[test]
    fn test_multiple_options_pending_without_choice() {
        let mut b = board("6/6/ooo3/6/6/6");
        let mut pools = [Pool::new(), Pool::new()];
        pools[0].kittens = 5;
        let before = (b, pools);

        let placement =
            play_placement(&mut b, &mut pools, Color::Orange, at(2, 3), PieceKind::Kitten, None)
                .unwrap();
        assert!(matches!(&placement.graduation, GraduationStep::Pending(o) if o.len() == 2));
        assert_eq!(b.count_color(Color::Orange), 4);

        let (mut b2, mut pools2) = before;
        assert_eq!(
            play_placement(
                &mut b2,
                &mut pools2,
                Color::Orange,
                at(2, 3),
                PieceKind::Kitten,
                Some(2)
            ),
            Err(RuleError::InvalidOption)
        );
        assert_eq!((b2, pools2), before);

        let placement = play_placement(
            &mut b2,
            &mut pools2,
            Color::Orange,
            at(2, 3),
            PieceKind::Kitten,
            Some(1),
        )
        .unwrap();
        assert_eq!(placement.graduation.cats_earned(), 3);
        assert_eq!(b2.get(at(2, 0)), Some(Piece::kitten(Color::Orange)));
        assert!(b2.is_empty(at(2, 3)));
    }

    #[test]
    fn test_graduation_converts_kittens_and_returns_cats() {
        let mut b = board("6/6/oOo3/6/6/6");
        let mut pools = [
            Pool {
                kittens: 6,
                cats: 0,
                retired: 1,
            },
            Pool::new(),
        ];
        let effects = apply_graduation(&mut b, &mut pools, &[at(2, 0), at(2, 1), at(2, 2)]);
        assert_eq!(effects.len(), 3);
        assert_eq!(cats_earned(&effects), 2);
        assert_eq!(pools[0].retired, 3);
        assert_eq!(pools[0].cats, 3);
        assert_eq!(b.count_color(Color::Orange), 0);
    }

    #[test]
    fn test_forced_graduation_picks_first_kitten() {
        let b = board("o1o1o1/6/o1o1o1/6/o1o3/6");
        let pool = Pool {
            kittens: 0,
            cats: 0,
            retired: 0,
        };
        assert_eq!(b.count_color(Color::Orange), 8);
        assert!(graduation_options(&b, Color::Orange).is_empty());
        assert_eq!(forced_graduation_cell(&b, Color::Orange, &pool), Some(at(0, 0)));

        let few = board("o1o1o1/6/6/6/6/6");
        assert_eq!(forced_graduation_cell(&few, Color::Orange, &pool), None);
    }

    #[test]
    fn test_eight_cats_on_board_wins() {
        let b = board("O1O1O1/6/O1O1O1/6/O1O3/6");
        assert_eq!(win_reason(&b, Color::Orange), Some(WinReason::EightCatsOnBoard));
    }
}
