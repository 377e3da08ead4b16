#[cfg(test)]
mod tests {
    use boop_core::logic::board::{Board, Color, Piece, PieceKind};
    use boop_core::logic::game::{GamePhase, GameState};
    use boop_core::logic::geometry::Coord;
    use boop_core::logic::player::Pool;
    use boop_core::logic::rules::{BoopEffect, RuleError, WinReason};

    fn at(row: usize, col: usize) -> Coord {
        Coord::new(row, col).unwrap()
    }

    fn new_game() -> GameState {
        let mut game = GameState::new();
        game.add_player("orange", "Olive").unwrap();
        game.add_player("gray", "Graham").unwrap();
        game
    }

    fn setup(notation: &str, orange: Pool, gray: Pool) -> GameState {
        let mut game = new_game();
        game.board = Board::from_notation(notation).unwrap();
        game.players[0].as_mut().unwrap().pool = orange;
        game.players[1].as_mut().unwrap().pool = gray;
        assert!(game.check_conservation().is_ok(), "bad fixture {notation}");
        game
    }

    const fn pool(kittens: u8, cats: u8, retired: u8) -> Pool {
        Pool {
            kittens,
            cats,
            retired,
        }
    }

    #[test]
    fn basic_boop_pushes_away_from_the_placed_piece() {
        let mut game = new_game();
        game.place_piece("orange", 2, 2, PieceKind::Kitten).unwrap();

        let outcome = game.place_piece("gray", 2, 3, PieceKind::Kitten).unwrap();
        assert_eq!(
            outcome.boops,
            vec![BoopEffect {
                from: at(2, 2),
                to: Some(at(2, 1)),
                piece: Piece::kitten(Color::Orange),
            }]
        );

        let outcome = game.place_piece("orange", 2, 4, PieceKind::Kitten).unwrap();
        assert_eq!(
            outcome.boops,
            vec![BoopEffect {
                from: at(2, 3),
                to: Some(at(2, 2)),
                piece: Piece::kitten(Color::Gray),
            }]
        );
        assert_eq!(game.board.to_notation(), "6/6/1og1o1/6/6/6");
    }

    #[test]
    fn boop_into_occupied_cell_is_blocked() {
        let mut game = setup("6/6/1go3/6/6/6", pool(7, 0, 0), pool(7, 0, 0));
        let outcome = game.place_piece("orange", 2, 0, PieceKind::Kitten).unwrap();
        assert!(outcome.boops.is_empty());
        assert_eq!(game.board.get(at(2, 1)), Some(Piece::kitten(Color::Gray)));
        assert_eq!(game.board.get(at(2, 2)), Some(Piece::kitten(Color::Orange)));
    }

    #[test]
    fn kitten_never_moves_a_cat() {
        let mut game = setup("6/6/2G3/6/6/6", pool(8, 0, 0), pool(5, 2, 3));
        let outcome = game.place_piece("orange", 2, 1, PieceKind::Kitten).unwrap();
        assert!(outcome.boops.is_empty());
        assert_eq!(game.board.get(at(2, 2)), Some(Piece::cat(Color::Gray)));
    }

    #[test]
    fn edge_push_off_returns_piece_to_its_owner() {
        let mut game = setup("2g3/6/6/6/6/6", pool(8, 0, 0), pool(7, 0, 0));
        let outcome = game.place_piece("orange", 1, 2, PieceKind::Kitten).unwrap();
        assert_eq!(
            outcome.boops,
            vec![BoopEffect {
                from: at(0, 2),
                to: None,
                piece: Piece::kitten(Color::Gray),
            }]
        );
        assert!(game.board.is_empty(at(0, 2)));
        assert_eq!(game.player(Color::Gray).unwrap().pool, pool(8, 0, 0));
        assert_eq!(game.player(Color::Orange).unwrap().pool, pool(7, 0, 0));
    }

    #[test]
    fn line_of_four_offers_two_distinct_options() {
        let mut game = setup("6/6/ooo3/6/6/6", pool(5, 0, 0), pool(8, 0, 0));
        let outcome = game.place_piece("orange", 2, 3, PieceKind::Kitten).unwrap();
        assert_eq!(game.phase, GamePhase::SelectingGraduation);

        let mut keys: Vec<_> = outcome.pending_options.iter().map(|o| o.key()).collect();
        keys.sort_unstable();
        let window = |cols: [usize; 3]| cols.map(|c| at(2, c).index());
        assert_eq!(keys, vec![window([0, 1, 2]), window([1, 2, 3])]);
        assert!(outcome.graduated.is_empty());
        assert_eq!(game.current_turn, Color::Orange);
        assert!(game.check_conservation().is_ok());
    }

    #[test]
    fn single_option_is_applied_immediately() {
        let mut game = setup("6/6/oo4/6/6/6", pool(6, 0, 0), pool(8, 0, 0));
        let outcome = game.place_piece("orange", 2, 2, PieceKind::Kitten).unwrap();
        assert!(outcome.pending_options.is_empty());
        assert_eq!(outcome.cats_earned, 3);
        assert!(!outcome.forced_graduation);
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.current_turn, Color::Gray);
        assert_eq!(game.board.count_color(Color::Orange), 0);
        assert_eq!(game.player(Color::Orange).unwrap().pool, pool(5, 3, 3));
    }

    #[test]
    fn mixed_line_graduates_kittens_and_returns_cats() {
        let mut game = setup("6/6/Oo4/6/6/6", pool(6, 0, 1), pool(8, 0, 0));
        // The cat on the board accounts for the one retired kitten.
        let outcome = game.place_piece("orange", 2, 2, PieceKind::Kitten).unwrap();
        assert_eq!(outcome.graduated.len(), 3);
        assert_eq!(outcome.cats_earned, 2);
        assert_eq!(game.player(Color::Orange).unwrap().pool, pool(5, 3, 3));
        assert!(game.check_conservation().is_ok());
    }

    #[test]
    fn forced_graduation_takes_first_kitten_in_row_major_order() {
        let mut game = setup("o1o1o1/6/o1o1o1/6/o5/6", pool(1, 0, 0), pool(8, 0, 0));
        let outcome = game.place_piece("orange", 4, 2, PieceKind::Kitten).unwrap();
        assert!(outcome.boops.is_empty());
        assert!(outcome.forced_graduation);
        assert_eq!(outcome.graduated.len(), 1);
        assert_eq!(outcome.graduated[0].cell, at(0, 0));
        assert_eq!(outcome.cats_earned, 1);
        assert_eq!(game.player(Color::Orange).unwrap().pool, pool(0, 1, 1));
        assert_eq!(game.current_turn, Color::Gray);
    }

    #[test]
    fn three_cats_in_a_row_wins_without_passing_the_turn() {
        let mut game = setup("6/6/OO4/6/6/6", pool(5, 1, 3), pool(8, 0, 0));
        let outcome = game.place_piece("orange", 2, 2, PieceKind::Cat).unwrap();
        assert_eq!(outcome.winner, Some(Color::Orange));
        assert_eq!(outcome.win_reason, Some(WinReason::ThreeCatsInRow));
        assert_eq!(game.phase, GamePhase::Finished);
        assert_eq!(game.current_turn, Color::Orange);
        assert_eq!(
            game.place_piece("gray", 0, 0, PieceKind::Kitten),
            Err(RuleError::GameNotPlaying)
        );
    }

    #[test]
    fn eight_cats_on_board_wins() {
        let mut game = setup("O1O1O1/6/O1O1O1/6/O5/6", pool(0, 1, 8), pool(8, 0, 0));
        let outcome = game.place_piece("orange", 4, 2, PieceKind::Cat).unwrap();
        assert_eq!(outcome.win_reason, Some(WinReason::EightCatsOnBoard));
        assert_eq!(game.winner, Some(Color::Orange));
    }

    #[test]
    fn wrong_color_is_refused_and_nothing_changes() {
        let mut game = new_game();
        game.place_piece("orange", 3, 3, PieceKind::Kitten).unwrap();
        let before = game.snapshot();
        for (row, col) in [(0, 0), (3, 3), (-1, 9)] {
            assert_eq!(
                game.place_piece("orange", row, col, PieceKind::Kitten),
                Err(RuleError::NotYourTurn)
            );
        }
        assert_eq!(game.snapshot(), before);
        assert_eq!(game.history.len(), 1);
    }

    #[test]
    fn selection_flow_resumes_play() {
        let mut game = setup("6/6/ooo3/6/6/6", pool(5, 0, 0), pool(8, 0, 0));
        game.place_piece("orange", 2, 3, PieceKind::Kitten).unwrap();
        let chosen = game.select_graduation("orange", 1).unwrap();
        assert_eq!(chosen.cats_earned, 3);
        assert_eq!(game.board.to_notation(), "6/6/o5/6/6/6");
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.current_turn, Color::Gray);
        assert!(game.pending_graduation.is_none());
    }
}
