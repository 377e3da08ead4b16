use boop_core::logic::board::{Color, PieceKind};
use boop_core::logic::game::{GameSnapshot, GraduationOutcome, MoveOutcome};
use boop_core::logic::player::Pool;
use boop_core::logic::rules::{BoopEffect, GraduationEffect, GraduationOption};
use boop_core::tournament::Standing;
use std::fmt::Write;

fn pool_line(color: Color, pool: Pool) -> String {
    format!(
        "{color:>6}: {} kittens, {} cats in hand, {} graduated",
        pool.kittens, pool.cats, pool.retired
    )
}

pub fn snapshot(snapshot: &GameSnapshot) -> String {
    let mut out = snapshot.board.to_string();
    for color in Color::ALL {
        let _ = writeln!(out, "{}", pool_line(color, snapshot.pool(color)));
    }
    let _ = writeln!(out, "phase {:?}, {} to move", snapshot.phase, snapshot.current_turn);
    out
}

fn kind_name(kind: PieceKind) -> &'static str {
    match kind {
        PieceKind::Kitten => "kitten",
        PieceKind::Cat => "cat",
    }
}

fn boops(out: &mut String, boops: &[BoopEffect]) {
    for b in boops {
        let piece = format!("{} {}", b.piece.color, kind_name(b.piece.kind));
        let _ = match b.to {
            Some(to) => writeln!(out, "  boop: {piece} {} -> {to}", b.from),
            None => writeln!(out, "  boop: {piece} {} -> off the board", b.from),
        };
    }
}

fn graduations(out: &mut String, graduated: &[GraduationEffect]) {
    if graduated.is_empty() {
        return;
    }
    let cells: Vec<String> = graduated.iter().map(|g| g.cell.to_string()).collect();
    let _ = writeln!(out, "  graduated: {}", cells.join(" "));
}

pub fn options(options: &[GraduationOption]) -> String {
    let mut out = String::new();
    for (i, option) in options.iter().enumerate() {
        let cells: Vec<String> = option.cells.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "  option {i}: {}", cells.join(" "));
    }
    out
}

pub fn move_outcome(outcome: &MoveOutcome) -> String {
    let mut out = String::new();
    boops(&mut out, &outcome.boops);
    graduations(&mut out, &outcome.graduated);
    if outcome.forced_graduation {
        out.push_str("  (forced graduation)\n");
    }
    if !outcome.pending_options.is_empty() {
        out.push_str(&options(&outcome.pending_options));
    }
    if let (Some(winner), Some(reason)) = (outcome.winner, outcome.win_reason) {
        let _ = writeln!(out, "  {winner} wins: {reason:?}");
    }
    out
}

pub fn graduation_outcome(outcome: &GraduationOutcome) -> String {
    let mut out = String::new();
    graduations(&mut out, &outcome.graduated);
    if let (Some(winner), Some(reason)) = (outcome.winner, outcome.win_reason) {
        let _ = writeln!(out, "  {winner} wins: {reason:?}");
    }
    out
}

pub fn standings(standings: &[Standing]) -> String {
    let mut out = String::from("rank  name                 W    D    L   points     elo\n");
    for (i, s) in standings.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<18} {:>4} {:>4} {:>4} {:>8.1} {:>7.1}",
            i + 1,
            s.name,
            s.wdl.win,
            s.wdl.draw,
            s.wdl.loss,
            s.points,
            s.elo
        );
    }
    out
}
