use anyhow::{bail, Context, Result};
use boop_core::engine::bot::BoopBot;
use boop_core::engine::config::{BotConfig, Difficulty};
use boop_core::logic::board::Color;
use boop_core::logic::game::{GamePhase, GameSnapshot, GameState};
use boop_core::tournament;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::path::{Path, PathBuf};

mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Boop rules engine and bot", long_about = None)]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Two bots play one game through the authoritative engine
    Play {
        #[arg(long, value_enum, default_value_t = Level::Medium)]
        orange: Level,
        #[arg(long, value_enum, default_value_t = Level::Medium)]
        gray: Level,
        /// Bot config JSON for Orange; overrides --orange
        #[arg(long)]
        orange_config: Option<PathBuf>,
        /// Bot config JSON for Gray; overrides --gray
        #[arg(long)]
        gray_config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 200)]
        max_plies: u32,
    },
    /// Simulator-only match between configs (round-robin for three or more)
    Tournament {
        /// Bot config JSON files; the difficulty presets play when none are given
        configs: Vec<PathBuf>,
        #[arg(short, long, default_value_t = 20)]
        games: u32,
        #[arg(long, default_value_t = 200)]
        max_plies: u32,
        /// Play games one after another instead of on all cores
        #[arg(long)]
        serial: bool,
    },
    /// Reads a game snapshot as JSON and prints the bot's move
    Suggest {
        snapshot: PathBuf,
        #[arg(long, value_enum, default_value_t = Level::Hard)]
        level: Level,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Level {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl From<Level> for Difficulty {
    fn from(level: Level) -> Self {
        match level {
            Level::Easy => Self::Easy,
            Level::Medium => Self::Medium,
            Level::Hard => Self::Hard,
            Level::Expert => Self::Expert,
        }
    }
}

fn load_config(path: Option<&Path>, level: Level) -> Result<BotConfig> {
    let Some(path) = path else {
        return Ok(Difficulty::from(level).config());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading bot config {}", path.display()))?;
    BotConfig::load_from_json(&text)
        .with_context(|| format!("parsing bot config {}", path.display()))
}

fn with_seed(config: BotConfig, seed: Option<u64>, offset: u64) -> BotConfig {
    BotConfig {
        seed: seed.map(|s| s.wrapping_add(offset)).or(config.seed),
        ..config
    }
}

fn identity(color: Color) -> &'static str {
    match color {
        Color::Orange => "orange",
        Color::Gray => "gray",
    }
}

fn play(orange: BotConfig, gray: BotConfig, max_plies: u32) -> Result<()> {
    let mut game = GameState::new();
    game.add_player(identity(Color::Orange), "Orange bot")?;
    game.add_player(identity(Color::Gray), "Gray bot")?;
    let mut bots = [BoopBot::new(orange), BoopBot::new(gray)];

    for ply in 1..=max_plies {
        if game.phase != GamePhase::Playing {
            break;
        }
        let color = game.current_turn;
        let bot = match color {
            Color::Orange => &mut bots[0],
            Color::Gray => &mut bots[1],
        };
        let Some((mv, stats)) = bot.find_best_move_with_stats(&game.snapshot()) else {
            println!("{color} has nothing to place");
            break;
        };
        println!(
            "{ply}. {color} plays {mv} (score {}, depth {}, {} nodes)",
            stats.score, stats.depth, stats.nodes
        );

        let outcome = game.place_piece(
            identity(color),
            i32::from(mv.row),
            i32::from(mv.col),
            mv.kind,
        )?;
        print!("{}", render::move_outcome(&outcome));

        if game.phase == GamePhase::SelectingGraduation {
            let Some(choice) = mv
                .graduation
                .map(usize::from)
                .or_else(|| bot.choose_graduation(&game.snapshot()))
            else {
                bail!("{color} could not pick a graduation option");
            };
            let chosen = game.select_graduation(identity(color), choice)?;
            println!("  {color} graduates option {choice}");
            print!("{}", render::graduation_outcome(&chosen));
        }
        if let Err(e) = game.check_conservation() {
            bail!("piece accounting broken after ply {ply}: {e}");
        }
        print!("{}", render::snapshot(&game.snapshot()));
    }

    match (game.winner, game.win_reason) {
        (Some(winner), Some(reason)) => println!("{winner} wins ({reason:?})"),
        _ => println!("draw after {} actions", game.history.len()),
    }
    Ok(())
}

fn run_tournament(configs: &[PathBuf], games: u32, max_plies: u32, parallel: bool) -> Result<()> {
    let entries: Vec<(String, BotConfig)> = if configs.is_empty() {
        [Level::Easy, Level::Medium, Level::Hard]
            .into_iter()
            .map(|level| (format!("{level:?}"), Difficulty::from(level).config()))
            .collect()
    } else {
        configs
            .iter()
            .map(|path| {
                let name = path.file_stem().map_or_else(
                    || path.display().to_string(),
                    |s| s.to_string_lossy().into_owned(),
                );
                load_config(Some(path), Level::Medium).map(|config| (name, config))
            })
            .collect::<Result<_>>()?
    };

    match entries.as_slice() {
        [] | [_] => bail!("a tournament needs at least two configs"),
        [(name_a, a), (name_b, b)] => {
            info!("{name_a} vs {name_b}, {games} games");
            let result = tournament::run_match(a, b, games, max_plies, parallel);
            println!("{name_a} vs {name_b}");
            println!("{result:?}");
        }
        _ => {
            let standings = tournament::round_robin(&entries, games, max_plies, parallel);
            print!("{}", render::standings(&standings));
        }
    }
    Ok(())
}

fn suggest(path: &Path, config: BotConfig) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: GameSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    print!("{}", render::snapshot(&snapshot));

    let mut bot = BoopBot::new(config);
    match snapshot.phase {
        GamePhase::SelectingGraduation => {
            let pending = snapshot
                .pending_graduation
                .as_ref()
                .context("snapshot is selecting a graduation but carries no options")?;
            print!("{}", render::options(&pending.options));
            match bot.choose_graduation(&snapshot) {
                Some(choice) => println!("{} should graduate option {choice}", pending.color),
                None => warn!("no graduation option to choose"),
            }
        }
        GamePhase::Playing => match bot.find_best_move_with_stats(&snapshot) {
            Some((mv, stats)) => {
                println!("{} should play {mv}", snapshot.current_turn);
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            None => println!("{} has no legal placement", snapshot.current_turn),
        },
        phase => println!("nothing to suggest while {phase:?}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match args.command {
        Command::Play {
            orange,
            gray,
            orange_config,
            gray_config,
            seed,
            max_plies,
        } => {
            let orange = with_seed(load_config(orange_config.as_deref(), orange)?, seed, 0);
            let gray = with_seed(load_config(gray_config.as_deref(), gray)?, seed, 1);
            play(orange, gray, max_plies)
        }
        Command::Tournament {
            configs,
            games,
            max_plies,
            serial,
        } => run_tournament(&configs, games, max_plies, !serial),
        Command::Suggest {
            snapshot,
            level,
            config,
        } => suggest(&snapshot, load_config(config.as_deref(), level)?),
    }
}
