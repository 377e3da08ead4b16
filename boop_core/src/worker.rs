use crate::engine::bot::BoopBot;
use crate::engine::config::BotConfig;
use crate::engine::{Move, SearchStats};
use crate::logic::game::{GamePhase, GameSnapshot};
use gloo_worker::{HandlerId, Worker, WorkerScope};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub enum Input {
    FindMove(GameSnapshot, BotConfig),
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Output {
    /// `None` when the side to move has nothing to place. The move may carry
    /// a graduation choice to submit after the placement.
    MoveFound(Option<Move>, SearchStats),
}

/// Runs the bot off the page thread. The bot is kept between requests so its
/// tables stay warm; a changed config is swapped in place.
pub struct BotWorker {
    bot: Option<BoopBot>,
}

impl BotWorker {
    fn bot_for(&mut self, config: BotConfig) -> &mut BoopBot {
        let bot = self.bot.get_or_insert_with(|| BoopBot::new(config.clone()));
        if *bot.config() != config {
            bot.update_config(config);
        }
        bot
    }
}

/// Answers one request. While a graduation choice is pending the answer is the
/// placement that was already made, carrying the chosen option. A snapshot
/// with no placement yet starts the bot's tables over.
pub fn compute(bot: &mut BoopBot, snapshot: &GameSnapshot) -> Output {
    if snapshot.phase == GamePhase::SelectingGraduation {
        let chosen = bot.choose_graduation(snapshot).and_then(|i| {
            let last = snapshot.last_move?;
            let choice = u8::try_from(i).ok()?;
            Some(Move::new(last.at, last.kind).with_graduation(choice))
        });
        return Output::MoveFound(chosen, SearchStats::default());
    }
    if snapshot.last_move.is_none() {
        // Fresh game: nothing learned in the previous one applies.
        bot.reset();
    }
    match bot.find_best_move_with_stats(snapshot) {
        Some((mv, stats)) => Output::MoveFound(Some(mv), stats),
        None => Output::MoveFound(None, SearchStats::default()),
    }
}

impl Worker for BotWorker {
    type Input = Input;
    type Message = ();
    type Output = Output;

    fn create(_scope: &WorkerScope<Self>) -> Self {
        Self { bot: None }
    }

    fn update(&mut self, _scope: &WorkerScope<Self>, _msg: Self::Message) {}

    fn received(&mut self, scope: &WorkerScope<Self>, msg: Self::Input, id: HandlerId) {
        match msg {
            Input::FindMove(snapshot, config) => {
                let output = compute(self.bot_for(config), &snapshot);
                debug!("worker answered {output:?}");
                scope.respond(id, output);
            }
        }
    }
}
