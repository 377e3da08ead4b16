use serde::{Deserialize, Serialize};

/// How a tier picks among several qualifying moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Uniformly at random.
    Random,
    /// Full search restricted to the qualifying moves.
    Search,
    /// One-ply static evaluation.
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    #[must_use]
    pub fn config(self) -> BotConfig {
        let base = BotConfig::default();
        match self {
            Self::Easy => BotConfig {
                depth: 1,
                use_tt: false,
                tie_break_graduate: TieBreak::Random,
                tie_break_block_graduate: TieBreak::Random,
                ..base
            },
            Self::Medium => BotConfig { depth: 2, ..base },
            Self::Hard => BotConfig { depth: 4, ..base },
            Self::Expert => BotConfig { depth: 5, ..base },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    // Evaluation Parameters
    pub weight_center: i32,
    pub weight_inner: i32,
    pub weight_edge: i32,
    pub weight_corner: i32,
    pub cat_multiplier: i32,
    pub cat_pair: i32,
    pub kitten_pair: i32,
    pub two_way_threat: i32,
    pub cat_value_first: i32,
    pub cat_value_second: i32,
    pub cat_value_third: i32,
    pub cat_value_rest: i32,
    pub win_score: i32,

    // Search Parameters
    pub depth: u8,
    pub use_tt: bool,
    pub use_killers: bool,
    pub use_history: bool,
    pub use_iterative_deepening: bool,
    pub tt_size_mb: usize,

    // Move Ordering
    pub score_hash_move: i32,
    pub score_win: i32,
    pub score_graduation: i32,
    pub score_killer_move: i32,
    pub score_history_max: i32,
    pub order_center: i32,
    pub order_inner: i32,
    pub order_edge: i32,
    pub order_corner: i32,
    pub order_cat_bonus: i32,
    pub order_knock_off: i32,

    // Tier cascade
    pub tier_win: bool,
    pub tier_block_win: bool,
    pub tier_graduate: bool,
    pub tier_block_graduate: bool,
    pub tie_break_win: TieBreak,
    pub tie_break_block_win: TieBreak,
    pub tie_break_graduate: TieBreak,
    pub tie_break_block_graduate: TieBreak,

    /// Fixes every random tie-break.
    pub seed: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            weight_center: 30,
            weight_inner: 12,
            weight_edge: -8,
            weight_corner: -15,
            cat_multiplier: 3,
            cat_pair: 400,
            kitten_pair: 120,
            two_way_threat: 250,
            cat_value_first: 600,
            cat_value_second: 400,
            cat_value_third: 250,
            cat_value_rest: 180,
            win_score: 1_000_000,

            depth: 3,
            use_tt: true,
            use_killers: true,
            use_history: true,
            use_iterative_deepening: true,
            tt_size_mb: 16,

            score_hash_move: 3_000_000,
            score_win: 2_000_000,
            score_graduation: 1_500_000,
            score_killer_move: 1_200_000,
            score_history_max: 800_000,
            order_center: 300,
            order_inner: 150,
            order_edge: 0,
            order_corner: -100,
            order_cat_bonus: 200,
            order_knock_off: 250,

            tier_win: true,
            tier_block_win: true,
            tier_graduate: true,
            tier_block_graduate: true,
            tie_break_win: TieBreak::Random,
            tie_break_block_win: TieBreak::Search,
            tie_break_graduate: TieBreak::Search,
            tie_break_block_graduate: TieBreak::Search,

            seed: None,
        }
    }
}

#[derive(Deserialize)]
struct BotConfigJson {
    weight_center: Option<f32>,
    weight_inner: Option<f32>,
    weight_edge: Option<f32>,
    weight_corner: Option<f32>,
    cat_multiplier: Option<f32>,
    cat_pair: Option<f32>,
    kitten_pair: Option<f32>,
    two_way_threat: Option<f32>,
    cat_value_first: Option<f32>,
    cat_value_second: Option<f32>,
    cat_value_third: Option<f32>,
    cat_value_rest: Option<f32>,
    win_score: Option<i32>,

    depth: Option<u8>,
    use_tt: Option<bool>,
    use_killers: Option<bool>,
    use_history: Option<bool>,
    use_iterative_deepening: Option<bool>,
    tt_size_mb: Option<usize>,

    score_hash_move: Option<f32>,
    score_win: Option<f32>,
    score_graduation: Option<f32>,
    score_killer_move: Option<f32>,
    score_history_max: Option<f32>,
    order_center: Option<f32>,
    order_inner: Option<f32>,
    order_edge: Option<f32>,
    order_corner: Option<f32>,
    order_cat_bonus: Option<f32>,
    order_knock_off: Option<f32>,

    tier_win: Option<bool>,
    tier_block_win: Option<bool>,
    tier_graduate: Option<bool>,
    tier_block_graduate: Option<bool>,
    tie_break_win: Option<TieBreak>,
    tie_break_block_win: Option<TieBreak>,
    tie_break_graduate: Option<TieBreak>,
    tie_break_block_graduate: Option<TieBreak>,

    seed: Option<u64>,
}

impl BotConfig {
    /// Reads a config where weights are scale factors on the defaults and
    /// every other knob is taken as written. The win sentinel is absolute and
    /// never below `MIN_WIN_SCORE`.
    pub fn load_from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        let json: BotConfigJson = serde_json::from_str(json_str)?;
        let d = Self::default();

        Ok(Self {
            weight_center: apply_scale(d.weight_center, json.weight_center),
            weight_inner: apply_scale(d.weight_inner, json.weight_inner),
            weight_edge: apply_scale(d.weight_edge, json.weight_edge),
            weight_corner: apply_scale(d.weight_corner, json.weight_corner),
            cat_multiplier: apply_scale(d.cat_multiplier, json.cat_multiplier),
            cat_pair: apply_scale(d.cat_pair, json.cat_pair),
            kitten_pair: apply_scale(d.kitten_pair, json.kitten_pair),
            two_way_threat: apply_scale(d.two_way_threat, json.two_way_threat),
            cat_value_first: apply_scale(d.cat_value_first, json.cat_value_first),
            cat_value_second: apply_scale(d.cat_value_second, json.cat_value_second),
            cat_value_third: apply_scale(d.cat_value_third, json.cat_value_third),
            cat_value_rest: apply_scale(d.cat_value_rest, json.cat_value_rest),
            win_score: json.win_score.map_or(d.win_score, |w| w.max(MIN_WIN_SCORE)),

            depth: json.depth.unwrap_or(d.depth),
            use_tt: json.use_tt.unwrap_or(d.use_tt),
            use_killers: json.use_killers.unwrap_or(d.use_killers),
            use_history: json.use_history.unwrap_or(d.use_history),
            use_iterative_deepening: json
                .use_iterative_deepening
                .unwrap_or(d.use_iterative_deepening),
            tt_size_mb: json.tt_size_mb.unwrap_or(d.tt_size_mb),

            score_hash_move: apply_scale(d.score_hash_move, json.score_hash_move),
            score_win: apply_scale(d.score_win, json.score_win),
            score_graduation: apply_scale(d.score_graduation, json.score_graduation),
            score_killer_move: apply_scale(d.score_killer_move, json.score_killer_move),
            score_history_max: apply_scale(d.score_history_max, json.score_history_max),
            order_center: apply_scale(d.order_center, json.order_center),
            order_inner: apply_scale(d.order_inner, json.order_inner),
            order_edge: apply_scale(d.order_edge, json.order_edge),
            order_corner: apply_scale(d.order_corner, json.order_corner),
            order_cat_bonus: apply_scale(d.order_cat_bonus, json.order_cat_bonus),
            order_knock_off: apply_scale(d.order_knock_off, json.order_knock_off),

            tier_win: json.tier_win.unwrap_or(d.tier_win),
            tier_block_win: json.tier_block_win.unwrap_or(d.tier_block_win),
            tier_graduate: json.tier_graduate.unwrap_or(d.tier_graduate),
            tier_block_graduate: json.tier_block_graduate.unwrap_or(d.tier_block_graduate),
            tie_break_win: json.tie_break_win.unwrap_or(d.tie_break_win),
            tie_break_block_win: json.tie_break_block_win.unwrap_or(d.tie_break_block_win),
            tie_break_graduate: json.tie_break_graduate.unwrap_or(d.tie_break_graduate),
            tie_break_block_graduate: json
                .tie_break_block_graduate
                .unwrap_or(d.tie_break_block_graduate),

            seed: json.seed.or(d.seed),
        })
    }

    /// Diminishing value of the `n`-th cat a color owns (1-based).
    #[must_use]
    pub const fn cat_value(&self, n: u8) -> i32 {
        match n {
            0 => 0,
            1 => self.cat_value_first,
            2 => self.cat_value_second,
            3 => self.cat_value_third,
            _ => self.cat_value_rest,
        }
    }
}

/// Smallest accepted win sentinel; evaluations stay well below it.
pub const MIN_WIN_SCORE: i32 = 100_000;

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn apply_scale(default_val: i32, scale: Option<f32>) -> i32 {
    scale.map_or(default_val, |s| (default_val as f32 * s) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_default() {
        let config = BotConfig::load_from_json("{}").unwrap();
        assert_eq!(config, BotConfig::default());
        assert_eq!(config.score_hash_move, 3_000_000);
    }

    #[test]
    fn test_load_config_scaled() {
        let json = r#"{
            "weight_center": 2.0,
            "score_hash_move": 0.5
        }"#;
        let config = BotConfig::load_from_json(json).unwrap();
        assert_eq!(config.weight_center, 60);
        assert_eq!(config.score_hash_move, 1_500_000);
        assert_eq!(config.weight_corner, -15);
    }

    #[test]
    fn test_load_config_invalid_json() {
        assert!(BotConfig::load_from_json("{ invalid json }").is_err());
        assert!(BotConfig::load_from_json(r#"{"tie_break_win": "coin"}"#).is_err());
    }

    #[test]
    fn test_load_config_knobs_taken_as_is() {
        let json = r#"{
            "depth": 5,
            "use_tt": false,
            "tt_size_mb": 4,
            "tier_block_graduate": false,
            "tie_break_graduate": "score",
            "seed": 42
        }"#;
        let config = BotConfig::load_from_json(json).unwrap();
        assert_eq!(config.depth, 5);
        assert!(!config.use_tt);
        assert_eq!(config.tt_size_mb, 4);
        assert!(!config.tier_block_graduate);
        assert_eq!(config.tie_break_graduate, TieBreak::Score);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_load_config_win_score_is_absolute() {
        let config = BotConfig::load_from_json(r#"{"win_score": 5000000}"#).unwrap();
        assert_eq!(config.win_score, 5_000_000);
        let config = BotConfig::load_from_json(r#"{"win_score": 10}"#).unwrap();
        assert_eq!(config.win_score, MIN_WIN_SCORE);
        assert!(BotConfig::load_from_json(r#"{"win_score": 0.01}"#).is_err());
    }

    #[test]
    fn test_load_config_edge_cases() {
        let json = r#"{
            "cat_pair": 0.0,
            "kitten_pair": -1.0
        }"#;
        let config = BotConfig::load_from_json(json).unwrap();
        assert_eq!(config.cat_pair, 0);
        assert_eq!(config.kitten_pair, -120);
    }

    #[test]
    fn test_deserialize_absolute_config() {
        let json = r#"{
            "cat_pair": 123,
            "depth": 2
        }"#;
        let config: BotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cat_pair, 123);
        assert_eq!(config.depth, 2);
        assert_eq!(config.kitten_pair, 120);
    }

    #[test]
    fn test_cat_value_diminishes() {
        let config = BotConfig::default();
        let values: Vec<i32> = (1..=5).map(|n| config.cat_value(n)).collect();
        assert!(values.windows(2).take(3).all(|w| w[0] > w[1]));
        assert_eq!(values[3], values[4]);
    }

    #[test]
    fn test_difficulty_presets() {
        let easy = Difficulty::Easy.config();
        assert_eq!(easy.depth, 1);
        assert!(!easy.use_tt);
        assert_eq!(easy.tie_break_graduate, TieBreak::Random);
        assert_eq!(Difficulty::Medium.config().depth, 2);
        let hard = Difficulty::Hard.config();
        assert_eq!(hard.depth, 4);
        assert!(hard.use_tt && hard.use_killers && hard.use_history);
        assert_eq!(Difficulty::Expert.config().depth, 5);
    }
}
