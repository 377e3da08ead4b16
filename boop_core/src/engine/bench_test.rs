#[cfg(test)]
mod tests {
    use crate::engine::config::BotConfig;
    use crate::engine::search::AlphaBetaEngine;
    use crate::engine::Searcher;
    use crate::logic::board::Color;
    use crate::logic::simulator::Position;
    use std::sync::Arc;

    fn bench(label: &str, position: &Position, config: BotConfig) {
        println!("--- Benchmarking {label} ---");
        let depth = config.depth;
        let mut engine = AlphaBetaEngine::new(Arc::new(config));

        // Warmup
        engine.search(position, 1, &[]);

        let start = std::time::Instant::now();
        let result = engine.search(position, depth, &[]);
        let duration = start.elapsed();

        if let Some((mv, stats)) = result {
            println!("{label} depth {depth}: {mv} {stats:?}");
            println!("Time taken: {duration:?}");
            #[allow(
                clippy::cast_precision_loss,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss
            )]
            let nps = (f64::from(stats.nodes) / duration.as_secs_f64().max(1e-9)) as u64;
            println!("NPS: {nps}");
        } else {
            panic!("Search returned None");
        }
    }

    #[test]
    fn bench_opening() {
        let config = BotConfig {
            depth: 3,
            seed: Some(1),
            ..BotConfig::default()
        };
        bench("Opening", &Position::new(), config);
    }

    #[test]
    fn bench_midgame() {
        let mut position =
            Position::from_notation("6/1og3/2Og2/1g1o2/4G1/6", Color::Orange).unwrap();
        // Each side holds one more cat in reserve.
        for pool in &mut position.pools {
            pool.cats += 1;
            pool.retired += 1;
            pool.kittens -= 1;
        }
        let config = BotConfig {
            depth: 3,
            seed: Some(1),
            ..BotConfig::default()
        };
        bench("Midgame", &position, config);
    }

    #[test]
    fn bench_without_accelerants() {
        let config = BotConfig {
            depth: 2,
            use_tt: false,
            use_killers: false,
            use_history: false,
            use_iterative_deepening: false,
            seed: Some(1),
            ..BotConfig::default()
        };
        bench("Plain alpha-beta", &Position::new(), config);
    }
}
