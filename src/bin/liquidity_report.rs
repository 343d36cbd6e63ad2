//! Liquidity Report - Regime, prediction and scan report for a set of markets
//!
//! This binary:
//! 1. Loads config.json (and .env overrides); an invalid file aborts the run
//! 2. Builds historical spread profiles for every configured market
//! 3. Classifies each market's current liquidity regime
//! 4. Predicts the next thin-liquidity window and confirms across timeframes
//! 5. Scans and ranks markets by opportunity score
//!
//! Usage:
//!   cargo run --bin liquidity_report
//!
//! Uses the REST source when `api_base_url` (or LIQUIDITY_API_URL) is set,
//! the CSV archive under `data_directory` otherwise.

use liquidity_regime::{
    init_logging, AnalyzerConfig, CsvDataSource, LiquidityAnalyzer, MarketDataSource, ProfileCache,
    RestDataSource,
};

const BANNER: &str = "═══════════════════════════════════════════════════════════";

/// Below this many observations a profile is reported as unreliable
const MIN_REPORT_SAMPLES: usize = 168;

async fn report<S: MarketDataSource>(source: S, config: AnalyzerConfig) -> anyhow::Result<()> {
    let fees = config.fees;
    let analyzer = LiquidityAnalyzer::new(source, fees, config)?;
    let config = analyzer.config();
    let now_ms = chrono::Utc::now().timestamp_millis();

    println!("Building profiles ({} days lookback)...", config.lookback_days);
    let mut cache = ProfileCache::new();
    let built = analyzer.warm_cache(&config.markets, &mut cache, now_ms).await;
    println!("✓ Built {}/{} profiles\n", built, config.markets.len());

    for market_id in &config.markets {
        println!("{}", BANNER);
        println!("   {}", market_id);
        println!("{}", BANNER);

        if let Some(profile) = cache.get(market_id) {
            println!("Global baseline: {}", profile.global().spread);
            if let Err(e) = profile.ensure_samples(MIN_REPORT_SAMPLES) {
                println!("⚠ Warning: {}. Results may be unreliable.", e);
            }
            if let Some(premium) = profile.weekend_premium() {
                println!("Weekend premium: {:.2}x", premium);
            }
        }

        match analyzer.classify(market_id, &cache).await {
            Ok(result) => {
                println!("Regime:     {} ({})", result.regime, result.regime.description());
                println!("{}", result);
            }
            Err(e) => println!("⚠ Classification failed: {}", e),
        }

        match analyzer.predict_next(market_id, config.horizon_hours, &cache, now_ms) {
            Some(window) => println!("Next window: {}\n  {}", window, window.rationale),
            None => println!("Next window: none within {}h", config.horizon_hours),
        }

        match analyzer.confirm(market_id, now_ms).await {
            Ok(confirmation) => {
                for (timeframe, label) in &confirmation.per_timeframe {
                    println!("  {:>4}: {}", timeframe, label);
                }
                let status = if confirmation.is_confirmed(config.min_agreement) {
                    "CONFIRMED"
                } else {
                    "UNCONFIRMED"
                };
                match confirmation.majority {
                    Some(label) => println!(
                        "Multi-timeframe: {} {} ({:.0}% agreement)",
                        status,
                        label,
                        confirmation.agreement * 100.0
                    ),
                    None => println!("Multi-timeframe: no data"),
                }
            }
            Err(e) => println!("⚠ Confirmation failed: {}", e),
        }
        println!();
    }

    println!("{}", BANNER);
    println!(
        "Scan (spread >= {:.2}%, net profit >= {:.2}%):",
        config.min_spread_pct, config.min_net_profit_pct
    );
    println!("{}", BANNER);

    let ranked = analyzer
        .scan_and_rank(&config.markets, config.min_spread_pct, config.min_net_profit_pct, &cache)
        .await;

    if ranked.is_empty() {
        println!("No market passes the filters.");
    }
    for (i, opportunity) in ranked.iter().enumerate() {
        println!(
            "{:>2}. {:<32} score {:>3}  spread {:>6.2}%  net {:>6.2}%  pct {:>5.1}  {}",
            i + 1,
            opportunity.market_id,
            opportunity.score,
            opportunity.spread_pct,
            opportunity.net_profit_pct,
            opportunity.spread_percentile,
            opportunity.regime
        );
    }

    println!("\n✓ Report complete!");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    println!("{}", BANNER);
    println!("   Liquidity Regime Report");
    println!("{}\n", BANNER);

    let mut config = AnalyzerConfig::load_or_default("config.json")?;
    let api_key = config.apply_env();

    if config.markets.is_empty() {
        println!("⚠ No markets configured. Add a \"markets\" list to config.json.");
        return Ok(());
    }

    println!("Configuration:");
    println!("  Markets:          {}", config.markets.join(", "));
    println!("  Timezone:         UTC{:+}", config.tz_offset_hours);
    println!("  Profile interval: {}", config.profile_timeframe);
    println!("  Fees:             maker {:.2}% / taker {:.2}%\n", config.fees.maker_fee_pct, config.fees.taker_fee_pct);

    match config.api_base_url.clone() {
        Some(base_url) => {
            println!("Source: REST ({})\n", base_url);
            let source = RestDataSource::new(&base_url, api_key, config.categories.clone())?
                .with_depth_levels(config.depth_levels);
            report(source, config).await
        }
        None => {
            println!("Source: CSV ({})\n", config.data_directory);
            let source = CsvDataSource::new(&config.data_directory, config.categories.clone());
            report(source, config).await
        }
    }
}
