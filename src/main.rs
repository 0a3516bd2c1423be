use clap::Parser;
use fare_scout::domain::ports::Notifier;
use fare_scout::utils::error::ErrorSeverity;
use fare_scout::utils::{logger, validation::Validate};
use fare_scout::{
    AmadeusProvider, CliArgs, ConsoleNotifier, FareConfig, FareEngine, FarePipeline, TelegramNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting fare-scout");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match FareConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    config.apply_env_overrides();

    // 驗證配置：沒有可搜尋的組合就不呼叫任何 API
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No API calls will be made");
        for query in config.search_plan().combinations() {
            println!("  • {}", query.label());
        }
        return Ok(());
    }

    match run(&config, &args).await {
        Ok(_) => {
            tracing::info!("✅ Fare search completed successfully!");
        }
        Err(e) => {
            tracing::error!(
                "❌ Fare search failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: &FareConfig, args: &CliArgs) -> fare_scout::Result<String> {
    let (api_key, api_secret) = config.credentials()?;
    let provider =
        AmadeusProvider::authenticate(&config.provider.host, api_key, api_secret, config.timeout()).await?;

    let notifier: Box<dyn Notifier> = match (args.no_notify, config.telegram()) {
        (false, Some((token, chat_id))) => Box::new(
            TelegramNotifier::new(token, chat_id, config.timeout())?
                .with_api_base(config.notifier.telegram_api_base.as_str()),
        ),
        (false, None) => {
            tracing::warn!("📭 Telegram not configured; the report will be printed instead");
            Box::new(ConsoleNotifier)
        }
        (true, _) => Box::new(ConsoleNotifier),
    };

    let pipeline = FarePipeline::new(config.pipeline_settings(), provider, notifier);
    FareEngine::new(pipeline).run().await
}

fn display_config_summary(config: &FareConfig, args: &CliArgs) {
    let plan = config.search_plan();
    println!("📋 Configuration Summary:");
    println!("  Origins: {}", plan.origins.join(", "));
    println!("  Destinations: {}", plan.destinations.join(", "));
    println!("  Outbound dates: {}", plan.outbound_dates.len());
    if plan.return_dates.is_empty() {
        println!("  Return dates: none (one-way)");
    } else {
        println!("  Return dates: {}", plan.return_dates.len());
    }
    println!("  Combinations: {}", plan.combinations().len());
    println!(
        "  Passengers: {} adults, {} children",
        plan.adults, plan.children
    );
    if let Some(max_stops) = plan.max_stops {
        println!("  Max stops: {}", max_stops);
    }
    if let Some(hours) = plan.max_duration_hours {
        println!("  Max duration: {}h", hours);
    }
    if let Some(threshold) = config.report.price_threshold {
        println!("  Price threshold: {:.2} {}", threshold, plan.currency);
    }
    println!("  Results limit: {}", config.report.results_limit);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
}
