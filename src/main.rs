use clap::Parser;
use hvac_scout::core::sink::output_file_name;
use hvac_scout::utils::error::ErrorSeverity;
use hvac_scout::utils::{logger, validation::Validate};
use hvac_scout::{
    AnthropicOracle, AppConfig, CliArgs, ComponentSink, ExtractionAdapter, HttpPageRenderer,
    LocalStorage, ManufacturerOrchestrator, ReferenceDataLoader, ScoutError, ScrapeEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.log_format);

    tracing::info!("🚀 Starting hvac-scout");

    let config = match args.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    if args.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    let engine = match build_engine(&config, args.monitor) {
        Ok(engine) => engine,
        Err(e) => exit_with(&e),
    };

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No websites will be opened");
        match engine.load_reference_data().await {
            Ok(reference) => {
                println!("Input directory:  {}", config.input_dir.display());
                println!("Output directory: {}", config.output_dir.display());
                println!("Model:            {} (max {} tokens)", config.model, config.max_tokens);
                println!("Component types:  {}", reference.component_types.len());
                for manufacturer in engine.select_manufacturers(&reference) {
                    println!(
                        "  {} <{}> -> {}",
                        manufacturer.name,
                        manufacturer.website_url,
                        output_file_name(&manufacturer.name)
                    );
                }
                return Ok(());
            }
            Err(e) => exit_with(&e),
        }
    }

    if let Err(e) = engine.run().await {
        exit_with(&e);
    }

    tracing::info!("✅ Run finished, output in {}", config.output_dir.display());
    Ok(())
}

type Engine = ScrapeEngine<HttpPageRenderer, AnthropicOracle, LocalStorage>;

fn build_engine(config: &AppConfig, monitor: bool) -> hvac_scout::Result<Engine> {
    let oracle = AnthropicOracle::new(&config.api_key, &config.model, &config.oracle_base_url)?;
    let orchestrator = ManufacturerOrchestrator::new(
        HttpPageRenderer::new(config.user_agent.clone()),
        ExtractionAdapter::new(oracle, config.max_tokens, config.max_page_chars),
        ComponentSink::new(LocalStorage::new(config.output_dir.clone())),
    )
    .with_navigation_timeout(config.navigation_timeout());

    let loader = ReferenceDataLoader::with_files(
        LocalStorage::new(config.input_dir.clone()),
        &config.manufacturers_file,
        &config.component_types_file,
    );

    Ok(ScrapeEngine::new_with_monitoring(loader, orchestrator, monitor).with_filter(config.only.clone()))
}

fn exit_with(e: &ScoutError) -> ! {
    tracing::error!(
        "❌ hvac-scout failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
