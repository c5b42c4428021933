//! OneThing CLI entrypoint.
//!
//! This is the main entrypoint for the onething command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use onething_pilot::cli::{
    Cli, Commands, ImageCommands, InstanceCommands, OutputFormatter, ScaleCommands,
};
use onething_pilot::config::{ConfigParser, ConfigValidator, PilotConfig, ValidationResult};
use onething_pilot::error::Result;
use onething_pilot::onething::{
    CustomPort, InstanceConfig, OneThingClient, QueryBill, QueryInstances, QueryPrivateImage,
    QueryPublishImage, QueryResources,
};
use onething_pilot::scaling::{AutoscalingEvaluator, Metrics};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// Logs go to stderr so that stdout only carries command output.
fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let config_path = cli.config.as_deref();

    let parser = ConfigParser::new().with_base_path(
        config_path
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;
    let config = parser.load(config_path)?;
    let validation = ConfigValidator::new().validate(&config)?;
    debug!("Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Validate { warnings } => {
            cmd_validate(&config, &validation, warnings, &formatter)
        }
        Commands::Images { command } => cmd_images(&config, command, &formatter).await,
        Commands::Resources {
            image_id,
            gpu_type,
            region,
        } => cmd_resources(&config, &image_id, gpu_type, region, &formatter).await,
        Commands::Instances { command } => cmd_instances(&config, command, &formatter).await,
        Commands::Wallet => cmd_wallet(&config, &formatter).await,
        Commands::Orders {
            page,
            page_size,
            app_id,
            business_type,
        } => {
            let mut query = QueryBill::new(page, page_size)?;
            if let Some(app_id) = app_id {
                query = query.with_app_id(&app_id);
            }
            if let Some(business_type) = business_type {
                query = query.with_business_type(business_type.into());
            }
            let orders = create_client(&config)?.consumption_records(&query).await?;
            emit(&formatter.format_orders(&orders))
        }
        Commands::Scale { command } => cmd_scale(&config, command, &formatter),
    }
}

/// Validate configuration.
fn cmd_validate(
    config: &PilotConfig,
    result: &ValidationResult,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    emit(&formatter.success("Configuration is valid"))?;

    if show_warnings {
        for warning in &result.warnings {
            emit(&formatter.warning(warning))?;
        }
    }

    eprintln!("\nConfiguration summary:");
    eprintln!("  Base URL: {}", config.api.base_url);
    eprintln!("  Attempts per call: {}", config.api.max_retries);
    eprintln!("  Timeout: {}s", config.api.timeout_secs);
    eprintln!(
        "  Scaling thresholds: cpu {}%, memory {}%",
        config.scaling.cpu_threshold, config.scaling.memory_threshold
    );

    Ok(())
}

/// Browse images.
async fn cmd_images(
    config: &PilotConfig,
    command: ImageCommands,
    formatter: &OutputFormatter,
) -> Result<()> {
    let client = create_client(config)?;

    match command {
        ImageCommands::Private { region, name } => {
            let mut query = QueryPrivateImage::new();
            if let Some(region) = region {
                query = query.with_region_id(region);
            }
            if let Some(name) = name {
                query = query.with_name(&name);
            }
            let images = client.list_private_images(&query).await?;
            emit(&formatter.format_private_images(&images))
        }
        ImageCommands::Public { name, author } => {
            let mut query = QueryPublishImage::new();
            if let Some(name) = name {
                query = query.with_name(&name);
            }
            if let Some(author) = author {
                query = query.with_author(&author);
            }
            let images = client.list_published_images(&query).await?;
            emit(&formatter.format_published_images(&images))
        }
    }
}

/// List resources available for an image.
async fn cmd_resources(
    config: &PilotConfig,
    image_id: &str,
    gpu_type: Option<String>,
    region: Option<u32>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut query = QueryResources::new(image_id)?;
    if let Some(gpu_type) = gpu_type {
        query = query.with_gpu_type(&gpu_type);
    }
    if let Some(region) = region {
        query = query.with_region_id(region);
    }

    let resources = create_client(config)?.list_resources(&query).await?;
    emit(&formatter.format_resources(&resources))
}

/// Manage instances.
async fn cmd_instances(
    config: &PilotConfig,
    command: InstanceCommands,
    formatter: &OutputFormatter,
) -> Result<()> {
    let client = create_client(config)?;

    match command {
        InstanceCommands::List {
            page,
            page_size,
            app_id,
            group_id,
        } => {
            let mut query = QueryInstances::new(page, page_size)?;
            if let Some(app_id) = app_id {
                query = query.with_app_id(&app_id);
            }
            if let Some(group_id) = group_id {
                query = query.with_group_id(&group_id);
            }
            let instances = client.list_instances(&query).await?;
            emit(&formatter.format_instances(&instances))
        }
        InstanceCommands::Create {
            image,
            gpu_type,
            gpu_num,
            region,
            bill_type,
            duration,
            group_id,
            ports,
        } => {
            let mut instance = InstanceConfig::new(&image, &gpu_type, gpu_num, region)?
                .with_bill_type(bill_type.into());
            if let Some(duration) = duration {
                instance = instance.with_duration(duration);
            }
            if let Some(group_id) = group_id {
                instance = instance.with_group_id(&group_id);
            }
            for port in &ports {
                instance = instance.with_port(CustomPort::parse(port)?);
            }

            info!("Creating {} x {} instance from image {}", gpu_num, gpu_type, image);
            let created = client.create_instance(&instance).await?;
            emit(&formatter.format_created(&created))
        }
        InstanceCommands::Start { app_id } => {
            client.start_instance(&app_id).await?;
            emit(&formatter.success(&format!("Boot requested for instance {app_id}")))
        }
        InstanceCommands::Stop { app_id } => {
            client.stop_instance(&app_id).await?;
            emit(&formatter.success(&format!("Shutdown requested for instance {app_id}")))
        }
        InstanceCommands::Delete { app_id, yes } => {
            if !yes && !confirm(&format!("Release instance {app_id}? This cannot be undone."))? {
                eprintln!("Delete cancelled.");
                return Ok(());
            }
            client.delete_instance(&app_id).await?;
            emit(&formatter.success(&format!("Release requested for instance {app_id}")))
        }
    }
}

/// Show the wallet summary.
async fn cmd_wallet(config: &PilotConfig, formatter: &OutputFormatter) -> Result<()> {
    let wallet = create_client(config)?.wallet_detail().await?;
    emit(&formatter.format_wallet(&wallet))
}

/// Evaluate the autoscaling policy.
fn cmd_scale(
    config: &PilotConfig,
    command: ScaleCommands,
    formatter: &OutputFormatter,
) -> Result<()> {
    match command {
        ScaleCommands::Check { cpu, memory } => {
            let metrics = Metrics::new(cpu, memory);
            let mut evaluator = AutoscalingEvaluator::new(config.scaling.policy());
            let decision = evaluator.decide_at(&metrics, Instant::now());
            emit(&formatter.format_decision(&metrics, decision))
        }
    }
}

/// Creates the API client from configuration and the environment.
fn create_client(config: &PilotConfig) -> Result<OneThingClient> {
    let api_key = ConfigParser::get_api_key()?;
    OneThingClient::with_settings(config.api.transport_settings(&api_key))
}

/// Asks for confirmation on stderr.
fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt} [y/N]: ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Writes command output to stdout.
fn emit(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}
