use anyhow::Context;
use circuit_portal::utils::error::ErrorSeverity;
use circuit_portal::utils::{logger, validation::Validate};
use circuit_portal::{
    AddressList, CircuitRecord, CliConfig, Command, PortalConfig, PortalError, TracingNotifier,
    WorkflowController,
};
use circuit_portal::{CircuitRepository, NotificationSink};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入配置 (未指定時使用內建示範資料)
    let config = match &cli.config {
        Some(path) => PortalConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path))?,
        None => PortalConfig::demo(),
    };

    // 初始化日誌
    let verbose = cli.verbose || config.verbose();
    if cli.json || config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting {}", config.portal.name);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let controller = WorkflowController::with_settings(
        config.build_repository(),
        TracingNotifier,
        config.workflow_settings(),
    );

    match run(&controller, cli.command).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 4,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run<R, N>(
    controller: &WorkflowController<R, N>,
    command: Command,
) -> Result<CircuitRecord, PortalError>
where
    R: CircuitRepository,
    N: NotificationSink,
{
    match command {
        Command::Search { query } => Ok(controller.search(&query).await?),
        Command::Edit {
            service_number,
            assignments,
        } => {
            controller.search(&service_number).await?;
            controller.begin_edit().await?;
            for (field, value) in assignments {
                controller.update_draft(field, value).await?;
            }
            Ok(controller.commit().await?)
        }
        Command::Register {
            mode,
            lan,
            wan,
            assignments,
        } => {
            controller.begin_registration().await?;
            controller.select_ip_mode(mode).await?;
            for (list, addresses) in [(AddressList::Lan, lan), (AddressList::Wan, wan)] {
                for (index, address) in addresses.into_iter().enumerate() {
                    if index > 0 {
                        controller.add_address(list).await?;
                    }
                    controller.set_address(list, index, address).await?;
                }
            }
            for (field, value) in assignments {
                controller.update_draft(field, value).await?;
            }
            Ok(controller.commit().await?)
        }
    }
}
