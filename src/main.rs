use anyhow::Context;
use clap::Parser;
use sigmos_launcher::utils::{logger, status, validation::Validate};
use sigmos_launcher::{CliArgs, LaunchReport, Launcher, LocalWorkspace, SystemExecutor};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入並驗證配置
    let config = match args.load_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            status::failure(&e.user_friendly_message());
            status::hint(&e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    logger::init_cli_logger(args.verbose, config.logging.format);
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let workspace = LocalWorkspace::new(config.working_dir.clone());
    let launcher = Launcher::new(config, workspace, SystemExecutor::new())
        .with_options(args.launch_options());

    let mut report = LaunchReport::new();
    let result = launcher.run_with_report(&mut report).await;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize launch report")?;
        println!("{}", json);
    }

    match result {
        Ok(outcome) => {
            let exit_code = outcome.exit_code();
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
        Err(e) => {
            status::failure(&e.user_friendly_message());
            status::hint(&e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
