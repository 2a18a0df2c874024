use clap::Parser;
use data_sanct::core::state::Session;
use data_sanct::domain::ports::CleaningApi;
use data_sanct::utils::{logger, validation::Validate};
use data_sanct::{
    AppController, AssetExporter, CliConfig, Dashboard, HttpCleaningApi, LocalStorage, SanctError,
    TaskState, UploadWidget,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

fn exit_with(e: &SanctError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        exit_with(&e);
    }
    let pacing = config.load_pacing().unwrap_or_else(|e| exit_with(&e));
    let api = HttpCleaningApi::with_timeout(&config.api_url, pacing.delays.request_timeout())
        .unwrap_or_else(|e| exit_with(&e));
    tracing::info!("Using cleaning service at {}", api.base_url());

    let controller = AppController::new(api, pacing);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut selection = config.files.clone();
    let mut failed = false;

    println!("DATA SANCT");
    println!("Sanctify your data. Amplify your intelligence.");

    loop {
        if selection.is_empty() {
            match prompt_path(&mut stdin).await? {
                Some(path) => selection = vec![path],
                None => break,
            }
        }

        controller.reset();
        let submitted = UploadWidget::submit(&selection, |file| controller.handle_upload(file)).await;
        selection.clear();

        match submitted {
            Ok(Some(task)) => tracing::debug!("Started {}", task),
            Ok(None) => break,
            Err(e) => {
                if !config.interactive {
                    exit_with(&e);
                }
                eprintln!("❌ {}", e.user_friendly_message());
                continue;
            }
        }

        let session = follow_task(&controller).await;
        match session.state {
            TaskState::Done => show_results(&controller, &config).await,
            _ => {
                failed = true;
                eprintln!("❌ The agent could not finish this task. Start a new task to try again.");
            }
        }

        if !config.interactive {
            break;
        }
    }

    if failed && !config.interactive {
        std::process::exit(2);
    }
    Ok(())
}

async fn prompt_path(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<PathBuf>> {
    print!("\nNew Task › path to a dataset or image (empty to quit): ");
    std::io::stdout().flush()?;

    let line = lines.next_line().await?;
    Ok(line
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .map(PathBuf::from))
}

/// Prints status lines as they arrive until the task settles.
async fn follow_task<A: CleaningApi>(controller: &AppController<A>) -> Session {
    let mut status = controller.status();
    let mut phase = None;
    let mut printed = 0;

    let settled = controller.wait_settled();
    tokio::pin!(settled);

    loop {
        tokio::select! {
            session = &mut settled => return session,
            changed = status.changed() => {
                if changed.is_err() {
                    return (&mut settled).await;
                }

                let view = status.borrow_and_update().clone();
                if view.phase != phase {
                    phase = view.phase;
                    printed = 0;
                    if let Some(current) = phase {
                        println!();
                        println!(
                            "🤖 AI Agent Active [{}] · Process ID: {}",
                            current,
                            view.process_id.as_deref().unwrap_or("-")
                        );
                    }
                }

                for line in view.lines.iter().skip(printed) {
                    println!("{}", line);
                }
                printed = view.lines.len();
            }
        }
    }
}

async fn show_results<A: CleaningApi>(controller: &AppController<A>, config: &CliConfig) {
    let Some(task) = controller.completed() else {
        return;
    };

    let dashboard = Dashboard::from_completed(&task, |path| controller.api().asset_url(path));
    println!();
    print!("{}", dashboard);

    if !config.download && !config.archive {
        return;
    }

    let exporter = AssetExporter::new(controller.api(), LocalStorage::new(&config.output_path));
    if config.download {
        match exporter.download(&task).await {
            Ok(name) => println!("📁 Saved {}/{}", config.output_path, name),
            Err(e) => {
                tracing::error!("Download failed: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
        }
    }
    if config.archive {
        match exporter.archive(&task, &dashboard).await {
            Ok(name) => println!("📦 Archived {}/{}", config.output_path, name),
            Err(e) => {
                tracing::error!("Archive failed: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
        }
    }
}
