use clap::Parser;
use dialoguer::Input;
use dotenv::dotenv;
use docflow_rs::adk::error::{DocflowError, WorkflowError};
use docflow_rs::adk::model::{create_model, Model};
use docflow_rs::docflow::collaborators::{
    ConsoleReviewer, FilePersister, LlmClassifier, LlmTransformer, LogNotifier, Notifier,
    WebhookNotifier,
};
use docflow_rs::docflow::config::{parse_provider, DocflowConfig};
use docflow_rs::docflow::document::{clean_input_path, TextLoader};
use docflow_rs::docflow::workflow::graph::RunEvent;
use docflow_rs::docflow::workflow::pipeline::{build_document_graph, process_document, Collaborators};
use docflow_rs::docflow::workflow::progress::{LogSink, ProgressSink, SpinnerSink};
use docflow_rs::docflow::workflow::state::NotificationStatus;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Classify, transform, review and deliver a document", long_about = None)]
struct Args {
    /// Document to process; prompted for when omitted
    file: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Model provider (cohere, openai, anthropic)
    #[arg(short, long)]
    provider: Option<String>,

    /// Directory for processed output files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Disable the live elapsed-time display
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = DocflowConfig::load(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(provider) = args.provider.as_deref() {
        config.provider = Some(parse_provider(provider)?);
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    println!("Document Processing Pipeline");
    println!("{}", "=".repeat(50));

    let file = match args.file {
        Some(file) => clean_input_path(&file),
        None => {
            let raw: String = Input::new()
                .with_prompt("Enter document path to process")
                .interact_text()?;
            clean_input_path(&raw)
        }
    };
    let path = PathBuf::from(file);
    if !path.exists() {
        eprintln!("❌ File not found: {}", path.display());
        std::process::exit(1);
    }

    let provider = config.resolved_provider();
    log::info!("Using provider: {:?} with model: {}", provider, config.model);
    let model: Arc<dyn Model> =
        create_model(provider, config.model.clone()).map_err(DocflowError::from)?;

    let notifier: Arc<dyn Notifier> =
        match config.notify.webhook_url.clone() {
            Some(url) => Arc::new(
                WebhookNotifier::new(url)
                    .with_recipient(config.notify.recipient.clone())
                    .with_model(model.clone(), config.notify.temperature),
            ),
            None => {
                log::warn!("No webhook configured; notifications are only logged");
                Arc::new(LogNotifier::new(Some(model.clone()), config.notify.temperature))
            }
        };

    let collaborators = Collaborators {
        classifier: Arc::new(LlmClassifier::new(model.clone(), config.temperature)),
        transformer: Arc::new(LlmTransformer::new(model.clone(), config.temperature)),
        persister: Arc::new(FilePersister::new(config.output_dir.clone())),
        notifier,
        reviewer: Arc::new(ConsoleReviewer),
    };

    let sink: Arc<dyn ProgressSink> = if args.no_progress {
        Arc::new(LogSink)
    } else {
        Arc::new(SpinnerSink::new())
    };

    let engine = build_document_graph(
        collaborators,
        config.step_settings(),
        sink,
        config.progress_interval(),
    )?;

    let (tx, mut rx) = mpsc::channel(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let RunEvent::NodeCompleted(node) = event {
                println!("✅ Completed step: {}", node);
            }
        }
    });

    // Dropping the run future on Ctrl-C drops any live overlay with it
    let result = tokio::select! {
        result = process_document(&path, &TextLoader, &engine, tx) => result,
        _ = tokio::signal::ctrl_c() => Err(DocflowError::Workflow(WorkflowError::Interrupted)),
    };
    let _ = printer.await;

    println!("\n{}", "=".repeat(50));
    match result {
        Ok(outcome) => {
            if let Some(location) = &outcome.state.output_location {
                println!("Saved to {}", location.display());
            }
            if let NotificationStatus::Failed(reason) = &outcome.state.notification {
                println!("⚠️  Notification failed: {}", reason);
            }
            log::info!("Visited: {}", outcome.trace.join(" -> "));
            println!("✅ Document processing pipeline completed successfully!");
            Ok(())
        }
        Err(e) if e.is_interrupt() => {
            println!("⚠️  Process interrupted by user");
            std::process::exit(130);
        }
        Err(e) => {
            println!("❌ Error in processing: {}", e);
            std::process::exit(1);
        }
    }
}
