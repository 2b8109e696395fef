// src/main.rs
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::{collections::HashMap, path::PathBuf, sync::Arc};

use kube_contexts::{
    app::ContextManager,
    config::AppConfig,
    kubeconfig::YamlPersistence,
    subscription::{
        AvailableContextsProducer, Channel, ChannelHub, CurrentContextProducer, Dispatcher,
        SubscriptionRegistry,
    },
    types::{ConflictResolution, ContextEdit},
    ui::{self, LogNotifier, NotificationSink, TerminalNotifier},
    utils::logging::{ConsoleLogger, FileLogger, Logger, MultiLogger},
    web::{self, WebServerState},
};

#[derive(Parser)]
#[command(author, version, about = "Manage kubeconfig contexts", long_about = None)]
pub struct Args {
    #[arg(short, long, default_value = "kube_contexts.json")]
    pub config: String,
    #[arg(short, long)]
    pub debug: bool,
    /// Kubeconfig to operate on instead of $KUBECONFIG or ~/.kube/config
    #[arg(short, long)]
    pub kubeconfig: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all contexts
    List,
    /// Print the current context
    Current,
    /// Switch the current context
    Use { name: String },
    /// Delete a context and the clusters/users only it used
    Delete { name: String },
    /// Copy a context under a new suffixed name
    Duplicate { name: String },
    /// Rename or repoint a context
    Edit {
        name: String,
        #[arg(long = "name")]
        new_name: Option<String>,
        #[arg(long)]
        cluster: Option<String>,
        #[arg(long)]
        user: Option<String>,
        /// An empty value removes the namespace
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Show the contexts a file would import
    ImportPreview { file: String },
    /// Import contexts from another kubeconfig
    Import {
        file: String,
        names: Vec<String>,
        /// Replace the existing context with this name
        #[arg(long)]
        replace: Vec<String>,
        /// Keep the existing context and import under a new name
        #[arg(long)]
        keep_both: Vec<String>,
    },
    /// Write the effective settings to the config file
    Init,
    /// Serve the HTTP API and subscription streams
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn build_logger(config: &AppConfig, debug: bool) -> anyhow::Result<Arc<dyn Logger>> {
    let file_logger = FileLogger::new(&config.log_file, debug)
        .with_context(|| format!("cannot open log file {}", config.log_file))?;
    let mut loggers: Vec<Box<dyn Logger>> = vec![Box::new(file_logger)];
    if debug {
        loggers.push(Box::new(ConsoleLogger::new(true)));
    }
    Ok(Arc::new(MultiLogger::new(loggers)))
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn finish(applied: bool) -> anyhow::Result<()> {
    if !applied {
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(
    manager: Arc<ContextManager>,
    logger: Arc<dyn Logger>,
    port: u16,
) -> anyhow::Result<()> {
    let registry = Arc::new(SubscriptionRegistry::new());
    let hub = Arc::new(ChannelHub::new());
    let dispatcher = Arc::new(
        Dispatcher::new(Arc::clone(&registry), Arc::clone(&logger))
            .with_producer(
                Channel::AvailableContexts,
                Arc::new(AvailableContextsProducer::new(
                    Arc::clone(&manager),
                    hub.clone(),
                )),
            )
            .with_producer(
                Channel::CurrentContext,
                Arc::new(CurrentContextProducer::new(Arc::clone(&manager), hub.clone())),
            ),
    );
    let listeners = dispatcher.start(&manager)?;

    let state = WebServerState {
        port,
        manager,
        registry,
        hub,
        logger: Arc::clone(&logger),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let server = tokio::spawn(web::start_web_server(state, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    logger.log("Shutting down");
    let _ = shutdown_tx.send(());
    server.await??;

    for listener in listeners {
        listener.abort();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(&args.config)
        .with_context(|| format!("cannot read {}", args.config))?;
    if let Some(path) = args.kubeconfig.clone() {
        config.kubeconfig_path = Some(path);
    }

    if let Command::Init = args.command {
        config
            .save_to_file(&args.config)
            .with_context(|| format!("cannot write {}", args.config))?;
        println!("Wrote {}", args.config);
        return Ok(());
    }

    let logger = build_logger(&config, args.debug)?;
    let persistence = Arc::new(YamlPersistence::new(
        config.expanded_kubeconfig_path().map(PathBuf::from),
    ));

    let notifier: Arc<dyn NotificationSink> = match args.command {
        Command::Serve { .. } => Arc::new(LogNotifier::new(Arc::clone(&logger), config.assume_yes)),
        _ => Arc::new(TerminalNotifier),
    };

    let manager = Arc::new(ContextManager::new(
        persistence,
        notifier,
        Arc::clone(&logger),
    ));
    manager.load().await.context("cannot load kubeconfig")?;

    match args.command {
        Command::List => ui::render_contexts(&manager.available_contexts().await),
        Command::Current => match manager.current_context_summary().await {
            Some(current) => println!("{}", current.name),
            None => finish(false)?,
        },
        Command::Use { name } => finish(manager.set_current_context(&name).await)?,
        Command::Delete { name } => finish(manager.delete_context(&name).await)?,
        Command::Duplicate { name } => finish(manager.duplicate_context(&name).await)?,
        Command::Edit {
            name,
            new_name,
            cluster,
            user,
            namespace,
        } => {
            let snapshot = manager.snapshot().await;
            let existing = snapshot.find_context(&name);
            let edit = ContextEdit {
                name: new_name.unwrap_or_else(|| name.clone()),
                cluster: cluster
                    .or_else(|| existing.map(|c| c.context.cluster.clone()))
                    .unwrap_or_default(),
                user: user
                    .or_else(|| existing.map(|c| c.context.user.clone()))
                    .unwrap_or_default(),
                namespace: namespace.or_else(|| existing.and_then(|c| c.context.namespace.clone())),
            };
            finish(manager.edit_context(&name, edit).await)?
        }
        Command::ImportPreview { file } => {
            ui::render_import_candidates(&manager.get_import_contexts(&expand(&file)).await)
        }
        Command::Import {
            file,
            names,
            replace,
            keep_both,
        } => {
            let mut resolutions = HashMap::new();
            for name in keep_both {
                resolutions.insert(name, ConflictResolution::KeepBoth);
            }
            for name in replace {
                resolutions.insert(name, ConflictResolution::Replace);
            }
            let applied = manager
                .import_contexts_from_file(&expand(&file), &names, &resolutions)
                .await?;
            finish(applied)?
        }
        Command::Serve { port } => {
            serve(manager, logger, port.unwrap_or(config.port)).await?;
        }
        Command::Init => {}
    }

    Ok(())
}
