//! Snowball control-plane daemon and CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use snowball::api::{AppState, create_router};
use snowball::audit::AuditLogger;
use snowball::config::Settings;
use snowball::discovery::{self, DiscoveryResponder};
use snowball::identity::local_identity;
use snowball::pairing::{ApprovalGate, AutoApproval, ConsoleApproval, PairingCoordinator};
use snowball::policy::ResourcePolicy;
use snowball::resources::ResourceController;
use snowball::sandbox::SandboxManager;
use snowball::trust::TrustStore;
use snowball_protocol::ResourceRequest;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Snowball - host-side control plane for LAN pairing and bounded compute grants.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the control plane: discovery responder plus HTTP facade
    Serve,
    /// Broadcast a discovery probe and print the peers that answered
    Discover {
        /// Collection window in milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
    /// Create and approve a pairing for a remote host
    Pair {
        #[arg(long)]
        host_id: String,
        #[arg(long)]
        hostname: Option<String>,
        #[arg(long)]
        ip: Option<String>,
        /// Approve without the interactive prompt
        #[arg(short = 'y', long = "yes")]
        assume_yes: bool,
    },
    /// Print pairing status from the local trust store
    Status {
        #[arg(long)]
        host_id: Option<String>,
    },
    /// Print local enforcement capabilities
    Capabilities,
    /// Grant resources and launch a command in the sandbox
    Launch {
        /// CPU share in percent (0-100)
        #[arg(long, default_value_t = 100)]
        cpu: u16,
        /// Memory ceiling in MiB (0 = no ceiling)
        #[arg(long = "ram-mb", default_value_t = 0)]
        ram_mb: u64,
        /// GPU layers to offload
        #[arg(long = "gpu-layers")]
        gpu_layers: Option<u32>,
        /// Command to run
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.common);

    let settings = Settings::load(cli.common.config.as_deref())?;

    match cli.command {
        Command::Serve => serve(settings).await,
        Command::Discover { timeout_ms } => discover(settings, timeout_ms).await,
        Command::Pair {
            host_id,
            hostname,
            ip,
            assume_yes,
        } => pair(settings, host_id, hostname, ip, assume_yes).await,
        Command::Status { host_id } => status(settings, host_id).await,
        Command::Capabilities => capabilities(),
        Command::Launch {
            cpu,
            ram_mb,
            gpu_layers,
            command,
        } => launch(settings, cpu, ram_mb, gpu_layers, command).await,
    }
}

fn init_logging(common: &CommonOpts) {
    let default_level = if common.debug || common.verbose >= 2 {
        "debug"
    } else if common.verbose == 1 {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("SNOWBALL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("snowball={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(settings: Settings) -> Result<()> {
    let state_dir = settings.state_dir();
    let audit = AuditLogger::open(settings.audit_log_path()).await?;
    let identity = local_identity(settings.node.role, &state_dir)?;
    tracing::info!(
        node_id = %identity.node_id,
        hostname = %identity.hostname,
        role = identity.role.as_str(),
        "local identity ready"
    );

    let (store, report) = TrustStore::load(settings.trust_dir());
    if report.any_corrupt() {
        audit
            .log("trust.store_corrupt", serde_json::to_value(report)?)
            .await;
    }
    let store = Arc::new(store);

    // The facade's approve endpoint carries the operator decision, so the
    // in-process gate must not second-guess it.
    let gate: Arc<dyn ApprovalGate> = if settings.pairing.auto_approve {
        Arc::new(AutoApproval::granted())
    } else {
        Arc::new(AutoApproval::denied())
    };
    let coordinator = Arc::new(PairingCoordinator::new(store, gate, audit.clone()));
    let controller = Arc::new(ResourceController::new(ResourcePolicy::local(), audit.clone()));
    let sandbox = Arc::new(SandboxManager::new(audit.clone()));

    // Discovery responder: best-effort. A bind failure (port in use, no
    // privilege) must not take the control plane down.
    if settings.discovery.responder_enabled {
        match DiscoveryResponder::bind(&identity, settings.discovery.port).await {
            Ok(responder) => {
                tracing::info!(port = settings.discovery.port, "discovery responder active");
                tokio::spawn(responder.run());
            }
            Err(err) => {
                tracing::warn!("discovery responder not started: {err:#}");
            }
        }
    }

    let state = AppState {
        identity,
        coordinator,
        controller,
        sandbox,
        discovery_port: settings.discovery.port,
        broadcast_timeout: Duration::from_millis(settings.discovery.broadcast_timeout_ms),
    };
    let router = create_router(state);

    let listener = TcpListener::bind(&settings.api.bind)
        .await
        .with_context(|| format!("binding API listener on {}", settings.api.bind))?;
    tracing::info!(bind = %settings.api.bind, "control-plane API listening");
    axum::serve(listener, router).await.context("serving API")
}

async fn discover(settings: Settings, timeout_ms: Option<u64>) -> Result<()> {
    let timeout =
        Duration::from_millis(timeout_ms.unwrap_or(settings.discovery.broadcast_timeout_ms));
    let peers = discovery::broadcast(settings.discovery.port, timeout).await?;
    println!("{}", serde_json::to_string_pretty(&peers)?);
    Ok(())
}

async fn pair(
    settings: Settings,
    host_id: String,
    hostname: Option<String>,
    ip: Option<String>,
    assume_yes: bool,
) -> Result<()> {
    let audit = AuditLogger::open(settings.audit_log_path()).await?;
    let (store, _) = TrustStore::load(settings.trust_dir());

    let gate: Arc<dyn ApprovalGate> = if assume_yes {
        Arc::new(AutoApproval::granted())
    } else {
        Arc::new(ConsoleApproval)
    };
    let coordinator = PairingCoordinator::new(Arc::new(store), gate, audit);

    let request = coordinator
        .create_request(&json!({
            "host_id": host_id,
            "hostname": hostname,
            "ip": ip,
        }))
        .await;
    let approved = coordinator.approve(&request.request_id).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "request_id": request.request_id,
            "host_id": request.host_id,
            "approved": approved,
        }))?
    );
    Ok(())
}

async fn status(settings: Settings, host_id: Option<String>) -> Result<()> {
    let (store, report) = TrustStore::load(settings.trust_dir());
    if report.any_corrupt() {
        eprintln!("warning: trust store corrupt, previously trusted peers were dropped");
    }
    let coordinator = PairingCoordinator::new(
        Arc::new(store),
        Arc::new(AutoApproval::denied()),
        AuditLogger::disabled(),
    );
    let status = coordinator.status(host_id.as_deref()).await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn capabilities() -> Result<()> {
    let controller = ResourceController::new(ResourcePolicy::local(), AuditLogger::disabled());
    println!(
        "{}",
        serde_json::to_string_pretty(&controller.capabilities())?
    );
    Ok(())
}

async fn launch(
    settings: Settings,
    cpu: u16,
    ram_mb: u64,
    gpu_layers: Option<u32>,
    command: Vec<String>,
) -> Result<()> {
    let audit = AuditLogger::open(settings.audit_log_path()).await?;
    let controller = ResourceController::new(ResourcePolicy::local(), audit.clone());
    let sandbox = SandboxManager::new(audit);

    let request = ResourceRequest::new(cpu, ram_mb, gpu_layers)?;
    let grant = controller.grant(&request).await?;
    let handle = sandbox.launch(&command, &grant).await?;

    println!("{}", serde_json::to_string_pretty(&handle)?);
    Ok(())
}
