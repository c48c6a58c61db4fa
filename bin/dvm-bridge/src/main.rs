//! dvm-bridge binary
//!
//! Runs the VM execution bridge next to an external Move-style VM, and
//! offers compiler tooling against the same VM endpoints.

use clap::{Args, Parser, Subcommand, ValueEnum};
use dvm_primitives::{ContractKind, SourceFile, VmAddress};
use dvm_rpc::{start_ds_rpc_server, VmApi};
use dvm_storage::{CommittedStore, DvmStorage, KeyScheme};
use dvm_vm::{compiler, DsServer, RpcVmClient, TypeDecoders, VmConfig, VmKeeper};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

/// dvm-bridge command line arguments
#[derive(Debug, Parser)]
#[clap(name = "dvm-bridge", about = "dvm-bridge - Ledger to VM execution bridge")]
struct Cli {
    /// Log level
    #[clap(long, global = true, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the data-source endpoint and the REST API
    Serve(ServeArgs),
    /// Compile a module or script through the compiler endpoint
    Compile(CompileArgs),
    /// Print the argument types of a compiled script
    Signature(SignatureArgs),
}

/// VM endpoint settings shared by every command
#[derive(Debug, Args)]
struct VmArgs {
    /// JSON config file, flags override its values
    #[clap(long)]
    config: Option<PathBuf>,

    /// VM JSON-RPC URL
    #[clap(long)]
    vm_address: Option<String>,

    /// Data-source listen address
    #[clap(long)]
    data_listen: Option<SocketAddr>,

    /// Compiler JSON-RPC URL
    #[clap(long)]
    compiler: Option<String>,

    /// Storage key layout (canonical or legacy)
    #[clap(long)]
    key_scheme: Option<KeyScheme>,

    /// Transport timeout of one VM request in seconds
    #[clap(long)]
    request_timeout_secs: Option<u64>,
}

impl VmArgs {
    fn load(&self) -> eyre::Result<VmConfig> {
        let mut config = match &self.config {
            Some(path) => VmConfig::load(path)?,
            None => VmConfig::default(),
        };

        if let Some(vm_address) = &self.vm_address {
            config.vm_address = vm_address.clone();
        }
        if let Some(data_listen) = self.data_listen {
            config.data_listen = data_listen;
        }
        if let Some(compiler) = &self.compiler {
            config.compiler_address = compiler.clone();
        }
        if let Some(key_scheme) = self.key_scheme {
            config.key_scheme = key_scheme;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }

        Ok(config)
    }
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[clap(flatten)]
    vm: VmArgs,

    /// Data directory
    #[clap(long, default_value = "./data")]
    datadir: PathBuf,

    /// REST API port
    #[clap(long, default_value = "9845")]
    api_port: u16,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKind {
    Module,
    Script,
}

impl From<SourceKind> for ContractKind {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Module => Self::Module,
            SourceKind::Script => Self::Script,
        }
    }
}

#[derive(Debug, Args)]
struct CompileArgs {
    #[clap(flatten)]
    vm: VmArgs,

    /// Source file
    source: PathBuf,

    /// Account the source is compiled for, zero address when unset
    #[clap(long)]
    address: Option<String>,

    #[clap(long, value_enum, default_value = "script")]
    kind: SourceKind,

    /// Write the compiled code here instead of stdout
    #[clap(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SignatureArgs {
    #[clap(flatten)]
    vm: VmArgs,

    /// Compiled code file produced by `compile`
    code: PathBuf,
}

/// Compiled code file format
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct CodeFile {
    /// Hex encoded bytecode
    code: String,
}

impl CodeFile {
    fn new(bytecode: &[u8]) -> Self {
        Self { code: hex::encode(bytecode) }
    }

    fn read(path: &Path) -> eyre::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn bytecode(&self) -> eyre::Result<Vec<u8>> {
        Ok(hex::decode(self.code.strip_prefix("0x").unwrap_or(&self.code))?)
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Compile(args) => compile(args).await,
        Command::Signature(args) => signature(args).await,
    }
}

async fn serve(args: ServeArgs) -> eyre::Result<()> {
    let config = args.vm.load()?;

    tracing::info!("====================================");
    tracing::info!("  Starting dvm-bridge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("====================================");
    tracing::info!(vm = %config.vm_address, "VM endpoint");
    tracing::info!(key_scheme = %config.key_scheme, "Storage key layout");
    tracing::info!("Data directory: {}", args.datadir.display());

    let storage = DvmStorage::new(&args.datadir)?;
    if storage.is_new_database() {
        tracing::info!("Fresh VM state database created");
        storage.mark_initialized();
    }

    let ds = DsServer::with_default_middlewares();
    let (ds_handle, ds_addr) = start_ds_rpc_server(ds.clone(), config.data_listen).await?;

    let client = RpcVmClient::from_config(&config)?;
    let keeper = Arc::new(VmKeeper::new(Arc::new(client), ds, TypeDecoders::default()));

    let state: Arc<dyn CommittedStore> = storage.state.clone();
    let app = VmApi::new(state, config.key_scheme, keeper).routes();

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], args.api_port)))
        .await?;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "REST API server error");
        }
    });

    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  - Data source: http://{}", ds_addr);
    tracing::info!("  - REST API:    http://127.0.0.1:{}", args.api_port);
    tracing::info!("  - Health:      http://127.0.0.1:{}/health", args.api_port);
    tracing::info!("");
    tracing::info!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down dvm-bridge...");

    api_handle.abort();
    ds_handle.stop()?;

    tracing::info!("dvm-bridge stopped.");
    Ok(())
}

async fn compile(args: CompileArgs) -> eyre::Result<()> {
    let config = args.vm.load()?;
    let client = RpcVmClient::compiler(&config)?;

    let source = SourceFile {
        text: std::fs::read_to_string(&args.source)?,
        address: match &args.address {
            Some(address) => VmAddress::from_hex_lenient(address)?,
            None => VmAddress::ZERO,
        },
        kind: args.kind.into(),
    };

    let bytecode = compiler::compile(&client, source).await?;
    let code = serde_json::to_string_pretty(&CodeFile::new(&bytecode))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, code)?;
            tracing::info!(path = %path.display(), "Compiled code written");
        }
        None => println!("{code}"),
    }

    Ok(())
}

async fn signature(args: SignatureArgs) -> eyre::Result<()> {
    let config = args.vm.load()?;
    let client = RpcVmClient::compiler(&config)?;

    let code = CodeFile::read(&args.code)?.bytecode()?;
    let tags = compiler::extract_arguments(&client, code.into()).await?;

    let names: Vec<&str> = tags.iter().map(|tag| tag.name()).collect();
    println!("{}", names.join(", "));

    Ok(())
}

fn init_tracing(level: &str) -> eyre::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
