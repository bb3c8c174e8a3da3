use anyhow::Context;
use colored::Colorize;
use notary_artifact::{ArtifactStore, FileArtifactStore, SolcCompiler};
use notary_client::{LedgerClient, TransportKind};
use notary_server::{NotaryServer, ServerConfig};
use notary_types::Address;
use serde_json::Value;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Deploy(args) => {
            let address = cmd_deploy(&config, args).await?;
            println!("{} Contract deployed at {}", "✓".green().bold(), address.to_string().yellow());
            Ok(())
        }
        Command::Send(args) => {
            let receipt = cmd_invoke(&config, args, true).await?;
            print_json(&receipt)
        }
        Command::Call(args) => {
            let result = cmd_invoke(&config, args, false).await?;
            print_json(&result)
        }
        Command::Compile(args) => cmd_compile(&config, args),
        Command::Block => {
            let client = LedgerClient::connect(config.node.clone(), None, None).await?;
            print_json(&client.latest_block().await?)
        }
    }
}

/// Configuration file (or defaults plus environment), then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => ServerConfig::from_env(),
    };
    if let Some(node) = &cli.node {
        config.node.node_address = node.clone();
        config.node.transport = TransportKind::infer(node);
    }
    if let Some(transport) = cli.transport {
        config.node.transport = transport;
    }
    Ok(config)
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.address.is_some() {
        config.contract_address = args.address;
    }
    config.deploy_if_unbound |= args.deploy_if_unbound;
    println!(
        "Notary server on {} ({} transport, contract {})",
        config.bind_addr.to_string().bold(),
        config.node.transport.to_string().cyan(),
        config.contract_name.yellow()
    );
    NotaryServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_deploy(config: &ServerConfig, args: DeployArgs) -> anyhow::Result<Address> {
    let name = args.contract.unwrap_or_else(|| config.contract_name.clone());
    let artifact = FileArtifactStore::new(&config.artifacts_dir).load(&name)?;
    let mut client = LedgerClient::connect(config.node.clone(), None, None).await?;
    Ok(client.deploy_with_args(Some(artifact), &args.args).await?)
}

async fn cmd_invoke(config: &ServerConfig, args: InvokeArgs, mutating: bool) -> anyhow::Result<Value> {
    let name = args.contract.unwrap_or_else(|| config.contract_name.clone());
    let address = args
        .address
        .or(config.contract_address)
        .context("no contract address: pass --address or set contract_address in the configuration")?;
    let artifact = FileArtifactStore::new(&config.artifacts_dir).load(&name)?;
    let client = LedgerClient::connect(config.node.clone(), Some(address), Some(artifact)).await?;
    let value = if mutating {
        client.mutate(&args.function, &args.args).await?
    } else {
        client.read(&args.function, &args.args).await?
    };
    Ok(value)
}

fn cmd_compile(config: &ServerConfig, args: CompileArgs) -> anyhow::Result<()> {
    let name = args.name.unwrap_or_else(|| config.contract_name.clone());
    let store = FileArtifactStore::new(&config.artifacts_dir);
    let (artifact, path) = SolcCompiler::new(args.solc).compile_into(&args.source_dir, &name, &store)?;
    println!(
        "{} Compiled {} ({} bytes of bytecode) into {}",
        "✓".green().bold(),
        artifact.name.yellow(),
        artifact.bytecode.len(),
        path.display()
    );
    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
