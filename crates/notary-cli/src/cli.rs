use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use notary_client::TransportKind;
use notary_types::Address;

#[derive(Parser)]
#[command(name = "notary", about = "Document notary: record and check document hashes on a ledger", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file; defaults plus environment when absent.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Transport to the ledger node (test, ipc, websocket, http).
    #[arg(long, global = true)]
    pub transport: Option<TransportKind>,

    /// Node address: socket path or URL.
    #[arg(long, global = true)]
    pub node: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Deploy a compiled contract
    Deploy(DeployArgs),
    /// Send a state-changing call and wait for its receipt
    Send(InvokeArgs),
    /// Run a read-only call
    Call(InvokeArgs),
    /// Compile a Solidity contract into the artifacts directory
    Compile(CompileArgs),
    /// Show the latest block
    Block,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Address of the deployed contract.
    #[arg(long)]
    pub address: Option<Address>,
    /// Deploy a fresh contract on first use when no address is known.
    #[arg(long)]
    pub deploy_if_unbound: bool,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Contract name; defaults to the configured one.
    #[arg(long)]
    pub contract: Option<String>,
    /// Constructor arguments.
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct InvokeArgs {
    /// Deployed contract address; defaults to the configured one.
    #[arg(long)]
    pub address: Option<Address>,
    #[arg(long)]
    pub contract: Option<String>,
    pub function: String,
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct CompileArgs {
    pub name: Option<String>,
    #[arg(long, default_value = notary_artifact::DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,
    #[arg(long, default_value = "solc")]
    pub solc: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0x949e6011110eee750c48cd49e7b1d298ca2e66d42d8aee6dc4623532ffbd996c";

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["notary", "serve", "--bind", "127.0.0.1:9000", "--deploy-if-unbound"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("127.0.0.1:9000".parse::<SocketAddr>().unwrap()));
            assert!(args.deploy_if_unbound);
            assert!(args.address.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_send() {
        let cli = Cli::try_parse_from(["notary", "send", "addDocument", "a@b.com", HASH]).unwrap();
        if let Command::Send(args) = cli.command {
            assert_eq!(args.function, "addDocument");
            assert_eq!(args.args, vec!["a@b.com", HASH]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_call_with_address() {
        let cli = Cli::try_parse_from([
            "notary",
            "call",
            "--address",
            "0x4a8a51797cde3aac2f7dc5c81c548428056a6d12",
            "validateOne",
            "a@b.com",
            HASH,
        ])
        .unwrap();
        if let Command::Call(args) = cli.command {
            assert!(args.address.is_some());
            assert_eq!(args.args.len(), 2);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn bad_address_rejected() {
        assert!(Cli::try_parse_from(["notary", "call", "--address", "0x12", "validateOne"]).is_err());
    }

    #[test]
    fn parse_compile_defaults() {
        let cli = Cli::try_parse_from(["notary", "compile"]).unwrap();
        if let Command::Compile(args) = cli.command {
            assert!(args.name.is_none());
            assert_eq!(args.source_dir, PathBuf::from("contracts/sol"));
            assert_eq!(args.solc, PathBuf::from("solc"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_options() {
        let cli =
            Cli::try_parse_from(["notary", "block", "--transport", "ws", "--node", "ws://localhost:8546", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.transport, Some(TransportKind::Websocket));
        assert_eq!(cli.node.as_deref(), Some("ws://localhost:8546"));
        assert!(matches!(cli.command, Command::Block));
    }
}
