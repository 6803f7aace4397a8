//! CLI Command Handlers
//!
//! Argument definitions and the handler for every mintdeck command.

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::offchain::{HttpFetcherConfig, HttpMetadataFetcher};
use crate::adapters::solana::{KeypairWallet, SolanaClient};
use crate::adapters::storage::JsonFileStore;
use crate::application::{
    lamports_to_sol, parse_address, ActionSettings, LaunchRequest, TokenPipeline, WalletActions,
};
use crate::config::{load_config, Config};
use crate::domain::{controlled_mints, CreatedMintRegistry, RevokeKind, SelectionSet, TokenHolding};
use crate::ports::{AccountReader, ChainWriter, KeyValueStore, OffchainMetadataFetcher, WalletPort};

/// Mintdeck - Solana wallet toolkit for Token-2022 launches and holdings
#[derive(Parser, Debug)]
#[command(
    name = "mintdeck",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Solana wallet toolkit for token holdings, Token-2022 launches and authority management",
    long_about = "Mintdeck lists the wallet's SPL Token and Token-2022 holdings enriched with \
                  on-chain authorities and metadata, launches self-describing Token-2022 mints, \
                  mints supply and permanently revokes mint or freeze authorities."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/devnet.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List token holdings with authorities and metadata
    Tokens(TokensCmd),

    /// List mints the wallet can mint to
    Mints,

    /// Show the wallet's SOL balance
    Balance,

    /// Request a devnet SOL airdrop
    Airdrop(AirdropCmd),

    /// Transfer SOL
    SendSol(SendSolCmd),

    /// Launch a Token-2022 token with embedded metadata
    Launch(LaunchCmd),

    /// Mint tokens to a wallet
    MintTo(MintToCmd),

    /// Permanently revoke mint or freeze authority
    Revoke(RevokeCmd),

    /// Sign a message with the wallet key
    SignMessage(SignMessageCmd),
}

/// List holdings
#[derive(Parser, Debug)]
pub struct TokensCmd {
    /// Only show tokens whose mint or freeze authority you hold
    #[arg(long)]
    pub controlled: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// How `tokens` prints the list
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Airdrop
#[derive(Parser, Debug)]
pub struct AirdropCmd {
    /// Amount in SOL
    #[arg(value_name = "SOL", default_value = "1")]
    pub amount: Decimal,
}

/// SOL transfer
#[derive(Parser, Debug)]
pub struct SendSolCmd {
    /// Recipient address (base58)
    #[arg(value_name = "RECIPIENT")]
    pub recipient: String,

    /// Amount in SOL
    #[arg(value_name = "SOL")]
    pub amount: Decimal,
}

/// Token launch
#[derive(Parser, Debug)]
pub struct LaunchCmd {
    /// Token name
    #[arg(long)]
    pub name: String,

    /// Token symbol
    #[arg(long)]
    pub symbol: String,

    /// Metadata document URI (defaults to launch.default_metadata_uri)
    #[arg(long, value_name = "URL")]
    pub uri: Option<String>,

    /// Decimals (defaults to launch.default_decimals)
    #[arg(long)]
    pub decimals: Option<u8>,
}

/// Mint supply
#[derive(Parser, Debug)]
pub struct MintToCmd {
    /// Mint address
    #[arg(value_name = "MINT")]
    pub mint: String,

    /// Amount in whole tokens
    #[arg(value_name = "AMOUNT")]
    pub amount: Decimal,

    /// Recipient wallet (defaults to your own)
    #[arg(long, value_name = "ADDRESS")]
    pub to: Option<String>,
}

/// Authority revocation
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("authority")
        .required(true)
        .args(["mint_authority", "freeze_authority"])
))]
pub struct RevokeCmd {
    /// Revoke the mint authority
    #[arg(long = "mint")]
    pub mint_authority: bool,

    /// Revoke the freeze authority
    #[arg(long = "freeze")]
    pub freeze_authority: bool,

    /// Mints to revoke (must be in your token list)
    #[arg(value_name = "MINT", required = true)]
    pub mints: Vec<String>,

    /// Confirm without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl RevokeCmd {
    pub fn kind(&self) -> RevokeKind {
        if self.freeze_authority {
            RevokeKind::Freeze
        } else {
            RevokeKind::Mint
        }
    }
}

/// Message signing
#[derive(Parser, Debug)]
pub struct SignMessageCmd {
    /// UTF-8 message
    #[arg(value_name = "MESSAGE")]
    pub message: String,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;
    tracing::debug!("Config: {}", app.config.display());

    let actions = build_actions(&config)?;

    match app.command {
        Command::Tokens(cmd) => tokens_command(&actions, cmd).await,
        Command::Mints => mints_command(&actions).await,
        Command::Balance => balance_command(&actions).await,
        Command::Airdrop(cmd) => airdrop_command(&actions, cmd).await,
        Command::SendSol(cmd) => send_sol_command(&actions, cmd).await,
        Command::Launch(cmd) => launch_command(&actions, &config, cmd).await,
        Command::MintTo(cmd) => mint_to_command(&actions, cmd).await,
        Command::Revoke(cmd) => revoke_command(&actions, cmd).await,
        Command::SignMessage(cmd) => sign_message_command(&actions, cmd),
    }
}

/// Initialize logging system
///
/// `--debug` and `--verbose` win over `RUST_LOG`, which wins over the config level.
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wire the adapters into the application services
fn build_actions(config: &Config) -> Result<WalletActions> {
    let commitment = config.solana.commitment_config()?;
    let rpc_url = config.solana.get_rpc_url();
    tracing::debug!("RPC: {} ({})", rpc_url, config.solana.commitment);

    let chain = Arc::new(SolanaClient::new(rpc_url, commitment, config.solana.confirm_timeout()));
    let reader: Arc<dyn AccountReader> = chain.clone();
    let writer: Arc<dyn ChainWriter> = chain;

    let fetcher: Arc<dyn OffchainMetadataFetcher> = Arc::new(
        HttpMetadataFetcher::with_config(HttpFetcherConfig::from(&config.metadata))
            .context("Failed to create metadata client")?,
    );

    let wallet: Arc<dyn WalletPort> = Arc::new(load_wallet_with_context(&config.solana.get_keypair_path())?);

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(config.storage.data_dir_path()));
    let registry = CreatedMintRegistry::load(store).context("Failed to load created mints")?;

    let pipeline = TokenPipeline::new(Arc::clone(&reader), fetcher)
        .with_refresh_delay(config.pipeline.refresh_delay());

    Ok(WalletActions::new(
        reader,
        writer,
        wallet,
        pipeline,
        registry,
        ActionSettings::from(&config.launch),
    ))
}

/// Load wallet with helpful error messages
fn load_wallet_with_context(keypair_path: &str) -> Result<KeypairWallet> {
    let path = Path::new(keypair_path);

    if !path.exists() {
        bail!(
            "Wallet file not found: {}\n\n\
             To create a new wallet, run:\n  \
             solana-keygen new --outfile {}\n\n\
             Or if you have an existing wallet, update 'keypair_path' in your config \
             or set SOLANA_KEYPAIR_PATH",
            keypair_path,
            keypair_path
        );
    }

    KeypairWallet::from_file(path).map_err(|e| {
        anyhow!(
            "Failed to load wallet from '{}': {}\n\n\
             Expected format: JSON array of bytes (e.g., [1,2,3,...])",
            keypair_path,
            e
        )
    })
}

fn connected_wallet(actions: &WalletActions) -> Result<Pubkey> {
    actions
        .wallet_key()
        .context("No wallet loaded")
}

fn print_holdings(holdings: &[TokenHolding], wallet: Option<&Pubkey>) {
    println!(
        "{:<12} {:<20} {:>18}  {:<13} {:<12} {:<12} {}",
        "SYMBOL", "NAME", "AMOUNT", "MINT", "MINT AUTH", "FREEZE AUTH", "IMAGE"
    );
    for holding in holdings {
        println!(
            "{:<12} {:<20} {:>18}  {:<13} {:<12} {:<12} {}",
            truncate(holding.display_symbol(), 12),
            truncate(holding.name.as_deref().unwrap_or("-"), 20),
            holding.amount,
            holding.short_mint(),
            holding.mint_authority_status(wallet).label(),
            holding.freeze_authority_status(wallet).label(),
            holding.uri.as_deref().unwrap_or("-"),
        );
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

/// Handle tokens command
async fn tokens_command(actions: &WalletActions, cmd: TokensCmd) -> Result<()> {
    let wallet = connected_wallet(actions)?;
    let outcome = actions.tokens().await.context("Failed to load token holdings")?;

    let holdings: Vec<TokenHolding> = if cmd.controlled {
        let controlled = controlled_mints(&outcome.holdings, Some(&wallet));
        outcome
            .holdings
            .into_iter()
            .filter(|h| controlled.contains(h.mint_address()))
            .collect()
    } else {
        outcome.holdings
    };

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&holdings)?),
        OutputFormat::Table => {
            if holdings.is_empty() {
                println!("No tokens found for {}", wallet);
                return Ok(());
            }
            print_holdings(&holdings, Some(&wallet));
        }
    }
    Ok(())
}

/// Handle mints command
async fn mints_command(actions: &WalletActions) -> Result<()> {
    actions.tokens().await.context("Failed to load token holdings")?;
    let options = actions.mint_options().await;

    if options.is_empty() {
        println!("No mints available. Launch a token first.");
        return Ok(());
    }
    for option in options {
        println!("{:<44}  {} (decimals: {})", option.mint_address, option.label, option.decimals);
    }
    Ok(())
}

/// Handle balance command
async fn balance_command(actions: &WalletActions) -> Result<()> {
    let wallet = connected_wallet(actions)?;
    let lamports = actions.balance().await?;
    println!("Wallet:  {}", wallet);
    println!("Balance: {} SOL ({} lamports)", lamports_to_sol(lamports), lamports);
    Ok(())
}

/// Handle airdrop command
async fn airdrop_command(actions: &WalletActions, cmd: AirdropCmd) -> Result<()> {
    let signature = actions.airdrop(cmd.amount).await?;
    println!("✓ Airdropped {} SOL", cmd.amount);
    println!("  Signature: {}", signature);
    Ok(())
}

/// Handle send-sol command
async fn send_sol_command(actions: &WalletActions, cmd: SendSolCmd) -> Result<()> {
    let signature = actions.send_sol(&cmd.recipient, cmd.amount).await?;
    println!("✓ Sent {} SOL to {}", cmd.amount, cmd.recipient);
    println!("  Signature: {}", signature);
    Ok(())
}

/// Handle launch command
async fn launch_command(actions: &WalletActions, config: &Config, cmd: LaunchCmd) -> Result<()> {
    let request = LaunchRequest {
        name: cmd.name,
        symbol: cmd.symbol,
        uri: cmd.uri,
        decimals: cmd.decimals.unwrap_or(config.launch.default_decimals),
    };
    let decimals = request.decimals;
    let outcome = actions.launch_token(request).await?;

    println!("✓ Token launched");
    println!("  Mint:      {}", outcome.mint);
    println!("  Decimals:  {}", decimals);
    println!("  Signature: {}", outcome.signature);
    Ok(())
}

/// Handle mint-to command
async fn mint_to_command(actions: &WalletActions, cmd: MintToCmd) -> Result<()> {
    let wallet = connected_wallet(actions)?;
    let recipient = cmd.to.clone().unwrap_or_else(|| wallet.to_string());

    let outcome = actions.mint_to(&cmd.mint, &recipient, cmd.amount).await?;
    println!("✓ Minted {} to {}", cmd.amount, recipient);
    if outcome.created_token_account {
        println!("  Created token account {}", outcome.token_account);
    }
    println!("  Signature: {}", outcome.signature);

    if let Some(refresh) = outcome.refresh {
        let mint = parse_address(&cmd.mint)?;
        match refresh.await {
            Ok(Ok(refreshed)) => {
                if let Some(holding) = refreshed.holdings.iter().find(|h| *h.mint_address() == mint) {
                    println!("  New balance: {} {}", holding.amount, holding.display_symbol());
                }
            }
            Ok(Err(e)) => tracing::warn!("Token list refresh failed: {}", e),
            Err(e) => tracing::warn!("Token list refresh task failed: {}", e),
        }
    }
    Ok(())
}

/// Handle revoke command
async fn revoke_command(actions: &WalletActions, cmd: RevokeCmd) -> Result<()> {
    let kind = cmd.kind();
    actions.tokens().await.context("Failed to load token holdings")?;

    let mut selection = SelectionSet::new();
    for mint in &cmd.mints {
        selection.toggle(parse_address(mint)?, true);
    }

    let holdings = actions.pipeline().list().snapshot().await.unwrap_or_default();
    let resolved = selection.resolve(&holdings);
    for mint in &cmd.mints {
        let listed = parse_address(mint).map(|m| resolved.contains(&m)).unwrap_or(false);
        if !listed {
            tracing::warn!("{} is not in your token list, skipping", mint);
        }
    }
    if resolved.is_empty() {
        bail!("None of the given mints are in your token list");
    }

    if !cmd.yes {
        println!();
        println!("WARNING: Revoking the {} authority is permanent and cannot be undone.", kind.label());
        for mint in &resolved {
            println!("  {}", mint);
        }
        println!();
        print!("Type 'REVOKE' to confirm (or use --yes to skip this prompt): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim() != "REVOKE" {
            println!("Aborted. No authorities were changed.");
            return Ok(());
        }
    }

    let outcome = actions.revoke(&mut selection, kind).await?;
    println!("✓ Revoked {} authority for {} mint(s)", outcome.kind.label(), outcome.revoked.len());
    println!("  Signature: {}", outcome.signature);
    Ok(())
}

/// Handle sign-message command
fn sign_message_command(actions: &WalletActions, cmd: SignMessageCmd) -> Result<()> {
    let wallet = connected_wallet(actions)?;
    let signature = actions.sign_message(&cmd.message)?;
    println!("Signer:    {}", wallet);
    println!("Signature: {}", signature);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cli_app_parse_tokens() {
        let args = vec!["mintdeck", "tokens", "--controlled"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Tokens(cmd) => {
                assert!(cmd.controlled);
                assert_eq!(cmd.format, OutputFormat::Table);
            }
            _ => panic!("Expected Tokens command"),
        }
    }

    #[test]
    fn test_tokens_format_values() {
        let app = CliApp::try_parse_from(["mintdeck", "tokens", "--format", "json"]).unwrap();
        match app.command {
            Command::Tokens(cmd) => assert_eq!(cmd.format, OutputFormat::Json),
            _ => panic!("Expected Tokens command"),
        }

        assert!(CliApp::try_parse_from(["mintdeck", "tokens", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_default_config_path() {
        let args = vec!["mintdeck", "balance"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert_eq!(app.config, PathBuf::from("config/devnet.toml"));
        assert!(matches!(app.command, Command::Balance));
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["mintdeck", "mints", "-v", "--debug", "--config", "test.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
        assert_eq!(app.config, PathBuf::from("test.toml"));
    }

    #[test]
    fn test_cli_app_parse_airdrop() {
        let app = CliApp::try_parse_from(vec!["mintdeck", "airdrop", "2.5"]).unwrap();
        match app.command {
            Command::Airdrop(cmd) => assert_eq!(cmd.amount, dec!(2.5)),
            _ => panic!("Expected Airdrop command"),
        }

        let app = CliApp::try_parse_from(vec!["mintdeck", "airdrop"]).unwrap();
        match app.command {
            Command::Airdrop(cmd) => assert_eq!(cmd.amount, dec!(1)),
            _ => panic!("Expected Airdrop command"),
        }
    }

    #[test]
    fn test_cli_app_parse_send_sol() {
        let recipient = Pubkey::new_unique().to_string();
        let args = vec!["mintdeck", "send-sol", recipient.as_str(), "0.25"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::SendSol(cmd) => {
                assert_eq!(cmd.recipient, recipient);
                assert_eq!(cmd.amount, dec!(0.25));
            }
            _ => panic!("Expected SendSol command"),
        }
    }

    #[test]
    fn test_cli_app_parse_launch() {
        let args = vec![
            "mintdeck", "launch",
            "--name", "Foo Token",
            "--symbol", "FOO",
            "--decimals", "6",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Launch(cmd) => {
                assert_eq!(cmd.name, "Foo Token");
                assert_eq!(cmd.symbol, "FOO");
                assert_eq!(cmd.decimals, Some(6));
                assert!(cmd.uri.is_none());
            }
            _ => panic!("Expected Launch command"),
        }
    }

    #[test]
    fn test_cli_app_parse_launch_requires_name() {
        let args = vec!["mintdeck", "launch", "--symbol", "FOO"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_mint_to() {
        let mint = Pubkey::new_unique().to_string();
        let args = vec!["mintdeck", "mint-to", mint.as_str(), "1000"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::MintTo(cmd) => {
                assert_eq!(cmd.mint, mint);
                assert_eq!(cmd.amount, dec!(1000));
                assert!(cmd.to.is_none());
            }
            _ => panic!("Expected MintTo command"),
        }
    }

    #[test]
    fn test_cli_app_parse_revoke() {
        let a = Pubkey::new_unique().to_string();
        let b = Pubkey::new_unique().to_string();
        let args = vec!["mintdeck", "revoke", "--freeze", a.as_str(), b.as_str(), "-y"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Revoke(cmd) => {
                assert_eq!(cmd.kind(), RevokeKind::Freeze);
                assert_eq!(cmd.mints, vec![a, b]);
                assert!(cmd.yes);
            }
            _ => panic!("Expected Revoke command"),
        }
    }

    #[test]
    fn test_cli_app_parse_revoke_requires_authority_kind() {
        let mint = Pubkey::new_unique().to_string();
        assert!(CliApp::try_parse_from(vec!["mintdeck", "revoke", mint.as_str()]).is_err());
        assert!(CliApp::try_parse_from(vec!["mintdeck", "revoke", "--mint", "--freeze", mint.as_str()]).is_err());
        assert!(CliApp::try_parse_from(vec!["mintdeck", "revoke", "--mint"]).is_err());
    }

    #[test]
    fn test_cli_app_parse_sign_message() {
        let app = CliApp::try_parse_from(vec!["mintdeck", "sign-message", "hello world"]).unwrap();
        match app.command {
            Command::SignMessage(cmd) => assert_eq!(cmd.message, "hello world"),
            _ => panic!("Expected SignMessage command"),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("FOO", 12), "FOO");
        assert_eq!(truncate("abcdefgh", 5), "abcd~");
    }

    #[test]
    fn test_missing_wallet_error_mentions_keygen() {
        let err = load_wallet_with_context("/nonexistent/id.json").unwrap_err();
        assert!(err.to_string().contains("solana-keygen new"));
    }
}
