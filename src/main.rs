use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotools::{cli, config, error, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP tool service
    Serve(ServeOptions),

    /// List registered tools
    Tools(ToolsOptions),

    /// Run a tool locally and print its response
    Invoke(InvokeOptions),

    /// Open a Spotify authorization link for an agent
    Authorize(AuthorizeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to bind, overrides SERVER_ADDRESS
    #[clap(long)]
    pub addr: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ToolsOptions {
    /// Print the registry as JSON, including schemas
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct InvokeOptions {
    /// Tool id, e.g. get-info
    pub tool: String,

    /// Artist passed to the helper
    pub artist: String,

    /// Caller identity used in logs
    #[clap(long, default_value = "local")]
    pub agent: String,
}

#[derive(Parser, Debug, Clone)]
pub struct AuthorizeOptions {
    /// Agent the token is stored for
    #[clap(long)]
    pub agent: String,

    /// Base URL of the running service
    #[clap(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    match cli.command {
        Command::Serve(opt) => cli::serve(settings, opt.addr).await,
        Command::Tools(opt) => cli::list_tools(opt.json),
        Command::Invoke(opt) => cli::invoke(settings, opt.tool, opt.artist, opt.agent).await,
        Command::Authorize(opt) => cli::authorize(settings, opt.server, opt.agent).await,
        Command::Completions(_) => {}
    }
}
