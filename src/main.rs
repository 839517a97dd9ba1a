use std::io::{self, IsTerminal, Read};

use anyhow::{anyhow, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "doc-translator",
    version,
    about = "Extract text from documents and translate it through a provider fallback chain"
)]
struct Cli {
    /// Target language (default: en)
    #[arg(short = 'l', long = "lang", default_value = "en")]
    lang: String,

    /// Document to translate (txt/docx/pdf). Without it stdin is translated as text.
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Start the HTTP service
    #[arg(long = "server")]
    server: bool,

    /// Bind address for --server (overrides settings [server] addr)
    #[arg(long = "addr")]
    addr: Option<String>,

    /// Show the configured provider fallback chain and exit
    #[arg(long = "show-providers")]
    show_providers: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    doc_translator::logging::init(cli.verbose)?;

    if cli.server {
        let settings_path = cli.read_settings.as_deref().map(std::path::Path::new);
        let settings = doc_translator::settings::load_settings(settings_path)?;
        let addr = cli.addr.unwrap_or_else(|| settings.server_addr.clone());
        return doc_translator::server::run_server(settings, addr).await;
    }

    let needs_input = cli.data.is_none() && !cli.show_providers;
    let input = if needs_input {
        if io::stdin().is_terminal() {
            return Err(anyhow!("nothing to translate; pipe text on stdin or pass --data"));
        }
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        let text = String::from_utf8(buffer)
            .map_err(|_| anyhow!("stdin must be UTF-8 text; use --data for documents"))?;
        Some(text)
    } else {
        None
    };

    let output = doc_translator::run(
        doc_translator::Config {
            lang: cli.lang,
            data: cli.data,
            settings_path: cli.read_settings,
            show_providers: cli.show_providers,
        },
        input,
    )
    .await?;

    println!("{}", output);
    Ok(())
}
