use anyhow::Result;
use bert_cli::{
    exit_code_for, init_logging, run_embed, run_info, run_tokenize, EmbedArgs, InfoArgs,
    TokenizeArgs,
};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "bert-cli")]
#[command(about = "BERT sentence embeddings through the native bert library")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate embeddings for input texts
    Embed(EmbedArgs),
    /// Show how a text is tokenized
    Tokenize(TokenizeArgs),
    /// Print model and library details
    Info(InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Embed(args) => {
            init_logging(args.model.debug);
            if args.model.debug {
                info!("Starting bert-cli embed");
            }
            run_embed(args).await.map(|_| ())
        }
        Commands::Tokenize(args) => {
            init_logging(args.model.debug);
            if args.model.debug {
                info!("Starting bert-cli tokenize");
                info!("Model: {}", args.model.model.display());
            }
            run_tokenize(args).map(|_| ())
        }
        Commands::Info(args) => {
            init_logging(args.model.debug);
            if args.model.debug {
                info!("Starting bert-cli info");
                info!("Model: {}", args.model.model.display());
            }
            run_info(args).map(|_| ())
        }
    };

    match outcome {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let code = exit_code_for(&e);
            match code {
                2 => eprintln!("Error: {}", e),
                3 => eprintln!("Model Error: {}", e),
                _ => eprintln!("Runtime Error: {}", e),
            }
            std::process::exit(code);
        }
    }
}
