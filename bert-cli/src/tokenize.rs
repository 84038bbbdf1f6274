use crate::common::{load_model, validate_model_args, ModelArgs};
use bert_embedding::BertModel;
use clap::Args;
use serde::Serialize;
use tracing::info;

#[derive(Args, Clone, Debug)]
#[command(about = "Show how a text is split into vocabulary tokens")]
pub struct TokenizeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Text to tokenize
    #[arg(long, short, help = "Text to tokenize")]
    pub text: String,

    /// Emit JSON instead of a table
    #[arg(long, help = "Print tokens as JSON")]
    pub json: bool,
}

/// One token of a tokenized text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub id: i32,
    pub token: String,
}

pub fn validate_tokenize_args(args: &TokenizeArgs) -> anyhow::Result<()> {
    validate_model_args(&args.model)?;

    if args.text.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "Text cannot be empty\n💡 Pass the text to tokenize with --text"
        ));
    }

    Ok(())
}

/// Tokenize `text` and resolve every id back to its vocabulary string
pub fn tokenize_text(model: &BertModel, text: &str) -> anyhow::Result<Vec<TokenInfo>> {
    let tokens = model.tokenize(text)?;
    let mut infos = Vec::with_capacity(tokens.len());
    for token in tokens {
        infos.push(TokenInfo {
            id: token.id(),
            token: model.token_string(token)?,
        });
    }
    Ok(infos)
}

pub fn run_tokenize(args: TokenizeArgs) -> anyhow::Result<Vec<TokenInfo>> {
    validate_tokenize_args(&args)?;
    info!("Tokenizing {} bytes of text", args.text.len());

    let model = load_model(&args.model, 1, false)?;
    let tokens = tokenize_text(&model, &args.text)?;
    model.close()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        print!("{}", format_table(&tokens));
    }

    Ok(tokens)
}

fn format_table(tokens: &[TokenInfo]) -> String {
    let mut out = format!("{:>5}  {:>8}  {}\n", "#", "id", "token");
    for (i, token) in tokens.iter().enumerate() {
        out.push_str(&format!("{:>5}  {:>8}  {}\n", i, token.id, token.token));
    }
    out.push_str(&format!("{} tokens\n", tokens.len()));
    out
}
