use crate::common::{load_model, validate_model_args, ModelArgs};
use bert_embedding::BertModel;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Clone, Debug)]
#[command(about = "Print model and native library details")]
pub struct InfoArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Emit JSON instead of plain text
    #[arg(long, help = "Print details as JSON")]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    /// `None` when the library was injected rather than loaded from disk
    pub library: Option<PathBuf>,
    pub model: PathBuf,
    pub embedding_size: usize,
    pub max_tokens: usize,
    pub threads: usize,
}

impl ModelInfo {
    pub fn from_model(model: &BertModel) -> Self {
        Self {
            library: model.library().path().map(|p| p.to_path_buf()),
            model: model.path().to_path_buf(),
            embedding_size: model.size(),
            max_tokens: model.max_tokens(),
            threads: model.threads(),
        }
    }
}

impl std::fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let library = self
            .library
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<in-process>".to_string());
        writeln!(f, "Library:        {}", library)?;
        writeln!(f, "Model:          {}", self.model.display())?;
        writeln!(f, "Embedding size: {}", self.embedding_size)?;
        writeln!(f, "Max tokens:     {}", self.max_tokens)?;
        write!(f, "Threads:        {}", self.threads)
    }
}

pub fn run_info(args: InfoArgs) -> anyhow::Result<ModelInfo> {
    validate_model_args(&args.model)?;

    let model = load_model(&args.model, 1, false)?;
    let info = ModelInfo::from_model(&model);
    model.close()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info);
    }

    Ok(info)
}
