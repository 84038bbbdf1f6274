pub mod common;
pub mod embed;
pub mod info;
pub mod parquet_writer;
pub mod tokenize;

pub use common::{exit_code_for, init_logging, load_model, ModelArgs};
pub use embed::{embed_with_model, run_embed, validate_embed_args, EmbedArgs};
pub use info::{run_info, InfoArgs, ModelInfo};
pub use parquet_writer::{ParquetError, ParquetWriter};
pub use tokenize::{run_tokenize, tokenize_text, validate_tokenize_args, TokenInfo, TokenizeArgs};
