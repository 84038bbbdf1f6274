use crate::common::{load_model, validate_model_args, ModelArgs};
use crate::parquet_writer::ParquetWriter;
use bert_embedding::{BatchProcessor, BertModel};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Largest batch size accepted on the command line
pub const MAX_BATCH_SIZE: usize = 1024;

#[derive(Args, Clone, Debug)]
#[command(about = "Generate embeddings for input texts")]
pub struct EmbedArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Input text file (one text per line)
    #[arg(long, short, help = "Input text file (one text per line)")]
    pub input: PathBuf,

    /// Output Parquet file path
    #[arg(long, short, help = "Output Parquet file path")]
    pub output: PathBuf,

    /// Batch size for processing
    #[arg(long, default_value = "32", help = "Batch size for processing")]
    pub batch_size: usize,

    /// Normalize embeddings
    #[arg(long, help = "Normalize embeddings to unit length")]
    pub normalize: bool,
}

/// Validate everything `embed` needs before touching the native library
pub fn validate_embed_args(args: &EmbedArgs) -> anyhow::Result<()> {
    validate_model_args(&args.model)?;
    validate_input_file(&args.input)?;
    validate_output_path(&args.output)?;
    validate_batch_size(args.batch_size)?;
    Ok(())
}

/// Validate input file exists, is a file, and is not empty
fn validate_input_file(input: &Path) -> anyhow::Result<()> {
    if !input.exists() {
        return Err(anyhow::anyhow!(
            "Input file does not exist: {}\n💡 Ensure file path is correct and file exists",
            input.display()
        ));
    }

    if !input.is_file() {
        return Err(anyhow::anyhow!(
            "Input path is not a file: {}\n💡 Provide path to a text file, not a directory",
            input.display()
        ));
    }

    let metadata = std::fs::metadata(input).map_err(|e| {
        anyhow::anyhow!(
            "Cannot read input file metadata: {}: {}\n💡 Check file permissions",
            input.display(),
            e
        )
    })?;

    if metadata.len() == 0 {
        return Err(anyhow::anyhow!(
            "Input file cannot be empty: {}\n💡 Provide a text file with content (one text per line)",
            input.display()
        ));
    }

    Ok(())
}

/// Validate the output extension and make sure its directory exists
fn validate_output_path(output: &Path) -> anyhow::Result<()> {
    match output.extension() {
        Some(extension) if extension == "parquet" => {}
        _ => {
            return Err(anyhow::anyhow!(
                "Output file must have .parquet extension, got: {}\n💡 Use a .parquet extension for the output file",
                output.display()
            ));
        }
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create output directory '{}': {}\n💡 Check parent directory permissions and disk space",
                    parent.display(),
                    e
                )
            })?;
        }
    }

    Ok(())
}

fn validate_batch_size(batch_size: usize) -> anyhow::Result<()> {
    if batch_size == 0 {
        return Err(anyhow::anyhow!(
            "Batch size must be greater than 0\n💡 Use a reasonable batch size like 32 or 64"
        ));
    }

    if batch_size > MAX_BATCH_SIZE {
        return Err(anyhow::anyhow!(
            "Batch size is too large: {}. Maximum is {}\n💡 Large batches only increase peak memory",
            batch_size,
            MAX_BATCH_SIZE
        ));
    }

    Ok(())
}

/// Embed every line of the input file and write the vectors to Parquet
pub async fn run_embed(args: EmbedArgs) -> anyhow::Result<usize> {
    validate_embed_args(&args)?;

    info!("Starting embed command");
    info!("Model: {}", args.model.model.display());
    info!("Input: {:?}", args.input);
    info!("Output: {:?}", args.output);
    info!("Batch size: {}", args.batch_size);

    println!("Loading model: {}", args.model.model.display());
    let load_start = Instant::now();
    let model = load_model(&args.model, args.batch_size, args.normalize)?;
    let embedding_dim = model.size();
    println!(
        "Model loaded successfully in {:.1}s ({} dimensions, {} max tokens)",
        load_start.elapsed().as_secs_f64(),
        embedding_dim,
        model.max_tokens()
    );

    embed_with_model(model, &args).await
}

/// Stream the input file through an already loaded model into Parquet.
///
/// Returns the number of records written.
pub async fn embed_with_model(model: BertModel, args: &EmbedArgs) -> anyhow::Result<usize> {
    let embedding_dim = model.size();
    let mut processor = BatchProcessor::new(Arc::new(model), args.batch_size);
    let mut parquet_writer = ParquetWriter::new(&args.output, embedding_dim)
        .map_err(|e| anyhow::anyhow!("Failed to create Parquet writer: {}", e))?;

    let total_lines = count_non_empty_lines(&args.input).await?;
    println!(
        "Processing {} texts with batch size {}...",
        total_lines, args.batch_size
    );

    let progress_bar = ProgressBar::new(total_lines as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")?
            .progress_chars("██▌ "),
    );

    let processing_start = Instant::now();
    let mut total_processed = 0;

    processor
        .process_file_streaming(&args.input, |batch| {
            total_processed += batch.len();

            parquet_writer.write_batch(batch).map_err(|e| {
                bert_embedding::EmbeddingError::batch_processing(format!(
                    "Parquet write error: {}",
                    e
                ))
            })?;

            progress_bar.set_position(total_processed as u64);
            let elapsed = processing_start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                progress_bar.set_message(format!("{:.1} texts/s", total_processed as f64 / elapsed));
            }
            Ok(())
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to process file: {}", e))?;

    progress_bar.finish_with_message("Processing complete");
    let records_written = parquet_writer
        .close()
        .map_err(|e| anyhow::anyhow!("Failed to close Parquet writer: {}", e))?;

    let total_time = processing_start.elapsed();
    println!();
    println!("Processing complete!");
    println!("Total embeddings: {}", total_processed);
    println!("Processing time: {:.1}s", total_time.as_secs_f64());
    if total_processed > 0 {
        println!(
            "Average processing time: {:.1}ms per text",
            total_time.as_millis() as f64 / total_processed as f64
        );
    }
    println!(
        "Output written to: {} ({} records)",
        args.output.display(),
        records_written
    );

    if let Ok(metadata) = std::fs::metadata(&args.output) {
        let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
        println!("File size: {:.1} MB", size_mb);
    }

    Ok(records_written)
}

/// Count non-empty lines in a file for progress tracking
async fn count_non_empty_lines(input_path: &Path) -> anyhow::Result<usize> {
    use tokio::fs::File;
    use tokio::io::{AsyncBufReadExt, BufReader};

    let file = File::open(input_path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut count = 0;

    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            count += 1;
        }
    }

    Ok(count)
}
