use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use vampire_preprocess::pipeline::{self, PreprocessConfig};
use vampire_preprocess::tokenizer::TokenizerKind;
use vampire_preprocess::{logging, DEFAULT_VOCAB_SIZE};

/// Vectorize a jsonl corpus into bag-of-words matrices for topic model training
#[derive(Parser, Debug)]
#[command(name = "vampire-preprocess", version)]
struct Args {
    /// Path(s) to the train jsonl file(s)
    #[arg(long = "train-path", required = true, num_args = 1..)]
    train_path: Vec<PathBuf>,
    /// Path to the dev jsonl file
    #[arg(long = "dev-path")]
    dev_path: PathBuf,
    /// Directory to store the preprocessed output
    #[arg(long = "serialization-dir", short = 's')]
    serialization_dir: PathBuf,
    /// Maximum number of vocabulary terms
    #[arg(long = "vocab-size", default_value_t = DEFAULT_VOCAB_SIZE)]
    vocab_size: usize,
    /// Fixed vocabulary file, one term per line
    #[arg(long)]
    vocabulary: Option<PathBuf>,
    /// Tokenize text before counting
    #[arg(long)]
    tokenize: bool,
    /// Tokenizer to use with --tokenize: just_spaces or spacy
    #[arg(long = "tokenizer-type", default_value = "just_spaces")]
    tokenizer_type: String,
    /// Pretrained tokenizer definition (tokenizer.json) for the spacy tokenizer type
    #[arg(long = "tokenizer-model")]
    tokenizer_model: Option<PathBuf>,
}

fn run(args: Args) -> vampire_preprocess::Result<()> {
    let tokenizer: TokenizerKind = args.tokenizer_type.parse()?;
    let config = PreprocessConfig {
        vocab_size: args.vocab_size,
        vocabulary: args.vocabulary,
        tokenize: args.tokenize,
        tokenizer,
        tokenizer_model: args.tokenizer_model,
        ..PreprocessConfig::new(args.train_path, args.dev_path, args.serialization_dir)
    };
    pipeline::run(&config)?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("[warn] logging disabled: {e}");
    }
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
