use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use ghostwriter::codec::{Codec, GloVeCodec, SavedCodec, TokenCodec, load_codec};
use ghostwriter::core::types::{EOS_NAME, Example, Token};
use ghostwriter::reader::characters;
use ghostwriter::tokenizer::{CharacterTokenizer, PunctuationSegmenter, SentenceTokenizer, Tokenizer};
use ghostwriter::vectors::GloveVectors;

#[derive(Parser)]
#[command(name = "ghostwriter")]
#[command(about = "Build vocabulary codecs and training windows for text generation")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `info` or `ghostwriter=debug`
    #[arg(long, global = true, env = "GHOSTWRITER_LOG", default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a character codec from text files
    Vocabulary {
        /// Text files to scan
        #[arg(required = true)]
        data: Vec<PathBuf>,

        /// Directory to save the codec into
        #[arg(short, long, env = "GHOSTWRITER_OUTPUT")]
        output: PathBuf,

        /// Read at most this many characters
        #[arg(short, long, env = "GHOSTWRITER_N")]
        n: Option<usize>,
    },

    /// Build a word codec from a GloVe vector file
    Glove {
        /// Vector file, one `word v1 .. vd` entry per line, most frequent first
        vectors: PathBuf,

        /// Number of words to keep
        #[arg(short, long, env = "GHOSTWRITER_CAPACITY")]
        capacity: usize,

        /// Meta tokens to reserve
        #[arg(short, long, default_value = EOS_NAME)]
        meta: Vec<String>,

        /// Directory to save the codec into
        #[arg(short, long, env = "GHOSTWRITER_OUTPUT")]
        output: PathBuf,
    },

    /// Print encoded training windows, one per line
    Windows {
        /// Saved codec directory
        codec: PathBuf,

        /// Text files to tokenize
        #[arg(required = true)]
        data: Vec<PathBuf>,

        #[arg(short = 'C', long, env = "GHOSTWRITER_CONTEXT_SIZE", default_value = "3")]
        context_size: usize,

        /// Print at most this many windows
        #[arg(short, long, env = "GHOSTWRITER_N")]
        n: Option<usize>,
    },

    /// Print the token stored at each index
    Decode {
        /// Saved codec directory
        codec: PathBuf,

        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Describe a saved codec
    Info {
        /// Saved codec directory
        codec: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log.as_str()))
        .init();

    if let Err(e) = run(cli.command, &mut io::stdout().lock()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run<W: Write>(command: Commands, out: &mut W) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Vocabulary { data, output, n } => cmd_vocabulary(&data, &output, n, out),
        Commands::Glove {
            vectors,
            capacity,
            meta,
            output,
        } => cmd_glove(&vectors, capacity, &meta, &output, out),
        Commands::Windows {
            codec,
            data,
            context_size,
            n,
        } => cmd_windows(&codec, &data, context_size, n, out),
        Commands::Decode { codec, indices } => cmd_decode(&codec, &indices, out),
        Commands::Info { codec } => cmd_info(&codec, out),
    }
}

fn cmd_vocabulary<W: Write>(
    data: &[PathBuf],
    output: &Path,
    n: Option<usize>,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let stream = characters(data).take(n.unwrap_or(usize::MAX));
    let codec = TokenCodec::try_create_from_tokens(stream)?;
    codec.save(output)?;
    writeln!(out, "{}", codec)?;
    Ok(())
}

fn cmd_glove<W: Write>(
    vectors: &Path,
    capacity: usize,
    meta: &[String],
    output: &Path,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let source = GloveVectors::load(vectors, Some(capacity))?;
    let codec = GloVeCodec::create(&source, capacity, meta.iter().cloned())?;
    codec.save(output)?;
    writeln!(out, "{}", codec)?;
    Ok(())
}

fn write_windows<C, I, W>(codec: &C, examples: I, out: &mut W) -> Result<(), Box<dyn Error>>
where
    C: Codec,
    I: Iterator<Item = ghostwriter::Result<Example>>,
    W: Write,
{
    let mut out = BufWriter::new(out);
    let mut count = 0;
    for example in examples {
        let encoded = example?.encode(codec);
        let context: Vec<String> = encoded.context.iter().map(usize::to_string).collect();
        writeln!(out, "{}\t{}", context.join(" "), encoded.target)?;
        count += 1;
    }
    out.flush()?;
    info!("Wrote {} windows", count);
    Ok(())
}

fn cmd_windows<W: Write>(
    codec: &Path,
    data: &[PathBuf],
    context_size: usize,
    n: Option<usize>,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let limit = n.unwrap_or(usize::MAX);
    match load_codec(codec)? {
        SavedCodec::Token(codec) => {
            let tokenizer = CharacterTokenizer::new(codec, context_size)?;
            let examples = tokenizer.tokenize_documents(data, None).take(limit);
            write_windows(tokenizer.codec(), examples, out)
        }
        SavedCodec::Glove(codec) => {
            let segmenter = PunctuationSegmenter::new();
            let tokenizer = SentenceTokenizer::new(codec, context_size, segmenter)?;
            let examples = tokenizer.tokenize_documents(data).take(limit);
            write_windows(tokenizer.codec(), examples, out)
        }
    }
}

fn cmd_decode<W: Write>(
    codec: &Path,
    indices: &[usize],
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let codec = load_codec(codec)?;
    let tokens: Vec<Token> = codec
        .decode(indices.iter().copied())
        .collect::<ghostwriter::Result<_>>()?;
    for (index, token) in indices.iter().zip(&tokens) {
        writeln!(out, "{}\t{}", index, token)?;
    }
    Ok(())
}

fn describe_token_codec<W: Write>(codec: &TokenCodec, out: &mut W) -> io::Result<()> {
    let preview: String = codec
        .entries()
        .iter()
        .take(40)
        .map(|token| format!("{:?}", token.value()))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "Tokens:          {}", preview)
}

fn cmd_info<W: Write>(codec: &Path, out: &mut W) -> Result<(), Box<dyn Error>> {
    let codec = load_codec(codec)?;
    writeln!(out, "{}", codec)?;
    writeln!(out, "Vocabulary size: {}", codec.vocabulary_size())?;
    match &codec {
        SavedCodec::Token(codec) => describe_token_codec(codec, out)?,
        SavedCodec::Glove(codec) => {
            let meta: Vec<&str> = codec.meta_tokens().iter().map(Token::value).collect();
            writeln!(out, "Capacity:        {}", codec.capacity())?;
            writeln!(out, "Embedding dim:   {}", codec.embedding_dim())?;
            writeln!(out, "Meta tokens:     {}", meta.join(" "))?;
        }
    }
    Ok(())
}
