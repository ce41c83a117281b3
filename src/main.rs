use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use npids::{BuildConfig, DocnoIndex, NOT_FOUND};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "npids")]
#[command(about = "Compact, memory-mapped docno lookups")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a lookup file from newline-separated docnos
    Build {
        /// Output lookup file
        output: PathBuf,

        /// Docno file, one per line ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Docnos seeded before a block's codec is chosen
        #[arg(long)]
        min_block: Option<usize>,

        /// Skip building the inverse index
        #[arg(long)]
        no_inverse: bool,

        /// JSON build config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the docnos at the given indices
    Get {
        file: PathBuf,
        #[arg(required = true)]
        indices: Vec<u64>,
    },
    /// Print the indices of the given docnos (-1 when missing)
    Find {
        file: PathBuf,
        #[arg(required = true)]
        docnos: Vec<String>,
    },
    /// Show the block layout
    Describe { file: PathBuf },
    /// Show file statistics
    Stats {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print every docno in index order
    Dump { file: PathBuf },
    /// Append an inverse index to a file built without one
    BuildInverse {
        file: PathBuf,

        /// JSON build config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            output,
            input,
            min_block,
            no_inverse,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(min_block) = min_block {
                config = config.with_min_block_size(min_block);
            }
            if no_inverse {
                config = config.with_inverse(false);
            }
            build(&output, &input, config)?;
        }
        Commands::Get { file, indices } => {
            let index = open(&file)?;
            let docnos = index
                .forward_bytes(&indices)
                .context("Failed to look up indices")?;
            let mut out = BufWriter::new(io::stdout().lock());
            for docno in docnos {
                out.write_all(&docno)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        Commands::Find { file, docnos } => {
            let index = open(&file)?;
            let found = index.inverse(&docnos).context("Failed to look up docnos")?;
            for (docno, idx) in docnos.iter().zip(found) {
                if idx == NOT_FOUND {
                    eprintln!("{}: not found", docno);
                }
                println!("{}\t{}", docno, idx);
            }
        }
        Commands::Describe { file } => {
            let index = open(&file)?;
            print!("{}", index.describe());
        }
        Commands::Stats { file, json } => {
            let index = open(&file)?;
            if json {
                println!("{}", index.stats().to_json()?);
            } else {
                print!("{}", index.stats());
            }
        }
        Commands::Dump { file } => {
            let index = open(&file)?;
            let mut out = BufWriter::new(io::stdout().lock());
            for docno in &index {
                out.write_all(&docno)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        Commands::BuildInverse { file, config } => {
            let config = load_config(config.as_deref())?;
            let inverse = npids::build_inverse(&file, &config)
                .with_context(|| format!("Failed to build inverse index for {}", file.display()))?;
            println!("Built {} inverse index for {}", inverse.name(), file.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BuildConfig> {
    match path {
        Some(path) => BuildConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(BuildConfig::default()),
    }
}

fn open(file: &Path) -> Result<DocnoIndex> {
    DocnoIndex::open(file).with_context(|| format!("Failed to open {}", file.display()))
}

fn build(output: &Path, input: &Path, config: BuildConfig) -> Result<()> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin().lock()))
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut builder = DocnoIndex::builder(output, config)
        .with_context(|| format!("Failed to create {}", output.display()))?
        .with_progress();
    for line in reader.split(b'\n') {
        let mut docno = line.context("Failed to read docnos")?;
        if docno.last() == Some(&b'\r') {
            docno.pop();
        }
        builder.add(&docno)?;
    }
    let count = builder.len();
    let path = builder.finish()?;

    let index = open(&path)?;
    println!(
        "Built {} with {} docnos in {} blocks",
        path.display(),
        count,
        index.forward_lookup().blocks().len()
    );
    Ok(())
}
