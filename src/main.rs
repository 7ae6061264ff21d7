//! OIP record CLI
//!
//! Entry point for the `oip-record` command-line tool.

use clap::{Parser, Subcommand};
use oip_record::config::{LoadedSettings, Settings};
use oip_record::mock::MockChain;
use oip_record::multipart::{reassemble, reassemble_all};
use oip_record::signing::Ed25519Signer;
use oip_record::{Artifact, ChunkSet, Multipart, MultipartCodec, Publisher, Retriever, Transport};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oip-record")]
#[command(about = "Decode, encode and fragment OIP artifact records", version)]
struct Cli {
    /// Path to config file (default: ~/.config/oip/record.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, overrides the configured one
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a record of any generation and describe it
    Inspect {
        /// File holding the record JSON (an optional `json:` marker is accepted)
        file: PathBuf,

        /// Print the indexed form instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical oip042 form of a record
    Canonical {
        file: PathBuf,
    },

    /// Split a record into transaction-sized chunks
    Fragment {
        file: PathBuf,

        /// Publisher address for chunk headers (default: the record's address)
        #[arg(long)]
        publisher: Option<String>,
    },

    /// Rebuild a record from chunk lines
    ///
    /// Each line is either `<chunk>` or `<txid>\t<chunk>`.
    Reassemble {
        file: PathBuf,

        /// Transaction id (or prefix) of the first chunk to rebuild
        #[arg(long)]
        first_txid: Option<String>,
    },

    /// Publish a record to an in-memory chain and read it back
    Roundtrip {
        file: PathBuf,

        /// Base64 Ed25519 secret key to sign with
        #[arg(long)]
        key: Option<String>,
    },

    /// Show the effective configuration and where it came from
    Config {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let overrides = cli
        .log_filter
        .as_ref()
        .map(|filter| serde_json::json!({ "log_filter": filter }));
    let config_path = cli.config.clone().or_else(Settings::default_path);
    let loaded = match Settings::load(config_path.as_deref(), overrides) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };
    init_tracing(&loaded.settings);

    match cli.command {
        Commands::Inspect { file, json } => run_inspect(&file, json),
        Commands::Canonical { file } => run_canonical(&file),
        Commands::Fragment { file, publisher } => run_fragment(&file, publisher),
        Commands::Reassemble { file, first_txid } => run_reassemble(&file, first_txid.as_deref()),
        Commands::Roundtrip { file, key } => run_roundtrip(&file, key.as_deref(), &loaded.settings),
        Commands::Config { json } => run_config(&loaded, json),
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn load_artifact(path: &Path) -> Artifact {
    match Artifact::from_serialized_string(read_input(path).trim()) {
        Ok(artifact) => artifact,
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            process::exit(1);
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn print_summary(artifact: &Artifact) {
    println!("Title: {}", artifact.title());
    if let Some(generation) = artifact.generation() {
        println!("  Generation: {}", generation);
    }
    if let Some(artifact_type) = artifact.artifact_type() {
        match artifact.subtype() {
            Some(subtype) => println!("  Type: {}-{}", artifact_type, subtype),
            None => println!("  Type: {}", artifact_type),
        }
    }
    println!("  Publisher: {}", artifact.publisher_name());
    if let Some(published) = artifact.published_at() {
        println!("  Published: {}", published.to_rfc3339());
    }
    if let Some(txid) = artifact.txid() {
        println!("  Txid: {}", txid);
    }
    if let Some(location) = artifact.location() {
        println!("  Storage: {} {}", artifact.network(), location);
    }
    if !artifact.tags().is_empty() {
        println!("  Tags: {}", artifact.tags().join(", "));
    }
    println!("  Files: {}", artifact.files().len());
    for file in artifact.files() {
        println!("    {}", file.fname.as_deref().unwrap_or("(unnamed)"));
    }
    if artifact.is_paid() {
        println!("  Paid: scale {}, coins {}", artifact.payment_scale(), artifact.supported_coins().join(", "));
    }
    if let Some(chunks) = artifact.chunk_set() {
        println!("  Chunks: {}", chunks.len());
    }
    match artifact.validate() {
        Ok(()) => println!("  Publishable: yes"),
        Err(e) => println!("  Publishable: no ({})", e),
    }
}

fn run_inspect(path: &Path, json_output: bool) {
    let artifact = load_artifact(path);
    if json_output {
        print_json(&artifact.to_indexed_value());
    } else {
        print_summary(&artifact);
    }
}

fn run_canonical(path: &Path) {
    let artifact = load_artifact(path);
    match artifact.to_canonical_form() {
        Ok(canonical) => println!("{}", canonical),
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            process::exit(1);
        }
    }
}

fn run_fragment(path: &Path, publisher: Option<String>) {
    let artifact = load_artifact(path);
    let canonical = match artifact.to_canonical_form() {
        Ok(canonical) => canonical,
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            process::exit(1);
        }
    };
    let publisher = publisher.unwrap_or_else(|| artifact.address().to_string());
    if publisher.is_empty() {
        eprintln!("Record has no address; pass --publisher");
        process::exit(1);
    }

    match MultipartCodec::fragment(&canonical, &publisher) {
        Transport::Inline(serialized) => println!("json:{}", serialized),
        Transport::Multipart { chunks, .. } => {
            for line in chunks.to_wire_lines() {
                println!("{}", line);
            }
        }
    }
}

fn parse_chunk_lines(text: &str) -> Vec<Multipart> {
    let mut parts = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let parsed = match line.split_once('\t') {
            Some((txid, data)) => Multipart::parse_anchored(data, txid.trim()),
            None => Multipart::parse(line),
        };
        match parsed {
            Ok(part) => parts.push(part),
            Err(e) => {
                eprintln!("Line {}: {}", number + 1, e);
                process::exit(1);
            }
        }
    }
    parts
}

fn run_reassemble(path: &Path, first_txid: Option<&str>) {
    let parts = parse_chunk_lines(&read_input(path));
    let anchored = parts.iter().all(|p| p.transport_id.is_some());

    if let Some(first_txid) = first_txid {
        match reassemble(&parts, first_txid) {
            Ok(artifact) => print_summary(&artifact),
            Err(e) => {
                eprintln!("[{}] {}", e.code(), e);
                process::exit(1);
            }
        }
    } else if anchored && !parts.is_empty() {
        let mut failed = false;
        for (key, result) in reassemble_all(&parts) {
            match result {
                Ok(artifact) => print_summary(&artifact),
                Err(e) => {
                    eprintln!("{}: [{}] {}", key, e.code(), e);
                    failed = true;
                }
            }
        }
        if failed {
            process::exit(1);
        }
    } else {
        match Artifact::from_chunk_list(&ChunkSet::new(parts)) {
            Ok(artifact) => print_summary(&artifact),
            Err(e) => {
                eprintln!("[{}] {}", e.code(), e);
                process::exit(1);
            }
        }
    }
}

fn run_roundtrip(path: &Path, key: Option<&str>, settings: &Settings) {
    let mut artifact = load_artifact(path);
    let chain = MockChain::new();

    let mut publisher = Publisher::new(chain.clone());
    if let Some(key) = key {
        match Ed25519Signer::from_base64(key) {
            Ok(signer) => publisher = publisher.with_signer(signer),
            Err(e) => {
                eprintln!("Invalid key: {}", e);
                process::exit(1);
            }
        }
    }

    let receipt = match publisher.publish(&mut artifact) {
        Ok(receipt) => receipt,
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            process::exit(1);
        }
    };
    println!("Published in {} transaction(s)", receipt.txids.len());
    println!("  Fingerprint: {}", receipt.fingerprint);

    let Some(txid) = receipt.txid() else {
        eprintln!("Publish produced no transaction id");
        process::exit(1);
    };
    match Retriever::from_settings(&chain, settings).get_artifact(txid) {
        Ok(retrieved) => {
            print_summary(&retrieved);
            let same = retrieved.fingerprint().ok().as_deref() == Some(receipt.fingerprint.as_str());
            println!("  Round trip: {}", if same { "identical" } else { "DIFFERS" });
            if !same {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            process::exit(1);
        }
    }
}

fn run_config(loaded: &LoadedSettings, json_output: bool) {
    if json_output {
        match serde_json::to_value(loaded) {
            Ok(value) => print_json(&value),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let settings = &loaded.settings;
    println!("Log filter: {}", settings.log_filter);
    println!("Chunk search prefix: {} chars", settings.index.search_prefix_len);
    println!();
    println!("Sources:");
    for source in &loaded.sources {
        match (&source.path, &source.digest) {
            (Some(path), Some(digest)) => println!("  {:?} {} (sha256 {})", source.origin, path, digest),
            _ => println!("  {:?}", source.origin),
        }
    }
}
