//! txkv Log Inspector
//!
//! Decodes a transaction log file offline. The server never reads its log;
//! this tool is how an operator looks at one.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use txkv::txlog::{LogReader, Op};

/// txkv log inspector
#[derive(Parser, Debug)]
#[command(name = "txkv-log")]
#[command(about = "Inspect a txkv transaction log")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every record in append order
    Dump {
        /// The log file
        path: PathBuf,

        /// Only print records for this key
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Count records by operation
    Stats {
        /// The log file
        path: PathBuf,
    },

    /// Decode the whole file and report the first corrupt record, if any
    Verify {
        /// The log file
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Dump { path, key } => dump(&path, key.as_deref()),
        Commands::Stats { path } => stats(&path),
        Commands::Verify { path } => verify(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn dump(path: &Path, filter: Option<&str>) -> txkv::Result<()> {
    let mut reader = LogReader::open(path)?;

    loop {
        let offset = reader.offset();
        let event = match reader.next_event()? {
            Some(event) => event,
            None => return Ok(()),
        };

        if let Some(filter) = filter {
            if event.key != filter.as_bytes() {
                continue;
            }
        }

        println!(
            "{:>10}  {:<6}  key={:?}  value={:?}",
            offset,
            event.op,
            String::from_utf8_lossy(&event.key),
            String::from_utf8_lossy(&event.value),
        );
    }
}

fn stats(path: &Path) -> txkv::Result<()> {
    let mut sets = 0u64;
    let mut deletes = 0u64;
    let mut keys = HashSet::new();

    for event in LogReader::open(path)? {
        let event = event?;
        match event.op {
            Op::Set => sets += 1,
            Op::Delete => deletes += 1,
        }
        keys.insert(event.key);
    }

    println!("records:       {}", sets + deletes);
    println!("set:           {}", sets);
    println!("delete:        {}", deletes);
    println!("distinct keys: {}", keys.len());
    Ok(())
}

fn verify(path: &Path) -> txkv::Result<()> {
    let mut reader = LogReader::open(path)?;
    let mut records = 0u64;

    while reader.next_event()?.is_some() {
        records += 1;
    }

    println!("ok: {} records, {} bytes", records, reader.offset());
    Ok(())
}
