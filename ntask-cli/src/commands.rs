use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, warn};

use ntask_config::NativeConfig;
use ntask_core::alloc::MemoryBlockPool;
use ntask_core::{ChecksumTrailer, ObjectKind};
use ntask_registry::{ObjectRegistry, StaticLoader};
use ntask_spill::{IndexReader, PartitionIndex, SpillInfo};
use ntask_telemetry::LogRouter;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "ntask", version, about)]
pub struct Cli {
    /// YAML configuration file (defaults to config/ntask.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Host configuration pair, e.g. --set native.log.device=stdout
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    pub set: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode and verify a spill index file
    Inspect(InspectArgs),
    /// Write a spill index file from a YAML spill layout
    WriteIndex(WriteIndexArgs),
    /// Initialize a registry and list libraries, classes and defaults
    Classes(ClassesArgs),
    /// Carve blocks from a memory arena and print its usage
    Arena(ArenaArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    pub path: PathBuf,
    /// Expect a 4-byte checksum trailer instead of the configured one
    #[arg(long)]
    pub narrow: bool,
    /// Partitions per spill, to label records as spill/partition
    #[arg(long)]
    pub partitions: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct WriteIndexArgs {
    /// YAML file with a `ranges` list of spills and their segments
    pub layout: PathBuf,
    /// Index file to create
    #[arg(short, long)]
    pub output: PathBuf,
    /// Write a 4-byte checksum trailer instead of the configured one
    #[arg(long)]
    pub narrow: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClassesArgs {
    /// Also print registry metrics in Prometheus text format
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ArenaArgs {
    /// Number of blocks to request
    #[arg(long, default_value_t = 16)]
    pub blocks: usize,
    /// Block size in bytes (defaults to the minimum block size)
    #[arg(long)]
    pub block_size: Option<usize>,
    /// Percentage of each block to fill
    #[arg(long, default_value_t = 50)]
    pub fill: u8,
}

/// Spill layout accepted by `write-index`.
#[derive(Debug, Deserialize)]
pub struct SpillLayout {
    pub ranges: Vec<SpillInfo>,
}

pub fn load_config(cli: &Cli) -> Result<NativeConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => NativeConfig::load_from_path(path)?,
        None => NativeConfig::load()?,
    };
    let pairs = cli
        .set
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| CliError::HostPair(pair.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    config.apply_host_pairs(pairs)?;
    Ok(config)
}

pub fn run_command(cli: Cli, config: NativeConfig, router: LogRouter) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Inspect(args) => inspect(&args, &config, &mut out),
        Commands::WriteIndex(args) => write_index(&args, &config, &mut out),
        Commands::Classes(args) => classes(&args, config, router, &mut out),
        Commands::Arena(args) => arena(&args, &config, &mut out),
    }
}

fn trailer(narrow: bool, config: &NativeConfig) -> ChecksumTrailer {
    if narrow {
        ChecksumTrailer::Narrow
    } else {
        config.spill.checksum_trailer
    }
}

fn inspect(args: &InspectArgs, config: &NativeConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let reader = IndexReader::open(&args.path, trailer(args.narrow, config))?;
    writeln!(
        out,
        "{}: {} records, crc32 {:#010x}",
        args.path.display(),
        reader.len(),
        reader.checksum()
    )?;
    for (i, record) in reader.records().iter().enumerate() {
        let label = match args.partitions {
            Some(partitions) if partitions > 0 => format!("{}/{}", i / partitions, i % partitions),
            _ => i.to_string(),
        };
        writeln!(
            out,
            "{label:>8} start={} raw={} part={}",
            record.start_offset, record.raw_length, record.part_length
        )?;
    }
    Ok(())
}

fn write_index(args: &WriteIndexArgs, config: &NativeConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let layout: SpillLayout = serde_yaml::from_str(&fs::read_to_string(&args.layout)?)?;
    let index = PartitionIndex::new(layout.ranges);

    let staging_size = config.spill.buffer_size;
    let mut pool = MemoryBlockPool::new();
    pool.init(staging_size as u64, staging_size)?;
    let block = pool.allocate_min_block()?;

    let trailer = trailer(args.narrow, config);
    let checksum = index.write_ifile_staged(&args.output, trailer, pool.bytes_mut(block)?)?;
    pool.release();

    info!(output = %args.output.display(), "index file written");
    writeln!(
        out,
        "{}: {} records, crc32 {:#010x}, {:?} trailer",
        args.output.display(),
        index.records().len(),
        checksum,
        trailer
    )?;
    Ok(())
}

fn classes(
    args: &ClassesArgs,
    config: NativeConfig,
    router: LogRouter,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let registry = ObjectRegistry::new(config, Arc::new(StaticLoader::new()))?.with_log_router(router);
    registry.init()?;

    for library in registry.class_names() {
        writeln!(out, "{} ({})", library.name, library.path.display())?;
        for class in &library.classes {
            writeln!(out, "  class    {class}")?;
        }
        for function in &library.functions {
            writeln!(out, "  function {function}")?;
        }
    }
    writeln!(out, "defaults:")?;
    for kind in ObjectKind::ALL {
        let class = registry.default_class(kind);
        writeln!(out, "  {:<18} {}", kind.as_str(), class.as_deref().unwrap_or("-"))?;
    }
    if args.metrics {
        match registry.metrics().gather_metrics() {
            Ok(text) => write!(out, "{text}")?,
            Err(e) => warn!(error = %e, "failed to gather metrics"),
        }
    }

    registry.release();
    Ok(())
}

fn arena(args: &ArenaArgs, config: &NativeConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let mut pool = MemoryBlockPool::new();
    pool.init(config.memory.capacity, config.memory.min_block_size)?;
    let block_size = args.block_size.unwrap_or_else(|| pool.min_block_size());
    let fill = block_size * usize::from(args.fill.min(100)) / 100;
    let payload = vec![0xa5u8; fill];

    for _ in 0..args.blocks {
        match pool.allocate_block(block_size) {
            Ok(handle) => {
                pool.append(handle, &payload)?;
            }
            Err(e) => {
                warn!(error = %e, "arena exhausted");
                break;
            }
        }
    }

    writeln!(out, "{}", pool.dump())?;
    let stats = pool.stats();
    writeln!(
        out,
        "granted {} blocks ({} bytes), {} failed requests",
        stats.blocks_granted(),
        stats.bytes_granted(),
        stats.failed_requests()
    )?;
    pool.release();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_pairs_from_set_flags() {
        let cli = Cli::parse_from([
            "ntask",
            "--set",
            "native.spill.checksum.narrow=true",
            "--set",
            "native.min.block.size = 4096",
            "arena",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.spill.checksum_trailer, ChecksumTrailer::Narrow);
        assert_eq!(config.memory.min_block_size, 4096);

        let cli = Cli::parse_from(["ntask", "--set", "no-equals-sign", "arena"]);
        assert!(matches!(load_config(&cli), Err(CliError::HostPair(_))));
    }

    #[test]
    fn write_then_inspect_index() {
        let dir = tempfile::tempdir().unwrap();
        let layout = dir.path().join("layout.yaml");
        let output = dir.path().join("file.out.index");
        fs::write(
            &layout,
            r#"
ranges:
  - path: spill0.out
    segments:
      - { uncompressed_end_offset: 100, real_end_offset: 90 }
      - { uncompressed_end_offset: 250, real_end_offset: 200 }
  - path: spill1.out
    segments:
      - { uncompressed_end_offset: 40, real_end_offset: 30 }
      - { uncompressed_end_offset: 90, real_end_offset: 70 }
"#,
        )
        .unwrap();

        let config = NativeConfig::default();
        let mut out = Vec::new();
        write_index(
            &WriteIndexArgs {
                layout,
                output: output.clone(),
                narrow: true,
            },
            &config,
            &mut out,
        )
        .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("4 records"));

        let mut out = Vec::new();
        inspect(
            &InspectArgs {
                path: output,
                narrow: true,
                partitions: Some(2),
            },
            &config,
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1/1 start=230 raw=50 part=40"));
    }

    #[test]
    fn arena_reports_usage() {
        let mut config = NativeConfig::default();
        config.memory.capacity = 4096;
        config.memory.min_block_size = 1024;
        let mut out = Vec::new();
        arena(
            &ArenaArgs {
                blocks: 8,
                block_size: None,
                fill: 50,
            },
            &config,
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Capacity: 4096 Blocks: 4 Used: 2048/4096 0.500"));
        assert!(text.contains("granted 4 blocks (4096 bytes), 1 failed requests"));
    }

    #[test]
    fn classes_lists_builtin_library() {
        let mut out = Vec::new();
        classes(
            &ClassesArgs { metrics: true },
            NativeConfig::default(),
            LogRouter::new(),
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("NativeTask (libnativetask.so)"));
        assert!(text.contains("  class    NativeTask.Mapper"));
        assert!(text.contains("CombinerType"));
        assert!(text.contains("NativeTask.Folder"));
        assert!(text.contains("ntask_libraries_loaded 1"));
    }
}
