//! mameinfo CLI - Compile and inspect MAME machine info databases.
//!
//! This is the main entry point for the mameinfo command-line application.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use mameinfo::{build_info_file, BuildOptions, BuildOutcome, InfoDatabase, Machine};

/// Machine names are matched without regard to case.
const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// mameinfo - MAME machine info database tool
#[derive(Parser)]
#[command(name = "mameinfo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile `mame -listxml` output into a database
    Build {
        /// XML input, or `-` for stdin
        #[arg(short, long, env = "MAMEINFO_LISTXML")]
        input: PathBuf,

        /// Database file to write
        #[arg(short, long, env = "MAMEINFO_DB")]
        output: PathBuf,

        /// Do not pre-size tables for a full MAME dump
        #[arg(long)]
        no_reserve: bool,
    },

    /// Show header information and table sizes
    Info {
        /// Database file
        #[arg(short, long, env = "MAMEINFO_DB")]
        db: PathBuf,
    },

    /// List machines in a database
    List {
        /// Database file
        #[arg(short, long, env = "MAMEINFO_DB")]
        db: PathBuf,

        /// Name pattern (glob syntax, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show description, year and manufacturer
        #[arg(short = 'l', long)]
        detailed: bool,
    },

    /// Show one machine
    Show {
        /// Database file
        #[arg(short, long, env = "MAMEINFO_DB")]
        db: PathBuf,

        /// Machine short name
        name: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Progress message from the build thread.
struct BuildUpdate {
    machines: usize,
    description: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, no_reserve } => {
            cmd_build(&input, output, !no_reserve)?;
        }
        Commands::Info { db } => {
            cmd_info(&db)?;
        }
        Commands::List { db, filter, detailed } => {
            cmd_list(&db, filter.as_deref(), detailed)?;
        }
        Commands::Show { db, name, json } => {
            cmd_show(&db, &name, json)?;
        }
    }

    Ok(())
}

fn cmd_build(input: &Path, output: PathBuf, reserve_capacity: bool) -> Result<()> {
    let source = if input.as_os_str() == "-" {
        None
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        Some(file)
    };

    let options = BuildOptions {
        reserve_capacity,
        ..Default::default()
    };

    let (tx, rx) = crossbeam_channel::unbounded::<BuildUpdate>();
    let worker = thread::spawn(move || {
        let progress = move |p: &mameinfo::BuildProgress<'_>| {
            let _ = tx.send(BuildUpdate {
                machines: p.machine_count,
                description: p.description.to_owned(),
            });
        };
        match source {
            Some(file) => build_info_file(BufReader::new(file), &output, &options, progress),
            None => build_info_file(std::io::stdin().lock(), &output, &options, progress),
        }
    });

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} machines {wide_msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    for update in rx.iter() {
        pb.set_position(update.machines as u64);
        pb.set_message(update.description);
    }

    let outcome = worker
        .join()
        .map_err(|_| anyhow::anyhow!("Build thread panicked"))?;
    pb.finish_and_clear();

    let summary = match outcome {
        BuildOutcome::Success(summary) => summary,
        failed => anyhow::bail!("{}", failed.message().unwrap_or("Build did not complete")),
    };

    let counts = summary.counts;
    println!(
        "Built {} machines, {} ROMs, {} disks in {:?}",
        { counts.machines },
        { counts.roms },
        { counts.disks },
        summary.elapsed
    );
    println!("Wrote {} bytes", summary.size);
    if summary.dangling_references > 0 {
        println!("{} parent references did not resolve", summary.dangling_references);
    }
    Ok(())
}

fn open_database(path: &Path) -> Result<InfoDatabase> {
    let start = Instant::now();
    let db = InfoDatabase::open(path).with_context(|| format!("Failed to open database {}", path.display()))?;
    tracing::debug!(elapsed = ?start.elapsed(), "opened database");
    Ok(db)
}

fn cmd_info(path: &Path) -> Result<()> {
    let db = open_database(path)?;

    println!("Database: {}", path.display());
    println!("Build:    {}", db.build()?);
    println!();

    let counts = db.counts();
    for (name, count, size) in counts.extents() {
        println!("{:<26} {:>9} x {:>3} bytes", name, count, size);
    }
    println!();
    println!("Tables:  {:>12} bytes", counts.tables_size());
    println!("Strings: {:>12} bytes", db.string_data().len());

    Ok(())
}

fn cmd_list(path: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let db = open_database(path)?;
    let pattern = filter.map(name_pattern).transpose()?;

    let mut count = 0;
    for machine in db.machines() {
        let name = db.string(machine.name)?;
        if let Some(pattern) = &pattern {
            if !pattern.matches_with(&name, NAME_MATCH) {
                continue;
            }
        }

        if detailed {
            println!(
                "{:<16} {:<4} {:<30} {}",
                name,
                db.string(machine.year)?,
                db.string(machine.manufacturer)?,
                db.string(machine.description)?
            );
        } else {
            println!("{}", name);
        }
        count += 1;
    }

    println!("\nTotal: {} machines", count);

    Ok(())
}

fn cmd_show(path: &Path, name: &str, json: bool) -> Result<()> {
    let db = open_database(path)?;
    let machine = db
        .find_machine(name)
        .with_context(|| format!("No machine named {name}"))?;

    if json {
        let value = mameinfo::machine_json(&db, machine)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_machine(&db, machine)
}

fn print_machine(db: &InfoDatabase, machine: &Machine) -> Result<()> {
    let parent_name = |index: Option<u32>| -> Result<String> {
        match index.and_then(|i| db.machine(i)) {
            Some(parent) => Ok(db.string(parent.name)?.into_owned()),
            None => Ok("-".to_owned()),
        }
    };
    let quality = |q: Option<mameinfo::DriverQuality>| q.map_or("-", |q| q.as_str());

    println!("{}: {}", db.string(machine.name)?, db.string(machine.description)?);
    println!("  Year:         {}", db.string(machine.year)?);
    println!("  Manufacturer: {}", db.string(machine.manufacturer)?);
    println!("  Source:       {}", db.string(machine.source_file)?);
    println!("  Clone of:     {}", parent_name(machine.clone_of_index())?);
    println!("  ROM of:       {}", parent_name(machine.rom_of_index())?);
    println!(
        "  Driver:       status {}, emulation {}, cocktail {}",
        quality(machine.quality_status()),
        quality(machine.quality_emulation()),
        quality(machine.quality_cocktail())
    );

    let biossets = db.biossets_of(machine);
    if !biossets.is_empty() {
        println!("  BIOS sets:");
        for bios in biossets {
            let marker = if bios.is_default() { "*" } else { " " };
            println!("   {marker}{:<12} {}", db.string(bios.name)?, db.string(bios.description)?);
        }
    }

    let roms = db.roms_of(machine);
    if !roms.is_empty() {
        println!("  ROMs:");
        for rom in roms {
            let size = rom.size;
            println!(
                "    {:<20} {:>9} {:08x} {:<12} {}",
                db.string(rom.name)?,
                size,
                rom.crc32(),
                db.string(rom.region)?,
                rom.status()
            );
        }
    }

    let disks = db.disks_of(machine);
    if !disks.is_empty() {
        println!("  Disks:");
        for disk in disks {
            println!(
                "    {:<20} {} {}",
                db.string(disk.name)?,
                hex::encode(&disk.sha1),
                disk.status()
            );
        }
    }

    for chip in db.chips_of(machine) {
        let clock = chip.clock;
        println!("  Chip:   {} {} ({}) {} Hz", chip.chip_type(), db.string(chip.name)?, db.string(chip.tag)?, clock);
    }

    for display in db.displays_of(machine) {
        let size = match (display.width(), display.height()) {
            (Some(w), Some(h)) => format!("{w}x{h}"),
            _ => "?".to_owned(),
        };
        let refresh = display.refresh().map_or_else(|| "?".to_owned(), |r| format!("{r:.2}"));
        println!("  Screen: {} {} @ {} Hz, rotate {}", display.display_type(), size, refresh, display.rotate());
    }

    for device in db.devices_of(machine) {
        println!(
            "  Device: {} ({}) [{}]",
            db.string(device.instance_name)?,
            db.string(device.device_type)?,
            db.string(device.extensions)?.trim_end_matches(',')
        );
    }

    for slot in db.slots_of(machine) {
        let mut options = Vec::new();
        for option in db.options_of(slot) {
            let marker = if option.is_default() { "*" } else { "" };
            options.push(format!("{}{marker}", db.string(option.name)?));
        }
        println!("  Slot:   {} = {}", db.string(slot.name)?, options.join(" "));
    }

    for list in db.software_lists_of(machine) {
        println!("  Software list: {} ({})", db.string(list.name)?, list.status());
    }

    for ram in db.ram_options_of(machine) {
        let marker = if ram.is_default() { " (default)" } else { "" };
        println!("  RAM:    {}{marker}", db.string(ram.name)?);
    }

    Ok(())
}

/// Compile a `list --filter` pattern.
fn name_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).with_context(|| format!("Invalid filter pattern {pattern}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, name: &str) -> bool {
        name_pattern(pattern).unwrap().matches_with(name, NAME_MATCH)
    }

    #[test]
    fn test_name_filter() {
        assert!(matches("pac*", "pacman"));
        assert!(matches("*man", "pacman"));
        assert!(matches("p?cman", "pacman"));
        assert!(matches("*", "anything"));
        assert!(matches("PAC*", "pacman"));
        assert!(!matches("pac", "pacman"));
        assert!(!matches("*z*", "pacman"));
        assert!(matches("k*9?", "kof98"));
        assert!(matches("[ab]*", "bzone"));
    }

    #[test]
    fn test_invalid_filter_is_error() {
        assert!(name_pattern("[").is_err());
    }
}
