use crate::error::CliError;
use crate::util::{
    canonicalize_cli_path, check_crn_extension, find_all_files, handle_process_entry_error,
    with_mapped_file, Throughput,
};
use argh::FromArgs;
use bytesize::ByteSize;
use crn_decompress_api::{validate_file, CrunchedData};
use rayon::prelude::*;
use std::fs::DirEntry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(FromArgs, Debug)]
/// Validate every CRN file in a directory: checksums, tables, palettes and all levels
#[argh(subcommand, name = "validate")]
pub struct ValidateCmd {
    /// input directory path
    #[argh(option, from_str_fn(canonicalize_cli_path))]
    pub input: PathBuf,
}

/// Counters shared by the validation workers.
#[derive(Debug, Default)]
pub struct ValidationStats {
    pub valid: AtomicU64,
    pub invalid: AtomicU64,
    pub bytes_processed: AtomicU64,
}

pub fn handle_validate_command(cmd: ValidateCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries = Vec::new();
    find_all_files(&cmd.input, &mut entries)?;

    let start = Instant::now();
    let stats = ValidationStats::default();
    validate_entries(&entries, &stats);

    let elapsed = start.elapsed();
    let total_bytes = stats.bytes_processed.load(Ordering::Relaxed);
    let valid = stats.valid.load(Ordering::Relaxed);
    let invalid = stats.invalid.load(Ordering::Relaxed);

    println!("\n=== Validation Complete ===");
    println!("Valid: {valid}");
    println!("Invalid: {invalid}");
    println!("Time taken: {elapsed:.2?}");
    println!("Data processed: {}", ByteSize(total_bytes));
    println!(
        "Throughput: {}",
        Throughput::from_elapsed(total_bytes, elapsed)
    );

    if invalid > 0 {
        return Err(format!("{invalid} file(s) failed validation").into());
    }
    Ok(())
}

/// Validates every `.crn` entry in parallel, printing failures to stderr.
pub fn validate_entries(entries: &[DirEntry], stats: &ValidationStats) {
    entries.par_iter().for_each(|entry| {
        let path = entry.path();
        if check_crn_extension(&path).is_err() {
            return;
        }

        let result = with_mapped_file(&path, |data| {
            stats
                .bytes_processed
                .fetch_add(data.len() as u64, Ordering::Relaxed);
            validate_data(&path, data)
        });
        match result {
            Ok(()) => stats.valid.fetch_add(1, Ordering::Relaxed),
            Err(_) => stats.invalid.fetch_add(1, Ordering::Relaxed),
        };
        handle_process_entry_error(result);
    });
}

/// Checks the header and checksums, then unpacks every level into scratch memory.
pub fn validate_data(path: &Path, data: &[u8]) -> Result<(), CliError> {
    validate_file(data).map_err(|e| CliError::decompress(path, e))?;

    let crunched = CrunchedData::new(data).map_err(|e| CliError::decompress(path, e))?;
    let texture = crunched.texture_info();
    if !texture.format.can_unpack() {
        // Described but not unpackable; the header checks above are all that apply.
        return Ok(());
    }
    for level in 0..texture.levels {
        crunched
            .decode_level(level)
            .map_err(|e| CliError::decompress(path, e))?;
    }
    Ok(())
}
