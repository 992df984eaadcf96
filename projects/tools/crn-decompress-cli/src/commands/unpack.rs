use crate::dds::{write_dds_header, DdsLayout, DDS_HEADER_SIZE};
use crate::error::CliError;
use crate::util::{
    canonicalize_cli_path, check_crn_extension, find_all_files, handle_process_entry_error,
    output_path_for, with_mapped_file, with_output_mapping, Throughput,
};
use argh::FromArgs;
use bytesize::ByteSize;
use crn_decompress_api::{CrnDecompressError, CrunchedData};
use rayon::prelude::*;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(FromArgs, Debug)]
/// Unpack every CRN file in a directory to DDS or raw RGBA
#[argh(subcommand, name = "unpack")]
pub struct UnpackCmd {
    /// input directory path
    #[argh(option, from_str_fn(canonicalize_cli_path))]
    pub input: PathBuf,

    /// output directory path
    #[argh(option, from_str_fn(canonicalize_cli_path))]
    pub output: PathBuf,

    /// output format: dds, rgba [default: dds]
    #[argh(option, default = "OutputFormat::Dds")]
    pub format: OutputFormat,
}

/// What `unpack` writes for each input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// DXT blocks of every level and face, behind a DDS header.
    Dds,
    /// RGBA8888 pixels of the top level of the first face, without a header.
    Rgba,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dds => "dds",
            Self::Rgba => "rgba",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dds" => Ok(Self::Dds),
            "rgba" => Ok(Self::Rgba),
            _ => Err(format!("Unknown output format: {s}. Valid options: dds, rgba")),
        }
    }
}

pub fn handle_unpack_command(cmd: UnpackCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries = Vec::new();
    find_all_files(&cmd.input, &mut entries)?;

    if entries.is_empty() {
        println!("No files found in input directory.");
        return Ok(());
    }

    println!("Found {} files to process\n", entries.len());

    let start = Instant::now();
    let bytes_processed = AtomicU64::new(0);
    let bytes_written = AtomicU64::new(0);
    entries.par_iter().for_each(|entry| {
        let result = process_file_unpack(
            entry,
            &cmd.input,
            &cmd.output,
            cmd.format,
            &bytes_processed,
            &bytes_written,
        );
        handle_process_entry_error(result);
    });

    let elapsed = start.elapsed();
    let total_bytes = bytes_processed.load(Ordering::Relaxed);
    let total_written = bytes_written.load(Ordering::Relaxed);

    println!("\n=== Unpack Complete ===");
    println!("Time taken: {elapsed:.2?}");
    println!("Data processed: {}", ByteSize(total_bytes));
    println!("Data written: {}", ByteSize(total_written));
    println!(
        "Throughput: {}",
        Throughput::from_elapsed(total_bytes, elapsed)
    );

    Ok(())
}

pub fn process_file_unpack(
    entry: &DirEntry,
    input_dir: &Path,
    output_dir: &Path,
    format: OutputFormat,
    bytes_processed: &AtomicU64,
    bytes_written: &AtomicU64,
) -> Result<(), CliError> {
    let path = entry.path();
    check_crn_extension(&path)?;

    let target_path = output_path_for(&path, input_dir, output_dir, format.extension());
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = with_mapped_file(&path, |data| {
        let written = match format {
            OutputFormat::Dds => unpack_to_dds(&path, data, &target_path),
            OutputFormat::Rgba => unpack_to_rgba(&path, data, &target_path),
        }?;
        bytes_processed.fetch_add(data.len() as u64, Ordering::Relaxed);
        Ok(written)
    })?;
    bytes_written.fetch_add(written as u64, Ordering::Relaxed);
    Ok(())
}

/// Writes every level and face of `data` to `target_path` as a DDS file.
///
/// Levels are unpacked straight into the memory mapped output. The output file
/// is removed again if unpacking fails part way.
///
/// # Returns
///
/// Number of bytes written.
pub fn unpack_to_dds(path: &Path, data: &[u8], target_path: &Path) -> Result<usize, CliError> {
    let crunched = CrunchedData::new(data).map_err(|e| CliError::decompress(path, e))?;
    let texture = crunched.texture_info();
    if !texture.format.can_unpack() {
        return Err(CliError::decompress(
            path,
            CrnDecompressError::UnsupportedFormat(texture.format as u32),
        ));
    }

    let levels = (0..texture.levels)
        .map(|level| crunched.level_info(level))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CliError::decompress(path, e))?;
    let layout = DdsLayout::new(levels, texture.faces);
    let size = layout.file_size();

    let result = with_output_mapping(target_path, size, |output| {
        let (header, body) = output.split_at_mut(DDS_HEADER_SIZE);
        write_dds_header(header, &texture, &layout);
        for (level, mut faces) in layout.split_levels(body).into_iter().enumerate() {
            crunched
                .decode_level_into(&mut faces, 0, level as u32)
                .map_err(|e| CliError::decompress(path, e))?;
        }
        Ok(size)
    });
    if result.is_err() {
        let _ = fs::remove_file(target_path);
    }
    result
}

/// Writes the top level of the first face of `data` to `target_path` as RGBA8888 pixels.
///
/// # Returns
///
/// Number of bytes written.
pub fn unpack_to_rgba(path: &Path, data: &[u8], target_path: &Path) -> Result<usize, CliError> {
    let crunched = CrunchedData::new(data).map_err(|e| CliError::decompress(path, e))?;
    let rgba = crunched
        .decode_level_rgba(0, 0)
        .map_err(|e| CliError::decompress(path, e))?;
    fs::write(target_path, &rgba)?;
    Ok(rgba.len())
}
