use crate::error::CliError;
use crate::util::{canonicalize_existing_file, with_mapped_file};
use argh::FromArgs;
use bytesize::ByteSize;
use crn_decompress_api::{get_level_info, get_texture_info, validate_file};
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[derive(FromArgs, Debug)]
/// Print the texture, level and layout information of a CRN file
#[argh(subcommand, name = "info")]
pub struct InfoCmd {
    /// input file path
    #[argh(option, from_str_fn(canonicalize_existing_file))]
    pub input: PathBuf,
}

pub fn handle_info_command(cmd: InfoCmd) -> Result<(), Box<dyn std::error::Error>> {
    let report = with_mapped_file(&cmd.input, |data| describe_file(&cmd.input, data))?;
    print!("{report}");
    Ok(())
}

/// Builds the human readable report printed by `info`.
pub fn describe_file(path: &Path, data: &[u8]) -> Result<String, CliError> {
    let texture = get_texture_info(data).map_err(|e| CliError::decompress(path, e))?;

    // Infallible: writing to a String.
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", path.display());
    let _ = writeln!(out, "File size: {}", ByteSize(data.len() as u64));
    let _ = writeln!(out, "Format: {}", texture.format);
    let _ = writeln!(out, "Dimensions: {}x{}", texture.width, texture.height);
    let _ = writeln!(out, "Levels: {}", texture.levels);
    let _ = writeln!(out, "Faces: {}", texture.faces);
    let _ = writeln!(out, "Bytes per block: {}", texture.bytes_per_block);
    let _ = writeln!(
        out,
        "User data: {:#010X} {:#010X}",
        texture.userdata0, texture.userdata1
    );

    let _ = writeln!(out, "\nLevels:");
    for level_index in 0..texture.levels {
        let level = get_level_info(data, level_index).map_err(|e| CliError::decompress(path, e))?;
        let _ = writeln!(
            out,
            "  [{level_index}] {}x{} ({}x{} blocks, {} per face)",
            level.width,
            level.height,
            level.blocks_x,
            level.blocks_y,
            ByteSize(level.face_size() as u64)
        );
    }

    match validate_file(data) {
        Ok(file) => {
            let _ = writeln!(out, "\nChecksums: OK");
            let _ = writeln!(out, "Header size: {}", file.header_size);
            let _ = writeln!(out, "Tables: {}", ByteSize(file.tables_size as u64));
            let _ = writeln!(
                out,
                "Palettes: {} (colour {} endpoints / {} selectors, alpha {} endpoints / {} selectors)",
                ByteSize(file.total_palette_size as u64),
                file.color_endpoint_palette_entries,
                file.color_selector_palette_entries,
                file.alpha_endpoint_palette_entries,
                file.alpha_selector_palette_entries
            );
            for (level_index, size) in file
                .level_compressed_size
                .iter()
                .take(file.levels as usize)
                .enumerate()
            {
                let _ = writeln!(
                    out,
                    "  level {level_index}: {} compressed",
                    ByteSize(*size as u64)
                );
            }
        }
        Err(e) => {
            let _ = writeln!(out, "\nValidation failed: {e}");
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crn_decompress::test_prelude::CrnBuilder;
    use crn_decompress::CrnFormat;

    #[test]
    fn describes_valid_file() {
        let data = CrnBuilder::patterned(CrnFormat::Dxt5, 32, 16, 3)
            .with_mip_levels(2)
            .build();
        let report = describe_file(Path::new("wall.crn"), &data).unwrap();

        assert!(report.contains("Format: DXT5"));
        assert!(report.contains("Dimensions: 32x16"));
        assert!(report.contains("[1] 16x8 (4x2 blocks"));
        assert!(report.contains("Checksums: OK"));
        assert!(report.contains("level 1:"));
    }

    #[test]
    fn reports_checksum_failure_without_erroring() {
        let mut data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        let last = data.len() - 1;
        data[last] ^= 0xFF;

        let report = describe_file(Path::new("bad.crn"), &data).unwrap();
        assert!(report.contains("Validation failed"));
    }

    #[test]
    fn rejects_non_crn_data() {
        let result = describe_file(Path::new("junk.crn"), b"not a crunched texture at all");
        assert!(matches!(result, Err(CliError::Decompress { .. })));
    }
}
