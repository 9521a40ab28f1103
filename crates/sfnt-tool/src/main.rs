//! CLI for dumping and subsetting OpenType fonts.
//!
//! Logging is configured with the `RUST_LOG` env var, e.g. `RUST_LOG=debug`.

use std::{fs, io, path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use sfnt_subset::{CmapId, Font, Subsetter, TableTag};

use crate::{
    dump::{DumpArgs, DumpError},
    ranges::{CharList, GlyphList},
};

mod dump;
mod ranges;

/// Dumps and subsets OpenType fonts.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Dumps font tables and glyphs for a font file or all fonts in a directory.
    Dump(DumpArgs),
    /// Subsets a font.
    Subset(SubsetArgs),
}

impl Command {
    fn run(&self, out: &mut impl io::Write) -> Result<(), DumpError> {
        match self {
            Self::Dump(args) => args.run(out),
            Self::Subset(args) => args.run(),
        }
    }
}

#[derive(Debug, Args)]
struct SubsetArgs {
    /// Source font file.
    input: PathBuf,
    /// Output file.
    #[arg(short, long)]
    output: PathBuf,
    /// Glyphs to retain, e.g. `0-5,10`. Glyph 0 is always retained. If neither glyphs nor chars
    /// are specified, all glyphs are retained.
    #[arg(long, value_name = "RANGE")]
    glyphs: Option<GlyphList>,
    /// Chars to retain, e.g. `U+20-U+7E`.
    #[arg(long, value_name = "RANGE")]
    chars: Option<CharList>,
    /// `cmap` subtable to retain, e.g. `3,1`. By default, all subtables in supported formats
    /// are retained.
    #[arg(long = "cmap", value_name = "PID,EID")]
    cmaps: Vec<CmapId>,
    /// Table to remove, e.g. `GPOS`.
    #[arg(long = "remove-table", value_name = "TAG")]
    removed_tables: Vec<TableTag>,
    /// Strip TrueType hinting instructions and tables.
    #[arg(long)]
    strip_hints: bool,
    /// Write the subset in the WOFF2 format.
    #[arg(long)]
    woff2: bool,
}

impl SubsetArgs {
    fn run(&self) -> Result<(), DumpError> {
        let bytes = fs::read(&self.input).map_err(DumpError::io(&self.input))?;
        let font = Font::new(&bytes)?;

        let mut subsetter = Subsetter::new(&font);
        subsetter
            .strip_hints(self.strip_hints)
            .remove_tables(self.removed_tables.iter().copied());
        if !self.cmaps.is_empty() {
            subsetter.cmaps(self.cmaps.iter().copied());
        }
        if let Some(glyphs) = self.selected_glyphs(&font)? {
            subsetter.glyphs(glyphs);
        }
        let subset = subsetter.subset()?;

        let output = if self.woff2 {
            subset.to_woff2()
        } else {
            subset.to_truetype()
        };
        log::info!(
            "writing {} bytes to `{}`",
            output.len(),
            self.output.display()
        );
        fs::write(&self.output, output).map_err(DumpError::io(&self.output))
    }

    fn selected_glyphs(&self, font: &Font<'_>) -> Result<Option<Vec<u16>>, DumpError> {
        if self.glyphs.is_none() && self.chars.is_none() {
            return Ok(None);
        }

        let mut glyphs = vec![0];
        if let Some(GlyphList(selected)) = &self.glyphs {
            glyphs.extend_from_slice(selected);
        }
        if let Some(CharList(chars)) = &self.chars {
            let cmap = font.cmap()?;
            for &ch in chars {
                match cmap.map_char(ch) {
                    Ok(0) => log::warn!("char U+{:04X} is not mapped", u32::from(ch)),
                    Ok(glyph_idx) => glyphs.push(glyph_idx),
                    Err(err) => log::warn!("failed mapping char U+{:04X}: {err}", u32::from(ch)),
                }
            }
        }
        Ok(Some(glyphs))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    if let Err(err) = cli.command.run(&mut stdout) {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
