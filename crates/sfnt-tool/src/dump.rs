//! `dump` subcommand.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args, ValueEnum};
use sfnt_subset::{CmapId, Font, Glyph, ParseError, SubsetError, TableTag};
use thiserror::Error;

use crate::ranges::{CharList, GlyphList};

#[derive(Debug, Error)]
pub(crate) enum DumpError {
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed writing output: {0}")]
    Output(#[from] io::Error),
    #[error("failed parsing font: {0}")]
    Parse(#[from] ParseError),
    #[error("failed subsetting font: {0}")]
    Subset(#[from] SubsetError),
    #[error("font has no `cmap` subtable {0}")]
    MissingCmap(CmapId),
    #[error("failed processing {failed} out of {total} files")]
    Batch { failed: usize, total: usize },
}

impl DumpError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_owned(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CmapDetail {
    /// Dump all char mappings.
    Mapping,
}

/// Arguments of the `dump` subcommand. If no dump flags are specified, the table directory is dumped.
#[derive(Debug, Args)]
pub(crate) struct DumpArgs {
    /// Dump the table directory, `name`, `cmap`, `post` and `EBLC` tables.
    #[arg(short, long)]
    pub(crate) all: bool,
    /// Dump the table directory.
    #[arg(long)]
    pub(crate) tables: bool,
    /// Hex-dump the table with the specified tag.
    #[arg(short = 't', long = "table", value_name = "TAG")]
    pub(crate) table: Vec<TableTag>,
    /// Dump the `name` table.
    #[arg(long)]
    pub(crate) name: bool,
    /// Dump `cmap` subtables; `--cmap=mapping` additionally dumps all char mappings.
    #[arg(long, value_name = "DETAIL", num_args = 0..=1, require_equals = true)]
    pub(crate) cmap: Option<Option<CmapDetail>>,
    /// Dump glyphs with the specified IDs, e.g. `0-5,10`.
    #[arg(short, long = "glyph", value_name = "RANGE")]
    pub(crate) glyphs: Option<GlyphList>,
    /// Dump glyphs for the specified chars, e.g. `U+41-U+5A,0xC4`.
    #[arg(short, long = "char", value_name = "RANGE")]
    pub(crate) chars: Option<CharList>,
    /// `cmap` subtable to map chars with, e.g. `3,1`. By default, the preferred Unicode subtable is used.
    #[arg(long = "cm", value_name = "PID,EID")]
    pub(crate) cmap_id: Option<CmapId>,
    /// Dump the `post` table.
    #[arg(long)]
    pub(crate) post: bool,
    /// Dump the `EBLC` table.
    #[arg(long)]
    pub(crate) eblc: bool,
    /// Font file or a directory with font files.
    pub(crate) path: PathBuf,
}

impl DumpArgs {
    pub(crate) fn run(&self, out: &mut impl Write) -> Result<(), DumpError> {
        if self.path.is_dir() {
            self.dump_dir(out)
        } else {
            self.dump_file(&self.path, out)
        }
    }

    fn dump_dir(&self, out: &mut impl Write) -> Result<(), DumpError> {
        let mut paths = vec![];
        for entry in fs::read_dir(&self.path).map_err(DumpError::io(&self.path))? {
            let entry = entry.map_err(DumpError::io(&self.path))?;
            let is_hidden = entry.file_name().to_string_lossy().starts_with('.');
            let file_type = entry.file_type().map_err(DumpError::io(&entry.path()))?;
            if !is_hidden && file_type.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();
        log::debug!("dumping {} files in `{}`", paths.len(), self.path.display());

        let mut failed = 0;
        for path in &paths {
            writeln!(out, "== {} ==", path.display())?;
            if let Err(err) = self.dump_file(path, out) {
                log::error!("failed dumping `{}`: {err}", path.display());
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(DumpError::Batch {
                failed,
                total: paths.len(),
            });
        }
        Ok(())
    }

    fn dump_file(&self, path: &Path, out: &mut impl Write) -> Result<(), DumpError> {
        let bytes = fs::read(path).map_err(DumpError::io(path))?;
        let font = Font::new(&bytes)?;
        let mut dumper = Dumper { font: &font, out };

        let has_selection = self.tables
            || !self.table.is_empty()
            || self.name
            || self.cmap.is_some()
            || self.glyphs.is_some()
            || self.chars.is_some()
            || self.post
            || self.eblc;
        if self.all || self.tables || !has_selection {
            dumper.tables()?;
        }
        for &tag in &self.table {
            dumper.table(tag)?;
        }
        if self.all || self.name {
            dumper.name()?;
        }
        if self.all || self.cmap.is_some() {
            let with_mapping = self.cmap.flatten() == Some(CmapDetail::Mapping);
            dumper.cmap(with_mapping)?;
        }
        if self.glyphs.is_some() || self.chars.is_some() {
            if dumper.has_glyph_data() {
                if let Some(GlyphList(glyphs)) = &self.glyphs {
                    dumper.glyphs(glyphs)?;
                }
                if let Some(CharList(chars)) = &self.chars {
                    dumper.chars(chars, self.cmap_id)?;
                }
            } else {
                log::warn!(
                    "`{}` has no `loca` / `glyf` tables; skipping glyph dump",
                    path.display()
                );
                writeln!(dumper.out, "no `loca` / `glyf` tables; glyphs are not dumped")?;
            }
        }
        if self.all || self.post {
            dumper.post()?;
        }
        if self.all || self.eblc {
            dumper.eblc()?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Dumper<'f, 'a, W> {
    font: &'f Font<'a>,
    out: W,
}

impl<W: Write> Dumper<'_, '_, W> {
    fn has_glyph_data(&self) -> bool {
        self.font.has_table(TableTag::LOCA) && self.font.has_table(TableTag::GLYF)
    }

    /// Returns `false` and reports the missing table if it's not present.
    fn check_table(&mut self, tag: TableTag) -> io::Result<bool> {
        if self.font.has_table(tag) {
            Ok(true)
        } else {
            writeln!(self.out, "no `{tag}` table")?;
            Ok(false)
        }
    }

    fn tables(&mut self) -> Result<(), DumpError> {
        writeln!(self.out, "{} tables", self.font.table_tags().len())?;
        for tag in self.font.table_tags() {
            let len = self.font.table_data(tag).map_or(0, <[u8]>::len);
            writeln!(self.out, "  {tag}  {len:>8} bytes")?;
        }
        Ok(())
    }

    fn table(&mut self, tag: TableTag) -> Result<(), DumpError> {
        let Some(data) = self.font.table_data(tag) else {
            writeln!(self.out, "no `{tag}` table")?;
            return Ok(());
        };
        writeln!(self.out, "`{tag}` table ({} bytes):", data.len())?;
        for (i, chunk) in data.chunks(16).enumerate() {
            write!(self.out, "{:08x} ", i * 16)?;
            for byte in chunk {
                write!(self.out, " {byte:02x}")?;
            }
            for _ in chunk.len()..16 {
                write!(self.out, "   ")?;
            }
            let ascii: String = chunk
                .iter()
                .map(|&byte| {
                    if byte.is_ascii_graphic() || byte == b' ' {
                        char::from(byte)
                    } else {
                        '.'
                    }
                })
                .collect();
            writeln!(self.out, "  |{ascii}|")?;
        }
        Ok(())
    }

    fn name(&mut self) -> Result<(), DumpError> {
        if !self.check_table(TableTag::NAME)? {
            return Ok(());
        }
        let name = self.font.name()?;
        writeln!(
            self.out,
            "`name` table: format {}, {} records",
            name.format(),
            name.records().len()
        )?;
        for record in name.records() {
            writeln!(
                self.out,
                "  platform {} encoding {} language {:#06x} name #{}: {:?}",
                record.platform_id,
                record.encoding_id,
                record.language_id,
                record.name_id,
                record.decode()
            )?;
        }
        Ok(())
    }

    fn cmap(&mut self, with_mapping: bool) -> Result<(), DumpError> {
        if !self.check_table(TableTag::CMAP)? {
            return Ok(());
        }
        let cmap = self.font.cmap()?;
        writeln!(self.out, "`cmap` table: {} subtables", cmap.num_subtables())?;
        for subtable in cmap.subtables() {
            let support = if subtable.is_supported() {
                ""
            } else {
                " (unsupported)"
            };
            writeln!(
                self.out,
                "  subtable {}: format {}{support}",
                subtable.id(),
                subtable.format()
            )?;
            if with_mapping && subtable.is_supported() {
                for (ch, glyph_idx) in subtable.mappings() {
                    writeln!(self.out, "    U+{:04X} -> {glyph_idx}", u32::from(ch))?;
                }
            }
        }
        Ok(())
    }

    fn glyphs(&mut self, glyphs: &[u16]) -> Result<(), DumpError> {
        let loca = self.font.loca()?;
        for &glyph_idx in glyphs {
            if glyph_idx >= loca.glyph_count() {
                writeln!(
                    self.out,
                    "glyph #{glyph_idx}: out of range (font has {} glyphs)",
                    loca.glyph_count()
                )?;
                continue;
            }
            match self.font.glyph(glyph_idx) {
                Ok(glyph) => self.glyph(glyph_idx, &glyph)?,
                Err(err) => writeln!(self.out, "glyph #{glyph_idx}: {err}")?,
            }
        }
        Ok(())
    }

    fn glyph(&mut self, glyph_idx: u16, glyph: &Glyph<'_>) -> io::Result<()> {
        let details = format!(
            "{} instruction bytes, padding {}",
            glyph.instruction_size(),
            glyph.padding()
        );
        match glyph {
            Glyph::Simple(simple) => writeln!(
                self.out,
                "glyph #{glyph_idx}: simple, {} contours, {details}",
                simple.number_of_contours()
            ),
            Glyph::Composite(composite) => {
                writeln!(
                    self.out,
                    "glyph #{glyph_idx}: composite, {} components, bbox {:?}, {details}",
                    composite.components().len(),
                    composite.bounding_box()
                )?;
                for component in composite.components() {
                    let (x, y) = component.arguments();
                    writeln!(
                        self.out,
                        "  component #{}: flags {:#06x}, args ({x}, {y})",
                        component.glyph_idx(),
                        component.flags()
                    )?;
                }
                Ok(())
            }
            _ => writeln!(self.out, "glyph #{glyph_idx}: empty"),
        }
    }

    fn chars(&mut self, chars: &[char], cmap_id: Option<CmapId>) -> Result<(), DumpError> {
        let cmap = self.font.cmap()?;
        let subtable = match cmap_id {
            Some(id) => Some(cmap.subtable(id).ok_or(DumpError::MissingCmap(id))?),
            None => cmap.unicode_subtable(),
        };
        let Some(subtable) = subtable else {
            writeln!(self.out, "no Unicode `cmap` subtable; chars are not dumped")?;
            return Ok(());
        };

        let loca = self.font.loca()?;
        for &ch in chars {
            let code = u32::from(ch);
            match subtable.map_char(ch) {
                Ok(glyph_idx) if glyph_idx < loca.glyph_count() => {
                    write!(self.out, "U+{code:04X} -> ")?;
                    match self.font.glyph(glyph_idx) {
                        Ok(glyph) => self.glyph(glyph_idx, &glyph)?,
                        Err(err) => writeln!(self.out, "glyph #{glyph_idx}: {err}")?,
                    }
                }
                Ok(glyph_idx) => {
                    writeln!(self.out, "U+{code:04X} -> glyph #{glyph_idx}: out of range")?;
                }
                Err(err) => writeln!(self.out, "U+{code:04X}: {err}")?,
            }
        }
        Ok(())
    }

    fn post(&mut self) -> Result<(), DumpError> {
        if !self.check_table(TableTag::POST)? {
            return Ok(());
        }
        let post = self.font.post()?;
        let header = post.header();
        writeln!(self.out, "`post` table: version {:#010x}", post.version())?;
        writeln!(
            self.out,
            "  italic angle: {}",
            f64::from(header.italic_angle) / 65_536.0
        )?;
        writeln!(
            self.out,
            "  underline: position {}, thickness {}",
            header.underline_position, header.underline_thickness
        )?;
        writeln!(self.out, "  fixed pitch: {}", header.is_fixed_pitch != 0)?;

        let name_count = post.number_of_glyphs().unwrap_or(0);
        for glyph_idx in (0..=u16::MAX).take(name_count) {
            if let Some(name) = post.glyph_name(glyph_idx) {
                writeln!(self.out, "  glyph #{glyph_idx}: {name}")?;
            }
        }
        Ok(())
    }

    fn eblc(&mut self) -> Result<(), DumpError> {
        if !self.check_table(TableTag::EBLC)? {
            return Ok(());
        }
        let eblc = self.font.eblc()?;
        writeln!(
            self.out,
            "`EBLC` table: version {:#010x}, {} strikes",
            eblc.version(),
            eblc.strikes().len()
        )?;
        for (i, strike) in eblc.strikes().iter().enumerate() {
            writeln!(
                self.out,
                "  strike #{i}: ppem {}x{}, {} bpp, glyphs {}..={}, {} index subtables",
                strike.ppem_x,
                strike.ppem_y,
                strike.bit_depth,
                strike.start_glyph_idx,
                strike.end_glyph_idx,
                strike.number_of_index_subtables
            )?;
        }
        Ok(())
    }
}
