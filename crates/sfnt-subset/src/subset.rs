//! Font subsetting pipeline.

use std::collections::{BTreeSet, HashMap};

use crate::{
    errors::SubsetError,
    font::{CmapId, Font, FontBuilder, Glyph, HeadTable, HheaTable, MaxpTable, PostTable},
    write::{write_loca_table, CmapTableBuilder, HmtxTableBuilder, PostTableBuilder},
    ParseError, TableTag,
};

/// Glyph ID mapping from the source font to the subset.
#[derive(Debug, Default)]
struct GlyphMapping {
    /// Source glyph IDs ordered by the new glyph ID.
    old_indices: Vec<u16>,
    old_to_new: HashMap<u16, u16>,
}

impl GlyphMapping {
    fn push(&mut self, old_idx: u16) -> Result<(), SubsetError> {
        if self.old_to_new.contains_key(&old_idx) {
            return Ok(());
        }
        let new_idx =
            u16::try_from(self.old_indices.len()).map_err(|_| SubsetError::TooManyGlyphs)?;
        self.old_indices.push(old_idx);
        self.old_to_new.insert(old_idx, new_idx);
        Ok(())
    }

    fn new_idx(&self, old_idx: u16) -> Option<u16> {
        self.old_to_new.get(&old_idx).copied()
    }

    fn len(&self) -> u16 {
        // Cannot overflow: checked in `push()`
        u16::try_from(self.old_indices.len()).unwrap_or(u16::MAX)
    }
}

/// Subsetter producing a [`Font`] with a subset of glyphs and tables of the source font.
///
/// With the default configuration, the subsetter keeps all glyphs, all `cmap` subtables in a supported
/// format and all tables. Use the builder methods to restrict it. The following tables are rebuilt:
///
/// - `glyf` / `loca`, with glyphs in the selection order and `head.indexToLocFormat` patched
/// - `cmap`, with the mappings restricted to the retained glyphs
/// - `hmtx` and `hhea.numberOfHMetrics`
/// - `maxp.numGlyphs`
/// - `post` versions 1.0 and 2.0 (rebuilt as version 2.0)
///
/// Other tables are copied as-is.
///
/// # Examples
///
/// ```no_run
/// # use sfnt_subset::{CmapId, Font, Subsetter, TableTag};
/// let bytes = std::fs::read("font.ttf")?;
/// let font = Font::new(&bytes)?;
/// let subset = Subsetter::hint_stripper(&font)
///     .glyphs([0, 3, 4, 5])
///     .cmaps([CmapId::WINDOWS_BMP])
///     .remove_tables([TableTag::GPOS, TableTag::GSUB, TableTag::KERN])
///     .subset()?;
/// std::fs::write("subset.woff2", subset.to_woff2())?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Subsetter<'f, 'a> {
    font: &'f Font<'a>,
    glyphs: Option<Vec<u16>>,
    cmap_ids: Option<Vec<CmapId>>,
    removed_tables: BTreeSet<TableTag>,
    strip_hints: bool,
}

impl<'f, 'a> Subsetter<'f, 'a> {
    /// Creates a subsetter for the specified font.
    pub fn new(font: &'f Font<'a>) -> Self {
        Self {
            font,
            glyphs: None,
            cmap_ids: None,
            removed_tables: BTreeSet::new(),
            strip_hints: false,
        }
    }

    /// Creates a subsetter that [strips hinting](Self::strip_hints()) from the font.
    pub fn hint_stripper(font: &'f Font<'a>) -> Self {
        let mut this = Self::new(font);
        this.strip_hints = true;
        this
    }

    /// Sets glyphs to retain. New glyph IDs are assigned in the provided order; duplicates are ignored.
    /// Components of composite glyphs that are not in the list are appended to it.
    pub fn glyphs(&mut self, glyphs: impl IntoIterator<Item = u16>) -> &mut Self {
        self.glyphs = Some(glyphs.into_iter().collect());
        self
    }

    /// Sets IDs of `cmap` subtables to retain. IDs missing from the source font are skipped.
    pub fn cmaps(&mut self, ids: impl IntoIterator<Item = CmapId>) -> &mut Self {
        self.cmap_ids = Some(ids.into_iter().collect());
        self
    }

    /// Adds tables to remove from the font. Tables missing from the source font are ignored.
    pub fn remove_tables(&mut self, tags: impl IntoIterator<Item = TableTag>) -> &mut Self {
        self.removed_tables.extend(tags);
        self
    }

    /// Sets whether to strip TrueType hinting: instructions are removed from all glyphs,
    /// and `fpgm`, `prep` and `cvt ` tables are removed from the font.
    pub fn strip_hints(&mut self, strip_hints: bool) -> &mut Self {
        self.strip_hints = strip_hints;
        self
    }

    /// Produces the subset font.
    ///
    /// # Errors
    ///
    /// Returns an error if the source font is malformed, or a selected glyph is out of range.
    pub fn subset(&self) -> Result<Font<'a>, SubsetError> {
        let num_glyphs = self.font.num_glyphs()?;
        let mut mapping = GlyphMapping::default();
        let selected_glyphs = match &self.glyphs {
            Some(glyphs) => glyphs.clone(),
            None => (0..num_glyphs).collect(),
        };
        for old_idx in selected_glyphs {
            if old_idx >= num_glyphs {
                return Err(ParseError::glyph_out_of_range(old_idx, num_glyphs).into());
            }
            mapping.push(old_idx)?;
        }
        log::debug!(
            "selected {} glyphs out of {num_glyphs} in the source font",
            mapping.len()
        );

        let mut builder = FontBuilder::from_font(self.font);
        if self.font.has_table(TableTag::GLYF) && self.font.has_table(TableTag::LOCA) {
            self.write_glyphs(&mut mapping, &mut builder)?;
        } else {
            log::warn!("font has no `glyf` / `loca` tables; glyph data is not subset");
        }
        log::debug!("subset contains {} glyphs", mapping.len());

        if self.font.has_table(TableTag::CMAP) {
            builder.set_table(TableTag::CMAP, self.build_cmap(&mapping)?);
        }
        if self.font.has_table(TableTag::HMTX) {
            self.write_metrics(&mapping, &mut builder)?;
        }
        if let Some(maxp) = self.font.table_data(TableTag::MAXP) {
            let mut maxp = maxp.to_vec();
            let offset = MaxpTable::NUM_GLYPHS_OFFSET;
            maxp[offset..offset + 2].copy_from_slice(&mapping.len().to_be_bytes());
            builder.set_table(TableTag::MAXP, maxp);
        }
        if self.font.has_table(TableTag::POST) {
            if let Some(post) = self.build_post(&mapping)? {
                builder.set_table(TableTag::POST, post);
            }
        }

        if self.strip_hints {
            log::debug!("removing hinting tables");
            for tag in TableTag::HINTING {
                builder.remove_table(tag);
            }
        }
        for &tag in &self.removed_tables {
            if builder.has_table(tag) {
                log::debug!("removing table `{tag}`");
            }
            builder.remove_table(tag);
        }
        Ok(builder.build())
    }

    /// Writes `glyf` and `loca` tables and patches the `head` table. Extends `mapping`
    /// with the components of composite glyphs.
    fn write_glyphs(
        &self,
        mapping: &mut GlyphMapping,
        builder: &mut FontBuilder<'a>,
    ) -> Result<(), SubsetError> {
        let loca = self.font.loca()?;
        let mut glyphs = Vec::with_capacity(mapping.old_indices.len());
        let mut i = 0;
        while let Some(&old_idx) = mapping.old_indices.get(i) {
            let glyph = self.font.glyph_with_loca(&loca, old_idx)?;
            if let Glyph::Composite(composite) = &glyph {
                for component in composite.components() {
                    mapping.push(component.glyph_idx())?;
                }
            }
            glyphs.push(glyph);
            i += 1;
        }

        let mut glyf = vec![];
        let mut locations = Vec::with_capacity(glyphs.len() + 1);
        locations.push(0);
        for glyph in &glyphs {
            glyph.write(&mut glyf, self.strip_hints, |old_idx| {
                mapping.new_idx(old_idx).unwrap_or(0)
            });
            locations.push(glyf.len());
        }
        log::debug!(
            "wrote {} bytes of glyph data (hints stripped: {})",
            glyf.len(),
            self.strip_hints
        );

        let mut new_loca = vec![];
        let loca_format = write_loca_table(&locations, &mut new_loca);
        builder.set_table(TableTag::GLYF, glyf);
        builder.set_table(TableTag::LOCA, new_loca);

        // The `head` table is validated when parsing `loca`, so it's long enough
        let head = self
            .font
            .table_data(TableTag::HEAD)
            .ok_or_else(|| ParseError::missing_table(TableTag::HEAD))?;
        let mut head = head.to_vec();
        let offset = HeadTable::LOCA_FORMAT_OFFSET;
        head[offset..offset + 2].copy_from_slice(&loca_format.to_raw().to_be_bytes());
        builder.set_table(TableTag::HEAD, head);
        Ok(())
    }

    fn build_cmap(&self, mapping: &GlyphMapping) -> Result<Vec<u8>, ParseError> {
        let cmap = self.font.cmap()?;
        let ids = self.cmap_ids.clone().unwrap_or_else(|| {
            let supported = cmap.subtables().iter().filter(|subtable| subtable.is_supported());
            supported.map(|subtable| subtable.id()).collect()
        });

        let mut builder = CmapTableBuilder::empty();
        for id in ids {
            let subtable = cmap.subtable(id);
            let Some(subtable) = subtable.filter(|subtable| subtable.is_supported()) else {
                log::warn!("skipping `cmap` subtable {id}: it is missing or has unsupported format");
                continue;
            };
            let chars = subtable.mappings().into_iter();
            let chars = chars.filter_map(|(ch, old_idx)| Some((ch, mapping.new_idx(old_idx)?)));
            builder.subtable(id, chars);
        }
        log::debug!(
            "rebuilding `cmap` table with subtables: {:?}",
            builder.subtable_ids().collect::<Vec<_>>()
        );
        Ok(builder.build())
    }

    fn write_metrics(
        &self,
        mapping: &GlyphMapping,
        builder: &mut FontBuilder<'a>,
    ) -> Result<(), ParseError> {
        let hmtx = self.font.hmtx()?;
        let metrics = mapping
            .old_indices
            .iter()
            .map(|&old_idx| hmtx.metric(old_idx))
            .collect::<Result<Vec<_>, _>>()?;
        let hmtx_builder = HmtxTableBuilder::new(metrics);
        builder.set_table(TableTag::HMTX, hmtx_builder.build());

        // The `hhea` table is validated when parsing `hmtx`
        let hhea = self
            .font
            .table_data(TableTag::HHEA)
            .ok_or_else(|| ParseError::missing_table(TableTag::HHEA))?;
        let mut hhea = hhea.to_vec();
        let offset = HheaTable::EXPECTED_LEN - 2;
        let number_of_h_metrics = hmtx_builder.number_of_h_metrics();
        hhea[offset..offset + 2].copy_from_slice(&number_of_h_metrics.to_be_bytes());
        builder.set_table(TableTag::HHEA, hhea);
        Ok(())
    }

    fn build_post(&self, mapping: &GlyphMapping) -> Result<Option<Vec<u8>>, ParseError> {
        let post = self.font.post()?;
        if post.version() != PostTable::VERSION_1 && post.version() != PostTable::VERSION_2 {
            log::debug!(
                "`post` table version {:#x} has no glyph names; copying",
                post.version()
            );
            return Ok(None);
        }

        let names = mapping.old_indices.iter().map(|&old_idx| {
            post.glyph_name(old_idx)
                .map_or_else(|| format!("glyph{old_idx}"), str::to_owned)
        });
        let mut post_builder = PostTableBuilder::new(names);
        post_builder.header(*post.header());
        Ok(Some(post_builder.build()))
    }
}
