use std::{collections::BTreeMap, env, io::Write, process::Command, sync::OnceLock};

use allsorts::{binary::read::ReadScope, font::MatchingPresentation, font_data::FontData};
use test_casing::test_casing;

use crate::{
    errors::ParseErrorKind, CmapId, CmapTableBuilder, Font, FontBuilder, Glyph, HmtxTableBuilder,
    HorizontalMetric, PostHeader, PostTableBuilder, SubsetError, Subsetter, TableTag,
};

const ON_CURVE_POINT: u8 = 0x01;
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

fn push_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn push_i16(buffer: &mut Vec<u8>, value: i16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn pad_to_even(buffer: &mut Vec<u8>) {
    if buffer.len() % 2 != 0 {
        buffer.push(0);
    }
}

/// Creates a simple glyph with a single contour consisting of on-curve points. Coordinates
/// are encoded as words.
pub(crate) fn simple_glyph(points: &[(i16, i16)], instructions: &[u8]) -> Vec<u8> {
    let x_min = points.iter().map(|&(x, _)| x).min().unwrap_or(0);
    let x_max = points.iter().map(|&(x, _)| x).max().unwrap_or(0);
    let y_min = points.iter().map(|&(_, y)| y).min().unwrap_or(0);
    let y_max = points.iter().map(|&(_, y)| y).max().unwrap_or(0);

    let mut buffer = vec![];
    push_i16(&mut buffer, 1); // numberOfContours
    for coordinate in [x_min, y_min, x_max, y_max] {
        push_i16(&mut buffer, coordinate);
    }
    push_u16(&mut buffer, u16::try_from(points.len() - 1).unwrap()); // endPtsOfContours
    push_u16(&mut buffer, u16::try_from(instructions.len()).unwrap());
    buffer.extend_from_slice(instructions);
    buffer.extend(points.iter().map(|_| ON_CURVE_POINT));

    let mut prev = (0, 0);
    for &(x, _) in points {
        push_i16(&mut buffer, x - prev.0);
        prev.0 = x;
    }
    for &(_, y) in points {
        push_i16(&mut buffer, y - prev.1);
        prev.1 = y;
    }
    pad_to_even(&mut buffer);
    buffer
}

/// Creates a composite glyph from `(glyph_idx, x, y)` components.
pub(crate) fn composite_glyph(components: &[(u16, i16, i16)], instructions: &[u8]) -> Vec<u8> {
    let mut buffer = vec![];
    push_i16(&mut buffer, -1); // numberOfContours
    for coordinate in [0, 0, 500, 700] {
        push_i16(&mut buffer, coordinate);
    }
    for (i, &(glyph_idx, x, y)) in components.iter().enumerate() {
        let is_last = i + 1 == components.len();
        let mut flags = ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES;
        if !is_last {
            flags |= MORE_COMPONENTS;
        } else if !instructions.is_empty() {
            flags |= WE_HAVE_INSTRUCTIONS;
        }
        push_u16(&mut buffer, flags);
        push_u16(&mut buffer, glyph_idx);
        push_i16(&mut buffer, x);
        push_i16(&mut buffer, y);
    }
    if !instructions.is_empty() {
        push_u16(&mut buffer, u16::try_from(instructions.len()).unwrap());
        buffer.extend_from_slice(instructions);
    }
    pad_to_even(&mut buffer);
    buffer
}

pub(crate) const GLYPH_COUNT: u16 = 14;

/// Glyph 0 is `.notdef`, 1 is an empty glyph (space), 2..=11 are simple glyphs, 12 and 13 are composite
/// (13 refers to 12).
fn test_glyphs() -> Vec<Vec<u8>> {
    let mut glyphs = vec![
        simple_glyph(&[(0, 0), (0, 700), (500, 700), (500, 0)], &[0xb0, 0x00]),
        vec![],
    ];
    for i in 2_i16..10 {
        let point_count = 3 + i % 3;
        let points: Vec<_> = (0..point_count).map(|j| (j * 100, (j % 2) * i * 50)).collect();
        let instructions: Vec<u8> = (0..i % 4).map(|j| 0xb0 + j as u8).collect();
        glyphs.push(simple_glyph(&points, &instructions));
    }
    glyphs.push(simple_glyph(&[(0, 0), (250, 500), (500, 0)], &[]));
    glyphs.push(simple_glyph(
        &[(0, 0), (0, 500), (250, 700), (500, 500), (500, 0)],
        &[0x4b, 0x42, 0x01],
    ));
    glyphs.push(composite_glyph(&[(2, 10, 0), (3, 300, 0)], &[0x4b]));
    glyphs.push(composite_glyph(&[(12, 0, 0), (5, 10, 10)], &[]));
    assert_eq!(glyphs.len(), usize::from(GLYPH_COUNT));
    glyphs
}

/// Char mapping for the test font.
pub(crate) fn test_char_map() -> BTreeMap<char, u16> {
    let mut map = BTreeMap::from([(' ', 1), ('a', 10), ('b', 11), ('Ä', 12), ('Å', 13)]);
    map.extend(('A'..='H').zip(2..));
    map
}

fn test_glyph_names() -> Vec<&'static str> {
    let mut names = vec![".notdef", "space", "A", "B", "C", "D", "E", "F", "G", "H"];
    names.extend(["a", "b", "Adieresis", "A.ring_custom"]);
    names
}

pub(crate) fn test_metrics() -> Vec<HorizontalMetric> {
    (0..GLYPH_COUNT)
        .map(|i| {
            let advance_width = if i < 10 { 500 + 10 * i } else { 600 };
            HorizontalMetric::new(advance_width, i16::try_from(i).unwrap())
        })
        .collect()
}

fn head_table() -> Vec<u8> {
    let mut buffer = vec![];
    buffer.extend_from_slice(&[0, 1, 0, 0]); // version
    buffer.extend_from_slice(&[0, 1, 0, 0]); // fontRevision
    buffer.extend_from_slice(&[0; 4]); // checksumAdjustment
    buffer.extend_from_slice(&0x_5f0f_3cf5_u32.to_be_bytes()); // magicNumber
    push_u16(&mut buffer, 0b_1011); // flags
    push_u16(&mut buffer, 1_000); // unitsPerEm
    buffer.extend_from_slice(&[0; 16]); // created, modified
    for coordinate in [0, 0, 500, 700] {
        push_i16(&mut buffer, coordinate);
    }
    push_u16(&mut buffer, 0); // macStyle
    push_u16(&mut buffer, 8); // lowestRecPPEM
    push_i16(&mut buffer, 2); // fontDirectionHint
    push_i16(&mut buffer, 0); // indexToLocFormat
    push_i16(&mut buffer, 0); // glyphDataFormat
    assert_eq!(buffer.len(), 54);
    buffer
}

fn hhea_table(number_of_h_metrics: u16) -> Vec<u8> {
    let mut buffer = vec![0, 1, 0, 0];
    for value in [800, -200, 0, 600, 0, 0, 500, 1, 0, 0, 0, 0, 0, 0, 0] {
        push_i16(&mut buffer, value);
    }
    push_u16(&mut buffer, number_of_h_metrics);
    assert_eq!(buffer.len(), 36);
    buffer
}

fn os2_table() -> Vec<u8> {
    let mut buffer = vec![0; 86];
    buffer[0..2].copy_from_slice(&1_u16.to_be_bytes()); // version
    buffer[2..4].copy_from_slice(&500_u16.to_be_bytes()); // xAvgCharWidth
    buffer[4..6].copy_from_slice(&400_u16.to_be_bytes()); // usWeightClass
    buffer[6..8].copy_from_slice(&5_u16.to_be_bytes()); // usWidthClass
    buffer[64..66].copy_from_slice(&0x20_u16.to_be_bytes()); // usFirstCharIndex
    buffer[66..68].copy_from_slice(&0xc5_u16.to_be_bytes()); // usLastCharIndex
    buffer
}

fn name_table() -> Vec<u8> {
    let family: Vec<u8> = "Test".encode_utf16().flat_map(u16::to_be_bytes).collect();
    let mut buffer = vec![];
    for value in [0, 1, 18, 3, 1, 0x409, 1] {
        push_u16(&mut buffer, value);
    }
    push_u16(&mut buffer, u16::try_from(family.len()).unwrap());
    push_u16(&mut buffer, 0); // offset
    buffer.extend_from_slice(&family);
    buffer
}

fn test_font_bytes() -> &'static [u8] {
    static BYTES: OnceLock<Vec<u8>> = OnceLock::new();

    BYTES.get_or_init(|| {
        let glyphs = test_glyphs();
        let mut glyf = vec![];
        let mut loca = vec![0, 0];
        for glyph in &glyphs {
            glyf.extend_from_slice(glyph);
            push_u16(&mut loca, u16::try_from(glyf.len() / 2).unwrap());
        }

        let char_map = test_char_map();
        let mut cmap = CmapTableBuilder::new(char_map.clone());
        let mut ucs4_map = char_map.clone();
        ucs4_map.insert('😀', 12);
        cmap.subtable(CmapId::UNICODE_BMP, char_map)
            .subtable(CmapId::WINDOWS_UCS4, ucs4_map);

        let hmtx = HmtxTableBuilder::new(test_metrics());
        let mut post = PostTableBuilder::new(test_glyph_names());
        post.header(PostHeader {
            underline_position: -100,
            underline_thickness: 50,
            ..PostHeader::default()
        });

        let mut maxp = vec![0, 0, 0x50, 0];
        push_u16(&mut maxp, GLYPH_COUNT);

        let mut font = FontBuilder::new();
        font.set_table(TableTag::HEAD, head_table())
            .set_table(TableTag::HHEA, hhea_table(hmtx.number_of_h_metrics()))
            .set_table(TableTag::MAXP, maxp)
            .set_table(TableTag::OS2, os2_table())
            .set_table(TableTag::NAME, name_table())
            .set_table(TableTag::CMAP, cmap.build())
            .set_table(TableTag::HMTX, hmtx.build())
            .set_table(TableTag::POST, post.build())
            .set_table(TableTag::GLYF, glyf)
            .set_table(TableTag::LOCA, loca)
            .set_table(TableTag::FPGM, vec![0xb0, 0x01, 0x2c])
            .set_table(TableTag::PREP, vec![0xb8, 0x01, 0xff, 0x85])
            .set_table(TableTag::CVT, vec![0, 0, 0, 1, 0, 2])
            .set_table(TableTag::GSUB, vec![0, 1, 0, 0, 0, 10, 0, 12, 0, 14]);
        font.build().to_truetype()
    })
}

/// Returns a small TrueType font with hinting, composite glyphs and several `cmap` subtables.
pub(crate) fn test_font() -> Font<'static> {
    Font::new(test_font_bytes()).unwrap()
}

#[derive(Debug)]
struct OpenTypeSanitizer {
    path: Option<String>,
}

impl Default for OpenTypeSanitizer {
    fn default() -> Self {
        let Ok(path) = env::var("OTS_SANITIZER") else {
            return Self { path: None };
        };
        let output = Command::new(&path)
            .arg("--version")
            .output()
            .unwrap_or_else(|err| {
                panic!("failed getting version for ots-sanitize at {path}: {err}");
            });
        assert!(
            output.status.success(),
            "failed getting version for ots-sanitize at {path}: non-zero exit code"
        );
        let version = String::from_utf8(output.stdout).unwrap_or_else(|err| {
            panic!("failed getting version for ots-sanitize at {path}: {err}");
        });
        println!("ots-sanitize version: {version}");
        Self { path: Some(path) }
    }
}

impl OpenTypeSanitizer {
    fn get() -> &'static Self {
        static SANITIZER: OnceLock<OpenTypeSanitizer> = OnceLock::new();
        SANITIZER.get_or_init(Self::default)
    }

    fn validate(&self, content: &[u8]) {
        let Some(path) = &self.path else {
            println!("OTS_SANITIZER env var is missing; skipping checks");
            return;
        };

        // Save content to the temporary file.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.as_file_mut().write_all(content).unwrap();
        file.as_file_mut().flush().unwrap();
        let file_path = file.into_temp_path();

        let output = Command::new(path)
            .arg(&file_path)
            .output()
            .expect("failed running ots-sanitize");
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("ots-sanitize failed:\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}");
        }
    }
}

fn assert_valid_font(raw: &[u8], expected_chars: impl Iterator<Item = (char, u16)>) {
    let font_file = ReadScope::new(raw).read::<FontData>().unwrap();
    let font_provider = font_file.table_provider(0).unwrap();
    let mut font = allsorts::Font::new(font_provider).unwrap();
    for (ch, expected_glyph_id) in expected_chars {
        let (glyph_id, _) = font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
        assert_eq!(glyph_id, expected_glyph_id, "{ch:?}");
    }

    OpenTypeSanitizer::get().validate(raw);
}

#[test]
fn reading_test_font() {
    let font = test_font();
    assert_eq!(font.num_glyphs().unwrap(), GLYPH_COUNT);
    assert!(font.has_table(TableTag::GSUB));

    let cmap = font.cmap().unwrap();
    assert_eq!(cmap.num_subtables(), 3);
    for (ch, glyph_id) in test_char_map() {
        assert_eq!(cmap.map_char(ch).unwrap(), glyph_id);
    }
    assert_eq!(cmap.map_char('😀').unwrap(), 12);

    let hmtx = font.hmtx().unwrap();
    assert_eq!(hmtx.number_of_h_metrics(), 11);
    for (i, metric) in test_metrics().into_iter().enumerate() {
        assert_eq!(hmtx.metric(i as u16).unwrap(), metric);
    }

    let post = font.post().unwrap();
    assert_eq!(post.header().underline_position, -100);
    for (i, name) in test_glyph_names().into_iter().enumerate() {
        assert_eq!(post.glyph_name(i as u16), Some(name));
    }

    let glyph = font.glyph(12).unwrap();
    assert_eq!(glyph.instructions(), [0x4b]);
    assert_eq!(glyph.padding(), 1);
    assert!(matches!(font.glyph(1).unwrap(), Glyph::Empty));

    let name = font.name().unwrap();
    assert_eq!(name.records()[0].decode(), "Test");
}

#[test]
fn test_font_is_valid() {
    let expected_chars = test_char_map().into_iter().chain([('z', 0)]);
    assert_valid_font(test_font_bytes(), expected_chars);
}

#[test]
fn subsetting_keeps_glyph_order() {
    let font = test_font();
    let mut selection: Vec<u16> = (0..12).collect();
    selection.swap(10, 11);
    let subset = Subsetter::new(&font).glyphs(selection).subset().unwrap();
    assert_eq!(subset.num_glyphs().unwrap(), 12);

    let src_loca = font.loca().unwrap();
    let dst_loca = subset.loca().unwrap();
    for i in 0..=10 {
        assert_eq!(dst_loca.offset(i).unwrap(), src_loca.offset(i).unwrap());
    }
    let src_len = |i| src_loca.offset(i + 1).unwrap() - src_loca.offset(i).unwrap();
    let dst_len = |i| dst_loca.offset(i + 1).unwrap() - dst_loca.offset(i).unwrap();
    assert_ne!(src_len(10), src_len(11));
    assert_eq!(dst_len(11), src_len(10));
    assert_eq!(dst_len(10), src_len(11));
    assert_eq!(
        subset.glyph(10).unwrap().instructions(),
        font.glyph(11).unwrap().instructions()
    );

    let cmap = subset.cmap().unwrap();
    assert_eq!(cmap.map_char('a').unwrap(), 11);
    assert_eq!(cmap.map_char('b').unwrap(), 10);
    assert_eq!(cmap.map_char('Ä').unwrap(), 0);

    let post = subset.post().unwrap();
    assert_eq!(post.glyph_name(10), Some("b"));
    assert_eq!(post.glyph_name(11), Some("a"));
    let hmtx = subset.hmtx().unwrap();
    assert_eq!(hmtx.lsb(10).unwrap(), 11);
    assert_eq!(hmtx.lsb(11).unwrap(), 10);
}

#[test_casing(2, [false, true])]
fn removing_tables(strip_hints: bool) {
    let font = test_font();
    let subset = Subsetter::new(&font)
        .strip_hints(strip_hints)
        .remove_tables([TableTag::GPOS, TableTag::GSUB, TableTag::KERN])
        .subset()
        .unwrap();
    for tag in [TableTag::GPOS, TableTag::GSUB, TableTag::KERN] {
        assert!(!subset.has_table(tag), "{tag}");
    }
    for tag in TableTag::HINTING {
        assert_eq!(subset.has_table(tag), !strip_hints, "{tag}");
    }
    assert!(subset.has_table(TableTag::GLYF));
}

#[test]
fn removing_required_tables_is_allowed() {
    let font = test_font();
    let subset = Subsetter::new(&font)
        .remove_tables([TableTag::GLYF, TableTag::LOCA])
        .subset()
        .unwrap();
    assert!(!subset.has_table(TableTag::GLYF));
    assert!(!subset.has_table(TableTag::LOCA));
    let err = subset.glyph(0).unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::MissingTable));
}

#[test]
fn stripping_hints() {
    let font = test_font();
    let subset = Subsetter::hint_stripper(&font).subset().unwrap();
    assert_eq!(subset.num_glyphs().unwrap(), GLYPH_COUNT);
    assert_eq!(subset.table_data(TableTag::GLYF).unwrap().len() % 2, 0);
    for tag in TableTag::HINTING {
        assert!(!subset.has_table(tag), "{tag}");
    }

    for glyph_idx in 0..GLYPH_COUNT {
        let original = font.glyph(glyph_idx).unwrap();
        let glyph = subset.glyph(glyph_idx).unwrap();
        assert_eq!(glyph.instruction_size(), 0, "glyph #{glyph_idx}");
        assert!(glyph.padding() <= 1, "glyph #{glyph_idx}");
        assert_eq!(glyph.number_of_contours(), original.number_of_contours());

        if let (Glyph::Composite(original), Glyph::Composite(glyph)) = (&original, &glyph) {
            assert_eq!(glyph.components().len(), original.components().len());
            for (component, original) in glyph.components().iter().zip(original.components()) {
                assert_eq!(component.glyph_idx(), original.glyph_idx());
                assert_eq!(component.arguments(), original.arguments());
            }
        }
    }

    let glyf_len = subset.table_data(TableTag::GLYF).unwrap().len();
    assert!(glyf_len < font.table_data(TableTag::GLYF).unwrap().len());
}

#[test]
fn restricting_cmap_subtables() {
    let font = test_font();
    let subset = Subsetter::new(&font)
        .cmaps([CmapId::WINDOWS_BMP])
        .subset()
        .unwrap();
    let cmap = subset.cmap().unwrap();
    assert_eq!(cmap.num_subtables(), 1);
    assert_eq!(cmap.subtables()[0].id(), CmapId::WINDOWS_BMP);
    assert_eq!(cmap.subtables()[0].mappings(), Vec::from_iter(test_char_map()));

    // Missing subtables are skipped
    let subset = Subsetter::new(&font)
        .cmaps([CmapId::MAC_ROMAN, CmapId::WINDOWS_UCS4])
        .subset()
        .unwrap();
    let cmap = subset.cmap().unwrap();
    assert_eq!(cmap.num_subtables(), 1);
    assert_eq!(cmap.subtables()[0].id(), CmapId::WINDOWS_UCS4);
    assert_eq!(cmap.map_char('😀').unwrap(), 12);
}

#[test]
fn default_subset_retains_all_cmap_subtables() {
    let font = test_font();
    let subset = Subsetter::new(&font).subset().unwrap();
    let ids: Vec<_> = subset
        .cmap()
        .unwrap()
        .subtables()
        .iter()
        .map(|subtable| subtable.id())
        .collect();
    assert_eq!(
        ids,
        [CmapId::UNICODE_BMP, CmapId::WINDOWS_BMP, CmapId::WINDOWS_UCS4]
    );

    for tag in font.table_tags() {
        if tag != TableTag::CMAP {
            assert_eq!(subset.table_data(tag), font.table_data(tag), "{tag}");
        }
    }
}

#[test]
fn composite_glyph_components_are_added() {
    let font = test_font();
    let subset = Subsetter::new(&font).glyphs([0, 13]).subset().unwrap();
    // Expected order: 0, 13, 12, 5, 2, 3
    assert_eq!(subset.num_glyphs().unwrap(), 6);

    let Glyph::Composite(glyph) = subset.glyph(1).unwrap() else {
        panic!("unexpected glyph #1");
    };
    let indices: Vec<_> = glyph.components().iter().map(|c| c.glyph_idx()).collect();
    assert_eq!(indices, [2, 3]);
    let Glyph::Composite(glyph) = subset.glyph(2).unwrap() else {
        panic!("unexpected glyph #2");
    };
    let indices: Vec<_> = glyph.components().iter().map(|c| c.glyph_idx()).collect();
    assert_eq!(indices, [4, 5]);
    assert_eq!(subset.glyph(2).unwrap().instructions(), [0x4b]);

    let cmap = subset.cmap().unwrap();
    let expected_chars = [('Å', 1), ('Ä', 2), ('D', 3), ('A', 4), ('B', 5), ('C', 0)];
    for (ch, glyph_id) in expected_chars {
        assert_eq!(cmap.map_char(ch).unwrap(), glyph_id, "{ch:?}");
    }

    let post = subset.post().unwrap();
    let names: Vec<_> = (0..6).map(|i| post.glyph_name(i).unwrap()).collect();
    assert_eq!(names, [".notdef", "A.ring_custom", "Adieresis", "D", "A", "B"]);

    let hmtx = subset.hmtx().unwrap();
    let lsbs: Vec<_> = (0..6).map(|i| hmtx.lsb(i).unwrap()).collect();
    assert_eq!(lsbs, [0, 13, 12, 5, 2, 3]);
    assert_eq!(hmtx.number_of_h_metrics(), 6);

    let ttf = subset.to_truetype();
    assert_valid_font(&ttf, expected_chars.into_iter());
    let woff2 = subset.to_woff2();
    assert_valid_font(&woff2, expected_chars.into_iter());
}

#[test]
fn duplicate_glyphs_are_ignored() {
    let font = test_font();
    let subset = Subsetter::new(&font).glyphs([0, 2, 2, 3, 0]).subset().unwrap();
    assert_eq!(subset.num_glyphs().unwrap(), 3);
    let maxp = subset.table_data(TableTag::MAXP).unwrap();
    assert_eq!(maxp[4..6], [0, 3]);
    let hhea = subset.table_data(TableTag::HHEA).unwrap();
    assert_eq!(hhea[34..36], [0, 3]);
}

#[test]
fn glyph_out_of_range() {
    let font = test_font();
    let err = Subsetter::new(&font).glyphs([0, 100]).subset().unwrap_err();
    let SubsetError::Parse(err) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert!(matches!(
        err.kind(),
        ParseErrorKind::GlyphOutOfRange {
            glyph_idx: 100,
            glyph_count: GLYPH_COUNT
        }
    ));
}

#[test]
fn subsetting_font_without_glyph_data() {
    let font = test_font();
    let mut builder = FontBuilder::from_font(&font);
    builder
        .remove_table(TableTag::GLYF)
        .remove_table(TableTag::LOCA);
    let font = builder.build();

    let subset = Subsetter::hint_stripper(&font)
        .glyphs([0, 3, 2])
        .subset()
        .unwrap();
    assert_eq!(subset.num_glyphs().unwrap(), 3);
    assert!(!subset.has_table(TableTag::GLYF));
    let cmap = subset.cmap().unwrap();
    assert_eq!(cmap.map_char('A').unwrap(), 2);
    assert_eq!(cmap.map_char('B').unwrap(), 1);
}

#[test_casing(2, [false, true])]
fn serializing_subset(strip_hints: bool) {
    let font = test_font();
    let chars = ['A', 'b', 'Ä'];
    let cmap = font.cmap().unwrap();
    let glyphs = chars.iter().map(|&ch| cmap.map_char(ch).unwrap());
    let subset = Subsetter::new(&font)
        .glyphs([0].into_iter().chain(glyphs))
        .strip_hints(strip_hints)
        .subset()
        .unwrap();

    let ttf = subset.to_truetype();
    assert_eq!(Font::checksum(&ttf), Font::SFNT_CHECKSUM);
    let parsed = Font::new(&ttf).unwrap();
    assert_eq!(parsed.num_glyphs().unwrap(), subset.num_glyphs().unwrap());
    // 'B' is retained as a component of 'Ä'
    let expected_chars = [('A', 1), ('b', 2), ('Ä', 3), ('B', 4), ('C', 0)];
    assert_valid_font(&ttf, expected_chars.into_iter());
    assert_valid_font(&subset.to_woff2(), expected_chars.into_iter());
}
