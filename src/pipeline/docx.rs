//! DOCX decoding: Open XML package → rich text + image table.
//!
//! A `.docx` is a ZIP archive. The body lives in `word/document.xml`;
//! inline pictures are `a:blip r:embed` (or legacy VML `v:imagedata r:id`)
//! references that resolve through `word/_rels/document.xml.rels` to parts
//! under `word/media/`. Automatic list numbering ("a)", "1.") is not part of
//! the text at all: it is rendered by Word from `word/numbering.xml`, so we
//! synthesise the visible marker here or option lists would lose their
//! letters entirely.
//!
//! Each paragraph becomes one line. Each distinct image relationship gets
//! one [`ImageTable`] index in order of first reference.

use crate::error::ExtractError;
use crate::output::ImagePayload;
use crate::pipeline::load::{escape_markup, image_token, ImageTable};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const NUMBERING_PART: &str = "word/numbering.xml";

/// Decode DOCX bytes.
///
/// # Errors
/// [`ExtractError::UnsupportedFormat`] if the bytes are not a ZIP package,
/// the package has no `word/document.xml`, or that part is not well-formed
/// XML. Problems in optional parts (relationships, numbering, media) are
/// logged and skipped.
pub fn decode(bytes: &[u8]) -> Result<(String, ImageTable), ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::unsupported(format!("not a readable ZIP package: {e}")))?;

    let document = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
        ExtractError::unsupported("ZIP package has no word/document.xml; not a Word document")
    })?;

    let relationships = match read_part(&mut archive, RELS_PART)? {
        Some(xml) => parse_relationships(&xml).unwrap_or_else(|e| {
            warn!("Ignoring unreadable {}: {}", RELS_PART, e);
            HashMap::new()
        }),
        None => HashMap::new(),
    };

    let numbering = match read_part(&mut archive, NUMBERING_PART)? {
        Some(xml) => Numbering::parse(&xml).unwrap_or_else(|e| {
            warn!("Ignoring unreadable {}: {}", NUMBERING_PART, e);
            Numbering::default()
        }),
        None => Numbering::default(),
    };
    debug!(
        "DOCX: {} relationships, {} numbering definitions",
        relationships.len(),
        numbering.nums.len()
    );

    let mut media = MediaResolver {
        archive: &mut archive,
        relationships,
        indices: HashMap::new(),
        table: ImageTable::new(),
    };
    let text = walk_document(&document, &numbering, &mut media)?;
    Ok((text, media.table))
}

/// Read a text part, `None` if the package does not contain it.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = String::new();
            file.read_to_string(&mut content)
                .map_err(|e| ExtractError::unsupported(format!("failed to read {name}: {e}")))?;
            Ok(Some(content))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(ExtractError::unsupported(format!("failed to open {name}: {e}"))),
    }
}

// ── Body ─────────────────────────────────────────────────────────────────

/// A paragraph being assembled; paragraphs nest inside text boxes.
#[derive(Default)]
struct Paragraph {
    text: String,
    num_id: Option<String>,
    ilvl: usize,
}

fn walk_document<R: Read + Seek>(
    xml: &str,
    numbering: &Numbering,
    media: &mut MediaResolver<'_, R>,
) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut lines: Vec<String> = Vec::new();
    let mut stack: Vec<Paragraph> = Vec::new();
    let mut counters = ListCounters::default();
    let mut run_depth = 0usize;
    let mut in_text = false;
    let mut in_num_pr = false;
    // Content under mc:Fallback duplicates the mc:Choice branch.
    let mut fallback_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"Fallback" => fallback_depth += 1,
                    _ if fallback_depth > 0 => {}
                    b"p" => stack.push(Paragraph::default()),
                    b"r" => run_depth += 1,
                    b"t" => in_text = run_depth > 0,
                    b"numPr" => in_num_pr = true,
                    _ => on_element(e, &mut stack, run_depth, in_num_pr, media),
                }
            }
            Ok(Event::Empty(ref e)) => {
                if fallback_depth == 0 {
                    on_element(e, &mut stack, run_depth, in_num_pr, media);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"Fallback" => fallback_depth = fallback_depth.saturating_sub(1),
                    _ if fallback_depth > 0 => {}
                    b"p" => {
                        if let Some(para) = stack.pop() {
                            let line = finish_paragraph(para, numbering, &mut counters);
                            match stack.last_mut() {
                                Some(parent) => {
                                    parent.text.push(' ');
                                    parent.text.push_str(&line);
                                }
                                None => lines.push(line),
                            }
                        }
                    }
                    b"r" => run_depth = run_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    b"numPr" => in_num_pr = false,
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && fallback_depth == 0 {
                    let text = e
                        .unescape()
                        .map_err(|err| ExtractError::unsupported(format!("corrupt {DOCUMENT_PART}: {err}")))?;
                    if let Some(para) = stack.last_mut() {
                        para.text.push_str(&escape_markup(&text));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::unsupported(format!(
                    "corrupt {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(lines.join("\n"))
}

/// Handle an element that carries data in attributes (start or empty tag).
fn on_element<R: Read + Seek>(
    e: &BytesStart<'_>,
    stack: &mut [Paragraph],
    run_depth: usize,
    in_num_pr: bool,
    media: &mut MediaResolver<'_, R>,
) {
    let Some(para) = stack.last_mut() else {
        return;
    };
    match e.local_name().as_ref() {
        b"numId" if in_num_pr => para.num_id = get_attribute(e, "val"),
        b"ilvl" if in_num_pr => {
            para.ilvl = get_attribute(e, "val")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        }
        b"br" | b"cr" if run_depth > 0 => para.text.push('\n'),
        b"tab" if run_depth > 0 => para.text.push(' '),
        b"noBreakHyphen" if run_depth > 0 => para.text.push('-'),
        b"blip" => {
            if let Some(index) = get_attribute(e, "embed").and_then(|id| media.resolve(&id)) {
                para.text.push_str(&format!(" {} ", image_token(index)));
            }
        }
        b"imagedata" => {
            if let Some(index) = get_attribute(e, "id").and_then(|id| media.resolve(&id)) {
                para.text.push_str(&format!(" {} ", image_token(index)));
            }
        }
        _ => {}
    }
}

fn finish_paragraph(para: Paragraph, numbering: &Numbering, counters: &mut ListCounters) -> String {
    let marker = para
        .num_id
        .as_deref()
        .filter(|id| *id != "0")
        .and_then(|id| counters.next_marker(numbering, id, para.ilvl));
    match marker {
        Some(marker) => format!("{} {}", escape_markup(&marker), para.text),
        None => para.text,
    }
}

// ── Relationships and media ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    target: String,
    external: bool,
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (get_attribute(e, "Id"), get_attribute(e, "Target")) {
                    let external = get_attribute(e, "TargetMode").is_some_and(|m| m == "External");
                    rels.insert(id, Relationship { target, external });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Resolve a relationship target (relative to `word/`) to a package path.
fn part_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = vec!["word"];
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Loads image parts on first reference and remembers their table index.
struct MediaResolver<'a, R: Read + Seek> {
    archive: &'a mut ZipArchive<R>,
    relationships: HashMap<String, Relationship>,
    indices: HashMap<String, usize>,
    table: ImageTable,
}

impl<R: Read + Seek> MediaResolver<'_, R> {
    fn resolve(&mut self, rel_id: &str) -> Option<usize> {
        if let Some(&index) = self.indices.get(rel_id) {
            return Some(index);
        }
        let rel = self.relationships.get(rel_id)?;
        if rel.external {
            debug!("Skipping linked (external) image {}", rel.target);
            return None;
        }
        let path = part_path(&rel.target);
        let bytes = match self.archive.by_name(&path) {
            Ok(mut file) => {
                let mut bytes = Vec::new();
                if let Err(e) = file.read_to_end(&mut bytes) {
                    warn!("Failed to read image part {}: {}", path, e);
                    return None;
                }
                bytes
            }
            Err(e) => {
                warn!("Image part {} referenced by {} is missing: {}", path, rel_id, e);
                return None;
            }
        };
        let index = self
            .table
            .push(ImagePayload::from_bytes(&bytes, content_type(&path, &bytes)));
        self.indices.insert(rel_id.to_string(), index);
        Some(index)
    }
}

/// MIME type from the image bytes, falling back to the part's extension
/// for formats the image crate does not sniff (EMF, WMF, SVG).
fn content_type(path: &str, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
    .to_string()
}

// ── Numbering ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NumberFormat {
    #[default]
    Decimal,
    DecimalZero,
    LowerLetter,
    UpperLetter,
    LowerRoman,
    UpperRoman,
    Bullet,
    None,
}

impl NumberFormat {
    fn parse(val: &str) -> Self {
        match val {
            "decimalZero" => NumberFormat::DecimalZero,
            "lowerLetter" => NumberFormat::LowerLetter,
            "upperLetter" => NumberFormat::UpperLetter,
            "lowerRoman" => NumberFormat::LowerRoman,
            "upperRoman" => NumberFormat::UpperRoman,
            "bullet" => NumberFormat::Bullet,
            "none" => NumberFormat::None,
            _ => NumberFormat::Decimal,
        }
    }

    fn render(self, n: u32) -> String {
        match self {
            NumberFormat::Decimal => n.to_string(),
            NumberFormat::DecimalZero => format!("{n:02}"),
            NumberFormat::LowerLetter => letters(n),
            NumberFormat::UpperLetter => letters(n).to_ascii_uppercase(),
            NumberFormat::LowerRoman => roman(n),
            NumberFormat::UpperRoman => roman(n).to_ascii_uppercase(),
            NumberFormat::Bullet | NumberFormat::None => String::new(),
        }
    }
}

/// Word's alphabetic numbering: a..z, then aa..zz, aaa..
fn letters(n: u32) -> String {
    if n == 0 {
        return String::new();
    }
    let letter = (b'a' + ((n - 1) % 26) as u8) as char;
    let repeat = ((n - 1) / 26 + 1) as usize;
    std::iter::repeat_n(letter, repeat).collect()
}

fn roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for &(value, digits) in &TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Level {
    start: u32,
    format: NumberFormat,
    text: String,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            start: 1,
            format: NumberFormat::Decimal,
            text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct NumDefinition {
    abstract_id: String,
    start_overrides: HashMap<usize, u32>,
}

/// Parsed `word/numbering.xml`.
#[derive(Debug, Clone, Default)]
struct Numbering {
    abstracts: HashMap<String, HashMap<usize, Level>>,
    nums: HashMap<String, NumDefinition>,
}

impl Numbering {
    fn parse(xml: &str) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut numbering = Numbering::default();

        let mut current_abstract: Option<String> = None;
        let mut current_level: Option<(usize, Level)> = None;
        let mut current_num: Option<(String, NumDefinition)> = None;
        let mut override_level: Option<usize> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"abstractNum" => current_abstract = get_attribute(e, "abstractNumId"),
                    b"lvl" if current_abstract.is_some() => {
                        let ilvl = get_attribute(e, "ilvl").and_then(|v| v.parse().ok()).unwrap_or(0);
                        current_level = Some((ilvl, Level::default()));
                    }
                    b"start" => {
                        if let Some((_, level)) = current_level.as_mut() {
                            if let Some(v) = get_attribute(e, "val").and_then(|v| v.parse().ok()) {
                                level.start = v;
                            }
                        }
                    }
                    b"numFmt" => {
                        if let Some((_, level)) = current_level.as_mut() {
                            level.format = NumberFormat::parse(&get_attribute(e, "val").unwrap_or_default());
                        }
                    }
                    b"lvlText" => {
                        if let Some((_, level)) = current_level.as_mut() {
                            level.text = get_attribute(e, "val").unwrap_or_default();
                        }
                    }
                    b"num" => {
                        current_num = get_attribute(e, "numId").map(|id| (id, NumDefinition::default()));
                    }
                    b"abstractNumId" => {
                        if let (Some((_, def)), Some(val)) = (current_num.as_mut(), get_attribute(e, "val")) {
                            def.abstract_id = val;
                        }
                    }
                    b"lvlOverride" => {
                        override_level = get_attribute(e, "ilvl").and_then(|v| v.parse().ok());
                    }
                    b"startOverride" => {
                        if let (Some((_, def)), Some(ilvl)) = (current_num.as_mut(), override_level) {
                            if let Some(v) = get_attribute(e, "val").and_then(|v| v.parse().ok()) {
                                def.start_overrides.insert(ilvl, v);
                            }
                        }
                    }
                    _ => {}
                },
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"lvl" => {
                        if let (Some(abs), Some((ilvl, level))) = (current_abstract.as_ref(), current_level.take()) {
                            numbering.abstracts.entry(abs.clone()).or_default().insert(ilvl, level);
                        }
                    }
                    b"abstractNum" => current_abstract = None,
                    b"lvlOverride" => override_level = None,
                    b"num" => {
                        if let Some((id, def)) = current_num.take() {
                            numbering.nums.insert(id, def);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(numbering)
    }

    fn level(&self, num_id: &str, ilvl: usize) -> Option<&Level> {
        let def = self.nums.get(num_id)?;
        self.abstracts.get(&def.abstract_id)?.get(&ilvl)
    }

    fn start(&self, num_id: &str, ilvl: usize) -> u32 {
        self.nums
            .get(num_id)
            .and_then(|def| def.start_overrides.get(&ilvl).copied())
            .or_else(|| self.level(num_id, ilvl).map(|l| l.start))
            .unwrap_or(1)
    }
}

const MAX_LEVELS: usize = 9;

/// Running counters per list instance while walking the body.
#[derive(Debug, Default)]
struct ListCounters {
    counters: HashMap<String, [Option<u32>; MAX_LEVELS]>,
}

impl ListCounters {
    /// Advance the counter for `(num_id, ilvl)` and render its marker text.
    fn next_marker(&mut self, numbering: &Numbering, num_id: &str, ilvl: usize) -> Option<String> {
        let level = numbering.level(num_id, ilvl)?;
        if ilvl >= MAX_LEVELS {
            return None;
        }
        let counters = self.counters.entry(num_id.to_string()).or_default();
        counters[ilvl] = Some(match counters[ilvl] {
            Some(n) => n + 1,
            None => numbering.start(num_id, ilvl),
        });
        for deeper in counters.iter_mut().skip(ilvl + 1) {
            *deeper = None;
        }

        if matches!(level.format, NumberFormat::Bullet | NumberFormat::None) {
            return None;
        }

        let mut marker = level.text.clone();
        for k in (1..=MAX_LEVELS).rev() {
            let placeholder = format!("%{k}");
            if !marker.contains(&placeholder) {
                continue;
            }
            let value = counters[k - 1].unwrap_or_else(|| numbering.start(num_id, k - 1));
            let format = numbering
                .level(num_id, k - 1)
                .map(|l| l.format)
                .unwrap_or_default();
            marker = marker.replace(&placeholder, &format.render(value));
        }
        let marker = marker.trim().to_string();
        (!marker.is_empty()).then_some(marker)
    }
}

/// Attribute value by local name, ignoring the namespace prefix.
fn get_attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}
