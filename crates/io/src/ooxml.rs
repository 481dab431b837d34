// Raw OOXML package access: zip entries, relationship parts, path resolution.
//
// Used by the image extractor, which needs parts calamine does not expose
// (drawings and their relationships).

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open the bytes as a zip package. `None` for non-zip containers (xls).
pub(crate) fn open_package(bytes: &[u8]) -> Option<Package<'_>> {
    ZipArchive::new(Cursor::new(bytes)).ok()
}

/// Read a text part, returning None on error.
pub(crate) fn read_part(archive: &mut Package<'_>, path: &str) -> Option<String> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Read a binary part, returning None on error.
pub(crate) fn read_part_bytes(archive: &mut Package<'_>, path: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).ok()?;
    Some(content)
}

/// All `xl/media/*` entries, in natural order (image2 before image10).
pub(crate) fn media_entries(archive: &Package<'_>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/media/") && !n.ends_with('/'))
        .map(str::to_string)
        .collect();
    names.sort_by_key(|n| natural_key(n));
    names
}

fn natural_key(name: &str) -> (String, u64, String) {
    let stem_end = name.rfind('.').unwrap_or(name.len());
    let stem = &name[..stem_end];
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(stem.len());
    let number = stem[digits_start..].parse().unwrap_or(0);
    (stem[..digits_start].to_string(), number, name[stem_end..].to_string())
}

/// Relationship part path for a part: `xl/a/b.xml` → `xl/a/_rels/b.xml.rels`.
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rfind('/') {
        Some(i) => format!("{}/_rels/{}.rels", &part[..i], &part[i + 1..]),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that declared it.
/// Handles package-absolute (`/xl/media/a.png`) and relative (`../media/a.png`)
/// targets.
pub(crate) fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }
    let mut segments: Vec<&str> = match base_part.rfind('/') {
        Some(i) => base_part[..i].split('/').collect(),
        None => Vec::new(),
    };
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

/// Parse a relationships part into `Id → Target`.
pub(crate) fn parse_relationships(xml: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => target = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    rels
}

/// Resolve worksheet part paths from workbook.xml + its relationships, in
/// workbook (tab) order.
pub(crate) fn resolve_worksheet_paths(workbook_xml: &str, rels_xml: &str) -> Vec<String> {
    let mut rids = Vec::new();
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"sheet" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"id" {
                        rids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let rels = parse_relationships(rels_xml);
    rids.iter()
        .filter_map(|rid| rels.get(rid))
        .map(|target| resolve_target("xl/workbook.xml", target))
        .collect()
}

/// The `r:id` of the `<drawing>` element in a worksheet part, if any.
pub(crate) fn worksheet_drawing_rid(worksheet_xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(worksheet_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"drawing" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"id" {
                        return Some(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// Build an in-memory zip package from `(path, bytes)` parts.
#[cfg(test)]
pub(crate) fn write_package(parts: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
