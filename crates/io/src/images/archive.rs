// Tier 2: walk the relationship chain by hand.
//
// workbook.xml → worksheet part → <drawing r:id> → worksheet rels → drawing
// part (any name) → drawing rels → media. Accepts both oneCellAnchor and
// twoCellAnchor pictures.

use std::collections::HashSet;

use super::anchors::parse_picture_anchors;
use super::RawImage;
use crate::ooxml::{self, Package};

/// Worksheet part paths in tab order. `None` when the workbook part or its
/// relationships are missing.
pub(super) fn sheet_parts(archive: &mut Package<'_>) -> Option<Vec<String>> {
    let workbook_xml = ooxml::read_part(archive, "xl/workbook.xml")?;
    let workbook_rels = ooxml::read_part(archive, "xl/_rels/workbook.xml.rels")?;
    Some(ooxml::resolve_worksheet_paths(&workbook_xml, &workbook_rels))
}

/// The drawing part a worksheet's `<drawing r:id>` points to.
pub(super) fn drawing_part(archive: &mut Package<'_>, sheet_path: &str) -> Option<String> {
    let sheet_xml = ooxml::read_part(archive, sheet_path)?;
    let rid = ooxml::worksheet_drawing_rid(&sheet_xml)?;
    let sheet_rels = ooxml::read_part(archive, &ooxml::rels_path_for(sheet_path))?;
    let target = ooxml::parse_relationships(&sheet_rels).remove(&rid)?;
    Some(ooxml::resolve_target(sheet_path, &target))
}

/// Resolve the drawing part path for the worksheet at `sheet_index`.
fn drawing_part_for_sheet(archive: &mut Package<'_>, sheet_index: usize) -> Option<String> {
    let sheets = sheet_parts(archive)?;
    drawing_part(archive, sheets.get(sheet_index)?)
}

/// Package paths referenced from a drawing's relationships.
fn drawing_targets(archive: &mut Package<'_>, drawing_path: &str) -> HashSet<String> {
    ooxml::read_part(archive, &ooxml::rels_path_for(drawing_path))
        .map(|xml| {
            ooxml::parse_relationships(&xml)
                .values()
                .map(|target| ooxml::resolve_target(drawing_path, target))
                .collect()
        })
        .unwrap_or_default()
}

/// Media referenced only by other worksheets' drawings. Empty when the
/// workbook relationships cannot be resolved.
pub(super) fn media_of_other_sheets(archive: &mut Package<'_>, sheet_index: usize) -> HashSet<String> {
    let Some(sheets) = sheet_parts(archive) else {
        return HashSet::new();
    };

    let mut own = HashSet::new();
    let mut foreign = HashSet::new();
    for (i, sheet_path) in sheets.iter().enumerate() {
        let Some(drawing_path) = drawing_part(archive, sheet_path) else {
            continue;
        };
        let targets = drawing_targets(archive, &drawing_path);
        if i == sheet_index {
            own.extend(targets);
        } else {
            foreign.extend(targets);
        }
    }
    foreign.retain(|path| !own.contains(path));
    foreign
}

pub(crate) fn read(archive: &mut Package<'_>, sheet_index: usize) -> Vec<RawImage> {
    let Some(drawing_path) = drawing_part_for_sheet(archive, sheet_index) else {
        log::debug!("sheet {}: no drawing reachable from the worksheet", sheet_index);
        return Vec::new();
    };
    let Some(drawing_xml) = ooxml::read_part(archive, &drawing_path) else {
        return Vec::new();
    };
    let rels = ooxml::read_part(archive, &ooxml::rels_path_for(&drawing_path))
        .map(|xml| ooxml::parse_relationships(&xml))
        .unwrap_or_default();

    let mut images: Vec<RawImage> = parse_picture_anchors(&drawing_xml)
        .into_iter()
        .filter_map(|anchor| {
            let target = rels.get(&anchor.embed)?;
            let media_path = ooxml::resolve_target(&drawing_path, target);
            let bytes = ooxml::read_part_bytes(archive, &media_path)?;
            Some(RawImage {
                position: anchor.from,
                media_path,
                bytes,
            })
        })
        .collect();

    images.sort_by_key(|img| img.position);
    images
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use shelfline_core::CellPos;
    use zip::ZipArchive;

    use super::*;
    use crate::ooxml::write_package;

    const WORKBOOK: &str = r#"<workbook xmlns:r="r"><sheets>
        <sheet name="Catalogue" sheetId="1" r:id="rId1"/>
      </sheets></workbook>"#;
    const WORKBOOK_RELS: &str = r#"<Relationships>
        <Relationship Id="rId1" Target="worksheets/products.xml"/>
      </Relationships>"#;
    const SHEET: &str = r#"<worksheet xmlns:r="r"><sheetData/><drawing r:id="rId4"/></worksheet>"#;
    const SHEET_RELS: &str = r#"<Relationships>
        <Relationship Id="rId4" Target="../drawings/pictures.xml"/>
      </Relationships>"#;
    const DRAWING: &str = r#"<xdr:wsDr xmlns:xdr="x" xmlns:a="a" xmlns:r="r">
      <xdr:oneCellAnchor>
        <xdr:from><xdr:col>2</xdr:col><xdr:row>9</xdr:row></xdr:from>
        <xdr:pic><xdr:blipFill><a:blip r:embed="p2"/></xdr:blipFill></xdr:pic>
      </xdr:oneCellAnchor>
      <xdr:twoCellAnchor>
        <xdr:from><xdr:col>2</xdr:col><xdr:row>4</xdr:row></xdr:from>
        <xdr:pic><xdr:blipFill><a:blip r:embed="p1"/></xdr:blipFill></xdr:pic>
      </xdr:twoCellAnchor>
    </xdr:wsDr>"#;
    const DRAWING_RELS: &str = r#"<Relationships>
        <Relationship Id="p1" Target="../media/a.png"/>
        <Relationship Id="p2" Target="/xl/media/b.png"/>
      </Relationships>"#;

    #[test]
    fn follows_chain_to_non_conventional_parts() {
        let bytes = write_package(&[
            ("xl/workbook.xml", WORKBOOK.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
            ("xl/worksheets/products.xml", SHEET.as_bytes()),
            ("xl/worksheets/_rels/products.xml.rels", SHEET_RELS.as_bytes()),
            ("xl/drawings/pictures.xml", DRAWING.as_bytes()),
            ("xl/drawings/_rels/pictures.xml.rels", DRAWING_RELS.as_bytes()),
            ("xl/media/a.png", b"A".as_slice()),
            ("xl/media/b.png", b"B".as_slice()),
        ]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let images = read(&mut archive, 0);

        let got: Vec<(CellPos, &[u8])> = images.iter().map(|i| (i.position, i.bytes.as_slice())).collect();
        assert_eq!(got, vec![(CellPos::new(4, 2), b"A".as_slice()), (CellPos::new(9, 2), b"B".as_slice())]);
    }

    #[test]
    fn media_owned_by_other_sheets() {
        let workbook = r#"<workbook xmlns:r="r"><sheets>
            <sheet name="Bread" sheetId="1" r:id="rId1"/>
            <sheet name="Fruit" sheetId="2" r:id="rId2"/>
          </sheets></workbook>"#;
        let workbook_rels = r#"<Relationships>
            <Relationship Id="rId1" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId2" Target="worksheets/sheet2.xml"/>
          </Relationships>"#;
        let sheet_rels = r#"<Relationships>
            <Relationship Id="rId4" Target="../drawings/drawing1.xml"/>
          </Relationships>"#;
        let drawing_rels = r#"<Relationships>
            <Relationship Id="p1" Target="../media/image1.png"/>
            <Relationship Id="p2" Target="../media/image2.png"/>
          </Relationships>"#;
        let bytes = write_package(&[
            ("xl/workbook.xml", workbook.as_bytes()),
            ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
            ("xl/worksheets/sheet1.xml", b"<worksheet><sheetData/></worksheet>".as_slice()),
            ("xl/worksheets/sheet2.xml", SHEET.as_bytes()),
            ("xl/worksheets/_rels/sheet2.xml.rels", sheet_rels.as_bytes()),
            ("xl/drawings/drawing1.xml", DRAWING.as_bytes()),
            ("xl/drawings/_rels/drawing1.xml.rels", drawing_rels.as_bytes()),
            ("xl/media/image1.png", b"A".as_slice()),
            ("xl/media/image2.png", b"B".as_slice()),
            ("xl/media/image3.png", b"C".as_slice()),
        ]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();

        assert_eq!(drawing_part_for_sheet(&mut archive, 0), None);
        let mut foreign: Vec<String> = media_of_other_sheets(&mut archive, 0).into_iter().collect();
        foreign.sort();
        assert_eq!(foreign, vec!["xl/media/image1.png", "xl/media/image2.png"]);
        assert!(media_of_other_sheets(&mut archive, 1).is_empty());
    }

    #[test]
    fn worksheet_without_drawing_yields_nothing() {
        let bytes = write_package(&[
            ("xl/workbook.xml", WORKBOOK.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
            ("xl/worksheets/products.xml", b"<worksheet><sheetData/></worksheet>".as_slice()),
        ]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert!(read(&mut archive, 0).is_empty());
    }
}
