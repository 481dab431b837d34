// Tier 1: the sheet's conventionally named drawing part.
//
// Writers that follow the usual part naming put sheet N's pictures in
// xl/drawings/drawingN.xml. Each range anchor there points through the
// drawing's relationships at one entry of the package media list.
//
// Writers number drawing parts by creation order, so the part is only used
// when the worksheet's own drawing relationship points at it. Packages without
// resolvable workbook relationships fall back to the name alone.

use super::anchors::{parse_picture_anchors, AnchorKind};
use super::archive::{drawing_part, sheet_parts};
use super::RawImage;
use crate::ooxml::{self, Package};

/// Read range-anchored pictures from `xl/drawings/drawing{sheet_index + 1}.xml`.
/// Empty when the part is missing or declares no pictures.
pub(crate) fn read(archive: &mut Package<'_>, sheet_index: usize) -> Vec<RawImage> {
    let drawing_path = format!("xl/drawings/drawing{}.xml", sheet_index + 1);
    if let Some(sheets) = sheet_parts(archive) {
        let owned = match sheets.get(sheet_index) {
            Some(sheet_path) => drawing_part(archive, sheet_path),
            None => None,
        };
        if owned.as_deref() != Some(drawing_path.as_str()) {
            log::debug!("sheet {}: {} is not the worksheet's drawing", sheet_index, drawing_path);
            return Vec::new();
        }
    }
    let Some(drawing_xml) = ooxml::read_part(archive, &drawing_path) else {
        return Vec::new();
    };
    let rels = ooxml::read_part(archive, &ooxml::rels_path_for(&drawing_path))
        .map(|xml| ooxml::parse_relationships(&xml))
        .unwrap_or_default();
    let media = ooxml::media_entries(archive);

    let mut images = Vec::new();
    for anchor in parse_picture_anchors(&drawing_xml) {
        if anchor.kind != AnchorKind::TwoCell {
            continue;
        }
        let Some(target) = rels.get(&anchor.embed) else {
            log::debug!("drawing {}: no relationship for {}", drawing_path, anchor.embed);
            continue;
        };
        let media_path = ooxml::resolve_target(&drawing_path, target);
        let Some(index) = media.iter().position(|m| *m == media_path) else {
            log::debug!("drawing {}: {} not in media list", drawing_path, media_path);
            continue;
        };
        if let Some(bytes) = ooxml::read_part_bytes(archive, &media[index]) {
            images.push(RawImage {
                position: anchor.from,
                media_path,
                bytes,
            });
        }
    }

    images.sort_by_key(|img| img.position);
    images
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use shelfline_core::CellPos;
    use zip::ZipArchive;

    use super::*;
    use crate::ooxml::write_package as package;

    const DRAWING: &str = r#"<xdr:wsDr xmlns:xdr="x" xmlns:a="a" xmlns:r="r">
      <xdr:twoCellAnchor>
        <xdr:from><xdr:col>3</xdr:col><xdr:row>7</xdr:row></xdr:from>
        <xdr:pic><xdr:blipFill><a:blip r:embed="rId2"/></xdr:blipFill></xdr:pic>
      </xdr:twoCellAnchor>
      <xdr:oneCellAnchor>
        <xdr:from><xdr:col>3</xdr:col><xdr:row>1</xdr:row></xdr:from>
        <xdr:pic><xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill></xdr:pic>
      </xdr:oneCellAnchor>
    </xdr:wsDr>"#;

    const RELS: &str = r#"<Relationships>
      <Relationship Id="rId1" Target="../media/image1.png"/>
      <Relationship Id="rId2" Target="../media/image2.png"/>
    </Relationships>"#;

    #[test]
    fn binds_range_anchors_to_media() {
        let bytes = package(&[
            ("xl/drawings/drawing1.xml", DRAWING.as_bytes()),
            ("xl/drawings/_rels/drawing1.xml.rels", RELS.as_bytes()),
            ("xl/media/image1.png", b"one".as_slice()),
            ("xl/media/image2.png", b"two".as_slice()),
        ]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let images = read(&mut archive, 0);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].position, CellPos::new(7, 3));
        assert_eq!(images[0].bytes, b"two");
    }

    #[test]
    fn drawing_of_another_worksheet_is_not_borrowed() {
        // Only the second sheet has pictures, so its drawing is drawing1.xml
        let workbook = r#"<workbook xmlns:r="r"><sheets>
            <sheet name="Bread" sheetId="1" r:id="rId1"/>
            <sheet name="Fruit" sheetId="2" r:id="rId2"/>
          </sheets></workbook>"#;
        let workbook_rels = r#"<Relationships>
            <Relationship Id="rId1" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId2" Target="worksheets/sheet2.xml"/>
          </Relationships>"#;
        let sheet2 = r#"<worksheet xmlns:r="r"><sheetData/><drawing r:id="rId1"/></worksheet>"#;
        let sheet2_rels = r#"<Relationships>
            <Relationship Id="rId1" Target="../drawings/drawing1.xml"/>
          </Relationships>"#;
        let bytes = package(&[
            ("xl/workbook.xml", workbook.as_bytes()),
            ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
            ("xl/worksheets/sheet1.xml", b"<worksheet><sheetData/></worksheet>".as_slice()),
            ("xl/worksheets/sheet2.xml", sheet2.as_bytes()),
            ("xl/worksheets/_rels/sheet2.xml.rels", sheet2_rels.as_bytes()),
            ("xl/drawings/drawing1.xml", DRAWING.as_bytes()),
            ("xl/drawings/_rels/drawing1.xml.rels", RELS.as_bytes()),
            ("xl/media/image1.png", b"one".as_slice()),
            ("xl/media/image2.png", b"two".as_slice()),
        ]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert!(read(&mut archive, 0).is_empty());
    }

    #[test]
    fn other_sheets_drawing_is_ignored() {
        let bytes = package(&[
            ("xl/drawings/drawing1.xml", DRAWING.as_bytes()),
            ("xl/drawings/_rels/drawing1.xml.rels", RELS.as_bytes()),
            ("xl/media/image2.png", b"two".as_slice()),
        ]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert!(read(&mut archive, 1).is_empty());
    }
}
