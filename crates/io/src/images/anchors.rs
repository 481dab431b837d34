use quick_xml::events::Event;
use quick_xml::Reader;
use shelfline_core::CellPos;

/// How a drawing object is pinned to the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnchorKind {
    /// `oneCellAnchor`: fixed size, top-left pinned to a cell.
    OneCell,
    /// `twoCellAnchor`: spans a cell range.
    TwoCell,
}

/// A picture declared in a drawing part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PictureAnchor {
    pub kind: AnchorKind,
    /// Top-left (`<from>`) cell.
    pub from: CellPos,
    /// Relationship id of the backing media (`<a:blip r:embed>`).
    pub embed: String,
}

/// Parse `<xdr:oneCellAnchor>` / `<xdr:twoCellAnchor>` pictures from a
/// drawing part. Anchors without a blip (shapes, charts) and `absoluteAnchor`
/// objects (no cell) are dropped. Only the first blip of an anchor counts, so
/// `mc:AlternateContent` fallbacks do not duplicate pictures.
pub(crate) fn parse_picture_anchors(xml: &str) -> Vec<PictureAnchor> {
    let mut anchors = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut kind: Option<AnchorKind> = None;
    let mut in_from = false;
    let mut field: Option<&'static str> = None;
    let mut from_row: Option<usize> = None;
    let mut from_col: Option<usize> = None;
    let mut embed: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"oneCellAnchor" => {
                    kind = Some(AnchorKind::OneCell);
                    from_row = None;
                    from_col = None;
                    embed = None;
                }
                b"twoCellAnchor" => {
                    kind = Some(AnchorKind::TwoCell);
                    from_row = None;
                    from_col = None;
                    embed = None;
                }
                b"from" if kind.is_some() => in_from = true,
                b"row" if in_from => field = Some("row"),
                b"col" if in_from => field = Some("col"),
                b"blip" if kind.is_some() => {
                    if embed.is_none() {
                        embed = blip_embed(e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"blip" && kind.is_some() && embed.is_none() {
                    embed = blip_embed(e);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(f) = field {
                    let value = String::from_utf8_lossy(e.as_ref()).trim().parse::<usize>().ok();
                    match f {
                        "row" => from_row = value,
                        _ => from_col = value,
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"row" | b"col" => field = None,
                b"from" => in_from = false,
                b"oneCellAnchor" | b"twoCellAnchor" => {
                    if let (Some(k), Some(row), Some(col), Some(rid)) =
                        (kind, from_row, from_col, embed.take())
                    {
                        anchors.push(PictureAnchor {
                            kind: k,
                            from: CellPos::new(row, col),
                            embed: rid,
                        });
                    }
                    kind = None;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    anchors
}

fn blip_embed(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"embed")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}
