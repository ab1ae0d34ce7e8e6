// PDF composition - snapshot export and the structured executive report
use crate::domain::report::{RenderedRegion, ReportData, ReportSection};
use crate::presentation::capture::{CAPTURE_SCALE, RegionSource, capture_sections, regions};
use anyhow::Context;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Px, Rect, Rgb,
};

const A4_WIDTH: f32 = 210.0;
const A4_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;

const SLATE_900: (f32, f32, f32) = (0.13, 0.16, 0.21);
const SLATE_600: (f32, f32, f32) = (0.28, 0.33, 0.41);
const SLATE_500: (f32, f32, f32) = (0.39, 0.45, 0.55);
const RED_500: (f32, f32, f32) = (0.94, 0.27, 0.27);
const CARD_FILLS: [(f32, f32, f32); 4] = [
    (0.94, 0.96, 1.0),
    (1.0, 0.97, 0.93),
    (0.94, 0.99, 0.96),
    (0.96, 0.95, 1.0),
];
const CARD_ACCENTS: [(f32, f32, f32); 4] = [
    (0.23, 0.51, 0.96),
    (0.98, 0.45, 0.09),
    (0.13, 0.77, 0.37),
    (0.55, 0.36, 0.96),
];

const TREND_CAPTION: &str = "This chart visualizes the revenue trajectory over the selected \
period. The projection line indicates the forecast based on historical trend analysis.";
const CATEGORY_CAPTION: &str = "Performance breakdown by product category. Focus on top \
performers to drive inventory decisions.";
const REGION_CAPTION: &str = "Geographic distribution of sales revenue. Identifying key regions \
allows for targeted marketing campaigns.";

fn rgb(color: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(color.0, color.1, color.2, None))
}

/// Greedy word wrap on an approximate character budget. Fixed per-page
/// slots, so overflowing lines are simply cut off by the slot height.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn draw_paragraph(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    size: f32,
    x: f32,
    top_y: f32,
    max_chars: usize,
) {
    let line_height = size * 0.5;
    for (i, line) in wrap_text(text, max_chars).iter().enumerate() {
        layer.use_text(line, size, Mm(x), Mm(top_y - line_height * i as f32), font);
    }
}

/// Largest size that fits the slot while keeping the raster's aspect.
fn fit_region(region: &RenderedRegion, max_width: f32, max_height: f32) -> (f32, f32) {
    let aspect = region.height as f32 / region.width as f32;
    if max_width * aspect <= max_height {
        (max_width, max_width * aspect)
    } else {
        (max_height / aspect, max_height)
    }
}

/// Embed a captured region at its logical size (raster is capture-scale
/// times larger, so print density ends up doubled).
fn embed_region(layer: &PdfLayerReference, region: &RenderedRegion, x: f32, y: f32, width_mm: f32) {
    let dpi = region.width as f32 / (width_mm / 25.4);
    let image = Image::from(ImageXObject {
        width: Px(region.width as usize),
        height: Px(region.height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: region.rgb.clone(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    });
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

fn placeholder(layer: &PdfLayerReference, font: &IndirectFontRef, id: &str, x: f32, y: f32) {
    layer.set_fill_color(rgb(RED_500));
    layer.use_text(format!("[Chart unavailable: {id}]"), 10.0, Mm(x), Mm(y), font);
}

/// Whole-section snapshot: every mounted region on its own landscape
/// page, in catalog order. Unmounted regions are skipped; with nothing
/// mounted at all there is no document to produce.
pub fn snapshot_document(
    sections: &[ReportSection],
    source: &dyn RegionSource,
) -> anyhow::Result<Option<Vec<u8>>> {
    let captured = capture_sections(source, sections);
    let mounted: Vec<_> = captured
        .into_iter()
        .filter_map(|(section, region)| region.map(|r| (section, r)))
        .collect();
    if mounted.is_empty() {
        tracing::warn!("no mounted sections to capture");
        return Ok(None);
    }

    let (doc, first_page, first_layer) = PdfDocument::new(
        "Dashboard Snapshot",
        Mm(A4_HEIGHT),
        Mm(A4_WIDTH),
        "snapshot",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("failed to register report font")?;

    for (i, (section, region)) in mounted.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(A4_HEIGHT), Mm(A4_WIDTH), "snapshot");
            doc.get_page(page).get_layer(layer)
        };

        layer.set_fill_color(rgb(SLATE_900));
        layer.use_text(&section.label, 16.0, Mm(MARGIN), Mm(A4_WIDTH - 16.0), &font);

        let (width, height) = fit_region(region, A4_HEIGHT - MARGIN * 2.0, A4_WIDTH - 36.0);
        embed_region(&layer, region, MARGIN, A4_WIDTH - 26.0 - height, width);
    }

    let bytes = doc.save_to_bytes().context("failed to serialize snapshot")?;
    Ok(Some(bytes))
}

/// Structured executive report: vector first page (title, date stamp,
/// KPI cards, AI insight block), then one fixed slot per named chart
/// region with its caption. A missing region degrades to a placeholder
/// caption instead of aborting the document.
pub fn structured_document(
    data: &ReportData,
    source: &dyn RegionSource,
) -> anyhow::Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(&data.title, Mm(A4_WIDTH), Mm(A4_HEIGHT), "report");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("failed to register report font")?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .context("failed to register report font")?;

    // Page 1: summary
    let layer = doc.get_page(first_page).get_layer(first_layer);

    layer.set_fill_color(rgb(SLATE_900));
    layer.use_text(&data.title, 24.0, Mm(MARGIN), Mm(A4_HEIGHT - 30.0), &bold);
    layer.set_fill_color(rgb(SLATE_500));
    layer.use_text(
        format!("Generated on: {}", data.generated_on),
        10.0,
        Mm(MARGIN),
        Mm(A4_HEIGHT - 38.0),
        &font,
    );

    layer.set_fill_color(rgb(SLATE_900));
    layer.use_text(
        "Executive Summary",
        16.0,
        Mm(MARGIN),
        Mm(A4_HEIGHT - 55.0),
        &bold,
    );

    let cards = [
        ("Total Revenue", &data.kpis.revenue),
        ("Active Orders", &data.kpis.orders),
        ("Avg. Order Value", &data.kpis.average_order_value),
        ("Active Customers", &data.kpis.customers),
    ];
    let card_w = 40.0;
    let card_h = 25.0;
    let gap = 5.0;
    let card_top = A4_HEIGHT - 65.0;
    for (i, (label, value)) in cards.iter().enumerate() {
        let x = MARGIN + (card_w + gap) * i as f32;
        layer.set_fill_color(rgb(CARD_FILLS[i]));
        layer.add_rect(
            Rect::new(Mm(x), Mm(card_top - card_h), Mm(x + card_w), Mm(card_top))
                .with_mode(PaintMode::Fill),
        );
        layer.set_fill_color(rgb(CARD_ACCENTS[i]));
        layer.use_text(*label, 8.0, Mm(x + 5.0), Mm(card_top - 8.0), &font);
        layer.set_fill_color(rgb(SLATE_900));
        layer.use_text(value.as_str(), 12.0, Mm(x + 5.0), Mm(card_top - 18.0), &bold);
    }

    if let Some(insight) = &data.insight {
        let block_top = card_top - card_h - 20.0;
        layer.set_fill_color(rgb(SLATE_900));
        layer.use_text("AI Business Analysis", 16.0, Mm(MARGIN), Mm(block_top), &bold);
        layer.use_text(&insight.title, 12.0, Mm(MARGIN + 5.0), Mm(block_top - 10.0), &bold);
        layer.set_fill_color(rgb(SLATE_600));
        draw_paragraph(
            &layer,
            &font,
            &insight.content,
            10.0,
            MARGIN + 5.0,
            block_top - 20.0,
            95,
        );
    }

    // Page 2: revenue trend
    let (page, page_layer) = doc.add_page(Mm(A4_WIDTH), Mm(A4_HEIGHT), "report");
    let layer = doc.get_page(page).get_layer(page_layer);
    layer.set_fill_color(rgb(SLATE_900));
    layer.use_text(
        "Visual Analytics: Revenue Trends",
        16.0,
        Mm(MARGIN),
        Mm(A4_HEIGHT - 20.0),
        &bold,
    );
    chart_slot(
        &layer,
        &font,
        source,
        regions::REVENUE_TREND,
        TREND_CAPTION,
        A4_HEIGHT - 30.0,
        100.0,
    );

    // Page 3: segmentation
    let (page, page_layer) = doc.add_page(Mm(A4_WIDTH), Mm(A4_HEIGHT), "report");
    let layer = doc.get_page(page).get_layer(page_layer);
    layer.set_fill_color(rgb(SLATE_900));
    layer.use_text(
        "Market Segmentation",
        16.0,
        Mm(MARGIN),
        Mm(A4_HEIGHT - 20.0),
        &bold,
    );
    layer.use_text("Top Categories", 12.0, Mm(MARGIN), Mm(A4_HEIGHT - 33.0), &bold);
    chart_slot(
        &layer,
        &font,
        source,
        regions::CATEGORY,
        CATEGORY_CAPTION,
        A4_HEIGHT - 38.0,
        85.0,
    );
    layer.set_fill_color(rgb(SLATE_900));
    layer.use_text(
        "Regional Distribution",
        12.0,
        Mm(MARGIN),
        Mm(A4_HEIGHT - 158.0),
        &bold,
    );
    chart_slot(
        &layer,
        &font,
        source,
        regions::REGION,
        REGION_CAPTION,
        A4_HEIGHT - 163.0,
        85.0,
    );

    doc.save_to_bytes().context("failed to serialize report")
}

/// One fixed chart slot: the captured region (or its placeholder) with
/// the caption paragraph below.
fn chart_slot(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    source: &dyn RegionSource,
    region_id: &str,
    caption: &str,
    slot_top: f32,
    slot_height: f32,
) {
    match source.capture(region_id, CAPTURE_SCALE) {
        Some(region) => {
            let (width, height) = fit_region(&region, A4_WIDTH - MARGIN * 2.0, slot_height);
            embed_region(layer, &region, MARGIN, slot_top - height, width);
        }
        None => {
            tracing::warn!("region '{region_id}' not mounted, inserting placeholder");
            placeholder(layer, font, region_id, MARGIN, slot_top - 10.0);
        }
    }
    layer.set_fill_color(rgb(SLATE_600));
    draw_paragraph(
        layer,
        font,
        caption,
        10.0,
        MARGIN,
        slot_top - slot_height - 6.0,
        100,
    );
}

pub fn save_document(bytes: &[u8], path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{KpiCards, ReportInsight};
    use crate::presentation::capture::sections;
    use std::collections::HashSet;

    struct StubSource(HashSet<&'static str>);

    impl RegionSource for StubSource {
        fn capture(&self, id: &str, scale: u32) -> Option<RenderedRegion> {
            self.0.contains(id).then(|| RenderedRegion {
                width: 32 * scale,
                height: 20 * scale,
                rgb: vec![0x80; (32 * scale * 20 * scale * 3) as usize],
            })
        }
    }

    fn report_data() -> ReportData {
        ReportData {
            title: "Executive Report".to_string(),
            generated_on: "August 6, 2026".to_string(),
            kpis: KpiCards {
                revenue: "$52,450".to_string(),
                orders: "126".to_string(),
                average_order_value: "$85.20".to_string(),
                customers: "1,240".to_string(),
            },
            insight: Some(ReportInsight {
                title: "Revenue Spike Detected".to_string(),
                content: "Unusual spike in Electronics driven by wireless headphone sales."
                    .to_string(),
            }),
        }
    }

    fn section(id: &str) -> ReportSection {
        ReportSection {
            id: id.to_string(),
            label: id.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_structured_report_with_all_regions() {
        let source = StubSource(HashSet::from([
            regions::REVENUE_TREND,
            regions::CATEGORY,
            regions::REGION,
        ]));
        let bytes = structured_document(&report_data(), &source).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_region_still_produces_complete_document() {
        let source = StubSource(HashSet::from([regions::REVENUE_TREND]));
        let bytes = structured_document(&report_data(), &source).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_report_without_insight_block() {
        let mut data = report_data();
        data.insight = None;
        let source = StubSource(HashSet::new());
        assert!(structured_document(&data, &source).is_ok());
    }

    #[test]
    fn test_snapshot_skips_unmounted_sections() {
        let source = StubSource(HashSet::from([sections::KPIS]));
        let bytes = snapshot_document(
            &[section(sections::KPIS), section(sections::CHARTS_REGION)],
            &source,
        )
        .unwrap();
        assert!(bytes.unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_snapshot_with_nothing_mounted_yields_no_document() {
        let source = StubSource(HashSet::new());
        let result = snapshot_document(&[section(sections::KPIS)], &source).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_wrap_text_respects_budget() {
        let lines = wrap_text("alpha beta gamma delta epsilon", 11);
        assert_eq!(lines, ["alpha beta", "gamma delta", "epsilon"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert!(wrap_text("", 20).is_empty());
    }
}
