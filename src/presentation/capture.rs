// Region capture - named dashboard regions rasterized from view state
use crate::domain::report::{RenderedRegion, ReportSection};

/// Fixed capture scale; regions rasterize at twice their logical size.
pub const CAPTURE_SCALE: u32 = 2;

/// Section ids from the report catalog.
pub mod sections {
    pub const KPIS: &str = "kpis";
    pub const CHARTS_MAIN: &str = "charts-main";
    pub const CHARTS_REGION: &str = "charts-region";
    pub const AI_INSIGHTS: &str = "ai-insights";
}

/// Chart regions referenced by name in the structured report.
pub mod regions {
    pub const REVENUE_TREND: &str = "revenue-chart";
    pub const CATEGORY: &str = "category-chart";
    pub const REGION: &str = "region-chart";
}

/// Logical pixel size of a region before the capture scale is applied.
pub fn base_size(id: &str) -> (u32, u32) {
    match id {
        sections::KPIS => (640, 120),
        sections::CHARTS_MAIN => (480, 560),
        sections::AI_INSIGHTS => (480, 240),
        regions::REVENUE_TREND | regions::CATEGORY => (480, 280),
        _ => (480, 300),
    }
}

/// Anything that can rasterize a named dashboard region from the state it
/// currently holds. Returns None when the region is not mounted; capture
/// never triggers a data fetch.
pub trait RegionSource {
    fn capture(&self, id: &str, scale: u32) -> Option<RenderedRegion>;
}

/// Capture each requested section at the fixed scale, pairing every
/// section with its raster or None when unmounted.
pub fn capture_sections(
    source: &dyn RegionSource,
    sections: &[ReportSection],
) -> Vec<(ReportSection, Option<RenderedRegion>)> {
    sections
        .iter()
        .map(|section| {
            let captured = source.capture(&section.id, CAPTURE_SCALE);
            if captured.is_none() {
                tracing::debug!("section '{}' not mounted, skipping capture", section.id);
            }
            (section.clone(), captured)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct StubSource(HashSet<&'static str>);

    impl RegionSource for StubSource {
        fn capture(&self, id: &str, scale: u32) -> Option<RenderedRegion> {
            self.0.contains(id).then(|| {
                let (w, h) = base_size(id);
                RenderedRegion {
                    width: w * scale,
                    height: h * scale,
                    rgb: vec![0xff; (w * scale * h * scale * 3) as usize],
                }
            })
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
    fn test_unmounted_sections_yield_none() {
        let source = StubSource(HashSet::from([sections::KPIS]));
        let captured = capture_sections(
            &source,
            &[section(sections::KPIS), section(sections::CHARTS_REGION)],
        );

        assert_eq!(captured.len(), 2);
        assert!(captured[0].1.is_some());
        assert!(captured[1].1.is_none());
    }

    #[test]
    fn test_capture_applies_fixed_scale() {
        let source = StubSource(HashSet::from([sections::KPIS]));
        let captured = capture_sections(&source, &[section(sections::KPIS)]);
        let region = captured[0].1.as_ref().unwrap();

        let (w, h) = base_size(sections::KPIS);
        assert_eq!(region.width, w * CAPTURE_SCALE);
        assert_eq!(region.height, h * CAPTURE_SCALE);
    }
}
