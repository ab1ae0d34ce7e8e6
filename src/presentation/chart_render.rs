// Offscreen chart rasterization via the plotters bitmap backend
use crate::application::trend_service::TrendChartData;
use crate::domain::kpi::{AiInsight, SlicePoint, TrendPoint};
use crate::domain::report::{KpiCards, RenderedRegion};
use plotters::element::Pie;
use plotters::prelude::*;

/// Slice palette, matching the dashboard's accent colors.
const PALETTE: [RGBColor; 5] = [
    RGBColor(0x3b, 0x82, 0xf6),
    RGBColor(0x10, 0xb9, 0x81),
    RGBColor(0xf5, 0x9e, 0x0b),
    RGBColor(0xef, 0x44, 0x44),
    RGBColor(0x8b, 0x5c, 0xf6),
];

const HISTORY_BLUE: RGBColor = RGBColor(0x3b, 0x82, 0xf6);
const FORECAST_PURPLE: RGBColor = RGBColor(0xa8, 0x55, 0xf7);
const TEXT_DARK: RGBColor = RGBColor(0x21, 0x29, 0x36);
const TEXT_MUTED: RGBColor = RGBColor(0x64, 0x74, 0x8b);
const CARD_FILLS: [RGBColor; 4] = [
    RGBColor(0xef, 0xf6, 0xff),
    RGBColor(0xff, 0xf7, 0xed),
    RGBColor(0xf0, 0xfd, 0xf4),
    RGBColor(0xf5, 0xf3, 0xff),
];

/// Cap on rendered points per series; longer series are bucket-averaged.
const MAX_PLOT_POINTS: usize = 150;

fn new_region(width: u32, height: u32) -> RenderedRegion {
    RenderedRegion {
        width,
        height,
        rgb: vec![0xff; (width * height * 3) as usize],
    }
}

/// Axis labels in the dashboard's compact form (1.2M, 45k).
fn format_axis_value(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}

/// Bucket-average a series down to `max_points`, keeping the middle
/// timestamp of each bucket.
fn downsample(points: &[TrendPoint], max_points: usize) -> Vec<TrendPoint> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len().div_ceil(max_points);
    let mut downsampled = Vec::with_capacity(max_points);
    for chunk in points.chunks(bucket_size) {
        let mid = &chunk[chunk.len() / 2];
        let avg = chunk.iter().map(|p| p.revenue).sum::<f64>() / chunk.len() as f64;
        downsampled.push(TrendPoint {
            date: mid.date.clone(),
            revenue: avg,
        });
    }
    downsampled
}

/// Short "Jul 3" style tick label from an ISO date.
fn short_date(date: &str) -> String {
    let mut parts = date.splitn(3, '-');
    let _year = parts.next();
    let month = parts.next().and_then(|m| m.parse::<usize>().ok());
    let day = parts.next().and_then(|d| d.parse::<u32>().ok());
    match (month, day) {
        (Some(m), Some(d)) if (1..=12).contains(&m) => {
            const MONTHS: [&str; 12] = [
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ];
            format!("{} {}", MONTHS[m - 1], d)
        }
        _ => date.to_string(),
    }
}

/// Revenue trend as an area chart, with the forecast continuation drawn
/// as a second series in the projection color.
pub fn render_trend(data: &TrendChartData, width: u32, height: u32) -> RenderedRegion {
    let mut region = new_region(width, height);
    {
        let history = downsample(&data.history, MAX_PLOT_POINTS);
        let forecast = downsample(&data.forecast, MAX_PLOT_POINTS);

        let root = BitMapBackend::with_buffer(&mut region.rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).ok();

        let total = history.len() + forecast.len().saturating_sub(1);
        let max_y = history
            .iter()
            .chain(forecast.iter())
            .map(|p| p.revenue)
            .fold(0.0f64, f64::max)
            .max(1.0);

        let dates: Vec<String> = history
            .iter()
            .chain(forecast.iter().skip(1))
            .map(|p| short_date(&p.date))
            .collect();

        let Ok(mut chart) = ChartBuilder::on(&root)
            .caption(
                "Revenue Trends",
                ("sans-serif", 22).into_font().color(&TEXT_DARK),
            )
            .margin(12)
            .x_label_area_size(26)
            .y_label_area_size(48)
            .build_cartesian_2d(0usize..total.max(1), 0f64..max_y * 1.1)
        else {
            drop(root);
            return region;
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(6)
            .y_labels(5)
            .x_label_formatter(&|i| dates.get(*i).cloned().unwrap_or_default())
            .y_label_formatter(&|v| format_axis_value(*v))
            .label_style(("sans-serif", 12, &TEXT_MUTED))
            .draw()
            .ok();

        chart
            .draw_series(AreaSeries::new(
                history.iter().enumerate().map(|(i, p)| (i, p.revenue)),
                0.0,
                HISTORY_BLUE.mix(0.25),
            ))
            .ok();
        chart
            .draw_series(LineSeries::new(
                history.iter().enumerate().map(|(i, p)| (i, p.revenue)),
                HISTORY_BLUE.stroke_width(3),
            ))
            .ok();

        if !forecast.is_empty() {
            let offset = history.len().saturating_sub(1);
            chart
                .draw_series(LineSeries::new(
                    forecast
                        .iter()
                        .enumerate()
                        .map(|(i, p)| (offset + i, p.revenue)),
                    FORECAST_PURPLE.stroke_width(2),
                ))
                .ok();
        }

        root.present().ok();
    }
    region
}

/// Categorical breakdown as a bar chart, one palette color per slice.
pub fn render_bars(slices: &[SlicePoint], title: &str, width: u32, height: u32) -> RenderedRegion {
    let mut region = new_region(width, height);
    {
        let root = BitMapBackend::with_buffer(&mut region.rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).ok();

        let max_y = slices.iter().map(|s| s.value).fold(0.0f64, f64::max).max(1.0);
        let names: Vec<String> = slices.iter().map(|s| s.name.clone()).collect();

        let Ok(mut chart) = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22).into_font().color(&TEXT_DARK))
            .margin(12)
            .x_label_area_size(28)
            .y_label_area_size(48)
            .build_cartesian_2d(
                (0usize..slices.len().max(1)).into_segmented(),
                0f64..max_y * 1.1,
            )
        else {
            drop(root);
            return region;
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(slices.len().max(1))
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    names.get(*i).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .y_label_formatter(&|v| format_axis_value(*v))
            .label_style(("sans-serif", 12, &TEXT_MUTED))
            .draw()
            .ok();

        chart
            .draw_series(slices.iter().enumerate().map(|(i, s)| {
                let color = PALETTE[i % PALETTE.len()];
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), s.value),
                    ],
                    color.filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                bar
            }))
            .ok();

        root.present().ok();
    }
    region
}

/// Regional distribution as a pie chart.
pub fn render_pie(slices: &[SlicePoint], title: &str, width: u32, height: u32) -> RenderedRegion {
    let mut region = new_region(width, height);
    {
        let root = BitMapBackend::with_buffer(&mut region.rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).ok();
        root.draw(&Text::new(
            title.to_string(),
            (16, 16),
            ("sans-serif", 22).into_font().color(&TEXT_DARK),
        ))
        .ok();

        let sizes: Vec<f64> = slices.iter().map(|s| s.value).collect();
        let labels: Vec<String> = slices.iter().map(|s| s.name.clone()).collect();
        let colors: Vec<RGBColor> = slices
            .iter()
            .enumerate()
            .map(|(i, _)| PALETTE[i % PALETTE.len()])
            .collect();

        let center = (width as i32 / 2, height as i32 / 2 + 10);
        let radius = (width.min(height) as f64) * 0.32;

        if !sizes.is_empty() {
            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.label_style(("sans-serif", 14).into_font().color(&TEXT_DARK));
            root.draw(&pie).ok();
        }

        root.present().ok();
    }
    region
}

/// The four KPI cards as a single horizontal strip.
pub fn render_kpi_cards(cards: &KpiCards, width: u32, height: u32) -> RenderedRegion {
    let mut region = new_region(width, height);
    {
        let root = BitMapBackend::with_buffer(&mut region.rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).ok();

        let entries = [
            ("Total Revenue", &cards.revenue),
            ("Active Orders", &cards.orders),
            ("Avg. Order Value", &cards.average_order_value),
            ("Active Customers", &cards.customers),
        ];

        let gap = 12i32;
        let card_w = (width as i32 - gap * 5) / 4;
        let card_h = height as i32 - gap * 2;
        for (i, (label, value)) in entries.iter().enumerate() {
            let x0 = gap + (card_w + gap) * i as i32;
            let y0 = gap;
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + card_w, y0 + card_h)],
                CARD_FILLS[i].filled(),
            ))
            .ok();
            root.draw(&Text::new(
                label.to_string(),
                (x0 + 12, y0 + 16),
                ("sans-serif", 15).into_font().color(&TEXT_MUTED),
            ))
            .ok();
            root.draw(&Text::new(
                value.to_string(),
                (x0 + 12, y0 + card_h / 2),
                ("sans-serif", 26).into_font().color(&TEXT_DARK),
            ))
            .ok();
        }

        root.present().ok();
    }
    region
}

/// The recent-insights panel as stacked text blocks.
pub fn render_insights(insights: &[AiInsight], width: u32, height: u32) -> RenderedRegion {
    let mut region = new_region(width, height);
    {
        let root = BitMapBackend::with_buffer(&mut region.rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).ok();
        root.draw(&Text::new(
            "Recent AI Insights".to_string(),
            (16, 16),
            ("sans-serif", 22).into_font().color(&TEXT_DARK),
        ))
        .ok();

        let mut y = 56i32;
        for insight in insights {
            if y + 44 > height as i32 {
                break;
            }
            root.draw(&Text::new(
                insight.title.clone(),
                (16, y),
                ("sans-serif", 17).into_font().color(&TEXT_DARK),
            ))
            .ok();
            root.draw(&Text::new(
                insight.content.clone(),
                (16, y + 22),
                ("sans-serif", 13).into_font().color(&TEXT_MUTED),
            ))
            .ok();
            y += 56;
        }

        root.present().ok();
    }
    region
}

/// Trend and category charts stacked into one region, matching the main
/// charts row of the dashboard.
pub fn render_main_charts(
    trend: &TrendChartData,
    categories: &[SlicePoint],
    width: u32,
    height: u32,
) -> RenderedRegion {
    let half = height / 2;
    let top = render_trend(trend, width, half);
    let bottom = render_bars(categories, "Sales by Category", width, height - half);

    let mut region = new_region(width, height);
    let row = (width * 3) as usize;
    region.rgb[..top.rgb.len()].copy_from_slice(&top.rgb);
    region.rgb[(half as usize * row)..].copy_from_slice(&bottom.rgb);
    region
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend_data(n: usize) -> TrendChartData {
        TrendChartData {
            history: (0..n)
                .map(|i| TrendPoint {
                    date: format!("2026-07-{:02}", i % 28 + 1),
                    revenue: 1000.0 + i as f64,
                })
                .collect(),
            forecast: Vec::new(),
        }
    }

    #[test]
    fn test_rendered_region_has_expected_size() {
        let region = render_trend(&trend_data(14), 480, 280);
        assert_eq!(region.width, 480);
        assert_eq!(region.height, 280);
        assert_eq!(region.rgb.len(), 480 * 280 * 3);
    }

    #[test]
    fn test_render_is_not_blank() {
        let region = render_trend(&trend_data(14), 320, 200);
        assert!(region.rgb.iter().any(|b| *b != 0xff));
    }

    #[test]
    fn test_downsample_caps_points() {
        let data = trend_data(1000);
        let sampled = downsample(&data.history, MAX_PLOT_POINTS);
        assert!(sampled.len() <= MAX_PLOT_POINTS);
        assert!(!sampled.is_empty());
    }

    #[test]
    fn test_downsample_passes_short_series_through() {
        let data = trend_data(10);
        assert_eq!(downsample(&data.history, MAX_PLOT_POINTS).len(), 10);
    }

    #[test]
    fn test_axis_value_formatting() {
        assert_eq!(format_axis_value(1_500_000.0), "1.5M");
        assert_eq!(format_axis_value(45_000.0), "45k");
        assert_eq!(format_axis_value(640.0), "640");
    }

    #[test]
    fn test_short_date() {
        assert_eq!(short_date("2026-07-03"), "Jul 3");
        assert_eq!(short_date("bad-date"), "bad-date");
    }

    #[test]
    fn test_bar_and_pie_render_at_requested_size() {
        let slices = vec![
            SlicePoint {
                name: "Home".to_string(),
                value: 9800.0,
            },
            SlicePoint {
                name: "Sports".to_string(),
                value: 4800.0,
            },
        ];
        let bars = render_bars(&slices, "Sales by Category", 320, 200);
        assert_eq!(bars.rgb.len(), 320 * 200 * 3);
        let pie = render_pie(&slices, "Regional Distribution", 320, 240);
        assert_eq!(pie.rgb.len(), 320 * 240 * 3);
    }

    #[test]
    fn test_stacked_main_charts_region() {
        let slices = vec![SlicePoint {
            name: "Home".to_string(),
            value: 9800.0,
        }];
        let region = render_main_charts(&trend_data(5), &slices, 320, 400);
        assert_eq!(region.rgb.len(), 320 * 400 * 3);
    }
}
