//! SVG drawing of a layout: one panel per opened sheet, pieces coloured by size.

use svg::Document;
use svg::node::element::{Group, Rectangle, Text, Title};

use crate::layout::Layout;
use crate::types::Rect;

/// Matplotlib's tab10 palette.
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Space between panels, as a fraction of the tallest sheet.
const GAP_RATIO: f64 = 0.1;

/// Colour for the `i`th distinct piece size.
pub fn color_for(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

pub fn layout_to_svg(layout: &Layout) -> Document {
    let sizes = layout.distinct_sizes();
    let max_h = layout
        .opened_sheets
        .iter()
        .map(|s| s.size.h)
        .max()
        .unwrap_or(1) as f64;
    let gap = max_h * GAP_RATIO;
    let font_size = max_h * 0.05;
    let stroke = max_h * 0.004;

    let mut doc = Document::new().set("xmlns:xlink", "http://www.w3.org/1999/xlink");
    let mut offset = gap;

    for sheet in &layout.opened_sheets {
        let mut panel = Group::new()
            .set("id", format!("sheet_{}", sheet.index))
            .set("transform", format!("translate({offset} {gap})"))
            .add(Title::new(format!("sheet {}: {}", sheet.index + 1, sheet.size)))
            .add(
                Rectangle::new()
                    .set("width", sheet.size.w)
                    .set("height", sheet.size.h)
                    .set("fill", "none")
                    .set("stroke", "black")
                    .set("stroke-width", 2.0 * stroke),
            );

        for p in layout.placements_on(sheet.index) {
            let color = sizes
                .iter()
                .position(|s| *s == p.rect)
                .map(color_for)
                .unwrap_or("#cccccc");
            panel = panel.add(
                Rectangle::new()
                    .set("x", p.x)
                    .set("y", p.y)
                    .set("width", p.rect.w)
                    .set("height", p.rect.h)
                    .set("fill", color)
                    .set("fill-opacity", 0.7)
                    .set("stroke", "black")
                    .set("stroke-width", stroke)
                    .add(Title::new(format!("{} @ ({}, {})", p.rect, p.x, p.y))),
            );
        }

        panel = panel.add(
            Text::new(format!("Sheet {}", sheet.index + 1))
                .set("x", 0)
                .set("y", -font_size * 0.4)
                .set("font-size", font_size)
                .set("font-family", "sans-serif"),
        );

        doc = doc.add(panel);
        offset += sheet.size.w as f64 + gap;
    }

    let legend_y = gap + max_h + gap;
    let legend = legend(&sizes, gap, legend_y, font_size);
    let legend_rows = sizes.len().max(1) as f64;
    let height = legend_y + legend_rows * font_size * 1.5 + gap;

    doc.add(legend).set("viewBox", (0.0, 0.0, offset.max(4.0 * gap), height))
}

fn legend(sizes: &[Rect], x: f64, y: f64, font_size: f64) -> Group {
    let row = font_size * 1.5;
    sizes
        .iter()
        .enumerate()
        .fold(Group::new().set("id", "legend"), |g, (i, size)| {
            let top = y + i as f64 * row;
            g.add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", top)
                    .set("width", font_size)
                    .set("height", font_size)
                    .set("fill", color_for(i))
                    .set("fill-opacity", 0.7),
            )
            .add(
                Text::new(size.to_string())
                    .set("x", x + font_size * 1.5)
                    .set("y", top + font_size * 0.85)
                    .set("font-size", font_size)
                    .set("font-family", "sans-serif"),
            )
        })
}
