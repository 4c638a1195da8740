use crate::layout::Layout;
use crate::types::{Placement, Rect};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// ASCII drawing of one sheet, scaled to fit an 80x40 character box.
pub fn render_sheet<'a>(sheet: Rect, placements: impl IntoIterator<Item = &'a Placement>) -> String {
    let scale = f64::min(MAX_WIDTH / sheet.w as f64, MAX_HEIGHT / sheet.h as f64);
    let grid_w = (sheet.w as f64 * scale).round() as usize;
    let grid_h = (sheet.h as f64 * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    // Draw sheet border first
    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in placements {
        let sx = (p.x as f64 * scale).round() as usize;
        let sy = (p.y as f64 * scale).round() as usize;
        let sw = (p.rect.w as f64 * scale).round() as usize;
        let sh = (p.rect.h as f64 * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label: Vec<char> = p.rect.to_string().chars().collect();
        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let start_x = cx.saturating_sub(label.len() / 2);

            for (i, &ch) in label.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

/// Every opened sheet of `layout`, each under a `Sheet N (WxH):` heading.
pub fn render_layout(layout: &Layout) -> String {
    let mut out = String::new();
    for sheet in &layout.opened_sheets {
        out.push_str(&format!("Sheet {} ({}):\n", sheet.index + 1, sheet.size));
        out.push_str(&render_sheet(sheet.size, layout.placements_on(sheet.index)));
        out.push('\n');
    }
    out
}

fn edge(current: char, crossing: char, own: char) -> char {
    if current == crossing || current == '+' {
        '+'
    } else {
        own
    }
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    for i in x..=x + w {
        if i >= cols {
            continue;
        }
        for row in [y, y + h] {
            if row < rows {
                grid[row][i] = edge(grid[row][i], '|', '-');
            }
        }
    }

    for j in y..=y + h {
        if j >= rows {
            continue;
        }
        for col in [x, x + w] {
            if col < cols {
                grid[j][col] = edge(grid[j][col], '-', '|');
            }
        }
    }

    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
