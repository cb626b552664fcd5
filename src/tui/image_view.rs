use crate::model::Thumbnail;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

/// Paints a thumbnail with upper half blocks: each cell carries two pixel rows,
/// the top one as foreground and the bottom one as background.
pub struct ThumbnailView<'a> {
    thumb: &'a Thumbnail,
}

impl<'a> ThumbnailView<'a> {
    pub fn new(thumb: &'a Thumbnail) -> Self {
        Self { thumb }
    }
}

/// Largest (columns, pixel rows) that fits `cols x rows` cells while keeping the
/// image aspect ratio. Pixel rows are twice the cell rows.
pub fn fit(img_w: u32, img_h: u32, cols: u16, rows: u16) -> (u16, u16) {
    if img_w == 0 || img_h == 0 || cols == 0 || rows == 0 {
        return (0, 0);
    }
    let max_w = cols as f64;
    let max_h = rows as f64 * 2.0;
    let scale = (max_w / img_w as f64).min(max_h / img_h as f64);
    let w = ((img_w as f64 * scale).floor() as u16).clamp(1, cols);
    let h = ((img_h as f64 * scale).floor() as u16).clamp(1, rows * 2);
    (w, h)
}

impl Widget for ThumbnailView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (w, h) = fit(self.thumb.width, self.thumb.height, area.width, area.height);
        if w == 0 || h == 0 {
            return;
        }
        let cell_rows = h.div_ceil(2);
        let x0 = area.x + (area.width - w) / 2;
        let y0 = area.y + (area.height - cell_rows) / 2;

        let sample = |px: u16, py: u16| -> Color {
            let sx = px as u32 * self.thumb.width / w as u32;
            let sy = py as u32 * self.thumb.height / h as u32;
            let [r, g, b] = self.thumb.pixel(sx, sy);
            Color::Rgb(r, g, b)
        };

        for cy in 0..cell_rows {
            for cx in 0..w {
                let top = sample(cx, cy * 2);
                let bottom = if cy * 2 + 1 < h {
                    sample(cx, cy * 2 + 1)
                } else {
                    Color::Reset
                };
                if let Some(cell) = buf.cell_mut((x0 + cx, y0 + cy)) {
                    cell.set_char('▀').set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_ratio() {
        // 2:1 image into 40x10 cells (40x20 pixels): width bound.
        assert_eq!(fit(200, 100, 40, 10), (40, 20));
        // Tall image is height bound.
        assert_eq!(fit(100, 400, 40, 10), (5, 20));
    }

    #[test]
    fn fit_handles_degenerate_sizes() {
        assert_eq!(fit(0, 10, 10, 10), (0, 0));
        assert_eq!(fit(10, 10, 0, 10), (0, 0));
        assert_eq!(fit(1000, 1, 10, 10), (10, 1));
    }

    #[test]
    fn renders_half_blocks_with_pixel_colors() {
        let thumb = Thumbnail {
            width: 1,
            height: 2,
            pixels: vec![[255, 0, 0], [0, 0, 255]],
        };
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        ThumbnailView::new(&thumb).render(area, &mut buf);

        let cell = buf.cell((0, 0)).expect("cell");
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    }
}
