//! Word cloud rendering.
//!
//! Words are sized by relative frequency and placed largest first along an
//! Archimedean spiral starting at the canvas centre. Free space is tracked on
//! a coarse cell grid with a summed-area table, so each candidate position is
//! checked in constant time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::error::Error;

pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Samples of the viridis colormap.
const PALETTE: [[u8; 3]; 8] = [
    [68, 1, 84],
    [70, 50, 126],
    [54, 92, 141],
    [39, 127, 142],
    [31, 161, 135],
    [74, 193, 109],
    [160, 218, 57],
    [94, 201, 98],
];

const CELL: u32 = 4;
const FONT_STEP: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub word: String,
    pub font_size: f32,
    /// Top-left corner in pixels.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct WordCloud {
    #[builder(default = 800)]
    width: u32,

    #[builder(default = 1000)]
    height: u32,

    #[builder(default = 200)]
    max_words: usize,

    #[builder(default = 120.0)]
    max_font_size: f32,

    #[builder(default = 6.0)]
    min_font_size: f32,

    #[builder(default = Rgb([255, 255, 255]))]
    background: Rgb<u8>,

    #[builder(default = 42)]
    seed: u64,
}

impl Default for WordCloud {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Count words across cleaned texts, most frequent first (ties alphabetical).
pub fn word_frequencies<I, S>(texts: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in text.as_ref().split_whitespace() {
            *counts.entry(word.to_owned()).or_default() += 1;
        }
    }
    let mut frequencies: Vec<(String, usize)> = counts.into_iter().collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    frequencies
}

struct Occupancy {
    columns: usize,
    rows: usize,
    filled: Vec<bool>,
    integral: Vec<u32>,
}

impl Occupancy {
    fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            filled: vec![false; columns * rows],
            integral: vec![0; (columns + 1) * (rows + 1)],
        }
    }

    fn is_free(&self, col: usize, row: usize, w: usize, h: usize) -> bool {
        if col + w > self.columns || row + h > self.rows {
            return false;
        }
        let stride = self.columns + 1;
        let at = |c: usize, r: usize| self.integral[r * stride + c];
        at(col + w, row + h) + at(col, row) == at(col + w, row) + at(col, row + h)
    }

    fn fill(&mut self, col: usize, row: usize, w: usize, h: usize) {
        for r in row..row + h {
            for c in col..col + w {
                self.filled[r * self.columns + c] = true;
            }
        }
        let stride = self.columns + 1;
        for r in 0..self.rows {
            let mut row_sum = 0;
            for c in 0..self.columns {
                row_sum += u32::from(self.filled[r * self.columns + c]);
                self.integral[(r + 1) * stride + c + 1] = self.integral[r * stride + c + 1] + row_sum;
            }
        }
    }

    /// First free spot on a spiral around the centre, as a top-left cell.
    fn find_spot(&self, w: usize, h: usize) -> Option<(usize, usize)> {
        if w > self.columns || h > self.rows {
            return None;
        }
        let center_x = (self.columns - w) as f32 / 2.0;
        let center_y = (self.rows - h) as f32 / 2.0;
        let max_radius = self.columns.max(self.rows) as f32;

        let mut angle = 0.0f32;
        loop {
            let radius = 0.5 * angle;
            if radius > max_radius {
                return None;
            }
            let x = center_x + radius * angle.cos();
            let y = center_y + radius * angle.sin();
            if x >= 0.0 && y >= 0.0 {
                let (col, row) = (x.round() as usize, y.round() as usize);
                if self.is_free(col, row, w, h) {
                    return Some((col, row));
                }
            }
            angle += 0.1;
        }
    }
}

impl WordCloud {
    /// Place words using `measure(word, font_size) -> (width, height)` in pixels.
    pub fn layout<M>(&self, frequencies: &[(String, usize)], measure: M) -> Vec<Placement>
    where
        M: Fn(&str, f32) -> (u32, u32),
    {
        let mut occupancy = Occupancy::new(
            (self.width / CELL) as usize,
            (self.height / CELL) as usize,
        );
        let Some(max_count) = frequencies.first().map(|(_, c)| *c as f32) else {
            return Vec::new();
        };

        let mut placements = Vec::new();
        let mut last_size = self.max_font_size;
        for (word, count) in frequencies.iter().take(self.max_words) {
            let relative = *count as f32 / max_count;
            let mut size = (self.max_font_size * (0.5 + 0.5 * relative)).min(last_size);

            while size >= self.min_font_size {
                let (w, h) = measure(word, size);
                let cells_w = w.div_ceil(CELL).max(1) as usize;
                let cells_h = h.div_ceil(CELL).max(1) as usize;
                if let Some((col, row)) = occupancy.find_spot(cells_w, cells_h) {
                    occupancy.fill(col, row, cells_w, cells_h);
                    placements.push(Placement {
                        word: word.clone(),
                        font_size: size,
                        x: col as u32 * CELL,
                        y: row as u32 * CELL,
                        width: w,
                        height: h,
                    });
                    last_size = size;
                    break;
                }
                size -= FONT_STEP;
            }

            if size < self.min_font_size {
                debug!(word = %word, "no room left in word cloud");
            }
        }
        placements
    }

    pub fn render(&self, frequencies: &[(String, usize)], font: &FontVec) -> RgbImage {
        let placements = self.layout(frequencies, |word, size| measure_text(font, word, size));
        let mut image = RgbImage::from_pixel(self.width, self.height, self.background);
        let mut rng = StdRng::seed_from_u64(self.seed);

        for placement in &placements {
            let [r, g, b] = PALETTE[rng.gen_range(0..PALETTE.len())];
            draw_text(
                &mut image,
                font,
                &placement.word,
                placement.font_size,
                placement.x,
                placement.y,
                Rgb([r, g, b]),
            );
        }
        image
    }

    /// Render cleaned texts and save the image; the format follows the extension.
    pub fn save<I, S>(&self, texts: I, font: &FontVec, path: &Path) -> Result<PathBuf, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let frequencies = word_frequencies(texts);
        let image = self.render(&frequencies, font);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image.save(path)?;
        info!(path = %path.display(), words = frequencies.len(), "saved word cloud");
        Ok(path.to_path_buf())
    }
}

/// Load the given font, or the first installed default font.
pub fn load_font(path: Option<&Path>) -> Result<FontVec, Error> {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![p.to_path_buf()],
        None => DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect(),
    };

    for candidate in &candidates {
        let Ok(bytes) = std::fs::read(candidate) else {
            continue;
        };
        return FontVec::try_from_vec(bytes)
            .map_err(|e| Error::Font(format!("{}: {}", candidate.display(), e)));
    }
    Err(Error::Font(match path {
        Some(p) => format!("{} not found", p.display()),
        None => "no default font found, pass --font".to_owned(),
    }))
}

pub fn measure_text(font: &FontVec, text: &str, size: f32) -> (u32, u32) {
    let scaled = font.as_scaled(PxScale::from(size));
    let width: f32 = text
        .chars()
        .map(|c| scaled.h_advance(scaled.glyph_id(c)))
        .sum();
    (width.ceil() as u32, scaled.height().ceil() as u32)
}

fn draw_text(
    image: &mut RgbImage,
    font: &FontVec,
    text: &str,
    size: f32,
    x: u32,
    y: u32,
    color: Rgb<u8>,
) {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut caret = point(x as f32, y as f32 + scaled.ascent());

    for c in text.chars() {
        let mut glyph = scaled.scaled_glyph(c);
        glyph.position = caret;
        caret.x += scaled.h_advance(glyph.id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i64 + gx as i64;
            let py = bounds.min.y as i64 + gy as i64;
            if px < 0 || py < 0 || px >= image.width() as i64 || py >= image.height() as i64 {
                return;
            }
            let pixel = image.get_pixel_mut(px as u32, py as u32);
            let coverage = coverage.clamp(0.0, 1.0);
            for (channel, target) in pixel.0.iter_mut().zip(color.0) {
                *channel =
                    (*channel as f32 * (1.0 - coverage) + target as f32 * coverage).round() as u8;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_width(word: &str, size: f32) -> (u32, u32) {
        ((word.len() as f32 * size * 0.6).ceil() as u32, size.ceil() as u32)
    }

    fn overlaps(a: &Placement, b: &Placement) -> bool {
        a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
    }

    #[test]
    fn counts_words_most_frequent_first() {
        let frequencies = word_frequencies(["batman joker", "joker gotham", "joker batman"]);
        assert_eq!(
            frequencies,
            vec![
                ("joker".to_owned(), 3),
                ("batman".to_owned(), 2),
                ("gotham".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn placements_stay_inside_and_do_not_overlap() {
        let cloud = WordCloud::builder().width(400).height(300).build();
        let frequencies = word_frequencies([
            "movie movie movie great great plot acting actor scene score villain hero",
            "movie great story ending cast director soundtrack",
        ]);
        let placements = cloud.layout(&frequencies, fixed_width);

        assert_eq!(placements[0].word, "movie");
        assert!(placements.len() > 5);
        for (i, a) in placements.iter().enumerate() {
            assert!(a.x + a.width <= 400 && a.y + a.height <= 300, "{:?} outside", a);
            for b in &placements[i + 1..] {
                assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn font_size_never_grows() {
        let cloud = WordCloud::default();
        let frequencies = word_frequencies(["a1 a1 a1 a1 b2 b2 c3"]);
        let placements = cloud.layout(&frequencies, fixed_width);
        let sizes: Vec<f32> = placements.iter().map(|p| p.font_size).collect();
        assert_eq!(sizes.len(), 3);
        assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn words_without_room_are_dropped() {
        let cloud = WordCloud::builder()
            .width(40)
            .height(40)
            .max_font_size(30.0)
            .min_font_size(20.0)
            .build();
        let frequencies = word_frequencies(["extraordinarily long words everywhere"]);
        assert!(cloud.layout(&frequencies, fixed_width).is_empty());
    }

    #[test]
    fn empty_input_gives_empty_layout() {
        assert!(WordCloud::default().layout(&[], fixed_width).is_empty());
    }

    #[test]
    fn missing_font_is_reported() {
        let result = load_font(Some(Path::new("/nonexistent/font.ttf")));
        assert!(matches!(result, Err(Error::Font(_))));
    }
}
