use std::collections::HashMap;
use std::path::PathBuf;

use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use anyhow::{Context, Result};
use log::warn;
use nback_core::{DisplayState, MessageScreen};
use tiny_skia::{
    Color, Paint, Pixmap, PixmapPaint, PremultipliedColorU8, Rect, Transform,
};

const INSTRUCTIONS_TEXT: &str = "For this game you will remember which letters were presented 0, 1, or 2 trials ago, and report when the current letters are repeats. Press the button under your index finger for repeated letters.";
const EXPERIMENTER_TEXT: &str = "Waiting for the experimenter.";
const TRIGGER_TEXT: &str = "Waiting for the scanner.";
const THANKS_TEXT: &str = "Thanks!";

/// Draws the task's screens into a pixel frame: full-screen text slides,
/// stimulus images looked up by fixture identifier, and the fixation
/// cross. Text and image rasterizations are cached after first use.
pub struct TaskRenderer {
    width: u32,
    height: u32,
    font: FontVec,
    asset_root: PathBuf,
    canvas: Pixmap,
    text_cache: HashMap<(String, u32), Pixmap>,
    /// `None` marks an identifier whose asset file could not be loaded;
    /// those fall back to rendered text (or the drawn cross).
    image_cache: HashMap<String, Option<Pixmap>>,
    fixation_cross: Pixmap,
}

impl TaskRenderer {
    pub fn new(width: u32, height: u32, font: FontVec, asset_root: PathBuf) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1)).context("allocating canvas")?;
        Ok(Self {
            width,
            height,
            font,
            asset_root,
            canvas,
            text_cache: HashMap::new(),
            image_cache: HashMap::new(),
            fixation_cross: draw_fixation_cross(40),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.canvas = Pixmap::new(width.max(1), height.max(1)).context("resizing canvas")?;
        // Cached text was sized relative to the old screen.
        self.text_cache.clear();
        Ok(())
    }

    /// Render one frame into `frame` (RGBA8, row-major, canvas-sized).
    pub fn render(&mut self, display: &DisplayState<'_>, frame: &mut [u8]) -> Result<()> {
        self.canvas.fill(Color::from_rgba8(0, 0, 0, 255));

        match display {
            DisplayState::Message(screen) => self.render_message(*screen),
            DisplayState::Stimulus(id) => self.render_stimulus(id),
            DisplayState::Fixation(id) => self.render_fixation(id),
            DisplayState::Blank => {}
        }

        let data = self.canvas.data();
        let n = data.len().min(frame.len());
        frame[..n].copy_from_slice(&data[..n]);
        Ok(())
    }

    fn render_message(&mut self, screen: MessageScreen) {
        let text = match screen {
            MessageScreen::Instructions => INSTRUCTIONS_TEXT,
            MessageScreen::ExperimenterWait => EXPERIMENTER_TEXT,
            MessageScreen::TriggerWait => TRIGGER_TEXT,
            MessageScreen::Thanks => THANKS_TEXT,
        };
        let size = (self.height as f32 * 0.045).max(16.0);
        let max_width = self.width as f32 * 0.75;
        let lines = wrap_text(&self.font, text, size, max_width);

        let line_gap = size * 1.4;
        let total_height = line_gap * lines.len() as f32;
        let mut y = (self.height as f32 - total_height) / 2.0;
        for line in lines {
            let pm = self.text_pixmap(&line, size);
            let x = (self.width as f32 - pm.width() as f32) / 2.0;
            self.blit(&pm, x, y);
            y += line_gap;
        }
    }

    fn render_stimulus(&mut self, id: &str) {
        if self.image(id).is_some() {
            self.blit_image_centered(id);
        } else {
            // No asset on disk: show the identifier stem as a letter.
            let label = stem(id).to_uppercase();
            let size = self.height as f32 * 0.25;
            let pm = self.text_pixmap(&label, size);
            let x = (self.width as f32 - pm.width() as f32) / 2.0;
            let y = (self.height as f32 - pm.height() as f32) / 2.0;
            self.blit(&pm, x, y);
        }
    }

    fn render_fixation(&mut self, id: &str) {
        if self.image(id).is_some() {
            self.blit_image_centered(id);
        } else {
            let pm = self.fixation_cross.clone();
            let x = (self.width as f32 - pm.width() as f32) / 2.0;
            let y = (self.height as f32 - pm.height() as f32) / 2.0;
            self.blit(&pm, x, y);
        }
    }

    fn blit_image_centered(&mut self, id: &str) {
        let Some(Some(pm)) = self.image_cache.get(id).cloned() else {
            return;
        };
        // Fit within 80% of the screen, never upscale.
        let scale = (self.width as f32 * 0.8 / pm.width() as f32)
            .min(self.height as f32 * 0.8 / pm.height() as f32)
            .min(1.0);
        let w = pm.width() as f32 * scale;
        let h = pm.height() as f32 * scale;
        let tx = (self.width as f32 - w) / 2.0;
        let ty = (self.height as f32 - h) / 2.0;
        self.canvas.draw_pixmap(
            0,
            0,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::from_scale(scale, scale).post_translate(tx, ty),
            None,
        );
    }

    fn blit(&mut self, pm: &Pixmap, x: f32, y: f32) {
        self.canvas.draw_pixmap(
            x.round() as i32,
            y.round() as i32,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Cached lookup of a stimulus asset. A missing or unreadable file is
    /// remembered as missing so the warning fires once.
    fn image(&mut self, id: &str) -> Option<&Pixmap> {
        if !self.image_cache.contains_key(id) {
            let path = self.asset_root.join(id);
            let loaded = match image::open(&path) {
                Ok(img) => Some(premultiply_rgba(img.into_rgba8())),
                Err(err) => {
                    warn!(
                        "stimulus asset {} not usable ({err}); falling back to drawn stimulus",
                        path.display()
                    );
                    None
                }
            };
            self.image_cache.insert(id.to_string(), loaded.flatten());
        }
        self.image_cache.get(id).and_then(|v| v.as_ref())
    }

    fn text_pixmap(&mut self, text: &str, size: f32) -> Pixmap {
        let key = (text.to_string(), (size * 10.0) as u32);
        if let Some(pm) = self.text_cache.get(&key) {
            return pm.clone();
        }
        let pm = render_text_pixmap(&self.font, text, size);
        self.text_cache.insert(key, pm.clone());
        pm
    }
}

fn stem(id: &str) -> &str {
    let name = id.rsplit(['/', '\\']).next().unwrap_or(id);
    name.split('.').next().unwrap_or(name)
}

/// Greedy word wrap against measured advance widths.
fn wrap_text(font: &FontVec, text: &str, size: f32, max_width: f32) -> Vec<String> {
    let sf = font.as_scaled(PxScale::from(size));
    let measure = |s: &str| -> f32 {
        s.chars()
            .map(|c| sf.h_advance(font.glyph_id(c)))
            .sum::<f32>()
    };

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) > max_width && !current.is_empty() {
            lines.push(current);
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Rasterize one line of white text into a tight transparent pixmap.
pub fn render_text_pixmap(font: &FontVec, text: &str, font_size: f32) -> Pixmap {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Lay out with the baseline at the ascent.
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    // Union of the outlined pixel bounds.
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }
    }
    if min_x == f32::INFINITY {
        return Pixmap::new(1, 1).expect("pixmap");
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h).expect("pixmap");

    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            out.draw(|x, y, cov| {
                if cov <= f32::EPSILON {
                    return;
                }
                let ix = (x as f32 + b.min.x - min_x).floor() as i32;
                let iy = (y as f32 + b.min.y - min_y).floor() as i32;
                if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                    return;
                }
                let i = iy as usize * stride + ix as usize;

                // White text: premultiplied value equals coverage on every
                // channel. Overlapping glyph edges keep the denser pixel.
                let v = (cov.clamp(0.0, 1.0) * 255.0) as u8;
                if v > dst[i].alpha() {
                    if let Some(px) = PremultipliedColorU8::from_rgba(v, v, v, v) {
                        dst[i] = px;
                    }
                }
            });
        }
    }

    pm
}

fn draw_fixation_cross(size: u32) -> Pixmap {
    let mut pm = Pixmap::new(size, size).expect("pixmap");
    let mut paint = Paint::default();
    paint.anti_alias = false;
    paint.set_color(Color::from_rgba8(255, 255, 255, 255));

    if let Some(h) = Rect::from_xywh(0.0, (size as f32 - 2.0) * 0.5, size as f32, 2.0) {
        pm.fill_rect(h, &paint, Transform::identity(), None);
    }
    if let Some(v) = Rect::from_xywh((size as f32 - 2.0) * 0.5, 0.0, 2.0, size as f32) {
        pm.fill_rect(v, &paint, Transform::identity(), None);
    }
    pm
}

fn premultiply_rgba(img: image::RgbaImage) -> Option<Pixmap> {
    let (w, h) = img.dimensions();
    let mut pm = Pixmap::new(w, h)?;
    let dst = pm.pixels_mut();
    for (i, px) in img.pixels().enumerate() {
        let [r, g, b, a] = px.0;
        let mul = |c: u8| -> u8 { ((u16::from(c) * u16::from(a)) / 255) as u8 };
        dst[i] = PremultipliedColorU8::from_rgba(mul(r), mul(g), mul(b), a)?;
    }
    Some(pm)
}
