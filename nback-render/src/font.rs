use std::fs;
use std::path::Path;

use ab_glyph::FontVec;
use anyhow::{bail, Context, Result};
use log::debug;

const FALLBACK_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load the UI font: an explicit path wins, then `NBACK_FONT`, then a short
/// list of common system locations.
pub fn load_font(explicit: Option<&Path>) -> Result<FontVec> {
    if let Some(path) = explicit {
        return load_from(path);
    }
    if let Ok(env_path) = std::env::var("NBACK_FONT") {
        return load_from(Path::new(&env_path));
    }
    for candidate in FALLBACK_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            return load_from(path);
        }
    }
    bail!("no usable font found; pass --font or set NBACK_FONT");
}

fn load_from(path: &Path) -> Result<FontVec> {
    debug!("loading font from {}", path.display());
    let bytes = fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}
