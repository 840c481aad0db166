//! Page and slide geometry in English Metric Units (EMU).

/// 1 cm = 360 000 EMU.
pub const EMU_PER_CM: f64 = 360_000.0;
/// 1 twip (1/20 pt) = 635 EMU.
pub const EMU_PER_TWIP: f64 = 635.0;

pub fn cm_to_emu(cm: f64) -> f64 {
    cm * EMU_PER_CM
}

pub fn emu_to_twips(emu: f64) -> i64 {
    (emu / EMU_PER_TWIP).round() as i64
}

pub fn round_emu(emu: f64) -> i64 {
    emu.round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

impl PageGeometry {
    /// Portrait A4 with the same margin on every side.
    pub fn a4(margin_cm: f64) -> Self {
        let margin = cm_to_emu(margin_cm.max(0.0));
        Self {
            width: cm_to_emu(21.0),
            height: cm_to_emu(29.7),
            margin_left: margin,
            margin_right: margin,
            margin_top: margin,
            margin_bottom: margin,
        }
    }

    pub fn content_width(&self) -> f64 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4(0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideGeometry {
    pub width: f64,
    pub height: f64,
}

impl SlideGeometry {
    /// 33.867 cm x 19.05 cm.
    pub fn widescreen() -> Self {
        Self {
            width: 12_192_000.0,
            height: 6_858_000.0,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

impl Default for SlideGeometry {
    fn default() -> Self {
        Self::widescreen()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Size of an image scaled to `content_width`, keeping its pixel aspect ratio.
///
/// Returns `None` for zero-sized images.
pub fn fit_to_width(content_width: f64, pixel_width: u32, pixel_height: u32) -> Option<(f64, f64)> {
    if pixel_width == 0 || pixel_height == 0 {
        return None;
    }
    let aspect = f64::from(pixel_width) / f64::from(pixel_height);
    Some((content_width, content_width / aspect))
}

/// Largest aspect-preserving rectangle inside the slide, centred on both axes.
///
/// Wider-than-slide images span the full width; all others span the full height.
pub fn fit_centered(slide: &SlideGeometry, pixel_width: u32, pixel_height: u32) -> Option<Placement> {
    if pixel_width == 0 || pixel_height == 0 {
        return None;
    }
    let aspect = f64::from(pixel_width) / f64::from(pixel_height);
    let (width, height) = if aspect > slide.aspect_ratio() {
        (slide.width, slide.width / aspect)
    } else {
        (slide.height * aspect, slide.height)
    };
    Some(Placement {
        left: (slide.width - width) / 2.0,
        top: (slide.height - height) / 2.0,
        width,
        height,
    })
}
