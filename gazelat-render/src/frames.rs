//! The four canonical stimulus frames.
//!
//! Frames are rendered once, before the first trial, and only ever copied to
//! the display afterwards. The photodiode side of the rig watches the two
//! left-hand corners: the top-left box carries the flicker, the bottom-left
//! box marks the triggered stimulus.

use gazelat_core::{DisplayError, Stimulus};
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

/// Video-range black and white.
pub const BACKGROUND_LUMA: u8 = 16;
pub const BOX_LUMA: u8 = 235;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub box_size: u32,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            box_size: 100,
        }
    }
}

impl FrameLayout {
    fn top_left(&self) -> Option<Rect> {
        let side = self.box_side();
        Rect::from_xywh(0.0, 0.0, side, side)
    }

    fn bottom_left(&self) -> Option<Rect> {
        let side = self.box_side();
        Rect::from_xywh(0.0, self.height as f32 - side, side, side)
    }

    /// Box side clamped so both corner boxes fit on screen.
    fn box_side(&self) -> f32 {
        self.box_size.min(self.width).min(self.height) as f32
    }
}

pub struct StimulusFrames {
    layout: FrameLayout,
    frames: [Pixmap; 4],
}

impl StimulusFrames {
    pub fn build(layout: FrameLayout) -> Result<Self, DisplayError> {
        let render = |stimulus| render_frame(&layout, stimulus);
        Ok(Self {
            layout,
            frames: [
                render(Stimulus::IdleWhite)?,
                render(Stimulus::IdleBlack)?,
                render(Stimulus::TriggeredWhite)?,
                render(Stimulus::TriggeredBlack)?,
            ],
        })
    }

    pub fn get(&self, stimulus: Stimulus) -> &Pixmap {
        &self.frames[stimulus.index()]
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Copies one frame into an RGBA8 framebuffer of the same size.
    pub fn blit(&self, stimulus: Stimulus, target: &mut [u8]) -> Result<(), DisplayError> {
        let src = self.get(stimulus).data();
        if target.len() != src.len() {
            return Err(DisplayError(format!(
                "framebuffer holds {} bytes, frame needs {}",
                target.len(),
                src.len()
            )));
        }
        target.copy_from_slice(src);
        Ok(())
    }
}

fn render_frame(layout: &FrameLayout, stimulus: Stimulus) -> Result<Pixmap, DisplayError> {
    let mut pixmap = Pixmap::new(layout.width, layout.height).ok_or_else(|| {
        DisplayError(format!(
            "cannot allocate a {}x{} frame",
            layout.width, layout.height
        ))
    })?;
    pixmap.fill(grey(BACKGROUND_LUMA));

    let boxes = match stimulus {
        Stimulus::IdleWhite => vec![layout.top_left()],
        Stimulus::IdleBlack => vec![],
        Stimulus::TriggeredWhite => vec![layout.top_left(), layout.bottom_left()],
        Stimulus::TriggeredBlack => vec![layout.bottom_left()],
    };

    let mut paint = Paint::default();
    paint.set_color(grey(BOX_LUMA));
    paint.anti_alias = false;
    for rect in boxes.into_iter().flatten() {
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }
    Ok(pixmap)
}

fn grey(luma: u8) -> Color {
    Color::from_rgba8(luma, luma, luma, 255)
}
