//! Freehand signature capture.
//!
//! A [`SignaturePad`] is a small `idle -> drawing -> idle` state machine over an
//! RGBA raster. Mouse and touch input are both reduced to [`Point`]s in surface
//! coordinates before they reach the pad, so `begin`/`extend`/`end` behave the
//! same for every input device.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Stroke width in pixels. Segments are drawn with round caps.
pub const STROKE_WIDTH: f32 = 2.0;

/// Width used until the host reports its container size.
pub const DEFAULT_SURFACE_WIDTH: u32 = 500;

/// Largest surface side accepted from a host.
pub const MAX_SURFACE_SIDE: u32 = 1024;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert viewport (client) coordinates into surface coordinates given
    /// the surface's top-left corner in the same viewport.
    ///
    /// For touch input pass the first touch point.
    pub fn from_client(client: Point, surface_origin: Point) -> Self {
        Self {
            x: client.x - surface_origin.x,
            y: client.y - surface_origin.y,
        }
    }

    fn distance(self, other: Point) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Device-independent pointer input, already in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Leave,
}

// ---------------------------------------------------------------------------
// Surface configuration
// ---------------------------------------------------------------------------

/// Initial size and ink colour of a form's signature box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureSurface {
    pub width: u32,
    pub height: u32,
    pub ink: [u8; 4],
}

impl SignatureSurface {
    pub const fn new(height: u32, ink: [u8; 4]) -> Self {
        Self {
            width: DEFAULT_SURFACE_WIDTH,
            height,
            ink,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PadState {
    Idle,
    Drawing { last: Point },
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureView {
    pub width: u32,
    pub height: u32,
    pub has_ink: bool,
    pub drawing: bool,
}

// ---------------------------------------------------------------------------
// Pad
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SignaturePad {
    surface: RgbaImage,
    ink: Rgba<u8>,
    state: PadState,
    has_ink: bool,
}

impl SignaturePad {
    pub fn new(config: SignatureSurface) -> Self {
        Self {
            surface: RgbaImage::new(clamp_side(config.width), clamp_side(config.height)),
            ink: Rgba(config.ink),
            state: PadState::Idle,
            has_ink: false,
        }
    }

    pub fn has_ink(&self) -> bool {
        self.has_ink
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, PadState::Drawing { .. })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    /// Start a stroke. Nothing is drawn until the pointer moves.
    ///
    /// Non-finite points are dropped.
    pub fn begin(&mut self, point: Point) {
        if !point.is_finite() {
            return;
        }
        self.state = PadState::Drawing { last: point };
    }

    /// Continue the current stroke. Stray moves while idle are ignored, as
    /// are non-finite points.
    pub fn extend(&mut self, point: Point) {
        let PadState::Drawing { last } = self.state else {
            return;
        };
        if !point.is_finite() {
            return;
        }
        self.draw_segment(last, point);
        self.state = PadState::Drawing { last: point };
        self.has_ink = true;
    }

    pub fn end(&mut self) {
        self.state = PadState::Idle;
    }

    /// Erase everything.
    pub fn clear(&mut self) {
        let (w, h) = self.surface.dimensions();
        self.surface = RgbaImage::new(w, h);
        self.state = PadState::Idle;
        self.has_ink = false;
    }

    /// Route a pointer event to `begin`/`extend`/`end`.
    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(p) => self.begin(p),
            PointerEvent::Move(p) => self.extend(p),
            PointerEvent::Up | PointerEvent::Leave => self.end(),
        }
    }

    /// Re-size the surface to its container. Resizing always wipes the
    /// surface; returns `true` if ink was lost so the host can re-prompt.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let lost = self.has_ink;
        self.surface = RgbaImage::new(clamp_side(width), clamp_side(height));
        self.state = PadState::Idle;
        self.has_ink = false;
        if lost {
            tracing::debug!(width, height, "Signature cleared by resize");
        }
        lost
    }

    /// PNG encoding of the current surface.
    ///
    /// An export of an inkless pad is a blank image, not a signature; check
    /// [`has_ink`](Self::has_ink) first.
    pub fn export(&self) -> Result<Vec<u8>, CoreError> {
        let mut bytes = Cursor::new(Vec::new());
        self.surface
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(|e| CoreError::Internal(format!("Failed to encode signature: {e}")))?;
        Ok(bytes.into_inner())
    }

    /// `data:image/png;base64,...` form of [`export`](Self::export).
    pub fn to_data_url(&self) -> Result<String, CoreError> {
        let png = self.export()?;
        Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(png)))
    }

    pub fn view(&self) -> SignatureView {
        let (width, height) = self.surface.dimensions();
        SignatureView {
            width,
            height,
            has_ink: self.has_ink,
            drawing: self.is_drawing(),
        }
    }

    fn draw_segment(&mut self, from: Point, to: Point) {
        let (w, h) = self.surface.dimensions();
        let Some((from, to)) = clip_segment(from, to, w as f32, h as f32, STROKE_WIDTH / 2.0)
        else {
            return;
        };
        // Stamping discs every half pixel gives a continuous line with round caps.
        let steps = (from.distance(to) / 0.5).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = from.x + (to.x - from.x) * t;
            let y = from.y + (to.y - from.y) * t;
            self.stamp(x, y);
        }
    }

    fn stamp(&mut self, cx: f32, cy: f32) {
        let r = STROKE_WIDTH / 2.0;
        let (w, h) = self.surface.dimensions();
        let (w, h) = (i64::from(w), i64::from(h));

        let min_x = (cx - r).floor() as i64;
        let max_x = (cx + r).ceil() as i64;
        let min_y = (cy - r).floor() as i64;
        let max_y = (cy + r).ceil() as i64;

        for y in min_y.max(0)..=max_y.min(h - 1) {
            for x in min_x.max(0)..=max_x.min(w - 1) {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.surface.put_pixel(x as u32, y as u32, self.ink);
                }
            }
        }
    }
}

fn clamp_side(side: u32) -> u32 {
    side.clamp(1, MAX_SURFACE_SIDE)
}

/// Liang-Barsky clip of `from -> to` to the rectangle `[-margin, width +
/// margin] x [-margin, height + margin]`. `None` when nothing of the segment
/// is inside.
fn clip_segment(
    from: Point,
    to: Point,
    width: f32,
    height: f32,
    margin: f32,
) -> Option<(Point, Point)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut t0: f32 = 0.0;
    let mut t1: f32 = 1.0;

    for (p, q) in [
        (-dx, from.x + margin),
        (dx, width + margin - from.x),
        (-dy, from.y + margin),
        (dy, height + margin - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    if t0 > t1 {
        return None;
    }

    let at = |t: f32| Point::new(from.x + dx * t, from.y + dy * t);
    let (a, b) = (at(t0), at(t1));
    (a.is_finite() && b.is_finite()).then_some((a, b))
}
