//! Pure rasterizer for the watch-phase frames.
//!
//! Each frame is a fixed-size square RGB24 image: a diagonal gradient
//! background with the four pads laid out in a 2x2 grid of rounded squares.
//! The lit pad uses its bright variant and gets a soft white outer glow;
//! when it is not the viewer's turn the pads are dimmed. Pad coverage is a
//! signed-distance test against the rounded rectangle, so the output is a
//! deterministic function of (descriptor, player_turn, size).

use crate::render::frames::FrameDescriptor;
use crate::state::session::Pad;

/// Bytes per pixel of the produced frames (tightly packed RGB).
pub const CHANNELS: usize = 3;

/// Brightness factor applied to pads while the sequence is replayed and the
/// viewer is not allowed to answer yet.
const IDLE_BRIGHTNESS: f32 = 0.6;
/// Peak opacity of the glow around the lit pad.
const GLOW_ALPHA: f32 = 0.7;

/// Background gradient endpoints (top-left, bottom-right).
const BACKGROUND_TOP: [f32; 3] = rgb(0x1f, 0x29, 0x37);
const BACKGROUND_BOTTOM: [f32; 3] = rgb(0x11, 0x18, 0x27);

const fn rgb(r: u8, g: u8, b: u8) -> [f32; 3] {
    [r as f32, g as f32, b as f32]
}

/// Idle and lit fill colors for one pad.
struct PadColors {
    normal: [f32; 3],
    lit: [f32; 3],
}

fn pad_colors(pad: Pad) -> PadColors {
    match pad {
        Pad::Green => PadColors {
            normal: rgb(0x22, 0xc5, 0x5e),
            lit: rgb(0x4a, 0xde, 0x80),
        },
        Pad::Red => PadColors {
            normal: rgb(0xef, 0x44, 0x44),
            lit: rgb(0xf8, 0x71, 0x71),
        },
        Pad::Yellow => PadColors {
            normal: rgb(0xfa, 0xcc, 0x15),
            lit: rgb(0xfd, 0xe0, 0x47),
        },
        Pad::Blue => PadColors {
            normal: rgb(0x3b, 0x82, 0xf6),
            lit: rgb(0x60, 0xa5, 0xfa),
        },
    }
}

/// Grid position of a pad: (column, row) in the 2x2 layout.
fn pad_cell(pad: Pad) -> (f32, f32) {
    match pad {
        Pad::Green => (0.0, 0.0),
        Pad::Red => (1.0, 0.0),
        Pad::Yellow => (0.0, 1.0),
        Pad::Blue => (1.0, 1.0),
    }
}

/// Geometry of the 2x2 pad grid for a given canvas edge.
struct PadLayout {
    pad_size: f32,
    step: f32,
    padding: f32,
    radius: f32,
    glow_width: f32,
}

impl PadLayout {
    fn for_size(size: u32) -> Self {
        let canvas = size as f32;
        let padding = canvas * 0.08;
        let base = canvas - padding * 2.0;
        let gap = base * 0.05;
        let pad_size = (base - gap) / 2.0;
        Self {
            pad_size,
            step: pad_size + gap,
            padding,
            radius: pad_size * 0.15,
            glow_width: pad_size * 0.2,
        }
    }

    /// Center of the given pad's rounded square.
    fn center(&self, pad: Pad) -> (f32, f32) {
        let (col, row) = pad_cell(pad);
        (
            self.padding + col * self.step + self.pad_size / 2.0,
            self.padding + row * self.step + self.pad_size / 2.0,
        )
    }
}

/// Signed distance from a point to a rounded square centered at
/// `(cx, cy)` with the given half-extent and corner radius. Negative inside.
fn rounded_square_distance(px: f32, py: f32, cx: f32, cy: f32, half: f32, radius: f32) -> f32 {
    let qx = (px - cx).abs() - (half - radius);
    let qy = (py - cy).abs() - (half - radius);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - radius
}

fn lerp(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn scale(color: [f32; 3], factor: f32) -> [f32; 3] {
    [color[0] * factor, color[1] * factor, color[2] * factor]
}

/// Rasterize one frame descriptor into a `size * size` RGB24 buffer.
pub fn render_frame(descriptor: &FrameDescriptor, player_turn: bool, size: u32) -> Vec<u8> {
    let layout = PadLayout::for_size(size);
    let half = layout.pad_size / 2.0;
    let brightness = if player_turn { 1.0 } else { IDLE_BRIGHTNESS };
    let glow = scale([255.0, 255.0, 255.0], brightness);

    let mut buffer = Vec::with_capacity(size as usize * size as usize * CHANNELS);

    for y in 0..size {
        for x in 0..size {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            let t = (px + py) / (2.0 * size as f32);
            let mut color = lerp(BACKGROUND_TOP, BACKGROUND_BOTTOM, t);

            for pad in Pad::ALL {
                let (cx, cy) = layout.center(pad);
                let distance = rounded_square_distance(px, py, cx, cy, half, layout.radius);
                let is_lit = descriptor.lit == Some(pad);

                if distance <= 0.0 {
                    let colors = pad_colors(pad);
                    let fill = if is_lit { colors.lit } else { colors.normal };
                    color = scale(fill, brightness);
                    break;
                }

                if is_lit && distance < layout.glow_width {
                    let alpha = GLOW_ALPHA * (1.0 - distance / layout.glow_width);
                    color = lerp(color, glow, alpha);
                }
            }

            buffer.push(color[0].round().clamp(0.0, 255.0) as u8);
            buffer.push(color[1].round().clamp(0.0, 255.0) as u8);
            buffer.push(color[2].round().clamp(0.0, 255.0) as u8);
        }
    }

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: u32 = 200;

    fn pixel(buffer: &[u8], x: u32, y: u32) -> [u8; 3] {
        let offset = (y as usize * SIZE as usize + x as usize) * CHANNELS;
        [buffer[offset], buffer[offset + 1], buffer[offset + 2]]
    }

    fn center_of(pad: Pad) -> (u32, u32) {
        let layout = PadLayout::for_size(SIZE);
        let (cx, cy) = layout.center(pad);
        (cx as u32, cy as u32)
    }

    #[test]
    fn buffer_is_tightly_packed_rgb() {
        let frame = render_frame(&FrameDescriptor { lit: None }, true, SIZE);
        assert_eq!(frame.len(), SIZE as usize * SIZE as usize * CHANNELS);
    }

    #[test]
    fn corner_pixel_shows_the_background_gradient() {
        let frame = render_frame(&FrameDescriptor { lit: None }, true, SIZE);
        let corner = pixel(&frame, 0, 0);
        // Near the top-left gradient endpoint, far from any pad.
        assert!(corner[2] > corner[0]);
        assert_eq!(corner, [0x1f, 0x29, 0x37]);
    }

    #[test]
    fn lit_pad_uses_its_bright_variant() {
        let (cx, cy) = center_of(Pad::Green);
        let idle = render_frame(&FrameDescriptor { lit: None }, true, SIZE);
        let lit = render_frame(&FrameDescriptor { lit: Some(Pad::Green) }, true, SIZE);

        assert_eq!(pixel(&idle, cx, cy), [0x22, 0xc5, 0x5e]);
        assert_eq!(pixel(&lit, cx, cy), [0x4a, 0xde, 0x80]);
    }

    #[test]
    fn pads_are_dimmed_when_it_is_not_the_players_turn() {
        let (cx, cy) = center_of(Pad::Red);
        let bright = render_frame(&FrameDescriptor { lit: None }, true, SIZE);
        let dimmed = render_frame(&FrameDescriptor { lit: None }, false, SIZE);

        let bright_pixel = pixel(&bright, cx, cy);
        let dimmed_pixel = pixel(&dimmed, cx, cy);
        for channel in 0..CHANNELS {
            let expected = (f32::from(bright_pixel[channel]) * IDLE_BRIGHTNESS).round() as u8;
            assert!(dimmed_pixel[channel].abs_diff(expected) <= 1);
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let descriptor = FrameDescriptor { lit: Some(Pad::Blue) };
        let first = render_frame(&descriptor, true, SIZE);
        let second = render_frame(&descriptor, true, SIZE);
        assert_eq!(first, second);
    }
}
