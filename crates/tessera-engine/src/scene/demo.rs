use crate::coords::{ColorRgba, NdcRect};
use crate::core::{FrameScene, Session};
use crate::device::RenderDevice;

/// Quads drawn each frame, in hit-test precedence order.
pub const DEMO_QUADS: [(&str, NdcRect, ColorRgba); 2] = [
    ("red", NdcRect::new(-0.75, -0.75, 0.4, 0.4), ColorRgba::new(1.0, 0.0, 0.0, 1.0)),
    ("green", NdcRect::new(0.2, 0.2, 0.5, 0.3), ColorRgba::new(0.0, 1.0, 0.0, 1.0)),
];

/// Sprites drawn after the quads.
pub const DEMO_SPRITES: [(&str, NdcRect); 3] = [
    ("sprite_0", NdcRect::new(-0.5, -0.5, 0.4, 0.4)),
    ("sprite_3", NdcRect::new(0.3, 0.3, 0.4, 0.4)),
    ("sprite_7", NdcRect::new(0.0, 0.0, 0.4, 0.4)),
];

/// Hardcoded demo sequence: two quads, then three atlas sprites.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoScene;

impl FrameScene for DemoScene {
    fn draw<D: RenderDevice>(&mut self, session: &mut Session<D>) {
        for (id, rect, color) in DEMO_QUADS {
            session.draw_quad(id, rect, color);
        }
        for (name, rect) in DEMO_SPRITES {
            session.draw_sprite(name, rect);
        }
    }
}
