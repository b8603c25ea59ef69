use thiserror::Error;

use crate::atlas::{AtlasSlot, LoadedAtlas, SharedAtlas};
use crate::config::SessionConfig;
use crate::coords::{ColorRgba, NdcRect, Viewport};
use crate::device::{DeviceError, RenderDevice};
use crate::render::{QuadRenderer, RenderError, SpriteRenderer};

/// Fatal setup failure. No partial session is ever returned.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("surface unavailable ({width}x{height})")]
    SurfaceUnavailable { width: u32, height: u32 },

    #[error("atlas texture upload failed: {0}")]
    Texture(#[source] DeviceError),

    #[error("quad renderer: {0}")]
    Quad(#[source] RenderError),

    #[error("sprite renderer: {0}")]
    Sprite(#[source] RenderError),
}

/// Everything one rendering session owns: the device, both renderers, the
/// shared atlas, and the clear color.
///
/// Built once from fully loaded resources, then handed to the frame
/// scheduler and the pointer dispatcher.
pub struct Session<D: RenderDevice> {
    device: D,
    quads: QuadRenderer,
    sprites: SpriteRenderer,
    atlas: AtlasSlot,
    clear_color: ColorRgba,
}

impl<D: RenderDevice> Session<D> {
    /// Uploads the atlas and builds both shader programs.
    pub fn new(mut device: D, atlas: LoadedAtlas, config: &SessionConfig) -> Result<Self, SetupError> {
        let result = Self::setup(&mut device, &atlas);
        let (quads, sprites, slot) = result.inspect_err(|e| log::error!("session setup failed: {e}"))?;

        log::debug!(
            "session ready: {} sprites in atlas, surface {:?}",
            atlas.uv.len(),
            device.surface_size()
        );

        Ok(Self {
            device,
            quads,
            sprites,
            atlas: slot,
            clear_color: config.clear_color,
        })
    }

    fn setup(
        device: &mut D,
        atlas: &LoadedAtlas,
    ) -> Result<(QuadRenderer, SpriteRenderer, AtlasSlot), SetupError> {
        let (width, height) = device.surface_size();
        if width == 0 || height == 0 {
            return Err(SetupError::SurfaceUnavailable { width, height });
        }

        let mut slot = AtlasSlot::new();
        let shared = slot.get_or_upload(device, atlas).map_err(SetupError::Texture)?;

        let quads = QuadRenderer::new(device).map_err(SetupError::Quad)?;
        let sprites = SpriteRenderer::new(device, shared).map_err(SetupError::Sprite)?;
        Ok((quads, sprites, slot))
    }

    /// Clears the surface and the quad draw list.
    pub fn begin_frame(&mut self) {
        self.device.clear(self.clear_color);
        self.quads.clear();
    }

    pub fn draw_quad(&mut self, id: &str, rect: NdcRect, color: ColorRgba) {
        self.quads.draw_quad(&mut self.device, id, rect, color);
    }

    pub fn draw_sprite(&mut self, name: &str, rect: NdcRect) {
        self.sprites.draw_sprite(&mut self.device, name, rect);
    }

    /// Hit test against the most recently completed quad draw list.
    pub fn hit_test(&self, ndc_x: f32, ndc_y: f32) -> Option<&str> {
        self.quads.hit_test(ndc_x, ndc_y)
    }

    pub fn quads(&self) -> &QuadRenderer {
        &self.quads
    }

    pub fn sprites(&self) -> &SpriteRenderer {
        &self.sprites
    }

    pub fn atlas(&self) -> Option<&SharedAtlas> {
        self.atlas.get()
    }

    pub fn clear_color(&self) -> ColorRgba {
        self.clear_color
    }

    pub fn viewport(&self) -> Viewport {
        let (w, h) = self.device.surface_size();
        Viewport::from_physical(w, h)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasImage;
    use crate::device::{Command, HeadlessDevice};

    fn atlas() -> LoadedAtlas {
        LoadedAtlas {
            image: AtlasImage { width: 1, height: 1, rgba: vec![9; 4] },
            uv: Default::default(),
        }
    }

    #[test]
    fn begin_frame_clears_surface_and_draw_list() {
        let mut session =
            Session::new(HeadlessDevice::new(64, 64), atlas(), &SessionConfig::default()).unwrap();
        session.draw_quad("q", NdcRect::new(0.0, 0.0, 1.0, 1.0), ColorRgba::white());
        session.begin_frame();

        assert_eq!(session.hit_test(0.0, 0.0), None);
        assert_eq!(
            session.device().commands().last(),
            Some(&Command::Clear(SessionConfig::default().clear_color))
        );
    }

    #[test]
    fn zero_sized_surface_is_fatal() {
        let err = Session::new(HeadlessDevice::new(0, 600), atlas(), &SessionConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::SurfaceUnavailable { width: 0, .. }));
    }

    #[test]
    fn empty_atlas_image_is_fatal() {
        let mut bad = atlas();
        bad.image.rgba.clear();
        let err = Session::new(HeadlessDevice::new(64, 64), bad, &SessionConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::Texture(_)));
    }
}
