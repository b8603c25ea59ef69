use std::rc::Rc;

use crate::device::{DeviceError, RenderDevice, TextureId};

use super::{AtlasUvMap, LoadedAtlas, UvRect};

/// Atlas uploaded to a device, together with its UV mapping.
///
/// Write-once: created before the frame loop, then only read by sprite
/// renderers through [`SharedAtlas`].
#[derive(Debug)]
pub struct AtlasTexture {
    texture: TextureId,
    width: u32,
    height: u32,
    uv: AtlasUvMap,
}

/// Non-owning handle sprite renderers hold on the atlas.
pub type SharedAtlas = Rc<AtlasTexture>;

impl AtlasTexture {
    pub fn upload<D: RenderDevice + ?Sized>(
        device: &mut D,
        atlas: &LoadedAtlas,
    ) -> Result<SharedAtlas, DeviceError> {
        let image = &atlas.image;
        let texture = device.create_texture_rgba8(image.width, image.height, &image.rgba)?;
        log::debug!("atlas texture uploaded ({}x{})", image.width, image.height);
        Ok(Rc::new(Self {
            texture,
            width: image.width,
            height: image.height,
            uv: atlas.uv.clone(),
        }))
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn uv(&self, name: &str) -> Option<UvRect> {
        self.uv.get(name)
    }

    pub fn uv_map(&self) -> &AtlasUvMap {
        &self.uv
    }
}

/// Holds the shared atlas and uploads it at most once per valid texture.
#[derive(Debug, Default)]
pub struct AtlasSlot {
    shared: Option<SharedAtlas>,
}

impl AtlasSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared atlas, uploading only when there is none yet or the
    /// device no longer recognizes the texture.
    pub fn get_or_upload<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        atlas: &LoadedAtlas,
    ) -> Result<SharedAtlas, DeviceError> {
        if let Some(shared) = &self.shared {
            if device.is_texture(shared.texture) {
                return Ok(Rc::clone(shared));
            }
            log::debug!("atlas texture no longer valid; uploading again");
        }
        let shared = AtlasTexture::upload(device, atlas)?;
        self.shared = Some(Rc::clone(&shared));
        Ok(shared)
    }

    pub fn get(&self) -> Option<&SharedAtlas> {
        self.shared.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasImage;
    use crate::device::HeadlessDevice;

    fn loaded() -> LoadedAtlas {
        LoadedAtlas {
            image: AtlasImage {
                width: 2,
                height: 2,
                rgba: vec![255; 16],
            },
            uv: [("s".to_owned(), UvRect::new(0.0, 0.0, 0.5, 0.5))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn second_request_reuses_valid_texture() {
        let mut device = HeadlessDevice::new(10, 10);
        let mut slot = AtlasSlot::new();
        let atlas = loaded();

        let a = slot.get_or_upload(&mut device, &atlas).unwrap();
        let b = slot.get_or_upload(&mut device, &atlas).unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(device.live_textures(), 1);
        assert_eq!(a.uv("s"), Some(UvRect::new(0.0, 0.0, 0.5, 0.5)));
    }

    #[test]
    fn invalidated_texture_is_uploaded_again() {
        let mut device = HeadlessDevice::new(10, 10);
        let mut slot = AtlasSlot::new();
        let atlas = loaded();

        let a = slot.get_or_upload(&mut device, &atlas).unwrap();
        device.delete_texture(a.texture());
        let b = slot.get_or_upload(&mut device, &atlas).unwrap();

        assert_ne!(a.texture(), b.texture());
        assert!(device.is_texture(b.texture()));
    }
}
