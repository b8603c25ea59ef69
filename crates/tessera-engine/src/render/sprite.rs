use crate::atlas::SharedAtlas;
use crate::coords::NdcRect;
use crate::device::{RenderDevice, UniformValue, VertexArrayId, VertexAttrib};
use crate::shader::{ProgramSource, ShaderProgram};

use super::RenderError;

/// Unit strip with texture coordinates: `(x, y, u, v)` per vertex.
pub const UNIT_STRIP_UV: [f32; 16] = [
    -0.5, -0.5, 0.0, 0.0, //
    0.5, -0.5, 1.0, 0.0, //
    -0.5, 0.5, 0.0, 1.0, //
    0.5, 0.5, 1.0, 1.0,
];

const STRIDE: u32 = 16;
const UV_OFFSET: u32 = 8;
const TEXTURE_UNIT: u32 = 0;

const SOURCE: ProgramSource<'static> = ProgramSource {
    label: "sprite",
    vertex: include_str!("shaders/sprite.vert.wgsl"),
    fragment: include_str!("shaders/sprite.frag.wgsl"),
    uniforms: &["u_pos", "u_size", "u_uv", "u_tex"],
    attributes: &["a_pos", "a_uv"],
};

/// Textured rectangles cut from the shared atlas by name.
///
/// Sprites are decoration: they are not recorded anywhere and never take
/// part in hit testing.
pub struct SpriteRenderer {
    program: ShaderProgram,
    vertex_array: VertexArrayId,
    atlas: SharedAtlas,
}

impl SpriteRenderer {
    /// Fails with [`RenderError::MissingTexture`] unless the atlas texture is
    /// live on `device`.
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        atlas: SharedAtlas,
    ) -> Result<Self, RenderError> {
        if !device.is_texture(atlas.texture()) {
            return Err(RenderError::MissingTexture);
        }

        let program = ShaderProgram::compile_and_link(device, &SOURCE)?;

        let mut attribs = Vec::with_capacity(2);
        if let Some(location) = program.attribute("a_pos") {
            attribs.push(VertexAttrib { location, components: 2, offset: 0 });
        }
        if let Some(location) = program.attribute("a_uv") {
            attribs.push(VertexAttrib { location, components: 2, offset: UV_OFFSET });
        }
        let vertex_array =
            device.create_vertex_array(program.id(), &UNIT_STRIP_UV, STRIDE, &attribs)?;

        Ok(Self {
            program,
            vertex_array,
            atlas,
        })
    }

    /// Draws the sprite `name` over `rect`.
    ///
    /// An unknown name is skipped with a warning and touches no device state.
    pub fn draw_sprite<D: RenderDevice + ?Sized>(&mut self, device: &mut D, name: &str, rect: NdcRect) {
        let Some(uv) = self.atlas.uv(name) else {
            log::warn!("UV for sprite '{name}' not found");
            return;
        };

        self.program.bind(device);
        device.bind_texture(TEXTURE_UNIT, Some(self.atlas.texture()));

        if let Some(loc) = self.program.uniform("u_tex") {
            device.set_uniform(loc, UniformValue::Sampler(TEXTURE_UNIT));
        }
        if let Some(loc) = self.program.uniform("u_pos") {
            device.set_uniform(loc, UniformValue::Vec2(rect.center.to_array()));
        }
        if let Some(loc) = self.program.uniform("u_size") {
            device.set_uniform(loc, UniformValue::Vec2(rect.size.to_array()));
        }
        if let Some(loc) = self.program.uniform("u_uv") {
            device.set_uniform(loc, UniformValue::Vec4(uv.to_array()));
        }

        device.bind_vertex_array(Some(self.vertex_array));
        device.draw_triangle_strip(0, 4);
        device.bind_vertex_array(None);
        self.program.unbind(device);
    }

    pub fn atlas(&self) -> &SharedAtlas {
        &self.atlas
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasImage, AtlasTexture, LoadedAtlas, UvRect};
    use crate::device::HeadlessDevice;
    use crate::logging::capture;

    fn setup() -> (HeadlessDevice, SpriteRenderer) {
        let mut device = HeadlessDevice::new(800, 600);
        let loaded = LoadedAtlas {
            image: AtlasImage { width: 1, height: 1, rgba: vec![0, 0, 0, 255] },
            uv: [("sprite_0".to_owned(), UvRect::new(0.0, 0.25, 0.5, 0.75))]
                .into_iter()
                .collect(),
        };
        let atlas = AtlasTexture::upload(&mut device, &loaded).unwrap();
        let sprites = SpriteRenderer::new(&mut device, atlas).unwrap();
        (device, sprites)
    }

    #[test]
    fn draws_with_atlas_texture_and_uv_rect() {
        let (mut device, mut sprites) = setup();
        sprites.draw_sprite(&mut device, "sprite_0", NdcRect::new(-0.5, -0.5, 0.4, 0.4));

        let draw = device.draws().next().unwrap();
        assert_eq!(draw.texture, Some(sprites.atlas().texture()));
        assert_eq!(draw.uniform("u_uv"), Some(UniformValue::Vec4([0.0, 0.25, 0.5, 0.75])));
        assert_eq!(draw.uniform("u_pos"), Some(UniformValue::Vec2([-0.5, -0.5])));
        assert_eq!(draw.uniform("u_size"), Some(UniformValue::Vec2([0.4, 0.4])));
        assert_eq!(draw.uniform("u_tex"), Some(UniformValue::Sampler(0)));
        assert_eq!(device.current_program(), None);
    }

    #[test]
    fn interleaved_vertices_are_uploaded() {
        let (device, sprites) = setup();
        let (vertices, stride) = device.vertex_data(sprites.vertex_array).unwrap();
        assert_eq!(vertices, &UNIT_STRIP_UV);
        assert_eq!(stride, 16);
    }

    #[test]
    fn unknown_sprite_makes_no_device_calls() {
        let (mut device, mut sprites) = setup();
        capture::start();
        sprites.draw_sprite(&mut device, "nope", NdcRect::new(0.0, 0.0, 0.4, 0.4));

        assert!(device.commands().is_empty());
        assert_eq!(device.current_program(), None);
        assert_eq!(
            capture::take(),
            vec![(log::Level::Warn, "UV for sprite 'nope' not found".to_owned())]
        );
    }

    #[test]
    fn deleted_texture_is_rejected_at_construction() {
        let mut device = HeadlessDevice::new(800, 600);
        let loaded = LoadedAtlas {
            image: AtlasImage { width: 1, height: 1, rgba: vec![0; 4] },
            uv: Default::default(),
        };
        let atlas = AtlasTexture::upload(&mut device, &loaded).unwrap();
        device.delete_texture(atlas.texture());

        let err = SpriteRenderer::new(&mut device, atlas).err().unwrap();
        assert!(matches!(err, RenderError::MissingTexture));
        assert_eq!(device.live_programs(), 0);
    }
}
