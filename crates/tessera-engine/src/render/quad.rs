use crate::coords::{ColorRgba, NdcRect, Vec2};
use crate::device::{RenderDevice, UniformValue, VertexArrayId, VertexAttrib};
use crate::scene::DrawList;
use crate::shader::{ProgramSource, ShaderProgram};

use super::RenderError;

/// Unit quad as a triangle strip, `-0.5..0.5` on both axes.
pub const UNIT_STRIP: [f32; 8] = [-0.5, -0.5, 0.5, -0.5, -0.5, 0.5, 0.5, 0.5];

const SOURCE: ProgramSource<'static> = ProgramSource {
    label: "quad",
    vertex: include_str!("shaders/quad.vert.wgsl"),
    fragment: include_str!("shaders/quad.frag.wgsl"),
    uniforms: &["u_pos", "u_size", "u_color"],
    attributes: &["a_pos"],
};

/// Flat-colored rectangles, plus hit testing over what was drawn.
///
/// Every `draw_quad` is recorded in the draw list regardless of visibility
/// or overlap; `hit_test` answers against that list.
pub struct QuadRenderer {
    program: ShaderProgram,
    vertex_array: VertexArrayId,
    draw_list: DrawList,
}

impl QuadRenderer {
    pub fn new<D: RenderDevice + ?Sized>(device: &mut D) -> Result<Self, RenderError> {
        let program = ShaderProgram::compile_and_link(device, &SOURCE)?;

        let attribs: Vec<VertexAttrib> = program
            .attribute("a_pos")
            .map(|location| VertexAttrib {
                location,
                components: 2,
                offset: 0,
            })
            .into_iter()
            .collect();
        let vertex_array = device.create_vertex_array(program.id(), &UNIT_STRIP, 8, &attribs)?;

        Ok(Self {
            program,
            vertex_array,
            draw_list: DrawList::new(),
        })
    }

    /// Empties the draw list. Call before the first `draw_quad` of a frame.
    pub fn clear(&mut self) {
        self.draw_list.clear();
    }

    /// Draws one rectangle. The vertex stage places the unit quad at
    /// `unit * size + center`; color is a single uniform.
    pub fn draw_quad<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        id: &str,
        rect: NdcRect,
        color: ColorRgba,
    ) {
        self.program.bind(device);

        if let Some(loc) = self.program.uniform("u_pos") {
            device.set_uniform(loc, UniformValue::Vec2(rect.center.to_array()));
        }
        if let Some(loc) = self.program.uniform("u_size") {
            device.set_uniform(loc, UniformValue::Vec2(rect.size.to_array()));
        }
        if let Some(loc) = self.program.uniform("u_color") {
            device.set_uniform(loc, UniformValue::Vec4(color.to_array()));
        }

        device.bind_vertex_array(Some(self.vertex_array));
        device.draw_triangle_strip(0, 4);
        device.bind_vertex_array(None);
        self.program.unbind(device);

        self.draw_list.push(id, rect);
    }

    /// Id of the first quad, in draw order, whose closed bounds contain the
    /// point. Overlaps resolve to the earlier draw.
    pub fn hit_test(&self, ndc_x: f32, ndc_y: f32) -> Option<&str> {
        self.draw_list
            .first_containing(Vec2::new(ndc_x, ndc_y))
            .map(|q| q.id.as_str())
    }

    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}
