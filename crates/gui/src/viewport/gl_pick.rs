//! GPU pick target: a float RGBA framebuffer with a depth renderbuffer.
//!
//! Every fragment writes its world position to RGB and the element tag to A,
//! so the single pixel under the pointer says both where and what was hit.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;
use glow::HasContext;
use shared::ObjectId;

use super::hit_test::{DrawState, PickBackend, PickLayer, PickTag};
use crate::error::PickError;
use crate::scene::Solid;

/// Floats per pick vertex: position(3) + tag(1)
const PICK_STRIDE: usize = 4;

struct PickBuffers {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: Option<glow::Buffer>,
    count: i32,
}

/// Pick geometry of one solid, uploaded once
struct PickGeometry {
    faces: PickBuffers,
    edges: PickBuffers,
    points: PickBuffers,
}

struct Target {
    fbo: glow::Framebuffer,
    color: glow::Renderbuffer,
    depth: glow::Renderbuffer,
    width: u32,
    height: u32,
}

pub struct GlPickBackend {
    gl: Arc<glow::Context>,
    program: glow::Program,
    target: Option<Target>,
    geometry: HashMap<ObjectId, PickGeometry>,
    bound: bool,
    /// Widths the driver accepts for aliased lines
    line_width_range: [f32; 2],
    line_width_warned: bool,
}

impl GlPickBackend {
    pub fn new(gl: Arc<glow::Context>) -> Result<Self, PickError> {
        let program = compile_program(&gl, PICK_VERT, PICK_FRAG)?;
        let mut line_width_range = [1.0f32; 2];
        unsafe {
            gl.get_parameter_f32_slice(glow::ALIASED_LINE_WIDTH_RANGE, &mut line_width_range);
        }
        drain_errors(&gl);
        tracing::debug!("Aliased line width range {:?}", line_width_range);
        Ok(Self {
            gl,
            program,
            target: None,
            geometry: HashMap::new(),
            bound: false,
            line_width_range,
            line_width_warned: false,
        })
    }

    /// Drop uploaded solids (after the scene was replaced)
    pub fn clear_geometry(&mut self) {
        for (_, geometry) in self.geometry.drain() {
            for buffers in [geometry.faces, geometry.edges, geometry.points] {
                delete_buffers(&self.gl, buffers);
            }
        }
    }

    pub fn destroy(&mut self) {
        self.clear_geometry();
        if let Some(target) = self.target.take() {
            delete_target(&self.gl, target);
        }
        unsafe {
            self.gl.delete_program(self.program);
        }
    }

    fn ensure_target(&mut self, width: u32, height: u32) -> Result<(), PickError> {
        if let Some(t) = &self.target {
            if t.width == width && t.height == height {
                return Ok(());
            }
        }
        if let Some(old) = self.target.take() {
            delete_target(&self.gl, old);
        }

        let gl = &self.gl;
        unsafe {
            let fbo = gl
                .create_framebuffer()
                .map_err(PickError::TargetUnavailable)?;
            let color = gl
                .create_renderbuffer()
                .map_err(PickError::TargetUnavailable)?;
            let depth = gl
                .create_renderbuffer()
                .map_err(PickError::TargetUnavailable)?;

            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(color));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::RGBA32F, width as i32, height as i32);
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH_COMPONENT24,
                width as i32,
                height as i32,
            );
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(color),
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            let target = Target {
                fbo,
                color,
                depth,
                width,
                height,
            };
            if status != glow::FRAMEBUFFER_COMPLETE {
                delete_target(gl, target);
                return Err(PickError::IncompleteTarget(status));
            }
            tracing::debug!("Pick target allocated {}x{}", width, height);
            self.target = Some(target);
        }
        Ok(())
    }

    fn geometry_for(&mut self, solid: &Solid) -> Result<&PickGeometry, PickError> {
        if !self.geometry.contains_key(&solid.id) {
            let geometry = upload_solid(&self.gl, solid)?;
            self.geometry.insert(solid.id.clone(), geometry);
        }
        self.geometry
            .get(&solid.id)
            .ok_or_else(|| PickError::TargetUnavailable(format!("No pick geometry for {}", solid.id)))
    }
}

impl PickBackend for GlPickBackend {
    fn bind_target(&mut self, width: u32, height: u32) -> Result<(), PickError> {
        if width == 0 || height == 0 {
            return Err(PickError::TargetUnavailable(format!(
                "Zero-sized pick target {}x{}",
                width, height
            )));
        }
        self.ensure_target(width, height)?;
        let Some(target) = &self.target else {
            return Err(PickError::TargetUnavailable("Pick target missing".into()));
        };

        let gl = &self.gl;
        unsafe {
            // Errors left by earlier painting this frame are not ours to report
            if let Some(stale) = drain_errors(gl) {
                tracing::debug!("Discarding stale GL error 0x{:x} before pick", stale);
            }
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(target.fbo));
            gl.viewport(0, 0, width as i32, height as i32);
            gl.disable(glow::SCISSOR_TEST);
            gl.depth_mask(true);
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear_depth_f32(1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.depth_func(glow::LESS);
            gl.enable(glow::PROGRAM_POINT_SIZE);
            gl.use_program(Some(self.program));
        }
        self.bound = true;
        Ok(())
    }

    fn set_draw_state(&mut self, state: &DrawState) {
        let gl = &self.gl;
        unsafe {
            toggle(gl, glow::DEPTH_TEST, state.depth_test);
            toggle(gl, glow::BLEND, state.blend);
            toggle(gl, glow::POLYGON_OFFSET_FILL, state.polygon_offset);
            gl.depth_mask(state.depth_write);
            gl.line_width(clamp_line_width(state.line_width, self.line_width_range));
            // Core contexts may still reject wide lines; edges then draw one pixel wide
            let error = gl.get_error();
            if error != glow::NO_ERROR && !self.line_width_warned {
                tracing::warn!(
                    "Line width {} rejected (GL error 0x{:x}), picking edges at the driver default",
                    state.line_width,
                    error
                );
                self.line_width_warned = true;
            }
            if state.polygon_offset {
                gl.polygon_offset(1.0, 1.0);
            }
            let loc = gl.get_uniform_location(self.program, "u_point_size");
            gl.uniform_1_f32(loc.as_ref(), state.point_size);
        }
    }

    fn draw(&mut self, layer: PickLayer, solid: &Solid, frustum: &Mat4) -> Result<(), PickError> {
        if !self.bound {
            return Err(PickError::TargetUnavailable("Draw without a bound pick target".into()));
        }
        let program = self.program;
        let gl = self.gl.clone();
        let geometry = self.geometry_for(solid)?;

        unsafe {
            set_uniform_mat4(&gl, program, "u_frustum", frustum);
            set_uniform_mat4(&gl, program, "u_model", &solid.placement.matrix());

            let (buffers, mode) = match layer {
                PickLayer::Faces => (&geometry.faces, glow::TRIANGLES),
                PickLayer::Edges => (&geometry.edges, glow::LINES),
                PickLayer::Points => (&geometry.points, glow::POINTS),
            };
            gl.bind_vertex_array(Some(buffers.vao));
            if buffers.ibo.is_some() {
                gl.draw_elements(mode, buffers.count, glow::UNSIGNED_INT, 0);
            } else {
                gl.draw_arrays(mode, 0, buffers.count);
            }
            gl.bind_vertex_array(None);

            let error = gl.get_error();
            if error != glow::NO_ERROR {
                return Err(PickError::TargetUnavailable(format!(
                    "GL error 0x{:x} drawing {:?}",
                    error, layer
                )));
            }
        }
        Ok(())
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[f32; 4], PickError> {
        let mut bytes = [0u8; 16];
        let gl = &self.gl;
        unsafe {
            gl.read_pixels(
                x as i32,
                y as i32,
                1,
                1,
                glow::RGBA,
                glow::FLOAT,
                glow::PixelPackData::Slice(Some(&mut bytes)),
            );
            let error = gl.get_error();
            if error != glow::NO_ERROR {
                return Err(PickError::Readback(error));
            }
        }
        let mut pixel = [0.0f32; 4];
        for (value, chunk) in pixel.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(pixel)
    }

    fn release(&mut self) {
        self.set_draw_state(&DrawState::default());
        let gl = &self.gl;
        unsafe {
            gl.disable(glow::PROGRAM_POINT_SIZE);
            gl.depth_mask(true);
            gl.use_program(None);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
        self.bound = false;
    }
}

// ── Upload ───────────────────────────────────────────────────

fn upload_solid(gl: &glow::Context, solid: &Solid) -> Result<PickGeometry, PickError> {
    let face_tag = PickTag::Face.encode();
    let faces: Vec<f32> = solid
        .mesh
        .positions()
        .flat_map(|p| [p.x, p.y, p.z, face_tag])
        .collect();

    let edges: Vec<f32> = solid
        .edges
        .iter()
        .enumerate()
        .flat_map(|(i, e)| {
            let tag = PickTag::Edge(i).encode();
            [e.start.x, e.start.y, e.start.z, tag, e.end.x, e.end.y, e.end.z, tag]
        })
        .collect();

    let points: Vec<f32> = solid
        .vertices
        .iter()
        .enumerate()
        .flat_map(|(i, v)| [v.x, v.y, v.z, PickTag::Vertex(i).encode()])
        .collect();

    Ok(PickGeometry {
        faces: upload(gl, &faces, Some(&solid.mesh.indices))?,
        edges: upload(gl, &edges, None)?,
        points: upload(gl, &points, None)?,
    })
}

fn upload(gl: &glow::Context, vertices: &[f32], indices: Option<&[u32]>) -> Result<PickBuffers, PickError> {
    unsafe {
        let vao = gl
            .create_vertex_array()
            .map_err(PickError::TargetUnavailable)?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().map_err(PickError::TargetUnavailable)?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(vertices), glow::STATIC_DRAW);

        let stride = (PICK_STRIDE * 4) as i32;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 1, glow::FLOAT, false, stride, 3 * 4);

        let (ibo, count) = match indices {
            Some(indices) => {
                let ibo = gl.create_buffer().map_err(PickError::TargetUnavailable)?;
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
                gl.buffer_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    cast_slice(indices),
                    glow::STATIC_DRAW,
                );
                (Some(ibo), indices.len() as i32)
            }
            None => (None, (vertices.len() / PICK_STRIDE) as i32),
        };

        gl.bind_vertex_array(None);
        Ok(PickBuffers {
            vao,
            vbo,
            ibo,
            count,
        })
    }
}

fn delete_buffers(gl: &glow::Context, buffers: PickBuffers) {
    unsafe {
        gl.delete_vertex_array(buffers.vao);
        gl.delete_buffer(buffers.vbo);
        if let Some(ibo) = buffers.ibo {
            gl.delete_buffer(ibo);
        }
    }
}

fn delete_target(gl: &glow::Context, target: Target) {
    unsafe {
        gl.delete_framebuffer(target.fbo);
        gl.delete_renderbuffer(target.color);
        gl.delete_renderbuffer(target.depth);
    }
}

unsafe fn toggle(gl: &glow::Context, cap: u32, on: bool) {
    if on {
        gl.enable(cap);
    } else {
        gl.disable(cap);
    }
}

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> Result<glow::Program, PickError> {
    unsafe {
        let program = gl.create_program().map_err(PickError::TargetUnavailable)?;
        let mut shaders = Vec::new();
        for (kind, src) in [(glow::VERTEX_SHADER, vert_src), (glow::FRAGMENT_SHADER, frag_src)] {
            let shader = gl.create_shader(kind).map_err(PickError::TargetUnavailable)?;
            gl.shader_source(shader, src);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                tracing::error!("Pick shader error: {log}");
                return Err(PickError::TargetUnavailable(log));
            }
            gl.attach_shader(program, shader);
            shaders.push(shader);
        }
        gl.link_program(program);
        for shader in shaders {
            gl.delete_shader(shader);
        }
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            tracing::error!("Pick program link error: {log}");
            return Err(PickError::TargetUnavailable(log));
        }
        Ok(program)
    }
}

/// Clear the error queue, returning the oldest pending error
fn drain_errors(gl: &glow::Context) -> Option<u32> {
    let mut first = None;
    // Bounded: a lost context can report errors forever
    for _ in 0..16 {
        let error = unsafe { gl.get_error() };
        if error == glow::NO_ERROR {
            break;
        }
        first.get_or_insert(error);
    }
    first
}

/// Fit a requested width into the driver's range; an unusable range means 1
fn clamp_line_width(width: f32, range: [f32; 2]) -> f32 {
    let [min, max] = range;
    if !(min > 0.0 && max >= min) {
        return 1.0;
    }
    width.clamp(min, max)
}

fn cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

// ── Shaders ──────────────────────────────────────────────────

const PICK_VERT: &str = r#"#version 330 core
uniform mat4 u_frustum;
uniform mat4 u_model;
uniform float u_point_size;

layout(location = 0) in vec3 a_position;
layout(location = 1) in float a_tag;

out vec3 v_world;
flat out float v_tag;

void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    gl_Position = u_frustum * world;
    gl_PointSize = u_point_size;
    v_world = world.xyz;
    v_tag = a_tag;
}
"#;

const PICK_FRAG: &str = r#"#version 330 core
in vec3 v_world;
flat in float v_tag;

out vec4 frag_color;

void main() {
    frag_color = vec4(v_world, v_tag);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_width_clamped_to_driver_range() {
        assert_eq!(clamp_line_width(6.0, [1.0, 10.0]), 6.0);
        // Forward-compatible core profiles only take 1
        assert_eq!(clamp_line_width(6.0, [1.0, 1.0]), 1.0);
        assert_eq!(clamp_line_width(0.5, [1.0, 7.5]), 1.0);
        assert_eq!(clamp_line_width(6.0, [0.0, 0.0]), 1.0);
        assert_eq!(clamp_line_width(6.0, [f32::NAN, 4.0]), 1.0);
    }
}
