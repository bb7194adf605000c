use std::collections::HashMap;

use glam::{Mat4, Vec2};
use glow::HasContext;
use shared::ObjectId;

use super::mesh::{self, LineMeshData, MeshData, LINE_STRIDE, MESH_STRIDE};
use crate::scene::Solid;
use crate::state::settings::{AxisSettings, GridSettings};
use crate::tools::RegionGeometry;

// ── Render parameters ────────────────────────────────────────

/// Parameters for rendering the viewport
pub struct RenderParams {
    /// Viewport rectangle [x, y, width, height] in pixels
    pub viewport: [f32; 4],
    pub grid_visible: bool,
    pub axes_visible: bool,
    /// Background color RGB
    pub bg_color: [u8; 3],
    /// Solid whose feature edges are highlighted
    pub hovered: Option<ObjectId>,
    /// Selection rectangle overlay in clip space
    pub region: Option<RegionGeometry>,
    pub region_fill: [u8; 4],
    pub region_outline: [u8; 4],
}

// ── GPU mesh handles ─────────────────────────────────────────

struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    index_count: i32,
}

struct GpuLines {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

struct GpuSolid {
    mesh: GpuMesh,
    edges: GpuLines,
    model: Mat4,
}

// ── Main GL renderer ─────────────────────────────────────────

pub struct GlRenderer {
    mesh_program: glow::Program,
    line_program: glow::Program,
    overlay_program: glow::Program,
    grid: Option<GpuLines>,
    axes: Option<GpuLines>,
    /// Cached grid settings to detect changes
    cached_grid_settings: Option<(i32, f32, f32)>,
    /// Cached axes length to detect changes
    cached_axes_length: Option<f32>,
    solids: HashMap<ObjectId, GpuSolid>,
    /// Scene version the solids were uploaded from
    scene_version: Option<u64>,
    /// Selection rectangle: 4 clip-space corners, streamed every frame
    region: GpuLines,
    region_ibo: glow::Buffer,
}

impl GlRenderer {
    pub fn new(gl: &glow::Context) -> Self {
        let mesh_program = compile_program(gl, MESH_VERT, MESH_FRAG);
        let line_program = compile_program(gl, LINE_VERT, LINE_FRAG);
        let overlay_program = compile_program(gl, OVERLAY_VERT, OVERLAY_FRAG);

        let grid_data = mesh::grid(5, 1.0, 0.6);
        let axes_data = mesh::axes(1.5);
        let (region, region_ibo) = create_region_buffers(gl);

        Self {
            mesh_program,
            line_program,
            overlay_program,
            grid: Some(upload_lines(gl, &grid_data)),
            axes: Some(upload_lines(gl, &axes_data)),
            cached_grid_settings: Some((5, 1.0, 0.6)),
            cached_axes_length: Some(1.5),
            solids: HashMap::new(),
            scene_version: None,
            region,
            region_ibo,
        }
    }

    /// Update grid mesh based on settings
    pub fn update_grid(&mut self, gl: &glow::Context, settings: &GridSettings) {
        let new_settings = (settings.range, settings.size, settings.opacity);
        if self.cached_grid_settings == Some(new_settings) {
            return;
        }

        if let Some(old) = self.grid.take() {
            delete_lines(gl, &old);
        }
        let grid_data = mesh::grid(settings.range, settings.size, settings.opacity);
        self.grid = Some(upload_lines(gl, &grid_data));
        self.cached_grid_settings = Some(new_settings);
    }

    /// Update axes mesh based on settings
    pub fn update_axes(&mut self, gl: &glow::Context, settings: &AxisSettings) {
        if self.cached_axes_length == Some(settings.length) {
            return;
        }

        if let Some(old) = self.axes.take() {
            delete_lines(gl, &old);
        }
        let axes_data = mesh::axes(settings.length);
        self.axes = Some(upload_lines(gl, &axes_data));
        self.cached_axes_length = Some(settings.length);
    }

    /// Upload the scene's solids, replacing the previous upload when the version changed
    pub fn sync_solids(&mut self, gl: &glow::Context, solids: &[Solid], version: u64) {
        if self.scene_version == Some(version) {
            return;
        }
        self.scene_version = Some(version);

        for (_, solid) in self.solids.drain() {
            delete_mesh(gl, &solid.mesh);
            delete_lines(gl, &solid.edges);
        }

        for solid in solids {
            let mut lines = LineMeshData::default();
            for edge in &solid.edges {
                lines.push_segment(edge.start, edge.end, EDGE_COLOR);
            }
            self.solids.insert(
                solid.id.clone(),
                GpuSolid {
                    mesh: upload_mesh(gl, &solid.mesh),
                    edges: upload_lines(gl, &lines),
                    model: solid.placement.matrix(),
                },
            );
        }
        tracing::debug!("Uploaded {} solids (scene version {})", solids.len(), version);
    }

    /// Render the scene
    pub fn paint(&self, gl: &glow::Context, vp: Mat4, params: &RenderParams) {
        unsafe {
            gl.viewport(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.scissor(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.enable(glow::SCISSOR_TEST);

            gl.clear_color(
                params.bg_color[0] as f32 / 255.0,
                params.bg_color[1] as f32 / 255.0,
                params.bg_color[2] as f32 / 255.0,
                1.0,
            );
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);

            // Grid and axes
            gl.use_program(Some(self.line_program));
            set_uniform_mat4(gl, self.line_program, "u_mvp", &vp);
            if params.grid_visible {
                if let Some(ref grid) = self.grid {
                    draw_lines(gl, grid);
                }
            }
            if params.axes_visible {
                if let Some(ref axes) = self.axes {
                    draw_lines(gl, axes);
                }
            }

            // Solids
            gl.use_program(Some(self.mesh_program));
            let light_dir = glam::Vec3::new(0.3, 0.8, 0.5).normalize();
            set_uniform_vec3(gl, self.mesh_program, "u_light_dir", &light_dir);
            gl.enable(glow::POLYGON_OFFSET_FILL);
            gl.polygon_offset(1.0, 1.0);
            for solid in self.solids.values() {
                set_uniform_mat4(gl, self.mesh_program, "u_mvp", &(vp * solid.model));
                set_uniform_mat4(gl, self.mesh_program, "u_model", &solid.model);
                draw_mesh(gl, &solid.mesh);
            }
            gl.disable(glow::POLYGON_OFFSET_FILL);

            // Feature edges of the hovered solid
            if let Some(solid) = params.hovered.as_ref().and_then(|id| self.solids.get(id)) {
                gl.use_program(Some(self.line_program));
                set_uniform_mat4(gl, self.line_program, "u_mvp", &(vp * solid.model));
                draw_lines(gl, &solid.edges);
            }

            gl.disable(glow::DEPTH_TEST);

            if let Some(region) = &params.region {
                self.paint_region(gl, region, params);
            }

            gl.disable(glow::SCISSOR_TEST);
            gl.use_program(None);
        }
    }

    /// Selection rectangle: translucent fill plus outline, already in clip space
    unsafe fn paint_region(&self, gl: &glow::Context, region: &RegionGeometry, params: &RenderParams) {
        let corners: Vec<f32> = region.vertices.iter().flat_map(|v: &Vec2| [v.x, v.y]).collect();
        let mut indices = [0u16; 14];
        indices[..6].copy_from_slice(&region.fill);
        indices[6..].copy_from_slice(&region.outline);

        gl.bind_vertex_array(Some(self.region.vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.region.vbo));
        gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, cast_slice(&corners));
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.region_ibo));
        gl.buffer_sub_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, 0, cast_slice(&indices));

        gl.enable(glow::BLEND);
        gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        gl.use_program(Some(self.overlay_program));

        set_uniform_color(gl, self.overlay_program, params.region_fill);
        gl.draw_elements(glow::TRIANGLES, 6, glow::UNSIGNED_SHORT, 0);
        set_uniform_color(gl, self.overlay_program, params.region_outline);
        gl.draw_elements(glow::LINES, 8, glow::UNSIGNED_SHORT, 6 * 2);

        gl.disable(glow::BLEND);
        gl.bind_vertex_array(None);
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.mesh_program);
            gl.delete_program(self.line_program);
            gl.delete_program(self.overlay_program);
            gl.delete_buffer(self.region_ibo);
        }
        for lines in [self.grid.take(), self.axes.take()].into_iter().flatten() {
            delete_lines(gl, &lines);
        }
        delete_lines(gl, &self.region);
        for (_, solid) in self.solids.drain() {
            delete_mesh(gl, &solid.mesh);
            delete_lines(gl, &solid.edges);
        }
    }
}

const EDGE_COLOR: [f32; 4] = [0.05, 0.05, 0.08, 1.0];

// ── GPU upload ───────────────────────────────────────────────

fn upload_mesh(gl: &glow::Context, data: &MeshData) -> GpuMesh {
    unsafe {
        let vao = gl.create_vertex_array().unwrap();
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(&data.vertices), glow::STATIC_DRAW);

        let stride = (MESH_STRIDE * 4) as i32;
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // normal: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);
        // color: location 2
        gl.enable_vertex_attrib_array(2);
        gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, stride, 6 * 4);

        let ibo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, cast_slice(&data.indices), glow::STATIC_DRAW);

        gl.bind_vertex_array(None);

        GpuMesh {
            vao,
            vbo,
            ibo,
            index_count: data.indices.len() as i32,
        }
    }
}

fn upload_lines(gl: &glow::Context, data: &LineMeshData) -> GpuLines {
    unsafe {
        let vao = gl.create_vertex_array().unwrap();
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(&data.vertices), glow::STATIC_DRAW);

        let stride = (LINE_STRIDE * 4) as i32;
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // color: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride, 3 * 4);

        gl.bind_vertex_array(None);

        GpuLines {
            vao,
            vbo,
            vertex_count: data.vertex_count() as i32,
        }
    }
}

fn create_region_buffers(gl: &glow::Context) -> (GpuLines, glow::Buffer) {
    unsafe {
        let vao = gl.create_vertex_array().unwrap();
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_size(glow::ARRAY_BUFFER, 4 * 2 * 4, glow::DYNAMIC_DRAW);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 2 * 4, 0);

        let ibo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_size(glow::ELEMENT_ARRAY_BUFFER, 14 * 2, glow::DYNAMIC_DRAW);

        gl.bind_vertex_array(None);
        (
            GpuLines {
                vao,
                vbo,
                vertex_count: 4,
            },
            ibo,
        )
    }
}

fn delete_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    unsafe {
        gl.delete_vertex_array(mesh.vao);
        gl.delete_buffer(mesh.vbo);
        gl.delete_buffer(mesh.ibo);
    }
}

fn delete_lines(gl: &glow::Context, lines: &GpuLines) {
    unsafe {
        gl.delete_vertex_array(lines.vao);
        gl.delete_buffer(lines.vbo);
    }
}

// ── Draw calls ───────────────────────────────────────────────

unsafe fn draw_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    gl.bind_vertex_array(Some(mesh.vao));
    gl.draw_elements(glow::TRIANGLES, mesh.index_count, glow::UNSIGNED_INT, 0);
    gl.bind_vertex_array(None);
}

unsafe fn draw_lines(gl: &glow::Context, lines: &GpuLines) {
    gl.bind_vertex_array(Some(lines.vao));
    gl.draw_arrays(glow::LINES, 0, lines.vertex_count);
    gl.bind_vertex_array(None);
}

// ── Shader compilation ───────────────────────────────────────

fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> glow::Program {
    unsafe {
        let program = gl.create_program().unwrap();

        let vert = gl.create_shader(glow::VERTEX_SHADER).unwrap();
        gl.shader_source(vert, vert_src);
        gl.compile_shader(vert);
        if !gl.get_shader_compile_status(vert) {
            let log = gl.get_shader_info_log(vert);
            tracing::error!("Vertex shader error: {log}");
        }

        let frag = gl.create_shader(glow::FRAGMENT_SHADER).unwrap();
        gl.shader_source(frag, frag_src);
        gl.compile_shader(frag);
        if !gl.get_shader_compile_status(frag) {
            let log = gl.get_shader_info_log(frag);
            tracing::error!("Fragment shader error: {log}");
        }

        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            tracing::error!("Program link error: {log}");
        }

        gl.delete_shader(vert);
        gl.delete_shader(frag);

        program
    }
}

// ── Uniform setters ──────────────────────────────────────────

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_vec3(gl: &glow::Context, program: glow::Program, name: &str, v: &glam::Vec3) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_3_f32(loc.as_ref(), v.x, v.y, v.z);
    }
}

fn set_uniform_color(gl: &glow::Context, program: glow::Program, rgba: [u8; 4]) {
    let [r, g, b, a] = rgba.map(|c| c as f32 / 255.0);
    unsafe {
        let loc = gl.get_uniform_location(program, "u_color");
        gl.uniform_4_f32(loc.as_ref(), r, g, b, a);
    }
}

// ── Byte cast helper ─────────────────────────────────────────

fn cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

// ── Shaders ──────────────────────────────────────────────────

const MESH_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;
uniform mat4 u_model;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec3 a_color;

out vec3 v_normal;
out vec3 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_normal = mat3(u_model) * a_normal;
    v_color = a_color;
}
"#;

const MESH_FRAG: &str = r#"#version 330 core
uniform vec3 u_light_dir;

in vec3 v_normal;
in vec3 v_color;

out vec4 frag_color;

void main() {
    vec3 n = normalize(v_normal);
    float diffuse = max(dot(n, u_light_dir), 0.0);
    float ambient = 0.25;
    float light = ambient + diffuse * 0.75;
    frag_color = vec4(v_color * light, 1.0);
}
"#;

const LINE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;

out vec4 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_color = a_color;
}
"#;

const LINE_FRAG: &str = r#"#version 330 core
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;

const OVERLAY_VERT: &str = r#"#version 330 core
layout(location = 0) in vec2 a_clip;

void main() {
    gl_Position = vec4(a_clip, 0.0, 1.0);
}
"#;

const OVERLAY_FRAG: &str = r#"#version 330 core
uniform vec4 u_color;
out vec4 frag_color;

void main() {
    frag_color = u_color;
}
"#;
