use glam::{Mat4, Vec3};
use spiral_core::{
    box_mesh, reticle_mesh, DrawItem, DrawShape, MeshVertex, DIR_LIGHT_INTENSITY,
    DIR_LIGHT_POSITION, HEMI_GROUND_COLOR, HEMI_INTENSITY, HEMI_SKY_COLOR,
};
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlProgram, WebGlShader, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

const VERTEX_SRC: &str = r#"#version 300 es
layout(location = 0) in vec3 a_pos;
layout(location = 1) in vec3 a_normal;
uniform mat4 u_view_proj;
uniform mat4 u_model;
out vec3 v_normal;
void main() {
  v_normal = normalize((u_model * vec4(a_normal, 0.0)).xyz);
  gl_Position = u_view_proj * u_model * vec4(a_pos, 1.0);
}
"#;

const FRAGMENT_SRC: &str = r#"#version 300 es
precision mediump float;
in vec3 v_normal;
uniform vec3 u_color;
uniform vec4 u_light_dir;
uniform vec4 u_sky;
uniform vec3 u_ground;
out vec4 frag;
void main() {
  vec3 n = normalize(v_normal);
  vec3 hemi = mix(u_ground, u_sky.rgb, n.y * 0.5 + 0.5) * u_sky.w;
  float diffuse = max(dot(n, normalize(u_light_dir.xyz)), 0.0) * u_light_dir.w;
  frag = vec4(u_color * (hemi * 0.6 + diffuse), 1.0);
}
"#;

/// One eye: viewport in framebuffer pixels and its view-projection.
pub struct EyeView {
    pub viewport: [i32; 4],
    pub view_proj: Mat4,
}

struct Mesh {
    vao: WebGlVertexArrayObject,
    count: i32,
}

struct Uniforms {
    view_proj: Option<WebGlUniformLocation>,
    model: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    light_dir: Option<WebGlUniformLocation>,
    sky: Option<WebGlUniformLocation>,
    ground: Option<WebGlUniformLocation>,
}

pub struct GlRenderer {
    gl: Gl,
    program: WebGlProgram,
    uniforms: Uniforms,
    stone: Mesh,
    ring: Mesh,
}

fn compile(gl: &Gl, kind: u32, src: &str) -> anyhow::Result<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| anyhow::anyhow!("create_shader failed"))?;
    gl.shader_source(&shader, src);
    gl.compile_shader(&shader);
    let ok = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if !ok {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        return Err(anyhow::anyhow!("shader compile: {info}"));
    }
    Ok(shader)
}

fn link(gl: &Gl, vs: &WebGlShader, fs: &WebGlShader) -> anyhow::Result<WebGlProgram> {
    let program = gl
        .create_program()
        .ok_or_else(|| anyhow::anyhow!("create_program failed"))?;
    gl.attach_shader(&program, vs);
    gl.attach_shader(&program, fs);
    gl.link_program(&program);
    let ok = gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if !ok {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        return Err(anyhow::anyhow!("program link: {info}"));
    }
    Ok(program)
}

fn upload(gl: &Gl, vertices: &[MeshVertex]) -> anyhow::Result<Mesh> {
    let vao = gl
        .create_vertex_array()
        .ok_or_else(|| anyhow::anyhow!("create_vertex_array failed"))?;
    gl.bind_vertex_array(Some(&vao));
    let vbo = gl
        .create_buffer()
        .ok_or_else(|| anyhow::anyhow!("create_buffer failed"))?;
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vbo));
    gl.buffer_data_with_u8_array(
        Gl::ARRAY_BUFFER,
        bytemuck::cast_slice(vertices),
        Gl::STATIC_DRAW,
    );
    let stride = std::mem::size_of::<MeshVertex>() as i32;
    gl.enable_vertex_attrib_array(0);
    gl.vertex_attrib_pointer_with_i32(0, 3, Gl::FLOAT, false, stride, 0);
    gl.enable_vertex_attrib_array(1);
    gl.vertex_attrib_pointer_with_i32(1, 3, Gl::FLOAT, false, stride, 12);
    gl.bind_vertex_array(None);
    Ok(Mesh {
        vao,
        count: vertices.len() as i32,
    })
}

impl GlRenderer {
    pub fn new(gl: Gl) -> anyhow::Result<Self> {
        let vs = compile(&gl, Gl::VERTEX_SHADER, VERTEX_SRC)?;
        let fs = compile(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SRC)?;
        let program = link(&gl, &vs, &fs)?;
        let uniforms = Uniforms {
            view_proj: gl.get_uniform_location(&program, "u_view_proj"),
            model: gl.get_uniform_location(&program, "u_model"),
            color: gl.get_uniform_location(&program, "u_color"),
            light_dir: gl.get_uniform_location(&program, "u_light_dir"),
            sky: gl.get_uniform_location(&program, "u_sky"),
            ground: gl.get_uniform_location(&program, "u_ground"),
        };
        let stone = upload(&gl, &box_mesh())?;
        let ring = upload(&gl, &reticle_mesh())?;
        log::info!("[render] WebGL2 pipeline ready");
        Ok(Self {
            gl,
            program,
            uniforms,
            stone,
            ring,
        })
    }

    pub fn context(&self) -> &Gl {
        &self.gl
    }

    /// Draw `items` once per eye into the currently bound framebuffer.
    pub fn draw(&self, eyes: &[EyeView], items: &[DrawItem]) {
        let gl = &self.gl;
        gl.enable(Gl::DEPTH_TEST);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        gl.use_program(Some(&self.program));

        let light = Vec3::from(DIR_LIGHT_POSITION).normalize();
        gl.uniform4f(
            self.uniforms.light_dir.as_ref(),
            light.x,
            light.y,
            light.z,
            DIR_LIGHT_INTENSITY,
        );
        let [sr, sg, sb] = HEMI_SKY_COLOR;
        gl.uniform4f(self.uniforms.sky.as_ref(), sr, sg, sb, HEMI_INTENSITY);
        gl.uniform3fv_with_f32_array(self.uniforms.ground.as_ref(), &HEMI_GROUND_COLOR);

        for eye in eyes {
            let [x, y, w, h] = eye.viewport;
            gl.viewport(x, y, w, h);
            gl.uniform_matrix4fv_with_f32_array(
                self.uniforms.view_proj.as_ref(),
                false,
                &eye.view_proj.to_cols_array(),
            );
            for item in items {
                let mesh = match item.shape {
                    DrawShape::Box => &self.stone,
                    DrawShape::Ring => &self.ring,
                };
                gl.bind_vertex_array(Some(&mesh.vao));
                gl.uniform_matrix4fv_with_f32_array(
                    self.uniforms.model.as_ref(),
                    false,
                    &item.model.to_cols_array(),
                );
                gl.uniform3fv_with_f32_array(self.uniforms.color.as_ref(), &item.color);
                gl.draw_arrays(Gl::TRIANGLES, 0, mesh.count);
            }
        }
        gl.bind_vertex_array(None);
    }
}
