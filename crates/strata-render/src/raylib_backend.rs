//! rlgl vertex-array backend. Requires an open raylib window on the calling thread.
#![allow(unsafe_code)]

use std::ffi::{CString, c_void};

use hashbrown::HashMap;
use raylib::ffi;
use strata_blocks::RenderGroup;
use strata_geom::Mat4;
use strata_mesh_cpu::constants::VERTEX_STRIDE;

use crate::backend::{BufferId, BufferUsage, GpuBackend, GpuError};

const GL_FLOAT: i32 = 0x1406;
const ATTR_POSITION: u32 = 0;
const ATTR_TEXCOORD: u32 = 1;

const VERTEX_SHADER: &str = r#"#version 330
in vec3 vertexPosition;
in vec2 vertexTexCoord;
in float vertexShade;
uniform mat4 mvp;
out vec2 fragTexCoord;
out float fragShade;
void main() {
    fragTexCoord = vertexTexCoord;
    fragShade = vertexShade;
    gl_Position = mvp * vec4(vertexPosition, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 330
in vec2 fragTexCoord;
in float fragShade;
uniform sampler2D texture0;
out vec4 finalColor;
void main() {
    vec4 texel = texture(texture0, fragTexCoord);
    if (texel.a < 0.1) discard;
    finalColor = vec4(texel.rgb * fragShade, texel.a);
}
"#;

struct VertexArray {
    vao: u32,
    capacity: usize,
}

pub struct RaylibBackend {
    shader: ffi::Shader,
    mvp_loc: i32,
    shade_loc: u32,
    atlas_texture: u32,
    arrays: HashMap<BufferId, VertexArray>,
    unloaded: bool,
}

impl RaylibBackend {
    /// `atlas_texture` is the GL id of the block atlas (0 draws untextured white).
    pub fn new(
        _rl: &mut raylib::RaylibHandle,
        _thread: &raylib::RaylibThread,
        atlas_texture: u32,
    ) -> Result<Self, GpuError> {
        let vs = CString::new(VERTEX_SHADER).map_err(|_| shader_error())?;
        let fs = CString::new(FRAGMENT_SHADER).map_err(|_| shader_error())?;
        let shade_name = CString::new("vertexShade").map_err(|_| shader_error())?;
        let mvp_name = CString::new("mvp").map_err(|_| shader_error())?;
        let shader = unsafe { ffi::LoadShaderFromMemory(vs.as_ptr(), fs.as_ptr()) };
        if shader.id == 0 {
            return Err(shader_error());
        }
        let shade_loc = unsafe { ffi::GetShaderLocationAttrib(shader, shade_name.as_ptr()) };
        let mvp_loc = unsafe { ffi::GetShaderLocation(shader, mvp_name.as_ptr()) };
        if shade_loc < 0 {
            unsafe { ffi::UnloadShader(shader) };
            return Err(shader_error());
        }
        log::info!("raylib chunk shader {} loaded", shader.id);
        Ok(Self {
            shader,
            mvp_loc,
            shade_loc: shade_loc as u32,
            atlas_texture,
            arrays: HashMap::new(),
            unloaded: false,
        })
    }

    /// Releases the shader and any buffers still alive. Call before the window closes.
    pub fn unload(&mut self) {
        if self.unloaded {
            return;
        }
        if !self.arrays.is_empty() {
            log::warn!("unloading backend with {} live vertex buffers", self.arrays.len());
        }
        for (vbo, arr) in self.arrays.drain() {
            unsafe {
                ffi::rlUnloadVertexBuffer(vbo);
                ffi::rlUnloadVertexArray(arr.vao);
            }
        }
        unsafe { ffi::UnloadShader(self.shader) };
        self.unloaded = true;
    }
}

fn shader_error() -> GpuError {
    GpuError::Allocation {
        what: "chunk shader",
        bytes: 0,
    }
}

fn to_rl_matrix(m: &Mat4) -> ffi::Matrix {
    let m = &m.m;
    ffi::Matrix {
        m0: m[0],
        m1: m[1],
        m2: m[2],
        m3: m[3],
        m4: m[4],
        m5: m[5],
        m6: m[6],
        m7: m[7],
        m8: m[8],
        m9: m[9],
        m10: m[10],
        m11: m[11],
        m12: m[12],
        m13: m[13],
        m14: m[14],
        m15: m[15],
    }
}

impl GpuBackend for RaylibBackend {
    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, GpuError> {
        let bytes = std::mem::size_of_val(indices);
        let id = unsafe {
            ffi::rlLoadVertexBufferElement(indices.as_ptr() as *const c_void, bytes as i32, false)
        };
        if id == 0 {
            return Err(GpuError::Allocation {
                what: "index buffer",
                bytes,
            });
        }
        Ok(id)
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        usage: BufferUsage,
    ) -> Result<BufferId, GpuError> {
        let bytes = std::mem::size_of_val(data);
        let stride = (VERTEX_STRIDE * std::mem::size_of::<f32>()) as i32;
        let dynamic = usage == BufferUsage::Stream;
        let (vao, vbo) = unsafe {
            let vao = ffi::rlLoadVertexArray();
            ffi::rlEnableVertexArray(vao);
            let vbo = ffi::rlLoadVertexBuffer(data.as_ptr() as *const c_void, bytes as i32, dynamic);
            ffi::rlSetVertexAttribute(ATTR_POSITION, 3, GL_FLOAT, false, stride, 0);
            ffi::rlEnableVertexAttribute(ATTR_POSITION);
            ffi::rlSetVertexAttribute(self.shade_loc, 1, GL_FLOAT, false, stride, 12);
            ffi::rlEnableVertexAttribute(self.shade_loc);
            ffi::rlSetVertexAttribute(ATTR_TEXCOORD, 2, GL_FLOAT, false, stride, 16);
            ffi::rlEnableVertexAttribute(ATTR_TEXCOORD);
            ffi::rlDisableVertexArray();
            (vao, vbo)
        };
        if vao == 0 || vbo == 0 {
            unsafe {
                if vbo != 0 {
                    ffi::rlUnloadVertexBuffer(vbo);
                }
                if vao != 0 {
                    ffi::rlUnloadVertexArray(vao);
                }
            }
            return Err(GpuError::Allocation {
                what: "vertex buffer",
                bytes,
            });
        }
        self.arrays.insert(
            vbo,
            VertexArray {
                vao,
                capacity: data.len(),
            },
        );
        Ok(vbo)
    }

    fn update_vertex_buffer(&mut self, id: BufferId, data: &[f32]) -> Result<(), GpuError> {
        let arr = self.arrays.get(&id).ok_or(GpuError::UnknownBuffer(id))?;
        if data.len() > arr.capacity {
            return Err(GpuError::Overflow {
                id,
                len: data.len(),
                capacity: arr.capacity,
            });
        }
        let bytes = std::mem::size_of_val(data) as i32;
        unsafe { ffi::rlUpdateVertexBuffer(id, data.as_ptr() as *const c_void, bytes, 0) };
        Ok(())
    }

    fn delete_vertex_buffer(&mut self, id: BufferId) {
        match self.arrays.remove(&id) {
            Some(arr) => unsafe {
                ffi::rlUnloadVertexBuffer(id);
                ffi::rlUnloadVertexArray(arr.vao);
            },
            None => log::error!("delete of unknown vertex buffer {id}"),
        }
    }

    fn delete_index_buffer(&mut self, id: BufferId) {
        unsafe { ffi::rlUnloadVertexBuffer(id) };
    }

    fn draw_quads(
        &mut self,
        vertex: BufferId,
        index: BufferId,
        quad_count: usize,
        group: RenderGroup,
    ) {
        let Some(arr) = self.arrays.get(&vertex) else {
            log::error!("draw of unknown vertex buffer {vertex}");
            return;
        };
        let count = (quad_count * 6) as i32;
        unsafe {
            match group {
                RenderGroup::Plant => ffi::rlDisableBackfaceCulling(),
                RenderGroup::Liquid => ffi::rlDisableDepthMask(),
                RenderGroup::Terrain => {}
            }
            ffi::rlEnableVertexArray(arr.vao);
            ffi::rlEnableVertexBufferElement(index);
            ffi::rlDrawVertexArrayElements(0, count, std::ptr::null());
            ffi::rlDisableVertexArray();
            match group {
                RenderGroup::Plant => ffi::rlEnableBackfaceCulling(),
                RenderGroup::Liquid => ffi::rlEnableDepthMask(),
                RenderGroup::Terrain => {}
            }
        }
    }

    fn begin_frame(&mut self, view_proj: &Mat4) {
        unsafe {
            ffi::rlDrawRenderBatchActive();
            ffi::rlEnableShader(self.shader.id);
            ffi::rlSetUniformMatrix(self.mvp_loc, to_rl_matrix(view_proj));
            ffi::rlActiveTextureSlot(0);
            ffi::rlEnableTexture(self.atlas_texture);
        }
    }

    fn end_frame(&mut self) {
        unsafe {
            ffi::rlDisableTexture();
            ffi::rlDisableShader();
        }
    }
}
