//! WGSL sources for the particle update, line drawing and surface blit.
//!
//! The update kernel is generated so the work-group tile and actor
//! capacities always agree with the Rust side.

use glam::UVec2;

use crate::actors::{MAX_PUSHERS, MAX_VORTICES};

/// Hash used for per-particle lifetime phases.
const HASH_WGSL: &str = r#"
fn hash(n: u32) -> u32 {
    var x = n;
    x = x ^ (x >> 17u);
    x = x * 0xed5ad4bbu;
    x = x ^ (x >> 11u);
    x = x * 0xac4c1b51u;
    x = x ^ (x >> 15u);
    x = x * 0x31848babu;
    x = x ^ (x >> 14u);
    return x;
}
"#;

/// Compute kernel advancing every particle by one tick.
///
/// Bindings: 0 = particle vertices (head, tail pairs), 1 = actor block,
/// 2 = simulation parameters.
pub fn update_shader(workgroup: UVec2) -> String {
    let wx = workgroup.x;
    let wy = workgroup.y;
    format!(
        r#"
struct SimParams {{
    tick: u32,
    lifetime: u32,
    num_vortices: u32,
    num_pushers: u32,
    grid_size: vec2<u32>,
    padding: vec2<u32>,
}};

struct Actor {{
    position: vec2<f32>,
    force: f32,
    padding: f32,
}};

struct Actors {{
    vortices: array<Actor, {MAX_VORTICES}>,
    pushers: array<Actor, {MAX_PUSHERS}>,
}};

@group(0) @binding(0)
var<storage, read_write> particles: array<vec2<f32>>;

@group(0) @binding(1)
var<uniform> actors: Actors;

@group(0) @binding(2)
var<uniform> params: SimParams;

// Keeps the field finite at an actor's center.
const SOFTENING: f32 = 16.0;
const MAX_STEP: f32 = 4.0;
{HASH_WGSL}
fn field_velocity(p: vec2<f32>) -> vec2<f32> {{
    var v = vec2<f32>(0.0, 0.0);
    for (var i = 0u; i < params.num_vortices; i++) {{
        let a = actors.vortices[i];
        let d = p - a.position;
        v += a.force * vec2<f32>(-d.y, d.x) / (dot(d, d) + SOFTENING);
    }}
    for (var i = 0u; i < params.num_pushers; i++) {{
        let a = actors.pushers[i];
        let d = p - a.position;
        v += a.force * d / (dot(d, d) + SOFTENING);
    }}
    return v;
}}

@compute @workgroup_size({wx}, {wy})
fn main(@builtin(global_invocation_id) id: vec3<u32>) {{
    if id.x >= params.grid_size.x || id.y >= params.grid_size.y {{
        return;
    }}

    let index = id.y * params.grid_size.x + id.x;
    let head_index = 2u * index;

    // Stagger respawns so the whole grid doesn't reset on the same tick
    let phase = hash(index) % params.lifetime;
    if (params.tick + phase) % params.lifetime == 0u {{
        let home = vec2<f32>(f32(id.x), f32(id.y));
        particles[head_index] = home;
        particles[head_index + 1u] = home;
        return;
    }}

    let head = particles[head_index];
    var delta = field_velocity(head);
    let len = length(delta);
    if len > MAX_STEP {{
        delta = delta * (MAX_STEP / len);
    }}

    particles[head_index + 1u] = head;
    particles[head_index] = head + delta;
}}
"#
    )
}

/// Line renderer: one `LineList` segment per particle, head to tail.
///
/// Bindings: 0 = line parameters (grid size and aspect scale).
pub const LINES_SHADER: &str = r#"
struct LineParams {
    grid_size: vec2<f32>,
    scale: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> line_params: LineParams;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec2<f32>,
) -> VertexOutput {
    let uv = position / line_params.grid_size;
    // Grid y grows downward on screen
    let ndc = (uv * 2.0 - 1.0) * vec2<f32>(1.0, -1.0) * line_params.scale;

    let is_head = (vertex_index & 1u) == 0u;
    let hue = clamp(uv.x, 0.0, 1.0);
    let rgb = mix(vec3<f32>(0.25, 0.55, 1.0), vec3<f32>(1.0, 0.55, 0.25), hue);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.color = vec4<f32>(rgb, select(0.15, 0.5, is_head));
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Copies the accumulation surface pixel-for-pixel onto the display target.
///
/// Output is always opaque whatever alpha the trails built up.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var accum: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4<f32> {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    return vec4<f32>(positions[vertex_index], 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) frag_coord: vec4<f32>) -> @location(0) vec4<f32> {
    let texel = textureLoad(accum, vec2<i32>(frag_coord.xy), 0);
    return vec4<f32>(texel.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::WORKGROUP_SIZE;

    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn update_shader_is_valid() {
        let shader = update_shader(WORKGROUP_SIZE);
        validate_wgsl(&shader).expect("update WGSL should be valid");
    }

    #[test]
    fn update_shader_uses_workgroup_tile() {
        let shader = update_shader(UVec2::new(8, 4));
        assert!(shader.contains("@workgroup_size(8, 4)"));
        assert!(shader.contains(&format!("array<Actor, {MAX_VORTICES}>")));
    }

    #[test]
    fn update_shader_only_reads_live_actors() {
        let shader = update_shader(WORKGROUP_SIZE);
        assert!(shader.contains("i < params.num_vortices"));
        assert!(shader.contains("i < params.num_pushers"));
    }

    #[test]
    fn lines_shader_is_valid() {
        validate_wgsl(LINES_SHADER).expect("lines WGSL should be valid");
    }

    #[test]
    fn blit_shader_is_valid() {
        validate_wgsl(BLIT_SHADER).expect("blit WGSL should be valid");
    }

    #[test]
    fn blit_shader_writes_opaque_pixels() {
        assert!(BLIT_SHADER.contains("vec4<f32>(texel.rgb, 1.0)"));
    }
}
