use std::path::Path;

use crate::constants::TILE_SIZE;

/// Name of the generated kernel entry point.
pub const ENTRY_POINT: &str = "renderRunner";

/// Source language accepted for the user part of a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Native Slang/HLSL-style syntax.
    Slang,
    /// Legacy GLSL syntax (`vec4`, `out` parameters, ...), as used by
    /// ShaderToy-style sources.
    Glsl,
}

impl Dialect {
    /// `.slang` files are compiled natively, everything else through the
    /// GLSL compatibility front end.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("slang") => Self::Slang,
            _ => Self::Glsl,
        }
    }
}

/// Solid red image shown whenever the requested shader fails to build.
pub const FALLBACK_SHADER: &str = r"
void mainImage(out vec4 fragColor, in vec2 fragCoord)
{
    fragColor = vec4(1.0, 0.0, 0.0, 1.0);
}
";

/// Colour produced by [`FALLBACK_SHADER`].
pub const FALLBACK_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Turns a user shader defining `mainImage(out color, in coord)` into a full
/// compute module.
///
/// Layout of the result:
///
/// 1. [`PRELUDE`]: the constants struct bound as a C-layout constant buffer
///    and macros mapping `iResolution`, `iFrame`, `iMouse`, `iTime` onto it.
/// 2. The user source, verbatim, starting at `#line 1`.
/// 3. The output pixel buffer and the `renderRunner` kernel, one thread
///    group per tile.
///
/// Nothing is validated here; mistakes surface as compiler diagnostics.
pub fn wrap_shader(source: &str, dialect: Dialect) -> String {
    let mut wrapped = String::with_capacity(PRELUDE.len() + source.len() + 1024);
    wrapped.push_str(match dialect {
        Dialect::Slang => "// dialect: slang\n",
        Dialect::Glsl => "// dialect: glsl\n",
    });
    wrapped.push_str(PRELUDE);
    wrapped.push_str("#line 1\n");
    wrapped.push_str(source);
    if !source.ends_with('\n') {
        wrapped.push('\n');
    }
    wrapped.push_str("#line default\n");
    wrapped.push_str("RWStructuredBuffer<uint8_t4> pixelData;\n\n");
    wrapped.push_str(&format!("[numthreads({TILE_SIZE}, {TILE_SIZE}, 1)]\n"));
    wrapped.push_str(KERNEL);
    wrapped
}

/// Field order and types must match [`crate::ViewerConstants`].
const PRELUDE: &str = r"struct ShaderViewerConstants
{
    float time;
    int frame;
    uint pitch;
    float4 mouse;
    float3 res;
};

ConstantBuffer<ShaderViewerConstants, CDataLayout> shaderViewerConstants;

#define iResolution shaderViewerConstants.res
#define iFrame shaderViewerConstants.frame
#define iMouse shaderViewerConstants.mouse
#define iTime shaderViewerConstants.time
";

const KERNEL: &str = r"void renderRunner(uint3 dispatchThreadID : SV_DispatchThreadID)
{
    float4 color = float4(1);
    float2 p = float2(dispatchThreadID.xy) + float2(0.5);
    p.y = shaderViewerConstants.res.y - p.y;
    mainImage(color, p);

    uint i = dispatchThreadID.x + dispatchThreadID.y * shaderViewerConstants.pitch;
    pixelData[i] = uint8_t4(saturate(color) * 255);
}
";
