//! Type conversions between Lumina types and wgpu types.

use crate::graph::{LoadOp, StoreOp};
use crate::types::{
    AddressMode, ClearValue, CompareFunction, FilterMode, TextureDimension, TextureFormat,
    TextureUsage,
};

/// Convert TextureFormat to wgpu format.
///
/// wgpu has no three-channel half-float format, so `Rgb16Float` is stored
/// as `Rgba16Float`.
pub fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::Rg16Float => wgpu::TextureFormat::Rg16Float,
        TextureFormat::Rgb16Float | TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        TextureFormat::Depth24Plus => wgpu::TextureFormat::Depth24Plus,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
    }
}

/// Convert a surface format back, if it is one the renderer can target.
pub fn surface_format(format: wgpu::TextureFormat) -> Option<TextureFormat> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some(TextureFormat::Rgba8Unorm),
        wgpu::TextureFormat::Rgba8UnormSrgb => Some(TextureFormat::Rgba8UnormSrgb),
        wgpu::TextureFormat::Bgra8Unorm => Some(TextureFormat::Bgra8Unorm),
        wgpu::TextureFormat::Bgra8UnormSrgb => Some(TextureFormat::Bgra8UnormSrgb),
        wgpu::TextureFormat::Rgba16Float => Some(TextureFormat::Rgba16Float),
        _ => None,
    }
}

/// Convert TextureUsage flags to wgpu texture usages.
pub fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut result = wgpu::TextureUsages::empty();

    if usage.contains(TextureUsage::COPY_SRC) {
        result |= wgpu::TextureUsages::COPY_SRC;
    }
    if usage.contains(TextureUsage::COPY_DST) {
        result |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        result |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
        result |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }

    result
}

/// View dimension used when sampling a texture.
pub fn convert_view_dimension(dimension: TextureDimension) -> wgpu::TextureViewDimension {
    match dimension {
        TextureDimension::D2 => wgpu::TextureViewDimension::D2,
        TextureDimension::Cube => wgpu::TextureViewDimension::Cube,
    }
}

/// Convert AddressMode to wgpu address mode.
pub fn convert_address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Convert FilterMode to wgpu filter mode.
pub fn convert_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

/// Convert FilterMode to wgpu mipmap filter mode.
pub fn convert_mipmap_filter_mode(mode: FilterMode) -> wgpu::MipmapFilterMode {
    match mode {
        FilterMode::Nearest => wgpu::MipmapFilterMode::Nearest,
        FilterMode::Linear => wgpu::MipmapFilterMode::Linear,
    }
}

/// Convert CompareFunction to wgpu compare function.
pub fn convert_compare_function(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

/// Convert LoadOp to wgpu load op for color attachments.
pub fn convert_load_op(op: &LoadOp) -> wgpu::LoadOp<wgpu::Color> {
    match op {
        LoadOp::Load | LoadOp::DontCare => wgpu::LoadOp::Load,
        LoadOp::Clear(ClearValue::Color { r, g, b, a }) => wgpu::LoadOp::Clear(wgpu::Color {
            r: *r as f64,
            g: *g as f64,
            b: *b as f64,
            a: *a as f64,
        }),
        LoadOp::Clear(_) => wgpu::LoadOp::Load,
    }
}

/// Convert LoadOp to wgpu load op for depth attachments.
pub fn convert_depth_load_op(op: &LoadOp) -> wgpu::LoadOp<f32> {
    match op {
        LoadOp::Load | LoadOp::DontCare => wgpu::LoadOp::Load,
        LoadOp::Clear(ClearValue::Depth(depth)) => wgpu::LoadOp::Clear(*depth),
        LoadOp::Clear(_) => wgpu::LoadOp::Load,
    }
}

/// Convert StoreOp to wgpu store op.
pub fn convert_store_op(op: &StoreOp) -> wgpu::StoreOp {
    match op {
        StoreOp::Store => wgpu::StoreOp::Store,
        StoreOp::DontCare => wgpu::StoreOp::Discard,
    }
}
