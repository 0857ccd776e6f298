/// Picks the surface format: first sRGB format when preferred and
/// available, otherwise the surface's own first choice.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb
        && let Some(format) = caps.formats.iter().copied().find(|f| f.is_srgb())
    {
        return Some(format);
    }
    caps.formats.first().copied()
}

/// Honors the requested alpha mode when the surface supports it; falls
/// back to the surface's first supported mode.
pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|mode| caps.alpha_modes.contains(mode))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
