//! Asset loading and per-device texture utilities.
//!
//! Loading happens off the GPU path: bytes are fetched (filesystem on native,
//! HTTP on wasm) and decoded before any GPU resource is touched. The only
//! asset this renderer loads is the block texture atlas.

use anyhow::{Context as _, Result};

use crate::data_structures::texture::Texture;
use crate::resources::texture_util::TextureUtil;

pub mod texture_util;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let window = web_sys::window().context("no window object")?;
    let location = window.location();
    let origin = location
        .origin()
        .map_err(|_| anyhow::anyhow!("no origin for asset url"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Fetch the raw bytes of an asset relative to the `assets/` root.
pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        std::fs::read(&path).with_context(|| format!("reading asset {}", path.display()))?
    };

    Ok(data)
}

/// Load and decode the texture atlas, then upload it with a full mip chain.
///
/// The returned texture is immutable after this resolves; until then the
/// owning [`TextureSlot`](crate::data_structures::texture::TextureSlot)
/// stays pending and dependent passes skip their draws.
pub async fn load_texture_atlas(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    util: &TextureUtil,
) -> Result<Texture> {
    let bytes = load_binary(file_name).await?;
    let img = image::load_from_memory(&bytes)
        .with_context(|| format!("decoding atlas image {file_name}"))?;
    log::info!(
        "atlas {file_name} decoded: {}x{}",
        img.width(),
        img.height()
    );
    Texture::from_image(device, queue, util, &img, file_name)
}
