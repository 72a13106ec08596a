//! The render passes of the deferred pipeline.
//!
//! Each module owns one pass: its pipeline, its render targets and every
//! bind group that references another pass's output. WGSL sources live next
//! to their pass module and are compiled in with `include_str!`.
//!
//! - `gbuffer` rasterizes chunk geometry into colour/position/normal/depth
//! - `ssao` estimates and blurs screen-space ambient occlusion
//! - `forward` shades the geometry with atlas, light and occlusion
//! - `sky` fills the background behind untouched pixels
//! - `present` blits the composited image to the surface
//!
//! All targets are recreated by `resize`, which also rebuilds the dependent
//! bind groups atomically so no pass ever samples a stale view.

pub mod forward;
pub mod gbuffer;
pub mod present;
pub mod sky;
pub mod ssao;
