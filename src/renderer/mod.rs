//! GPU data contract
//!
//! The tunnel is drawn by an external renderer. This module packs what the
//! tunnel shader reads each frame into plain-old-data buffers: a small
//! uniform block and the hazard field as an RGBA8 strip texture.

pub mod uniforms;

pub use uniforms::{FieldTexture, TunnelUniforms};
