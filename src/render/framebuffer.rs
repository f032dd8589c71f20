//! Off-screen render targets.
//!
//! A [`Framebuffer`] owns its attachments: colour and depth textures that later
//! passes sample, plus write-only renderbuffers. Everything is released on drop.

use std::rc::Rc;

use log::{debug, error};
use thiserror::Error;

use super::{
  device::{
    Attachment,
    Device,
    FramebufferId,
    FramebufferStatus,
    RenderbufferId,
    SamplerSettings,
    TextureFormat,
  },
  texture::{Texture, TextureError},
};

#[derive(Debug, Error)]
pub enum FramebufferError {
  #[error("framebuffer is incomplete (status {status:#06x})")]
  Incomplete { status: u32 },
  #[error("device failed to create framebuffer: {0}")]
  Device(String),
  #[error(transparent)]
  Texture(#[from] TextureError),
}

/// One attachment requested from [`Framebuffer::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAttachment {
  /// Sampleable colour texture, attached at the next free colour slot.
  Color(TextureFormat),
  /// Sampleable depth texture, e.g. a shadow map.
  DepthTexture,
  /// Write-only depth+stencil storage.
  DepthStencilBuffer,
}

/// A complete framebuffer and the attachments it was created with.
pub struct Framebuffer {
  device:         Rc<dyn Device>,
  id:             FramebufferId,
  width:          u32,
  height:         u32,
  color_textures: Vec<Texture>,
  depth_texture:  Option<Texture>,
  renderbuffers:  Vec<RenderbufferId>,
}

impl Framebuffer {
  /// Creates the attachments and checks completeness.
  ///
  /// # Parameters
  ///
  /// - `width`, `height`: size of every attachment.
  /// - `attachments`: created in order; colour textures take slots 0, 1, ...
  ///   and fragment output `n` writes slot `n`.
  ///
  /// # Errors
  ///
  /// [`FramebufferError::Incomplete`] when the driver rejects the combination.
  /// Attachments created so far are released.
  pub fn new(
    device: &Rc<dyn Device>,
    width: u32,
    height: u32,
    attachments: &[TargetAttachment],
  ) -> Result<Self, FramebufferError> {
    let id = device.create_framebuffer().map_err(FramebufferError::Device)?;
    // Owned from here on, so early returns release whatever was created.
    let mut framebuffer = Self {
      device: Rc::clone(device),
      id,
      width,
      height,
      color_textures: Vec::new(),
      depth_texture: None,
      renderbuffers: Vec::new(),
    };

    for &attachment in attachments {
      match attachment {
        TargetAttachment::Color(format) => {
          let texture = Texture::empty(device, width, height, format, SamplerSettings::render_target())?;
          let slot = framebuffer.color_textures.len() as u32;
          device.attach_texture(id, Attachment::Color(slot), texture.id());
          framebuffer.color_textures.push(texture);
        }
        TargetAttachment::DepthTexture => {
          let texture = Texture::empty(
            device,
            width,
            height,
            TextureFormat::Depth,
            SamplerSettings::shadow_map(),
          )?;
          device.attach_texture(id, Attachment::Depth, texture.id());
          framebuffer.depth_texture = Some(texture);
        }
        TargetAttachment::DepthStencilBuffer => {
          let renderbuffer = device
            .attach_renderbuffer(id, Attachment::DepthStencil, width, height)
            .map_err(FramebufferError::Device)?;
          framebuffer.renderbuffers.push(renderbuffer);
        }
      }
    }

    // The default draw buffer only covers colour attachment 0.
    let color_count = framebuffer.color_textures.len() as u32;
    if color_count != 1 {
      device.draw_buffers(id, color_count);
    }

    match device.framebuffer_status(id) {
      FramebufferStatus::Complete => {
        debug!("Created {width}x{height} framebuffer {id:?} with {attachments:?}");
        Ok(framebuffer)
      }
      FramebufferStatus::Incomplete(status) => {
        error!("Framebuffer {id:?} is incomplete: status {status:#06x}");
        Err(FramebufferError::Incomplete { status })
      }
    }
  }

  /// Binds for drawing and sets the viewport to cover the whole target.
  pub fn bind(&self) {
    self.device.bind_framebuffer(Some(self.id));
    self.device.viewport(0, 0, self.width, self.height);
  }

  /// Rebinds the window framebuffer. The caller restores its own viewport.
  pub fn unbind(&self) {
    self.device.bind_framebuffer(None);
  }

  pub fn size(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  /// Colour attachment `slot`, in the order they were requested.
  pub fn color_texture(&self, slot: usize) -> Option<&Texture> {
    self.color_textures.get(slot)
  }

  pub fn depth_texture(&self) -> Option<&Texture> {
    self.depth_texture.as_ref()
  }
}

impl Drop for Framebuffer {
  fn drop(&mut self) {
    for renderbuffer in self.renderbuffers.drain(..) {
      self.device.delete_renderbuffer(renderbuffer);
    }
    self.device.delete_framebuffer(self.id);
  }
}
