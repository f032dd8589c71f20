//! 2D textures decoded with `image` and uploaded through the device.
//!
//! Textures are shared as `Rc<Texture>`: a model that references one image
//! from several materials uploads it once.

use std::{
  fmt,
  path::{Path, PathBuf},
  rc::Rc,
};

use image::DynamicImage;
use log::{info, warn};
use thiserror::Error;

use super::device::{Device, SamplerSettings, TextureDesc, TextureFormat, TextureId};

#[derive(Debug, Error)]
pub enum TextureError {
  #[error("failed to decode texture {}: {source}", path.display())]
  Decode {
    path:   PathBuf,
    #[source]
    source: image::ImageError,
  },
  #[error("device rejected texture {}: {message}", path.display())]
  Device { path: PathBuf, message: String },
}

/// What a texture means to the lighting model. Decides its sampler uniform name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
  Diffuse,
  Specular,
  Normal,
  Height,
}

impl TextureKind {
  /// Every kind, in the order meshes bind them.
  pub const ALL: [TextureKind; 4] = [
    TextureKind::Diffuse,
    TextureKind::Specular,
    TextureKind::Normal,
    TextureKind::Height,
  ];

  /// Sampler base name, as in `material.diffuse1`.
  pub fn as_str(self) -> &'static str {
    match self {
      TextureKind::Diffuse => "diffuse",
      TextureKind::Specular => "specular",
      TextureKind::Normal => "normal",
      TextureKind::Height => "height",
    }
  }
}

impl fmt::Display for TextureKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Channel layout requested for the GPU copy of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
  /// Whatever the file holds: one channel stays gray, alpha is kept if present.
  #[default]
  Auto,
  Gray,
  Rgb,
  Rgba,
}

/// A GPU texture, deleted when the last `Rc` to it drops.
pub struct Texture {
  device: Rc<dyn Device>,
  id:     TextureId,
  kind:   TextureKind,
  path:   PathBuf,
  width:  u32,
  height: u32,
}

impl fmt::Debug for Texture {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Texture")
      .field("id", &self.id)
      .field("kind", &self.kind)
      .field("path", &self.path)
      .field("size", &(self.width, self.height))
      .finish()
  }
}

impl Texture {
  /// Decodes `path` and uploads it.
  ///
  /// # Parameters
  ///
  /// - `kind`: recorded on the texture, used by callers for logging and
  ///   placeholders.
  /// - `layout`: channel conversion before upload, [`ChannelLayout::Auto`]
  ///   keeps the file's own channels.
  /// - `sampler`: wrap, filter and mipmap settings.
  ///
  /// # Errors
  ///
  /// [`TextureError::Decode`] if the file is missing or not an image, and
  /// [`TextureError::Device`] if the upload fails.
  pub fn from_file(
    device: &Rc<dyn Device>,
    path: &Path,
    kind: TextureKind,
    layout: ChannelLayout,
    sampler: SamplerSettings,
  ) -> Result<Self, TextureError> {
    let image = image::open(path).map_err(|source| TextureError::Decode {
      path: path.to_path_buf(),
      source,
    })?;

    let texture = Self::from_image(device, image, path, kind, layout, sampler)?;
    info!(
      "Loaded {kind} texture {} ({}x{})",
      path.display(),
      texture.width,
      texture.height
    );
    Ok(texture)
  }

  /// Uploads an already decoded image. `path` is only used as its identity.
  pub fn from_image(
    device: &Rc<dyn Device>,
    image: DynamicImage,
    path: &Path,
    kind: TextureKind,
    layout: ChannelLayout,
    sampler: SamplerSettings,
  ) -> Result<Self, TextureError> {
    let (width, height) = (image.width(), image.height());
    let layout = match layout {
      ChannelLayout::Auto => match (image.color().channel_count(), image.color().has_alpha()) {
        (1, _) => ChannelLayout::Gray,
        (_, true) => ChannelLayout::Rgba,
        _ => ChannelLayout::Rgb,
      },
      explicit => explicit,
    };

    // The decoded image is dropped as soon as the upload returns.
    let (format, pixels) = match layout {
      ChannelLayout::Gray => (TextureFormat::R8, image.into_luma8().into_raw()),
      ChannelLayout::Rgb => (TextureFormat::Rgb8, image.into_rgb8().into_raw()),
      ChannelLayout::Rgba | ChannelLayout::Auto => {
        (TextureFormat::Rgba8, image.into_rgba8().into_raw())
      }
    };

    let desc = TextureDesc {
      width,
      height,
      format,
      sampler,
    };
    Self::create(device, &desc, Some(pixels.as_slice()), kind, path)
  }

  /// A 1x1 texture of a single colour, used in place of textures that failed to load.
  pub fn placeholder(
    device: &Rc<dyn Device>,
    kind: TextureKind,
    color: [u8; 4],
    path: &Path,
  ) -> Result<Self, TextureError> {
    let desc = TextureDesc {
      width:   1,
      height:  1,
      format:  TextureFormat::Rgba8,
      sampler: SamplerSettings::repeat(),
    };
    Self::create(device, &desc, Some(color.as_slice()), kind, path)
  }

  /// Uninitialised storage for render targets and depth maps.
  pub fn empty(
    device: &Rc<dyn Device>,
    width: u32,
    height: u32,
    format: TextureFormat,
    sampler: SamplerSettings,
  ) -> Result<Self, TextureError> {
    let desc = TextureDesc {
      width,
      height,
      format,
      sampler,
    };
    Self::create(device, &desc, None, TextureKind::Diffuse, Path::new(""))
  }

  fn create(
    device: &Rc<dyn Device>,
    desc: &TextureDesc,
    pixels: Option<&[u8]>,
    kind: TextureKind,
    path: &Path,
  ) -> Result<Self, TextureError> {
    let id = device
      .create_texture(desc, pixels)
      .map_err(|message| {
        warn!("Device rejected texture {}: {message}", path.display());
        TextureError::Device {
          path: path.to_path_buf(),
          message,
        }
      })?;

    Ok(Self {
      device: Rc::clone(device),
      id,
      kind,
      path: path.to_path_buf(),
      width: desc.width,
      height: desc.height,
    })
  }

  pub fn id(&self) -> TextureId {
    self.id
  }

  /// Kind the texture was loaded as. A mesh may bind it under another kind.
  pub fn kind(&self) -> TextureKind {
    self.kind
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn size(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  /// Binds to texture unit `unit`, which also becomes the active unit.
  ///
  /// The sampler uniform that reads it must be set to the same `unit`.
  pub fn bind(&self, unit: u32) {
    self.device.bind_texture(unit, Some(self.id));
  }
}

impl Drop for Texture {
  fn drop(&mut self) {
    self.device.delete_texture(self.id);
  }
}

#[cfg(test)]
mod tests {
  use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

  use super::*;
  use crate::render::recording::{Call, RecordingDevice, fixture_dir};

  fn device() -> (Rc<RecordingDevice>, Rc<dyn Device>) {
    let recording = Rc::new(RecordingDevice::new());
    let device: Rc<dyn Device> = recording.clone();
    (recording, device)
  }

  fn created_formats(recording: &RecordingDevice) -> Vec<(u32, u32, TextureFormat)> {
    recording
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        Call::CreateTexture(desc) => Some((desc.width, desc.height, desc.format)),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn auto_layout_follows_the_file() {
    let (recording, device) = device();
    let dir = fixture_dir("texture-auto");
    RgbImage::from_pixel(4, 2, Rgb([10, 20, 30]))
      .save(dir.join("rgb.png"))
      .unwrap();
    RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 4]))
      .save(dir.join("rgba.png"))
      .unwrap();
    GrayImage::from_pixel(5, 1, Luma([7]))
      .save(dir.join("gray.png"))
      .unwrap();

    for name in ["rgb.png", "rgba.png", "gray.png"] {
      Texture::from_file(
        &device,
        &dir.join(name),
        TextureKind::Diffuse,
        ChannelLayout::Auto,
        SamplerSettings::repeat(),
      )
      .unwrap();
    }

    assert_eq!(created_formats(&recording), vec![
      (4, 2, TextureFormat::Rgb8),
      (3, 3, TextureFormat::Rgba8),
      (5, 1, TextureFormat::R8),
    ]);
  }

  #[test]
  fn explicit_layout_converts_channels() {
    let (recording, device) = device();
    let dir = fixture_dir("texture-explicit");
    GrayImage::from_pixel(2, 2, Luma([200]))
      .save(dir.join("mask.png"))
      .unwrap();

    let texture = Texture::from_file(
      &device,
      &dir.join("mask.png"),
      TextureKind::Specular,
      ChannelLayout::Rgba,
      SamplerSettings::render_target(),
    )
    .unwrap();

    assert_eq!(texture.kind(), TextureKind::Specular);
    assert_eq!(texture.path(), dir.join("mask.png"));
    assert_eq!(created_formats(&recording), vec![(2, 2, TextureFormat::Rgba8)]);
  }

  #[test]
  fn undecodable_file_is_an_error() {
    let (recording, device) = device();
    let dir = fixture_dir("texture-bad");
    std::fs::write(dir.join("broken.png"), b"not a png").unwrap();

    let missing = Texture::from_file(
      &device,
      &dir.join("absent.png"),
      TextureKind::Diffuse,
      ChannelLayout::Auto,
      SamplerSettings::repeat(),
    );
    let broken = Texture::from_file(
      &device,
      &dir.join("broken.png"),
      TextureKind::Diffuse,
      ChannelLayout::Auto,
      SamplerSettings::repeat(),
    );

    assert!(matches!(missing, Err(TextureError::Decode { .. })));
    assert!(matches!(broken, Err(TextureError::Decode { .. })));
    assert_eq!(recording.textures_created(), 0);
  }

  #[test]
  fn placeholder_is_one_pixel_and_freed_with_last_reference() {
    let (recording, device) = device();

    let texture = Rc::new(
      Texture::placeholder(&device, TextureKind::Normal, [128, 128, 255, 255], Path::new("n.png"))
        .unwrap(),
    );
    let shared = Rc::clone(&texture);
    assert_eq!(texture.size(), (1, 1));

    drop(texture);
    assert_eq!(recording.live_textures(), 1);
    drop(shared);
    assert_eq!(recording.live_textures(), 0);
  }

  #[test]
  fn empty_texture_uploads_nothing() {
    let (recording, device) = device();

    let depth = Texture::empty(&device, 64, 64, TextureFormat::Depth, SamplerSettings::shadow_map())
      .unwrap();

    assert_eq!(depth.size(), (64, 64));
    assert_eq!(created_formats(&recording), vec![(64, 64, TextureFormat::Depth)]);
  }
}
