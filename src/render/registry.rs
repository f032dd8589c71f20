//! Keyed collections of shader programs built from a fixed manifest.

use std::{collections::HashMap, fmt::Debug, hash::Hash, path::Path, rc::Rc};

use log::{debug, error, info};
use thiserror::Error;

use super::{
  device::Device,
  shader::{Shader, ShaderError, ShaderSource},
};

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("shader key {key} is registered twice")]
  Duplicate { key: String },
  #[error("no shader registered under {key}")]
  NotFound { key: String },
  #[error("failed to build shader {key}: {source}")]
  Shader {
    key:    String,
    #[source]
    source: ShaderError,
  },
}

/// Shaders owned under typed keys.
///
/// Every entry is built up front by [`ShaderRegistry::from_manifest`]. Dropping
/// the registry (or calling [`ShaderRegistry::destroy`]) deletes every program.
pub struct ShaderRegistry<K> {
  order:   Vec<K>,
  shaders: HashMap<K, Shader>,
}

impl<K> ShaderRegistry<K>
where
  K: Copy + Eq + Hash + Debug,
{
  /// Compiles every entry of `manifest`, reading stage files from `root`.
  ///
  /// Keys are checked for duplicates before anything is compiled. If any entry
  /// fails, programs built so far are released and the error names the key.
  pub fn from_manifest(
    device: &Rc<dyn Device>,
    root: &Path,
    manifest: &[(K, ShaderSource)],
  ) -> Result<Self, RegistryError> {
    let mut order = Vec::with_capacity(manifest.len());
    for (key, _) in manifest {
      if order.contains(key) {
        error!("Shader key {key:?} appears twice in the manifest");
        return Err(RegistryError::Duplicate {
          key: format!("{key:?}"),
        });
      }
      order.push(*key);
    }

    let mut shaders = HashMap::with_capacity(manifest.len());
    for (key, source) in manifest {
      let geometry = source.geometry.map(|g| root.join(g));
      let shader = Shader::from_files(
        device,
        &root.join(source.vertex),
        &root.join(source.fragment),
        geometry.as_deref(),
      )
      .map_err(|source| RegistryError::Shader {
        key: format!("{key:?}"),
        source,
      })?;
      shaders.insert(*key, shader);
    }

    info!("Built {} shader programs from {}", shaders.len(), root.display());
    Ok(Self { order, shaders })
  }

  pub fn get(&self, key: K) -> Result<&Shader, RegistryError> {
    self.shaders.get(&key).ok_or_else(|| RegistryError::NotFound {
      key: format!("{key:?}"),
    })
  }

  pub fn len(&self) -> usize {
    self.shaders.len()
  }

  pub fn is_empty(&self) -> bool {
    self.shaders.is_empty()
  }

  /// Keys in manifest order.
  pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
    self.order.iter().copied()
  }

  pub fn destroy(self) {
    debug!("Releasing {} shader programs", self.shaders.len());
  }
}
