use super::StateDict;
use crate::common::*;

/// Key of the JSON manifest inside a checkpoint archive.
pub const MANIFEST_KEY: &str = "__manifest__";

/// The content of a checkpoint file.
///
/// It is written as a tensor archive. Each state tensor is stored under
/// `<entry>.<key>` and everything else goes into a JSON manifest saved as a
/// byte tensor under [MANIFEST_KEY].
#[derive(Debug, Default)]
pub struct Checkpoint {
    pub values: IndexMap<String, serde_json::Value>,
    pub states: IndexMap<String, StateDict>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    values: IndexMap<String, serde_json::Value>,
    states: IndexMap<String, StateManifest>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateManifest {
    tensors: Vec<String>,
    values: IndexMap<String, serde_json::Value>,
}

impl Checkpoint {
    pub fn save(self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let Self { values, states } = self;

        let mut named = vec![];
        let states: IndexMap<_, _> = states
            .into_iter()
            .map(|(name, state)| {
                let StateDict { tensors, values } = state;
                let keys: Vec<_> = tensors.keys().cloned().collect();
                named.extend(
                    tensors
                        .into_iter()
                        .map(|(key, tensor)| (format!("{}.{}", name, key), tensor)),
                );
                (
                    name,
                    StateManifest {
                        tensors: keys,
                        values,
                    },
                )
            })
            .collect();

        let manifest = serde_json::to_vec(&Manifest { values, states })?;
        named.push((MANIFEST_KEY.to_owned(), Tensor::of_slice(&manifest)));

        Tensor::save_multi(&named, path)
            .with_context(|| format!("failed to write checkpoint file '{}'", path.display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut named: IndexMap<String, Tensor> = Tensor::load_multi(path)
            .with_context(|| format!("failed to read checkpoint file '{}'", path.display()))?
            .into_iter()
            .collect();

        let manifest: Manifest = {
            let tensor = named.remove(MANIFEST_KEY).ok_or_else(|| {
                format_err!("'{}' is not a checkpoint file, manifest missing", path.display())
            })?;
            ensure!(tensor.kind() == Kind::Uint8, "invalid manifest tensor kind");
            let numel = tensor.numel();
            let mut bytes = vec![0u8; numel];
            tensor.copy_data(&mut bytes, numel);
            serde_json::from_slice(&bytes).context("failed to parse checkpoint manifest")?
        };

        let Manifest { values, states } = manifest;
        let states: IndexMap<_, _> = states
            .into_iter()
            .map(|(name, state)| -> Result<_> {
                let StateManifest { tensors, values } = state;
                let tensors: IndexMap<_, _> = tensors
                    .into_iter()
                    .map(|key| -> Result<_> {
                        let tensor = named
                            .remove(&format!("{}.{}", name, key))
                            .ok_or_else(|| {
                                format_err!("tensor '{}' of state '{}' is missing", key, name)
                            })?;
                        Ok((key, tensor))
                    })
                    .try_collect()?;
                Ok((name, StateDict { tensors, values }))
            })
            .try_collect()?;

        if !named.is_empty() {
            warn!(
                "ignore {} unreferenced tensors in checkpoint file '{}'",
                named.len(),
                path.display()
            );
        }

        Ok(Self { values, states })
    }
}
