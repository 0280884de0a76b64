use super::RemapRules;
use crate::{
    common::*,
    engine::{StateDict, Stateful},
};

/// The outcome of loading named tensors into a [nn::VarStore].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Variables updated from the source.
    pub loaded: Vec<String>,
    /// Variables of the store absent from the source.
    pub missing: Vec<String>,
    /// Source entries with no matching variable.
    pub unexpected: Vec<String>,
}

impl LoadSummary {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Collects all variables of the store, sorted by name.
pub fn named_variables(vs: &nn::VarStore) -> Vec<(String, Tensor)> {
    vs.variables()
        .into_iter()
        .sorted_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs))
        .collect()
}

/// Copies named tensors into the variables of the store.
///
/// In strict mode the names must match the store exactly. Otherwise the
/// intersection is copied and a warning is emitted. Shape mismatches are
/// errors in both modes.
pub fn load_named_tensors(
    vs: &mut nn::VarStore,
    named: impl IntoIterator<Item = (String, Tensor)>,
    strict: bool,
) -> Result<LoadSummary> {
    let mut variables = vs.variables();
    let named: IndexMap<String, Tensor> = named.into_iter().collect();

    let missing: Vec<_> = variables
        .keys()
        .filter(|name| !named.contains_key(name.as_str()))
        .cloned()
        .sorted()
        .collect();
    let unexpected: Vec<_> = named
        .keys()
        .filter(|name| !variables.contains_key(name.as_str()))
        .cloned()
        .collect();

    if strict {
        ensure!(
            missing.is_empty() && unexpected.is_empty(),
            "weights do not match the network, missing keys: {:?}, unexpected keys: {:?}",
            missing,
            unexpected
        );
    } else if !missing.is_empty() || !unexpected.is_empty() {
        warn!("modules not matching, performing partial update");
    }

    let loaded = tch::no_grad(|| -> Result<_> {
        let mut loaded = vec![];

        for (name, value) in named {
            let var = match variables.get_mut(&name) {
                Some(var) => var,
                None => continue,
            };
            ensure!(
                var.size() == value.size(),
                "shape mismatch for '{}', expect {:?}, but get {:?}",
                name,
                var.size(),
                value.size()
            );
            var.f_copy_(&value)?;
            loaded.push(name);
        }

        Ok(loaded)
    })?;

    Ok(LoadSummary {
        loaded,
        missing,
        unexpected,
    })
}

/// Loads a weight file into the store.
///
/// Tensors are read to where they were saved and copied onto the devices of
/// the store variables.
pub fn load_weights(
    vs: &mut nn::VarStore,
    path: impl AsRef<Path>,
    strict: bool,
) -> Result<LoadSummary> {
    let path = path.as_ref();
    info!("loading weights from file [{}]", path.display());

    let named = Tensor::load_multi(path)
        .with_context(|| format!("failed to read weights file '{}'", path.display()))?;
    load_named_tensors(vs, named, strict)
        .with_context(|| format!("failed to load weights file '{}'", path.display()))
}

/// Saves the store variables to a weight file, optionally renamed by
/// `remap`. Variables matching no remap rule are not saved.
pub fn save_weights(
    vs: &nn::VarStore,
    path: impl AsRef<Path>,
    remap: Option<&RemapRules>,
) -> Result<()> {
    let path = path.as_ref();
    let variables = named_variables(vs);

    let (named, remapped): (Vec<_>, _) = match remap {
        Some(rules) => (rules.apply(variables).into_iter().collect(), " remapped"),
        None => (variables, ""),
    };

    Tensor::save_multi(&named, path)
        .with_context(|| format!("failed to write weights file '{}'", path.display()))?;
    info!("saved{} weights as {}", remapped, path.display());

    Ok(())
}

/// Moves every variable of the store onto `device`.
pub fn move_variables(vs: &nn::VarStore, device: Device) {
    tch::no_grad(|| {
        for (_, mut var) in vs.variables() {
            let moved = var.to_device(device);
            var.set_data(&moved);
        }
    });
}

impl Stateful for nn::VarStore {
    fn state_dict(&self) -> Result<StateDict> {
        let tensors = named_variables(self)
            .into_iter()
            .map(|(name, var)| (name, var.detach().copy()))
            .collect();
        Ok(StateDict::from_tensors(tensors))
    }

    fn load_state_dict(&mut self, state: StateDict) -> Result<()> {
        self.load_state_dict_strict(state, true)
    }

    fn load_state_dict_strict(&mut self, state: StateDict, strict: bool) -> Result<()> {
        load_named_tensors(self, state.tensors, strict)?;
        Ok(())
    }

    fn to_device(&mut self, device: Device) -> Result<()> {
        move_variables(self, device);
        Ok(())
    }
}
