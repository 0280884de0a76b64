use crate::common::*;

/// Named tensors and plain values describing the state of an object.
#[derive(Debug, Default)]
pub struct StateDict {
    pub tensors: IndexMap<String, Tensor>,
    pub values: IndexMap<String, serde_json::Value>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tensors(tensors: IndexMap<String, Tensor>) -> Self {
        Self {
            tensors,
            values: IndexMap::new(),
        }
    }

    pub fn from_values(values: IndexMap<String, serde_json::Value>) -> Self {
        Self {
            tensors: IndexMap::new(),
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty() && self.values.is_empty()
    }

    /// Deserializes the value stored under `key`.
    pub fn value<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| format_err!("state entry '{}' not found", key))?;
        let value = serde_json::from_value(value.clone())
            .with_context(|| format!("state entry '{}' has unexpected type", key))?;
        Ok(value)
    }

    /// A copy sharing the tensor storage.
    pub fn shallow_clone(&self) -> Self {
        Self {
            tensors: self
                .tensors
                .iter()
                .map(|(key, tensor)| (key.clone(), tensor.shallow_clone()))
                .collect(),
            values: self.values.clone(),
        }
    }
}

/// Upcast helper for downcasting boxed trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> AsAny for T
where
    T: Any,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Objects whose state can be extracted into and restored from a
/// [StateDict], such as networks and schedulers.
pub trait Stateful
where
    Self: AsAny + Send,
{
    fn state_dict(&self) -> Result<StateDict>;

    fn load_state_dict(&mut self, state: StateDict) -> Result<()>;

    /// Restores the state with a strictness flag. Objects that have no
    /// notion of strictness keep this default, which ignores the flag.
    fn load_state_dict_strict(&mut self, state: StateDict, strict: bool) -> Result<()> {
        let _ = strict;
        self.load_state_dict(state)
    }

    fn to_device(&mut self, _device: Device) -> Result<()> {
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// A restored state that has no owner yet. It is kept as is until the
/// caller claims it.
impl Stateful for StateDict {
    fn state_dict(&self) -> Result<StateDict> {
        Ok(self.shallow_clone())
    }

    fn load_state_dict(&mut self, state: StateDict) -> Result<()> {
        *self = state;
        Ok(())
    }

    fn to_device(&mut self, device: Device) -> Result<()> {
        self.tensors
            .values_mut()
            .for_each(|tensor| *tensor = tensor.to_device(device));
        Ok(())
    }
}
