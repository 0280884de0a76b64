use super::{Checkpoint, StateDict, Stateful};
use crate::common::*;
use serde_json::Value;

/// A value held by [HyperParameters].
pub enum Param {
    /// A plain value, serialized as is.
    Value(Value),
    /// An object serialized through its [Stateful] hooks.
    State(Box<dyn Stateful>),
}

impl Debug for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "Value({})", value),
            Self::State(state) => write!(f, "State({})", state.type_name()),
        }
    }
}

#[derive(Debug)]
struct Entry {
    param: Param,
    serialize: bool,
}

/// Container of training hyperparameters and progress counters.
///
/// It saves the state of a training run and restores it at a later stage.
/// The `batch` and `epoch` counters are initialized to zero.
///
/// Names prefixed with `_` are stored without the prefix and excluded from
/// serialization, so every parameter can be kept here regardless of whether
/// it belongs in a checkpoint.
///
/// ```
/// use lightnet::engine::HyperParameters;
///
/// let mut params = HyperParameters::new();
/// params.set("_dummy", 666)?;
/// assert_eq!(params.get::<i32>("dummy")?, 666);
/// assert_eq!(params.is_serialized("dummy"), Some(false));
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct HyperParameters {
    entries: IndexMap<String, Entry>,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperParameters {
    pub const BATCH: &'static str = "batch";
    pub const EPOCH: &'static str = "epoch";

    pub fn new() -> Self {
        let mut entries = IndexMap::new();
        for name in [Self::BATCH, Self::EPOCH] {
            entries.insert(
                name.to_owned(),
                Entry {
                    param: Param::Value(Value::from(0usize)),
                    serialize: true,
                },
            );
        }
        Self { entries }
    }

    /// Creates a container initialized with `values`.
    ///
    /// Names colliding with existing parameters are reported and skipped.
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut params = Self::new();

        for (key, value) in values {
            let (name, serialize) = split_name(key.as_ref());

            if params.entries.contains_key(name) {
                error!(
                    "{} attribute already exists as a hyperparameter and will not be overwritten",
                    name
                );
                continue;
            }

            params.entries.insert(
                name.to_owned(),
                Entry {
                    param: Param::Value(value),
                    serialize,
                },
            );
        }

        params
    }

    /// Creates a container from a variable in a JSON5 configuration file.
    ///
    /// The top-level entry `variable` must be an object. Its fields, merged
    /// with `overrides`, become the parameters.
    pub fn from_file<I, K>(path: impl AsRef<Path>, variable: &str, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file [{}]", path.display()))?;
        let config: Value = json5::from_str(&text).with_context(|| {
            format!(
                "failed to parse the file [{}], is it a valid JSON5 file?",
                path.display()
            )
        })?;

        let params = config.get(variable).ok_or_else(|| {
            format_err!(
                "configuration variable [{}] not found in file [{}]",
                variable,
                path.display()
            )
        })?;
        let mut values = match params {
            Value::Object(map) => map.clone(),
            other => bail!(
                "unknown type for configuration variable {} [{}], this variable should be an object",
                variable,
                value_kind(other)
            ),
        };
        values.extend(overrides.into_iter().map(|(key, value)| (key.into(), value)));

        Ok(Self::from_values(values))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether the parameter is written to checkpoints, or `None` if it
    /// does not exist.
    pub fn is_serialized(&self, name: &str) -> Option<bool> {
        Some(self.entries.get(name)?.serialize)
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        Some(&self.entries.get(name)?.param)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.param(name)? {
            Param::Value(value) => Some(value),
            Param::State(_) => None,
        }
    }

    /// Deserializes the plain value stored under `name`.
    pub fn get<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = match self.param(name) {
            Some(Param::Value(value)) => value.clone(),
            Some(Param::State(_)) => bail!("hyperparameter '{}' is not a plain value", name),
            None => bail!("hyperparameter '{}' not found", name),
        };
        let value = serde_json::from_value(value)
            .with_context(|| format!("hyperparameter '{}' has unexpected type", name))?;
        Ok(value)
    }

    pub fn state<T>(&self, name: &str) -> Option<&T>
    where
        T: Stateful,
    {
        match self.param(name)? {
            Param::State(state) => (**state).as_any().downcast_ref(),
            Param::Value(_) => None,
        }
    }

    pub fn state_mut<T>(&mut self, name: &str) -> Option<&mut T>
    where
        T: Stateful,
    {
        match &mut self.entries.get_mut(name)?.param {
            Param::State(state) => (**state).as_any_mut().downcast_mut(),
            Param::Value(_) => None,
        }
    }

    /// Stores a plain value. See [HyperParameters::set_param].
    pub fn set<T>(&mut self, name: &str, value: T) -> Result<()>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value)
            .with_context(|| format!("failed to serialize hyperparameter '{}'", name))?;
        self.set_param(name, Param::Value(value))
    }

    /// Stores an object saved through its [Stateful] hooks.
    pub fn set_state<S>(&mut self, name: &str, state: S) -> Result<()>
    where
        S: Stateful,
    {
        self.set_param(name, Param::State(Box::new(state)))
    }

    /// Stores a parameter.
    ///
    /// An existing parameter is overwritten and keeps its serialization
    /// flag. A new name prefixed with `_` is stored without the prefix and
    /// is not serialized. It fails if the unprefixed name already exists.
    pub fn set_param(&mut self, name: &str, param: Param) -> Result<()> {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.param = param;
            return Ok(());
        }

        let (stripped, serialize) = split_name(name);
        ensure!(
            serialize || !self.entries.contains_key(stripped),
            "{} already stored in this object, use {} to access and modify it",
            name,
            stripped
        );
        self.entries
            .insert(stripped.to_owned(), Entry { param, serialize });

        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Param> {
        self.entries.shift_remove(name).map(|entry| entry.param)
    }

    /// Number of processed batches.
    pub fn batch(&self) -> usize {
        self.counter(Self::BATCH)
    }

    /// Number of processed epochs.
    pub fn epoch(&self) -> usize {
        self.counter(Self::EPOCH)
    }

    pub fn set_batch(&mut self, batch: usize) {
        self.set_counter(Self::BATCH, batch);
    }

    pub fn set_epoch(&mut self, epoch: usize) {
        self.set_counter(Self::EPOCH, epoch);
    }

    pub fn increment_batch(&mut self) -> usize {
        let batch = self.batch() + 1;
        self.set_batch(batch);
        batch
    }

    pub fn increment_epoch(&mut self) -> usize {
        let epoch = self.epoch() + 1;
        self.set_epoch(epoch);
        epoch
    }

    fn counter(&self, name: &str) -> usize {
        self.value(name)
            .and_then(Value::as_u64)
            .map(|count| count as usize)
            .unwrap_or(0)
    }

    fn set_counter(&mut self, name: &str, count: usize) {
        let param = Param::Value(Value::from(count));
        match self.entries.get_mut(name) {
            Some(entry) => entry.param = param,
            None => {
                self.entries.insert(
                    name.to_owned(),
                    Entry {
                        param,
                        serialize: true,
                    },
                );
            }
        }
    }

    /// Serializes all parameters not marked as excluded to a checkpoint
    /// file. Stateful objects are saved through [Stateful::state_dict].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut checkpoint = Checkpoint::default();

        for (name, entry) in &self.entries {
            if !entry.serialize {
                continue;
            }

            match &entry.param {
                Param::Value(value) => {
                    checkpoint.values.insert(name.clone(), value.clone());
                }
                Param::State(state) => {
                    let state = state
                        .state_dict()
                        .with_context(|| format!("failed to extract state of '{}'", name))?;
                    checkpoint.states.insert(name.clone(), state);
                }
            }
        }

        checkpoint.save(path)?;
        info!("saved hyperparameters as {}", path.display());
        Ok(())
    }

    /// Restores parameters from a checkpoint file.
    ///
    /// Saved states are restored into the matching stateful objects through
    /// [Stateful::load_state_dict_strict]. Plain values are assigned. Saved
    /// entries without counterpart are added, and parameters absent from the
    /// file are kept with a warning.
    pub fn load(&mut self, path: impl AsRef<Path>, strict: bool) -> Result<()> {
        let path = path.as_ref();
        info!("loading state from file [{}]", path.display());

        let Checkpoint { values, states } = Checkpoint::load(path)?;

        let absent: Vec<_> = self
            .entries
            .iter()
            .filter(|(name, entry)| {
                entry.serialize
                    && !values.contains_key(name.as_str())
                    && !states.contains_key(name.as_str())
            })
            .map(|(name, _)| name.clone())
            .collect();
        if !absent.is_empty() {
            warn!(
                "hyperparameters {:?} are missing in the checkpoint, keeping current values",
                absent
            );
        }

        for (name, value) in values {
            match self.entries.get_mut(&name) {
                Some(entry) => {
                    if let Param::State(state) = &entry.param {
                        warn!(
                            "'{}' holds a {}, but the checkpoint stores a plain value, overwriting it",
                            name,
                            state.type_name()
                        );
                    }
                    entry.param = Param::Value(value);
                }
                None => {
                    self.entries.insert(
                        name,
                        Entry {
                            param: Param::Value(value),
                            serialize: true,
                        },
                    );
                }
            }
        }

        for (name, state) in states {
            match self.entries.get_mut(&name) {
                Some(Entry {
                    param: Param::State(current),
                    ..
                }) => {
                    current
                        .load_state_dict_strict(state, strict)
                        .with_context(|| format!("failed to restore state of '{}'", name))?;
                }
                Some(entry) => {
                    warn!(
                        "'{}' is a plain value, but the checkpoint stores a state, overwriting it",
                        name
                    );
                    entry.param = Param::State(Box::new(state));
                }
                None => {
                    self.entries.insert(
                        name,
                        Entry {
                            param: Param::State(Box::new(state)),
                            serialize: true,
                        },
                    );
                }
            }
        }

        Ok(())
    }

    /// Moves all stateful objects to `device`.
    pub fn to_device(&mut self, device: Device) -> Result<()> {
        for (name, entry) in &mut self.entries {
            if let Param::State(state) = &mut entry.param {
                state
                    .to_device(device)
                    .with_context(|| format!("failed to move '{}' to {:?}", name, device))?;
            }
        }
        Ok(())
    }

    /// Takes a restored state that no object claimed yet.
    pub fn take_state_dict(&mut self, name: &str) -> Option<StateDict> {
        let is_state_dict = self.state::<StateDict>(name).is_some();
        if !is_state_dict {
            return None;
        }
        match self.remove(name)? {
            Param::State(state) => state
                .into_any()
                .downcast::<StateDict>()
                .ok()
                .map(|state| *state),
            Param::Value(_) => None,
        }
    }
}

impl Display for HyperParameters {
    /// Prints all values. Parameters excluded from serialization are marked
    /// with an asterisk.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HyperParameters(")?;
        for (name, entry) in self.entries.iter().sorted_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs)) {
            let mark = if entry.serialize { "" } else { "*" };
            match &entry.param {
                Param::Value(value) => write!(f, "\n  {}{} = {}", name, mark, value)?,
                Param::State(state) => write!(f, "\n  {}{} = {}", name, mark, state.type_name())?,
            }
        }
        write!(f, "\n)")
    }
}

fn split_name(name: &str) -> (&str, bool) {
    match name.strip_prefix('_') {
        Some(stripped) => (stripped, false),
        None => (name, true),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LrSchedule, LrScheduler};
    use serde_json::json;

    #[test]
    fn counters_start_from_zero() {
        let mut params = HyperParameters::new();
        assert_eq!(params.batch(), 0);
        assert_eq!(params.epoch(), 0);
        assert_eq!(params.increment_batch(), 1);
        params.set_epoch(3);
        assert_eq!(params.epoch(), 3);
    }

    #[test]
    fn underscore_prefix_excludes_serialization() -> Result<()> {
        let mut params = HyperParameters::from_values(vec![
            ("lr", json!(0.1)),
            ("_device", json!("cuda")),
            ("batch", json!(12)),
        ]);
        assert_eq!(params.is_serialized("lr"), Some(true));
        assert_eq!(params.is_serialized("device"), Some(false));
        assert!(!params.contains("_device"));
        // colliding keys are skipped
        assert_eq!(params.batch(), 0);

        params.set("device", "cpu")?;
        assert_eq!(params.is_serialized("device"), Some(false));
        assert!(params.set("_lr", 0.5).is_err());
        assert_eq!(params.get::<f64>("lr")?, 0.1);
        Ok(())
    }

    #[test]
    fn save_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("params.state");
        let schedule = LrSchedule::Constant { lr: r64(0.01) };

        let mut params = HyperParameters::from_values(vec![
            ("lr", json!(0.01)),
            ("_workers", json!(8)),
        ]);
        let mut scheduler = LrScheduler::new(&schedule, None)?;
        (0..5).for_each(|_| {
            scheduler.next();
        });
        params.set_state("scheduler", scheduler)?;
        params.set_batch(5);
        params.save(&path)?;

        let mut restored = HyperParameters::new();
        restored.set("lr", 1.0)?;
        restored.set_state("scheduler", LrScheduler::new(&schedule, None)?)?;
        restored.load(&path, true)?;

        assert_eq!(restored.batch(), 5);
        assert_eq!(restored.get::<f64>("lr")?, 0.01);
        assert!(!restored.contains("workers"));
        let scheduler = restored
            .state::<LrScheduler>("scheduler")
            .expect("scheduler should be restored");
        assert_eq!(scheduler.step(), 5);
        Ok(())
    }

    #[test]
    fn unclaimed_states_are_kept() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("params.state");

        let mut params = HyperParameters::new();
        params.set_state(
            "extra",
            StateDict::from_tensors(IndexMap::from_iter([(
                "weight".to_owned(),
                Tensor::of_slice(&[1f32, 2.0, 3.0]),
            )])),
        )?;
        params.save(&path)?;

        let mut restored = HyperParameters::new();
        restored.load(&path, false)?;
        let state = restored
            .take_state_dict("extra")
            .expect("state should be kept");
        assert_eq!(Vec::<f32>::from(&state.tensors["weight"]), [1.0, 2.0, 3.0]);
        assert!(!restored.contains("extra"));
        Ok(())
    }

    #[test]
    fn load_from_config_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json5");
        fs::write(
            &path,
            r#"{
                // training parameters
                params: { lr: 0.001, _max_batches: 100, },
            }"#,
        )?;

        let params =
            HyperParameters::from_file(&path, "params", vec![("lr", json!(0.01))])?;
        assert_eq!(params.get::<f64>("lr")?, 0.01);
        assert_eq!(params.get::<usize>("max_batches")?, 100);
        assert_eq!(params.is_serialized("max_batches"), Some(false));

        let err = HyperParameters::from_file(&path, "missing", Vec::<(String, Value)>::new())
            .unwrap_err();
        assert!(err.to_string().contains("[missing] not found"));
        Ok(())
    }

    #[test]
    fn config_variable_must_be_an_object() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json5");
        fs::write(&path, r#"{ params: [0.001, 100], lr: 0.1 }"#)?;

        for variable in ["params", "lr"] {
            let err = HyperParameters::from_file(&path, variable, Vec::<(String, Value)>::new())
                .unwrap_err();
            assert!(err.to_string().contains("should be an object"), "{}", err);
        }
        Ok(())
    }

    #[test]
    fn params_missing_in_checkpoint_are_kept() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("params.state");
        let schedule = LrSchedule::Constant { lr: r64(0.01) };

        let mut params = HyperParameters::from_values(vec![("lr", json!(0.01))]);
        params.set_batch(9);
        params.save(&path)?;

        let mut restored = HyperParameters::from_values(vec![
            ("lr", json!(1.0)),
            ("momentum", json!(0.9)),
        ]);
        restored.set_state("scheduler", LrScheduler::new(&schedule, 3)?)?;
        restored.load(&path, true)?;

        assert_eq!(restored.batch(), 9);
        assert_eq!(restored.get::<f64>("lr")?, 0.01);
        assert_eq!(restored.get::<f64>("momentum")?, 0.9);
        let scheduler = restored
            .state::<LrScheduler>("scheduler")
            .expect("scheduler should be kept");
        assert_eq!(scheduler.step(), 3);
        Ok(())
    }

    #[test]
    fn display_marks_excluded_params() -> Result<()> {
        let mut params = HyperParameters::new();
        params.set("_seed", 7)?;
        let text = params.to_string();
        assert!(text.contains("seed* = 7"));
        assert!(text.contains("batch = 0"));
        let batch = text.find("batch").unwrap();
        let seed = text.find("seed").unwrap();
        assert!(batch < seed);
        Ok(())
    }
}
