use super::{load_weights, save_weights, LoadSummary, Network, RemapRules};
use crate::{
    common::*,
    engine::{StateDict, Stateful},
};

/// A network together with the variable store owning its parameters.
///
/// ```no_run
/// use lightnet::{models::Darknet19Init, network::Lightnet};
/// use tch::Device;
///
/// let net = Lightnet::new(Device::Cpu, |path| Darknet19Init::default().build(path))?;
/// net.save("darknet19.ot", None)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Lightnet<N> {
    vs: nn::VarStore,
    /// Where the variables live. The store keeps the device it was created
    /// on, so moves are tracked here.
    device: Device,
    network: N,
}

impl<N> Lightnet<N>
where
    N: Network,
{
    /// Builds the network under the root path of a new variable store.
    pub fn new<F>(device: Device, f: F) -> Result<Self>
    where
        F: FnOnce(&nn::Path) -> Result<N>,
    {
        let vs = nn::VarStore::new(device);
        let network = f(&vs.root())?;
        Ok(Self {
            vs,
            device,
            network,
        })
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    pub fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn stride(&self) -> usize {
        self.network.stride()
    }

    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        self.network.forward_t(xs, train)
    }

    /// Leaf layers of the network in declaration order.
    pub fn layer_loop(&self) -> Vec<&Layer> {
        self.network.layers().layer_loop()
    }

    /// Leaf layers paired with their names inside their direct parents.
    pub fn named_layer_loop(&self) -> Vec<(String, &Layer)> {
        self.network.layers().named_layer_loop()
    }

    /// Loads weights from a file. With `strict` unset, the file may contain
    /// only a part of the network weights.
    pub fn load(&mut self, path: impl AsRef<Path>, strict: bool) -> Result<LoadSummary> {
        load_weights(&mut self.vs, path, strict)
    }

    /// Saves the weights to a file. When `remap` is given, keys are renamed
    /// so another network can load them, and keys no rule matches are left
    /// out.
    pub fn save(&self, path: impl AsRef<Path>, remap: Option<&RemapRules>) -> Result<()> {
        save_weights(&self.vs, path, remap)
    }
}

impl<N> Debug for Lightnet<N>
where
    N: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lightnet")
            .field("device", &self.device)
            .field("network", &self.network)
            .finish()
    }
}

impl<N> Stateful for Lightnet<N>
where
    N: 'static + Network,
{
    fn state_dict(&self) -> Result<StateDict> {
        self.vs.state_dict()
    }

    fn load_state_dict(&mut self, state: StateDict) -> Result<()> {
        self.vs.load_state_dict(state)
    }

    fn load_state_dict_strict(&mut self, state: StateDict, strict: bool) -> Result<()> {
        self.vs.load_state_dict_strict(state, strict)
    }

    fn to_device(&mut self, device: Device) -> Result<()> {
        self.vs.to_device(device)?;
        self.device = device;
        Ok(())
    }
}
