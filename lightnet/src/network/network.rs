use crate::common::*;

static LIST_FORWARD_WARN: Once = Once::new();

/// The common interface of all network architectures.
///
/// Implementors only declare their layer tree. Networks whose data flow is
/// not a plain chain override [Network::forward_t].
pub trait Network
where
    Self: Debug + Send,
{
    /// The root of the layer tree.
    fn layers(&self) -> &Layer;

    /// Subsampling factor of the network. Input dimensions should be a
    /// multiple of this number.
    fn stride(&self) -> usize;

    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        default_forward(self.layers(), xs, train)
    }
}

/// Runs a layer tree in its declared order.
///
/// A [Sequential] root runs as is. A [LayerList] root has no wiring of its
/// own, so its children are chained one after another.
pub fn default_forward(layers: &Layer, xs: &Tensor, train: bool) -> Result<Tensor> {
    debug!("running default forward function");

    match layers {
        Layer::Sequential(seq) => seq.forward_t(xs, train),
        Layer::List(list) => {
            LIST_FORWARD_WARN.call_once(|| {
                warn!("no forward function defined, looping sequentially over layer list");
            });
            list.iter()
                .enumerate()
                .try_fold(xs.shallow_clone(), |xs, (index, layer)| {
                    layer
                        .forward_t(&xs, train)
                        .with_context(|| format!("failed to run layer {}", index))
                })
        }
        other => bail!(
            "no forward function defined and no default behavior for layers of kind {}",
            other.as_ref()
        ),
    }
}
