use crate::{
    common::*, conv_2d_batch_relu::Conv2dBatchReLU, flatten::Flatten,
    global_avg_pool_2d::GlobalAvgPool2D, layer_list::LayerList, max_pool_2d::MaxPool2D,
    reorg::Reorg, sequential::Sequential,
};

/// A node of the module tree.
///
/// Leaves are primitive tensor operations. [Sequential] runs its named
/// children in declaration order, while [LayerList] only owns its children
/// and leaves the wiring to the network that holds it.
#[derive(Debug, AsRefStr)]
pub enum Layer {
    Conv2D(nn::Conv2D),
    Conv2dBatchReLU(Conv2dBatchReLU),
    MaxPool2D(MaxPool2D),
    GlobalAvgPool2D(GlobalAvgPool2D),
    Flatten(Flatten),
    Reorg(Reorg),
    Sequential(Sequential),
    List(LayerList),
}

impl Layer {
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let output = match self {
            Self::Conv2D(layer) => xs.apply(layer),
            Self::Conv2dBatchReLU(layer) => xs.apply_t(layer, train),
            Self::MaxPool2D(layer) => xs.apply(layer),
            Self::GlobalAvgPool2D(layer) => xs.apply(layer),
            Self::Flatten(layer) => xs.apply(layer),
            Self::Reorg(layer) => layer.forward(xs)?,
            Self::Sequential(layer) => layer.forward_t(xs, train)?,
            Self::List(_) => bail!("a layer list has no forward behavior on its own"),
        };
        Ok(output)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Sequential(_) | Self::List(_))
    }

    pub fn as_sequential(&self) -> Option<&Sequential> {
        match self {
            Self::Sequential(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&LayerList> {
        match self {
            Self::List(layer) => Some(layer),
            _ => None,
        }
    }

    /// Iterates over the direct children of a container layer.
    ///
    /// Leaf layers have no children.
    pub fn named_children(&self) -> Vec<(String, &Layer)> {
        match self {
            Self::Sequential(seq) => seq
                .iter()
                .map(|(name, layer)| (name.to_owned(), layer))
                .collect(),
            Self::List(list) => list
                .iter()
                .enumerate()
                .map(|(index, layer)| (index.to_string(), layer))
                .collect(),
            _ => vec![],
        }
    }

    /// Recursively walks [Sequential] and [LayerList] children and yields
    /// the leaf layers in declaration order.
    pub fn layer_loop(&self) -> Vec<&Layer> {
        self.named_layer_loop()
            .into_iter()
            .map(|(_, layer)| layer)
            .collect()
    }

    /// Named version of [Layer::layer_loop]. Each leaf is paired with its
    /// name inside its direct parent.
    pub fn named_layer_loop(&self) -> Vec<(String, &Layer)> {
        self.named_children()
            .into_iter()
            .flat_map(|(name, layer)| {
                if layer.is_container() {
                    layer.named_layer_loop()
                } else {
                    vec![(name, layer)]
                }
            })
            .collect()
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential(seq) => write!(f, "Sequential({} layers)", seq.len()),
            Self::List(list) => write!(f, "LayerList({} layers)", list.len()),
            Self::MaxPool2D(MaxPool2D { kernel, stride }) => {
                write!(f, "MaxPool2D(kernel={}, stride={})", kernel, stride)
            }
            Self::Reorg(reorg) => write!(f, "Reorg(stride={})", reorg.stride()),
            other => write!(f, "{}", other.as_ref()),
        }
    }
}

impl From<nn::Conv2D> for Layer {
    fn from(v: nn::Conv2D) -> Self {
        Self::Conv2D(v)
    }
}

impl From<Conv2dBatchReLU> for Layer {
    fn from(v: Conv2dBatchReLU) -> Self {
        Self::Conv2dBatchReLU(v)
    }
}

impl From<MaxPool2D> for Layer {
    fn from(v: MaxPool2D) -> Self {
        Self::MaxPool2D(v)
    }
}

impl From<GlobalAvgPool2D> for Layer {
    fn from(v: GlobalAvgPool2D) -> Self {
        Self::GlobalAvgPool2D(v)
    }
}

impl From<Flatten> for Layer {
    fn from(v: Flatten) -> Self {
        Self::Flatten(v)
    }
}

impl From<Reorg> for Layer {
    fn from(v: Reorg) -> Self {
        Self::Reorg(v)
    }
}

impl From<Sequential> for Layer {
    fn from(v: Sequential) -> Self {
        Self::Sequential(v)
    }
}

impl From<LayerList> for Layer {
    fn from(v: LayerList) -> Self {
        Self::List(v)
    }
}
