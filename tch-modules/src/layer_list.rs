use crate::{common::*, layer::Layer};

/// Indexed layers without an implicit forward order.
#[derive(Debug, Default)]
pub struct LayerList {
    layers: Vec<Layer>,
}

impl LayerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a list whose children are created under `path / index`.
    pub fn builder<'a>(path: &'a nn::Path<'a>) -> LayerListBuilder<'a> {
        LayerListBuilder {
            path,
            list: Self::new(),
        }
    }

    pub fn push(&mut self, layer: impl Into<Layer>) {
        self.layers.push(layer.into());
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Run `index`-th layer on `xs`.
    pub fn forward_at(&self, index: usize, xs: &Tensor, train: bool) -> Result<Tensor> {
        self.get(index)
            .ok_or_else(|| format_err!("layer index {} out of range", index))?
            .forward_t(xs, train)
            .with_context(|| format!("failed to run layer {}", index))
    }
}

pub struct LayerListBuilder<'a> {
    path: &'a nn::Path<'a>,
    list: LayerList,
}

impl<'a> LayerListBuilder<'a> {
    pub fn push<F, L>(mut self, f: F) -> Self
    where
        F: FnOnce(nn::Path<'a>) -> L,
        L: Into<Layer>,
    {
        let index = self.list.len();
        let layer = f(self.path / index);
        self.list.push(layer);
        self
    }

    pub fn build(self) -> LayerList {
        self.list
    }
}
