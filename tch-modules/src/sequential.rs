use crate::{common::*, layer::Layer};

/// Named layers that run one after another.
#[derive(Debug, Default)]
pub struct Sequential {
    layers: Vec<(String, Layer)>,
}

impl Sequential {
    /// Start a sequential container whose children are created under `path`.
    pub fn builder<'a>(path: &'a nn::Path<'a>) -> SequentialBuilder<'a> {
        SequentialBuilder {
            path,
            layers: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|(layer_name, _)| layer_name == name)
            .map(|(_, layer)| layer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Layer)> {
        self.layers
            .iter()
            .map(|(name, layer)| (name.as_str(), layer))
    }

    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        self.layers
            .iter()
            .try_fold(xs.shallow_clone(), |xs, (name, layer)| {
                layer
                    .forward_t(&xs, train)
                    .with_context(|| format!("failed to run layer '{}'", name))
            })
    }
}

pub struct SequentialBuilder<'a> {
    path: &'a nn::Path<'a>,
    layers: Vec<(String, Layer)>,
}

impl<'a> SequentialBuilder<'a> {
    /// Append a layer named `name`. The closure receives the variable path
    /// of the new child.
    pub fn add<F, L>(mut self, name: &str, f: F) -> Self
    where
        F: FnOnce(nn::Path<'a>) -> L,
        L: Into<Layer>,
    {
        let layer = f(self.path / name).into();
        self.layers.push((name.to_owned(), layer));
        self
    }

    pub fn build(self) -> Sequential {
        let Self { layers, .. } = self;
        Sequential { layers }
    }
}
