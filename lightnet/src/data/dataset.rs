use crate::common::*;

/// The `(width, height)` resolution of network inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputDim {
    pub width: usize,
    pub height: usize,
}

impl InputDim {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }
}

impl From<(usize, usize)> for InputDim {
    fn from((width, height): (usize, usize)) -> Self {
        Self::new(width, height)
    }
}

impl Display for InputDim {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A sample index, optionally paired with the input dimension of the batch
/// it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleIndex {
    pub input_dim: Option<InputDim>,
    pub index: usize,
}

impl From<usize> for SampleIndex {
    fn from(index: usize) -> Self {
        Self {
            input_dim: None,
            index,
        }
    }
}

impl From<(InputDim, usize)> for SampleIndex {
    fn from((input_dim, index): (InputDim, usize)) -> Self {
        Self {
            input_dim: Some(input_dim),
            index,
        }
    }
}

/// A random-access dataset whose samples are produced at a requested
/// input dimension.
///
/// [Dataset::input_dim] is the default dimension. Samplers pass the active
/// dimension of each batch along with the index, and it applies to that
/// access only.
pub trait Dataset
where
    Self: Debug + Send + Sync,
{
    type Item: Send;

    /// Number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The default input dimension.
    fn input_dim(&self) -> InputDim;

    /// Produces the sample at `index` for the given input dimension.
    fn get_item(&self, index: usize, input_dim: InputDim) -> Result<Self::Item>;

    /// Produces a sample from a plain index or an `(input_dim, index)` pair.
    fn get(&self, index: impl Into<SampleIndex>) -> Result<Self::Item>
    where
        Self: Sized,
    {
        let SampleIndex { input_dim, index } = index.into();
        ensure!(
            index < self.len(),
            "index {} is out of range for a dataset of {} samples",
            index,
            self.len()
        );
        let input_dim = input_dim.unwrap_or_else(|| self.input_dim());
        self.get_item(index, input_dim)
    }
}

impl<D> Dataset for Arc<D>
where
    D: Dataset,
{
    type Item = D::Item;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn input_dim(&self) -> InputDim {
        (**self).input_dim()
    }

    fn get_item(&self, index: usize, input_dim: InputDim) -> Result<Self::Item> {
        (**self).get_item(index, input_dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dims;

    impl Dataset for Dims {
        type Item = (InputDim, usize);

        fn len(&self) -> usize {
            4
        }

        fn input_dim(&self) -> InputDim {
            InputDim::square(416)
        }

        fn get_item(&self, index: usize, input_dim: InputDim) -> Result<Self::Item> {
            Ok((input_dim, index))
        }
    }

    #[test]
    fn dimension_override_is_scoped() -> Result<()> {
        let dataset = Dims;
        let dim = InputDim::new(320, 256);
        assert_eq!(dataset.get((dim, 1))?, (dim, 1));
        assert_eq!(dataset.get(1)?, (InputDim::square(416), 1));
        assert_eq!(dataset.input_dim(), InputDim::square(416));
        assert!(dataset.get(4).is_err());
        Ok(())
    }

    #[test]
    fn display_input_dim() {
        assert_eq!(InputDim::from((608, 416)).to_string(), "608x416");
    }
}
