use super::{
    BatchSampler, Collate, Dataset, InputDim, RandomSampler, ResizeHandle, SampleIndex,
    SequentialSampler,
};
use crate::common::*;

/// Batching options of a [DataLoader].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLoaderConfig {
    pub batch_size: usize,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub drop_last: bool,
    /// Number of batches loaded concurrently by [DataLoader::stream].
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            shuffle: false,
            drop_last: false,
            num_workers: default_num_workers(),
            seed: None,
        }
    }
}

fn default_num_workers() -> usize {
    1
}

/// The step between input dimensions chosen by
/// [DataLoader::change_input_dim].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimMultiple {
    Square(usize),
    Rect(usize, usize),
}

impl Default for DimMultiple {
    fn default() -> Self {
        Self::Square(32)
    }
}

impl From<usize> for DimMultiple {
    fn from(multiple: usize) -> Self {
        Self::Square(multiple)
    }
}

impl From<(usize, usize)> for DimMultiple {
    fn from((width, height): (usize, usize)) -> Self {
        Self::Rect(width, height)
    }
}

impl DimMultiple {
    fn scale(&self, factor: usize) -> InputDim {
        match *self {
            Self::Square(multiple) => InputDim::square(multiple * factor),
            Self::Rect(width, height) => InputDim::new(width * factor, height * factor),
        }
    }
}

/// Loads batches of a [Dataset] whose input dimension can change between
/// batches.
///
/// ```no_run
/// # use lightnet::data::*;
/// # fn run<D: Dataset + 'static>(dataset: D) -> anyhow::Result<()> {
/// let config = DataLoaderConfig {
///     batch_size: 64,
///     shuffle: true,
///     ..Default::default()
/// };
/// let loader = DataLoader::new(dataset, ListCollate, config)?;
///
/// for (step, batch) in loader.iter().enumerate() {
///     let batch = batch?;
///     if step % 10 == 9 {
///         loader.change_input_dim(32, Some((10, 19)))?;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DataLoader<D, C> {
    dataset: Arc<D>,
    collate: Arc<C>,
    batch_sampler: BatchSampler,
    num_workers: usize,
    rng: Mutex<StdRng>,
}

impl<D, C> DataLoader<D, C>
where
    D: 'static + Dataset,
    C: 'static + Collate<D::Item>,
    C::Output: 'static,
{
    pub fn new(dataset: D, collate: C, config: DataLoaderConfig) -> Result<Self> {
        let DataLoaderConfig {
            batch_size,
            shuffle,
            drop_last,
            num_workers,
            seed,
        } = config;
        ensure!(num_workers > 0, "num_workers must be positive");

        let len = dataset.len();
        let resize = ResizeHandle::new(dataset.input_dim());
        let batch_sampler = if shuffle {
            BatchSampler::new(RandomSampler::new(len, seed), batch_size, drop_last, resize)?
        } else {
            BatchSampler::new(SequentialSampler::new(len), batch_size, drop_last, resize)?
        };

        Ok(Self {
            dataset: Arc::new(dataset),
            collate: Arc::new(collate),
            batch_sampler,
            num_workers,
            rng: Mutex::new(match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            }),
        })
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn batch_sampler(&self) -> &BatchSampler {
        &self.batch_sampler
    }

    /// The input dimension of the latest batch.
    pub fn input_dim(&self) -> InputDim {
        self.batch_sampler.resize_handle().current()
    }

    /// Number of batches in one pass.
    pub fn len(&self) -> usize {
        self.batch_sampler.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch_sampler.is_empty()
    }

    /// Picks a new input dimension for the following batches.
    ///
    /// The dimension is `multiple` scaled by a random integer drawn from the
    /// inclusive `random_range`, or `multiple` itself without a range. It
    /// takes effect when the next batch is drawn.
    pub fn change_input_dim(
        &self,
        multiple: impl Into<DimMultiple>,
        random_range: Option<(usize, usize)>,
    ) -> Result<InputDim> {
        let factor = match random_range {
            Some((min, max)) => {
                ensure!(
                    0 < min && min <= max,
                    "invalid random range ({}, {})",
                    min,
                    max
                );
                self.rng.lock().unwrap().gen_range(min..=max)
            }
            None => 1,
        };

        let input_dim = multiple.into().scale(factor);
        ensure!(
            input_dim.width > 0 && input_dim.height > 0,
            "input dimension {} must be positive",
            input_dim
        );
        self.batch_sampler.resize_handle().request(input_dim);
        Ok(input_dim)
    }

    /// Loads the batches of one pass on the current thread.
    pub fn iter(&self) -> impl Iterator<Item = Result<C::Output>> + '_ {
        self.batch_sampler
            .iter()
            .map(move |batch| load_batch(&*self.dataset, &*self.collate, batch))
    }

    /// Loads the batches of one pass on blocking tokio workers.
    ///
    /// Up to `num_workers` batches are loaded ahead and yielded in order,
    /// so a dimension change requested while streaming reaches the batches
    /// drawn after the ones already in flight. It must be polled inside a
    /// tokio runtime.
    pub fn stream(&self) -> Pin<Box<dyn Stream<Item = Result<C::Output>> + Send>> {
        let dataset = self.dataset.clone();
        let collate = self.collate.clone();

        let stream = stream::iter(self.batch_sampler.iter())
            .map(move |batch| {
                let dataset = dataset.clone();
                let collate = collate.clone();

                async move {
                    tokio::task::spawn_blocking(move || load_batch(&*dataset, &*collate, batch))
                        .await?
                }
            })
            .buffered(self.num_workers);

        Box::pin(stream)
    }
}

fn load_batch<D, C>(dataset: &D, collate: &C, batch: Vec<SampleIndex>) -> Result<C::Output>
where
    D: Dataset,
    C: Collate<D::Item>,
{
    let items = batch
        .into_iter()
        .map(|index| dataset.get(index))
        .collect::<Result<Vec<_>>>()?;
    collate.collate(items)
}
