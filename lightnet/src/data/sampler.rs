use super::{InputDim, SampleIndex};
use crate::common::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Produces the order in which dataset indices are visited in one pass.
pub trait Sampler
where
    Self: Debug + Send + Sync,
{
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn indices(&self) -> Vec<usize>;
}

/// Visits indices in ascending order.
#[derive(Debug, Clone)]
pub struct SequentialSampler {
    len: usize,
}

impl SequentialSampler {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Sampler for SequentialSampler {
    fn len(&self) -> usize {
        self.len
    }

    fn indices(&self) -> Vec<usize> {
        (0..self.len).collect()
    }
}

/// Visits indices in a new random order on every pass.
///
/// With a seed, the sequence of orders is reproducible.
#[derive(Debug)]
pub struct RandomSampler {
    len: usize,
    seed: Option<u64>,
    pass: AtomicU64,
}

impl RandomSampler {
    pub fn new(len: usize, seed: impl Into<Option<u64>>) -> Self {
        Self {
            len,
            seed: seed.into(),
            pass: AtomicU64::new(0),
        }
    }
}

impl Sampler for RandomSampler {
    fn len(&self) -> usize {
        self.len
    }

    fn indices(&self) -> Vec<usize> {
        let pass = self.pass.fetch_add(1, Ordering::SeqCst);
        let mut indices: Vec<_> = (0..self.len).collect();

        match self.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(pass));
                indices.shuffle(&mut rng);
            }
            None => indices.shuffle(&mut rand::thread_rng()),
        }

        indices
    }
}

#[derive(Debug)]
struct ResizeState {
    current: InputDim,
    pending: Option<InputDim>,
}

/// Shared handle to the active input dimension of a batch sampler.
///
/// A requested dimension takes effect when the next batch is drawn, so
/// every batch holds a single dimension.
#[derive(Debug, Clone)]
pub struct ResizeHandle {
    state: Arc<Mutex<ResizeState>>,
}

impl ResizeHandle {
    pub fn new(input_dim: InputDim) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResizeState {
                current: input_dim,
                pending: None,
            })),
        }
    }

    /// The dimension of the batch drawn last.
    pub fn current(&self) -> InputDim {
        self.state.lock().unwrap().current
    }

    pub fn pending(&self) -> Option<InputDim> {
        self.state.lock().unwrap().pending
    }

    /// Requests a dimension for the batches drawn from now on.
    pub fn request(&self, input_dim: InputDim) {
        self.state.lock().unwrap().pending = Some(input_dim);
    }

    /// Applies the pending request, if any, and returns the active dimension.
    pub fn advance(&self) -> InputDim {
        let mut state = self.state.lock().unwrap();
        if let Some(input_dim) = state.pending.take() {
            info!("resizing network {}", input_dim);
            state.current = input_dim;
        }
        state.current
    }
}

/// Groups sampler indices into batches tagged with the active input
/// dimension.
#[derive(Debug)]
pub struct BatchSampler {
    sampler: Box<dyn Sampler>,
    batch_size: usize,
    drop_last: bool,
    resize: ResizeHandle,
}

impl BatchSampler {
    pub fn new<S>(
        sampler: S,
        batch_size: usize,
        drop_last: bool,
        resize: ResizeHandle,
    ) -> Result<Self>
    where
        S: 'static + Sampler,
    {
        ensure!(batch_size > 0, "batch_size must be positive");
        Ok(Self {
            sampler: Box::new(sampler),
            batch_size,
            drop_last,
            resize,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn resize_handle(&self) -> &ResizeHandle {
        &self.resize
    }

    /// Number of batches in one pass.
    pub fn len(&self) -> usize {
        let len = self.sampler.len();
        if self.drop_last {
            len / self.batch_size
        } else {
            (len + self.batch_size - 1) / self.batch_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a pass over the sampler.
    pub fn iter(&self) -> BatchIter {
        BatchIter {
            indices: self.sampler.indices().into_iter(),
            batch_size: self.batch_size,
            drop_last: self.drop_last,
            resize: self.resize.clone(),
        }
    }
}

impl<'a> IntoIterator for &'a BatchSampler {
    type Item = Vec<SampleIndex>;
    type IntoIter = BatchIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the batches of one pass.
#[derive(Debug)]
pub struct BatchIter {
    indices: std::vec::IntoIter<usize>,
    batch_size: usize,
    drop_last: bool,
    resize: ResizeHandle,
}

impl Iterator for BatchIter {
    type Item = Vec<SampleIndex>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.indices.by_ref().take(self.batch_size).collect();
        if batch.is_empty() || (self.drop_last && batch.len() < self.batch_size) {
            return None;
        }

        let input_dim = self.resize.advance();
        let batch = batch
            .into_iter()
            .map(|index| SampleIndex::from((input_dim, index)))
            .collect();
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_random_sampler_is_reproducible() {
        let lhs = RandomSampler::new(32, 7);
        let rhs = RandomSampler::new(32, 7);
        let first = lhs.indices();
        assert_eq!(first, rhs.indices());
        assert_eq!(first.iter().copied().sorted().collect::<Vec<_>>(), (0..32).collect::<Vec<_>>());
        assert_ne!(first, lhs.indices());
    }

    #[test]
    fn batches_share_one_dimension() -> Result<()> {
        let resize = ResizeHandle::new(InputDim::square(416));
        let sampler = BatchSampler::new(SequentialSampler::new(10), 4, false, resize.clone())?;
        assert_eq!(sampler.len(), 3);

        let mut iter = sampler.iter();
        let first = iter.next().unwrap();
        assert_eq!(first.len(), 4);
        assert!(first
            .iter()
            .all(|sample| sample.input_dim == Some(InputDim::square(416))));

        resize.request(InputDim::square(320));
        assert_eq!(resize.current(), InputDim::square(416));
        let second = iter.next().unwrap();
        assert!(second
            .iter()
            .all(|sample| sample.input_dim == Some(InputDim::square(320))));

        let last = iter.next().unwrap();
        assert_eq!(last.iter().map(|sample| sample.index).collect::<Vec<_>>(), [8, 9]);
        assert!(iter.next().is_none());
        Ok(())
    }

    #[test]
    fn request_of_current_dim_is_consumed() {
        let resize = ResizeHandle::new(InputDim::square(64));
        resize.request(InputDim::square(64));
        assert_eq!(resize.pending(), Some(InputDim::square(64)));
        assert_eq!(resize.advance(), InputDim::square(64));
        assert_eq!(resize.pending(), None);

        resize.request(InputDim::new(96, 64));
        assert_eq!(resize.advance(), InputDim::new(96, 64));
        assert_eq!(resize.advance(), InputDim::new(96, 64));
    }

    #[test]
    fn drop_last_batch() -> Result<()> {
        let resize = ResizeHandle::new(InputDim::square(32));
        let sampler = BatchSampler::new(SequentialSampler::new(10), 4, true, resize)?;
        assert_eq!(sampler.len(), 2);
        assert_eq!(sampler.iter().count(), 2);
        Ok(())
    }
}
