//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use chrono::{DateTime, Local};
pub use futures::{future::FutureExt as _, stream::StreamExt as _};
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use lightnet::{
    data::{
        transform::{Compose, RandomFlip, TransformData},
        ClassificationCollate, DataLoader, DataLoaderConfig, Dataset, DimMultiple,
        ImageFolderDataset, InputDim,
    },
    engine::{HyperParameters, LrSchedule, LrScheduler},
    models::{Darknet19Init, DarknetInit, Yolt},
    network::{Lightnet, Network, RemapRules},
};
pub use log::{info, warn};
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
pub use tch::{
    nn::{self, OptimizerConfig as _},
    Device, Tensor,
};
pub use tokio::sync::mpsc;

pub type Fallible<T> = Result<T, Error>;
