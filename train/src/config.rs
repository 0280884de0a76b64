//! Training program configuration format.

use crate::common::*;

pub use dataset::*;
pub use model::*;
pub use training::*;

/// The main training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub dataset: DatasetConfig,
    pub logging: LoggingConfig,
    pub training: TrainingConfig,
    /// If set, the input dimension changes every few batches.
    pub multi_scale: Option<MultiScaleConfig>,
    /// If set, the trained weights are exported at the end.
    pub export: Option<ExportConfig>,
    /// Extra hyperparameters stored in checkpoints. Names prefixed with `_`
    /// are kept out of checkpoints.
    #[serde(default)]
    pub params: IndexMap<String, serde_json::Value>,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

mod model {
    use super::*;

    /// The classifier to pretrain.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "kind")]
    pub enum ModelConfig {
        Darknet19 {
            /// Defaults to the number of dataset classes.
            num_classes: Option<usize>,
        },
        Darknet {
            /// Defaults to the number of dataset classes.
            num_classes: Option<usize>,
        },
    }
}

/// Data logging options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Each run creates a timestamped sub-directory here.
    pub dir: PathBuf,
}

mod dataset {
    use super::*;

    /// Dataset options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DatasetConfig {
        /// Directory with one sub-directory of images per class.
        pub dir: PathBuf,
        /// The default input dimension.
        pub input_dim: InputDim,
        /// The probability to flip images horizontally.
        pub horizontal_flip_prob: Option<R64>,
    }

    /// Multi-scale training options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MultiScaleConfig {
        /// Pick a new input dimension per this number of batches.
        pub interval: NonZeroUsize,
        #[serde(default)]
        pub multiple: DimMultiple,
        /// Inclusive range of the factor applied to `multiple`.
        pub random_range: (usize, usize),
    }
}

mod training {
    use super::*;

    /// The training options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TrainingConfig {
        pub batch_size: NonZeroUsize,
        pub epochs: usize,
        /// If set, training stops after this number of batches.
        pub max_batches: Option<usize>,
        pub num_workers: NonZeroUsize,
        #[serde(default = "default_shuffle")]
        pub shuffle: bool,
        pub seed: Option<u64>,
        /// Learning rate scheduling strategy.
        pub lr_schedule: LrSchedule,
        /// The momentum parameter for optimizer.
        pub momentum: R64,
        /// The weight decay parameter for optimizer.
        pub weight_decay: R64,
        /// If set, it saves a checkpoint file per this steps.
        pub save_checkpoint_steps: Option<NonZeroUsize>,
        /// Checkpoint file loading method.
        #[serde(default)]
        pub load_checkpoint: LoadCheckpoint,
        #[serde(with = "tch_serde::serde_device")]
        pub device: Device,
    }

    fn default_shuffle() -> bool {
        true
    }

    /// Checkpoint file loading method.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum LoadCheckpoint {
        /// Disable checkpoint file loading.
        Disabled,
        /// Load the most recent checkpoint file.
        FromRecent,
        /// Load the checkpoint file at specified path.
        FromFile { file: PathBuf },
    }

    impl Default for LoadCheckpoint {
        fn default() -> Self {
            Self::Disabled
        }
    }

    /// Weight export options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ExportConfig {
        pub file: PathBuf,
        /// If set, the weights are renamed for another network.
        pub remap: Option<RemapConfig>,
    }

    /// Remap rules used by weight export.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum RemapConfig {
        /// Darknet19 weights for the Yolt backbone.
        Yolt,
        /// Pairs of pattern and replacement.
        Custom { rules: RemapRules },
    }

    impl RemapConfig {
        pub fn rules(&self) -> Result<RemapRules> {
            match self {
                Self::Yolt => Yolt::remap_darknet19(),
                Self::Custom { rules } => Ok(rules.clone()),
            }
        }
    }
}
