use super::{
    transform::{image_to_tensor, Compose, Letterbox, TransformData},
    Dataset, InputDim,
};
use crate::common::*;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// A classification dataset stored as one sub-directory of images per
/// class.
///
/// Classes are ordered by directory name. Each sample is an image
/// letterboxed to the requested input dimension, as a `[3, h, w]` float
/// tensor, paired with its class index.
#[derive(Debug)]
pub struct ImageFolderDataset {
    root: PathBuf,
    classes: IndexSet<String>,
    samples: Vec<(PathBuf, usize)>,
    letterbox: Letterbox,
    transform: Option<Compose<Option<TransformData>>>,
}

impl ImageFolderDataset {
    pub fn new(root: impl AsRef<Path>, input_dim: InputDim) -> Result<Self> {
        let root = root.as_ref();
        ensure!(
            input_dim.width > 0 && input_dim.height > 0,
            "input dimension {} must be positive",
            input_dim
        );

        let mut class_dirs = vec![];
        for entry in fs::read_dir(root)
            .with_context(|| format!("failed to list dataset directory {}", root.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                class_dirs.push(path);
            }
        }
        class_dirs.sort();
        ensure!(
            !class_dirs.is_empty(),
            "no class directories found in {}",
            root.display()
        );

        let mut classes = IndexSet::new();
        let mut samples = vec![];

        for dir in class_dirs {
            let class_name = dir
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| format_err!("invalid class directory name {}", dir.display()))?
                .to_owned();
            let (class_index, _) = classes.insert_full(class_name);

            let paths: Vec<PathBuf> =
                glob::glob(&format!("{}/*", dir.display()))?.try_collect()?;
            samples.extend(
                paths
                    .into_iter()
                    .filter(|path| is_image_file(path))
                    .sorted()
                    .map(|path| (path, class_index)),
            );
        }

        info!(
            "found {} images of {} classes in {}",
            samples.len(),
            classes.len(),
            root.display()
        );

        Ok(Self {
            root: root.to_owned(),
            classes,
            samples,
            letterbox: Letterbox::new(input_dim),
            transform: None,
        })
    }

    /// Sets the pipeline applied to each image before letterboxing.
    pub fn with_transform(mut self, transform: Compose<Option<TransformData>>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn samples(&self) -> &[(PathBuf, usize)] {
        &self.samples
    }
}

impl Dataset for ImageFolderDataset {
    type Item = (Tensor, i64);

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn input_dim(&self) -> InputDim {
        self.letterbox.input_dim()
    }

    fn get_item(&self, index: usize, input_dim: InputDim) -> Result<Self::Item> {
        let (path, class_index) = &self.samples[index];
        let image = image::open(path)
            .with_context(|| format!("failed to load image file {}", path.display()))?;

        let image = match &self.transform {
            Some(transform) => match transform.call(Some(image.into())) {
                Some(TransformData::Image(image)) => image,
                Some(other) => bail!(
                    "the transform pipeline returns {} instead of an image",
                    other.kind()
                ),
                None => bail!("the transform pipeline returns nothing"),
            },
            None => image,
        };

        let image = match self.letterbox.apply_at(input_dim, image.into(), None).0 {
            TransformData::Image(image) => image,
            other => bail!("letterbox returns {} instead of an image", other.kind()),
        };
        let tensor = image_to_tensor(&image.to_rgb8());
        Ok((tensor, *class_index as i64))
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
