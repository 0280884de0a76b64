use crate::{common::*, data::Annotation};

/// Data flowing through a transform pipeline.
#[derive(Debug, AsRefStr)]
pub enum TransformData {
    Annotations(Vec<Annotation>),
    /// An image in the `image` crate representation.
    Image(DynamicImage),
    /// An RGB image as a `[height, width, channel]` array.
    Array(Array3<u8>),
    /// A `[channel, height, width]` float tensor.
    Tensor(Tensor),
}

impl TransformData {
    pub fn kind(&self) -> &str {
        self.as_ref()
    }
}

impl From<Vec<Annotation>> for TransformData {
    fn from(from: Vec<Annotation>) -> Self {
        Self::Annotations(from)
    }
}

impl From<DynamicImage> for TransformData {
    fn from(from: DynamicImage) -> Self {
        Self::Image(from)
    }
}

impl From<Array3<u8>> for TransformData {
    fn from(from: Array3<u8>) -> Self {
        Self::Array(from)
    }
}

impl From<Tensor> for TransformData {
    fn from(from: Tensor) -> Self {
        Self::Tensor(from)
    }
}

/// Converts an RGB image to a `[3, height, width]` float tensor in `[0, 1]`.
pub fn image_to_tensor(image: &RgbImage) -> Tensor {
    let (width, height) = image.dimensions();
    Tensor::of_slice(image.as_raw())
        .view([height as i64, width as i64, 3])
        .permute(&[2, 0, 1])
        .to_kind(Kind::Float)
        / 255.0
}

/// Converts an `[height, width, 3]` array to an RGB image.
pub fn array_to_image(array: &Array3<u8>) -> Result<RgbImage> {
    let (height, width, channels) = array.dim();
    ensure!(channels == 3, "expect 3 channels, but get {}", channels);
    let pixels: Vec<u8> = array.iter().copied().collect();
    RgbImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| format_err!("array of shape {:?} is not an image", array.dim()))
}

/// Converts an RGB image to an `[height, width, 3]` array.
pub fn image_to_array(image: &RgbImage) -> Result<Array3<u8>> {
    let (width, height) = image.dimensions();
    let array = Array3::from_shape_vec(
        (height as usize, width as usize, 3),
        image.as_raw().clone(),
    )?;
    Ok(array)
}
