use super::{array_to_image, image_to_array, multi::dispatch, MultiTransform, TransformData};
use crate::{
    common::*,
    data::{Annotation, InputDim},
};
use image::{imageops, imageops::FilterType, Rgb};

pub const DEFAULT_FILL_COLOR: u8 = 127;

/// The resize and padding applied by a letterbox operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxParams {
    pub scale: f64,
    /// Padding in pixels as `[left, top, right, bottom]`.
    pub pad: [u32; 4],
}

impl LetterboxParams {
    /// Maps an annotation from the source image to the letterboxed image.
    pub fn apply(&self, annotation: &mut Annotation) {
        let scale = r64(self.scale);
        annotation.scale(scale, scale);
        annotation.translate(r64(self.pad[0] as f64), r64(self.pad[1] as f64));
    }
}

/// Fits `image` into `input_dim` keeping its aspect ratio, and pads the
/// borders with `fill_color`.
///
/// Returns `None` parameters when the image already has the target size.
pub fn letterbox_image(
    image: &DynamicImage,
    input_dim: InputDim,
    fill_color: u8,
) -> (DynamicImage, Option<LetterboxParams>) {
    let (width, height) = image.dimensions();
    let (net_w, net_h) = (input_dim.width as u32, input_dim.height as u32);

    if (width, height) == (net_w, net_h) {
        return (image.clone(), None);
    }

    let scale = f64::min(net_w as f64 / width as f64, net_h as f64 / height as f64);
    let resized = if scale != 1.0 {
        let new_w = ((width as f64 * scale) as u32).clamp(1, net_w);
        let new_h = ((height as f64 * scale) as u32).clamp(1, net_h);
        image.resize_exact(new_w, new_h, FilterType::Triangle)
    } else {
        image.clone()
    };

    let (new_w, new_h) = resized.dimensions();
    let pad_w = (net_w - new_w) as f64 / 2.0;
    let pad_h = (net_h - new_h) as f64 / 2.0;
    let pad = [
        pad_w as u32,
        pad_h as u32,
        (pad_w + 0.5) as u32,
        (pad_h + 0.5) as u32,
    ];

    let mut canvas = RgbImage::from_pixel(net_w, net_h, Rgb([fill_color; 3]));
    imageops::overlay(&mut canvas, &resized.to_rgb8(), pad[0], pad[1]);

    (
        DynamicImage::ImageRgb8(canvas),
        Some(LetterboxParams { scale, pad }),
    )
}

/// Resizes images to a dimension keeping the aspect ratio, and maps
/// annotations with the same resize and padding.
///
/// [MultiTransform::apply] and [Letterbox::apply_at] pair an image with its
/// annotations within a single call. Separate calls map annotations with the
/// parameters of the image transformed last.
#[derive(Debug)]
pub struct Letterbox {
    input_dim: InputDim,
    fill_color: u8,
    params: Mutex<Option<LetterboxParams>>,
}

impl Letterbox {
    pub fn new(input_dim: InputDim) -> Self {
        Self {
            input_dim,
            fill_color: DEFAULT_FILL_COLOR,
            params: Mutex::new(None),
        }
    }

    pub fn fill_color(mut self, fill_color: u8) -> Self {
        self.fill_color = fill_color;
        self
    }

    pub fn input_dim(&self) -> InputDim {
        self.input_dim
    }

    /// Parameters computed from the last transformed image.
    pub fn params(&self) -> Option<LetterboxParams> {
        *self.params.lock().unwrap()
    }

    /// Letterboxes `data` to `input_dim` instead of the configured
    /// dimension, and maps the annotations in `target` with the same
    /// parameters.
    pub fn apply_at(
        &self,
        input_dim: InputDim,
        data: TransformData,
        target: Option<TransformData>,
    ) -> (TransformData, Option<TransformData>) {
        let (data, params) = match data {
            TransformData::Image(image) => {
                let (image, params) = letterbox_image(&image, input_dim, self.fill_color);
                (TransformData::Image(image), params)
            }
            TransformData::Array(array) => {
                let (array, params) = self.letterbox_array(array, input_dim);
                (TransformData::Array(array), params)
            }
            other => (dispatch(self, other), self.params()),
        };
        *self.params.lock().unwrap() = params;

        let target = target.map(|target| match target {
            TransformData::Annotations(annotations) => {
                TransformData::Annotations(map_annotations(annotations, params))
            }
            other => self.apply_at(input_dim, other, None).0,
        });
        (data, target)
    }

    fn letterbox_array(
        &self,
        array: Array3<u8>,
        input_dim: InputDim,
    ) -> (Array3<u8>, Option<LetterboxParams>) {
        let image = match array_to_image(&array) {
            Ok(image) => image,
            Err(err) => {
                error!("Letterbox cannot process the array: {:?}", err);
                return (array, None);
            }
        };

        let (output, params) =
            letterbox_image(&DynamicImage::ImageRgb8(image), input_dim, self.fill_color);
        match image_to_array(&output.to_rgb8()) {
            Ok(output) => (output, params),
            Err(err) => {
                error!("Letterbox cannot process the array: {:?}", err);
                (array, None)
            }
        }
    }
}

impl MultiTransform for Letterbox {
    fn tf_image(&self, image: DynamicImage) -> DynamicImage {
        let (output, params) = letterbox_image(&image, self.input_dim, self.fill_color);
        *self.params.lock().unwrap() = params;
        output
    }

    fn tf_array(&self, array: Array3<u8>) -> Array3<u8> {
        let (output, params) = self.letterbox_array(array, self.input_dim);
        *self.params.lock().unwrap() = params;
        output
    }

    fn tf_anno(&self, annotations: Vec<Annotation>) -> Vec<Annotation> {
        map_annotations(annotations, self.params())
    }

    fn apply(
        &self,
        data: TransformData,
        target: Option<TransformData>,
    ) -> (TransformData, Option<TransformData>) {
        self.apply_at(self.input_dim, data, target)
    }
}

fn map_annotations(
    mut annotations: Vec<Annotation>,
    params: Option<LetterboxParams>,
) -> Vec<Annotation> {
    if let Some(params) = params {
        annotations.iter_mut().for_each(|anno| params.apply(anno));
    }
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_wide_image() {
        let letterbox = Letterbox::new(InputDim::square(100));
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([0, 0, 0])));
        let (image, annos) = letterbox.apply(
            image.into(),
            Some(
                vec![Annotation::new(
                    "img",
                    "car",
                    [r64(20.0), r64(10.0), r64(40.0), r64(60.0)],
                )]
                .into(),
            ),
        );

        let image = match image {
            TransformData::Image(image) => image.to_rgb8(),
            other => panic!("unexpected output {:?}", other),
        };
        assert_eq!(image.dimensions(), (100, 100));
        assert_eq!(image.get_pixel(50, 10), &Rgb([127; 3]));
        assert_eq!(image.get_pixel(50, 50), &Rgb([0; 3]));
        assert_eq!(
            letterbox.params(),
            Some(LetterboxParams {
                scale: 0.5,
                pad: [0, 25, 0, 25]
            })
        );

        let anno = match annos {
            Some(TransformData::Annotations(annos)) => annos[0].clone(),
            other => panic!("unexpected output {:?}", other),
        };
        assert_eq!(anno.x_top_left, r64(10.0));
        assert_eq!(anno.y_top_left, r64(30.0));
        assert_eq!(anno.width, r64(20.0));
        assert_eq!(anno.height, r64(30.0));
    }

    #[test]
    fn keep_image_of_target_size() {
        let image = DynamicImage::new_rgb8(64, 32);
        let (output, params) = letterbox_image(&image, InputDim::new(64, 32), 0);
        assert!(params.is_none());
        assert_eq!(output.dimensions(), (64, 32));
    }

    #[test]
    fn letterbox_to_requested_dim() {
        let letterbox = Letterbox::new(InputDim::square(100));
        let image = DynamicImage::new_rgb8(64, 32);
        let annos = vec![Annotation::new(
            "img",
            "car",
            [r64(8.0), r64(8.0), r64(16.0), r64(8.0)],
        )];
        let (image, annos) =
            letterbox.apply_at(InputDim::new(32, 32), image.into(), Some(annos.into()));

        match image {
            TransformData::Image(image) => assert_eq!(image.dimensions(), (32, 32)),
            other => panic!("unexpected output {:?}", other),
        }
        let anno = match annos {
            Some(TransformData::Annotations(annos)) => annos[0].clone(),
            other => panic!("unexpected output {:?}", other),
        };
        assert_eq!(anno.x_top_left, r64(4.0));
        assert_eq!(anno.y_top_left, r64(12.0));
        assert_eq!(anno.width, r64(8.0));
        assert_eq!(letterbox.input_dim(), InputDim::square(100));
    }

    #[test]
    fn letterbox_array() {
        let letterbox = Letterbox::new(InputDim::new(8, 8));
        let array = letterbox.tf_array(Array3::zeros((4, 8, 3)));
        assert_eq!(array.dim(), (8, 8, 3));
        assert_eq!(array[[0, 0, 0]], DEFAULT_FILL_COLOR);
        assert_eq!(array[[4, 4, 0]], 0);
    }
}
