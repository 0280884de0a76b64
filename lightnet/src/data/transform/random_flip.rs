use super::{multi::dispatch, MultiTransform, TransformData};
use crate::{common::*, data::Annotation};
use ndarray::s;

#[derive(Debug, Clone, Copy)]
struct FlipState {
    flip: bool,
    image_width: u32,
}

/// Randomly mirrors images horizontally along with their annotations.
///
/// The decision is drawn for each image. [MultiTransform::apply] applies it
/// to the target of the same call, while separate calls apply it to the
/// annotations transformed next.
#[derive(Debug)]
pub struct RandomFlip {
    threshold: f64,
    rng: Mutex<StdRng>,
    state: Mutex<Option<FlipState>>,
}

impl RandomFlip {
    /// Creates a transform flipping with probability `threshold`.
    pub fn new(threshold: f64) -> Result<Self> {
        Self::with_rng(threshold, StdRng::from_entropy())
    }

    pub fn with_seed(threshold: f64, seed: u64) -> Result<Self> {
        Self::with_rng(threshold, StdRng::seed_from_u64(seed))
    }

    fn with_rng(threshold: f64, rng: StdRng) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&threshold),
            "flip threshold must be within [0, 1], but get {}",
            threshold
        );
        Ok(Self {
            threshold,
            rng: Mutex::new(rng),
            state: Mutex::new(None),
        })
    }

    fn draw(&self) -> bool {
        self.rng.lock().unwrap().gen_bool(self.threshold)
    }

    fn remember(&self, state: FlipState) {
        *self.state.lock().unwrap() = Some(state);
    }

    /// Flips an image or an array, returning the decision taken for it.
    fn flip_data(&self, data: TransformData, flip: bool) -> (TransformData, Option<FlipState>) {
        match data {
            TransformData::Image(image) => {
                let state = FlipState {
                    flip,
                    image_width: image.width(),
                };
                (flip_image(image, flip).into(), Some(state))
            }
            TransformData::Array(array) => {
                let state = FlipState {
                    flip,
                    image_width: array.dim().1 as u32,
                };
                (flip_array(array, flip).into(), Some(state))
            }
            other => (dispatch(self, other), None),
        }
    }
}

impl MultiTransform for RandomFlip {
    fn tf_image(&self, image: DynamicImage) -> DynamicImage {
        let flip = self.draw();
        self.remember(FlipState {
            flip,
            image_width: image.width(),
        });
        flip_image(image, flip)
    }

    fn tf_array(&self, array: Array3<u8>) -> Array3<u8> {
        let flip = self.draw();
        self.remember(FlipState {
            flip,
            image_width: array.dim().1 as u32,
        });
        flip_array(array, flip)
    }

    fn tf_anno(&self, annotations: Vec<Annotation>) -> Vec<Annotation> {
        let state = *self.state.lock().unwrap();
        flip_annotations(annotations, state)
    }

    fn apply(
        &self,
        data: TransformData,
        target: Option<TransformData>,
    ) -> (TransformData, Option<TransformData>) {
        let flip = self.draw();
        let (data, state) = self.flip_data(data, flip);
        let state = match state {
            Some(state) => {
                self.remember(state);
                Some(state)
            }
            None => *self.state.lock().unwrap(),
        };

        let target = target.map(|target| match target {
            TransformData::Annotations(annotations) => {
                TransformData::Annotations(flip_annotations(annotations, state))
            }
            other => self.flip_data(other, flip).0,
        });
        (data, target)
    }
}

fn flip_image(image: DynamicImage, flip: bool) -> DynamicImage {
    if flip {
        image.fliph()
    } else {
        image
    }
}

fn flip_array(array: Array3<u8>, flip: bool) -> Array3<u8> {
    if flip {
        array.slice(s![.., ..;-1, ..]).to_owned()
    } else {
        array
    }
}

fn flip_annotations(mut annotations: Vec<Annotation>, state: Option<FlipState>) -> Vec<Annotation> {
    if let Some(FlipState {
        flip: true,
        image_width,
    }) = state
    {
        let image_width = r64(image_width as f64);
        annotations
            .iter_mut()
            .for_each(|anno| anno.flip_horizontal(image_width));
    }
    annotations
}
