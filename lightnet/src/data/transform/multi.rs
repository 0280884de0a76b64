use super::{Transform, TransformData};
use crate::{common::*, data::Annotation};

/// A transform that handles annotation lists and both image
/// representations.
///
/// Every implementor is a [Transform] over `Option<TransformData>`:
/// `None` passes through, annotations and images are dispatched to the
/// matching handler, and other kinds are reported and returned unchanged.
pub trait MultiTransform
where
    Self: Send + Sync,
{
    fn tf_image(&self, image: DynamicImage) -> DynamicImage;

    fn tf_array(&self, array: Array3<u8>) -> Array3<u8>;

    fn tf_anno(&self, annotations: Vec<Annotation>) -> Vec<Annotation>;

    /// Dispatches `data` to the handler of its kind.
    fn transform(&self, data: Option<TransformData>) -> Option<TransformData> {
        Some(dispatch(self, data?))
    }

    /// Transforms a data sample and its optional target together.
    ///
    /// The default dispatches both independently. Transforms deriving
    /// parameters from the data override it so the target follows the same
    /// parameters within this call, whatever other threads do meanwhile.
    fn apply(
        &self,
        data: TransformData,
        target: Option<TransformData>,
    ) -> (TransformData, Option<TransformData>) {
        let data = dispatch(self, data);
        let target = target.map(|target| dispatch(self, target));
        (data, target)
    }
}

impl<M> Transform<Option<TransformData>> for M
where
    M: MultiTransform,
{
    fn call(&self, data: Option<TransformData>) -> Option<TransformData> {
        self.transform(data)
    }

    fn call_pair(
        &self,
        data: Option<TransformData>,
        target: Option<TransformData>,
    ) -> (Option<TransformData>, Option<TransformData>) {
        match data {
            Some(data) => {
                let (data, target) = self.apply(data, target);
                (Some(data), target)
            }
            None => (None, self.transform(target)),
        }
    }
}

pub(super) fn dispatch<M>(transform: &M, data: TransformData) -> TransformData
where
    M: MultiTransform + ?Sized,
{
    match data {
        TransformData::Annotations(annotations) => {
            TransformData::Annotations(transform.tf_anno(annotations))
        }
        TransformData::Image(image) => TransformData::Image(transform.tf_image(image)),
        TransformData::Array(array) => TransformData::Array(transform.tf_array(array)),
        other => {
            error!(
                "{} only works with <annotation lists>, <images> or <arrays> [{}]",
                short_type_name::<M>(),
                other.kind()
            );
            other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Tag;

    impl MultiTransform for Tag {
        fn tf_image(&self, image: DynamicImage) -> DynamicImage {
            image.fliph()
        }

        fn tf_array(&self, mut array: Array3<u8>) -> Array3<u8> {
            array.fill(1);
            array
        }

        fn tf_anno(&self, mut annotations: Vec<Annotation>) -> Vec<Annotation> {
            annotations.iter_mut().for_each(|anno| anno.ignore = true);
            annotations
        }
    }

    #[test]
    fn dispatch_per_kind() {
        let annos = vec![Annotation::new("a", "cat", [r64(0.0); 4])];
        match Tag.call(Some(annos.into())) {
            Some(TransformData::Annotations(annos)) => assert!(annos[0].ignore),
            other => panic!("unexpected output {:?}", other),
        }

        match Tag.call(Some(Array3::<u8>::zeros((2, 2, 3)).into())) {
            Some(TransformData::Array(array)) => assert!(array.iter().all(|&v| v == 1)),
            other => panic!("unexpected output {:?}", other),
        }

        assert!(Tag.call(None).is_none());
    }

    #[test]
    fn unsupported_kind_passes_through() {
        let tensor = Tensor::ones(&[3, 2, 2], FLOAT_CPU);
        match Tag.call(Some(tensor.into())) {
            Some(TransformData::Tensor(tensor)) => {
                assert_eq!(f64::from(tensor.sum(Kind::Float)), 12.0)
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn apply_to_data_and_target() {
        let image = DynamicImage::new_rgb8(4, 2);
        let annos = vec![Annotation::new("a", "cat", [r64(0.0); 4])];
        let (image, annos) = Tag.apply(image.into(), Some(annos.into()));
        assert!(matches!(image, TransformData::Image(_)));
        assert!(matches!(annos, Some(TransformData::Annotations(_))));
    }
}
