use super::Annotation;
use crate::common::*;

/// Merges the samples of a batch into a single value.
pub trait Collate<T>
where
    Self: Debug + Send + Sync,
{
    type Output: Send;

    fn collate(&self, items: Vec<T>) -> Result<Self::Output>;
}

/// Keeps the samples as a list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCollate;

impl<T> Collate<T> for ListCollate
where
    T: Send,
{
    type Output = Vec<T>;

    fn collate(&self, items: Vec<T>) -> Result<Self::Output> {
        Ok(items)
    }
}

/// Concatenates per-sample annotation lists, tagging each annotation with
/// the index of its sample in the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationCollate;

impl Collate<Vec<Annotation>> for AnnotationCollate {
    type Output = Vec<Annotation>;

    fn collate(&self, items: Vec<Vec<Annotation>>) -> Result<Self::Output> {
        Ok(tag_batch_numbers(items))
    }
}

/// Stacks images into a `[batch, channels, height, width]` tensor and
/// concatenates their annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionCollate;

impl Collate<(Tensor, Vec<Annotation>)> for DetectionCollate {
    type Output = (Tensor, Vec<Annotation>);

    fn collate(&self, items: Vec<(Tensor, Vec<Annotation>)>) -> Result<Self::Output> {
        ensure!(!items.is_empty(), "cannot collate an empty batch");
        let (images, annotations): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        let images = Tensor::f_stack(&images, 0).context("images differ in shape")?;
        Ok((images, tag_batch_numbers(annotations)))
    }
}

/// Stacks images and their class indices into `([batch, c, h, w], [batch])`
/// tensors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationCollate;

impl Collate<(Tensor, i64)> for ClassificationCollate {
    type Output = (Tensor, Tensor);

    fn collate(&self, items: Vec<(Tensor, i64)>) -> Result<Self::Output> {
        ensure!(!items.is_empty(), "cannot collate an empty batch");
        let (images, labels): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        let images = Tensor::f_stack(&images, 0).context("images differ in shape")?;
        let labels = Tensor::of_slice(&labels);
        Ok((images, labels))
    }
}

fn tag_batch_numbers(items: Vec<Vec<Annotation>>) -> Vec<Annotation> {
    items
        .into_iter()
        .enumerate()
        .flat_map(|(batch_number, annotations)| {
            annotations.into_iter().map(move |mut annotation| {
                annotation.batch_number = Some(batch_number);
                annotation
            })
        })
        .collect()
}
