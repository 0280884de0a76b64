use crate::common::*;

/// A preprocessing step applied to data of type `T`.
pub trait Transform<T>
where
    Self: Send + Sync,
{
    fn call(&self, data: T) -> T;

    /// Transforms a sample together with its target, such as an image and
    /// its annotations.
    fn call_pair(&self, data: T, target: T) -> (T, T) {
        (self.call(data), self.call(target))
    }

    /// The name shown when the transform is printed.
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

/// A closure used as a named [Transform].
#[derive(Clone)]
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> FnTransform<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Debug for FnTransform<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish()
    }
}

impl<T, F> Transform<T> for FnTransform<F>
where
    F: Fn(T) -> T + Send + Sync,
{
    fn call(&self, data: T) -> T {
        (self.f)(data)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

/// Applies a list of transforms in order.
///
/// ```
/// use lightnet::data::transform::{Compose, FnTransform};
///
/// let mut pipeline = Compose::new();
/// pipeline.push(FnTransform::new("add", |x: i32| x + 1));
/// pipeline.push(FnTransform::new("double", |x: i32| x * 2));
/// assert_eq!(pipeline.call(3), 8);
/// assert_eq!(pipeline.to_string(), "Compose [\n  add\n  double\n]");
/// ```
pub struct Compose<T> {
    transforms: Vec<Box<dyn Transform<T>>>,
}

impl<T> Compose<T> {
    pub fn new() -> Self {
        Self { transforms: vec![] }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn push(&mut self, transform: impl 'static + Transform<T>) {
        self.transforms.push(Box::new(transform));
    }

    pub fn insert(&mut self, index: usize, transform: impl 'static + Transform<T>) -> Result<()> {
        ensure!(
            index <= self.len(),
            "insert index {} is out of range for {} transforms",
            index,
            self.len()
        );
        self.transforms.insert(index, Box::new(transform));
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Transform<T>>> {
        (index < self.len()).then(|| self.transforms.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&dyn Transform<T>> {
        self.transforms.get(index).map(|transform| &**transform)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Transform<T>> {
        self.transforms.iter().map(|transform| &**transform)
    }

    /// Runs `data` through all transforms.
    pub fn call(&self, data: T) -> T {
        self.transforms
            .iter()
            .fold(data, |data, transform| transform.call(data))
    }

    /// Runs a sample and its target through all transforms, step by step.
    pub fn call_pair(&self, data: T, target: T) -> (T, T) {
        self.transforms
            .iter()
            .fold((data, target), |(data, target), transform| {
                transform.call_pair(data, target)
            })
    }
}

impl<T> Default for Compose<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Transform<T> for Compose<T>
where
    T: 'static,
{
    fn call(&self, data: T) -> T {
        Compose::call(self, data)
    }

    fn call_pair(&self, data: T, target: T) -> (T, T) {
        Compose::call_pair(self, data, target)
    }
}

impl<T> Extend<Box<dyn Transform<T>>> for Compose<T> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Box<dyn Transform<T>>>,
    {
        self.transforms.extend(iter);
    }
}

impl<T> FromIterator<Box<dyn Transform<T>>> for Compose<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Transform<T>>>,
    {
        Self {
            transforms: iter.into_iter().collect(),
        }
    }
}

impl<T> Index<usize> for Compose<T> {
    type Output = dyn Transform<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &*self.transforms[index]
    }
}

impl<T> Display for Compose<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Compose [")?;
        for transform in &self.transforms {
            write!(f, "\n  {}", transform.name())?;
        }
        write!(f, "\n]")
    }
}

impl<T> Debug for Compose<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.transforms.iter().map(|transform| transform.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_pipeline() -> Result<()> {
        let mut pipeline: Compose<String> = Compose::new();
        pipeline.push(FnTransform::new("a", |s: String| s + "a"));
        pipeline.push(FnTransform::new("c", |s: String| s + "c"));
        pipeline.insert(1, FnTransform::new("b", |s: String| s + "b"))?;
        assert!(pipeline.insert(4, FnTransform::new("x", |s: String| s)).is_err());
        assert_eq!(pipeline.call(String::new()), "abc");
        assert_eq!(pipeline[1].name(), "b");

        let removed = pipeline.remove(0).unwrap();
        assert_eq!(removed.name(), "a");
        assert!(pipeline.remove(5).is_none());
        assert_eq!(pipeline.call(String::new()), "bc");

        pipeline.extend(vec![removed]);
        assert_eq!(
            pipeline.iter().map(|tf| tf.name().into_owned()).collect::<Vec<_>>(),
            ["b", "c", "a"]
        );
        Ok(())
    }

    #[test]
    fn nested_pipeline() {
        let inner: Compose<i32> = vec![
            Box::new(FnTransform::new("inc", |x: i32| x + 1)) as Box<dyn Transform<i32>>,
            Box::new(FnTransform::new("inc", |x: i32| x + 1)),
        ]
        .into_iter()
        .collect();
        let mut outer = Compose::new();
        outer.push(inner);
        outer.push(FnTransform::new("square", |x: i32| x * x));
        assert_eq!(outer.call(1), 9);
        assert_eq!(outer.to_string(), "Compose [\n  Compose\n  square\n]");
    }

    #[test]
    fn pair_goes_through_each_step() {
        let mut pipeline = Compose::new();
        pipeline.push(FnTransform::new("inc", |x: i32| x + 1));
        pipeline.push(FnTransform::new("double", |x: i32| x * 2));
        assert_eq!(pipeline.call_pair(1, 10), (4, 22));
    }
}
