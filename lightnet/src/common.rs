pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use futures::{
    future,
    stream::{self, Stream, StreamExt as _},
};
pub use image::{DynamicImage, GenericImageView as _, RgbImage};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools as _;
pub use log::{debug, error, info, warn};
pub use ndarray::Array3;
pub use noisy_float::prelude::*;
pub use rand::prelude::*;
pub use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
pub use std::{
    any::Any,
    borrow::{Borrow, Cow},
    collections::HashSet,
    fmt::{self, Debug, Display, Formatter},
    fs,
    iter::FromIterator,
    ops::{Deref, Index},
    path::{Path, PathBuf},
    pin::Pin,
    sync::{Arc, Mutex, Once},
};
pub use strum::AsRefStr;
pub use tch::{
    kind::{FLOAT_CPU, INT64_CPU},
    nn, Device, IndexOp, Kind, Tensor,
};
pub use tch_modules::{
    Concat2D, Conv2DInit, Conv2dBatchReLU, Conv2dBatchReLUInit, Flatten, GlobalAvgPool2D, Layer,
    LayerList, MaxPool2D, Reorg, Sequential,
};

/// Returns the last path segment of a type name.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}
