pub use anyhow::{bail, ensure, format_err, Context, Result};
pub use itertools::Itertools;
pub use noisy_float::prelude::*;
pub use std::{
    borrow::Borrow,
    fmt::{self, Display, Formatter},
};
pub use strum::AsRefStr;
pub use tch::{
    nn::{self, Module as _, ModuleT as _},
    Device, IndexOp, Kind, Tensor,
};
pub use tch_act::{Activation, TensorActivationExt as _};
