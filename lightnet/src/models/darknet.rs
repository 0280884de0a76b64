use super::{convbatch, max_pool};
use crate::{common::*, network::Network};

/// Darknet reference classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarknetInit {
    pub num_classes: usize,
    pub input_channels: usize,
}

impl Default for DarknetInit {
    fn default() -> Self {
        Self {
            num_classes: 1000,
            input_channels: 3,
        }
    }
}

impl DarknetInit {
    pub fn build<'p, P>(self, path: P) -> Result<Darknet>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let Self {
            num_classes,
            input_channels,
        } = self;
        ensure!(
            num_classes > 0 && input_channels > 0,
            "num_classes and input_channels must be positive"
        );

        let path = path.borrow();
        let layers = path / "layers";

        let layers = Sequential::builder(&layers)
            .add("0", |path| {
                Sequential::builder(&path)
                    .add("1_convbatch", convbatch(input_channels, 16, 3))
                    .add("2_max", max_pool())
                    .add("3_convbatch", convbatch(16, 32, 3))
                    .add("4_max", max_pool())
                    .add("5_convbatch", convbatch(32, 64, 3))
                    .add("6_max", max_pool())
                    .add("7_convbatch", convbatch(64, 128, 3))
                    .add("8_max", max_pool())
                    .add("9_convbatch", convbatch(128, 256, 3))
                    .add("10_max", max_pool())
                    .add("11_convbatch", convbatch(256, 512, 3))
                    .add("12_max", max_pool())
                    .add("13_convbatch", convbatch(512, 1024, 3))
                    .build()
            })
            .add("1", |path| {
                Sequential::builder(&path)
                    .add("14_avgpool", |_| GlobalAvgPool2D::new())
                    .add("15_conv", |path| {
                        Conv2DInit::new(1024, num_classes, 1, 1, 0).build(path)
                    })
                    .add("16_flatten", |_| Flatten::new())
                    .build()
            })
            .build();

        Ok(Darknet {
            num_classes,
            input_channels,
            layers: layers.into(),
        })
    }
}

#[derive(Debug)]
pub struct Darknet {
    num_classes: usize,
    input_channels: usize,
    layers: Layer,
}

impl Darknet {
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }
}

impl Network for Darknet {
    fn layers(&self) -> &Layer {
        &self.layers
    }

    fn stride(&self) -> usize {
        32
    }
}
