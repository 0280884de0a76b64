use super::{convbatch, max_pool};
use crate::{common::*, network::Network};

/// Darknet19 classifier, the backbone of YOLOv2.
///
/// Feature layers are registered under `layers.0` and the classification
/// head under `layers.1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Darknet19Init {
    pub num_classes: usize,
    pub input_channels: usize,
}

impl Default for Darknet19Init {
    fn default() -> Self {
        Self {
            num_classes: 1000,
            input_channels: 3,
        }
    }
}

impl Darknet19Init {
    pub fn build<'p, P>(self, path: P) -> Result<Darknet19>
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
                    .add("1_convbatch", convbatch(input_channels, 32, 3))
                    .add("2_max", max_pool())
                    .add("3_convbatch", convbatch(32, 64, 3))
                    .add("4_max", max_pool())
                    .add("5_convbatch", convbatch(64, 128, 3))
                    .add("6_convbatch", convbatch(128, 64, 1))
                    .add("7_convbatch", convbatch(64, 128, 3))
                    .add("8_max", max_pool())
                    .add("9_convbatch", convbatch(128, 256, 3))
                    .add("10_convbatch", convbatch(256, 128, 1))
                    .add("11_convbatch", convbatch(128, 256, 3))
                    .add("12_max", max_pool())
                    .add("13_convbatch", convbatch(256, 512, 3))
                    .add("14_convbatch", convbatch(512, 256, 1))
                    .add("15_convbatch", convbatch(256, 512, 3))
                    .add("16_convbatch", convbatch(512, 256, 1))
                    .add("17_convbatch", convbatch(256, 512, 3))
                    .add("18_max", max_pool())
                    .add("19_convbatch", convbatch(512, 1024, 3))
                    .add("20_convbatch", convbatch(1024, 512, 1))
                    .add("21_convbatch", convbatch(512, 1024, 3))
                    .add("22_convbatch", convbatch(1024, 512, 1))
                    .add("23_convbatch", convbatch(512, 1024, 3))
                    .build()
            })
            .add("1", |path| {
                Sequential::builder(&path)
                    .add("24_conv", |path| {
                        Conv2DInit::new(1024, num_classes, 1, 1, 0).build(path)
                    })
                    .add("25_avgpool", |_| GlobalAvgPool2D::new())
                    .add("26_flatten", |_| Flatten::new())
                    .build()
            })
            .build();

        Ok(Darknet19 {
            num_classes,
            input_channels,
            layers: layers.into(),
        })
    }
}

#[derive(Debug)]
pub struct Darknet19 {
    num_classes: usize,
    input_channels: usize,
    layers: Layer,
}

impl Darknet19 {
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }
}

impl Network for Darknet19 {
    fn layers(&self) -> &Layer {
        &self.layers
    }

    fn stride(&self) -> usize {
        32
    }
}
