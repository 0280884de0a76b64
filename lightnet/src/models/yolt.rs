use super::{convbatch, max_pool};
use crate::{
    common::*,
    network::{Network, RemapRules},
};

/// Width and height of an anchor box in units of the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub w: R64,
    pub h: R64,
}

impl Anchor {
    pub fn new(w: f64, h: f64) -> Self {
        Self {
            w: r64(w),
            h: r64(h),
        }
    }
}

/// Yolt object detector.
///
/// A lightweight YOLOv2 variant with a stride of 16 tuned for small
/// objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoltInit {
    pub num_classes: usize,
    pub input_channels: usize,
    pub anchors: Vec<Anchor>,
}

impl Default for YoltInit {
    fn default() -> Self {
        Self {
            num_classes: 20,
            input_channels: 3,
            anchors: vec![
                Anchor::new(1.08, 1.19),
                Anchor::new(3.42, 4.41),
                Anchor::new(6.63, 11.38),
                Anchor::new(9.42, 5.11),
                Anchor::new(16.62, 10.52),
            ],
        }
    }
}

impl YoltInit {
    pub fn build<'p, P>(self, path: P) -> Result<Yolt>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let Self {
            num_classes,
            input_channels,
            anchors,
        } = self;
        ensure!(!anchors.is_empty(), "anchors must not be empty");
        ensure!(
            num_classes > 0 && input_channels > 0,
            "num_classes and input_channels must be positive"
        );

        let path = path.borrow();
        let layers = path / "layers";
        let out_c = anchors.len() * (5 + num_classes);
        let reorg = Reorg::new(2)?;

        let layers = LayerList::builder(&layers)
            // input = image
            .push(|path| {
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
                    .build()
            })
            // input = sequence 0
            .push(|path| {
                Sequential::builder(&path)
                    .add("12_max", max_pool())
                    .add("13_convbatch", convbatch(256, 512, 3))
                    .add("14_convbatch", convbatch(512, 256, 1))
                    .add("15_convbatch", convbatch(256, 512, 3))
                    .add("16_convbatch", convbatch(512, 256, 1))
                    .add("17_convbatch", convbatch(256, 512, 3))
                    .add("18_convbatch", convbatch(512, 1024, 3))
                    .add("19_convbatch", convbatch(1024, 1024, 3))
                    .build()
            })
            // input = sequence 0
            .push(|path| {
                Sequential::builder(&path)
                    .add("20_reorg", |_| reorg)
                    .build()
            })
            // input = cat(sequence 2, sequence 1)
            .push(|path| {
                Sequential::builder(&path)
                    .add("21_convbatch", convbatch(4 * 256 + 1024, 1024, 3))
                    .add("22_conv", |path| {
                        Conv2DInit::new(1024, out_c, 1, 1, 0).build(path)
                    })
                    .build()
            })
            .build();

        Ok(Yolt {
            num_classes,
            input_channels,
            anchors,
            layers: layers.into(),
            concat: Concat2D::new(),
        })
    }
}

#[derive(Debug)]
pub struct Yolt {
    num_classes: usize,
    input_channels: usize,
    anchors: Vec<Anchor>,
    layers: Layer,
    concat: Concat2D,
}

impl Yolt {
    /// Rules exporting [Darknet19](super::Darknet19) weights to this network.
    ///
    /// Layers 1 to 11 map to the first sequence and layers 12 to 17 to the
    /// second one.
    pub fn remap_darknet19() -> Result<RemapRules> {
        RemapRules::new([
            (r"^layers.0.([1-9]_)", "layers.0.${1}"),
            (r"^layers.0.(1[01]_)", "layers.0.${1}"),
            (r"^layers.0.([1][2-7]_)", "layers.1.${1}"),
        ])
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Number of output channels, `anchors × (5 + classes)`.
    pub fn out_channels(&self) -> usize {
        self.anchors.len() * (5 + self.num_classes)
    }
}

impl Network for Yolt {
    fn layers(&self) -> &Layer {
        &self.layers
    }

    fn stride(&self) -> usize {
        16
    }

    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let layers = self
            .layers
            .as_list()
            .ok_or_else(|| format_err!("Yolt layers must be a layer list"))?;

        let out0 = layers.forward_at(0, xs, train)?;
        let out1 = layers.forward_at(1, &out0, train)?;
        let out2 = layers.forward_at(2, &out0, train)?;
        let merged = self.concat.forward([&out2, &out1])?;
        layers.forward_at(3, &merged, train)
    }
}
