use anyhow::Result;
use lightnet::{
    engine::{HyperParameters, Stateful},
    layer::{Layer, LayerList, Sequential},
    models::{Darknet19, Darknet19Init, DarknetInit, Yolt, YoltInit},
    network::{Lightnet, Network},
};
use tch::{kind::FLOAT_CPU, nn, Device, Tensor};

fn darknet19(num_classes: usize) -> Result<Lightnet<Darknet19>> {
    Lightnet::new(Device::Cpu, |path| {
        Darknet19Init {
            num_classes,
            ..Default::default()
        }
        .build(path)
    })
}

fn yolt() -> Result<Lightnet<Yolt>> {
    Lightnet::new(Device::Cpu, |path| YoltInit::default().build(path))
}

#[test]
fn darknet19_output_shape() -> Result<()> {
    let net = darknet19(10)?;
    assert_eq!(net.stride(), 32);

    let input = Tensor::rand(&[2, 3, 64, 64], FLOAT_CPU);
    let output = net.forward_t(&input, false)?;
    assert_eq!(output.size(), [2, 10]);

    let names: Vec<_> = net
        .named_layer_loop()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names.len(), 26);
    assert_eq!(names[0], "1_convbatch");
    assert_eq!(names[25], "26_flatten");
    Ok(())
}

#[test]
fn darknet_reference_output_shape() -> Result<()> {
    let net = Lightnet::new(Device::Cpu, |path| {
        DarknetInit {
            num_classes: 7,
            ..Default::default()
        }
        .build(path)
    })?;
    let output = net.forward_t(&Tensor::rand(&[1, 3, 64, 64], FLOAT_CPU), false)?;
    assert_eq!(output.size(), [1, 7]);
    Ok(())
}

#[test]
fn yolt_output_shape() -> Result<()> {
    let net = yolt()?;
    assert_eq!(net.stride(), 16);
    assert_eq!(net.network().out_channels(), 125);

    let input = Tensor::rand(&[1, 3, 64, 96], FLOAT_CPU);
    let output = net.forward_t(&input, false)?;
    assert_eq!(output.size(), [1, 125, 4, 6]);
    Ok(())
}

#[test]
fn yolt_rejects_empty_anchors() {
    let result = Lightnet::new(Device::Cpu, |path| {
        YoltInit {
            anchors: vec![],
            ..Default::default()
        }
        .build(path)
    });
    assert!(result.is_err());
}

#[test]
fn export_darknet19_to_yolt() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("darknet19_yolt.ot");

    let darknet = darknet19(1000)?;
    let rules = Yolt::remap_darknet19()?;
    darknet.save(&path, Some(&rules))?;

    let mut yolt = yolt()?;
    assert!(yolt.load(&path, true).is_err());
    let summary = yolt.load(&path, false)?;
    assert!(summary.unexpected.is_empty());
    assert!(!summary.missing.is_empty());
    // 13 conv blocks with 5 tensors each
    assert_eq!(summary.loaded.len(), 13 * 5);

    let src = darknet.var_store().variables();
    let dst = yolt.var_store().variables();
    let pairs = [
        (
            "layers.0.1_convbatch.layers.0.weight",
            "layers.0.1_convbatch.layers.0.weight",
        ),
        (
            "layers.0.11_convbatch.layers.1.bias",
            "layers.0.11_convbatch.layers.1.bias",
        ),
        (
            "layers.0.17_convbatch.layers.0.weight",
            "layers.1.17_convbatch.layers.0.weight",
        ),
    ];
    for (src_key, dst_key) in pairs {
        assert!(src[src_key].equal(&dst[dst_key]), "{} differs", dst_key);
    }
    assert!(!dst.contains_key("layers.0.19_convbatch.layers.0.weight"));
    Ok(())
}

#[test]
fn save_and_load_full_weights() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("yolt.ot");

    let src = yolt()?;
    src.save(&path, None)?;
    let mut dst = yolt()?;
    let summary = dst.load(&path, true)?;
    assert!(summary.is_complete());

    let key = "layers.3.22_conv.weight";
    assert!(src.var_store().variables()[key].equal(&dst.var_store().variables()[key]));
    Ok(())
}

#[test]
fn network_state_in_hyperparameters() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("train.state");

    let mut params = HyperParameters::new();
    params.set_state("network", yolt()?)?;
    params.set_batch(42);
    params.save(&path)?;
    let expected = params
        .state::<Lightnet<Yolt>>("network")
        .expect("network should be stored")
        .state_dict()?;

    let mut restored = HyperParameters::new();
    restored.set_state("network", yolt()?)?;
    restored.load(&path, true)?;
    assert_eq!(restored.batch(), 42);

    let actual = restored
        .state::<Lightnet<Yolt>>("network")
        .expect("network should be restored")
        .state_dict()?;
    for (key, tensor) in &expected.tensors {
        assert!(tensor.equal(&actual.tensors[key]), "{} differs", key);
    }
    Ok(())
}

#[test]
fn partial_network_state_in_hyperparameters() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("train.state");

    let mut params = HyperParameters::new();
    params.set_state("network", darknet19(1000)?)?;
    params.set_epoch(2);
    params.save(&path)?;
    let saved = params
        .state::<Lightnet<Darknet19>>("network")
        .expect("network should be stored")
        .state_dict()?;

    let mut strict = HyperParameters::new();
    strict.set_state("network", yolt()?)?;
    assert!(strict.load(&path, true).is_err());

    let mut relaxed = HyperParameters::new();
    relaxed.set_state("network", yolt()?)?;
    relaxed.set("anchors_note", "kept")?;
    relaxed.load(&path, false)?;
    assert_eq!(relaxed.epoch(), 2);
    assert_eq!(relaxed.get::<String>("anchors_note")?, "kept");

    let loaded = relaxed
        .state::<Lightnet<Yolt>>("network")
        .expect("network should be restored")
        .state_dict()?;
    let key = "layers.0.11_convbatch.layers.0.weight";
    assert!(saved.tensors[key].equal(&loaded.tensors[key]));
    assert!(!loaded.tensors.contains_key("layers.0.17_convbatch.layers.0.weight"));
    Ok(())
}

#[test]
fn device_follows_moves() -> Result<()> {
    let device = Device::cuda_if_available();
    let mut params = HyperParameters::new();
    params.set_state("network", darknet19(10)?)?;
    params.to_device(device)?;

    let net = params
        .state::<Lightnet<Darknet19>>("network")
        .expect("network should be stored");
    assert_eq!(net.device(), device);
    assert!(net
        .var_store()
        .variables()
        .values()
        .all(|var| var.device() == device));
    Ok(())
}

#[derive(Debug)]
struct Chain {
    layers: Layer,
}

impl Network for Chain {
    fn layers(&self) -> &Layer {
        &self.layers
    }

    fn stride(&self) -> usize {
        1
    }
}

#[test]
fn default_forward_loops_over_layer_list() -> Result<()> {
    let vs = nn::VarStore::new(Device::Cpu);
    let root = vs.root();
    let layers = LayerList::builder(&root)
        .push(|path| {
            Sequential::builder(&path)
                .add("conv", |path| {
                    lightnet::layer::Conv2DInit::new(3, 4, 1, 1, 0).build(path)
                })
                .build()
        })
        .push(|_| lightnet::layer::Flatten::new())
        .build();
    let net = Chain {
        layers: layers.into(),
    };

    let output = net.forward_t(&Tensor::rand(&[1, 3, 2, 2], FLOAT_CPU), false)?;
    assert_eq!(output.size(), [1, 16]);

    let leaf = Chain {
        layers: lightnet::layer::Flatten::new().into(),
    };
    assert!(leaf.forward_t(&Tensor::rand(&[1, 3, 2, 2], FLOAT_CPU), false).is_err());
    Ok(())
}
