//! The training worker.

use crate::{
    common::*,
    config::{Config, ExportConfig, ModelConfig, MultiScaleConfig, TrainingConfig},
    utils::{self, RateCounter},
    Loader,
};

const NETWORK: &str = "network";
const SCHEDULER: &str = "lr_scheduler";

/// Messages sent from the feeding worker.
#[derive(Debug)]
pub enum Message {
    Batch { images: Tensor, labels: Tensor },
    EndOfEpoch,
}

/// Builds the configured classifier and runs the training loop on it.
pub fn training_worker(
    config: Arc<Config>,
    checkpoint_dir: Arc<PathBuf>,
    loader: Arc<Loader>,
    data_rx: mpsc::Receiver<Message>,
) -> Result<()> {
    let dataset_classes = loader.dataset().num_classes();

    match config.model {
        ModelConfig::Darknet19 { num_classes } => {
            let init = Darknet19Init {
                num_classes: num_classes.unwrap_or(dataset_classes),
                ..Default::default()
            };
            run(&config, &checkpoint_dir, &loader, data_rx, move |path| {
                init.build(path)
            })
        }
        ModelConfig::Darknet { num_classes } => {
            let init = DarknetInit {
                num_classes: num_classes.unwrap_or(dataset_classes),
                ..Default::default()
            };
            run(&config, &checkpoint_dir, &loader, data_rx, move |path| {
                init.build(path)
            })
        }
    }
}

fn run<N, F>(
    config: &Config,
    checkpoint_dir: &Path,
    loader: &Loader,
    mut data_rx: mpsc::Receiver<Message>,
    build: F,
) -> Result<()>
where
    N: 'static + Network,
    F: FnOnce(&nn::Path) -> Result<N>,
{
    let Config {
        ref logging,
        training:
            TrainingConfig {
                epochs,
                max_batches,
                ref lr_schedule,
                momentum,
                weight_decay,
                save_checkpoint_steps,
                ref load_checkpoint,
                device,
                ..
            },
        ref multi_scale,
        ref export,
        params: ref extra_params,
        ..
    } = *config;

    // initialize model
    info!("initializing model on {:?}", device);
    let net = Lightnet::new(device, build)?;
    let scheduler = LrScheduler::new(lr_schedule, None)?;
    let mut optimizer = nn::Sgd {
        momentum: momentum.raw(),
        dampening: 0.0,
        wd: weight_decay.raw(),
        nesterov: false,
    }
    .build(net.var_store(), scheduler.lr())?;

    let mut params = HyperParameters::from_values(extra_params.clone());
    params.set_state(NETWORK, net)?;
    params.set_state(SCHEDULER, scheduler)?;

    // load checkpoint
    if let Some(path) = utils::find_checkpoint(&logging.dir, load_checkpoint)? {
        params.load(&path, true)?;
        info!(
            "resume from epoch {} batch {}",
            params.epoch(),
            params.batch()
        );
    }
    info!("{}", params);

    let mut rate_counter = RateCounter::with_second_interval();
    let mut instant = Instant::now();

    while params.epoch() < epochs {
        if matches!(max_batches, Some(max) if params.batch() >= max) {
            info!("reached the maximum number of batches");
            break;
        }

        let (images, labels) = match data_rx.blocking_recv() {
            Some(Message::Batch { images, labels }) => (images, labels),
            Some(Message::EndOfEpoch) => {
                let epoch = params.increment_epoch();
                info!("finished epoch {}", epoch);
                continue;
            }
            None => bail!("the data stream ended unexpectedly"),
        };
        let batch_size = images.size()[0];
        let (height, width) = {
            let size = images.size();
            (size[2], size[3])
        };

        // forward and optimize
        let lr = scheduler_mut(&mut params)?.next();
        optimizer.set_lr(lr);

        let loss = {
            let net = network::<N>(&params)?;
            let logits = net.forward_t(&images.to_device(device), true)?;
            logits.cross_entropy_for_logits(&labels.to_device(device))
        };
        optimizer.backward_step(&loss);
        let batch = params.increment_batch();

        // print message
        rate_counter.add(batch_size as f64);
        if let Some(rate) = rate_counter.rate() {
            info!("epoch: {}\tbatch: {}\trate: {:.2} samples/s", params.epoch(), batch, rate);
        }
        {
            let elapsed = instant.elapsed();
            instant = Instant::now();
            info!(
                "batch: {}\tlr: {:.5}\tloss: {:.5}\tdim: {}x{}\telapsed: {:.3}s",
                batch,
                lr,
                loss.double_value(&[]),
                width,
                height,
                elapsed.as_secs_f64()
            );
        }

        // pick another input dimension
        if let Some(MultiScaleConfig {
            interval,
            multiple,
            random_range,
        }) = *multi_scale
        {
            if batch % interval.get() == 0 {
                loader.change_input_dim(multiple, Some(random_range))?;
            }
        }

        // save checkpoint
        if let Some(steps) = save_checkpoint_steps {
            if batch % steps.get() == 0 {
                let path = utils::save_checkpoint(&params, checkpoint_dir, batch)?;
                info!("saved checkpoint file '{}'", path.display());
            }
        }
    }

    let path = utils::save_checkpoint(&params, checkpoint_dir, params.batch())?;
    info!("saved final checkpoint file '{}'", path.display());

    // export weights
    if let Some(ExportConfig { file, remap }) = export {
        let rules = remap.as_ref().map(|remap| remap.rules()).transpose()?;
        network::<N>(&params)?.save(file, rules.as_ref())?;
        info!("exported weights to '{}'", file.display());
    }

    Ok(())
}

fn network<N>(params: &HyperParameters) -> Result<&Lightnet<N>>
where
    N: 'static + Network,
{
    params
        .state::<Lightnet<N>>(NETWORK)
        .ok_or_else(|| format_err!("the network is missing in hyperparameters"))
}

fn scheduler_mut(params: &mut HyperParameters) -> Result<&mut LrScheduler> {
    params
        .state_mut::<LrScheduler>(SCHEDULER)
        .ok_or_else(|| format_err!("the learning rate scheduler is missing in hyperparameters"))
}
