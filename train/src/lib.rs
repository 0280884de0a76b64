//! The classification pretraining program of the lightnet models.

pub mod common;
pub mod config;
pub mod train;
pub mod utils;

use crate::{
    common::*,
    config::{Config, DatasetConfig, TrainingConfig},
    train::Message,
};

/// The data loader feeding the training program.
pub type Loader = DataLoader<ImageFolderDataset, ClassificationCollate>;

/// The entry of training program.
pub async fn start(config: Arc<Config>) -> Result<()> {
    let start_time = Local::now();
    let logging_dir = config
        .logging
        .dir
        .join(format!("{}", start_time.format(utils::FILE_STRFTIME)));
    let checkpoint_dir = Arc::new(logging_dir.join("checkpoints"));

    // create dirs and save config
    {
        tokio::fs::create_dir_all(&*checkpoint_dir).await?;
        let path = logging_dir.join("config.json5");
        let text = serde_json::to_string_pretty(&*config)?;
        tokio::fs::write(&path, text).await?;
    }

    // load dataset
    info!("loading dataset");
    let loader = {
        let config = config.clone();
        Arc::new(tokio::task::spawn_blocking(move || build_loader(&config)).await??)
    };

    let (data_tx, data_rx) = mpsc::channel(2);

    // feeding worker
    let feeding_future = {
        let loader = loader.clone();

        tokio::task::spawn(async move {
            loop {
                let mut stream = loader.stream();

                while let Some(result) = stream.next().await {
                    let (images, labels) = result?;
                    if data_tx
                        .send(Message::Batch { images, labels })
                        .await
                        .is_err()
                    {
                        // the training worker has finished
                        return Fallible::Ok(());
                    }
                }

                if data_tx.send(Message::EndOfEpoch).await.is_err() {
                    return Ok(());
                }
            }
        })
        .map(|result| Fallible::Ok(result??))
    };

    // training worker
    let training_future = tokio::task::spawn_blocking(move || {
        train::training_worker(config, checkpoint_dir, loader, data_rx)
    })
    .map(|result| Fallible::Ok(result??));

    futures::try_join!(feeding_future, training_future)?;

    Ok(())
}

/// Builds the data loader from the dataset and training options.
pub fn build_loader(config: &Config) -> Result<Loader> {
    let Config {
        dataset:
            DatasetConfig {
                ref dir,
                input_dim,
                horizontal_flip_prob,
            },
        training:
            TrainingConfig {
                batch_size,
                num_workers,
                shuffle,
                seed,
                ..
            },
        ..
    } = *config;

    let mut dataset = ImageFolderDataset::new(dir, input_dim)?;
    if let Some(prob) = horizontal_flip_prob {
        let mut transform: Compose<Option<TransformData>> = Compose::new();
        transform.push(RandomFlip::new(prob.raw())?);
        dataset = dataset.with_transform(transform);
    }

    let loader = DataLoader::new(
        dataset,
        ClassificationCollate,
        DataLoaderConfig {
            batch_size: batch_size.get(),
            shuffle,
            drop_last: true,
            num_workers: num_workers.get(),
            seed,
        },
    )?;
    ensure!(
        !loader.is_empty(),
        "the dataset has fewer samples than a batch"
    );

    Ok(loader)
}
