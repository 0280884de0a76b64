use crate::{common::*, config::LoadCheckpoint};
use regex::Regex;

pub const FILE_STRFTIME: &str = "%Y-%m-%d-%H-%M-%S.%3f%z";
pub const CHECKPOINT_EXTENSION: &str = "state";

/// Saves training state to a checkpoint file named after the time and the
/// batch count.
pub fn save_checkpoint(
    params: &HyperParameters,
    checkpoint_dir: &Path,
    batch: usize,
) -> Result<PathBuf> {
    let filename = format!(
        "{}_{:06}.{}",
        Local::now().format(FILE_STRFTIME),
        batch,
        CHECKPOINT_EXTENSION
    );
    let path = checkpoint_dir.join(filename);
    params.save(&path)?;
    Ok(path)
}

/// Locates the checkpoint file selected by the loading method.
///
/// Runs are searched under `logging_dir/*/checkpoints`.
pub fn find_checkpoint(
    logging_dir: &Path,
    load_checkpoint: &LoadCheckpoint,
) -> Result<Option<PathBuf>> {
    let path = match load_checkpoint {
        LoadCheckpoint::Disabled => {
            info!("checkpoint loading is disabled");
            None
        }
        LoadCheckpoint::FromRecent => {
            let checkpoint_filename_regex = Regex::new(&format!(
                r"^(\d{{4}}-\d{{2}}-\d{{2}}-\d{{2}}-\d{{2}}-\d{{2}}\.\d{{3}}[+-]\d{{4}})_\d{{6}}\.{}$",
                CHECKPOINT_EXTENSION
            ))?;

            let paths: Vec<PathBuf> = glob::glob(&format!(
                "{}/*/checkpoints/*.{}",
                logging_dir.display(),
                CHECKPOINT_EXTENSION
            ))?
            .try_collect()?;
            let checkpoint_file = paths
                .into_iter()
                .filter_map(|path| {
                    let file_name = path.file_name()?.to_str()?;
                    let captures = checkpoint_filename_regex.captures(file_name)?;
                    let datetime_str = captures.get(1)?.as_str();
                    let datetime = DateTime::parse_from_str(datetime_str, FILE_STRFTIME).ok()?;
                    Some((path, datetime))
                })
                .max_by_key(|(_path, datetime)| *datetime)
                .map(|(path, _datetime)| path);

            if checkpoint_file.is_none() {
                warn!("no checkpoint file found");
            }

            checkpoint_file
        }
        LoadCheckpoint::FromFile { file } => {
            if file.is_file() {
                Some(file.to_owned())
            } else {
                warn!("{} is not a file", file.display());
                None
            }
        }
    };

    Ok(path)
}
