// ABOUTME: Parsing of the env sample file that lists required configuration keys.
// ABOUTME: The file is dotenv syntax; only the keys matter, example values are ignored.

use std::io::Read;
use std::path::Path;

use super::DescriptorError;

/// Keys declared in an env sample, in file order.
pub fn parse_env_sample(content: &str) -> Result<Vec<String>, DescriptorError> {
    collect_keys(dotenvy::from_read_iter(content.as_bytes()))
}

pub fn read_env_sample(path: &Path) -> Result<Vec<String>, DescriptorError> {
    let entries = dotenvy::from_path_iter(path).map_err(sample_error)?;
    collect_keys(entries)
}

fn collect_keys<R: Read>(entries: dotenvy::Iter<R>) -> Result<Vec<String>, DescriptorError> {
    let mut keys: Vec<String> = Vec::new();
    for entry in entries {
        let (key, _) = entry.map_err(sample_error)?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    Ok(keys)
}

fn sample_error(err: dotenvy::Error) -> DescriptorError {
    match err {
        dotenvy::Error::Io(io) => DescriptorError::Io(io),
        other => DescriptorError::InvalidSample(other),
    }
}
