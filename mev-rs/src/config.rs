use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read config from `{path}`: {source}")]
    Io { path: String, source: std::io::Error },
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub fn from_toml_file<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, Error> {
    let path = path.as_ref();
    let config_data = std::fs::read_to_string(path)
        .map_err(|source| Error::Io { path: path.display().to_string(), source })?;
    toml::from_str(&config_data).map_err(From::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Example {
        name: String,
        count: usize,
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("mev-rs-config-does-not-exist.toml");
        let result = from_toml_file::<_, Example>(&path);
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir()
            .join(format!("mev-rs-config-{}.toml", std::process::id()));
        std::fs::write(&path, "name = \"builder\"\ncount = 3\n").unwrap();
        let example = from_toml_file::<_, Example>(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(example.name, "builder");
        assert_eq!(example.count, 3);
    }
}
