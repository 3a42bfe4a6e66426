//! OpenCC JSON configuration.
//!
//! ```json
//! {
//!   "name": "Simplified Chinese to Traditional Chinese",
//!   "segmentation": {
//!     "type": "mmseg",
//!     "dict": { "type": "text", "file": "STPhrases.txt" }
//!   },
//!   "conversion_chain": [{
//!     "dict": {
//!       "type": "group",
//!       "dicts": [
//!         { "type": "text", "file": "STPhrases.txt" },
//!         { "type": "text", "file": "STCharacters.txt" }
//!       ]
//!     }
//!   }]
//! }
//! ```
//!
//! Dictionary files are resolved against the directory holding the
//! configuration file. Only plain text dictionaries are supported.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use serde::Deserialize;
use tracing::info;

use crate::converter::{Conversion, ConversionChain, Converter, MaxMatchSegmentation};
use crate::dict::{DictGroup, DictRef, TextDict};
use crate::error::{OpenccError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DictConfig {
    Text { file: String },
    Group { dicts: Vec<DictConfig> },
    Ocd { file: String },
    Ocd2 { file: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub dict: DictConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    pub dict: DictConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub segmentation: Option<SegmentationConfig>,
    #[serde(default)]
    pub conversion_chain: Vec<ConversionConfig>,
}

impl ConverterConfig {
    pub fn from_json_str(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| OpenccError::Json {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Read and build the converter described by the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Converter> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| OpenccError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        let config = Self::from_json_str(&content, path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let converter = config.build(base_dir)?;
        info!(
            "loaded opencc config {} ({} conversions)",
            path.display(),
            converter.conversion_chain().conversions().len()
        );
        Ok(converter)
    }

    /// Build the converter, loading dictionaries relative to `base_dir`.
    pub fn build(&self, base_dir: &Path) -> Result<Converter> {
        let mut loader = DictLoader {
            base_dir,
            loaded: AHashMap::new(),
        };
        let segmentation = match &self.segmentation {
            Some(seg) if seg.kind == "mmseg" => {
                Some(MaxMatchSegmentation::new(loader.load(&seg.dict)?))
            }
            Some(seg) => return Err(OpenccError::UnsupportedSegmentation(seg.kind.clone())),
            None => None,
        };
        let conversions = self
            .conversion_chain
            .iter()
            .map(|c| loader.load(&c.dict).map(Conversion::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Converter::new(
            self.name.clone(),
            segmentation,
            ConversionChain::new(conversions),
        ))
    }
}

/// Loads each dictionary file once per configuration.
struct DictLoader<'a> {
    base_dir: &'a Path,
    loaded: AHashMap<PathBuf, DictRef>,
}

impl DictLoader<'_> {
    fn load(&mut self, config: &DictConfig) -> Result<DictRef> {
        match config {
            DictConfig::Text { file } => {
                let path = self.base_dir.join(file);
                if let Some(dict) = self.loaded.get(&path) {
                    return Ok(Arc::clone(dict));
                }
                let dict: DictRef = Arc::new(TextDict::load(&path)?);
                self.loaded.insert(path, Arc::clone(&dict));
                Ok(dict)
            }
            DictConfig::Group { dicts } => {
                let dicts = dicts
                    .iter()
                    .map(|d| self.load(d))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(DictGroup::new(dicts)))
            }
            DictConfig::Ocd { file } | DictConfig::Ocd2 { file } => {
                Err(OpenccError::UnsupportedDict(file.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_and_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chars.txt"), "里\t里 裏\n").unwrap();
        fs::write(
            dir.path().join("s2t.json"),
            r#"{
                "name": "s2t",
                "segmentation": { "type": "mmseg", "dict": { "type": "text", "file": "chars.txt" } },
                "conversion_chain": [{ "dict": { "type": "group", "dicts": [
                    { "type": "text", "file": "chars.txt" }
                ] } }]
            }"#,
        )
        .unwrap();

        let converter = ConverterConfig::load(dir.path().join("s2t.json")).unwrap();
        assert_eq!(converter.name(), "s2t");
        assert_eq!(converter.conversion_chain().conversions().len(), 1);
        assert_eq!(converter.convert("这里"), "这里");
    }

    #[test]
    fn test_binary_dicts_are_rejected() {
        let config = ConverterConfig::from_json_str(
            r#"{ "conversion_chain": [{ "dict": { "type": "ocd2", "file": "STPhrases.ocd2" } }] }"#,
            Path::new("s2t.json"),
        )
        .unwrap();
        let err = config.build(Path::new(".")).unwrap_err();
        assert!(matches!(err, OpenccError::UnsupportedDict(f) if f == "STPhrases.ocd2"));
    }

    #[test]
    fn test_unknown_dict_type_is_a_json_error() {
        let err = ConverterConfig::from_json_str(
            r#"{ "conversion_chain": [{ "dict": { "type": "marisa", "file": "x" } }] }"#,
            Path::new("bad.json"),
        )
        .unwrap_err();
        assert!(matches!(err, OpenccError::Json { .. }));
    }

    #[test]
    fn test_missing_dict_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("c.json"),
            r#"{ "conversion_chain": [{ "dict": { "type": "text", "file": "nope.txt" } }] }"#,
        )
        .unwrap();
        let err = ConverterConfig::load(dir.path().join("c.json")).unwrap_err();
        assert!(matches!(err, OpenccError::Io { .. }));
    }

    #[test]
    fn test_unsupported_segmentation() {
        let config = ConverterConfig::from_json_str(
            r#"{ "segmentation": { "type": "jieba", "dict": { "type": "group", "dicts": [] } } }"#,
            Path::new("c.json"),
        )
        .unwrap();
        assert!(matches!(
            config.build(Path::new(".")),
            Err(OpenccError::UnsupportedSegmentation(_))
        ));
    }
}
