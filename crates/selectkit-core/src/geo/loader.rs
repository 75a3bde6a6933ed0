// crates/selectkit-core/src/geo/loader.rs

//! # Data Loader
//!
//! Handles the physical layer (I/O, decompression) and delegates to the
//! payload parsers (JSON source vs. bincode snapshot).

use super::model::CountriesRaw;
use super::GeographyIndex;
use crate::error::{Result, SelectError};
#[cfg(feature = "json")]
use once_cell::sync::OnceCell;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "json")]
static BUNDLED: OnceCell<GeographyIndex> = OnceCell::new();

#[cfg(feature = "json")]
const BUNDLED_JSON: &str = include_str!("../../data/geography.json");

/// Payload format, decided from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Binary,
}

fn detect(path: &Path) -> Result<(Format, bool)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let (stem, gzip) = match name.strip_suffix(".gz") {
        Some(stem) => (stem, true),
        None => (name.as_str(), false),
    };
    if stem.ends_with(".json") {
        Ok((Format::Json, gzip))
    } else if stem.ends_with(".bin") {
        Ok((Format::Binary, gzip))
    } else {
        Err(SelectError::InvalidData(format!(
            "unrecognised dataset extension: {}",
            path.display()
        )))
    }
}

impl GeographyIndex {
    pub fn default_data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    pub fn default_dataset_filename() -> &'static str {
        "geography.json"
    }

    /// The small dataset compiled into the crate, parsed once per process.
    #[cfg(feature = "json")]
    pub fn bundled() -> Result<&'static GeographyIndex> {
        BUNDLED.get_or_try_init(|| Self::from_json_str(BUNDLED_JSON))
    }

    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: CountriesRaw = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    #[cfg(feature = "json")]
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: CountriesRaw = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    pub fn from_binary_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(bincode::deserialize_from(reader)?)
    }

    /// Loads `.json`, `.bin`, or their `.gz` variants.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (format, gzip) = detect(path)?;
        let reader = open_stream(path, gzip)?;
        let index = match format {
            #[cfg(feature = "json")]
            Format::Json => Self::from_json_reader(reader)?,
            #[cfg(not(feature = "json"))]
            Format::Json => {
                return Err(SelectError::InvalidData(
                    "JSON datasets need the `json` feature".into(),
                ))
            }
            Format::Binary => Self::from_binary_reader(reader)?,
        };
        tracing::debug!(path = %path.display(), stats = ?index.stats(), "loaded geography dataset");
        Ok(index)
    }

    /// Writes a bincode snapshot (gzip-compressed when `path` ends in `.gz`).
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (format, gzip) = detect(path)?;
        if format != Format::Binary {
            return Err(SelectError::InvalidData(format!(
                "snapshot path must end in .bin or .bin.gz: {}",
                path.display()
            )));
        }
        let file = File::create(path)?;
        let mut writer = create_stream(BufWriter::new(file), gzip)?;
        bincode::serialize_into(&mut writer, self)?;
        // Dropping a gzip encoder writes its trailer; flush surfaces I/O errors first.
        writer.flush()?;
        Ok(())
    }
}

// -----------------------------------------------------------------------
// INTERNAL TRANSPORT HELPERS
// -----------------------------------------------------------------------

/// Opens a file, buffers it, and optionally wraps it in a Gzip decoder.
fn open_stream(path: &Path, gzip: bool) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| {
        SelectError::NotFound(format!("Dataset not found at {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);

    if !gzip {
        return Ok(Box::new(reader));
    }

    #[cfg(feature = "compact")]
    {
        use flate2::read::GzDecoder;
        Ok(Box::new(GzDecoder::new(reader)))
    }

    #[cfg(not(feature = "compact"))]
    {
        Err(SelectError::InvalidData(format!(
            "{} is gzip-compressed; enable the `compact` feature",
            path.display()
        )))
    }
}

fn create_stream<W: Write + 'static>(writer: W, gzip: bool) -> Result<Box<dyn Write>> {
    if !gzip {
        return Ok(Box::new(writer));
    }

    #[cfg(feature = "compact")]
    {
        use flate2::{write::GzEncoder, Compression};
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }

    #[cfg(not(feature = "compact"))]
    {
        Err(SelectError::InvalidData(
            "gzip snapshots need the `compact` feature".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::tests::fixture;

    #[test]
    fn detects_formats_by_extension() {
        assert_eq!(detect(Path::new("a/geo.json")).unwrap(), (Format::Json, false));
        assert_eq!(detect(Path::new("geo.JSON.gz")).unwrap(), (Format::Json, true));
        assert_eq!(detect(Path::new("geo.bin")).unwrap(), (Format::Binary, false));
        assert!(detect(Path::new("geo.csv")).is_err());
    }

    #[test]
    fn binary_snapshot_round_trips_lookups() {
        let dir = std::env::temp_dir().join(format!("selectkit-snap-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("geo.bin");

        fixture().save_binary(&path).unwrap();
        let loaded = GeographyIndex::load_from_path(&path).unwrap();
        assert_eq!(loaded.primary_postal_code_of("CO", "Cundinamarca", "Soacha"), "250051");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = GeographyIndex::load_from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SelectError::NotFound(_)));
    }

    #[cfg(feature = "json")]
    #[test]
    fn bundled_dataset_has_colombia() {
        let idx = GeographyIndex::bundled().unwrap();
        assert!(idx.has_data("CO"));
        assert_eq!(idx.primary_postal_code_of("CO", "Valle del Cauca", "Cali"), "760001");
    }
}
