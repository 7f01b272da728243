//! Archive manifest boundary.
//!
//! The archive's `META-INF/MANIFEST.MF` is RFC-822-style `Key: Value`
//! text; a line beginning with a single space continues the previous
//! line and is rejoined before parsing. Three keys are consumed:
//! `Main-Dalf` (primary module path), `Dalfs` (every linked module path,
//! comma-separated, primary included), and `Sdk-Version` (selects the
//! schema generation). Everything else is ignored.

use crate::decode::Generation;
use crate::error::ManifestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: Option<String>,
    pub main_dalf: String,
    pub dalfs: Vec<String>,
    pub sdk_version: String,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut unfolded: Vec<String> = Vec::new();
        for line in text.lines() {
            match line.strip_prefix(' ') {
                Some(rest) if !unfolded.is_empty() => {
                    unfolded.last_mut().unwrap().push_str(rest);
                }
                _ => unfolded.push(line.to_string()),
            }
        }

        let mut name = None;
        let mut main_dalf = None;
        let mut dalfs: Option<Vec<String>> = None;
        let mut sdk_version = None;

        for line in &unfolded {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "Name" => name = Some(value.to_string()),
                "Main-Dalf" => main_dalf = Some(value.to_string()),
                "Dalfs" => {
                    dalfs = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                            .map(str::to_string)
                            .collect(),
                    )
                }
                "Sdk-Version" => sdk_version = Some(value.to_string()),
                _ => {}
            }
        }

        let main_dalf = main_dalf.ok_or(ManifestError::MissingKey("Main-Dalf"))?;
        let dalfs = dalfs.ok_or(ManifestError::MissingKey("Dalfs"))?;
        if dalfs.is_empty() {
            return Err(ManifestError::EmptyDalfs);
        }
        let sdk_version = sdk_version.ok_or(ManifestError::MissingKey("Sdk-Version"))?;

        Ok(Self {
            name,
            main_dalf,
            dalfs,
            sdk_version,
        })
    }

    /// Schema generation declared by the SDK version: the two older majors
    /// use generation A, the newest uses generation B.
    pub fn generation(&self) -> Result<Generation, ManifestError> {
        match self.sdk_version.split('.').next().unwrap_or("") {
            "1" | "2" => Ok(Generation::A),
            "3" => Ok(Generation::B),
            _ => Err(ManifestError::UnsupportedSdkVersion(
                self.sdk_version.clone(),
            )),
        }
    }
}

/// Package identifier: the trailing `-<64 hex>` segment of the primary
/// module's file name.
pub fn package_id(main_dalf: &str) -> Result<String, ManifestError> {
    let file = main_dalf.rsplit('/').next().unwrap_or(main_dalf);
    let stem = file.strip_suffix(".dalf").unwrap_or(file);
    let hash = stem
        .rsplit_once('-')
        .map(|(_, hash)| hash)
        .filter(|hash| hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| ManifestError::BadPackageId(file.to_string()))?;
    Ok(hash.to_string())
}
