use crate::lookup::DocnoIndex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Docnos and blocks using one forward format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormatStats {
    pub blocks: usize,
    pub docnos: u64,
}

/// Summary of an opened lookup file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupStats {
    pub docnos: u64,
    pub blocks: usize,
    pub formats: BTreeMap<&'static str, FormatStats>,
    pub file_size: u64,
    pub version: u64,
    pub inverse: Option<&'static str>,
}

impl LookupStats {
    pub fn collect(index: &DocnoIndex) -> Self {
        let forward = index.forward_lookup();
        let mut formats: BTreeMap<&'static str, FormatStats> = BTreeMap::new();
        for block in forward.blocks() {
            let entry = formats.entry(block.name()).or_default();
            entry.blocks += 1;
            entry.docnos += block.len() as u64;
        }
        Self {
            docnos: forward.len(),
            blocks: forward.blocks().len(),
            formats,
            file_size: index.file_len(),
            version: index.version(),
            inverse: index.inverse_format(),
        }
    }

    /// Pretty-printed JSON form, for scripts
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Average file bytes per docno
    pub fn bytes_per_docno(&self) -> f64 {
        if self.docnos == 0 {
            0.0
        } else {
            self.file_size as f64 / self.docnos as f64
        }
    }
}

impl fmt::Display for LookupStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lookup Statistics")?;
        writeln!(f, "=================")?;
        writeln!(f)?;
        writeln!(f, "Format version:   {}", self.version)?;
        writeln!(f, "Docno count:      {}", self.docnos)?;
        writeln!(f, "Block count:      {}", self.blocks)?;
        writeln!(f, "File size:        {}", format_size(self.file_size))?;
        writeln!(f, "Bytes per docno:  {:.2}", self.bytes_per_docno())?;
        writeln!(f, "Inverse index:    {}", self.inverse.unwrap_or("none"))?;

        if !self.formats.is_empty() {
            writeln!(f)?;
            writeln!(f, "Blocks by format:")?;
            let mut sorted: Vec<_> = self.formats.iter().collect();
            sorted.sort_by(|a, b| b.1.docnos.cmp(&a.1.docnos));
            for (format, stats) in sorted {
                writeln!(
                    f,
                    "  {:15} {} blocks, {} docnos",
                    format, stats.blocks, stats.docnos
                )?;
            }
        }
        Ok(())
    }
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildConfig;
    use tempfile::tempdir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_collect_counts_formats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.npids");
        let docnos: Vec<String> = (0..20).map(|i| format!("doc{}", i)).collect();
        let index = DocnoIndex::build(&docnos, &path, BuildConfig::default()).unwrap();

        let stats = index.stats();
        assert_eq!(stats.docnos, 20);
        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.formats["intsequence"], FormatStats { blocks: 1, docnos: 20 });
        assert_eq!(stats.inverse, Some("intsequence"));
        assert_eq!(stats.version, 1);
        assert!(stats.file_size > 0);
        assert!(stats.to_string().contains("intsequence"));
    }

    #[test]
    fn test_json_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("json.npids");
        let config = BuildConfig::default().with_min_block_size(2);
        let index = DocnoIndex::build(["d1", "d2", "x", "y"], &path, config).unwrap();

        let json: serde_json::Value = serde_json::from_str(&index.stats().to_json().unwrap()).unwrap();
        assert_eq!(json["docnos"], 4);
        assert_eq!(json["blocks"], 2);
        assert_eq!(json["formats"]["intsequence"]["docnos"], 2);
        assert_eq!(json["inverse"], "hash");
        assert_eq!(json["version"], 1);
    }
}
