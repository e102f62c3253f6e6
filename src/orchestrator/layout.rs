// Directory layout of experiment data
//
// Runs live under
//   <root>/<platform>/<benchmark>/<linux>/<allocator>/<dataKind>/<corun>/[<workingSet>/]<utilization>/<index>
// with one file per repetition, named by its index.

use crate::error::{AnalysisError, Result};
use crate::perf_log::Platform;
use crate::store::FileId;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Kind of data a run directory holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// Perf-counter logs, directory tag `PF`
    Perf,
    /// Page-color profiles, directory tag `CL`
    Colors,
}

impl DataKind {
    pub fn tag(self) -> &'static str {
        match self {
            DataKind::Perf => "PF",
            DataKind::Colors => "CL",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DataKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PF" | "PERF" => Ok(DataKind::Perf),
            "CL" | "COLORS" => Ok(DataKind::Colors),
            _ => Err(format!("Unknown data kind '{}'. Expected PF or CL", s)),
        }
    }
}

/// Coordinates of one run directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    pub platform: Platform,
    pub benchmark: String,
    pub linux_variant: String,
    pub allocator_variant: String,
    pub data_kind: DataKind,
    pub corunners: String,
    /// Extra directory level used by working-set benchmarks
    pub working_set: Option<String>,
    pub utilization: String,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            platform: Platform::RawCounter,
            benchmark: "BW".to_string(),
            linux_variant: "UN".to_string(),
            allocator_variant: "PL".to_string(),
            data_kind: DataKind::Perf,
            corunners: "00".to_string(),
            working_set: None,
            utilization: "100".to_string(),
        }
    }
}

impl RunParameters {
    pub fn with_utilization(&self, utilization: impl Into<String>) -> Self {
        Self {
            utilization: utilization.into(),
            ..self.clone()
        }
    }

    pub fn with_data_kind(&self, data_kind: DataKind) -> Self {
        Self {
            data_kind,
            ..self.clone()
        }
    }

    /// Short human label, e.g. `TG/BW/UN/PL/PF/00/100`
    pub fn label(&self) -> String {
        let mut parts = vec![
            self.platform.tag().to_string(),
            self.benchmark.clone(),
            self.linux_variant.clone(),
            self.allocator_variant.clone(),
            self.data_kind.tag().to_string(),
            self.corunners.clone(),
        ];
        if let Some(ws) = &self.working_set {
            parts.push(ws.clone());
        }
        parts.push(self.utilization.clone());
        parts.join("/")
    }
}

/// Resolves run parameters to concrete paths under a data root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, params: &RunParameters) -> PathBuf {
        let mut dir = self.root.clone();
        dir.push(params.platform.tag());
        dir.push(&params.benchmark);
        dir.push(&params.linux_variant);
        dir.push(&params.allocator_variant);
        dir.push(params.data_kind.tag());
        dir.push(&params.corunners);
        if let Some(ws) = &params.working_set {
            dir.push(ws);
        }
        dir.push(&params.utilization);
        dir
    }

    pub fn file_path(&self, params: &RunParameters, index: u32) -> PathBuf {
        self.run_dir(params).join(index.to_string())
    }

    pub fn paths(
        &self,
        params: &RunParameters,
        indices: impl IntoIterator<Item = u32>,
    ) -> Vec<PathBuf> {
        let dir = self.run_dir(params);
        indices
            .into_iter()
            .map(|i| dir.join(i.to_string()))
            .collect()
    }

    /// Every file in the run directory that carries a numeric id, in id order
    pub fn list_run_dir(&self, params: &RunParameters) -> Result<Vec<PathBuf>> {
        let dir = self.run_dir(params);
        if !dir.is_dir() {
            return Err(AnalysisError::FileNotFound { path: dir });
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| AnalysisError::io(&dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| AnalysisError::io(&dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            if let Ok(id) = FileId::from_path(&path) {
                files.push((id, path));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files.into_iter().map(|(_, p)| p).collect())
    }
}

/// Perf log recorded alongside a color profile: the `CL` data-kind directory
/// replaced by `PF`
pub fn sibling_perf_path(color_path: &Path) -> Option<PathBuf> {
    let colors = OsStr::new(DataKind::Colors.tag());
    let components: Vec<Component<'_>> = color_path.components().collect();

    // Replace the last matching component; earlier ones belong to the root
    let last = components
        .iter()
        .rposition(|c| matches!(c, Component::Normal(name) if *name == colors))?;

    let mut out = PathBuf::new();
    for (i, component) in components.iter().enumerate() {
        if i == last {
            out.push(DataKind::Perf.tag());
        } else {
            out.push(component.as_os_str());
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_dir_template() {
        let layout = DatasetLayout::new("../data");
        let params = RunParameters::default();
        assert_eq!(
            layout.run_dir(&params),
            PathBuf::from("../data/TG/BW/UN/PL/PF/00/100")
        );
        assert_eq!(
            layout.file_path(&params, 42),
            PathBuf::from("../data/TG/BW/UN/PL/PF/00/100/42")
        );
    }

    #[test]
    fn test_working_set_level() {
        let layout = DatasetLayout::new("/d");
        let params = RunParameters {
            benchmark: "DP".into(),
            working_set: Some("QF".into()),
            utilization: "12".into(),
            ..RunParameters::default()
        };
        assert_eq!(
            layout.run_dir(&params),
            PathBuf::from("/d/TG/DP/UN/PL/PF/00/QF/12")
        );
        assert_eq!(params.label(), "TG/DP/UN/PL/PF/00/QF/12");
    }

    #[test]
    fn test_paths_follow_range() {
        let layout = DatasetLayout::new("/d");
        let paths = layout.paths(&RunParameters::default(), 1..=3);
        assert_eq!(paths.len(), 3);
        assert!(paths[2].ends_with("100/3"));
    }

    #[test]
    fn test_sibling_perf_path() {
        assert_eq!(
            sibling_perf_path(Path::new("../data/TG/BW/UN/PL/CL/00/100/536")),
            Some(PathBuf::from("../data/TG/BW/UN/PL/PF/00/100/536"))
        );
        assert_eq!(sibling_perf_path(Path::new("/d/TG/BW/PF/1")), None);
    }

    #[test]
    fn test_data_kind_from_str() {
        assert_eq!("pf".parse::<DataKind>().unwrap(), DataKind::Perf);
        assert_eq!("CL".parse::<DataKind>().unwrap(), DataKind::Colors);
        assert!("XX".parse::<DataKind>().is_err());
    }

    #[test]
    fn test_list_run_dir_orders_numerically() {
        let root = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(root.path());
        let params = RunParameters::default();
        let dir = layout.run_dir(&params);
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["10", "2", "1", "notes"] {
            std::fs::write(dir.join(name), "").unwrap();
        }

        let files = layout.list_run_dir(&params).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_list_missing_run_dir() {
        let layout = DatasetLayout::new("/no/such/root");
        let err = layout.list_run_dir(&RunParameters::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::FileNotFound { .. }));
    }
}
