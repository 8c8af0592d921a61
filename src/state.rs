use std::path::{Path, PathBuf};

use crate::color::ColorMap;
use crate::config::Config;
use crate::data::model::ParFile;
use crate::data::parser::{self, ParseError};

// ---------------------------------------------------------------------------
// Plot views
// ---------------------------------------------------------------------------

/// Which derived series the central plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotView {
    /// Every loaded file's selected segment, one curve per file.
    Overlay,
    /// First and second half-cycle of the active file's segment.
    SplitHalf,
    /// Half-cycles with the detected peak markers.
    Peaks,
    /// log10(|I| mA) scatter over the second half-cycle.
    LogScale,
    /// Cathodic/anodic branches of the log transform.
    Tafel,
}

impl PlotView {
    pub const ALL: [PlotView; 5] = [
        PlotView::Overlay,
        PlotView::SplitHalf,
        PlotView::Peaks,
        PlotView::LogScale,
        PlotView::Tafel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlotView::Overlay => "Overlay",
            PlotView::SplitHalf => "Split Half",
            PlotView::Peaks => "Peaks",
            PlotView::LogScale => "Log Scale",
            PlotView::Tafel => "Tafel",
        }
    }
}

// ---------------------------------------------------------------------------
// File registry entries
// ---------------------------------------------------------------------------

/// One entry in the ordered file registry. Failed files stay listed (shown
/// as "Empty Data") but expose no segment data and are skipped by export.
pub struct LoadedFile {
    pub path: PathBuf,
    /// Filename stem, used for display, sorting and colouring.
    pub name: String,
    pub result: Result<ParFile, ParseError>,
}

impl LoadedFile {
    pub fn par(&self) -> Option<&ParFile> {
        self.result.as_ref().ok()
    }

    pub fn par_mut(&mut self) -> Option<&mut ParFile> {
        self.result.as_mut().ok()
    }

    pub fn is_ready(&self) -> bool {
        self.result.is_ok()
    }

    /// Stable sort key: named kinds in measurement order, everything
    /// without a numeric key after them, ties broken by name.
    fn sort_key(&self) -> (bool, i64, String) {
        let key = self
            .par()
            .and_then(|p| p.kind.sort_key(&p.filename));
        (key.is_none(), key.unwrap_or(0), self.name.clone())
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Ordered registry of loaded files.
    pub files: Vec<LoadedFile>,

    /// Index of the file whose derived series the detail views show.
    pub selected_file: Option<usize>,

    /// Active central plot view.
    pub view: PlotView,

    /// File-stem → colour mapping for the overlay plot.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            files: Vec::new(),
            selected_file: None,
            view: PlotView::Overlay,
            color_map: ColorMap::default(),
            status_message: None,
        }
    }

    /// Parse one path and add it to the registry.
    ///
    /// Files without the `.par` extension are skipped entirely; any other
    /// failure is kept so the listing can show it. Re-adding a path
    /// replaces the previous entry in place.
    pub fn add_path(&mut self, path: &Path) {
        let result = parser::load_file(path, self.config.analysis.default_segment);

        if matches!(result, Err(ParseError::NotApplicable)) {
            log::info!("skipping non-par file {}", path.display());
            return;
        }
        if let Err(e) = &result {
            log::error!("failed to parse {}: {e}", path.display());
        } else {
            log::info!("loaded {}", path.display());
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let entry = LoadedFile {
            path: path.to_path_buf(),
            name,
            result,
        };

        match self.files.iter().position(|f| f.path == entry.path) {
            Some(i) => self.files[i] = entry,
            None => self.files.push(entry),
        }
    }

    /// Stable sort of the registry by measurement order.
    pub fn sort_files(&mut self) {
        let selected_path = self.selected_file.map(|i| self.files[i].path.clone());
        self.files.sort_by_key(|f| f.sort_key());
        self.selected_file =
            selected_path.and_then(|p| self.files.iter().position(|f| f.path == p));
    }

    pub fn remove_file(&mut self, index: usize) {
        if index >= self.files.len() {
            return;
        }
        self.files.remove(index);
        self.selected_file = match self.selected_file {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        self.rebuild_color_map();
    }

    /// All files in the Ready state, registry order.
    pub fn ready_files(&self) -> Vec<&ParFile> {
        self.files.iter().filter_map(|f| f.par()).collect()
    }

    /// Smallest `max_segment` across Ready files – the segment range every
    /// file can serve in a per-segment export.
    pub fn min_segment(&self) -> Option<usize> {
        self.files.iter().filter_map(|f| f.par()).map(|p| p.max_segment).min()
    }

    /// The file shown by the detail views: the explicit selection when it
    /// is Ready, otherwise the first Ready file.
    pub fn active_file(&self) -> Option<&ParFile> {
        if let Some(i) = self.selected_file {
            if let Some(par) = self.files.get(i).and_then(|f| f.par()) {
                return Some(par);
            }
        }
        self.files.iter().find_map(|f| f.par())
    }

    pub fn rebuild_color_map(&mut self) {
        self.color_map = ColorMap::new(self.files.iter().map(|f| f.name.as_str()));
    }
}
