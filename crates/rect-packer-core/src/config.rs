use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Algorithm families and packer configuration.
/// Key notes:
///   - `family` selects the free-space strategy used by every bin (Skyline/MaxRects/Guillotine)
///   - `bin_selection` picks which bin receives each rectangle (NF/FF/BF/Global)
///   - `mode` decides whether rectangles are placed immediately or buffered until `pack()`
///     Top-level algorithm families.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmFamily {
    /// Skyline height profile (BL/MWF/MWFL; fast). Optional waste recovery below the profile.
    Skyline,
    /// Maximal free rectangles (high quality; many heuristics; best for offline).
    MaxRects,
    /// Guillotine sections (choice + split axis; optional section merging).
    Guillotine,
}

impl FromStr for AlgorithmFamily {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skyline" => Ok(Self::Skyline),
            "maxrects" => Ok(Self::MaxRects),
            "guillotine" => Ok(Self::Guillotine),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
    BottomLeft,
    ContactPoint,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Skyline placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkylineHeuristic {
    /// Lowest resulting top edge.
    BottomLeft,
    /// Least area trapped under the placed rectangle.
    MinWaste,
    /// Least trapped area, then lowest top edge.
    MinWasteLowest,
}

impl FromStr for SkylineHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "mwf" | "minwaste" => Ok(Self::MinWaste),
            "mwfl" | "minwastelowest" => Ok(Self::MinWasteLowest),
            _ => Err(()),
        }
    }
}

/// Guillotine free-section choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GuillotineChoice {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
}

impl FromStr for GuillotineChoice {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            _ => Err(()),
        }
    }
}

/// Guillotine split axis heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GuillotineSplit {
    SplitShorterLeftoverAxis,
    SplitLongerLeftoverAxis,
    SplitMinimizeArea,
    SplitMaximizeArea,
    SplitShorterAxis,
    SplitLongerAxis,
}

impl FromStr for GuillotineSplit {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slas" | "splitshorterleftoveraxis" => Ok(Self::SplitShorterLeftoverAxis),
            "llas" | "splitlongerleftoveraxis" => Ok(Self::SplitLongerLeftoverAxis),
            "minas" | "splitminimizearea" => Ok(Self::SplitMinimizeArea),
            "maxas" | "splitmaximizearea" => Ok(Self::SplitMaximizeArea),
            "sas" | "splitshorteraxis" => Ok(Self::SplitShorterAxis),
            "las" | "splitlongeraxis" => Ok(Self::SplitLongerAxis),
            _ => Err(()),
        }
    }
}

/// How the packer picks the bin that receives a rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BinSelection {
    /// One open bin at a time; closed for good after its first rejection.
    NextFit,
    /// First open bin (in opening order) that accepts the rectangle.
    FirstFit,
    /// Open bin reporting the lowest fitness.
    BestFit,
    /// Offline only: fill one bin at a time with the fittest remaining rectangle.
    Global,
}

impl FromStr for BinSelection {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nf" | "bnf" | "nextfit" => Ok(Self::NextFit),
            "ff" | "bff" | "firstfit" => Ok(Self::FirstFit),
            "bf" | "bbf" | "bestfit" => Ok(Self::BestFit),
            "global" => Ok(Self::Global),
            _ => Err(()),
        }
    }
}

/// Immediate placement vs. buffer-sort-pack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackingMode {
    /// Rectangles are placed as soon as they are added.
    Online,
    /// Rectangles and bins are buffered until `pack()` is called.
    Offline,
}

impl FromStr for PackingMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(()),
        }
    }
}

/// Offline ordering of buffered rectangles. Every key sorts descending and
/// equal keys keep their insertion order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Insertion order.
    None,
    /// `width * height`.
    Area,
    /// `width + height`.
    Perimeter,
    /// `|width - height|`.
    Diff,
    /// `(short side, long side)`.
    ShortSide,
    /// `(long side, short side)`.
    LongSide,
    /// `width / height`.
    Ratio,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "area" => Ok(Self::Area),
            "peri" | "perimeter" => Ok(Self::Perimeter),
            "diff" => Ok(Self::Diff),
            "sside" | "short_side" => Ok(Self::ShortSide),
            "lside" | "long_side" => Ok(Self::LongSide),
            "ratio" => Ok(Self::Ratio),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackerConfig {
    /// Online or Offline operation.
    #[serde(default = "default_mode")]
    pub mode: PackingMode,
    /// Bin selection policy.
    #[serde(default = "default_bin_selection")]
    pub bin_selection: BinSelection,
    /// Allow 90° rotations of rectangles.
    #[serde(default = "default_allow_rotation")]
    pub allow_rotation: bool,
    /// Offline rectangle ordering; ignored in Online mode.
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,

    // algorithm selection
    #[serde(default = "default_family")]
    pub family: AlgorithmFamily,
    #[serde(default = "default_mr_heuristic")]
    pub mr_heuristic: MaxRectsHeuristic,
    #[serde(default = "default_g_choice")]
    pub g_choice: GuillotineChoice,
    #[serde(default = "default_g_split")]
    pub g_split: GuillotineSplit,
    /// Merge adjacent Guillotine sections that form an exact rectangle.
    #[serde(default = "default_g_merge")]
    pub g_merge: bool,
    #[serde(default = "default_skyline_heuristic")]
    pub skyline_heuristic: SkylineHeuristic,
    /// Recover pockets left under the Skyline profile.
    #[serde(default)]
    pub use_waste_map: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            bin_selection: default_bin_selection(),
            allow_rotation: default_allow_rotation(),
            sort_order: default_sort_order(),
            family: default_family(),
            mr_heuristic: default_mr_heuristic(),
            g_choice: default_g_choice(),
            g_split: default_g_split(),
            g_merge: default_g_merge(),
            skyline_heuristic: default_skyline_heuristic(),
            use_waste_map: false,
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if the bin selection policy cannot run in the chosen mode
    /// (Global needs every rectangle up front, so it is Offline only).
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::PackError;

        if self.mode == PackingMode::Online && self.bin_selection == BinSelection::Global {
            return Err(PackError::InvalidConfig(
                "Global bin selection requires Offline mode".into(),
            ));
        }

        Ok(())
    }
}

fn default_mode() -> PackingMode {
    PackingMode::Offline
}
fn default_bin_selection() -> BinSelection {
    BinSelection::BestFit
}
fn default_allow_rotation() -> bool {
    true
}
fn default_sort_order() -> SortOrder {
    SortOrder::Area
}
fn default_family() -> AlgorithmFamily {
    AlgorithmFamily::MaxRects
}
fn default_mr_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestShortSideFit
}
fn default_g_choice() -> GuillotineChoice {
    GuillotineChoice::BestShortSideFit
}
fn default_g_split() -> GuillotineSplit {
    GuillotineSplit::SplitShorterAxis
}
fn default_g_merge() -> bool {
    true
}
fn default_skyline_heuristic() -> SkylineHeuristic {
    SkylineHeuristic::BottomLeft
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn mode(mut self, v: PackingMode) -> Self {
        self.cfg.mode = v;
        self
    }
    pub fn bin_selection(mut self, v: BinSelection) -> Self {
        self.cfg.bin_selection = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn family(mut self, v: AlgorithmFamily) -> Self {
        self.cfg.family = v;
        self
    }
    pub fn mr_heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.family = AlgorithmFamily::MaxRects;
        self.cfg.mr_heuristic = v;
        self
    }
    pub fn g_choice(mut self, v: GuillotineChoice) -> Self {
        self.cfg.family = AlgorithmFamily::Guillotine;
        self.cfg.g_choice = v;
        self
    }
    pub fn g_split(mut self, v: GuillotineSplit) -> Self {
        self.cfg.family = AlgorithmFamily::Guillotine;
        self.cfg.g_split = v;
        self
    }
    pub fn g_merge(mut self, v: bool) -> Self {
        self.cfg.g_merge = v;
        self
    }
    pub fn skyline_heuristic(mut self, v: SkylineHeuristic) -> Self {
        self.cfg.family = AlgorithmFamily::Skyline;
        self.cfg.skyline_heuristic = v;
        self
    }
    pub fn use_waste_map(mut self, v: bool) -> Self {
        self.cfg.use_waste_map = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}

impl PackerConfig {
    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}
