// Cut file layout
pub const CUT_EXTENSION: &str = "cut";
pub const CUTS_DIRECTORY: &str = "cuts";
pub const SPLITS_DIRECTORY: &str = "elemloss";
pub const CUT_COLUMN_HEADER: &str = "ToF, Energy, Event number";
pub const EVENT_FIELDS_PER_LINE: usize = 3;

// Cut file header keys, in the order they are written
pub const KEY_COUNT: &str = "Count";
pub const KEY_TYPE: &str = "Type";
pub const KEY_WEIGHT_FACTOR: &str = "Weight Factor";
pub const KEY_ENERGY: &str = "Energy";
pub const KEY_DETECTOR_ANGLE: &str = "Detector Angle";
pub const KEY_SCATTER_ELEMENT: &str = "Scatter Element";
pub const KEY_ELEMENT_LOSSES: &str = "Element losses";
pub const KEY_SPLIT_COUNT: &str = "Split count";

// MCERD description files
pub const TARGET_EXTENSION: &str = "target";
pub const FOILS_EXTENSION: &str = "foils";
pub const DETECTOR_SECTION_SEPARATOR: &str = "==========";
pub const FOIL_SEPARATOR: &str = "----------";
pub const LAYER_SCALAR_LINES: usize = 4;
pub const FOIL_BLOCK_LINES: usize = 3;

// MCERD command file section headers
pub const HEADER_SIMULATION_TYPE: &str =
    "******************* Type of the simulation *******************************";
pub const HEADER_GENERAL: &str =
    "*************** General physical parameters for the simulation ***********";
pub const HEADER_SPECIFIC: &str =
    "********** Physical parameters conserning specific simulation type *********";
pub const SUBHEADER_ERD: &str =
    "----------------------- ERD -simulation ------------------------------------";
pub const SUBHEADER_RBS: &str =
    "----------------------- RBS -simulation ------------------------------------";
pub const HEADER_PHYSICAL: &str =
    "******************* Parameters with physical significance ******************";
pub const HEADER_NONPHYSICAL: &str =
    "******************* Nonphysical parameters for simulation ***************";
