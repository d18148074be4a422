// Unit strings arrive as free text: SI symbols, customary units, micro
// prefixes written with any of several Unicode glyphs, reciprocal forms such
// as 1/bar, and arbitrary user tokens that no conversion library knows. The
// normalize module rewrites such text into something a backend can parse,
// the registry remembers every custom token discovered along the way, and
// the scaling engine ties both to a conversion backend to produce ratios.

pub mod backend;
pub mod normalize;
pub mod registry;
pub mod scaling;

pub use backend::{BackendError, SiBackend, UnitBackend};
pub use registry::CustomUnitRegistry;
pub use scaling::{UnitConversionError, UnitScalingEngine, get_units_scaling_ratio};
