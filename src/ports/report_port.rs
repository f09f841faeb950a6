//! Report output port trait.

use crate::domain::error::LinkError;
use crate::domain::plot::PlotSample;
use std::path::Path;

/// Port for writing recorded plot samples.
pub trait ReportPort {
    fn write_plots(&self, samples: &[PlotSample], output_path: &Path) -> Result<(), LinkError>;
}
