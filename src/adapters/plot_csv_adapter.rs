//! Plot samples written as CSV (`chart,series,date,value`).

use crate::domain::error::LinkError;
use crate::domain::plot::PlotSample;
use crate::ports::report_port::ReportPort;
use std::path::Path;

pub struct PlotCsvAdapter;

impl PlotCsvAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlotCsvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_err(e: csv::Error) -> LinkError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => LinkError::Io(io),
        other => LinkError::Io(std::io::Error::other(format!("{:?}", other))),
    }
}

impl ReportPort for PlotCsvAdapter {
    fn write_plots(&self, samples: &[PlotSample], output_path: &Path) -> Result<(), LinkError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(csv_err)?;
        wtr.write_record(["chart", "series", "date", "value"])
            .map_err(csv_err)?;
        for s in samples {
            wtr.write_record([
                s.chart.as_str(),
                s.series.as_str(),
                &s.date.format("%Y-%m-%d").to_string(),
                &s.value.to_string(),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
