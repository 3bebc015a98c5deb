/// Input file in, hull file out

use crate::error::{HullError, Result};
use crate::hull_geometry::HullGeometry;
use crate::input::InputFileProcessor;
use crate::output::HullWriter;
use std::path::Path;

pub struct HullGenerator<P: InputFileProcessor> {
    input: P,
    writer: HullWriter,
}

impl<P: InputFileProcessor> HullGenerator<P> {
    pub fn new(input: P, writer: HullWriter) -> Self {
        Self { input, writer }
    }

    /// Build the hull of `input_path` and write it to a new file at `output_path`.
    ///
    /// An input without any usable point is an `EmptyGeometry` error and
    /// creates no output file.
    pub fn generate(&mut self, input_path: &Path, output_path: &Path) -> Result<&HullGeometry> {
        let hull = self.input.process(input_path)?.ok_or_else(|| {
            HullError::EmptyGeometry(format!("no hull produced from {}", input_path.display()))
        })?;
        self.writer.write(hull, output_path)?;
        Ok(hull)
    }

    pub fn input(&self) -> &P {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_processor::GeometryProcessor;
    use crate::hull::Hull;
    use crate::input::CsvProcessor;
    use crate::output::OutputFormat;
    use crate::polar::AntimeridianSplitter;
    use crate::test_support::SquareGrid;
    use approx::assert_abs_diff_eq;
    use std::fs;

    fn csv_generator(format: OutputFormat) -> HullGenerator<CsvProcessor> {
        let processor =
            GeometryProcessor::new(Box::new(SquareGrid::new(1.0)), Box::new(AntimeridianSplitter));
        HullGenerator::new(
            CsvProcessor::new(Hull::complete(processor)),
            HullWriter::new(format),
        )
    }

    #[test]
    fn test_generates_hull_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("points.csv");
        let output = dir.path().join("hull.wkt");
        fs::write(&input, "0.5,0.5\n1.5,0.5\n").unwrap();

        let mut generator = csv_generator(OutputFormat::Wkt);
        generator.generate(&input, &output).unwrap();

        let written = OutputFormat::Wkt.read(&output).unwrap();
        assert_abs_diff_eq!(written.unsigned_area(), 2.0, epsilon = 1e-9);
        assert_eq!(generator.input().hull().stats().points_added, 2);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("points.csv");
        let output = dir.path().join("hull.geojson");
        fs::write(&input, "\n").unwrap();

        let mut generator = csv_generator(OutputFormat::GeoJson);

        assert!(matches!(
            generator.generate(&input, &output),
            Err(HullError::EmptyGeometry(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_existing_output_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("points.csv");
        let output = dir.path().join("hull.wkt");
        fs::write(&input, "0.5,0.5\n").unwrap();
        fs::write(&output, "keep me").unwrap();

        assert!(csv_generator(OutputFormat::Wkt).generate(&input, &output).is_err());
        assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");
    }
}
