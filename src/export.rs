// src/export.rs - Writes resampled tracks as angle tables and hand images
use chrono::Local;
use csv::WriterBuilder;
use image::RgbImage;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CaptureError, Result};
use crate::resample::{ResampledTracks, Track, TrackData};
use crate::roi::HandView;

/// Session name used when the operator did not provide one.
pub fn default_session_name() -> String {
    format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

#[derive(Debug)]
pub struct ExportFailure {
    pub path: PathBuf,
    pub error: CaptureError,
}

/// Outcome of one export. Failed artifacts are listed, not fatal.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub session_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
    pub sampled_frames: usize,
    pub full_frames: usize,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, path: PathBuf, result: Result<()>) {
        match result {
            Ok(()) => self.written.push(path),
            Err(error) => {
                warn!(path = %path.display(), %error, "export artifact skipped");
                self.failures.push(ExportFailure { path, error });
            }
        }
    }
}

pub struct DatasetExporter {
    output_dir: PathBuf,
}

impl DatasetExporter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn session_dir(&self, session: &str) -> PathBuf {
        self.output_dir.join(session)
    }

    pub fn table_path(&self, session: &str, track: Track, table: &str) -> PathBuf {
        self.session_dir(session)
            .join(format!("{}_{}_polar.csv", track.name(), table))
    }

    pub fn image_path(&self, session: &str, track: Track, view: HandView, number: usize) -> PathBuf {
        self.session_dir(session).join(format!(
            "{}-{}-{}-{}.png",
            session,
            track.name(),
            view.tag(),
            number
        ))
    }

    /// Writes both tracks of a resampled recording. Individual write failures
    /// are collected in the report; the remaining artifacts are still written.
    pub fn export(&self, session: &str, tracks: &ResampledTracks<'_>) -> ExportReport {
        let session_dir = self.session_dir(session);
        let mut report = ExportReport {
            session_dir: session_dir.clone(),
            sampled_frames: tracks.sampled.len(),
            full_frames: tracks.full.len(),
            ..Default::default()
        };

        if let Err(source) = fs::create_dir_all(&session_dir) {
            report.record(
                session_dir.clone(),
                Err(CaptureError::Io {
                    path: session_dir,
                    source,
                }),
            );
            return report;
        }

        for track in Track::BOTH {
            let data = tracks.track(track);
            if data.is_empty() {
                debug!(session, track = track.name(), "track empty, nothing to write");
                continue;
            }
            self.export_track(session, track, data, &mut report);
        }

        info!(
            session,
            written = report.written.len(),
            failed = report.failures.len(),
            "export finished"
        );
        report
    }

    fn export_track(
        &self,
        session: &str,
        track: Track,
        data: &TrackData<'_>,
        report: &mut ExportReport,
    ) {
        let limb_path = self.table_path(session, track, "limb");
        report.record(limb_path.clone(), append_table(&limb_path, &data.limb));

        let head_path = self.table_path(session, track, "head");
        report.record(head_path.clone(), append_table(&head_path, &data.head));

        for (i, frame) in data.frames.iter().enumerate() {
            for view in HandView::ALL {
                let path = self.image_path(session, track, view, i + 1);
                let result = write_image(&path, frame.image(view));
                report.record(path, result);
            }
        }
    }

    /// Saves a single reference image as `<session>/<label>.png`.
    pub fn save_snapshot(&self, session: &str, label: &str, image: &RgbImage) -> Result<PathBuf> {
        let dir = self.session_dir(session);
        fs::create_dir_all(&dir).map_err(|source| CaptureError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{}.png", label));
        write_image(&path, image)?;
        info!(path = %path.display(), "snapshot saved");
        Ok(path)
    }
}

/// Appends one comma-separated row per series.
fn append_table(path: &Path, rows: &[Vec<f64>]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| CaptureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(file);

    for row in rows {
        writer
            .write_record(row.iter().map(|value| value.to_string()))
            .map_err(|source| CaptureError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
    }

    writer.flush().map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_image(path: &Path, image: &RgbImage) -> Result<()> {
    image.save(path).map_err(|source| CaptureError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Numbered reference captures of a single hand shape, e.g. `A_1_color.png`,
/// `A_1_depth.png`, `A_2_color.png`...
pub struct SnapshotSeries {
    folder: String,
    label: String,
    next: u32,
}

impl SnapshotSeries {
    pub fn new(folder: impl Into<String>, label: impl Into<String>, start: u32) -> Self {
        Self {
            folder: folder.into(),
            label: label.into(),
            next: start,
        }
    }

    pub fn next_number(&self) -> u32 {
        self.next
    }

    /// Saves the color/depth pair under the current number, then advances it.
    pub fn save(
        &mut self,
        exporter: &DatasetExporter,
        color: &RgbImage,
        depth: &RgbImage,
    ) -> Result<(PathBuf, PathBuf)> {
        let stem = format!("{}_{}", self.label, self.next);
        let color_path = exporter.save_snapshot(&self.folder, &format!("{}_color", stem), color)?;
        let depth_path = exporter.save_snapshot(&self.folder, &format!("{}_depth", stem), depth)?;
        self.next += 1;
        Ok((color_path, depth_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::{solid, upper_body};
    use crate::capture::CaptureBuffer;
    use crate::resample::resample;
    use crate::roi::ViewMap;

    fn recorded(frames: usize) -> CaptureBuffer {
        let mut buffer = CaptureBuffer::new(8);
        for i in 0..frames {
            buffer
                .push(&upper_body(i as f64 * 0.02), ViewMap::from_fn(|_| Some(solid(8, 50))))
                .unwrap();
        }
        buffer
    }

    #[test]
    fn test_export_writes_tables_and_numbered_images() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DatasetExporter::new(dir.path());
        let buffer = recorded(6);
        let tracks = resample(&buffer, 3.0);

        let report = exporter.export("halo", &tracks);
        assert!(report.is_complete(), "{:?}", report.failures);
        assert_eq!(report.sampled_frames, 3);
        assert_eq!(report.full_frames, 3);
        // 2 tables + 3 frames * 4 views, for each track
        assert_eq!(report.written.len(), 2 * (2 + 12));

        let first = dir.path().join("halo").join("halo-sampled-LeftColor-1.png");
        let last = dir.path().join("halo").join("halo-full-RightDepth-3.png");
        assert!(first.exists());
        assert!(last.exists());

        let table = fs::read_to_string(exporter.table_path("halo", Track::Sampled, "limb")).unwrap();
        let rows: Vec<&str> = table.lines().collect();
        assert_eq!(rows.len(), 8);
        for row in rows {
            assert_eq!(row.split(',').count(), 3);
            for field in row.split(',') {
                field.parse::<f64>().unwrap();
            }
        }
    }

    #[test]
    fn test_tables_are_appended_across_exports() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DatasetExporter::new(dir.path());
        let buffer = recorded(4);

        exporter.export("makan", &resample(&buffer, 2.0));
        exporter.export("makan", &resample(&buffer, 2.0));

        let table = fs::read_to_string(exporter.table_path("makan", Track::Full, "head")).unwrap();
        assert_eq!(table.lines().count(), 16);
    }

    #[test]
    fn test_empty_track_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DatasetExporter::new(dir.path());
        let buffer = recorded(3);

        let report = exporter.export("aku", &resample(&buffer, 10.0));
        assert_eq!(report.full_frames, 0);
        assert!(!exporter.table_path("aku", Track::Full, "limb").exists());
        assert!(exporter.table_path("aku", Track::Sampled, "limb").exists());
    }

    #[test]
    fn test_failed_artifact_does_not_stop_export() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DatasetExporter::new(dir.path());
        let buffer = recorded(2);

        // a directory squatting on a table path makes that one write fail
        fs::create_dir_all(exporter.table_path("pergi", Track::Sampled, "limb")).unwrap();

        let report = exporter.export("pergi", &resample(&buffer, 2.0));
        assert_eq!(report.failures.len(), 1);
        assert!(exporter.table_path("pergi", Track::Sampled, "head").exists());
        assert!(exporter
            .image_path("pergi", Track::Sampled, HandView::RIGHT_DEPTH, 2)
            .exists());
    }

    #[test]
    fn test_snapshot_series_numbers_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DatasetExporter::new(dir.path());
        let mut series = SnapshotSeries::new("Alphabet", "A", 1);

        let (color, depth) = series.save(&exporter, &solid(8, 1), &solid(8, 2)).unwrap();
        assert_eq!(color, dir.path().join("Alphabet").join("A_1_color.png"));
        assert_eq!(depth, dir.path().join("Alphabet").join("A_1_depth.png"));
        assert_eq!(series.next_number(), 2);

        let (color, _) = series.save(&exporter, &solid(8, 1), &solid(8, 2)).unwrap();
        assert!(color.ends_with("A_2_color.png"));
    }
}
