use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use moka::sync::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use crate::error::AppError;
use crate::models::{
    ChartSummary, CleaningDirective, ColumnSelection, Dataset, DatasetPreview, ExportFormat,
    ExportResult, UploadedFile,
};
use crate::services::{chart, exporter, loader, pipeline};

/// Identity of an uploaded file: a hash of its name and contents.
pub fn file_id(file: &UploadedFile) -> String {
    let mut hasher = DefaultHasher::new();
    file.name.hash(&mut hasher);
    file.payload.as_ref().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[derive(Debug, Clone)]
pub struct Session {
    pub file: UploadedFile,
    pub source: Dataset,
    pub directive: CleaningDirective,
    pub selection: ColumnSelection,
    pub uploaded_at: DateTime<Utc>,
    pending_export: Option<ExportResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileView {
    pub id: String,
    pub name: String,
    pub size_kb: String,
    pub uploaded_at: DateTime<Utc>,
    pub source_columns: Vec<String>,
    pub cleaning: CleaningDirective,
    pub selected_columns: Vec<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub preview: DatasetPreview,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportTicket {
    pub file_name: String,
    pub mime_type: &'static str,
    pub size_bytes: usize,
}

impl Session {
    pub fn new(file: UploadedFile, source: Dataset) -> Self {
        Self {
            file,
            source,
            directive: CleaningDirective::default(),
            selection: ColumnSelection::All,
            uploaded_at: Utc::now(),
            pending_export: None,
        }
    }

    pub fn render(&self) -> Result<pipeline::Rendered, AppError> {
        pipeline::render(&self.source, self.directive, &self.selection)
    }

    pub fn view(&self, id: &str, preview_rows: usize) -> Result<FileView, AppError> {
        let rendered = self.render()?;
        Ok(FileView {
            id: id.to_string(),
            name: self.file.name.clone(),
            size_kb: self.file.size_kb(),
            uploaded_at: self.uploaded_at,
            source_columns: self.source.column_names(),
            cleaning: self.directive,
            selected_columns: rendered.dataset.column_names(),
            row_count: rendered.dataset.height(),
            column_count: rendered.dataset.width(),
            preview: rendered.dataset.preview(preview_rows),
            messages: rendered.report.messages,
        })
    }

    pub fn chart(&self) -> Result<ChartSummary, AppError> {
        chart::summarize(&self.render()?.dataset)
    }

    /// Exports the current rendering and holds it until downloaded.
    pub fn export(&mut self, format: ExportFormat) -> Result<ExportTicket, AppError> {
        let rendered = self.render()?;
        let result = exporter::export(&rendered.dataset, format, &self.file)?;
        let ticket = ExportTicket {
            file_name: result.file_name.clone(),
            mime_type: result.mime_type,
            size_bytes: result.payload.len(),
        };
        self.pending_export = Some(result);
        Ok(ticket)
    }

    /// Hands out the pending export once.
    pub fn take_export(&mut self) -> Option<ExportResult> {
        self.pending_export.take()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Loaded {
        id: String,
        name: String,
        size_kb: String,
        columns: Vec<String>,
        row_count: usize,
        preview: DatasetPreview,
    },
    Rejected {
        name: String,
        error: String,
    },
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .build();
        Self { sessions }
    }

    /// Loads the file and opens (or resets) its session.
    pub fn ingest(&self, file: UploadedFile) -> Result<(String, Arc<Mutex<Session>>), AppError> {
        let source = loader::load(&file)?;
        let id = file_id(&file);
        let session = Arc::new(Mutex::new(Session::new(file, source)));
        self.sessions.insert(id.clone(), session.clone());
        tracing::info!("Opened session {}", id);
        Ok((id, session))
    }

    /// Ingests every file in order; a failing file is reported and skipped.
    pub fn ingest_batch(&self, files: Vec<UploadedFile>, preview_rows: usize) -> Vec<UploadOutcome> {
        files
            .into_iter()
            .map(|file| {
                let name = file.name.clone();
                match self.ingest(file) {
                    Ok((id, session)) => {
                        let session = session.lock();
                        UploadOutcome::Loaded {
                            id,
                            name,
                            size_kb: session.file.size_kb(),
                            columns: session.source.column_names(),
                            row_count: session.source.height(),
                            preview: session.source.preview(preview_rows),
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Rejected {}: {}", name, e);
                        let error = if matches!(e, AppError::UnsupportedFormat(_)) {
                            e.to_string()
                        } else {
                            format!("Failed to load {}: {}", name, e)
                        };
                        UploadOutcome::Rejected { name, error }
                    }
                }
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<Arc<Mutex<Session>>, AppError> {
        self.sessions
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("No file session {}", id)))
    }

    pub fn remove(&self, id: &str) -> Result<(), AppError> {
        self.sessions
            .remove(id)
            .map(|_| tracing::info!("Closed session {}", id))
            .ok_or_else(|| AppError::NotFound(format!("No file session {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(16, Duration::from_secs(60))
    }

    fn scenario_file() -> UploadedFile {
        UploadedFile::new("report.data.csv", "id,name,score\n1,a,5\n1,a,5\n2,b,\n")
    }

    #[test]
    fn identical_uploads_share_an_id() {
        let a = file_id(&scenario_file());
        let b = file_id(&scenario_file());
        let other = file_id(&UploadedFile::new("report.data.csv", "id\n1\n"));
        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn batch_continues_past_unsupported_files() {
        let outcomes = store().ingest_batch(
            vec![
                scenario_file(),
                UploadedFile::new("y.txt", "whatever"),
                UploadedFile::new("b.csv", "x\n1\n"),
            ],
            5,
        );

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], UploadOutcome::Loaded { .. }));
        match &outcomes[1] {
            UploadOutcome::Rejected { name, error } => {
                assert_eq!(name, "y.txt");
                assert_eq!(error, "Unsupported file type: .txt");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(matches!(outcomes[2], UploadOutcome::Loaded { .. }));
    }

    #[test]
    fn scenario_export_matches_expected_rows() -> anyhow::Result<()> {
        let store = store();
        let (id, _) = store.ingest(scenario_file())?;
        let session = store.get(&id)?;
        let mut session = session.lock();
        session.directive = CleaningDirective {
            remove_duplicates: true,
            fill_missing_numeric: true,
        };

        let ticket = session.export(ExportFormat::Csv)?;
        assert_eq!(ticket.file_name, "report.data.csv");
        assert_eq!(ticket.mime_type, "text/csv");

        let result = session.take_export().expect("pending export");
        assert_eq!(std::str::from_utf8(&result.payload)?, "id,name,score\n1,a,5\n2,b,5\n");
        assert!(session.take_export().is_none());
        Ok(())
    }

    #[test]
    fn cleaning_is_not_cumulative() -> anyhow::Result<()> {
        let store = store();
        let (_, session) = store.ingest(scenario_file())?;
        let mut session = session.lock();

        session.directive.remove_duplicates = true;
        assert_eq!(session.view("x", 5)?.row_count, 2);
        session.directive.remove_duplicates = false;
        assert_eq!(session.view("x", 5)?.row_count, 3);
        Ok(())
    }

    #[test]
    fn view_reports_messages_and_selection() -> anyhow::Result<()> {
        let store = store();
        let (id, session) = store.ingest(scenario_file())?;
        let mut session = session.lock();
        session.directive.fill_missing_numeric = true;
        session.selection = ColumnSelection::only(["score", "id"]);

        let view = session.view(&id, 2)?;
        assert_eq!(view.source_columns, vec!["id", "name", "score"]);
        assert_eq!(view.selected_columns, vec!["id", "score"]);
        assert_eq!(view.preview.rows.len(), 2);
        assert_eq!(view.messages, vec!["Missing values filled."]);
        Ok(())
    }

    #[test]
    fn removed_sessions_are_gone() -> anyhow::Result<()> {
        let store = store();
        let (id, _) = store.ingest(scenario_file())?;
        store.remove(&id)?;
        assert!(matches!(store.get(&id), Err(AppError::NotFound(_))));
        assert!(store.remove(&id).is_err());
        Ok(())
    }
}
