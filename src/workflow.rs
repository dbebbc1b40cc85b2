//! Batch driver: applies the document pipeline to one file or to every
//! `.drawio` file in a directory, with per-file containment.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::detect::WhatlangDetector;
use crate::error::{DiaglotError, Result};
use crate::pipeline::{self, PipelineContext};
use crate::report::FileReport;
use crate::translate::{TranslationBackend, TranslatorFactory};
use crate::writer;

/// Per-run overrides layered over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub output_dir: Option<PathBuf>,
    /// Output filename override; only meaningful for single-file runs
    pub out_name: Option<String>,
    pub languages: Option<Vec<String>>,
    pub no_overwrite: bool,
    pub force_uncompressed: bool,
}

pub struct Workflow {
    config: Config,
    detector: WhatlangDetector,
    backend: Box<dyn TranslationBackend>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let backend = TranslatorFactory::create_backend(config.translator.clone())?;
        Ok(Self {
            config,
            detector: WhatlangDetector,
            backend,
        })
    }

    /// Replace the translation backend; tests install a deterministic stub.
    pub fn with_backend(mut self, backend: Box<dyn TranslationBackend>) -> Self {
        self.backend = backend;
        self
    }

    fn context<'a>(&'a self, options: &RunOptions) -> PipelineContext<'a> {
        let languages = writer::normalize_languages(
            options.languages.as_ref().unwrap_or(&self.config.languages),
        );
        PipelineContext {
            languages,
            source_fallback: self.config.source_lang.to_lowercase(),
            overwrite: self.config.overwrite_existing && !options.no_overwrite,
            force_uncompressed: options.force_uncompressed,
            sample_limit: self.config.detection.sample_limit,
            detector: &self.detector,
            backend: self.backend.as_ref(),
        }
    }

    /// Translate one container file. Fails only at the file's own I/O or
    /// container-parse boundary; page problems end up in the report.
    pub async fn process_single_file(
        &self,
        input: &Path,
        options: &RunOptions,
    ) -> Result<FileReport> {
        if !input.is_file() {
            return Err(DiaglotError::FileNotFound(input.display().to_string()));
        }

        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.output_dir));
        fs::create_dir_all(&output_dir).await?;

        let xml = fs::read_to_string(input).await?;
        let ctx = self.context(options);
        let (output_xml, pages) = pipeline::process_container(&xml, &ctx).await?;

        let file_name = match &options.out_name {
            Some(name) => name.clone(),
            None => input
                .file_name()
                .ok_or_else(|| DiaglotError::Config("invalid input filename".to_string()))?
                .to_string_lossy()
                .into_owned(),
        };
        let out_path = output_dir.join(file_name);
        fs::write(&out_path, output_xml).await?;

        info!("translated {} -> {}", input.display(), out_path.display());
        Ok(FileReport {
            input: input.to_path_buf(),
            output: Some(out_path),
            pages,
            error: None,
        })
    }

    /// Translate every `.drawio` file directly inside `input_dir`
    /// (subdirectories are not descended into). A failing file is reported
    /// and does not stop its siblings.
    pub async fn process_directory(
        &self,
        input_dir: &Path,
        options: &RunOptions,
    ) -> Result<Vec<FileReport>> {
        if !input_dir.is_dir() {
            return Err(DiaglotError::Config(format!(
                "input path is not a directory: {}",
                input_dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_drawio = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("drawio"))
                .unwrap_or(false);
            if path.is_file() && is_drawio {
                files.push(path.to_path_buf());
            }
        }
        files.sort();

        if files.is_empty() {
            warn!("no .drawio files found in {}", input_dir.display());
        }

        // Filename overrides would collide across files.
        let per_file = RunOptions {
            out_name: None,
            ..options.clone()
        };

        let mut reports = Vec::new();
        for file in files {
            match self.process_single_file(&file, &per_file).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!("failed to process {}: {}", file.display(), e);
                    reports.push(FileReport::failed(file, e.to_string()));
                }
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as DiaglotResult;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StubBackend;

    #[async_trait]
    impl TranslationBackend for StubBackend {
        async fn translate(&self, text: &str, _source: &str, target: &str) -> DiaglotResult<String> {
            Ok(format!("[{target}]{text}"))
        }
    }

    const CONTAINER: &str = concat!(
        r#"<mxfile><diagram name="P1">"#,
        "&lt;mxGraphModel&gt;&lt;root&gt;",
        r#"&lt;mxCell id="n1" value="The quick brown fox jumps over the lazy dog" vertex="1" /&gt;"#,
        "&lt;/root&gt;&lt;/mxGraphModel&gt;",
        "</diagram></mxfile>"
    );

    fn test_workflow(output_dir: &Path) -> Workflow {
        let mut config = Config::default();
        config.languages = vec!["de".to_string()];
        config.output_dir = output_dir.display().to_string();
        Workflow::new(config)
            .unwrap()
            .with_backend(Box::new(StubBackend))
    }

    #[tokio::test]
    async fn test_single_file_writes_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("flow.drawio");
        std::fs::write(&input, CONTAINER).unwrap();
        let out_dir = dir.path().join("out");

        let workflow = test_workflow(&out_dir);
        let report = workflow
            .process_single_file(&input, &RunOptions::default())
            .await
            .unwrap();

        assert!(report.succeeded());
        let out_path = report.output.unwrap();
        assert_eq!(out_path, out_dir.join("flow.drawio"));
        let written = std::fs::read_to_string(out_path).unwrap();
        assert!(written.contains("label_de"));
    }

    #[tokio::test]
    async fn test_out_name_override() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("flow.drawio");
        std::fs::write(&input, CONTAINER).unwrap();
        let out_dir = dir.path().join("out");

        let workflow = test_workflow(&out_dir);
        let options = RunOptions {
            out_name: Some("renamed.drawio".to_string()),
            ..RunOptions::default()
        };
        let report = workflow.process_single_file(&input, &options).await.unwrap();
        assert_eq!(report.output.unwrap(), out_dir.join("renamed.drawio"));
    }

    #[tokio::test]
    async fn test_missing_input_is_file_not_found() {
        let dir = TempDir::new().unwrap();
        let workflow = test_workflow(dir.path());
        let result = workflow
            .process_single_file(&dir.path().join("nope.drawio"), &RunOptions::default())
            .await;
        assert!(matches!(result, Err(DiaglotError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_directory_is_non_recursive_and_contained() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.drawio"), CONTAINER).unwrap();
        std::fs::write(dir.path().join("broken.drawio"), "<mxfile").unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("nested.drawio"), CONTAINER).unwrap();
        let out_dir = dir.path().join("out");

        let workflow = test_workflow(&out_dir);
        let reports = workflow
            .process_directory(dir.path(), &RunOptions::default())
            .await
            .unwrap();

        // a.drawio and broken.drawio; nested.drawio is not descended into.
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().any(|r| r.succeeded()));
        let failed: Vec<_> = reports.iter().filter(|r| !r.succeeded()).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].input.ends_with("broken.drawio"));
    }
}
