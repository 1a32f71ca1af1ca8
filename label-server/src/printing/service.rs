//! Print Service
//!
//! Runs the label pipeline for one request: resolve → render → build →
//! dispatch.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::dispatcher::PrintDispatcher;
use crate::core::Config;
use crate::core::config::MediaSettings;
use crate::labels::{
    ElementRenderer, JobResult, Label, LabelSize, LayoutResolver, LayoutSource, PrintJob,
    Template,
};
use crate::utils::AppResult;

/// A print request after HTTP decoding
#[derive(Debug, Clone)]
pub struct PrintRequest {
    pub template: Template,
    pub source: LayoutSource,
    pub qty: u32,
    pub size: LabelSize,
    pub timeout: Option<Duration>,
}

/// Quick QR request (`/print/qrcode`)
#[derive(Debug, Clone)]
pub struct QrCodeRequest {
    pub content: String,
    pub text: Option<String>,
    pub module_size: Option<u32>,
    pub qty: u32,
    pub size: LabelSize,
    pub timeout: Option<Duration>,
}

pub struct PrintService {
    resolver: LayoutResolver,
    renderer: ElementRenderer,
    dispatcher: Arc<PrintDispatcher>,
    media: MediaSettings,
    max_copies: u32,
}

impl PrintService {
    pub fn new(config: &Config, dispatcher: Arc<PrintDispatcher>) -> Self {
        Self {
            resolver: LayoutResolver::new(config.labels.clone()),
            renderer: ElementRenderer::new(&config.labels),
            dispatcher,
            media: config.media,
            max_copies: config.labels.max_copies,
        }
    }

    /// Resolve, render and build without touching the printer
    pub fn prepare(
        &self,
        template: Template,
        source: LayoutSource,
        qty: u32,
        size: LabelSize,
    ) -> AppResult<PrintJob> {
        let labels = self.resolver.resolve(template, source, size)?;
        self.build_job(&labels, qty)
    }

    fn build_job(&self, labels: &[Label], qty: u32) -> AppResult<PrintJob> {
        let rendered = labels
            .iter()
            .map(|label| self.renderer.render(label))
            .collect::<AppResult<Vec<_>>>()?;
        PrintJob::build(rendered, qty, self.media, self.max_copies)
    }

    pub async fn print(&self, request: PrintRequest) -> AppResult<JobResult> {
        let job = self.prepare(request.template, request.source, request.qty, request.size)?;
        debug!(job_id = %job.id(), template = %request.template, "Print job built");

        let result = self.dispatcher.submit(job, request.timeout).await?;
        info!(
            job_id = %result.job_id,
            template = %request.template,
            labels = result.labels,
            copies = result.copies,
            "Labels printed"
        );
        Ok(result)
    }

    pub async fn print_quick_qrcode(&self, request: QrCodeRequest) -> AppResult<JobResult> {
        let label = self.resolver.resolve_quick_qrcode(
            &request.content,
            request.text.as_deref(),
            request.module_size,
            request.size,
        )?;
        let job = self.build_job(std::slice::from_ref(&label), request.qty)?;

        let result = self.dispatcher.submit(job, request.timeout).await?;
        info!(job_id = %result.job_id, copies = result.copies, "QR label printed");
        Ok(result)
    }
}
