//! Print Job Builder
//!
//! Aggregates rendered labels and a copy count into a [`PrintJob`] and encodes
//! it as one TSPL byte stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tspl_printer::TsplBuilder;
use uuid::Uuid;

use super::renderer::RenderedLabel;
use crate::core::config::MediaSettings;
use crate::utils::{AppError, AppResult};

/// A validated, ready-to-send print job
///
/// Consumed by the dispatcher exactly once.
#[derive(Debug)]
pub struct PrintJob {
    id: Uuid,
    created_at: DateTime<Utc>,
    labels: Vec<RenderedLabel>,
    copies: u32,
    media: MediaSettings,
}

impl PrintJob {
    /// Build a job printing every label `qty` times
    pub fn build(
        labels: Vec<RenderedLabel>,
        qty: u32,
        media: MediaSettings,
        max_copies: u32,
    ) -> AppResult<Self> {
        if qty < 1 {
            return Err(AppError::validation("qty must be at least 1"));
        }
        if qty > max_copies {
            return Err(AppError::validation(format!(
                "qty must be at most {}, got {}",
                max_copies, qty
            )));
        }
        if labels.is_empty() {
            return Err(AppError::validation("print job has no labels"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            labels,
            copies: qty,
            media,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn labels(&self) -> &[RenderedLabel] {
        &self.labels
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    /// Physical labels the device will print
    pub fn printed_labels(&self) -> u64 {
        self.labels.len() as u64 * u64::from(self.copies)
    }

    /// Encode as TSPL
    ///
    /// Media setup is sent once; each label is `SIZE`, `CLS`, its drawing
    /// commands and `PRINT copies,1`.
    pub fn encode(&self) -> Vec<u8> {
        let media = &self.media;
        let mut b = TsplBuilder::new(media.codepage);

        // === Job Header ===
        b.gap(media.gap_mm, 0.0)
            .speed(media.speed)
            .density(media.density)
            .direction(media.direction)
            .reference(0, 0)
            .codepage_command()
            .tear(media.tear);

        // === Labels ===
        for label in &self.labels {
            b.size(label.width_mm, label.height_mm).cls();
            for command in &label.commands {
                b.draw(command);
            }
            b.print(self.copies, 1);
        }

        b.build()
    }
}

/// Outcome of a submitted job
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub labels: usize,
    pub copies: u32,
    /// Device status reported after the job was written
    pub printer_status: String,
    pub elapsed_ms: u64,
}
