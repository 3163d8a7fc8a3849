//! Output fill and cleanup

use crate::error::EtlResult;
use crate::legacy::{fetch_output_types, fetch_outputs, fetch_publication_statuses};
use crate::resources::WorkMetadata;
use crate::step::{Step, StepContext};
use crate::target::TargetRow;
use crate::text::{clean_optional, clean_string, coerce_year, non_blank};
use crate::translation::{IdSequence, LegacyTable};
use async_trait::async_trait;
use sqlx::FromRow;
use std::collections::HashMap;
use synth_common::db::TargetTable;
use synth_common::SynthRound;
use tracing::{debug, info};

/// Outputs from every round under one id sequence
///
/// Output type and publication status are stored as labels rather than
/// foreign keys. Both lookup tables are the same in every round, so the
/// labels come from the latest round.
pub struct FillOutput;

#[async_trait]
impl Step for FillOutput {
    fn message(&self) -> String {
        "Filling Output table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let output_types = fetch_output_types(ctx.source(SynthRound::LATEST)).await?;
        let statuses = fetch_publication_statuses(ctx.source(SynthRound::LATEST)).await?;
        let mut ids = IdSequence::new();

        for round in SynthRound::chronological() {
            let outputs = fetch_outputs(ctx.source(round)).await?;

            for output in outputs {
                let id = ids.next_id();
                ctx.translations
                    .map(LegacyTable::Output, output.output_id, id, Some(round));

                let output_type = label(&output_types, output.output_type_id);
                let status = label(&statuses, output.publication_status_id);
                if output_type.is_none() && output.output_type_id.is_some() {
                    debug!(
                        round = %round,
                        output_id = output.output_id,
                        output_type_id = ?output.output_type_id,
                        "Unknown output type"
                    );
                }

                TargetRow::new(TargetTable::Output)
                    .set("id", id)
                    .set("round", round.value())
                    .set("output_type", output_type)
                    .set("authors", output.authors)
                    .set("year", coerce_year(output.year.as_deref()))
                    .set("title", output.title)
                    .set("publisher", output.publisher)
                    .set("url", output.url)
                    .set("publication_status", status)
                    .set("volume", output.volume)
                    .set("pages", output.pages)
                    .set("conference", output.conference)
                    .set("degree", output.degree)
                    .set("updated", output.updated)
                    .insert(&mut *ctx.target)
                    .await?;
            }
        }

        info!(outputs = ids.issued(), "Added outputs");
        Ok(())
    }
}

fn label(labels: &HashMap<i64, String>, id: Option<i64>) -> Option<String> {
    id.and_then(|id| labels.get(&id)).cloned()
}

#[derive(Debug, Clone, FromRow)]
struct OutputRecord {
    id: i64,
    authors: Option<String>,
    year: Option<i64>,
    title: Option<String>,
    publisher: Option<String>,
    url: Option<String>,
    volume: Option<String>,
    pages: Option<String>,
    doi: Option<String>,
}

impl OutputRecord {
    /// Strip markup and stray whitespace from the free-text fields
    fn clean(&mut self) {
        self.authors = clean_optional(self.authors.as_deref());
        self.title = clean_optional(self.title.as_deref());
    }

    /// Overwrite with whatever the cached bibliographic record provides
    fn enrich(&mut self, doi: &str, work: Option<&WorkMetadata>) {
        self.doi = Some(doi.to_string());

        let Some(work) = work else {
            return;
        };
        if let Some(authors) = work.authors() {
            self.authors = Some(authors);
        }
        if let Some(year) = work.year() {
            self.year = Some(year);
        }
        if let Some(title) = work.title().and_then(clean_string) {
            self.title = Some(title);
        }
        if let Some(publisher) = non_blank(work.publisher.clone()) {
            self.publisher = Some(publisher);
        }
        if let Some(url) = non_blank(work.url.clone()) {
            self.url = Some(url);
        }
        if let Some(volume) = non_blank(work.volume.clone()) {
            self.volume = Some(volume);
        }
        if let Some(pages) = non_blank(work.page.clone()) {
            self.pages = Some(pages);
        }
    }
}

/// Output cleanup and best-effort DOI enrichment
///
/// Outputs with a cached DOI match get the DOI stored and their
/// bibliographic fields overwritten from the cached metadata. A missing
/// match, or a field missing from the metadata, leaves the value alone.
pub struct CleanOutputs;

#[async_trait]
impl Step for CleanOutputs {
    fn message(&self) -> String {
        "Cleaning Output table".to_string()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> EtlResult<()> {
        let resources = ctx.resources;
        let mut dois: HashMap<i64, &str> = HashMap::new();
        for ((round, output_id), doi) in resources.output_dois.iter() {
            match ctx.translations.translate(LegacyTable::Output, *output_id, *round) {
                Some(id) => {
                    dois.insert(id, doi);
                }
                None => debug!(round = %round, output_id, "Cached DOI for unknown output"),
            }
        }

        let records = sqlx::query_as::<_, OutputRecord>(
            r#"
            SELECT id, authors, year, title, publisher, url, volume, pages, doi
            FROM "Output"
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *ctx.target)
        .await?;

        let mut enriched = 0usize;
        for mut record in records {
            record.clean();
            if let Some(doi) = dois.get(&record.id) {
                record.enrich(doi, resources.doi_metadata.get(doi));
                enriched += 1;
            }

            sqlx::query(
                r#"
                UPDATE "Output"
                SET authors = ?, year = ?, title = ?, publisher = ?, url = ?,
                    volume = ?, pages = ?, doi = ?
                WHERE id = ?
                "#,
            )
            .bind(&record.authors)
            .bind(record.year)
            .bind(&record.title)
            .bind(&record.publisher)
            .bind(&record.url)
            .bind(&record.volume)
            .bind(&record.pages)
            .bind(&record.doi)
            .bind(record.id)
            .execute(&mut *ctx.target)
            .await?;
        }

        info!(enriched, "Cleaned outputs");
        Ok(())
    }
}
