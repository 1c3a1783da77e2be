use std::cmp::Ordering;

use crate::{
    content_source::{ContentSource, DirectoryEntry},
    failure::FailureKind,
    log_util::log_debug,
};
use color_eyre::eyre::{Context, Result};
use futures::future::join_all;

/// A discovered topic document: where to fetch it and what it is called on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFileRef {
    pub location: String,
    pub filename: String,
}

/// Query the listing endpoint and return the recognised topic files in display order.
pub async fn load_catalog<S: ContentSource>(
    source: &S,
    extension: &str,
) -> Result<Vec<TopicFileRef>> {
    let entries = source
        .list_directory()
        .await
        .wrap_err("failed to load topic catalog")?;
    let files = catalog_from_listing(entries, extension);
    log_debug(&format!("Catalog: discovered {} topic file(s)", files.len()));
    Ok(files)
}

/// Keep entries with the document extension and a download location, sorted by filename.
pub fn catalog_from_listing(entries: Vec<DirectoryEntry>, extension: &str) -> Vec<TopicFileRef> {
    let mut files: Vec<TopicFileRef> = entries
        .into_iter()
        .filter(|entry| entry.name.ends_with(extension))
        .filter_map(|entry| {
            let location = entry.download_url?;
            Some(TopicFileRef {
                location,
                filename: entry.name,
            })
        })
        .collect();
    files.sort_by(|a, b| compare_filenames(&a.filename, &b.filename));
    files
}

/// Case-insensitive first, then lowercase before uppercase, the way locale collation orders names.
pub fn compare_filenames(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Resolve the display title for one file. Failures and empty topics fall back to the filename.
pub async fn resolve_title<S: ContentSource>(source: &S, file: &TopicFileRef) -> String {
    match source.fetch_document(&file.location).await {
        Ok(document) if !document.topic.is_empty() => document.topic,
        Ok(_) => file.filename.clone(),
        Err(err) => {
            log_debug(&format!(
                "Catalog: {} failure for {}, using filename: {:#}",
                FailureKind::TitleResolution.label(),
                file.filename,
                err
            ));
            file.filename.clone()
        }
    }
}

/// Resolve every title concurrently, reporting each one through `on_resolved` as soon as it settles.
pub async fn resolve_titles<S, F>(source: &S, files: &[TopicFileRef], on_resolved: F)
where
    S: ContentSource,
    F: Fn(&TopicFileRef, String),
{
    let on_resolved = &on_resolved;
    join_all(files.iter().map(|file| async move {
        let title = resolve_title(source, file).await;
        on_resolved(file, title);
    }))
    .await;
}
