//! Plain-text rendering of metadata and recommendations

use std::fmt::Write;

use crate::metadata::{is_available, MetadataRecord};
use crate::recommend::Recommendation;

/// Multi-line description of a single movie
pub fn render_details(record: &MetadataRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.title);
    let _ = writeln!(
        out,
        "Rating: {}/10   Year: {}   Runtime: {}",
        record.rating, record.year, record.runtime
    );
    let _ = writeln!(out, "Genre: {}", record.genre);
    let _ = writeln!(out, "Director: {}", record.director);
    let _ = writeln!(out, "Cast: {}", record.actors);
    let _ = writeln!(out, "Plot: {}", record.plot);
    if is_available(&record.awards) {
        let _ = writeln!(out, "Awards: {}", record.awards);
    }
    if let Some(poster) = record.poster() {
        let _ = writeln!(out, "Poster: {}", poster);
    }
    out
}

/// Numbered recommendation list for the terminal
pub fn render_recommendations(selected: &str, recommendations: &[Recommendation]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Because you liked {}:", selected);

    for (i, rec) in recommendations.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}  (match {:.1}%)", i + 1, rec.title, rec.score * 100.0);
        if let Some(details) = &rec.details {
            let _ = writeln!(out, "   Rating: {}/10   Year: {}", details.rating, details.year);
            let _ = writeln!(out, "   Genre: {}", details.genre);
            let _ = writeln!(out, "   Director: {}", details.director);
            let _ = writeln!(out, "   Plot: {}", details.plot);
        }
        if let Some(failure) = rec.failure {
            let _ = writeln!(out, "   ({})", failure.message());
        }
        if let Some(poster) = &rec.poster {
            let _ = writeln!(out, "   Poster: {}", poster);
        }
    }
    out
}

/// Text summary suitable for saving to a file
pub fn export_summary(selected: &str, recommendations: &[Recommendation]) -> String {
    let mut summary = format!("Movie Recommendations for: {}\n\n", selected);

    for (i, rec) in recommendations.iter().enumerate() {
        let _ = write!(summary, "{}. {}", i + 1, rec.title);
        if let Some(details) = &rec.details {
            let _ = write!(
                summary,
                " ({}) - Rating: {}/10",
                details.year, details.rating
            );
        }
        let _ = writeln!(summary, "\n   Similarity: {:.1}%", rec.score * 100.0);
        if let Some(details) = &rec.details {
            let _ = writeln!(summary, "   Genre: {}", details.genre);
            let _ = writeln!(summary, "   Plot: {}", details.plot);
        }
        summary.push('\n');
    }
    summary
}

/// Default export file name for a selected movie
pub fn export_file_name(selected: &str) -> String {
    format!("recommendations_for_{}.txt", selected.replace(' ', "_"))
}
